use std::fmt;

use crate::board::{Board, Outcome, Piece, Squares};

/// A board together with whose turn it is and the boards that preceded it.
///
/// The turn can be derived from the board for games played by the rules, but
/// it is stored explicitly so callers can set up non-standard sequences.
///
/// # Example
///
/// ```
/// use tttnet_engine::{Board, Game, Piece};
///
/// let mut game = Game::new();
/// game.make_move(4);
/// assert_eq!(game.turn(), Piece::O);
/// game.undo();
/// assert_eq!(game.board(), Board::EMPTY);
/// assert_eq!(game.turn(), Piece::X);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: Piece,
    history: Vec<Board>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    #[must_use]
    pub fn new() -> Self {
        Self::from_board(Board::EMPTY)
    }

    /// Starts from `board`, with the turn given by the number of empty squares
    /// (X moves when an odd number remain).
    #[must_use]
    pub fn from_board(board: Board) -> Self {
        let turn = if board.empty_squares().len() % 2 == 0 {
            Piece::O
        } else {
            Piece::X
        };
        Self::with_turn(board, turn)
    }

    #[must_use]
    pub fn with_turn(board: Board, turn: Piece) -> Self {
        Self {
            board,
            turn,
            history: vec![],
        }
    }

    #[must_use]
    pub fn board(&self) -> Board {
        self.board
    }

    #[must_use]
    pub fn turn(&self) -> Piece {
        self.turn
    }

    #[must_use]
    pub fn history(&self) -> &[Board] {
        &self.history
    }

    #[must_use]
    pub fn piece(&self, square: usize) -> Option<Piece> {
        self.board.piece(square)
    }

    #[must_use]
    pub fn empty_squares(&self) -> Squares {
        self.board.empty_squares()
    }

    #[must_use]
    pub fn winner(&self) -> Option<Outcome> {
        self.board.winner()
    }

    /// Compares board and turn, ignoring history.
    #[must_use]
    pub fn same_position(&self, other: &Self) -> bool {
        self.board == other.board && self.turn == other.turn
    }

    /// Places the current player's piece on `square` and passes the turn.
    ///
    /// The square must be empty; callers check this first.
    pub fn make_move(&mut self, square: usize) {
        self.history.push(self.board);
        self.board = self.board.with_move(square, self.turn);
        self.turn = self.turn.opponent();
    }

    /// Reverts the last move.
    ///
    /// # Panics
    ///
    /// Panics if no move has been made.
    pub fn undo(&mut self) {
        self.board = self
            .history
            .pop()
            .expect("undo called on a game without history");
        self.turn = self.turn.opponent();
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.turn, self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_logic() {
        let mut g = Game::new();
        assert_eq!(g.board(), Board::EMPTY);
        assert_eq!(g.turn(), Piece::X);
        assert!(g.history().is_empty());

        g.make_move(4);
        let after_first = Board::EMPTY.with_move(4, Piece::X);
        assert_eq!(g.board(), after_first);
        assert_eq!(g.turn(), Piece::O);
        assert_eq!(g.history(), &[Board::EMPTY]);

        g.make_move(0);
        assert_eq!(g.turn(), Piece::X);
        assert_eq!(g.history(), &[Board::EMPTY, after_first]);
        assert_eq!(g.to_string(), "X@O--/-X-/---");

        let g2 = g.clone();
        assert!(g.same_position(&g2));
        assert_eq!(g.history(), g2.history());

        g.undo();
        assert_eq!(g.board(), after_first);
        assert_eq!(g.turn(), Piece::O);
        assert_eq!(g.history(), &[Board::EMPTY]);
        assert!(!g.same_position(&g2));
    }

    #[test]
    fn test_move_then_undo_restores_position() {
        let mut g = Game::from_board("XO-/-X-/---".parse().unwrap());
        assert_eq!(g.turn(), Piece::O);
        for square in g.empty_squares() {
            let before = g.clone();
            g.make_move(square);
            assert_eq!(g.piece(square), Some(Piece::O));
            g.undo();
            assert!(g.same_position(&before));
            assert_eq!(g.history(), before.history());
        }
    }

    #[test]
    fn test_turn_from_board_parity() {
        assert_eq!(Game::from_board(Board::EMPTY).turn(), Piece::X);
        let one = Board::EMPTY.with_move(0, Piece::X);
        assert_eq!(Game::from_board(one).turn(), Piece::O);
        // Explicit turn overrides parity.
        assert_eq!(Game::with_turn(one, Piece::X).turn(), Piece::X);
    }

    #[test]
    #[should_panic(expected = "without history")]
    fn test_undo_without_history_panics() {
        Game::new().undo();
    }
}
