//! Minimax player used both as an opponent and as the fitness oracle.
//!
//! # Evaluation
//!
//! A decided position scores `±100` (sign of the winner, `0` for a tie). An
//! undecided one scores `10 * near wins + potential wins`, where a near win is
//! a line holding two marks of one player and an empty square and a potential
//! win is a line with exactly one mark and two empty squares. Both counts are
//! signed (X positive) and come from a single pass over the 8 lines.
//!
//! # Search
//!
//! Plain negamax without pruning, limited to `max_depth` plies. Pruning would
//! stop at the first best move, but the root needs every move that reaches the
//! best value so that ties can be broken by [`resolve_ties`]:
//!
//! 1. moves that win immediately,
//! 2. else moves that reduce the opponent's near wins,
//! 3. else moves with the highest static evaluation for the mover.
//!
//! The first two moves of a game come from fixed rules instead of search: the
//! center on an empty board, and for the reply a corner if the center is taken,
//! otherwise the center.

use tttnet_engine::{Board, Game, LINES, Outcome, Piece, SQUARE_COUNT, Squares};

use crate::player::Player;

/// Score of a won position (before applying the sign).
pub const WIN_SCORE: i32 = 100;

/// Search depth that covers the whole game after the two table moves.
pub const FULL_DEPTH: u32 = 7;

const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];

fn sign(piece: Option<Piece>) -> i32 {
    piece.map_or(0, Piece::sign)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineCounts {
    near_wins: i32,
    potential_wins: i32,
}

fn count_lines(board: Board) -> LineCounts {
    let mut counts = LineCounts::default();
    for line in LINES {
        let signs = line.map(|square| sign(board.piece(square)));
        let sum: i32 = signs.iter().sum();
        let has_empty = signs.contains(&0);
        match sum.abs() {
            2 => counts.near_wins += sum.signum(),
            1 if has_empty => counts.potential_wins += sum,
            _ => {}
        }
    }
    counts
}

fn count_near_wins_for(board: Board, player: Piece) -> usize {
    LINES
        .iter()
        .filter(|line| {
            line.iter()
                .map(|square| sign(board.piece(*square)))
                .sum::<i32>()
                == 2 * player.sign()
        })
        .count()
}

/// Static evaluation from X's point of view.
#[must_use]
pub fn evaluate(board: Board) -> i32 {
    evaluate_decided(board, board.winner())
}

fn evaluate_decided(board: Board, outcome: Option<Outcome>) -> i32 {
    match outcome {
        Some(Outcome::Win(piece)) => piece.sign() * WIN_SCORE,
        Some(Outcome::Tie) => 0,
        None => {
            let counts = count_lines(board);
            counts.near_wins * 10 + counts.potential_wins
        }
    }
}

/// Keeps the moves scoring highest under `score`.
pub(crate) fn top_scoring<T, F>(moves: &[usize], mut score: F) -> (Option<T>, Squares)
where
    T: PartialOrd + Copy,
    F: FnMut(usize) -> T,
{
    let mut best = None;
    let mut top = Squares::new();
    for &mv in moves {
        let value = score(mv);
        match best {
            Some(b) if value < b => {}
            Some(b) if value == b => top.push(mv),
            _ => {
                best = Some(value);
                top.clear();
                top.push(mv);
            }
        }
    }
    (best, top)
}

fn blocks_opponent(board: Board, mv: usize, turn: Piece) -> bool {
    let opponent = turn.opponent();
    count_near_wins_for(board.with_move(mv, turn), opponent) < count_near_wins_for(board, opponent)
}

/// Narrows moves that negamax rates equally.
///
/// The blocking rule looks only at the opponent's near wins and ignores any
/// near wins the move creates for the mover.
#[must_use]
pub fn resolve_ties(board: Board, moves: Squares, turn: Piece) -> Squares {
    let mut moves = moves;

    if moves.len() > 1 {
        let (best, top) = top_scoring(&moves, |mv| {
            board.with_move(mv, turn).winner() == Some(Outcome::Win(turn))
        });
        if best == Some(true) {
            return top;
        }
        moves = top;
    }

    if moves.len() > 1 {
        moves = top_scoring(&moves, |mv| blocks_opponent(board, mv, turn)).1;
    }

    if moves.len() > 1 {
        moves = top_scoring(&moves, |mv| turn.sign() * evaluate(board.with_move(mv, turn))).1;
    }

    moves
}

/// Minimax player with a fixed search depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartPlayer {
    max_depth: u32,
}

impl Default for SmartPlayer {
    fn default() -> Self {
        Self::new(FULL_DEPTH)
    }
}

impl SmartPlayer {
    /// Creates a player searching `max_depth` plies. Depth 1 is a greedy
    /// one-ply player.
    ///
    /// # Panics
    ///
    /// Panics if `max_depth` is zero.
    #[must_use]
    pub fn new(max_depth: u32) -> Self {
        assert!(max_depth > 0, "search depth must be at least 1");
        Self { max_depth }
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn negamax(&self, board: Board, turn: Piece, depth: u32) -> i32 {
        let outcome = board.winner();
        if depth == self.max_depth || outcome.is_some() {
            return turn.sign() * evaluate_decided(board, outcome);
        }
        board
            .empty_squares()
            .into_iter()
            .map(|mv| -self.negamax(board.with_move(mv, turn), turn.opponent(), depth + 1))
            .max()
            .unwrap_or(0)
    }

    /// Returns every move reaching the best negamax value, after tie-breaking.
    ///
    /// A decided board yields no moves.
    #[must_use]
    pub fn best_moves(&self, board: Board, turn: Piece) -> Squares {
        if board.winner().is_some() {
            return Squares::new();
        }
        let moves = board.empty_squares();
        let (_value, top) = top_scoring(&moves, |mv| {
            -self.negamax(board.with_move(mv, turn), turn.opponent(), 1)
        });
        resolve_ties(board, top, turn)
    }
}

impl Player for SmartPlayer {
    fn candidate_moves(&mut self, game: &Game) -> Squares {
        let board = game.board();
        if board.is_empty() {
            return [CENTER].into_iter().collect();
        }
        if board.empty_squares().len() == SQUARE_COUNT - 1 {
            return if board.piece(CENTER).is_some() {
                CORNERS.into_iter().collect()
            } else {
                [CENTER].into_iter().collect()
            };
        }
        self.best_moves(board, game.turn())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::player::play_game;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_evaluate_decided() {
        assert_eq!(evaluate(board("XXX/OO-/---")), WIN_SCORE);
        assert_eq!(evaluate(board("XX-/OOO/X--")), -WIN_SCORE);
        assert_eq!(evaluate(board("XOX/XOO/OXX")), 0);
    }

    #[test]
    fn test_evaluate_heuristic() {
        assert_eq!(evaluate(Board::EMPTY), 0);
        // Center X: one mark in row 1, column 1 and both diagonals.
        assert_eq!(evaluate(board("---/-X-/---")), 4);
        // X near win on row 0. Potential wins: column 1 and the diagonal for
        // X, row 2 and the anti-diagonal for O, cancelling out.
        let b = board("XX-/---/O--");
        assert_eq!(
            count_lines(b),
            LineCounts {
                near_wins: 1,
                potential_wins: 0,
            }
        );
        assert_eq!(evaluate(b), 10);
        assert_eq!(evaluate(board("OO-/---/X--")), -10);
    }

    #[test]
    fn test_resolve_ties_prefers_win() {
        // X to move: 2 wins, 5 blocks O's row.
        let b = board("XX-/OO-/---");
        let moves = resolve_ties(b, [2, 5, 8].into_iter().collect(), Piece::X);
        assert_eq!(moves.as_slice(), &[2]);
    }

    #[test]
    fn test_resolve_ties_prefers_block() {
        // O to move, X threatens row 0.
        let b = board("XX-/-O-/---");
        let moves = resolve_ties(b, [2, 3, 5].into_iter().collect(), Piece::O);
        assert_eq!(moves.as_slice(), &[2]);
    }

    #[test]
    fn test_empty_board_plays_center() {
        let mut smart = SmartPlayer::default();
        let mut rng = Pcg32::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(smart.select_move(&Game::new(), &mut rng), Some(4));
        }
    }

    #[test]
    fn test_second_move_table() {
        let mut smart = SmartPlayer::default();
        let mut game = Game::new();
        game.make_move(4);
        assert_eq!(smart.candidate_moves(&game).as_slice(), &CORNERS);

        let mut game = Game::new();
        game.make_move(0);
        assert_eq!(smart.candidate_moves(&game).as_slice(), &[CENTER]);
    }

    #[test]
    fn test_blocks_then_wins() {
        let mut smart = SmartPlayer::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut game = Game::new();
        game.make_move(0);
        game.make_move(3);
        game.make_move(1);
        assert_eq!(smart.select_move(&game, &mut rng), Some(2), "blocks a threat");
        game.make_move(4);
        assert_eq!(smart.select_move(&game, &mut rng), Some(2), "wins over blocking");
    }

    #[test]
    fn test_decided_board_has_no_moves() {
        let smart = SmartPlayer::default();
        assert!(smart.best_moves(board("XXX/OO-/---"), Piece::O).is_empty());
    }

    #[test]
    fn test_greedy_depth_one() {
        let mut greedy = SmartPlayer::new(1);
        // Depth 1 still sees an immediate win.
        let game = Game::from_board(board("XX-/OO-/---"));
        assert_eq!(game.turn(), Piece::X);
        assert_eq!(greedy.candidate_moves(&game).as_slice(), &[2]);
    }

    #[test]
    fn test_self_play_always_ties() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let mut x = SmartPlayer::default();
            let mut o = SmartPlayer::default();
            let game = play_game(&mut x, &mut o, &mut rng).unwrap();
            assert_eq!(game.winner(), Some(Outcome::Tie), "{game}");
        }
    }
}
