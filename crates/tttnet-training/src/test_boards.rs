//! The fixed set of positions every individual is scored against.
//!
//! The set holds every position reachable by legal play from the empty board
//! that is still undecided and leaves at least two empty squares, grouped into
//! buckets by ply (bucket `i` holds boards with `i` pieces placed). The oracle
//! answer for each board, the full set of moves [`SmartPlayer`] considers
//! optimal, is computed on first use and cached in the board.
//!
//! The set is built once per process by [`test_boards`] and is read-only
//! afterwards, so evaluation threads share it through a `&'static` reference.

use std::{collections::HashSet, sync::OnceLock};

use tttnet_engine::{Board, Game, SQUARE_COUNT, Squares};
use tttnet_evaluator::{player::Player as _, smart::SmartPlayer};

/// Number of buckets, one per ply from 0 to 7.
pub const BUCKET_COUNT: usize = 8;

/// Number of boards in each bucket.
pub const BUCKET_SIZES: [usize; BUCKET_COUNT] = [1, 9, 72, 252, 756, 1140, 1372, 696];

/// Total number of test boards.
pub const BOARD_COUNT: usize = 4298;

/// One test position with its lazily computed oracle answer.
#[derive(Debug)]
pub struct TestBoard {
    board: Board,
    right_moves: OnceLock<Squares>,
}

impl TestBoard {
    fn new(board: Board) -> Self {
        Self {
            board,
            right_moves: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> Board {
        self.board
    }

    /// Returns the game at this position, with the turn implied by the board.
    #[must_use]
    pub fn game(&self) -> Game {
        Game::from_board(self.board)
    }

    /// Returns every move the full-depth oracle rates optimal here.
    pub fn right_moves(&self) -> &Squares {
        self.right_moves
            .get_or_init(|| SmartPlayer::default().candidate_moves(&self.game()))
    }
}

/// Test boards grouped by ply.
#[derive(Debug)]
pub struct TestBoardSet {
    buckets: Vec<Vec<TestBoard>>,
}

impl TestBoardSet {
    /// Enumerates the set by depth-first search from the empty board, trying
    /// squares in ascending order and visiting each position once.
    #[must_use]
    pub fn generate() -> Self {
        let mut buckets = (0..BUCKET_COUNT).map(|_| vec![]).collect::<Vec<_>>();
        let mut visited = HashSet::new();
        collect(&mut Game::new(), &mut visited, &mut buckets);
        Self { buckets }
    }

    /// Builds a set from hand-picked positions, one list per ply.
    #[cfg(test)]
    pub(crate) fn from_buckets(buckets: Vec<Vec<Board>>) -> Self {
        let buckets = buckets
            .into_iter()
            .map(|bucket| bucket.into_iter().map(TestBoard::new).collect())
            .collect();
        Self { buckets }
    }

    #[must_use]
    pub fn buckets(&self) -> &[Vec<TestBoard>] {
        &self.buckets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect(game: &mut Game, visited: &mut HashSet<Board>, buckets: &mut [Vec<TestBoard>]) {
    let empty = game.empty_squares();
    if visited.contains(&game.board()) || game.winner().is_some() || empty.len() <= 1 {
        return;
    }
    buckets[SQUARE_COUNT - empty.len()].push(TestBoard::new(game.board()));
    visited.insert(game.board());
    for square in empty {
        game.make_move(square);
        collect(game, visited, buckets);
        game.undo();
    }
}

/// Returns the process-wide test board set, building it on first call.
pub fn test_boards() -> &'static TestBoardSet {
    static TEST_BOARDS: OnceLock<TestBoardSet> = OnceLock::new();
    TEST_BOARDS.get_or_init(TestBoardSet::generate)
}
