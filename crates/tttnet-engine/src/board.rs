use std::{fmt, str::FromStr};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Number of squares on the board.
pub const SQUARE_COUNT: usize = 9;

/// The 8 winning lines, in the order [`Board::winner`] checks them:
/// rows top to bottom, columns left to right, then the two diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

const X_CODE: u32 = 0b01;
const O_CODE: u32 = 0b11;
const SQUARE_MASK: u32 = 0b11;

// Low bit of every square. All of them set means the board is full.
const FULL_MASK: u32 = 0b01_0101_0101_0101_0101;
const BITS_MASK: u32 = (1 << (2 * SQUARE_COUNT)) - 1;

const fn line_pattern(line: [usize; 3], code: u32) -> u32 {
    (code << (2 * line[0])) | (code << (2 * line[1])) | (code << (2 * line[2]))
}

const fn line_patterns(code: u32) -> [u32; 8] {
    let mut patterns = [0; 8];
    let mut i = 0;
    while i < LINES.len() {
        patterns[i] = line_pattern(LINES[i], code);
        i += 1;
    }
    patterns
}

const LINE_MASKS: [u32; 8] = line_patterns(SQUARE_MASK);
const X_LINES: [u32; 8] = line_patterns(X_CODE);
const O_LINES: [u32; 8] = line_patterns(O_CODE);

/// A player mark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum Piece {
    X,
    O,
}

impl Piece {
    /// Two-bit code stored in the board for this piece.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Piece::X => X_CODE,
            Piece::O => O_CODE,
        }
    }

    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            X_CODE => Some(Piece::X),
            O_CODE => Some(Piece::O),
            _ => None,
        }
    }

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Piece::X => Piece::O,
            Piece::O => Piece::X,
        }
    }

    /// `+1` for X, `-1` for O.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Piece::X => 1,
            Piece::O => -1,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Piece::X => 'X',
            Piece::O => 'O',
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Result of a decided board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Outcome {
    Win(Piece),
    Tie,
}

/// Squares returned by move generators, in ascending order.
pub type Squares = ArrayVec<usize, SQUARE_COUNT>;

/// Bit-packed tic-tac-toe position.
///
/// Each square occupies two bits, square 0 (top left) in the least significant
/// pair, squares numbered row-major. `00` is empty, `01` is X and `11` is O.
/// A board is a plain value: [`Board::with_move`] returns a new board.
///
/// # Example
///
/// ```
/// use tttnet_engine::{Board, Outcome, Piece};
///
/// let board = Board::EMPTY
///     .with_move(0, Piece::X)
///     .with_move(4, Piece::X)
///     .with_move(8, Piece::X);
/// assert_eq!(board.winner(), Some(Outcome::Win(Piece::X)));
/// assert_eq!(board.to_string(), "X--/-X-/--X");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Board {
    bits: u32,
}

impl Board {
    pub const EMPTY: Self = Self { bits: 0 };

    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bits
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Returns the piece at `square`, or `None` if it is empty.
    #[inline]
    #[must_use]
    pub const fn piece(self, square: usize) -> Option<Piece> {
        Piece::from_code((self.bits >> (2 * square)) & SQUARE_MASK)
    }

    /// Iterates over all 9 squares in index order.
    pub fn squares(self) -> impl Iterator<Item = Option<Piece>> {
        (0..SQUARE_COUNT).map(move |square| self.piece(square))
    }

    /// Returns the indices of empty squares, ascending.
    #[must_use]
    pub fn empty_squares(self) -> Squares {
        (0..SQUARE_COUNT)
            .filter(|&square| self.piece(square).is_none())
            .collect()
    }

    /// Places `piece` on `square`.
    ///
    /// The square must be empty; this is not checked.
    #[inline]
    #[must_use]
    pub const fn with_move(self, square: usize, piece: Piece) -> Self {
        Self {
            bits: self.bits | (piece.code() << (2 * square)),
        }
    }

    /// Returns the winner and the index into [`LINES`] of the completed line.
    ///
    /// Lines are checked in [`LINES`] order, so a board completing several
    /// lines at once reports the first of them.
    #[must_use]
    pub fn winning_line(self) -> Option<(Piece, usize)> {
        (0..LINES.len()).find_map(|i| match self.bits & LINE_MASKS[i] {
            bits if bits == X_LINES[i] => Some((Piece::X, i)),
            bits if bits == O_LINES[i] => Some((Piece::O, i)),
            _ => None,
        })
    }

    /// Returns the outcome if the game on this board is decided.
    #[must_use]
    pub fn winner(self) -> Option<Outcome> {
        if let Some((piece, _line)) = self.winning_line() {
            return Some(Outcome::Win(piece));
        }
        if self.bits & FULL_MASK == FULL_MASK {
            return Some(Outcome::Tie);
        }
        None
    }
}

impl From<Board> for u32 {
    fn from(board: Board) -> Self {
        board.bits
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid board bits: {bits:#x}")]
pub struct InvalidBoardBitsError {
    bits: u32,
}

impl TryFrom<u32> for Board {
    type Error = InvalidBoardBitsError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        let board = Board { bits };
        let valid = bits & !BITS_MASK == 0
            && (0..SQUARE_COUNT).all(|square| (bits >> (2 * square)) & SQUARE_MASK != 0b10);
        if valid {
            Ok(board)
        } else {
            Err(InvalidBoardBitsError { bits })
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (square, piece) in self.squares().enumerate() {
            if square > 0 && square % 3 == 0 {
                f.write_str("/")?;
            }
            let ch = piece.map_or('-', Piece::as_char);
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseBoardError {
    #[display("expected 9 squares, got {count}")]
    SquareCount { count: usize },
    #[display("invalid square character '{ch}'")]
    InvalidSquare { ch: char },
}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Parses the format produced by `Display`, e.g. `"XO-/-X-/--O"`.
    ///
    /// Row separators and whitespace are optional; `.` is accepted for empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut board = Board::EMPTY;
        let mut count = 0;
        for ch in s.chars().filter(|ch| *ch != '/' && !ch.is_whitespace()) {
            let piece = match ch {
                'X' | 'x' => Some(Piece::X),
                'O' | 'o' => Some(Piece::O),
                '-' | '.' => None,
                _ => return Err(ParseBoardError::InvalidSquare { ch }),
            };
            if count < SQUARE_COUNT {
                if let Some(piece) = piece {
                    board = board.with_move(count, piece);
                }
            }
            count += 1;
        }
        if count != SQUARE_COUNT {
            return Err(ParseBoardError::SquareCount { count });
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_board_is_empty() {
        let b = Board::new();
        assert!(b.is_empty());
        for square in 0..SQUARE_COUNT {
            assert_eq!(b.piece(square), None);
        }
        assert_eq!(b.empty_squares().as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(b.winner(), None);
    }

    #[test]
    fn test_move_is_consistent() {
        let b = Board::EMPTY.with_move(4, Piece::X);
        assert!(!b.is_empty());
        assert_eq!(b.piece(4), Some(Piece::X));
        assert_eq!(b.bits(), 0b01 << 8);
        assert_eq!(b.empty_squares().as_slice(), &[0, 1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(b.winner(), None);

        let b2 = b.with_move(0, Piece::O);
        assert_eq!(b2.piece(0), Some(Piece::O));
        // The original value is untouched.
        assert_eq!(b.piece(0), None);
    }

    #[test]
    fn test_win_conditions() {
        for piece in [Piece::X, Piece::O] {
            for (i, line) in LINES.iter().enumerate() {
                let b = line
                    .iter()
                    .fold(Board::EMPTY, |b, &square| b.with_move(square, piece));
                assert_eq!(b.winner(), Some(Outcome::Win(piece)), "{piece} line {i}");
                assert_eq!(b.winning_line(), Some((piece, i)));
            }
        }
    }

    #[test]
    fn test_tie() {
        let b = board("XOX/XOO/OXX");
        assert_eq!(b.winner(), Some(Outcome::Tie));
        assert_eq!(b.winning_line(), None);
    }

    #[test]
    fn test_multiple_lines_resolve_to_first() {
        // Row 0 and column 0 completed by the same move.
        let b = board("XXX/XOO/XOO");
        assert_eq!(b.winning_line(), Some((Piece::X, 0)));
        // Column 2 and the anti-diagonal.
        let b = board("X-O/XOO/O-O");
        assert_eq!(b.winning_line(), Some((Piece::O, 5)));
    }

    #[test]
    fn test_full_board_is_always_decided() {
        // Every way to place 5 X and 4 O on the board.
        for o_mask in 0u32..(1 << SQUARE_COUNT) {
            if o_mask.count_ones() != 4 {
                continue;
            }
            let b = (0..SQUARE_COUNT).fold(Board::EMPTY, |b, square| {
                let piece = if o_mask & (1 << square) != 0 {
                    Piece::O
                } else {
                    Piece::X
                };
                b.with_move(square, piece)
            });
            assert!(b.winner().is_some(), "{b}");
        }
    }

    #[test]
    fn test_display_and_parse() {
        let b = Board::EMPTY
            .with_move(0, Piece::X)
            .with_move(1, Piece::O)
            .with_move(8, Piece::X);
        assert_eq!(b.to_string(), "XO-/---/--X");
        assert_eq!(board("XO-/---/--X"), b);
        assert_eq!(board("xo. ... ..x"), b);
        assert!(matches!(
            "XO-/---".parse::<Board>(),
            Err(ParseBoardError::SquareCount { count: 6 })
        ));
        assert!(matches!(
            "XO-/-Z-/---".parse::<Board>(),
            Err(ParseBoardError::InvalidSquare { ch: 'Z' })
        ));
    }

    #[test]
    fn test_board_serialization() {
        let b = board("XO-/-X-/--O");
        let serialized = serde_json::to_string(&b).unwrap();
        assert_eq!(serialized, b.bits().to_string());
        let deserialized: Board = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, b);

        // A square holding `10` is not a valid piece code.
        assert!(serde_json::from_str::<Board>("2").is_err());
        assert!(serde_json::from_str::<Board>(&(1u32 << 18).to_string()).is_err());
    }
}
