use std::io::{BufRead, Write};

use rand::RngCore;
use tttnet_engine::{Board, Game, Piece, SQUARE_COUNT};
use tttnet_evaluator::player::{self, Player};

/// One line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Place a piece; squares are numbered 1 to 9 at the prompt, 0 to 8 here.
    Move(usize),
    Undo,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub(crate) enum CommandError {
    #[display("enter a square 1-9, `u` to undo or `q` to quit")]
    Unknown,
    #[display("square {number} is already taken")]
    Occupied { number: usize },
}

impl Command {
    pub(crate) fn parse(line: &str, game: &Game) -> Result<Self, CommandError> {
        match line.trim() {
            "u" | "undo" => Ok(Self::Undo),
            "q" | "quit" => Ok(Self::Quit),
            text => {
                let number = text
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=SQUARE_COUNT).contains(n))
                    .ok_or(CommandError::Unknown)?;
                if game.piece(number - 1).is_some() {
                    return Err(CommandError::Occupied { number });
                }
                Ok(Self::Move(number - 1))
            }
        }
    }
}

/// Who sits on one side of the board.
pub(crate) enum Seat<'a> {
    Human,
    Ai(Box<dyn Player + 'a>),
}

impl Seat<'_> {
    fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }
}

/// Takes back moves until a human is to move again.
///
/// Returns `false` if there was nothing to undo.
fn undo_to_human(game: &mut Game, is_human: impl Fn(Piece) -> bool) -> bool {
    if game.history().is_empty() {
        return false;
    }
    game.undo();
    while !is_human(game.turn()) && !game.history().is_empty() {
        game.undo();
    }
    true
}

const SQUARE_NUMBERS: [char; SQUARE_COUNT] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Board rows with empty squares shown as their prompt numbers.
fn board_rows(board: Board) -> impl Iterator<Item = String> {
    (0..3).map(move |row| {
        (row * 3..row * 3 + 3)
            .map(|square| board.piece(square).map_or(SQUARE_NUMBERS[square], Piece::as_char))
            .collect()
    })
}

fn write_board(out: &mut impl Write, board: Board) -> std::io::Result<()> {
    for row in board_rows(board) {
        writeln!(out, "  {row}")?;
    }
    Ok(())
}

/// Runs one game where at least one side reads moves from `input`.
///
/// Returns `None` if the human quits or the input ends before the game does.
pub(crate) fn play<'a>(
    x: &mut Seat<'a>,
    o: &mut Seat<'a>,
    input: impl BufRead,
    mut out: impl Write,
    rng: &mut dyn RngCore,
) -> anyhow::Result<Option<Game>> {
    let humans = [x.is_human(), o.is_human()];
    let is_human = |piece: Piece| match piece {
        Piece::X => humans[0],
        Piece::O => humans[1],
    };

    let mut lines = input.lines();
    let mut game = Game::new();
    write_board(&mut out, game.board())?;
    while game.winner().is_none() {
        let turn = game.turn();
        let seat = match turn {
            Piece::X => &mut *x,
            Piece::O => &mut *o,
        };
        match seat {
            Seat::Ai(ai) => {
                let square = player::checked_move(ai.as_mut(), &game, rng)?;
                writeln!(out, "{turn} plays {}", square + 1)?;
                game.make_move(square);
            }
            Seat::Human => {
                write!(out, "{turn} to move (1-9, u = undo, q = quit): ")?;
                out.flush()?;
                let Some(line) = lines.next() else {
                    return Ok(None);
                };
                match Command::parse(&line?, &game) {
                    Ok(Command::Move(square)) => game.make_move(square),
                    Ok(Command::Undo) => {
                        if !undo_to_human(&mut game, is_human) {
                            writeln!(out, "Nothing to undo")?;
                            continue;
                        }
                    }
                    Ok(Command::Quit) => return Ok(None),
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        continue;
                    }
                }
            }
        }
        write_board(&mut out, game.board())?;
    }
    Ok(Some(game))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use tttnet_engine::Outcome;
    use tttnet_evaluator::{player::RandomPlayer, smart::SmartPlayer};

    use super::*;

    fn run<'a>(x: &mut Seat<'a>, o: &mut Seat<'a>, input: &str) -> (Option<Game>, String) {
        let mut out = Vec::new();
        let mut rng = Pcg32::seed_from_u64(0);
        let game = play(x, o, Cursor::new(input), &mut out, &mut rng).unwrap();
        (game, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        let mut game = Game::new();
        game.make_move(4);
        assert_eq!(Command::parse("1\n", &game), Ok(Command::Move(0)));
        assert_eq!(Command::parse(" u ", &game), Ok(Command::Undo));
        assert_eq!(Command::parse("q", &game), Ok(Command::Quit));
        assert_eq!(
            Command::parse("5", &game),
            Err(CommandError::Occupied { number: 5 })
        );
        assert_eq!(Command::parse("0", &game), Err(CommandError::Unknown));
        assert_eq!(Command::parse("10", &game), Err(CommandError::Unknown));
        assert_eq!(Command::parse("x", &game), Err(CommandError::Unknown));
    }

    #[test]
    fn test_board_rows_number_empty_squares() {
        let board: Board = "X--/-O-/---".parse().unwrap();
        let rows = board_rows(board).collect::<Vec<_>>();
        assert_eq!(rows, ["X23", "4O6", "789"]);
    }

    #[test]
    fn test_undo_returns_to_human_turn() {
        let mut game = Game::new();
        game.make_move(0);
        game.make_move(4);
        // X is human, O is an AI: undo takes back both moves.
        assert!(undo_to_human(&mut game, |piece| piece == Piece::X));
        assert_eq!(game.board(), Board::EMPTY);
        assert_eq!(game.turn(), Piece::X);
        assert!(!undo_to_human(&mut game, |piece| piece == Piece::X));
    }

    #[test]
    fn test_humans_play_a_full_game() {
        // X takes the top row; O's occupied reply is rejected and retried.
        let input = "1\n4\n2\n1\n5\n3\n";
        let (game, out) = run(&mut Seat::Human, &mut Seat::Human, input);
        let game = game.unwrap();
        assert_eq!(game.winner(), Some(Outcome::Win(Piece::X)));
        assert!(out.contains("square 1 is already taken"), "{out}");
    }

    #[test]
    fn test_undo_against_ai() {
        let mut o = Seat::Ai(Box::new(SmartPlayer::default()));
        let (game, out) = run(&mut Seat::Human, &mut o, "1\nu\nu\nq\n");
        assert!(game.is_none());
        assert!(out.contains("O plays"), "{out}");
        assert!(out.contains("Nothing to undo"), "{out}");
    }

    #[test]
    fn test_input_end_stops_the_game() {
        let mut x = Seat::Ai(Box::new(RandomPlayer));
        let (game, out) = run(&mut x, &mut Seat::Human, "");
        assert!(game.is_none());
        assert!(out.contains("X plays"), "{out}");
    }
}
