//! Move selection and the game driver.

use rand::{RngCore, seq::IndexedRandom as _};
use tttnet_engine::{Game, Piece, SQUARE_COUNT, Squares};

/// A move chooser for either side.
///
/// [`candidate_moves`](Player::candidate_moves) returns every move the player
/// considers equally good; [`select_move`](Player::select_move) picks one of
/// them uniformly at random.
pub trait Player {
    fn candidate_moves(&mut self, game: &Game) -> Squares;

    fn select_move(&mut self, game: &Game, rng: &mut dyn RngCore) -> Option<usize> {
        self.candidate_moves(game).choose(rng).copied()
    }
}

/// Picks uniformly among all empty squares.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPlayer;

impl Player for RandomPlayer {
    fn candidate_moves(&mut self, game: &Game) -> Squares {
        game.empty_squares()
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum InvalidMoveError {
    #[display("{player} AI chose no move in {game}")]
    NoMove { player: Piece, game: String },
    #[display("{player} AI chose invalid move {square} in {game}")]
    Occupied {
        player: Piece,
        square: usize,
        game: String,
    },
}

/// Asks `player` for a move in `game` and checks that the square is free.
///
/// An AI choosing no move or an occupied square is a bug in that AI.
pub fn checked_move(
    player: &mut dyn Player,
    game: &Game,
    rng: &mut dyn RngCore,
) -> Result<usize, InvalidMoveError> {
    let turn = game.turn();
    let Some(square) = player.select_move(game, rng) else {
        return Err(InvalidMoveError::NoMove {
            player: turn,
            game: game.to_string(),
        });
    };
    if square >= SQUARE_COUNT || game.piece(square).is_some() {
        return Err(InvalidMoveError::Occupied {
            player: turn,
            square,
            game: game.to_string(),
        });
    }
    Ok(square)
}

/// Plays a full game from the empty board and returns the finished game.
///
/// An invalid AI move ends the game with an error.
pub fn play_game(
    x: &mut dyn Player,
    o: &mut dyn Player,
    rng: &mut dyn RngCore,
) -> Result<Game, InvalidMoveError> {
    let mut game = Game::new();
    while game.winner().is_none() {
        let player: &mut dyn Player = match game.turn() {
            Piece::X => &mut *x,
            Piece::O => &mut *o,
        };
        let square = checked_move(player, &game, rng)?;
        game.make_move(square);
    }
    Ok(game)
}
