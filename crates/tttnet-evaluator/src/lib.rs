//! Move selection for tic-tac-toe: a threshold network evaluator and the
//! players built on it.
//!
//! # Modules
//!
//! - [`network`] - Feed-forward threshold network with its exchange format
//! - [`smart`] - Depth-limited negamax player, also the fitness oracle
//! - [`neural`] - Player that rates moves by running a [`network::Network`]
//! - [`player`] - The [`player::Player`] trait, a random player and the game
//!   driver
//!
//! # Architecture
//!
//! ```text
//! play_game (alternates two players, validates moves)
//!     ↓ asks
//! Player::select_move (uniform pick among candidate_moves)
//!     ↓ implemented by
//! SmartPlayer | NeuralPlayer | RandomPlayer
//! ```
//!
//! Every player returns a *set* of equally good moves rather than one move.
//! Training compares these sets directly, while games pick one member at
//! random.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use tttnet_engine::Outcome;
//! use tttnet_evaluator::{player::play_game, smart::SmartPlayer};
//!
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
//! let game = play_game(&mut SmartPlayer::default(), &mut SmartPlayer::default(), &mut rng)?;
//! assert_eq!(game.winner(), Some(Outcome::Tie));
//! # Ok::<(), tttnet_evaluator::player::InvalidMoveError>(())
//! ```

pub mod network;
pub mod neural;
pub mod player;
pub mod smart;
