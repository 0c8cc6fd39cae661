//! Tic-tac-toe game model.
//!
//! - [`Board`] - Bit-packed position value (2 bits per square)
//! - [`Game`] - Board plus turn and move history, with `make_move`/`undo`
//! - [`Piece`] / [`Outcome`] - Player marks and decided results
//!
//! Boards are immutable `Copy` values. Rendering is left to callers; the
//! `Display` impls produce a compact text form (`XO-/-X-/--O`) suitable for
//! terminals and logs.

pub use self::{board::*, game::*};

mod board;
mod game;
