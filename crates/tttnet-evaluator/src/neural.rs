//! Network-driven player.

use tttnet_engine::{Board, Game, Piece, SQUARE_COUNT, Squares};

use crate::{network::Network, player::Player, smart::top_scoring};

/// Number of network inputs: a "mine" and an "opponent's" flag per square.
pub const INPUT_SIZE: usize = 2 * SQUARE_COUNT;

/// Encodes `board` from `turn`'s point of view.
///
/// Input `2 * i` is set when square `i` holds `turn`'s piece and `2 * i + 1`
/// when it holds the opponent's.
#[must_use]
pub fn encode_inputs(board: Board, turn: Piece) -> [f64; INPUT_SIZE] {
    let mut inputs = [0.0; INPUT_SIZE];
    for (square, piece) in board.squares().enumerate() {
        match piece {
            Some(p) if p == turn => inputs[square * 2] = 1.0,
            Some(_) => inputs[square * 2 + 1] = 1.0,
            None => {}
        }
    }
    inputs
}

/// Rates each empty square by running the network on the board after the
/// move, and keeps every move tied for the highest output.
#[derive(Debug)]
pub struct NeuralPlayer<'a> {
    net: &'a mut Network,
}

impl<'a> NeuralPlayer<'a> {
    /// # Panics
    ///
    /// Panics if the network does not have [`INPUT_SIZE`] inputs and a single
    /// output.
    #[must_use]
    pub fn new(net: &'a mut Network) -> Self {
        assert_eq!(net.input_size(), INPUT_SIZE);
        assert_eq!(net.output_size(), 1);
        Self { net }
    }

    fn rate(&mut self, board: Board, turn: Piece) -> f64 {
        self.net.reset();
        self.net.run(&encode_inputs(board, turn))[0]
    }
}

impl Player for NeuralPlayer<'_> {
    fn candidate_moves(&mut self, game: &Game) -> Squares {
        let board = game.board();
        let turn = game.turn();
        top_scoring(&game.empty_squares(), |mv| self.rate(board.with_move(mv, turn), turn)).1
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn center_seeker() -> Network {
        let mut net = Network::from_sizes(&[INPUT_SIZE, 1]).unwrap();
        let mut thresholds = vec![vec![2.0; INPUT_SIZE], vec![1.0]];
        thresholds[0][8] = 1.0;
        net.set_thresholds(&thresholds).unwrap();
        net.set_weights(&[vec![vec![1.0]; INPUT_SIZE]]).unwrap();
        net
    }

    #[test]
    fn test_encode_inputs() {
        let board: Board = "X--/-O-/---".parse().unwrap();
        let x = encode_inputs(board, Piece::X);
        assert_eq!(x[0], 1.0);
        assert_eq!(x[9], 1.0);
        assert_eq!(x.iter().sum::<f64>(), 2.0);

        let o = encode_inputs(board, Piece::O);
        assert_eq!(o[1], 1.0);
        assert_eq!(o[8], 1.0);
        assert_eq!(o.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn test_network_picks_center() {
        let mut net = center_seeker();
        let mut player = NeuralPlayer::new(&mut net);
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(player.candidate_moves(&Game::new()).as_slice(), &[4]);
        assert_eq!(player.select_move(&Game::new(), &mut rng), Some(4));
    }

    #[test]
    fn test_untrained_network_ties_everything() {
        let mut net = Network::from_sizes(&[INPUT_SIZE, 9, 1]).unwrap();
        let mut player = NeuralPlayer::new(&mut net);
        let mut game = Game::new();
        game.make_move(0);
        assert_eq!(player.candidate_moves(&game), game.empty_squares());
    }

    #[test]
    #[should_panic(expected = "assertion")]
    fn test_rejects_wrong_architecture() {
        let mut net = Network::from_sizes(&[2, 1]).unwrap();
        let _ = NeuralPlayer::new(&mut net);
    }
}
