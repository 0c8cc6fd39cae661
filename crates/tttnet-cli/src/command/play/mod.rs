use std::{
    io,
    path::{Path, PathBuf},
};

use tttnet_engine::{Board, Game, Outcome, Piece};
use tttnet_evaluator::{
    network::Network,
    neural::NeuralPlayer,
    player::{self, RandomPlayer},
    smart::{FULL_DEPTH, SmartPlayer},
};

use self::manual::Seat;
use crate::util;

mod manual;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum PlayerKind {
    Human,
    Smart,
    /// Smart player searching a single ply
    Easy,
    Random,
    Neural,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Player for X (human, smart, easy, random or neural)
    #[arg(long, default_value = "smart")]
    x: PlayerKind,
    /// Player for O (human, smart, easy, random or neural)
    #[arg(long, default_value = "smart")]
    o: PlayerKind,
    /// Model file for a neural X player
    #[arg(long)]
    x_model: Option<PathBuf>,
    /// Model file for a neural O player
    #[arg(long)]
    o_model: Option<PathBuf>,
    /// Search depth of smart players
    #[arg(long, default_value_t = FULL_DEPTH, value_parser = clap::value_parser!(u32).range(1..=7))]
    depth: u32,
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: usize,
    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            x: PlayerKind::Smart,
            o: PlayerKind::Smart,
            x_model: None,
            o_model: None,
            depth: FULL_DEPTH,
            games: 1,
            seed: None,
        }
    }
}

/// A player with everything it needs loaded.
#[derive(Debug)]
enum PlayerSetup {
    Human,
    Smart(SmartPlayer),
    Random(RandomPlayer),
    Neural(Network),
}

impl PlayerSetup {
    fn load(
        kind: PlayerKind,
        model: Option<&Path>,
        depth: u32,
        side: Piece,
    ) -> anyhow::Result<Self> {
        let flag = side.as_char().to_ascii_lowercase();
        let setup = match (kind, model) {
            (PlayerKind::Neural, Some(path)) => {
                let model = util::read_ai_model_file(path)?;
                eprintln!(
                    "{side}: model {} (generation {}, age {}, score {})",
                    model.name, model.generation, model.age, model.score
                );
                Self::Neural(model.to_network()?)
            }
            (PlayerKind::Neural, None) => {
                anyhow::bail!("a neural {side} player needs --{flag}-model")
            }
            (_, Some(_)) => anyhow::bail!("--{flag}-model needs a neural {side} player"),
            (PlayerKind::Human, None) => Self::Human,
            (PlayerKind::Smart, None) => Self::Smart(SmartPlayer::new(depth)),
            (PlayerKind::Easy, None) => Self::Smart(SmartPlayer::new(1)),
            (PlayerKind::Random, None) => Self::Random(RandomPlayer),
        };
        Ok(setup)
    }

    fn seat(&mut self) -> Seat<'_> {
        match self {
            Self::Human => Seat::Human,
            Self::Smart(smart) => Seat::Ai(Box::new(*smart)),
            Self::Random(random) => Seat::Ai(Box::new(*random)),
            Self::Neural(net) => Seat::Ai(Box::new(NeuralPlayer::new(net))),
        }
    }
}

fn print_board(board: Board) {
    for row in board.to_string().split('/') {
        println!("  {row}");
    }
}

fn print_game(game: &Game) {
    let positions = game.history().iter().skip(1).copied();
    for (ply, board) in positions.chain([game.board()]).enumerate() {
        println!("Move {}:", ply + 1);
        print_board(board);
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        x,
        o,
        x_model,
        o_model,
        depth,
        games,
        seed,
    } = arg;

    let mut x_setup = PlayerSetup::load(*x, x_model.as_deref(), *depth, Piece::X)?;
    let mut o_setup = PlayerSetup::load(*o, o_model.as_deref(), *depth, Piece::O)?;
    let mut rng = util::make_rng(*seed);
    let mut x_seat = x_setup.seat();
    let mut o_seat = o_setup.seat();

    let (mut x_wins, mut o_wins, mut ties) = (0, 0, 0);
    for i in 0..*games {
        println!("Game {} ({x:?} vs {o:?}):", i + 1);
        let game = if let (Seat::Ai(x_player), Seat::Ai(o_player)) = (&mut x_seat, &mut o_seat) {
            let game = player::play_game(x_player.as_mut(), o_player.as_mut(), &mut rng)?;
            print_game(&game);
            game
        } else {
            let stdin = io::stdin().lock();
            match manual::play(&mut x_seat, &mut o_seat, stdin, io::stdout(), &mut rng)? {
                Some(game) => game,
                None => break,
            }
        };
        match game.winner() {
            Some(Outcome::Win(Piece::X)) => {
                x_wins += 1;
                println!("X wins");
            }
            Some(Outcome::Win(Piece::O)) => {
                o_wins += 1;
                println!("O wins");
            }
            _ => {
                ties += 1;
                println!("Tie");
            }
        }
        println!();
    }

    eprintln!("X ({x:?}) won {x_wins}, O ({o:?}) won {o_wins}, {ties} ties");
    Ok(())
}
