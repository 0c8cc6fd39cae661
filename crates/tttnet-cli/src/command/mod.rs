use clap::{Parser, Subcommand};

use self::{evaluate::EvaluateArg, play::PlayArg, train::TrainArg};

mod evaluate;
mod play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve networks with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Play tic-tac-toe against or between AI players
    Play(#[clap(flatten)] PlayArg),
    /// Score a saved model against the test boards
    Evaluate(#[clap(flatten)] EvaluateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
    }
    Ok(())
}
