use std::{path::PathBuf, time::Instant};

use tttnet_training::genetic::{AGE_MAX, SCORE_MAX};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Model file to evaluate
    model: PathBuf,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg { model } = arg;
    let model = util::read_ai_model_file(model)?;
    let mut individual = model.to_individual()?;

    eprintln!("Evaluating model {} against the test boards...", model.name);
    let begin = Instant::now();
    let fitness = individual.evaluate();
    eprintln!("Evaluated in {:.2?}", begin.elapsed());

    println!("age:   {}/{AGE_MAX}", fitness.age);
    println!("score: {}/{SCORE_MAX}", fitness.score);
    if fitness != model.fitness() {
        eprintln!(
            "Warning: model records age {} score {}",
            model.age, model.score
        );
    }
    Ok(())
}
