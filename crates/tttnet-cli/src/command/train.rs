use std::{path::PathBuf, time::Instant};

use anyhow::Context;
use tttnet_evaluator::neural::INPUT_SIZE;
use tttnet_training::{
    champion::ChampionTracker,
    distributed::EvaluationPool,
    genetic::{EvolutionParams, Generation, GenerationParams},
    operators::Perturbation,
    summary::GenerationSummary,
};

use crate::{
    schema::{ai_model::AiModel, training_state::TrainingState},
    util::{self, Output},
};

fn parse_mutation_rate(s: &str) -> Result<f64, String> {
    let rate = s.parse::<f64>().map_err(|e| e.to_string())?;
    if !(0.0001..=0.1).contains(&rate) {
        return Err(format!("{rate} is not in 0.0001..=0.1"));
    }
    Ok(rate)
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of parallel evaluation units
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=16))]
    workers: u8,
    /// Individuals per generation
    #[arg(long, default_value_t = 100, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    population: usize,
    /// Layer sizes of new networks, input first
    #[arg(long, value_delimiter = ',', default_value = "18,27,9,1")]
    layers: Vec<usize>,
    /// Probability of perturbing each parameter of a child
    #[arg(long, default_value_t = 0.03, value_parser = parse_mutation_rate)]
    mutation_rate: f64,
    /// Top individuals copied unchanged into the next generation
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=20))]
    clones: u8,
    /// Stop after this many generations (runs until interrupted otherwise)
    #[arg(long)]
    generations: Option<u64>,
    /// Resume from and save progress to this file
    #[arg(long)]
    state: Option<PathBuf>,
    /// Ignore an existing state file and start over
    #[arg(long)]
    reset: bool,
    /// Models whose networks seed a new population
    #[arg(long = "import")]
    imports: Vec<PathBuf>,
    /// Name stored in the saved model
    #[arg(long, default_value = "champion")]
    name: String,
    /// Output file path for the champion model
    #[arg(long)]
    output: Option<PathBuf>,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        workers,
        population,
        layers,
        mutation_rate,
        clones,
        generations,
        state,
        reset,
        imports,
        name,
        output,
        seed,
    } = arg;

    let mut rng = util::make_rng(*seed);
    let params = EvolutionParams {
        mutation_rate: *mutation_rate,
        clones: usize::from(*clones),
        perturbation: Perturbation::default(),
    };

    let resume = state.as_ref().filter(|path| !reset && path.exists());
    let (mut generation, mut champions) = if let Some(path) = resume {
        let (generation, champions) = util::read_training_state_file(path)?.restore()?;
        eprintln!(
            "Resumed generation #{} ({} individuals, {} champion jumps) from {}",
            generation.id(),
            generation.len(),
            champions.jumps().len(),
            path.display()
        );
        (generation, champions)
    } else {
        if layers.first() != Some(&INPUT_SIZE) || layers.last() != Some(&1) {
            anyhow::bail!("--layers must start with {INPUT_SIZE} and end with 1");
        }
        let imported = imports
            .iter()
            .map(|path| util::read_ai_model_file(path)?.to_individual())
            .collect::<anyhow::Result<Vec<_>>>()?;
        let generation_params = GenerationParams {
            size: *population,
            layers: layers.clone(),
            perturbation: Perturbation::default(),
        };
        let generation = Generation::new_random(&generation_params, imported, &mut rng)
            .context("Failed to create the initial generation")?;
        eprintln!(
            "Created generation #0 ({} individuals, layers {layers:?})",
            generation.len()
        );
        (generation, ChampionTracker::new())
    };

    let mut pool = EvaluationPool::new(usize::from(*workers));
    let mut completed = 0;
    while generations.is_none_or(|max| completed < max) {
        let begin = Instant::now();
        pool.evaluate(&mut generation)
            .with_context(|| format!("Failed to evaluate generation #{}", generation.id()))?;
        generation.order(&mut rng);
        let elapsed = begin.elapsed();

        let jumped = champions.observe(&generation);
        eprintln!("Generation #{} ({elapsed:.2?}):", generation.id());
        eprintln!("  {}", GenerationSummary::new(&generation));
        if jumped {
            if let Some(best) = champions.best() {
                eprintln!(
                    "  New champion: #{} of generation {} (age {}, score {})",
                    best.id, best.generation, best.age, best.score
                );
            }
        }

        generation = generation.next(&params, &mut rng);
        completed += 1;

        if let Some(path) = state {
            let state = TrainingState::new(&generation, &champions);
            Output::replace_json(&state, path)?;
        }
    }

    eprintln!("Training stopped after {completed} generations.");
    eprintln!("Champion history:");
    for jump in champions.jumps() {
        eprintln!(
            "  generation {:4}: #{:3} age {} score {}",
            jump.generation, jump.id, jump.age, jump.score
        );
    }

    let Some(best) = champions.best() else {
        eprintln!("No champion to save.");
        return Ok(());
    };
    let model = AiModel::from_champion(name.clone(), best);
    Output::save_json(&model, output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Fitness: age {} score {}", model.age, model.score);

    Ok(())
}
