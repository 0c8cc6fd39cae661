//! Per-generation statistics for progress output.

use std::fmt;

use crate::genetic::{AGE_MAX, Fitness, Generation};

/// Statistics over the evaluated individuals of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub generation: u64,
    pub evaluated: usize,
    /// Id and fitness of the first individual (the best once ordered)
    pub best: Option<(usize, Fitness)>,
    pub mean_score: f64,
    /// Number of individuals per age, index = age
    pub age_counts: [usize; AGE_MAX + 1],
}

impl GenerationSummary {
    /// Summarizes `generation`, skipping unevaluated individuals.
    #[must_use]
    pub fn new(generation: &Generation) -> Self {
        let mut age_counts = [0; AGE_MAX + 1];
        let mut total_score = 0;
        let mut evaluated = 0;
        for fitness in generation.fitnesses() {
            age_counts[fitness.age.min(AGE_MAX)] += 1;
            total_score += fitness.score;
            evaluated += 1;
        }
        #[expect(clippy::cast_precision_loss)]
        let mean_score = if evaluated == 0 {
            0.0
        } else {
            total_score as f64 / evaluated as f64
        };
        let best = generation
            .best()
            .and_then(|best| Some((best.id(), best.fitness()?)));
        Self {
            generation: generation.id(),
            evaluated,
            best,
            mean_score,
            age_counts,
        }
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation {}: ", self.generation)?;
        match self.best {
            Some((id, Fitness { age, score })) => {
                write!(f, "best #{id} age {age} score {score}")?;
            }
            None => write!(f, "no evaluated individuals")?,
        }
        write!(f, ", mean score {:.1}, ages", self.mean_score)?;
        for (age, count) in self.age_counts.iter().enumerate() {
            if *count > 0 {
                write!(f, " {age}:{count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tttnet_evaluator::{network::Network, neural::INPUT_SIZE};

    use super::*;
    use crate::genetic::Individual;

    #[test]
    fn test_summary() {
        let net = Network::from_sizes(&[INPUT_SIZE, 1]).unwrap();
        let individuals = [(2, 40), (1, 25), (1, 10), (0, 5)]
            .into_iter()
            .enumerate()
            .map(|(id, (age, score))| {
                let mut individual = Individual::new(id, net.clone()).unwrap();
                individual.set_fitness(Some(Fitness { age, score }));
                individual
            })
            .collect();
        let summary = GenerationSummary::new(&Generation::new(7, individuals));
        assert_eq!(summary.evaluated, 4);
        assert_eq!(summary.best, Some((0, Fitness { age: 2, score: 40 })));
        assert!((summary.mean_score - 20.0).abs() < 1e-9);
        assert_eq!(&summary.age_counts[..3], &[1, 2, 1]);
        assert_eq!(
            summary.to_string(),
            "generation 7: best #0 age 2 score 40, mean score 20.0, ages 0:1 1:2 2:1"
        );
    }

    #[test]
    fn test_summary_of_unevaluated_generation() {
        let net = Network::from_sizes(&[INPUT_SIZE, 1]).unwrap();
        let generation = Generation::new(0, vec![Individual::new(0, net).unwrap()]);
        let summary = GenerationSummary::new(&generation);
        assert_eq!(summary.evaluated, 0);
        assert_eq!(summary.best, None);
        assert_eq!(summary.to_string(), "generation 0: no evaluated individuals, mean score 0.0, ages");
    }
}
