//! Tracking the best individual seen across generations.

use serde::{Deserialize, Serialize};
use tttnet_evaluator::network::{Network, NetworkError, NetworkParams};

use crate::genetic::{Fitness, Generation, Individual};

/// Snapshot of an individual that was the best so far when recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub score: usize,
    pub age: usize,
    pub id: usize,
    pub generation: u64,
    pub net: NetworkParams,
}

impl ChampionRecord {
    /// Returns `None` for an unevaluated individual.
    #[must_use]
    pub fn new(individual: &Individual, generation: u64) -> Option<Self> {
        let Fitness { age, score } = individual.fitness()?;
        Some(Self {
            score,
            age,
            id: individual.id(),
            generation,
            net: individual.net().export(),
        })
    }

    #[must_use]
    pub fn fitness(&self) -> Fitness {
        Fitness {
            age: self.age,
            score: self.score,
        }
    }

    pub fn network(&self) -> Result<Network, NetworkError> {
        Network::from_parameters(&self.net)
    }
}

/// Overall best individual plus the history of every improvement ("jumps").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChampionTracker {
    best: Option<ChampionRecord>,
    jumps: Vec<ChampionRecord>,
}

impl ChampionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes tracking from saved state.
    #[must_use]
    pub fn restore(best: Option<ChampionRecord>, jumps: Vec<ChampionRecord>) -> Self {
        Self { best, jumps }
    }

    #[must_use]
    pub fn best(&self) -> Option<&ChampionRecord> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn jumps(&self) -> &[ChampionRecord] {
        &self.jumps
    }

    /// Records the head of an ordered generation if it is strictly better
    /// than the current champion. Returns whether the champion changed.
    ///
    /// # Panics
    ///
    /// Panics unless the generation is evaluated and ordered.
    pub fn observe(&mut self, generation: &Generation) -> bool {
        assert!(generation.is_ordered(), "champions come from ordered generations");
        let Some(record) = generation
            .best()
            .and_then(|top| ChampionRecord::new(top, generation.id()))
        else {
            return false;
        };
        if self
            .best
            .as_ref()
            .is_some_and(|best| record.fitness() <= best.fitness())
        {
            return false;
        }
        self.jumps.push(record.clone());
        self.best = Some(record);
        true
    }
}
