use anyhow::Context;
use serde::{Deserialize, Serialize};
use tttnet_training::{
    champion::{ChampionRecord, ChampionTracker},
    exchange::GenerationExport,
    genetic::Generation,
};

/// Everything needed to resume training: the next generation to evaluate and
/// the champion history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingState {
    pub generation: GenerationExport,
    pub best: Option<ChampionRecord>,
    pub jumps: Vec<ChampionRecord>,
}

impl TrainingState {
    pub fn new(generation: &Generation, champions: &ChampionTracker) -> Self {
        Self {
            generation: generation.export(),
            best: champions.best().cloned(),
            jumps: champions.jumps().to_vec(),
        }
    }

    pub fn restore(self) -> anyhow::Result<(Generation, ChampionTracker)> {
        let generation = Generation::import(&self.generation).with_context(|| {
            format!("Saved generation {} is invalid", self.generation.id)
        })?;
        for record in self.best.iter().chain(&self.jumps) {
            record.network().with_context(|| {
                format!(
                    "Saved champion {} of generation {} is invalid",
                    record.id, record.generation
                )
            })?;
        }
        Ok((generation, ChampionTracker::restore(self.best, self.jumps)))
    }
}
