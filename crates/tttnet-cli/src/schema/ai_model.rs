use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tttnet_evaluator::network::{Network, NetworkParams};
use tttnet_training::{
    champion::ChampionRecord,
    exchange::IndividualExport,
    genetic::{Fitness, Individual},
};

/// A trained network saved for later play or evaluation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub generation: u64,
    pub id: usize,
    pub age: usize,
    pub score: usize,
    pub net: NetworkParams,
}

impl AiModel {
    pub fn from_champion(name: String, record: &ChampionRecord) -> Self {
        Self {
            name,
            trained_at: Utc::now(),
            generation: record.generation,
            id: record.id,
            age: record.age,
            score: record.score,
            net: record.net.clone(),
        }
    }

    pub fn fitness(&self) -> Fitness {
        Fitness {
            age: self.age,
            score: self.score,
        }
    }

    /// Rebuilds the individual, checking the network architecture.
    pub fn to_individual(&self) -> anyhow::Result<Individual> {
        let export = IndividualExport {
            id: self.id,
            net: self.net.clone(),
        };
        Individual::import(&export)
            .with_context(|| format!("Model {} has an unusable network", self.name))
    }

    pub fn to_network(&self) -> anyhow::Result<Network> {
        Ok(self.to_individual()?.net().clone())
    }
}
