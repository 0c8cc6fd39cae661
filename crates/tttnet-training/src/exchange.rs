//! Exchange formats for individuals and generations.
//!
//! ```text
//! Individual:  { "id": 3, "net": { "thresholds": [...], "weights": [...] } }
//! Generation:  { "id": 12, "individuals": [Individual, ...] }
//! ```
//!
//! The same generation format serves persistence and dispatch to evaluation
//! units; a dispatched document carries only the unit's [`Chunk`]. Fitness is
//! not part of either format. Both fields of each object are required, so a
//! document missing one fails to deserialize.

use std::{collections::HashSet, ops::Range};

use serde::{Deserialize, Serialize};
use tttnet_evaluator::network::{Network, NetworkError, NetworkParams};

use crate::genetic::{ArchitectureError, Generation, Individual};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualExport {
    pub id: usize,
    pub net: NetworkParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationExport {
    pub id: u64,
    pub individuals: Vec<IndividualExport>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ImportError {
    #[display("individual {id}: {source}")]
    Network { id: usize, source: NetworkError },
    #[display("individual {id}: {source}")]
    Architecture {
        id: usize,
        source: ArchitectureError,
    },
    #[display("individual {id} appears more than once")]
    DuplicateId { id: usize },
    #[display("individual {id} has layers {actual:?}, expected {expected:?}")]
    TopologyMismatch {
        id: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Slice `index` of a generation split into `total` contiguous parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub total: usize,
}

impl Chunk {
    /// The whole generation as a single chunk.
    pub const WHOLE: Self = Self { index: 0, total: 1 };

    /// Returns every chunk of a `total`-way split, in order.
    ///
    /// # Panics
    ///
    /// Panics if `total` is zero.
    pub fn split(total: usize) -> impl Iterator<Item = Self> {
        assert!(total > 0, "cannot split into zero chunks");
        (0..total).map(move |index| Self { index, total })
    }

    /// Returns the index range this chunk covers in a list of `len` items.
    ///
    /// Boundaries are `round(i * len / total)`, rounding halves up, so chunk
    /// sizes differ by at most one and consecutive chunks tile `0..len`.
    ///
    /// # Panics
    ///
    /// Panics if `total` is zero or `index >= total`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tttnet_training::exchange::Chunk;
    ///
    /// let ranges = Chunk::split(4).map(|c| c.range(10)).collect::<Vec<_>>();
    /// assert_eq!(ranges, [0..3, 3..5, 5..8, 8..10]);
    /// ```
    #[must_use]
    pub fn range(self, len: usize) -> Range<usize> {
        assert!(self.index < self.total, "chunk index out of range");
        let boundary = |i: usize| (2 * i * len + self.total) / (2 * self.total);
        boundary(self.index)..boundary(self.index + 1)
    }
}

impl Individual {
    #[must_use]
    pub fn export(&self) -> IndividualExport {
        IndividualExport {
            id: self.id(),
            net: self.net().export(),
        }
    }

    /// Rebuilds an unevaluated individual, checking the network shape and
    /// the 18-input 1-output architecture.
    pub fn import(export: &IndividualExport) -> Result<Self, ImportError> {
        let id = export.id;
        let net = Network::from_parameters(&export.net)
            .map_err(|source| ImportError::Network { id, source })?;
        Self::new(id, net).map_err(|source| ImportError::Architecture { id, source })
    }
}

impl Generation {
    /// Exports every individual.
    #[must_use]
    pub fn export(&self) -> GenerationExport {
        self.export_chunk(Chunk::WHOLE)
    }

    /// Exports the individuals in `chunk` under this generation's id.
    #[must_use]
    pub fn export_chunk(&self, chunk: Chunk) -> GenerationExport {
        let individuals = &self.individuals()[chunk.range(self.len())];
        GenerationExport {
            id: self.id(),
            individuals: individuals.iter().map(Individual::export).collect(),
        }
    }

    /// Rebuilds a generation, keeping the exported ids.
    ///
    /// Ids must be unique and every network must share the first one's layer
    /// sizes, since breeding splices networks parameter by parameter.
    pub fn import(export: &GenerationExport) -> Result<Self, ImportError> {
        let mut seen = HashSet::new();
        let mut expected: Option<Vec<usize>> = None;
        let mut individuals = Vec::with_capacity(export.individuals.len());
        for individual in &export.individuals {
            let individual = Individual::import(individual)?;
            let id = individual.id();
            if !seen.insert(id) {
                return Err(ImportError::DuplicateId { id });
            }
            let actual = individual.net().sizes();
            match &expected {
                Some(expected) if *expected != actual => {
                    return Err(ImportError::TopologyMismatch {
                        id,
                        expected: expected.clone(),
                        actual,
                    });
                }
                Some(_) => {}
                None => expected = Some(actual),
            }
            individuals.push(individual);
        }
        Ok(Self::new(export.id, individuals))
    }
}
