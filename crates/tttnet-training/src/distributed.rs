//! Splitting fitness evaluation across evaluation units and merging results.
//!
//! # Protocol
//!
//! ```text
//! coordinator                               unit i of n
//!     │  GenerationExport (chunk i of n)  ──►  import, evaluate every individual
//!     │  ◄── EvaluationReport { generationId, results: [{id, age, score}] }
//!     │
//!     └─ after exactly n reports: merge by id, then verify nothing is missing
//! ```
//!
//! Every [`ProtocolError`] means the coordinator and its units disagree about
//! the work in flight. It is never retried; the run must stop.
//!
//! [`EvaluationPool`] realizes units as long-lived worker threads fed through
//! channels. The pool only changes size between dispatches, which `&mut self`
//! on both [`EvaluationPool::resize`] and [`EvaluationPool::evaluate`]
//! enforces.

use std::{
    collections::{HashMap, HashSet},
    iter,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use serde::{Deserialize, Serialize};

use crate::{
    exchange::{Chunk, GenerationExport, ImportError},
    genetic::{AGE_MAX, Fitness, Generation, SCORE_MAX},
};

/// Fitness of one individual as reported by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: usize,
    pub age: usize,
    pub score: usize,
}

/// A unit's reply for its chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub generation_id: u64,
    pub results: Vec<EvaluationResult>,
}

impl EvaluationReport {
    /// Collects the fitness of every evaluated individual of `generation`.
    #[must_use]
    pub fn from_generation(generation: &Generation) -> Self {
        let results = generation
            .individuals()
            .iter()
            .filter_map(|individual| {
                let Fitness { age, score } = individual.fitness()?;
                Some(EvaluationResult {
                    id: individual.id(),
                    age,
                    score,
                })
            })
            .collect();
        Self {
            generation_id: generation.id(),
            results,
        }
    }
}

/// Runs one unit's share: imports the chunk, evaluates it and reports.
pub fn evaluate_chunk(export: &GenerationExport) -> Result<EvaluationReport, ImportError> {
    let mut generation = Generation::import(export)?;
    generation.run();
    Ok(EvaluationReport::from_generation(&generation))
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ProtocolError {
    #[display("report for generation {actual} while generation {expected} is dispatched")]
    GenerationMismatch { expected: u64, actual: u64 },
    #[display("expected {expected} reports, got {actual}")]
    ReportCount { expected: usize, actual: usize },
    #[display("generation {generation} has no individual {id}")]
    UnknownIndividual { generation: u64, id: usize },
    #[display("individual {id} of generation {generation} reported twice")]
    DuplicateResult { generation: u64, id: usize },
    #[display("individual {id} reported out of range fitness (age {age}, score {score})")]
    FitnessOutOfRange { id: usize, age: usize, score: usize },
    #[display("generation {generation} left {} individuals unevaluated: {ids:?}", ids.len())]
    Unevaluated { generation: u64, ids: Vec<usize> },
}

/// Merges unit reports into the dispatched generation.
///
/// [`apply`](Self::apply) checks each report as it arrives;
/// [`finish`](Self::finish) checks that every expected report came in and
/// every individual received a fitness.
#[derive(Debug)]
pub struct ReportMerge<'a> {
    generation: &'a mut Generation,
    slots: HashMap<usize, usize>,
    merged: HashSet<usize>,
    expected_reports: usize,
    received_reports: usize,
}

impl<'a> ReportMerge<'a> {
    pub fn new(generation: &'a mut Generation, expected_reports: usize) -> Self {
        let slots = generation
            .individuals()
            .iter()
            .enumerate()
            .map(|(slot, individual)| (individual.id(), slot))
            .collect();
        Self {
            generation,
            slots,
            merged: HashSet::new(),
            expected_reports,
            received_reports: 0,
        }
    }

    pub fn apply(&mut self, report: &EvaluationReport) -> Result<(), ProtocolError> {
        let generation = self.generation.id();
        if report.generation_id != generation {
            return Err(ProtocolError::GenerationMismatch {
                expected: generation,
                actual: report.generation_id,
            });
        }
        if self.received_reports == self.expected_reports {
            return Err(ProtocolError::ReportCount {
                expected: self.expected_reports,
                actual: self.received_reports + 1,
            });
        }
        self.received_reports += 1;

        for &EvaluationResult { id, age, score } in &report.results {
            let Some(&slot) = self.slots.get(&id) else {
                return Err(ProtocolError::UnknownIndividual { generation, id });
            };
            if !self.merged.insert(id) {
                return Err(ProtocolError::DuplicateResult { generation, id });
            }
            if age > AGE_MAX || score > SCORE_MAX {
                return Err(ProtocolError::FitnessOutOfRange { id, age, score });
            }
            self.generation.individuals_mut()[slot].set_fitness(Some(Fitness { age, score }));
        }
        Ok(())
    }

    pub fn finish(self) -> Result<(), ProtocolError> {
        if self.received_reports != self.expected_reports {
            return Err(ProtocolError::ReportCount {
                expected: self.expected_reports,
                actual: self.received_reports,
            });
        }
        let ids = self
            .generation
            .unevaluated()
            .map(|individual| individual.id())
            .collect::<Vec<_>>();
        if !ids.is_empty() {
            return Err(ProtocolError::Unevaluated {
                generation: self.generation.id(),
                ids,
            });
        }
        Ok(())
    }
}

/// Merges a complete set of reports in one call.
pub fn merge_reports(
    generation: &mut Generation,
    reports: &[EvaluationReport],
    expected_reports: usize,
) -> Result<(), ProtocolError> {
    let mut merge = ReportMerge::new(generation, expected_reports);
    for report in reports {
        merge.apply(report)?;
    }
    merge.finish()
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvaluateError {
    #[display("evaluation unit rejected its chunk: {_0}")]
    #[from]
    Import(ImportError),
    #[display("protocol violation: {_0}")]
    #[from]
    Protocol(ProtocolError),
    #[display("an evaluation unit stopped before reporting")]
    Disconnected,
}

type UnitReply = Result<EvaluationReport, ImportError>;

struct Request {
    export: GenerationExport,
    reply_tx: Sender<UnitReply>,
}

#[derive(Debug)]
struct Unit {
    request_tx: Sender<Request>,
    handle: JoinHandle<()>,
}

impl Unit {
    fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let handle = thread::spawn(move || unit_thread(&request_rx));
        Self { request_tx, handle }
    }

    fn stop(self) {
        drop(self.request_tx);
        // A panicked unit has already surfaced as `Disconnected`.
        let _ = self.handle.join();
    }
}

fn unit_thread(request_rx: &Receiver<Request>) {
    while let Ok(Request { export, reply_tx }) = request_rx.recv() {
        // The coordinator may have given up on this dispatch.
        let _ = reply_tx.send(evaluate_chunk(&export));
    }
}

/// Resizable set of evaluation units running on worker threads.
#[derive(Debug)]
pub struct EvaluationPool {
    units: Vec<Unit>,
}

impl EvaluationPool {
    /// Starts `units` worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `units` is zero.
    #[must_use]
    pub fn new(units: usize) -> Self {
        let mut pool = Self { units: vec![] };
        pool.resize(units);
        pool
    }

    #[must_use]
    pub fn units(&self) -> usize {
        self.units.len()
    }

    /// Starts or stops units until `units` are running. Stopped units finish
    /// any work they hold first.
    ///
    /// # Panics
    ///
    /// Panics if `units` is zero.
    pub fn resize(&mut self, units: usize) {
        assert!(units > 0, "evaluation pool needs at least one unit");
        while self.units.len() > units {
            if let Some(unit) = self.units.pop() {
                unit.stop();
            }
        }
        while self.units.len() < units {
            self.units.push(Unit::spawn());
        }
    }

    /// Evaluates every individual of `generation`, one chunk per unit.
    ///
    /// Existing fitness is cleared first. Blocks until every unit has
    /// reported.
    pub fn evaluate(&mut self, generation: &mut Generation) -> Result<(), EvaluateError> {
        generation.clear_fitness();
        let (reply_tx, reply_rx) = mpsc::channel();
        for (chunk, unit) in iter::zip(Chunk::split(self.units.len()), &self.units) {
            let request = Request {
                export: generation.export_chunk(chunk),
                reply_tx: reply_tx.clone(),
            };
            unit.request_tx
                .send(request)
                .map_err(|_| EvaluateError::Disconnected)?;
        }
        drop(reply_tx);

        let mut merge = ReportMerge::new(generation, self.units.len());
        for _ in 0..self.units.len() {
            let report = reply_rx.recv().map_err(|_| EvaluateError::Disconnected)??;
            merge.apply(&report)?;
        }
        merge.finish()?;
        Ok(())
    }
}

impl Drop for EvaluationPool {
    fn drop(&mut self) {
        for unit in self.units.drain(..) {
            unit.stop();
        }
    }
}
