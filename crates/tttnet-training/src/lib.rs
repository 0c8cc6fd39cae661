//! Training system evolving tic-tac-toe networks with a genetic algorithm.
//!
//! # How Training Works
//!
//! 1. **Population** - [`genetic::Generation::new_random`] creates random
//!    networks, optionally seeded with imported ones
//! 2. **Evaluation** - Each network is scored against every undecided
//!    position of the [`test_boards`] set, with the full-depth minimax player
//!    as the oracle
//! 3. **Distribution** - The generation is split into chunks evaluated by
//!    independent units and the reports are merged back ([`distributed`])
//! 4. **Ordering** - Individuals are sorted by age, then score
//! 5. **Reproduction** - Clones of the best, then biased selection,
//!    crossover and mutation fill the next generation ([`operators`])
//! 6. **Repeat**
//!
//! # Architecture
//!
//! ```text
//! EvaluationPool (coordinator)
//!     ↓ dispatches GenerationExport chunks
//! evaluation units ── Individual::evaluate ── NeuralPlayer vs SmartPlayer oracle
//!     ↓ reply EvaluationReport
//! ReportMerge (fatal ProtocolError on any inconsistency)
//!     ↓
//! Generation::order → ChampionTracker::observe → Generation::next
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng as _;
//! use tttnet_training::{
//!     distributed::EvaluationPool,
//!     genetic::{EvolutionParams, Generation, GenerationParams},
//! };
//!
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
//! let mut generation = Generation::new_random(&GenerationParams::default(), vec![], &mut rng)?;
//! let mut pool = EvaluationPool::new(4);
//! for _ in 0..10 {
//!     pool.evaluate(&mut generation)?;
//!     generation.order(&mut rng);
//!     generation = generation.next(&EvolutionParams::default(), &mut rng);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Current Limitations
//!
//! - **No timeouts**: a unit that never replies stalls the coordinator. Units
//!   that exit are detected and reported as errors.
//! - **No cancellation**: a dispatched generation always runs to completion;
//!   training can only stop between generations.
//! - **Fixed topology**: networks never grow or shrink during training.

pub mod champion;
pub mod distributed;
pub mod exchange;
pub mod genetic;
pub mod operators;
pub mod summary;
pub mod test_boards;
