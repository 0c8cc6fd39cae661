//! Genetic algorithm evolving threshold networks against the minimax oracle.
//!
//! # Algorithm Overview
//!
//! 1. **Evaluate** - Each individual is scored against the test board set
//!    ([`Individual::evaluate`]), usually split across evaluation units
//! 2. **Order** - The generation is shuffled and then sorted best first, so
//!    equal individuals end up in random order ([`Generation::order`])
//! 3. **Clone** - The top `clones` individuals are copied unchanged
//! 4. **Select** - Two parents are drawn with a bias toward the head of the
//!    ordered list ([`operators::select`])
//! 5. **Crossover** - The child starts as a copy of the first parent and takes
//!    each scalar parameter from the second with probability 1/2
//! 6. **Mutation** - Each parameter is perturbed with probability
//!    `mutation_rate`
//!
//! # Fitness
//!
//! [`Fitness`] orders by `age` first and `score` second:
//!
//! - **age** - ply of the first test board bucket on which the network picked
//!   a move the oracle does not consider optimal, or [`AGE_MAX`] when it never
//!   did. A coarse rank of how deep the network plays correctly.
//! - **score** - number of test boards on which every move the network picked
//!   is optimal. Evaluation always covers plies 0 to 3 (334 boards) before
//!   stopping at a failure, so scores of individuals of the same age stay
//!   comparable.
//!
//! An individual whose fitness has not been computed has no [`Fitness`] at
//! all, so unevaluated individuals cannot be mistaken for poor ones.

use std::cmp::Ordering;

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};
use tttnet_evaluator::{
    network::{Network, NetworkError},
    neural::{INPUT_SIZE, NeuralPlayer},
    player::Player as _,
};

use crate::{
    operators::{self, Perturbation},
    test_boards::{BOARD_COUNT, BUCKET_COUNT, TestBoardSet, test_boards},
};

/// Age of an individual that matched the oracle on every test board.
pub const AGE_MAX: usize = BUCKET_COUNT;

/// Highest possible score: one point per test board.
pub const SCORE_MAX: usize = BOARD_COUNT;

/// Buckets up to this ply are always evaluated, even after a failure.
pub const MIN_EVALUATED_PLY: usize = 3;

/// Result of evaluating an individual. Better fitness compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fitness {
    pub age: usize,
    pub score: usize,
}

/// Network with a shape other than 18 inputs and 1 output.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("network needs {INPUT_SIZE} input nodes and 1 output node, got layers {sizes:?}")]
pub struct ArchitectureError {
    pub sizes: Vec<usize>,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PopulationError {
    #[display("invalid layer sizes: {_0}")]
    #[from]
    Network(NetworkError),
    #[display("{_0}")]
    #[from]
    Architecture(ArchitectureError),
    #[display("imported individual {id} has layers {actual:?}, expected {expected:?}")]
    TopologyMismatch {
        id: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

fn check_architecture(net: &Network) -> Result<(), ArchitectureError> {
    if net.input_size() != INPUT_SIZE || net.output_size() != 1 {
        return Err(ArchitectureError { sizes: net.sizes() });
    }
    Ok(())
}

/// A candidate network and its fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    id: usize,
    net: Network,
    fitness: Option<Fitness>,
}

impl Individual {
    /// Wraps `net` as an unevaluated individual.
    pub fn new(id: usize, net: Network) -> Result<Self, ArchitectureError> {
        check_architecture(&net)?;
        Ok(Self {
            id,
            net,
            fitness: None,
        })
    }

    /// Creates an individual whose every parameter is perturbed from the
    /// defaults of [`Network::from_sizes`].
    pub fn random<R>(
        id: usize,
        sizes: &[usize],
        perturbation: Perturbation,
        rng: &mut R,
    ) -> Result<Self, PopulationError>
    where
        R: Rng + ?Sized,
    {
        let mut net = Network::from_sizes(sizes)?;
        operators::randomize(&mut net, 1.0, perturbation, rng);
        Ok(Self::new(id, net)?)
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn net(&self) -> &Network {
        &self.net
    }

    /// Returns the fitness, or `None` before evaluation.
    #[must_use]
    pub fn fitness(&self) -> Option<Fitness> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: Option<Fitness>) {
        self.fitness = fitness;
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    /// Orders by fitness, worst first. Unevaluated individuals sort lowest.
    #[must_use]
    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.fitness.cmp(&b.fitness)
    }

    /// Scores the network against the process-wide test board set.
    pub fn evaluate(&mut self) -> Fitness {
        self.evaluate_with(test_boards())
    }

    /// Scores the network against `boards` and stores the result.
    pub fn evaluate_with(&mut self, boards: &TestBoardSet) -> Fitness {
        let mut player = NeuralPlayer::new(&mut self.net);
        let mut score = 0;
        let mut failed_ply = None;

        for (ply, bucket) in boards.buckets().iter().enumerate() {
            for test_board in bucket {
                let chosen = player.candidate_moves(&test_board.game());
                let right = test_board.right_moves();
                if !chosen.is_empty() && chosen.iter().all(|mv| right.contains(mv)) {
                    score += 1;
                } else if failed_ply.is_none() {
                    failed_ply = Some(ply);
                }
            }
            if failed_ply.is_some() && ply >= MIN_EVALUATED_PLY {
                break;
            }
        }

        let fitness = Fitness {
            age: failed_ply.unwrap_or(boards.buckets().len()),
            score,
        };
        self.fitness = Some(fitness);
        fitness
    }

    /// Copies the network under a new id, without fitness.
    #[must_use]
    pub fn clone_with_id(&self, id: usize) -> Self {
        Self {
            id,
            net: self.net.clone(),
            fitness: None,
        }
    }

    /// Creates a child from a copy of `self` spliced with `other`.
    ///
    /// Neither parent is modified.
    #[must_use]
    pub fn reproduce<R>(&self, id: usize, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut child = self.clone_with_id(id);
        operators::splice(&mut child.net, &other.net, rng);
        child
    }

    /// Perturbs each parameter with probability `rate`.
    pub fn mutate<R>(&mut self, rate: f64, perturbation: Perturbation, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        operators::randomize(&mut self.net, rate, perturbation, rng);
    }
}

/// Parameters controlling how one generation produces the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionParams {
    /// Probability of perturbing each parameter of a child
    pub mutation_rate: f64,
    /// Number of top individuals copied unchanged
    pub clones: usize,
    pub perturbation: Perturbation,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            mutation_rate: 0.05,
            clones: 0,
            perturbation: Perturbation::default(),
        }
    }
}

/// Parameters for a fresh random generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub size: usize,
    pub layers: Vec<usize>,
    pub perturbation: Perturbation,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            size: 100,
            layers: vec![INPUT_SIZE, 27, 9, 1],
            perturbation: Perturbation::default(),
        }
    }
}

/// One population of individuals sharing an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    id: u64,
    individuals: Vec<Individual>,
}

impl Generation {
    /// Creates a generation from existing individuals, keeping their ids.
    #[must_use]
    pub fn new(id: u64, individuals: Vec<Individual>) -> Self {
        Self { id, individuals }
    }

    /// Creates generation 0 of `params.size` individuals.
    ///
    /// `imported` individuals fill the first slots (more than `params.size`
    /// are all kept) and the rest are random. Every individual gets its slot
    /// index as id. Imported networks must have the layer sizes in `params`.
    pub fn new_random<R>(
        params: &GenerationParams,
        imported: Vec<Individual>,
        rng: &mut R,
    ) -> Result<Self, PopulationError>
    where
        R: Rng + ?Sized,
    {
        let mut individuals = Vec::with_capacity(params.size.max(imported.len()));
        for mut individual in imported {
            let actual = individual.net.sizes();
            if actual != params.layers {
                return Err(PopulationError::TopologyMismatch {
                    id: individual.id,
                    expected: params.layers.clone(),
                    actual,
                });
            }
            individual.set_id(individuals.len());
            individual.fitness = None;
            individuals.push(individual);
        }
        while individuals.len() < params.size {
            let individual =
                Individual::random(individuals.len(), &params.layers, params.perturbation, rng)?;
            individuals.push(individual);
        }
        Ok(Self::new(0, individuals))
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Forgets every individual's fitness.
    pub fn clear_fitness(&mut self) {
        for individual in &mut self.individuals {
            individual.fitness = None;
        }
    }

    /// Evaluates every individual in turn on the current thread.
    pub fn run(&mut self) {
        for individual in &mut self.individuals {
            individual.evaluate();
        }
    }

    /// Shuffles, then sorts best first. Individuals of equal fitness end up
    /// in random relative order.
    pub fn order<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.individuals.shuffle(rng);
        self.individuals.sort_by(|a, b| Individual::compare(b, a));
    }

    /// Returns `true` when every individual is evaluated and the list is
    /// sorted best first.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.individuals.iter().all(|i| i.fitness.is_some())
            && self
                .individuals
                .is_sorted_by(|a, b| Individual::compare(a, b).is_ge())
    }

    /// Returns the first individual, the best one once [`order`](Self::order)
    /// has run.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    /// Breeds the next generation, with id `self.id() + 1`.
    ///
    /// # Panics
    ///
    /// Panics unless the generation [`is_ordered`](Self::is_ordered).
    #[must_use]
    pub fn next<R>(&self, params: &EvolutionParams, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        self.next_with_id(self.id + 1, params, rng)
    }

    /// Breeds the next generation under an explicit id.
    ///
    /// The result has the same size, with fresh sequential ids and no
    /// fitness. Parents are drawn independently and may be the same
    /// individual.
    ///
    /// # Panics
    ///
    /// Panics unless the generation [`is_ordered`](Self::is_ordered).
    #[must_use]
    pub fn next_with_id<R>(&self, id: u64, params: &EvolutionParams, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        assert!(
            self.is_ordered(),
            "generation must be evaluated and ordered before breeding"
        );

        let mut next = self
            .individuals
            .iter()
            .take(params.clones)
            .enumerate()
            .map(|(i, individual)| individual.clone_with_id(i))
            .collect::<Vec<_>>();

        while next.len() < self.individuals.len() {
            let a = operators::select(&self.individuals, rng);
            let b = operators::select(&self.individuals, rng);
            let mut child = a.reproduce(next.len(), b, rng);
            child.mutate(params.mutation_rate, params.perturbation, rng);
            next.push(child);
        }

        Self::new(id, next)
    }

    /// Iterates over the fitness of evaluated individuals.
    pub fn fitnesses(&self) -> impl Iterator<Item = Fitness> + '_ {
        self.individuals.iter().filter_map(Individual::fitness)
    }

    /// Returns the individuals that still lack a fitness.
    pub fn unevaluated(&self) -> impl Iterator<Item = &Individual> + '_ {
        self.individuals.iter().filter(|i| i.fitness.is_none())
    }
}

#[cfg(test)]
mod tests {
    use std::iter;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use tttnet_engine::Board;

    use super::*;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    fn small_params(size: usize) -> GenerationParams {
        GenerationParams {
            size,
            layers: vec![INPUT_SIZE, 4, 1],
            ..GenerationParams::default()
        }
    }

    fn center_seeker() -> Network {
        let mut net = Network::from_sizes(&[INPUT_SIZE, 1]).unwrap();
        let mut thresholds = vec![vec![2.0; INPUT_SIZE], vec![1.0]];
        thresholds[0][8] = 1.0;
        net.set_thresholds(&thresholds).unwrap();
        net.set_weights(&[vec![vec![1.0]; INPUT_SIZE]]).unwrap();
        net
    }

    fn with_fitness(id: usize, age: usize, score: usize) -> Individual {
        let mut individual = Individual::new(id, center_seeker()).unwrap();
        individual.set_fitness(Some(Fitness { age, score }));
        individual
    }

    #[test]
    fn test_fitness_orders_by_age_then_score() {
        let a = Fitness { age: 2, score: 300 };
        let b = Fitness { age: 3, score: 10 };
        let c = Fitness { age: 3, score: 11 };
        assert!(a < b);
        assert!(b < c);
        assert_eq!(
            Individual::compare(&with_fitness(0, 3, 10), &with_fitness(1, 3, 10)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_new_rejects_wrong_architecture() {
        let net = Network::from_sizes(&[9, 1]).unwrap();
        let err = Individual::new(0, net).unwrap_err();
        assert_eq!(err.sizes, vec![9, 1]);
        let net = Network::from_sizes(&[INPUT_SIZE, 2]).unwrap();
        assert!(Individual::new(0, net).is_err());
    }

    #[test]
    fn test_zero_network_fails_at_first_ply() {
        // All outputs tie, so every empty square is chosen on the empty board.
        let net = Network::from_sizes(&[INPUT_SIZE, 3, 1]).unwrap();
        let mut individual = Individual::new(0, net).unwrap();
        let fitness = individual.evaluate();
        assert_eq!(fitness.age, 0);
        assert!(fitness.score <= 334);
        assert_eq!(individual.fitness(), Some(fitness));
    }

    #[test]
    fn test_evaluation_continues_through_third_ply() {
        // The empty board fails for an untrained net; a board with one empty
        // square always passes. Passing boards in plies 1 to 3 are still
        // scored after the failure, later ones are not.
        let fail: Board = "---/---/---".parse().unwrap();
        let pass: Board = "XOX/XOO/OX-".parse().unwrap();
        let mut buckets = vec![vec![fail]];
        buckets.extend((1..AGE_MAX).map(|_| vec![pass]));
        let boards = TestBoardSet::from_buckets(buckets);

        let net = Network::from_sizes(&[INPUT_SIZE, 3, 1]).unwrap();
        let mut individual = Individual::new(0, net).unwrap();
        let fitness = individual.evaluate_with(&boards);
        assert_eq!(fitness, Fitness { age: 0, score: 3 });

        // Without a failure every bucket counts.
        let all_pass = TestBoardSet::from_buckets((0..AGE_MAX).map(|_| vec![pass]).collect());
        let fitness = individual.evaluate_with(&all_pass);
        assert_eq!(fitness, Fitness { age: AGE_MAX, score: AGE_MAX });
    }

    #[test]
    fn test_center_seeker_fitness() {
        let mut individual = Individual::new(0, center_seeker()).unwrap();
        let fitness = individual.evaluate();
        // Right on the empty board and on the 8 replies with a free center,
        // wrong when X holds the center.
        assert_eq!(fitness.age, 1);
        assert!(fitness.score >= 9, "{fitness:?}");
        assert!(fitness.score <= 334, "{fitness:?}");
    }

    #[test]
    fn test_random_individuals_stay_in_range() {
        let mut rng = rng(0);
        for id in 0..5 {
            let mut individual =
                Individual::random(id, &[INPUT_SIZE, 9, 1], Perturbation::default(), &mut rng)
                    .unwrap();
            let fitness = individual.evaluate();
            assert!(fitness.age <= AGE_MAX);
            assert!(fitness.score <= SCORE_MAX);
        }
    }

    #[test]
    fn test_reproduce_leaves_parents_untouched() {
        let mut rng = rng(1);
        let a = Individual::random(0, &[INPUT_SIZE, 4, 1], Perturbation::default(), &mut rng)
            .unwrap();
        let b = Individual::random(1, &[INPUT_SIZE, 4, 1], Perturbation::default(), &mut rng)
            .unwrap();
        let (a0, b0) = (a.clone(), b.clone());
        let child = a.reproduce(7, &b, &mut rng);
        assert_eq!(child.id(), 7);
        assert_eq!(child.fitness(), None);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_new_random_places_imports_first() {
        let mut rng = rng(2);
        let params = small_params(5);
        let mut imported =
            Individual::random(42, &params.layers, Perturbation::default(), &mut rng).unwrap();
        imported.set_fitness(Some(Fitness { age: 1, score: 1 }));
        let net = imported.net().clone();

        let generation = Generation::new_random(&params, vec![imported], &mut rng).unwrap();
        assert_eq!(generation.id(), 0);
        assert_eq!(generation.len(), 5);
        assert_eq!(generation.individuals()[0].net(), &net);
        let ids = generation.individuals().iter().map(Individual::id).collect::<Vec<_>>();
        assert_eq!(ids, [0, 1, 2, 3, 4]);
        assert_eq!(generation.unevaluated().count(), 5);
    }

    #[test]
    fn test_new_random_rejects_mismatched_import() {
        let mut rng = rng(3);
        let imported = Individual::new(0, center_seeker()).unwrap();
        let result = Generation::new_random(&small_params(3), vec![imported], &mut rng);
        assert!(matches!(result, Err(PopulationError::TopologyMismatch { .. })));
    }

    #[test]
    fn test_order_sorts_descending() {
        let mut rng = rng(4);
        let mut generation = Generation::new(
            0,
            vec![
                with_fitness(0, 1, 5),
                with_fitness(1, 3, 2),
                with_fitness(2, 1, 9),
                with_fitness(3, 3, 2),
            ],
        );
        assert!(!generation.is_ordered());
        generation.order(&mut rng);
        assert!(generation.is_ordered());
        let fitnesses = generation.fitnesses().map(|f| (f.age, f.score)).collect::<Vec<_>>();
        assert_eq!(fitnesses, [(3, 2), (3, 2), (1, 9), (1, 5)]);
        assert_eq!(generation.best().unwrap().fitness(), Some(Fitness { age: 3, score: 2 }));
    }

    #[test]
    fn test_order_breaks_ties_randomly() {
        let mut rng = rng(5);
        let mut firsts = [0; 4];
        for _ in 0..200 {
            let mut generation =
                Generation::new(0, (0..4).map(|id| with_fitness(id, 2, 2)).collect());
            generation.order(&mut rng);
            firsts[generation.best().unwrap().id()] += 1;
        }
        assert!(firsts.iter().all(|count| *count > 20), "{firsts:?}");
    }

    #[test]
    fn test_next_generation() {
        let mut rng = rng(6);
        let mut generation = Generation::new(
            4,
            (0..10).map(|id| with_fitness(id, id % 3, id)).collect(),
        );
        generation.order(&mut rng);
        let params = EvolutionParams {
            clones: 3,
            ..EvolutionParams::default()
        };
        let next = generation.next(&params, &mut rng);

        assert_eq!(next.id(), 5);
        assert_eq!(next.len(), 10);
        let ids = next.individuals().iter().map(Individual::id).collect::<Vec<_>>();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        for (clone, original) in iter::zip(&next.individuals()[..3], generation.individuals()) {
            assert_eq!(clone.net(), original.net());
        }
        assert!(next.individuals().iter().all(|i| i.fitness().is_none()));

        let explicit = generation.next_with_id(100, &params, &mut rng);
        assert_eq!(explicit.id(), 100);
    }

    #[test]
    #[should_panic(expected = "ordered")]
    fn test_next_requires_order() {
        let mut rng = rng(7);
        let generation = Generation::new(0, vec![with_fitness(0, 0, 1), with_fitness(1, 5, 5)]);
        let _ = generation.next(&EvolutionParams::default(), &mut rng);
    }
}
