//! Network parameter operators for the genetic algorithm.
//!
//! These are used by [`genetic::Generation`](crate::genetic::Generation) to
//! implement initialization, crossover, mutation and selection.
//!
//! # Operations
//!
//! - **Initialization / Mutation**: [`randomize`] perturbs parameters with a
//!   given chance; a chance of 1.0 perturbs every parameter
//! - **Crossover**: [`splice`] performs uniform crossover per scalar parameter
//! - **Selection**: [`select`] picks from a sorted pool with a quadratic bias
//!   toward its head
//!
//! Only non-output nodes carry parameters that affect the network, so every
//! operator walks [`Network::nodes_mut`].

use rand::Rng;
use tttnet_evaluator::network::Network;

/// Half-widths of the uniform perturbation ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    /// Thresholds move by a value in `[-threshold, threshold)`
    pub threshold: f64,
    /// Weights move by a value in `[-weight, weight)`
    pub weight: f64,
}

impl Default for Perturbation {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            weight: 10.0,
        }
    }
}

fn perturb<R>(value: &mut f64, chance: f64, half_width: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    if rng.random_bool(chance) {
        *value += rng.random_range(-half_width..half_width);
    }
}

/// Adds a uniform perturbation to each threshold and weight independently
/// with probability `chance`.
///
/// # Panics
///
/// Panics if `chance` is outside `[0, 1]` or a half-width is not positive.
pub fn randomize<R>(net: &mut Network, chance: f64, perturbation: Perturbation, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for node in net.nodes_mut() {
        perturb(node.threshold, chance, perturbation.threshold, rng);
        for weight in node.weights {
            perturb(weight, chance, perturbation.weight, rng);
        }
    }
}

/// Uniform crossover: copies each threshold and each weight of `source` into
/// `dest` independently with probability 1/2.
///
/// # Panics
///
/// Panics if the networks have different layer sizes.
pub fn splice<R>(dest: &mut Network, source: &Network, rng: &mut R)
where
    R: Rng + ?Sized,
{
    assert_eq!(dest.sizes(), source.sizes(), "spliced networks must share a topology");
    for (node, from) in dest.nodes_mut().zip(source.nodes()) {
        if rng.random_bool(0.5) {
            *node.threshold = from.threshold;
        }
        for (weight, from) in node.weights.iter_mut().zip(from.weights) {
            if rng.random_bool(0.5) {
                *weight = *from;
            }
        }
    }
}

/// Picks an element with a bias toward the front of `pool`.
///
/// A uniform `x` in `[0, 1)` is squared and scaled to the pool length, so the
/// first element is the most likely pick and the last the least. `pool` must
/// be sorted best first.
///
/// # Panics
///
/// Panics if `pool` is empty.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng as _;
/// use tttnet_training::operators;
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
/// let pool = [0, 1, 2, 3];
/// let picks = (0..1000).map(|_| *operators::select(&pool, &mut rng));
/// let firsts = picks.filter(|i| *i == 0).count();
/// assert!(firsts > 400);
/// ```
pub fn select<'a, T, R>(pool: &'a [T], rng: &mut R) -> &'a T
where
    R: Rng + ?Sized,
{
    assert!(!pool.is_empty(), "cannot select from an empty pool");
    let x = rng.random::<f64>();
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let index = (x * x * pool.len() as f64) as usize;
    &pool[index.min(pool.len() - 1)]
}
