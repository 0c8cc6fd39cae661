//! Layered feed-forward threshold network.
//!
//! A [`Network`] is a fixed sequence of layers. Every node outside the output
//! layer has a threshold and one weight per node of the next layer. Running the
//! network sets the input layer's accumulators, then walks the non-output
//! nodes in layer order: a node whose accumulated input reaches its threshold
//! adds each outgoing weight to the matching node of the next layer. The output
//! layer's accumulators are the result.
//!
//! Accumulators persist between runs, so [`Network::reset`] must be called
//! before every fresh evaluation.
//!
//! # Exchange Format
//!
//! [`NetworkParams`] holds two parallel nested structures: per-layer per-node
//! thresholds and per-layer per-node weight lists (empty for the output layer).
//! Layer sizes are inferred from the thresholds. `Network` serializes through
//! this form, so a round trip reproduces topology and parameters exactly.
//!
//! # Example
//!
//! ```
//! use tttnet_evaluator::network::Network;
//!
//! // XOR with default thresholds of 1.
//! let mut net = Network::from_sizes(&[2, 3, 1]).unwrap();
//! net.set_weights(&[
//!     vec![vec![1.0, 0.5, 0.0], vec![0.0, 0.5, 1.0]],
//!     vec![vec![1.0], vec![-2.0], vec![1.0]],
//! ])
//! .unwrap();
//! for (inputs, expected) in [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 1.0], 0.0)] {
//!     net.reset();
//!     assert_eq!(net.run(&inputs), vec![expected]);
//! }
//! ```

use std::iter;

use serde::{Deserialize, Serialize};

/// Threshold given to every node by [`Network::from_sizes`].
pub const DEFAULT_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("network needs at least one layer")]
    NoLayers,
    #[display("layer {layer} has no nodes")]
    EmptyLayer { layer: usize },
    #[display("expected {expected} weight layers, got {actual}")]
    LayerCount { expected: usize, actual: usize },
    #[display("layer {layer} has {expected} nodes, got parameters for {actual}")]
    NodeCount {
        layer: usize,
        expected: usize,
        actual: usize,
    },
    #[display("node {node} of layer {layer} needs {expected} weights, got {actual}")]
    WeightCount {
        layer: usize,
        node: usize,
        expected: usize,
        actual: usize,
    },
}

/// Serializable parameters of a [`Network`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub thresholds: Vec<Vec<f64>>,
    pub weights: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Layer {
    inputs: Vec<f64>,
    thresholds: Vec<f64>,
    weights: Vec<Vec<f64>>,
}

impl Layer {
    fn new(size: usize, next_size: usize) -> Self {
        Self {
            inputs: vec![0.0; size],
            thresholds: vec![DEFAULT_THRESHOLD; size],
            weights: vec![vec![0.0; next_size]; size],
        }
    }

    fn len(&self) -> usize {
        self.inputs.len()
    }
}

/// Read-only view of one non-output node's parameters.
#[derive(Debug, Clone, Copy)]
pub struct NodeParams<'a> {
    pub threshold: f64,
    pub weights: &'a [f64],
}

/// Mutable view of one non-output node's parameters.
#[derive(Debug)]
pub struct NodeParamsMut<'a> {
    pub threshold: &'a mut f64,
    pub weights: &'a mut [f64],
}

/// Feed-forward network with per-node thresholds.
///
/// Cloning produces a fully independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkParams", into = "NetworkParams")]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Creates a network with the given layer sizes, all weights zero and all
    /// thresholds [`DEFAULT_THRESHOLD`].
    pub fn from_sizes(sizes: &[usize]) -> Result<Self, NetworkError> {
        if sizes.is_empty() {
            return Err(NetworkError::NoLayers);
        }
        if let Some(layer) = sizes.iter().position(|size| *size == 0) {
            return Err(NetworkError::EmptyLayer { layer });
        }
        let layers = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| Layer::new(*size, sizes.get(i + 1).copied().unwrap_or(0)))
            .collect();
        Ok(Self { layers })
    }

    /// Reconstructs a network from exported parameters.
    pub fn from_parameters(params: &NetworkParams) -> Result<Self, NetworkError> {
        let sizes = params.thresholds.iter().map(Vec::len).collect::<Vec<_>>();
        let mut net = Self::from_sizes(&sizes)?;
        net.set_thresholds(&params.thresholds)?;
        net.set_weights(&params.weights)?;
        Ok(net)
    }

    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::len).collect()
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers[0].len()
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.output_layer().len()
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    fn hidden_layers(&self) -> &[Layer] {
        &self.layers[..self.layers.len() - 1]
    }

    fn hidden_layers_mut(&mut self) -> &mut [Layer] {
        let len = self.layers.len();
        &mut self.layers[..len - 1]
    }

    /// Returns a copy of every node's threshold, one list per layer.
    ///
    /// Output nodes report their stored threshold, which `run` never reads.
    #[must_use]
    pub fn thresholds(&self) -> Vec<Vec<f64>> {
        self.layers.iter().map(|l| l.thresholds.clone()).collect()
    }

    /// Returns a copy of every node's outgoing weights, one list per layer.
    ///
    /// Output nodes have empty weight lists.
    #[must_use]
    pub fn weights(&self) -> Vec<Vec<Vec<f64>>> {
        self.layers.iter().map(|l| l.weights.clone()).collect()
    }

    /// Overwrites thresholds.
    ///
    /// `thresholds` must cover at least every non-output layer; an entry for
    /// the output layer is applied too when present.
    pub fn set_thresholds(&mut self, thresholds: &[Vec<f64>]) -> Result<(), NetworkError> {
        check_layer_count(self.layers.len(), thresholds.len())?;
        for (i, (layer, values)) in iter::zip(&self.layers, thresholds).enumerate() {
            check_node_count(i, layer.len(), values.len())?;
        }
        for (layer, values) in iter::zip(&mut self.layers, thresholds) {
            layer.thresholds.copy_from_slice(values);
        }
        Ok(())
    }

    /// Overwrites weights.
    ///
    /// `weights` must cover at least every non-output layer; an entry for the
    /// output layer must contain empty lists.
    pub fn set_weights(&mut self, weights: &[Vec<Vec<f64>>]) -> Result<(), NetworkError> {
        check_layer_count(self.layers.len(), weights.len())?;
        let sizes = self.sizes();
        for (i, values) in weights.iter().enumerate() {
            check_node_count(i, sizes[i], values.len())?;
            let expected = sizes.get(i + 1).copied().unwrap_or(0);
            for (node, node_weights) in values.iter().enumerate() {
                if node_weights.len() != expected {
                    return Err(NetworkError::WeightCount {
                        layer: i,
                        node,
                        expected,
                        actual: node_weights.len(),
                    });
                }
            }
        }
        for (layer, values) in iter::zip(&mut self.layers, weights) {
            layer.weights.clone_from_slice(values);
        }
        Ok(())
    }

    /// Iterates over the parameters of all non-output nodes in layer order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeParams<'_>> {
        self.hidden_layers().iter().flat_map(|layer| {
            iter::zip(&layer.thresholds, &layer.weights).map(|(threshold, weights)| NodeParams {
                threshold: *threshold,
                weights,
            })
        })
    }

    /// Iterates mutably over the parameters of all non-output nodes in layer
    /// order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = NodeParamsMut<'_>> {
        self.hidden_layers_mut().iter_mut().flat_map(|layer| {
            iter::zip(&mut layer.thresholds, &mut layer.weights).map(|(threshold, weights)| {
                NodeParamsMut {
                    threshold,
                    weights: weights.as_mut_slice(),
                }
            })
        })
    }

    /// Zeroes every node's accumulated input, output layer included.
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.inputs.fill(0.0);
        }
    }

    /// Feeds `inputs` forward and returns the output layer's accumulators.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len()` differs from the input layer size.
    pub fn run(&mut self, inputs: &[f64]) -> Vec<f64> {
        assert_eq!(
            inputs.len(),
            self.input_size(),
            "input length must match the input layer size"
        );
        self.layers[0].inputs.copy_from_slice(inputs);

        for i in 1..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(i);
            let layer = &done[i - 1];
            let next = &mut rest[0];
            for ((input, threshold), weights) in
                iter::zip(iter::zip(&layer.inputs, &layer.thresholds), &layer.weights)
            {
                if input >= threshold {
                    for (acc, weight) in iter::zip(&mut next.inputs, weights) {
                        *acc += weight;
                    }
                }
            }
        }

        self.outputs()
    }

    #[must_use]
    pub fn outputs(&self) -> Vec<f64> {
        self.output_layer().inputs.clone()
    }

    #[must_use]
    pub fn export(&self) -> NetworkParams {
        NetworkParams {
            thresholds: self.thresholds(),
            weights: self.weights(),
        }
    }
}

fn check_layer_count(layers: usize, actual: usize) -> Result<(), NetworkError> {
    if actual + 1 < layers || actual > layers {
        return Err(NetworkError::LayerCount {
            expected: layers,
            actual,
        });
    }
    Ok(())
}

fn check_node_count(layer: usize, expected: usize, actual: usize) -> Result<(), NetworkError> {
    if expected != actual {
        return Err(NetworkError::NodeCount {
            layer,
            expected,
            actual,
        });
    }
    Ok(())
}

impl TryFrom<NetworkParams> for Network {
    type Error = NetworkError;

    fn try_from(params: NetworkParams) -> Result<Self, Self::Error> {
        Self::from_parameters(&params)
    }
}

impl From<Network> for NetworkParams {
    fn from(net: Network) -> Self {
        net.export()
    }
}
