use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::core::PairwiseGraph;

mod log;
mod message_passing;
mod tree;
mod trw;

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Errors that could appear during an inference run
pub enum InferError {
    /// Allocation of the message store failed
    OutOfMemory {
        /// Number of message values that could not be allocated
        requested: usize,
    },

    /// A belief hit the lower precision boundary and is no longer finite
    NumericalPrecision {
        /// Id of the offending node
        node: usize,

        /// The degenerate normalization sum of the node's belief
        sum: f64,
    },
}

impl Display for InferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferError::OutOfMemory { requested } => write!(
                f,
                "Out of memory: failed to allocate {} values for the message store",
                requested,
            ),
            InferError::NumericalPrecision { node, sum } => write!(
                f,
                "The lower precision boundary for the potential of the node {} is reached, normalization sum: {}",
                node, sum,
            ),
        }
    }
}

impl Error for InferError {}

/// Inference methods result type
pub type InferResult<T> = Result<T, InferError>;

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The closed set of inference policies
pub enum Method {
    /// Synchronous sum-product loopy belief propagation, probability scale
    Lbp,

    /// Synchronous max-product loopy belief propagation, probability scale
    Viterbi,

    /// Synchronous sum-product loopy belief propagation in log space,
    /// numerically stable on long chains of small probabilities
    LogLbp,

    /// Synchronous max-product message passing in log space
    LogViterbi,

    /// Tree-reweighted message passing: asynchronous ordered sweeps with
    /// spanning-tree counting-number reweighting, a convex approximation
    /// with a tighter bound than plain loopy belief propagation
    Trw,

    /// Exact marginal inference on acyclic graphs by a peeling schedule.
    /// Converges in a single structural pass, the iteration count is
    /// ignored. On graphs with residual cycles the result is a best-effort
    /// approximation and not guaranteed correct
    Tree,
}

/// Runs an inference policy on a pairwise graph
///
/// # Arguments
///
/// * `graph` - A pairwise graphical model
/// * `method` - An inference policy
/// * `iterations` - A number of message passing sweeps ([`Method::Tree`]
///     ignores it)
///
/// # Notes
///
/// This call is destructive: the belief of every node is folded into its
/// unary potential in place, normalized to a probability distribution, and
/// the arg-max state is written to the node's solution slot. Feed fresh
/// potentials in for a fresh run. Message buffers live for exactly one call.
///
/// A failure is not retried: message passing is deterministic, so a failed
/// call fails identically on immediate retry with the same inputs
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use pgmrs::core::PairwiseGraph;
/// use pgmrs::infer::{run_inference, Method};
///
/// let mut graph = PairwiseGraph::new(2);
/// let a = graph.add_node(array![0.9, 0.1]).unwrap();
/// let b = graph.add_node(array![0.4, 0.6]).unwrap();
/// graph.add_edge(a, b, array![[0.9, 0.1], [0.1, 0.9]]).unwrap();
/// run_inference(&mut graph, Method::Tree, 1).unwrap();
/// assert_eq!(graph.node(a).solution(), Some(0));
/// assert!((graph.node(a).potential().sum() - 1.0).abs() < 1e-10);
/// ```
pub fn run_inference(
    graph: &mut PairwiseGraph,
    method: Method,
    iterations: usize,
) -> InferResult<()> {
    match method {
        Method::Lbp => message_passing::infer(graph, iterations, false),
        Method::Viterbi => message_passing::infer(graph, iterations, true),
        Method::LogLbp => log::infer(graph, iterations, false),
        Method::LogViterbi => log::infer(graph, iterations, true),
        Method::Trw => trw::infer(graph, iterations),
        Method::Tree => tree::infer(graph),
    }
}
