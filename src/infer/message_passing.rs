use ndarray::Array2;
use rayon::prelude::*;

use crate::core::{MessageStore, Node, PairwiseGraph};
use crate::infer::{InferError, InferResult};

/// Multiplies the element-wise square of the matrix `m` by the vector `v`,
/// `dst[x] = Σ_y v[y]·m[y,x]²` for sum-product or `max_y v[y]·m[y,x]²` for
/// max-product, and returns the largest entry of `dst`
///
/// # Notes
///
/// Arc matrices store square roots of the model's compatibilities, so the
/// squared product restores them, see
/// [`crate::core::PairwiseGraph::add_edge`]
pub(super) fn squared_mat_mul(
    m: &Array2<f64>,
    v: &[f64],
    dst: &mut [f64],
    max_product: bool,
) -> f64 {
    let mut res = 0f64;
    for (x, d) in dst.iter_mut().enumerate() {
        let mut acc = 0f64;
        for (y, value) in v.iter().enumerate() {
            let entry = m[[y, x]];
            let prod = value * entry * entry;
            if max_product {
                if prod > acc {
                    acc = prod;
                }
            } else {
                acc += prod;
            }
        }
        *d = acc;
        if acc > res {
            res = acc;
        }
    }
    res
}

/// Computes the message of the directed arc `edge_id = (u → v)`: the unary
/// potential of `u` times all messages incoming into `u` except those
/// arriving from `v`, pushed through [`squared_mat_mul`] and normalized by
/// the maximum entry
pub(super) fn calculate_message(
    graph: &PairwiseGraph,
    current: &[f64],
    edge_id: usize,
    temp: &mut [f64],
    dst: &mut [f64],
    max_product: bool,
) {
    let n_states = graph.num_states();
    let edge = &graph.edges[edge_id];
    let node = &graph.nodes[edge.node1];
    for (t, p) in temp.iter_mut().zip(node.pot.iter()) {
        *t = *p;
    }
    for &e_f in &node.from {
        if graph.edges[e_f].node1 != edge.node2 {
            let msg = &current[e_f * n_states..(e_f + 1) * n_states];
            for (t, m) in temp.iter_mut().zip(msg) {
                *t *= *m;
            }
        }
    }
    let z = squared_mat_mul(&edge.pot, temp, dst, max_product);
    for d in dst.iter_mut() {
        *d /= z;
    }
}

/// Runs `iterations` synchronous sweeps of a per-arc update rule
///
/// Every sweep computes the message of every directed arc from the current
/// buffer into the next one and swaps the buffers afterwards. Arcs are
/// processed in parallel: each worker owns the disjoint slice of the next
/// buffer belonging to its arc and only reads the current buffer, so the
/// result is identical to a sequential sweep
pub(super) fn sweep<F>(
    graph: &PairwiseGraph,
    store: &mut MessageStore,
    iterations: usize,
    update: F,
) where
    F: Fn(&PairwiseGraph, &[f64], usize, &mut [f64], &mut [f64]) + Sync,
{
    let n_states = graph.num_states();
    for _ in 0..iterations {
        let (current, next) = store.split();
        next.par_chunks_mut(n_states)
            .enumerate()
            .for_each_init(
                || vec![0f64; n_states],
                |temp, (edge_id, dst)| update(graph, current, edge_id, temp, dst),
            );
        store.swap();
    }
}

/// Folds a node's belief into its unary potential slot: normalizes it to a
/// probability distribution and records the arg-max state (the first
/// maximal index on a tie) as the node's solution
pub(super) fn normalize_belief(node: &mut Node) -> InferResult<()> {
    let sum: f64 = node.pot.iter().sum();
    for p in node.pot.iter_mut() {
        *p /= sum;
    }
    if node.pot.iter().any(|p| !p.is_finite()) {
        return Err(InferError::NumericalPrecision { node: node.id, sum });
    }
    let mut best = 0;
    for (s, p) in node.pot.iter().enumerate() {
        if *p > node.pot[best] {
            best = s;
        }
    }
    node.sol = Some(best);
    Ok(())
}

/// Multiplies the messages of all incoming arcs into every node's potential
/// and finalizes beliefs and solutions
pub(super) fn collect_beliefs(graph: &mut PairwiseGraph, store: &MessageStore) -> InferResult<()> {
    graph.nodes.par_iter_mut().try_for_each(|node| {
        for &e_f in &node.from {
            let msg = store.message(e_f);
            for (p, m) in node.pot.iter_mut().zip(msg) {
                *p *= *m;
            }
        }
        normalize_belief(node)
    })
}

/// Probability-scale loopy belief propagation, sum-product or max-product
pub(super) fn infer(
    graph: &mut PairwiseGraph,
    iterations: usize,
    max_product: bool,
) -> InferResult<()> {
    let n_states = graph.num_states();
    let mut store = MessageStore::create(graph.num_edges(), n_states, 1f64 / n_states as f64)?;
    sweep(graph, &mut store, iterations, |g, current, e, temp, dst| {
        calculate_message(g, current, e, temp, dst, max_product)
    });
    collect_beliefs(graph, &store)
}
