use ndarray::Array2;
use rayon::prelude::*;

use crate::core::{MessageStore, PairwiseGraph};
use crate::infer::message_passing::{normalize_belief, sweep};
use crate::infer::InferResult;

/// Log-space analogue of a sum of exponents: `ln Σ_y exp(term(y))`,
/// stabilized by factoring the largest term out
#[inline]
fn log_sum_exp(n: usize, term: impl Fn(usize) -> f64) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for y in 0..n {
        let t = term(y);
        if t > max {
            max = t;
        }
    }
    if max == f64::NEG_INFINITY {
        return max;
    }
    let mut sum = 0f64;
    for y in 0..n {
        sum += f64::exp(term(y) - max);
    }
    max + f64::ln(sum)
}

/// The fused squared-matrix transform of the log domain:
/// `dst[x] = ln Σ_y exp(v[y] + 2·ln m[y,x])` for sum-product or
/// `max_y (v[y] + 2·ln m[y,x])` for max-product; returns the largest entry
/// of `dst`
fn log_squared_mat_mul(m: &Array2<f64>, v: &[f64], dst: &mut [f64], max_product: bool) -> f64 {
    let n = v.len();
    let mut res = f64::NEG_INFINITY;
    for (x, d) in dst.iter_mut().enumerate() {
        let term = |y: usize| v[y] + 2f64 * f64::ln(m[[y, x]]);
        let value = if max_product {
            let mut best = f64::NEG_INFINITY;
            for y in 0..n {
                let t = term(y);
                if t > best {
                    best = t;
                }
            }
            best
        } else {
            log_sum_exp(n, term)
        };
        *d = value;
        if value > res {
            res = value;
        }
    }
    res
}

/// Computes the log message of the directed arc `edge_id = (u → v)`. The
/// unary potential of `u` is log-transformed here, messages are carried in
/// log space already; the result is re-normalized by subtracting its own
/// maximum
fn calculate_message(
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
        *t = f64::ln(*p);
    }
    for &e_f in &node.from {
        if graph.edges[e_f].node1 != edge.node2 {
            let msg = &current[e_f * n_states..(e_f + 1) * n_states];
            for (t, m) in temp.iter_mut().zip(msg) {
                *t += *m;
            }
        }
    }
    let z = log_squared_mat_mul(&edge.pot, temp, dst, max_product);
    for d in dst.iter_mut() {
        *d -= z;
    }
}

/// Log-domain loopy belief propagation; with `max_product` set this is the
/// Viterbi algorithm
pub(super) fn infer(
    graph: &mut PairwiseGraph,
    iterations: usize,
    max_product: bool,
) -> InferResult<()> {
    let n_states = graph.num_states();
    let mut store = MessageStore::create(
        graph.num_edges(),
        n_states,
        f64::ln(1f64 / n_states as f64),
    )?;
    sweep(graph, &mut store, iterations, |g, current, e, temp, dst| {
        calculate_message(g, current, e, temp, dst, max_product)
    });
    graph.nodes.par_iter_mut().try_for_each(|node| {
        for &e_f in &node.from {
            let msg = store.message(e_f);
            for (p, m) in node.pot.iter_mut().zip(msg) {
                *p *= f64::exp(*m);
            }
        }
        normalize_belief(node)
    })
}
