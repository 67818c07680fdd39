use ndarray::Array2;

use crate::core::{MessageStore, PairwiseGraph};
use crate::infer::message_passing::normalize_belief;
use crate::infer::InferResult;

/// Tree-reweighted message passing
///
/// Updates are asynchronous and ordered: every iteration visits the nodes
/// in ascending id order and then in descending order, so a sweep must not
/// be parallelized across nodes
pub(super) fn infer(graph: &mut PairwiseGraph, iterations: usize) -> InferResult<()> {
    let mut store = MessageStore::create(graph.num_edges(), graph.num_states(), 1f64)?;
    calculate_messages(graph, &mut store, iterations);
    collect_beliefs(graph, &store)
}

/// Folds the unary potential of a node with the messages of its oriented
/// (`node1 < node2`) arcs into `data` and returns the counts of oriented
/// outgoing and incoming arcs
fn fold_oriented(graph: &PairwiseGraph, store: &MessageStore, node_id: usize, data: &mut [f64]) -> (usize, usize) {
    let node = &graph.nodes[node_id];
    for (d, p) in data.iter_mut().zip(node.pot.iter()) {
        *d = *p;
    }
    let mut n_forward = 0;
    for &e_t in &node.to {
        let edge = &graph.edges[e_t];
        if edge.node1 > edge.node2 {
            continue;
        }
        for (d, m) in data.iter_mut().zip(store.message(e_t)) {
            *d *= *m;
        }
        n_forward += 1;
    }
    let mut n_backward = 0;
    for &e_f in &node.from {
        let edge = &graph.edges[e_f];
        if edge.node1 > edge.node2 {
            continue;
        }
        for (d, m) in data.iter_mut().zip(store.message(e_f)) {
            *d *= *m;
        }
        n_backward += 1;
    }
    (n_forward, n_backward)
}

/// The counting-number correction: `data^(1/max(nForward, nBackward))`
/// element-wise, approximating a convex combination over spanning trees.
/// A count of one leaves the vector untouched, recovering a plain
/// belief-propagation update
fn apply_counting_number(data: &mut [f64], n_forward: usize, n_backward: usize) {
    let count = n_forward.max(n_backward);
    if count > 1 {
        let exponent = 1f64 / count as f64;
        for d in data.iter_mut() {
            *d = d.powf(exponent);
        }
    }
}

/// Re-derives the message of one arc: the arc's own previous contribution
/// is divided out of `data`, the result is pushed through the arc matrix by
/// a max-product rule and normalized by its maximum
fn update_message(msg: &mut [f64], pot: &Array2<f64>, temp: &mut [f64], data: &[f64]) {
    for (t, (d, m)) in temp.iter_mut().zip(data.iter().zip(msg.iter())) {
        *t = d / f64::EPSILON.max(*m);
    }
    for (y, m) in msg.iter_mut().enumerate() {
        let mut max = temp[0] * pot[[y, 0]];
        for (x, t) in temp.iter().enumerate().skip(1) {
            let val = t * pot[[y, x]];
            if max < val {
                max = val;
            }
        }
        *m = max;
    }
    let mut max = msg[0];
    for m in msg.iter().skip(1) {
        if max < *m {
            max = *m;
        }
    }
    for m in msg.iter_mut() {
        *m /= max;
    }
}

fn calculate_messages(graph: &PairwiseGraph, store: &mut MessageStore, iterations: usize) {
    let n_states = graph.num_states();
    let mut data = vec![0f64; n_states];
    let mut temp = vec![0f64; n_states];

    for _ in 0..iterations {
        // Forward pass: ascending order, push to nodes later in the ordering
        for node_id in 0..graph.num_nodes() {
            let (n_forward, n_backward) = fold_oriented(graph, store, node_id, &mut data);
            apply_counting_number(&mut data, n_forward, n_backward);
            for &e_t in &graph.nodes[node_id].to {
                let edge = &graph.edges[e_t];
                if edge.node1 < edge.node2 {
                    update_message(store.message_mut(e_t), &edge.pot, &mut temp, &data);
                }
            }
        }

        // Backward pass: descending order, push to nodes earlier in the ordering
        for node_id in (0..graph.num_nodes()).rev() {
            let (n_forward, n_backward) = fold_oriented(graph, store, node_id, &mut data);
            let mut max = data[0];
            for d in data.iter().skip(1) {
                if max < *d {
                    max = *d;
                }
            }
            for d in data.iter_mut() {
                *d /= max;
            }
            apply_counting_number(&mut data, n_forward, n_backward);
            for &e_f in &graph.nodes[node_id].from {
                let edge = &graph.edges[e_f];
                if edge.node1 < edge.node2 {
                    update_message(store.message_mut(e_f), &edge.pot, &mut temp, &data);
                }
            }
        }
    }
}

/// Sequential belief pass in ascending order: oriented incoming arcs fold
/// the arc matrix row selected by the already-labeled source node, oriented
/// outgoing arcs fold the arc message; each oriented arc contributes
/// exactly once across the whole graph
fn collect_beliefs(graph: &mut PairwiseGraph, store: &MessageStore) -> InferResult<()> {
    for node_id in 0..graph.num_nodes() {
        let mut belief = graph.nodes[node_id].pot.clone();
        let node = &graph.nodes[node_id];
        for &e_f in &node.from {
            let edge = &graph.edges[e_f];
            if edge.node1 > edge.node2 {
                continue;
            }
            let src_sol = graph.nodes[edge.node1]
                .sol
                .expect("source node is labeled before its oriented arcs are folded");
            for (s, b) in belief.iter_mut().enumerate() {
                *b *= edge.pot[[src_sol, s]];
            }
        }
        for &e_t in &node.to {
            let edge = &graph.edges[e_t];
            if edge.node1 > edge.node2 {
                continue;
            }
            for (b, m) in belief.iter_mut().zip(store.message(e_t)) {
                *b *= *m;
            }
        }
        let node = &mut graph.nodes[node_id];
        node.pot = belief;
        normalize_belief(node)?;
    }
    Ok(())
}
