use std::collections::VecDeque;

use crate::core::{MessageStore, PairwiseGraph};
use crate::infer::message_passing::{calculate_message, collect_beliefs};
use crate::infer::InferResult;

/// Exact inference on acyclic graphs by a peeling schedule
///
/// Converges in a single structural pass, so no iteration count is taken.
/// On graphs with residual cycles the suspension mechanism still forces
/// progress, but the result is only a best-effort approximation
pub(super) fn infer(graph: &mut PairwiseGraph) -> InferResult<()> {
    let n_states = graph.num_states();
    let mut store = MessageStore::create(graph.num_edges(), n_states, 1f64 / n_states as f64)?;
    calculate_messages(graph, &mut store);
    collect_beliefs(graph, &store)
}

/// Peels the graph from its leaves inward and back out, computing the
/// message of every directed arc exactly once
///
/// Per node a remaining-degree counter tracks the incoming arcs not yet
/// resolved; nodes with at most one left are ready to send. Resolving an
/// arc suspends its reverse, which must not be recomputed once its mirror
/// is settled. A node whose outgoing arcs are all suspended computes them
/// anyway to force progress on cyclic leftovers
fn calculate_messages(graph: &PairwiseGraph, store: &mut MessageStore) {
    let n_states = graph.num_states();
    let n_edges = graph.num_edges();

    let mut is_ready = vec![false; n_edges];
    let mut suspended = vec![false; n_edges];

    let mut remaining: Vec<usize> = graph.nodes.iter().map(|node| node.from.len()).collect();
    let mut queue: VecDeque<usize> = graph
        .nodes
        .iter()
        .filter(|node| node.from.len() <= 1)
        .map(|node| node.id)
        .collect();

    let mut temp = vec![0f64; n_states];
    let mut out = vec![0f64; n_states];
    while let Some(n) = queue.pop_front() {
        let node = &graph.nodes[n];
        let all_suspended = node.to.iter().all(|&e_t| suspended[e_t]);
        for &e_t in &node.to {
            if is_ready[e_t] {
                continue;
            }
            if !all_suspended && suspended[e_t] {
                continue;
            }
            calculate_message(graph, store.current(), e_t, &mut temp, &mut out, false);
            store.message_mut(e_t).copy_from_slice(&out);
            is_ready[e_t] = true;

            let n2 = graph.edges[e_t].node2;
            let reverse = node
                .from
                .iter()
                .find(|&&e_f| graph.edges[e_f].node1 == n2);
            if let Some(&e_f) = reverse {
                suspended[e_f] = true;
            }

            remaining[n2] -= 1;
            if remaining[n2] <= 1 {
                queue.push_back(n2);
            }
        }
    }
}
