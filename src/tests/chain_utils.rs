use ndarray::{array, Array1, Array2};

use crate::core::PairwiseGraph;

/// A model small enough to compare against brute-force enumeration of all
/// joint assignments
pub(super) struct SmallModel {
    pub(super) n_states: usize,
    pub(super) unaries: Vec<Array1<f64>>,
    pub(super) links: Vec<(usize, usize, Array2<f64>)>,
}

impl SmallModel {
    pub(super) fn graph(&self) -> PairwiseGraph {
        let mut graph =
            PairwiseGraph::with_capacity(self.n_states, self.unaries.len(), self.links.len());
        for pot in &self.unaries {
            graph.add_node(pot.clone()).unwrap();
        }
        for (node1, node2, pot) in &self.links {
            graph.add_edge(*node1, *node2, pot.clone()).unwrap();
        }
        graph
    }

    fn joint(&self, config: &[usize]) -> f64 {
        let mut p = 1f64;
        for (pot, s) in self.unaries.iter().zip(config) {
            p *= pot[*s];
        }
        for (node1, node2, pot) in &self.links {
            p *= pot[[config[*node1], config[*node2]]];
        }
        p
    }

    fn configs(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        let n_nodes = self.unaries.len();
        let n_states = self.n_states;
        (0..n_states.pow(n_nodes as u32)).map(move |mut code| {
            let mut config = vec![0; n_nodes];
            for s in config.iter_mut() {
                *s = code % n_states;
                code /= n_states;
            }
            config
        })
    }

    /// Exact per-node marginals by enumeration of all joint assignments
    pub(super) fn exact_marginals(&self) -> Vec<Array1<f64>> {
        let mut marginals = vec![Array1::<f64>::zeros(self.n_states); self.unaries.len()];
        let mut z = 0f64;
        for config in self.configs() {
            let p = self.joint(&config);
            z += p;
            for (marginal, s) in marginals.iter_mut().zip(&config) {
                marginal[*s] += p;
            }
        }
        for marginal in marginals.iter_mut() {
            *marginal /= z;
        }
        marginals
    }

    /// The jointly most probable assignment by enumeration
    pub(super) fn exact_map(&self) -> Vec<usize> {
        let mut best = None;
        let mut best_p = f64::NEG_INFINITY;
        for config in self.configs() {
            let p = self.joint(&config);
            if p > best_p {
                best_p = p;
                best = Some(config);
            }
        }
        best.unwrap()
    }
}

/// The 3-node, 2-state chain with explicit unary potentials and a mild
/// identity-like coupling on both links
pub(super) fn three_node_chain() -> SmallModel {
    let coupling = array![[0.8, 0.2], [0.2, 0.8]];
    SmallModel {
        n_states: 2,
        unaries: vec![array![0.9, 0.1], array![0.5, 0.5], array![0.2, 0.8]],
        links: vec![(0, 1, coupling.clone()), (1, 2, coupling)],
    }
}

/// A 2x2 grid, the smallest graph with a message-relevant cycle
pub(super) fn square_model() -> SmallModel {
    let coupling = array![[0.7, 0.3], [0.3, 0.7]];
    SmallModel {
        n_states: 2,
        unaries: vec![
            array![0.8, 0.2],
            array![0.6, 0.4],
            array![0.3, 0.7],
            array![0.5, 0.5],
        ],
        links: vec![
            (0, 1, coupling.clone()),
            (1, 3, coupling.clone()),
            (3, 2, coupling.clone()),
            (2, 0, coupling),
        ],
    }
}

pub(super) fn max_belief_distance(graph: &PairwiseGraph, expected: &[Array1<f64>]) -> f64 {
    let mut max_distance = 0f64;
    for (node, marginal) in graph.nodes().iter().zip(expected) {
        for (found, exact) in node.potential().iter().zip(marginal) {
            let distance = (found - exact).abs();
            if distance > max_distance {
                max_distance = distance;
            }
        }
    }
    max_distance
}

pub(super) fn assert_beliefs_normalized(graph: &PairwiseGraph) {
    for node in graph.nodes() {
        let sum: f64 = node.potential().sum();
        assert!(
            (sum - 1f64).abs() < 1e-10,
            "Belief of node {} sums to {}",
            node.id(),
            sum
        );
        assert!(node.potential().iter().all(|p| p.is_finite()));
        assert!(node.solution().is_some());
    }
}
