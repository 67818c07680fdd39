use ndarray::array;

use crate::core::{GraphError, PairwiseGraph};

#[test]
fn small_pairwise_graph_logic() {
    let mut graph = PairwiseGraph::new(2);
    for pot in [
        array![0.9, 0.1],
        array![0.5, 0.5],
        array![0.2, 0.8],
        array![0.4, 0.6],
    ] {
        graph.add_node(pot).unwrap();
    }
    let coupling = array![[0.8, 0.2], [0.4, 0.6]];
    graph.add_edge(0, 1, coupling.clone()).unwrap();
    graph.add_edge(1, 2, coupling.clone()).unwrap();
    graph.add_edge(3, 1, coupling.clone()).unwrap();
    assert_eq!(graph.num_nodes(), 4);
    assert_eq!(graph.num_edges(), 6);
    // --------------------------------------------------------------------------------------
    // every undirected link is a pair of mirrored arcs
    for pair in 0..3 {
        let forward = graph.edge(2 * pair);
        let backward = graph.edge(2 * pair + 1);
        assert_eq!(forward.node1(), backward.node2());
        assert_eq!(forward.node2(), backward.node1());
        for s1 in 0..2 {
            for s2 in 0..2 {
                assert_eq!(
                    forward.potential()[[s1, s2]],
                    backward.potential()[[s2, s1]]
                );
            }
        }
    }
    // --------------------------------------------------------------------------------------
    // arcs store the element-wise square root of the supplied compatibility
    for s1 in 0..2 {
        for s2 in 0..2 {
            let stored = graph.edge(0).potential()[[s1, s2]];
            assert!((stored * stored - coupling[[s1, s2]]).abs() < 1e-12);
        }
    }
    // --------------------------------------------------------------------------------------
    // adjacency lists mirror the arcs
    assert_eq!(graph.node(0).outgoing_edges(), [0]);
    assert_eq!(graph.node(0).incoming_edges(), [1]);
    assert_eq!(graph.node(1).outgoing_edges(), [1, 2, 5]);
    assert_eq!(graph.node(1).incoming_edges(), [0, 3, 4]);
    assert_eq!(graph.node(2).outgoing_edges(), [3]);
    assert_eq!(graph.node(2).incoming_edges(), [2]);
    assert_eq!(graph.node(3).outgoing_edges(), [4]);
    assert_eq!(graph.node(3).incoming_edges(), [5]);
    for node in graph.nodes() {
        for &e_t in node.outgoing_edges() {
            assert_eq!(graph.edge(e_t).node1(), node.id());
        }
        for &e_f in node.incoming_edges() {
            assert_eq!(graph.edge(e_f).node2(), node.id());
        }
    }
}

#[test]
fn construction_errors() {
    let mut graph = PairwiseGraph::new(3);
    assert_eq!(
        graph.add_node(array![0.5, 0.5]),
        Err(GraphError::PotentialShapeMismatch {
            states_number: 3,
            shape: vec![2],
        })
    );
    graph.add_node(array![0.2, 0.3, 0.5]).unwrap();
    graph.add_node(array![0.1, 0.1, 0.8]).unwrap();
    assert_eq!(
        graph.add_edge(0, 2, array![[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]]),
        Err(GraphError::OutOfRangeNode(2, 2))
    );
    assert_eq!(
        graph.add_edge(0, 1, array![[1., 0.], [0., 1.]]),
        Err(GraphError::PotentialShapeMismatch {
            states_number: 3,
            shape: vec![2, 2],
        })
    );
    assert!(graph.node_potential_mut(5).is_err());
}
