use std::{error::Error, fmt::Display};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Errors that could appear while building a pairwise graph
pub enum GraphError {
    /// Index of a node is out of range
    OutOfRangeNode(usize, usize),

    /// Shape of a potential does not match the number of states of a graph
    PotentialShapeMismatch {
        /// Number of states declared by the graph
        states_number: usize,

        /// Shape of the rejected potential
        shape: Vec<usize>,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::OutOfRangeNode(size, pos) => write!(
                f,
                "Index of a node {} is out of range of [0..{}] nodes",
                pos, size,
            ),
            GraphError::PotentialShapeMismatch {
                states_number,
                shape,
            } => write!(
                f,
                "Shape {:?} of a potential does not match the number of states {} of the graph",
                shape, states_number,
            ),
        }
    }
}

impl Error for GraphError {}

/// Pairwise graph's methods result type
pub type GraphResult<T> = Result<T, GraphError>;

// ------------------------------------------------------------------------------------------

/// A node of a pairwise graph carrying a unary potential over discrete states
///
/// # Notes
///
/// Inference folds beliefs into the unary potential in place and fills the
/// solution slot, see [`crate::infer::run_inference`]
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: usize,
    pub(crate) pot: Array1<f64>,
    pub(crate) to: Vec<usize>,
    pub(crate) from: Vec<usize>,
    pub(crate) sol: Option<usize>,
}

impl Node {
    /// Returns the id of a node
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the unary potential of a node. After a successful inference
    /// run it holds the node's belief, a distribution over states summing
    /// to one
    #[inline]
    pub fn potential(&self) -> &Array1<f64> {
        &self.pot
    }

    /// Returns ids of the outgoing edges of a node
    #[inline]
    pub fn outgoing_edges(&self) -> &[usize] {
        &self.to
    }

    /// Returns ids of the incoming edges of a node
    #[inline]
    pub fn incoming_edges(&self) -> &[usize] {
        &self.from
    }

    /// Returns the state selected for a node by the last inference run, if any
    #[inline]
    pub fn solution(&self) -> Option<usize> {
        self.sol
    }
}

/// A directed arc of a pairwise graph carrying a pairwise potential matrix
///
/// # Notes
///
/// Every undirected link of a model is represented by two mirrored arcs,
/// see [`PairwiseGraph::add_edge`]
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) node1: usize,
    pub(crate) node2: usize,
    pub(crate) pot: Array2<f64>,
}

impl Edge {
    /// Returns the id of the source node of an arc
    #[inline]
    pub fn node1(&self) -> usize {
        self.node1
    }

    /// Returns the id of the destination node of an arc
    #[inline]
    pub fn node2(&self) -> usize {
        self.node2
    }

    /// Returns the pairwise potential matrix of an arc, rows indexed by the
    /// source node's state and columns by the destination node's state
    ///
    /// # Notes
    ///
    /// The stored matrix is the element-wise square root of the
    /// compatibility supplied to [`PairwiseGraph::add_edge`]; message
    /// updates square it back
    #[inline]
    pub fn potential(&self) -> &Array2<f64> {
        &self.pot
    }
}

// ------------------------------------------------------------------------------------------

/// A discrete pairwise graphical model: nodes with unary potentials linked
/// by edges with pairwise compatibility matrices
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use pgmrs::core::PairwiseGraph;
///
/// let mut graph = PairwiseGraph::new(2);
/// let a = graph.add_node(array![0.9, 0.1]).unwrap();
/// let b = graph.add_node(array![0.5, 0.5]).unwrap();
/// graph.add_edge(a, b, array![[0.8, 0.2], [0.2, 0.8]]).unwrap();
/// assert_eq!(graph.num_nodes(), 2);
/// assert_eq!(graph.num_edges(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PairwiseGraph {
    n_states: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
}

impl PairwiseGraph {
    /// Creates an empty pairwise graph
    ///
    /// # Arguments
    ///
    /// * `states_number` - A number of discrete states, common to all nodes
    #[inline]
    pub fn new(states_number: usize) -> Self {
        PairwiseGraph {
            n_states: states_number,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Creates an empty pairwise graph with preallocated memory
    ///
    /// # Arguments
    ///
    /// * `states_number` - A number of discrete states, common to all nodes
    /// * `nodes_capacity` - A number of nodes we need to preallocate memory for
    /// * `edges_capacity` - A number of undirected links we need to preallocate memory for
    #[inline]
    pub fn with_capacity(states_number: usize, nodes_capacity: usize, edges_capacity: usize) -> Self {
        PairwiseGraph {
            n_states: states_number,
            nodes: Vec::with_capacity(nodes_capacity),
            edges: Vec::with_capacity(2 * edges_capacity),
        }
    }

    /// Adds a node to a graph and returns its id
    ///
    /// # Arguments
    ///
    /// * `potential` - A unary potential, non-negative values per state
    ///
    /// # Notes
    ///
    /// If the potential length does not match the number of states of the
    /// graph, the method returns an error
    #[inline]
    pub fn add_node(&mut self, potential: Array1<f64>) -> GraphResult<usize> {
        if potential.len() != self.n_states {
            return Err(GraphError::PotentialShapeMismatch {
                states_number: self.n_states,
                shape: potential.shape().to_vec(),
            });
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            pot: potential,
            to: Vec::new(),
            from: Vec::new(),
            sol: None,
        });
        Ok(id)
    }

    /// Adds an undirected link between two nodes and returns the id of its
    /// first arc (the second arc gets the next id)
    ///
    /// # Arguments
    ///
    /// * `node1` - The id of the first node
    /// * `node2` - The id of the second node
    /// * `potential` - A pairwise compatibility matrix, rows indexed by
    ///     `node1`'s state and columns by `node2`'s state
    ///
    /// # Notes
    ///
    /// Two mirrored directed arcs are inserted, `node1 → node2` and
    /// `node2 → node1` with the transposed matrix, which keeps the
    /// outgoing/incoming adjacency lists of the two nodes consistent mirror
    /// images of each other. Each arc stores the element-wise square root
    /// of `potential`, restored by the squared-matrix message transform, so
    /// the supplied compatibility is what the model realizes
    pub fn add_edge(
        &mut self,
        node1: usize,
        node2: usize,
        potential: Array2<f64>,
    ) -> GraphResult<usize> {
        if potential.shape() != [self.n_states, self.n_states] {
            return Err(GraphError::PotentialShapeMismatch {
                states_number: self.n_states,
                shape: potential.shape().to_vec(),
            });
        }
        if node1 >= self.nodes.len() {
            return Err(GraphError::OutOfRangeNode(self.nodes.len(), node1));
        }
        if node2 >= self.nodes.len() {
            return Err(GraphError::OutOfRangeNode(self.nodes.len(), node2));
        }
        let root = potential.mapv(f64::sqrt);
        let root_t = root.t().to_owned();
        let forward = self.edges.len();
        let backward = forward + 1;
        self.edges.push(Edge {
            node1,
            node2,
            pot: root,
        });
        self.edges.push(Edge {
            node1: node2,
            node2: node1,
            pot: root_t,
        });
        self.nodes[node1].to.push(forward);
        self.nodes[node2].from.push(forward);
        self.nodes[node2].to.push(backward);
        self.nodes[node1].from.push(backward);
        Ok(forward)
    }

    /// Returns the number of discrete states of a graph
    #[inline]
    pub fn num_states(&self) -> usize {
        self.n_states
    }

    /// Returns the number of nodes of a graph
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of directed arcs of a graph (twice the number of
    /// undirected links)
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns a node by its id
    #[inline]
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Returns all nodes of a graph in the id order
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns a directed arc by its id
    #[inline]
    pub fn edge(&self, id: usize) -> &Edge {
        &self.edges[id]
    }

    /// Returns mutable access to the unary potential of a node
    ///
    /// # Arguments
    ///
    /// * `id` - The id of a node
    #[inline]
    pub fn node_potential_mut(&mut self, id: usize) -> GraphResult<&mut Array1<f64>> {
        let size = self.nodes.len();
        self.nodes
            .get_mut(id)
            .map(|node| &mut node.pot)
            .ok_or(GraphError::OutOfRangeNode(size, id))
    }

    /// Returns the states selected by the last inference run for all nodes
    /// in the id order
    ///
    /// # Notes
    ///
    /// Panics if inference has not been run yet
    #[inline]
    pub fn solutions(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .map(|node| {
                node.sol
                    .unwrap_or_else(|| panic!("Node {} has no solution, run inference first", node.id))
            })
            .collect()
    }
}
