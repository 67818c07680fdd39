mod graph;
mod messages;

pub use graph::{Edge, GraphError, GraphResult, Node, PairwiseGraph};
pub(crate) use messages::MessageStore;
