mod linked_graph;
#[cfg(feature = "labeller")]
mod labeller;

use std::collections::VecDeque;

use thiserror::Error;

pub use linked_graph::LinkedGraph;
#[cfg(feature = "labeller")]
pub use labeller::render;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    #[error("the precedence graph contains a cycle")]
    Cyclic,
    #[error("edge refers to a node outside of the graph")]
    InvalidEdge,
}

pub trait NodeId {
    fn id(&self) -> usize;
}

impl NodeId for usize {
    fn id(&self) -> usize {
        *self
    }
}

pub trait GraphNode: NodeId {
    fn create(id: usize, weight: u32, machine_id: Option<usize>, job_id: Option<usize>) -> Self;
    fn weight(&self) -> u32;
    fn job_id(&self) -> Option<usize>;
    fn machine_id(&self) -> Option<usize>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Successor(usize),
    Predecessor(usize),
}

const TOPOLOGY_PROCESSED: u8 = 1;
const TOPOLOGY_IN_STACK: u8 = 2;
enum Status {
    Visited(usize),
    Unvisited(usize),
}

/// Depth-first walk over predecessors, yielding every node after all of its
/// predecessors when the graph is acyclic.
///
/// Every node is yielded exactly once, cyclic or not. On a cyclic graph the
/// order violates at least one edge, which is what [`Graph::is_cyclic`] checks.
pub struct TopologyIterator<'a, G: Graph> {
    graph: &'a G,
    node_state: Vec<u8>, // processed, in_stack as bitflags
    stack: VecDeque<Status>,
}

impl<'a, G: Graph> Iterator for TopologyIterator<'a, G> {
    type Item = &'a G::Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current_node = self.stack.pop_back()?;

            match current_node {
                Status::Unvisited(current_node) => {
                    if self.node_state[current_node] == 0 {
                        // Predecessors that are neither processed nor waiting to be processed
                        let predecessors = self
                            .graph
                            .predecessors(&current_node)
                            .filter(|x| self.node_state[x.id()] == 0)
                            .map(|x| x.id())
                            .collect::<Vec<_>>();

                        self.stack.reserve(predecessors.len() + 1);
                        self.stack.push_back(Status::Visited(current_node));
                        self.stack.extend(predecessors.into_iter().map(Status::Unvisited));
                        self.node_state[current_node] |= TOPOLOGY_IN_STACK;
                    }
                }
                Status::Visited(current_node) => {
                    if (self.node_state[current_node] & TOPOLOGY_PROCESSED) == 0 {
                        self.node_state[current_node] = TOPOLOGY_PROCESSED;
                        return Some(&self.graph.nodes()[current_node]);
                    }
                }
            }
        }
    }
}

pub struct NodeIterator<'a, G: Graph>(Box<dyn Iterator<Item = &'a G::Node> + 'a>);

impl<'a, G: Graph> Iterator for NodeIterator<'a, G> {
    type Item = &'a G::Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

pub trait Graph
where
    Self: Sized + std::ops::Index<usize, Output = <Self as Graph>::Node>,
{
    type Node: NodeId + GraphNode;

    /// Builds a graph from its nodes and, per node, the relations it takes part in.
    /// Both sides of an edge have to be listed.
    fn create(nodes: Vec<Self::Node>, edges: Vec<Vec<Relation>>) -> Self;
    fn nodes(&self) -> &[Self::Node];
    fn successors(&self, id: &impl NodeId) -> NodeIterator<Self>;
    fn predecessors(&self, id: &impl NodeId) -> NodeIterator<Self>;
    fn add_edge(&mut self, node_1: &impl NodeId, node_2: &impl NodeId) -> Result<(), GraphError>;

    /// Graph contains relation: node_1 -> node_2
    fn has_precedence(&self, node_1: &impl NodeId, node_2: &impl NodeId) -> bool;

    /// Retrieves a topological ordering of all nodes.
    fn topology(&self) -> TopologyIterator<'_, Self> {
        let n = self.nodes().len();
        let mut stack = VecDeque::with_capacity(n);
        // Reverse so that the lowest ids are expanded first.
        stack.extend((0..n).rev().map(Status::Unvisited));

        TopologyIterator {
            graph: self,
            node_state: vec![0u8; n],
            stack,
        }
    }

    fn is_cyclic(&self) -> bool {
        let mut position = vec![0usize; self.nodes().len()];
        for (index, node) in self.topology().enumerate() {
            position[node.id()] = index;
        }

        self.nodes()
            .iter()
            .any(|node| self.successors(node).any(|s| position[s.id()] <= position[node.id()]))
    }

    /// Earliest start of every node: the heaviest path from any root up to, but
    /// excluding, the node itself.
    fn heads(&self) -> Result<Vec<u32>, GraphError> {
        if self.is_cyclic() {
            return Err(GraphError::Cyclic);
        }

        let nodes = self.nodes();
        let mut heads = vec![0u32; nodes.len()];
        for node in self.topology() {
            heads[node.id()] = self
                .predecessors(node)
                .map(|x| heads[x.id()] + nodes[x.id()].weight())
                .max()
                .unwrap_or(0);
        }
        Ok(heads)
    }

    fn critical_length(&self) -> Result<u32, GraphError> {
        let heads = self.heads()?;
        Ok(self
            .nodes()
            .iter()
            .map(|node| heads[node.id()] + node.weight())
            .max()
            .unwrap_or(0))
    }
}
