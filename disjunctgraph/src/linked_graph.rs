use hashbrown::HashSet;

use crate::{Graph, GraphError, GraphNode, NodeId, NodeIterator, Relation};

#[derive(Clone, Debug)]
pub struct LinkedGraph<T: NodeId + Clone> {
    nodes: Vec<T>,
    successors: Vec<HashSet<usize>>,
    predecessors: Vec<HashSet<usize>>,
}

impl<T: NodeId + GraphNode + Clone> Graph for LinkedGraph<T> {
    type Node = T;

    fn create(nodes: Vec<T>, edges: Vec<Vec<Relation>>) -> Self {
        let successors = edges.iter().map(|x| {
            x.iter()
                .filter_map(|x| match x {
                    Relation::Successor(e) => Some(*e),
                    _ => None,
                })
                .collect::<HashSet<_>>()
        });

        let predecessors = edges.iter().map(|x| {
            x.iter()
                .filter_map(|x| match x {
                    Relation::Predecessor(e) => Some(*e),
                    _ => None,
                })
                .collect::<HashSet<_>>()
        });

        LinkedGraph {
            successors: successors.collect(),
            predecessors: predecessors.collect(),
            nodes,
        }
    }

    fn nodes(&self) -> &[T] {
        &self.nodes
    }

    fn successors(&self, id: &impl NodeId) -> NodeIterator<Self> {
        NodeIterator(Box::new(self.successors[id.id()].iter().map(move |x| &self.nodes[*x])))
    }

    fn predecessors(&self, id: &impl NodeId) -> NodeIterator<Self> {
        NodeIterator(Box::new(self.predecessors[id.id()].iter().map(move |x| &self.nodes[*x])))
    }

    fn add_edge(&mut self, node_1: &impl NodeId, node_2: &impl NodeId) -> Result<(), GraphError> {
        let node_1 = node_1.id();
        let node_2 = node_2.id();
        if node_1 >= self.nodes.len() || node_2 >= self.nodes.len() {
            return Err(GraphError::InvalidEdge);
        }

        // node_1 -> node_2
        self.successors[node_1].insert(node_2);
        self.predecessors[node_2].insert(node_1);
        Ok(())
    }

    fn has_precedence(&self, node_1: &impl NodeId, node_2: &impl NodeId) -> bool {
        self.successors
            .get(node_1.id())
            .is_some_and(|s| s.contains(&node_2.id()))
    }
}

impl<T: NodeId + Clone> std::ops::Index<usize> for LinkedGraph<T> {
    type Output = T;

    fn index(&self, node: usize) -> &Self::Output {
        &self.nodes[node]
    }
}

impl<T: NodeId + Clone> LinkedGraph<T> {
    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(|s| s.len()).sum()
    }

    /// All edges as (source, target) pairs, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = self
            .successors
            .iter()
            .enumerate()
            .flat_map(|(a, s)| s.iter().map(move |b| (a, *b)))
            .collect::<Vec<_>>();
        edges.sort_unstable();
        edges
    }
}
