use std::borrow::Cow;
use std::io::{self, Write};

use crate::{GraphNode, LinkedGraph, NodeId};

type DotNode = usize;
type DotEdge = (DotNode, DotNode);

/// Writes the graph in Graphviz format.
pub fn render<T, W>(graph: &LinkedGraph<T>, output: &mut W) -> io::Result<()>
where
    T: GraphNode + Clone,
    W: Write,
{
    dot::render(graph, output)
}

impl<'a, T: GraphNode + Clone> dot::Labeller<'a, DotNode, DotEdge> for LinkedGraph<T> {
    fn graph_id(&'a self) -> dot::Id<'a> {
        dot::Id::new("precedence").expect("constant graph id is a valid identifier")
    }

    // Node names double as labels: `J<job>M<machine>` for operations.
    fn node_id(&'a self, n: &DotNode) -> dot::Id<'a> {
        let node = &self[*n];
        let name = match (node.job_id(), node.machine_id()) {
            (Some(job), Some(machine)) => format!("J{}M{}_{}", job, machine, node.id()),
            _ => format!("N{}", node.id()),
        };
        dot::Id::new(name).expect("generated node ids are alphanumeric")
    }
}

impl<'a, T: GraphNode + Clone> dot::GraphWalk<'a, DotNode, DotEdge> for LinkedGraph<T> {
    fn nodes(&'a self) -> dot::Nodes<'a, DotNode> {
        Cow::Owned((0..crate::Graph::nodes(self).len()).collect())
    }

    fn edges(&'a self) -> dot::Edges<'a, DotEdge> {
        Cow::Owned(LinkedGraph::edges(self))
    }

    fn source(&'a self, e: &DotEdge) -> DotNode {
        e.0
    }

    fn target(&'a self, e: &DotEdge) -> DotNode {
        e.1
    }
}
