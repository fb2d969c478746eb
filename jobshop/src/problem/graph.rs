/// Node of the precedence graph induced by a [`ResourceOrder`](crate::schedule::ResourceOrder).
/// Node 0 is the source and the last node the sink; both weigh nothing.
#[derive(Clone, Debug)]
pub struct TaskNode {
    id: usize,
    weight: u32,
    job_id: Option<usize>,
    machine_id: Option<usize>,
}

impl disjunctgraph::NodeId for TaskNode {
    fn id(&self) -> usize {
        self.id
    }
}

impl disjunctgraph::GraphNode for TaskNode {
    fn create(id: usize, weight: u32, machine_id: Option<usize>, job_id: Option<usize>) -> Self {
        TaskNode { id, weight, job_id, machine_id }
    }
    fn weight(&self) -> u32 {
        self.weight
    }
    fn job_id(&self) -> Option<usize> {
        self.job_id
    }
    fn machine_id(&self) -> Option<usize> {
        self.machine_id
    }
}
