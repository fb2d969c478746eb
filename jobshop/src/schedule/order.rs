use disjunctgraph::{Graph, GraphError, GraphNode, LinkedGraph, Relation};

use crate::problem::{Problem, Task, TaskNode};
use crate::schedule::Schedule;

/// Resource-order encoding: for every machine, the order in which it processes
/// its tasks. Together with the fixed job order this determines a schedule.
///
/// Cloning copies every machine sequence, so a clone can be mutated freely
/// without touching the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceOrder {
    tasks_by_machine: Vec<Vec<Task>>,
}

impl ResourceOrder {
    /// Empty sequences, one per machine.
    pub fn new(problem: &Problem) -> Self {
        ResourceOrder {
            tasks_by_machine: (0..problem.num_machines())
                .map(|_| Vec::with_capacity(problem.num_jobs()))
                .collect(),
        }
    }

    /// Wraps raw machine sequences. Nothing is checked here, a malformed order
    /// decodes into an invalid schedule.
    pub fn from_machines(tasks_by_machine: Vec<Vec<Task>>) -> Self {
        ResourceOrder { tasks_by_machine }
    }

    /// Builds an order from a job-number sequence: the k-th occurrence of job
    /// `j` stands for task `(j, k)`, and tasks are appended to their machines in
    /// sequence order.
    pub fn from_job_numbers(problem: &Problem, jobs: &[usize]) -> Option<Self> {
        if jobs.len() != problem.num_operations() {
            return None;
        }

        let mut next_task = vec![0usize; problem.num_jobs()];
        let mut order = ResourceOrder::new(problem);
        for &job in jobs {
            let task = next_task.get_mut(job)?;
            if *task >= problem.num_tasks() {
                return None;
            }
            order.push(problem, Task::new(job, *task));
            *task += 1;
        }
        Some(order)
    }

    /// Appends `task` to the sequence of the machine it runs on.
    pub fn push(&mut self, problem: &Problem, task: Task) {
        self.tasks_by_machine[problem.machine(task)].push(task);
    }

    pub fn num_machines(&self) -> usize {
        self.tasks_by_machine.len()
    }

    pub fn machine(&self, machine: usize) -> &[Task] {
        &self.tasks_by_machine[machine]
    }

    pub fn machines(&self) -> impl Iterator<Item = &[Task]> + '_ {
        self.tasks_by_machine.iter().map(|m| m.as_slice())
    }

    /// Position of `task` within the sequence of `machine`.
    pub fn position(&self, machine: usize, task: Task) -> Option<usize> {
        self.tasks_by_machine
            .get(machine)?
            .iter()
            .position(|t| *t == task)
    }

    /// Exchanges the tasks at positions `a` and `b` of one machine.
    pub fn swap(&mut self, machine: usize, a: usize, b: usize) {
        self.tasks_by_machine[machine].swap(a, b);
    }

    pub fn decode<'p>(&self, problem: &'p Problem) -> Schedule<'p> {
        Schedule::decode(problem, self.clone())
    }

    pub fn into_schedule(self, problem: &Problem) -> Schedule<'_> {
        Schedule::decode(problem, self)
    }

    /// The fully oriented precedence graph of this order: a source (node 0), one
    /// node per task (`id + 1`), and a sink (last node). Job arcs and machine arcs
    /// are both present.
    pub fn to_graph(&self, problem: &Problem) -> Result<LinkedGraph<TaskNode>, GraphError> {
        let tasks = problem.num_tasks();
        let sink = problem.num_operations() + 1;

        let mut nodes = Vec::with_capacity(sink + 1);
        nodes.push(TaskNode::create(0, 0, None, None));
        nodes.extend(problem.tasks().map(|t| {
            let activity = problem.activity(t);
            TaskNode::create(t.id(tasks) + 1, activity.process_time, Some(activity.machine_id), Some(t.job))
        }));
        nodes.push(TaskNode::create(sink, 0, None, None));

        let mut edges: Vec<Vec<Relation>> = vec![Vec::new(); sink + 1];
        let mut link = |a: usize, b: usize| {
            edges[a].push(Relation::Successor(b));
            edges[b].push(Relation::Predecessor(a));
        };

        // Job arcs, framed by the source and the sink
        for job in 0..problem.num_jobs() {
            let first = Task::new(job, 0).id(tasks) + 1;
            link(0, first);
            for task in 1..tasks {
                let node = Task::new(job, task).id(tasks) + 1;
                link(node - 1, node);
            }
            link(first + tasks - 1, sink);
        }

        let mut graph = LinkedGraph::create(nodes, edges);

        // Machine arcs
        for sequence in &self.tasks_by_machine {
            for pair in sequence.windows(2) {
                if pair.iter().any(|t| t.job >= problem.num_jobs() || t.task >= tasks) {
                    return Err(GraphError::InvalidEdge);
                }
                graph.add_edge(&(pair[0].id(tasks) + 1), &(pair[1].id(tasks) + 1))?;
            }
        }

        Ok(graph)
    }
}
