use std::fmt;

use crate::problem::{Problem, Task};

mod order;

pub use order::ResourceOrder;

/// Start times obtained by decoding a [`ResourceOrder`].
///
/// Decoding never fails. An order that does not partition the tasks over their
/// machines, or whose precedences form a cycle, yields a schedule for which
/// [`Schedule::is_valid`] is false.
#[derive(Debug, Clone)]
pub struct Schedule<'p> {
    problem: &'p Problem,
    order: ResourceOrder,
    starts: Vec<u32>,
    makespan: u32,
    valid: bool,
}

impl<'p> Schedule<'p> {
    pub fn decode(problem: &'p Problem, order: ResourceOrder) -> Self {
        match simulate(problem, &order) {
            Some(starts) => {
                let makespan = problem
                    .tasks()
                    .map(|t| starts[t.id(problem.num_tasks())] + problem.duration(t))
                    .max()
                    .unwrap_or(0);
                Schedule { problem, order, starts, makespan, valid: true }
            }
            None => Schedule {
                problem,
                order,
                starts: vec![0; problem.num_operations()],
                makespan: 0,
                valid: false,
            },
        }
    }

    pub fn problem(&self) -> &'p Problem {
        self.problem
    }

    pub fn order(&self) -> &ResourceOrder {
        &self.order
    }

    pub fn into_order(self) -> ResourceOrder {
        self.order
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn start(&self, task: Task) -> u32 {
        self.starts[task.id(self.problem.num_tasks())]
    }

    pub fn end(&self, task: Task) -> u32 {
        self.start(task) + self.problem.duration(task)
    }

    /// Latest completion time; 0 for an invalid schedule.
    pub fn makespan(&self) -> u32 {
        self.makespan
    }

    /// Chain of tasks without slack that ends at the makespan, first task first.
    ///
    /// The walk starts at the lowest task (in job, task order) finishing at the
    /// makespan and moves to a predecessor ending exactly when the current task
    /// starts. When both the machine and the job predecessor qualify, the machine
    /// predecessor is taken. Empty for an invalid schedule.
    pub fn critical_path(&self) -> Vec<Task> {
        if !self.valid {
            return Vec::new();
        }

        let Some(mut current) = self.problem.tasks().find(|t| self.end(*t) == self.makespan) else {
            return Vec::new();
        };

        let mut path = vec![current];
        while self.start(current) > 0 {
            let limiting = self
                .machine_predecessor(current)
                .into_iter()
                .chain(current.job_predecessor())
                .find(|p| self.end(*p) == self.start(current));

            match limiting {
                Some(previous) => {
                    path.push(previous);
                    current = previous;
                }
                None => break,
            }
        }

        path.reverse();
        path
    }

    fn machine_predecessor(&self, task: Task) -> Option<Task> {
        let machine = self.problem.machine(task);
        let position = self.order.position(machine, task)?;
        position.checked_sub(1).map(|p| self.order.machine(machine)[p])
    }
}

impl fmt::Display for Schedule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return writeln!(f, "invalid schedule");
        }

        for (machine, tasks) in self.order.machines().enumerate() {
            write!(f, "M{}:", machine)?;
            for task in tasks {
                write!(f, " {}[{}-{}]", task, self.start(*task), self.end(*task))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "makespan: {}", self.makespan)
    }
}

/// Start time of every task (indexed by task id), or `None` when the order is
/// not a partition of the tasks over their machines or contains a cycle.
///
/// Each task depends on at most two others: its job predecessor and its machine
/// predecessor. Tasks are released as soon as both are done, so every task is
/// visited once.
fn simulate(problem: &Problem, order: &ResourceOrder) -> Option<Vec<u32>> {
    let tasks = problem.num_tasks();
    let n = problem.num_operations();
    if order.num_machines() != problem.num_machines() {
        return None;
    }

    let mut machine_predecessor: Vec<Option<usize>> = vec![None; n];
    let mut machine_successor: Vec<Option<usize>> = vec![None; n];
    let mut seen = vec![false; n];

    for (machine, sequence) in order.machines().enumerate() {
        let mut previous = None;
        for task in sequence {
            if task.job >= problem.num_jobs() || task.task >= tasks || problem.machine(*task) != machine {
                return None;
            }
            let id = task.id(tasks);
            if std::mem::replace(&mut seen[id], true) {
                return None;
            }
            if let Some(p) = previous {
                machine_predecessor[id] = Some(p);
                machine_successor[p] = Some(id);
            }
            previous = Some(id);
        }
    }
    if seen.iter().any(|s| !s) {
        return None;
    }

    // Number of unfinished predecessors per task.
    let mut pending: Vec<u8> = (0..n)
        .map(|id| u8::from(id % tasks != 0) + u8::from(machine_predecessor[id].is_some()))
        .collect();
    let mut ready: Vec<usize> = (0..n).filter(|id| pending[*id] == 0).collect();
    let mut starts = vec![0u32; n];
    let mut ends = vec![0u32; n];
    let mut scheduled = 0;

    while let Some(id) = ready.pop() {
        let job_end = if id % tasks != 0 { ends[id - 1] } else { 0 };
        let machine_end = machine_predecessor[id].map_or(0, |p| ends[p]);
        starts[id] = job_end.max(machine_end);
        ends[id] = starts[id] + problem.duration(Task::from_id(id, tasks));
        scheduled += 1;

        let job_successor = Some(id + 1).filter(|s| s % tasks != 0);
        for successor in job_successor.into_iter().chain(machine_successor[id]) {
            pending[successor] -= 1;
            if pending[successor] == 0 {
                ready.push(successor);
            }
        }
    }

    // Tasks left pending sit on a cycle.
    (scheduled == n).then_some(starts)
}
