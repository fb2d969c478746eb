use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use thiserror::Error;

use crate::schedule::Schedule;

mod graph;

pub use graph::TaskNode;

/// A solver turns a problem into a schedule before (ideally) the deadline passes.
pub trait ProblemSolver {
    fn solve<'p>(&self, problem: &'p Problem, deadline: Instant) -> SolveResult<'p>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The search exhausted its neighborhood or its iteration budget.
    Blocked,
    /// The deadline passed before the search was done.
    Timeout,
    ProvedOptimal,
}

impl fmt::Display for ExitCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCause::Blocked => write!(f, "blocked"),
            ExitCause::Timeout => write!(f, "timeout"),
            ExitCause::ProvedOptimal => write!(f, "optimal"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveResult<'p> {
    pub schedule: Schedule<'p>,
    pub exit_cause: ExitCause,
}

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("could not read problem: {0}")]
    Io(#[from] io::Error),
    #[error("missing `<jobs> <tasks>` header")]
    MissingHeader,
    #[error("line {line}: `{value}` is not a number")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: expected {expected} numbers, found {found}")]
    WrongFieldCount { line: usize, expected: usize, found: usize },
    #[error("missing line for job {job}")]
    MissingJob { job: usize },
    #[error("a problem needs at least one job and one task")]
    Empty,
    #[error("job {job} has {found} tasks, expected {expected}")]
    WrongTaskCount { job: usize, expected: usize, found: usize },
    #[error("task ({job}, {task}) runs on machine {machine}, which does not exist")]
    MachineOutOfRange { job: usize, task: usize, machine: usize },
    #[error("job {job} visits machine {machine} more than once")]
    RepeatedMachine { job: usize, machine: usize },
    #[error("total processing time exceeds {}", u32::MAX)]
    DurationOverflow,
}

/// An operation: the `task`-th step of `job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Task {
    pub job: usize,
    pub task: usize,
}

impl Task {
    pub fn new(job: usize, task: usize) -> Self {
        Task { job, task }
    }

    /// Dense index of the task, `job * num_tasks + task`.
    #[inline]
    pub fn id(&self, num_tasks: usize) -> usize {
        self.job * num_tasks + self.task
    }

    #[inline]
    pub fn from_id(id: usize, num_tasks: usize) -> Self {
        Task::new(id / num_tasks, id % num_tasks)
    }

    /// The task preceding this one in its job, if any.
    pub fn job_predecessor(&self) -> Option<Task> {
        self.task.checked_sub(1).map(|task| Task::new(self.job, task))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.job, self.task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub process_time: u32,
    pub machine_id: usize,
}

/// Immutable job-shop instance. Every job visits every machine exactly once,
/// so the number of tasks per job equals the number of machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    jobs: Vec<Vec<Activity>>,
    tasks: usize,
}

impl Problem {
    /// Builds a problem from `(machine, duration)` pairs per job.
    pub fn new(jobs: Vec<Vec<(usize, u32)>>) -> Result<Self, ProblemError> {
        let tasks = jobs.first().map_or(0, |j| j.len());
        if tasks == 0 {
            return Err(ProblemError::Empty);
        }

        // Every start, end and load is bounded by the sum of all durations.
        jobs.iter()
            .flatten()
            .try_fold(0u32, |total, (_, duration)| total.checked_add(*duration))
            .ok_or(ProblemError::DurationOverflow)?;

        let mut activities = Vec::with_capacity(jobs.len());
        for (job, pairs) in jobs.into_iter().enumerate() {
            if pairs.len() != tasks {
                return Err(ProblemError::WrongTaskCount {
                    job,
                    expected: tasks,
                    found: pairs.len(),
                });
            }

            let mut visited = vec![false; tasks];
            for (task, (machine, _)) in pairs.iter().enumerate() {
                if *machine >= tasks {
                    return Err(ProblemError::MachineOutOfRange { job, task, machine: *machine });
                }
                if std::mem::replace(&mut visited[*machine], true) {
                    return Err(ProblemError::RepeatedMachine { job, machine: *machine });
                }
            }

            activities.push(
                pairs
                    .into_iter()
                    .map(|(machine_id, process_time)| Activity { process_time, machine_id })
                    .collect(),
            );
        }

        Ok(Problem { jobs: activities, tasks })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        let file = File::open(path)?;
        Problem::from_reader(file)
    }

    /// Reads the line-oriented instance format:
    ///
    /// ```text
    /// # comment lines and blank lines are skipped
    /// <jobs> <tasks>
    /// <machine> <duration> <machine> <duration> ...   (one line per job)
    /// ```
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProblemError> {
        let mut lines = BufReader::new(reader).lines().enumerate().filter_map(|(i, line)| {
            match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        None
                    } else {
                        Some(Ok((i + 1, trimmed.to_owned())))
                    }
                }
                Err(e) => Some(Err(e)),
            }
        });

        let (line, header) = lines.next().transpose()?.ok_or(ProblemError::MissingHeader)?;
        let header = parse_numbers(line, &header)?;
        let (num_jobs, num_tasks) = match header[..] {
            [jobs, tasks] => (jobs as usize, tasks as usize),
            _ => {
                return Err(ProblemError::WrongFieldCount {
                    line,
                    expected: 2,
                    found: header.len(),
                })
            }
        };

        let mut jobs = Vec::with_capacity(num_jobs);
        for job in 0..num_jobs {
            let (line, text) = lines.next().transpose()?.ok_or(ProblemError::MissingJob { job })?;
            let numbers = parse_numbers(line, &text)?;
            if numbers.len() != 2 * num_tasks {
                return Err(ProblemError::WrongFieldCount {
                    line,
                    expected: 2 * num_tasks,
                    found: numbers.len(),
                });
            }
            jobs.push(numbers.chunks(2).map(|p| (p[0] as usize, p[1])).collect());
        }

        Problem::new(jobs)
    }

    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks
    }

    pub fn num_machines(&self) -> usize {
        self.tasks
    }

    pub fn num_operations(&self) -> usize {
        self.jobs.len() * self.tasks
    }

    #[inline]
    pub fn duration(&self, task: Task) -> u32 {
        self.jobs[task.job][task.task].process_time
    }

    #[inline]
    pub fn machine(&self, task: Task) -> usize {
        self.jobs[task.job][task.task].machine_id
    }

    pub fn activity(&self, task: Task) -> &Activity {
        &self.jobs[task.job][task.task]
    }

    /// All tasks, job by job, in processing order.
    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        (0..self.num_jobs()).flat_map(move |job| (0..self.tasks).map(move |task| Task::new(job, task)))
    }

    pub fn job_duration(&self, job: usize) -> u32 {
        self.jobs[job].iter().map(|a| a.process_time).sum()
    }

    pub fn machine_load(&self, machine: usize) -> u32 {
        self.jobs
            .iter()
            .flatten()
            .filter(|a| a.machine_id == machine)
            .map(|a| a.process_time)
            .sum()
    }

    /// Trivial lower bound on the makespan: the longest job or the busiest machine.
    pub fn lower_bound(&self) -> u32 {
        let jobs = (0..self.num_jobs()).map(|j| self.job_duration(j)).max();
        let machines = (0..self.num_machines()).map(|m| self.machine_load(m)).max();
        jobs.max(machines).unwrap_or(0)
    }
}

fn parse_numbers(line: usize, text: &str) -> Result<Vec<u32>, ProblemError> {
    text.split_whitespace()
        .map(|s| {
            s.parse::<u32>().map_err(|_| ProblemError::InvalidNumber {
                line,
                value: s.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_instance_with_comments() {
        let problem = Problem::from_reader(
            "# two jobs, three machines\n\n2 3\n0 3 1 3 2 2\n1 2 0 2 2 4\n".as_bytes(),
        )
        .unwrap();

        assert_eq!(problem.num_jobs(), 2);
        assert_eq!(problem.num_tasks(), 3);
        assert_eq!(problem.machine(Task::new(1, 0)), 1);
        assert_eq!(problem.duration(Task::new(1, 2)), 4);
        assert_eq!(problem.job_duration(0), 8);
        assert_eq!(problem.machine_load(2), 6);
        assert_eq!(problem.lower_bound(), 8);
        assert_eq!(Task::new(1, 2).id(problem.num_tasks()), 5);
        assert_eq!(Task::from_id(5, problem.num_tasks()), Task::new(1, 2));
        assert_eq!(Task::new(1, 0).job_predecessor(), None);
    }

    #[test]
    fn tasks_are_listed_job_by_job() {
        let problem = Problem::new(vec![vec![(0, 1), (1, 1)], vec![(1, 1), (0, 1)]]).unwrap();
        let tasks = problem.tasks().collect::<Vec<_>>();
        assert_eq!(
            tasks,
            vec![Task::new(0, 0), Task::new(0, 1), Task::new(1, 0), Task::new(1, 1)]
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            Problem::from_reader("".as_bytes()),
            Err(ProblemError::MissingHeader)
        ));
        assert!(matches!(
            Problem::from_reader("2 x".as_bytes()),
            Err(ProblemError::InvalidNumber { line: 1, .. })
        ));
        assert!(matches!(
            Problem::from_reader("2 2\n0 1 1 1\n".as_bytes()),
            Err(ProblemError::MissingJob { job: 1 })
        ));
        assert!(matches!(
            Problem::from_reader("1 2\n0 1 1\n".as_bytes()),
            Err(ProblemError::WrongFieldCount { line: 2, expected: 4, found: 3 })
        ));
    }

    #[test]
    fn rejects_invalid_machines() {
        assert!(matches!(
            Problem::new(vec![vec![(0, 1), (2, 1)]]),
            Err(ProblemError::MachineOutOfRange { job: 0, task: 1, machine: 2 })
        ));
        assert!(matches!(
            Problem::new(vec![vec![(0, 1), (1, 1)], vec![(1, 1), (1, 1)]]),
            Err(ProblemError::RepeatedMachine { job: 1, machine: 1 })
        ));
        assert!(matches!(
            Problem::new(vec![vec![(0, 1), (1, 1)], vec![(1, 1)]]),
            Err(ProblemError::WrongTaskCount { job: 1, expected: 2, found: 1 })
        ));
        assert!(matches!(Problem::new(vec![]), Err(ProblemError::Empty)));
    }

    #[test]
    fn rejects_durations_beyond_the_time_range() {
        assert!(matches!(
            Problem::new(vec![vec![(0, 3_000_000_000), (1, 3_000_000_000)]]),
            Err(ProblemError::DurationOverflow)
        ));
        // Spread over two jobs, the machine loads still overflow.
        assert!(matches!(
            Problem::new(vec![vec![(0, u32::MAX), (1, 0)], vec![(0, 1), (1, 0)]]),
            Err(ProblemError::DurationOverflow)
        ));

        let problem = Problem::new(vec![vec![(0, u32::MAX - 1), (1, 1)]]).unwrap();
        assert_eq!(problem.lower_bound(), u32::MAX);
        let schedule = crate::greedy::construct(&problem, crate::greedy::PriorityRule::EstLrpt).into_schedule(&problem);
        assert!(schedule.is_valid());
        assert_eq!(schedule.makespan(), u32::MAX);
    }
}
