//! List-scheduling constructor.
//!
//! Every job exposes one ready task (initially its first). At each step one
//! ready task is picked by a [`PriorityRule`], appended to its machine, and
//! replaced by the next task of its job. The four rules share one selection
//! routine and differ only in the pair of keys they rank by.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::debug;

use crate::problem::{ExitCause, Problem, ProblemSolver, SolveResult, Task};
use crate::schedule::ResourceOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityRule {
    /// Shortest processing time.
    Spt,
    /// Longest remaining processing time of the owning job.
    Lrpt,
    /// Earliest start, ties broken by shortest processing time.
    EstSpt,
    /// Earliest start, ties broken by longest remaining processing time.
    EstLrpt,
}

impl PriorityRule {
    pub const ALL: [PriorityRule; 4] = [
        PriorityRule::Spt,
        PriorityRule::Lrpt,
        PriorityRule::EstSpt,
        PriorityRule::EstLrpt,
    ];

    /// Primary and secondary key; the candidate minimizing both, in that
    /// order, is selected.
    fn keys(self) -> (Key, Key) {
        match self {
            PriorityRule::Spt => (shortest_processing_time, indifferent),
            PriorityRule::Lrpt => (longest_remaining_time, indifferent),
            PriorityRule::EstSpt => (earliest_start, shortest_processing_time),
            PriorityRule::EstLrpt => (earliest_start, longest_remaining_time),
        }
    }
}

impl fmt::Display for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityRule::Spt => "SPT",
            PriorityRule::Lrpt => "LRPT",
            PriorityRule::EstSpt => "EST_SPT",
            PriorityRule::EstLrpt => "EST_LRPT",
        };
        f.write_str(name)
    }
}

impl FromStr for PriorityRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriorityRule::ALL
            .into_iter()
            .find(|rule| rule.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown priority rule `{}`", s))
    }
}

/// What a rule may look at when ranking a ready task.
struct Candidate {
    duration: u32,
    remaining: u32,
    earliest_start: u32,
}

type Key = fn(&Candidate) -> i64;

fn shortest_processing_time(c: &Candidate) -> i64 {
    i64::from(c.duration)
}

fn longest_remaining_time(c: &Candidate) -> i64 {
    -i64::from(c.remaining)
}

fn earliest_start(c: &Candidate) -> i64 {
    i64::from(c.earliest_start)
}

fn indifferent(_: &Candidate) -> i64 {
    0
}

/// Builds a resource order for `problem` by list scheduling under `rule`.
pub fn construct(problem: &Problem, rule: PriorityRule) -> ResourceOrder {
    let (primary, secondary) = rule.keys();

    let mut order = ResourceOrder::new(problem);
    let mut ready: Vec<Task> = (0..problem.num_jobs()).map(|job| Task::new(job, 0)).collect();
    let mut remaining: Vec<u32> = (0..problem.num_jobs()).map(|job| problem.job_duration(job)).collect();
    let mut job_available = vec![0u32; problem.num_jobs()];
    let mut machine_free = vec![0u32; problem.num_machines()];

    while !ready.is_empty() {
        let candidates = ready.iter().map(|task| Candidate {
            duration: problem.duration(*task),
            remaining: remaining[task.job],
            earliest_start: job_available[task.job].max(machine_free[problem.machine(*task)]),
        });

        // `min_by_key` keeps the first of equal elements, i.e. ready-list order.
        let Some((index, chosen)) = candidates
            .enumerate()
            .min_by_key(|(_, c)| (primary(c), secondary(c)))
        else {
            break;
        };

        let task = ready.remove(index);
        let end = chosen.earliest_start + chosen.duration;
        order.push(problem, task);
        machine_free[problem.machine(task)] = end;
        job_available[task.job] = end;
        remaining[task.job] -= chosen.duration;

        if task.task + 1 < problem.num_tasks() {
            ready.push(Task::new(task.job, task.task + 1));
        }
    }

    order
}

#[derive(Debug, Clone, Copy)]
pub struct GreedySolver {
    rule: PriorityRule,
}

impl GreedySolver {
    pub fn new(rule: PriorityRule) -> Self {
        GreedySolver { rule }
    }
}

impl ProblemSolver for GreedySolver {
    fn solve<'p>(&self, problem: &'p Problem, _deadline: Instant) -> SolveResult<'p> {
        let schedule = construct(problem, self.rule).into_schedule(problem);
        debug!(rule = %self.rule, makespan = schedule.makespan(), "greedy construction done");
        SolveResult { schedule, exit_cause: ExitCause::Blocked }
    }
}
