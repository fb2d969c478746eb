//! Reference solvers that ignore durations: a fixed round robin over the jobs
//! and random job-number sequences.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::problem::{ExitCause, Problem, ProblemSolver, SolveResult};
use crate::schedule::{ResourceOrder, Schedule};

/// Job-number sequence visiting the jobs in turn: `0, 1, .., J-1, 0, 1, ..`.
fn round_robin(problem: &Problem) -> Vec<usize> {
    (0..problem.num_tasks())
        .flat_map(|_| 0..problem.num_jobs())
        .collect()
}

fn decode_job_numbers<'p>(problem: &'p Problem, jobs: &[usize]) -> Schedule<'p> {
    // A permutation of the round robin always holds each job `num_tasks` times.
    ResourceOrder::from_job_numbers(problem, jobs)
        .unwrap_or_else(|| ResourceOrder::new(problem))
        .into_schedule(problem)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSolver;

impl ProblemSolver for BasicSolver {
    fn solve<'p>(&self, problem: &'p Problem, _deadline: Instant) -> SolveResult<'p> {
        let schedule = decode_job_numbers(problem, &round_robin(problem));
        debug!(makespan = schedule.makespan(), "round robin done");
        SolveResult { schedule, exit_cause: ExitCause::Blocked }
    }
}

/// Keeps the best of `max_draws` shuffled job-number sequences.
#[derive(Debug, Clone)]
pub struct RandomSolver {
    max_draws: usize,
    seed: Option<u64>,
}

impl Default for RandomSolver {
    fn default() -> Self {
        RandomSolver { max_draws: 10_000, seed: None }
    }
}

impl RandomSolver {
    pub fn with_max_draws(mut self, max_draws: usize) -> Self {
        self.max_draws = max_draws;
        self
    }

    /// Makes the draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn draw<'p, R: Rng>(&self, problem: &'p Problem, rng: &mut R, deadline: Instant) -> SolveResult<'p> {
        let mut jobs = round_robin(problem);
        let mut best = decode_job_numbers(problem, &jobs);

        for draw in 0..self.max_draws {
            if Instant::now() >= deadline {
                info!(draw, makespan = best.makespan(), "random draws stopped at the deadline");
                return SolveResult { schedule: best, exit_cause: ExitCause::Timeout };
            }
            jobs.shuffle(rng);
            let candidate = decode_job_numbers(problem, &jobs);
            if candidate.makespan() < best.makespan() {
                best = candidate;
            }
        }

        debug!(draws = self.max_draws, makespan = best.makespan(), "random draws done");
        SolveResult { schedule: best, exit_cause: ExitCause::Blocked }
    }
}

impl ProblemSolver for RandomSolver {
    fn solve<'p>(&self, problem: &'p Problem, deadline: Instant) -> SolveResult<'p> {
        match self.seed {
            Some(seed) => self.draw(problem, &mut StdRng::seed_from_u64(seed), deadline),
            None => self.draw(problem, &mut rand::thread_rng(), deadline),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::problem::Task;

    fn problem() -> Problem {
        Problem::new(vec![vec![(0, 3), (1, 3), (2, 2)], vec![(1, 2), (0, 2), (2, 4)]]).unwrap()
    }

    fn far() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn round_robin_alternates_jobs() {
        let problem = problem();
        assert_eq!(round_robin(&problem), vec![0, 1, 0, 1, 0, 1]);

        let result = BasicSolver.solve(&problem, far());
        let order = result.schedule.order();
        assert_eq!(order.machine(0), &[Task::new(0, 0), Task::new(1, 1)]);
        assert_eq!(order.machine(2), &[Task::new(0, 2), Task::new(1, 2)]);
        assert!(result.schedule.is_valid());
        assert_eq!(result.exit_cause, ExitCause::Blocked);
    }

    #[test]
    fn random_draws_never_beat_the_lower_bound() {
        let problem = problem();
        let basic = BasicSolver.solve(&problem, far()).schedule.makespan();
        let result = RandomSolver::default().with_max_draws(200).with_seed(7).solve(&problem, far());

        assert!(result.schedule.is_valid());
        assert!(result.schedule.makespan() >= problem.lower_bound());
        assert!(result.schedule.makespan() <= basic);
        assert_eq!(result.exit_cause, ExitCause::Blocked);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let problem = problem();
        let solver = RandomSolver::default().with_max_draws(20).with_seed(42);
        let first = solver.solve(&problem, far()).schedule.into_order();
        let second = solver.solve(&problem, far()).schedule.into_order();
        assert_eq!(first, second);
    }

    #[test]
    fn random_draws_stop_at_the_deadline() {
        let problem = problem();
        let result = RandomSolver::default().solve(&problem, Instant::now());
        assert_eq!(result.exit_cause, ExitCause::Timeout);
        assert!(result.schedule.is_valid());
    }
}
