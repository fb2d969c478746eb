use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::greedy::{self, PriorityRule};
use crate::problem::{ExitCause, Problem, ProblemSolver, SolveResult};
use crate::schedule::{ResourceOrder, Schedule};

pub mod neighborhood;
pub mod tabu;

pub use neighborhood::{blocks_of_critical_path, neighborhood, Block, Swap};
pub use tabu::{StallPolicy, TabuSearch};

/// Result of a local search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best order found.
    pub best: ResourceOrder,
    pub makespan: u32,
    /// Best makespan known after each iteration, starting with the seed.
    pub best_history: Vec<u32>,
    /// Makespan of the working solution after each iteration, starting with the seed.
    pub current_history: Vec<u32>,
    pub iterations: usize,
    pub exit_cause: ExitCause,
}

/// Applies `swap` to a copy of the order behind `schedule` and decodes it.
/// Returns `None` if the copy does not decode into a valid schedule.
pub(crate) fn evaluate<'p>(schedule: &Schedule<'p>, swap: &Swap) -> Option<Schedule<'p>> {
    let mut order = schedule.order().clone();
    swap.apply_on(&mut order);
    let candidate = order.into_schedule(schedule.problem());
    if !candidate.is_valid() {
        warn!(?swap, "swap produced an invalid schedule");
        return None;
    }
    Some(candidate)
}

/// First-improvement descent over the critical-block neighborhood, seeded with
/// a greedy construction. Moves to the first candidate strictly better than
/// the current solution and stops as soon as a full scan finds none.
#[derive(Debug, Clone, Copy)]
pub struct Descent {
    rule: PriorityRule,
}

impl Default for Descent {
    fn default() -> Self {
        Descent { rule: PriorityRule::EstLrpt }
    }
}

impl Descent {
    pub fn new(rule: PriorityRule) -> Self {
        Descent { rule }
    }

    pub fn search(&self, problem: &Problem, seed: ResourceOrder, deadline: Instant) -> SearchOutcome {
        let mut current = seed.into_schedule(problem);
        let mut history = vec![current.makespan()];
        let mut iterations = 0;

        let exit_cause = loop {
            if Instant::now() >= deadline {
                info!(iterations, makespan = current.makespan(), "descent stopped at the deadline");
                break ExitCause::Timeout;
            }
            iterations += 1;

            let improvement = neighborhood(&current)
                .iter()
                .filter_map(|swap| evaluate(&current, swap))
                .find(|candidate| candidate.makespan() < current.makespan());

            match improvement {
                Some(next) => {
                    trace!(iteration = iterations, makespan = next.makespan(), "descent improved");
                    current = next;
                    history.push(current.makespan());
                }
                None => break ExitCause::Blocked,
            }
        };

        SearchOutcome {
            makespan: current.makespan(),
            best: current.into_order(),
            current_history: history.clone(),
            best_history: history,
            iterations,
            exit_cause,
        }
    }
}

impl ProblemSolver for Descent {
    fn solve<'p>(&self, problem: &'p Problem, deadline: Instant) -> SolveResult<'p> {
        let seed = greedy::construct(problem, self.rule);
        let outcome = self.search(problem, seed, deadline);
        debug!(
            rule = %self.rule,
            makespan = outcome.makespan,
            iterations = outcome.iterations,
            exit = %outcome.exit_cause,
            "descent done"
        );
        SolveResult {
            schedule: outcome.best.into_schedule(problem),
            exit_cause: outcome.exit_cause,
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
    fn descends_to_the_optimum() {
        let problem = problem();
        let seed = ResourceOrder::from_machines(vec![
            vec![Task::new(1, 1), Task::new(0, 0)],
            vec![Task::new(1, 0), Task::new(0, 1)],
            vec![Task::new(0, 2), Task::new(1, 2)],
        ]);
        let outcome = Descent::default().search(&problem, seed, far());

        assert_eq!(outcome.best_history, vec![16, 12, 11]);
        assert_eq!(outcome.makespan, 11);
        assert_eq!(outcome.best.decode(&problem).makespan(), 11);
        assert_eq!(outcome.exit_cause, ExitCause::Blocked);
        assert_eq!(outcome.iterations, 3);
    }

    #[test]
    fn local_optimum_is_kept() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::EstLrpt);
        let outcome = Descent::default().search(&problem, seed.clone(), far());

        assert_eq!(outcome.best, seed);
        assert_eq!(outcome.best_history, vec![11]);
    }

    #[test]
    fn passed_deadline_returns_the_seed() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::Spt);
        let outcome = Descent::new(PriorityRule::Spt).search(&problem, seed.clone(), Instant::now());

        assert_eq!(outcome.exit_cause, ExitCause::Timeout);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best, seed);
    }

    #[test]
    fn solver_reports_a_valid_schedule() {
        let problem = problem();
        let result = Descent::new(PriorityRule::Spt).solve(&problem, far());

        assert!(result.schedule.is_valid());
        assert_eq!(result.schedule.makespan(), 11);
        assert_eq!(result.exit_cause, ExitCause::Blocked);
    }
}
