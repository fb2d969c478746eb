//! Tabu search over the critical-block neighborhood.
//!
//! Every iteration moves to the best admissible neighbor, even when it is worse
//! than the current solution. Undoing a move is forbidden for `tenure`
//! iterations, which keeps the search from cycling back into the local optimum
//! it just left.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use hashbrown::HashMap;
use tracing::{debug, info, trace};

use super::{evaluate, neighborhood, SearchOutcome};
use crate::greedy::{self, PriorityRule};
use crate::problem::{ExitCause, Problem, ProblemSolver, SolveResult, Task};
use crate::schedule::{ResourceOrder, Schedule};

/// What to do when every neighbor of the current solution is tabu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPolicy {
    /// End the search.
    Stop,
    /// Stay put and let the iteration counter run until a move expires.
    Wait,
}

impl fmt::Display for StallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StallPolicy::Stop => f.write_str("stop"),
            StallPolicy::Wait => f.write_str("wait"),
        }
    }
}

impl FromStr for StallPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stop" => Ok(StallPolicy::Stop),
            "wait" => Ok(StallPolicy::Wait),
            _ => Err(format!("unknown stall policy `{}`", s)),
        }
    }
}

/// Directional task pairs that may not be placed next to each other in that
/// order, keyed to the first iteration at which they are allowed again.
#[derive(Debug, Default)]
struct TabuList {
    expiry: HashMap<(Task, Task), usize>,
}

impl TabuList {
    /// Forbids `first` directly before `second` until iteration `until`.
    fn forbid(&mut self, first: Task, second: Task, until: usize) {
        self.expiry.insert((first, second), until);
    }

    fn is_tabu(&self, first: Task, second: Task, iteration: usize) -> bool {
        self.expiry
            .get(&(first, second))
            .is_some_and(|&until| iteration < until)
    }

    fn forget_expired(&mut self, iteration: usize) {
        self.expiry.retain(|_, until| *until > iteration);
    }

    fn len(&self) -> usize {
        self.expiry.len()
    }
}

#[derive(Debug, Clone)]
pub struct TabuSearch {
    rule: PriorityRule,
    max_iterations: usize,
    tenure: usize,
    stall: StallPolicy,
}

impl Default for TabuSearch {
    fn default() -> Self {
        TabuSearch {
            rule: PriorityRule::EstLrpt,
            max_iterations: 500,
            tenure: 100,
            stall: StallPolicy::Stop,
        }
    }
}

impl TabuSearch {
    pub fn new(max_iterations: usize, tenure: usize) -> Self {
        TabuSearch {
            max_iterations,
            tenure,
            ..TabuSearch::default()
        }
    }

    pub fn with_rule(mut self, rule: PriorityRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tenure(mut self, tenure: usize) -> Self {
        self.tenure = tenure;
        self
    }

    pub fn with_stall_policy(mut self, stall: StallPolicy) -> Self {
        self.stall = stall;
        self
    }

    pub fn rule(&self) -> PriorityRule {
        self.rule
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tenure(&self) -> usize {
        self.tenure
    }

    pub fn stall_policy(&self) -> StallPolicy {
        self.stall
    }

    pub fn search(&self, problem: &Problem, seed: ResourceOrder, deadline: Instant) -> SearchOutcome {
        let mut current = seed.into_schedule(problem);
        let mut best = current.clone();
        let mut best_history = vec![best.makespan()];
        let mut current_history = vec![current.makespan()];
        let mut tabu = TabuList::default();
        let mut iterations = 0;
        let mut exit_cause = ExitCause::Blocked;

        for k in 0..self.max_iterations {
            if Instant::now() >= deadline {
                info!(iterations, makespan = best.makespan(), "tabu search stopped at the deadline");
                exit_cause = ExitCause::Timeout;
                break;
            }
            iterations = k + 1;
            tabu.forget_expired(k);

            let swaps = neighborhood(&current);
            if swaps.is_empty() {
                debug!(iteration = k, "critical path has no blocks");
                break;
            }

            let mut chosen: Option<(Task, Task, Schedule<'_>)> = None;
            for swap in &swaps {
                let (a, b) = swap.tasks(current.order());
                if tabu.is_tabu(a, b, k) {
                    continue;
                }
                let Some(candidate) = evaluate(&current, swap) else {
                    continue;
                };
                // Strict comparison: the first of equally good neighbors wins.
                if chosen
                    .as_ref()
                    .map_or(true, |(_, _, c)| candidate.makespan() < c.makespan())
                {
                    chosen = Some((a, b, candidate));
                }
            }

            match chosen {
                Some((a, b, next)) => {
                    tabu.forbid(b, a, k.saturating_add(self.tenure));
                    current = next;
                    if current.makespan() < best.makespan() {
                        best = current.clone();
                    }
                    trace!(
                        iteration = k,
                        makespan = current.makespan(),
                        best = best.makespan(),
                        tabu = tabu.len(),
                        "tabu move"
                    );
                }
                None if self.stall == StallPolicy::Wait => {
                    trace!(iteration = k, "every neighbor is tabu, waiting");
                }
                None => {
                    debug!(iteration = k, "every neighbor is tabu");
                    break;
                }
            }

            best_history.push(best.makespan());
            current_history.push(current.makespan());
        }

        SearchOutcome {
            makespan: best.makespan(),
            best: best.into_order(),
            best_history,
            current_history,
            iterations,
            exit_cause,
        }
    }
}

impl ProblemSolver for TabuSearch {
    fn solve<'p>(&self, problem: &'p Problem, deadline: Instant) -> SolveResult<'p> {
        let seed = greedy::construct(problem, self.rule);
        let outcome = self.search(problem, seed, deadline);
        debug!(
            rule = %self.rule,
            tenure = self.tenure,
            makespan = outcome.makespan,
            iterations = outcome.iterations,
            exit = %outcome.exit_cause,
            "tabu search done"
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

    fn problem() -> Problem {
        Problem::new(vec![vec![(0, 3), (1, 3), (2, 2)], vec![(1, 2), (0, 2), (2, 4)]]).unwrap()
    }

    fn far() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn tabu_list_expires() {
        let mut tabu = TabuList::default();
        let (a, b) = (Task::new(0, 0), Task::new(1, 1));
        tabu.forbid(b, a, 3);

        assert!(tabu.is_tabu(b, a, 2));
        assert!(!tabu.is_tabu(a, b, 2));
        assert!(!tabu.is_tabu(b, a, 3));

        tabu.forget_expired(3);
        assert_eq!(tabu.len(), 0);
    }

    #[test]
    fn finds_the_optimum_from_a_poor_seed() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::Spt);
        let outcome = TabuSearch::new(50, 5).search(&problem, seed, far());

        assert_eq!(outcome.makespan, 11);
        assert_eq!(outcome.best_history[0], 16);
        assert_eq!(outcome.best.decode(&problem).makespan(), 11);
        assert!(outcome.best_history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(outcome.best_history.len(), outcome.current_history.len());
    }

    #[test]
    fn best_is_kept_while_current_wanders() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::EstLrpt);
        let outcome = TabuSearch::new(20, 10)
            .with_stall_policy(StallPolicy::Wait)
            .search(&problem, seed, far());

        assert_eq!(outcome.makespan, 11);
        assert!(outcome.best_history.iter().all(|m| *m == 11));
        assert!(outcome.current_history.iter().all(|m| *m >= 11));
    }

    #[test]
    fn zero_iterations_return_the_seed() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::Spt);
        let outcome = TabuSearch::new(0, 5).search(&problem, seed.clone(), far());

        assert_eq!(outcome.best, seed);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.exit_cause, ExitCause::Blocked);
    }

    #[test]
    fn passed_deadline_times_out() {
        let problem = problem();
        let result = TabuSearch::default().solve(&problem, Instant::now());

        assert_eq!(result.exit_cause, ExitCause::Timeout);
        assert!(result.schedule.is_valid());
        assert_eq!(result.schedule.makespan(), 11);
    }

    #[test]
    fn unbounded_tenure_forbids_for_good() {
        let problem = problem();
        let seed = greedy::construct(&problem, PriorityRule::Spt);
        let outcome = TabuSearch::new(10, usize::MAX).search(&problem, seed, far());

        assert_eq!(outcome.makespan, 11);
        assert!(outcome.best_history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn stall_policy_names() {
        assert_eq!("Wait".parse::<StallPolicy>(), Ok(StallPolicy::Wait));
        assert_eq!(StallPolicy::Stop.to_string(), "stop");
        assert!("spin".parse::<StallPolicy>().is_err());
    }
}
