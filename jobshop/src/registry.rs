use thiserror::Error;

use crate::baseline::{BasicSolver, RandomSolver};
use crate::greedy::{GreedySolver, PriorityRule};
use crate::local_search::{Descent, TabuSearch};
use crate::problem::ProblemSolver;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown solver `{name}`, expected one of: {known}")]
    UnknownSolver { name: String, known: String },
}

/// Named solvers, in registration order.
#[derive(Default)]
pub struct SolverRegistry {
    solvers: Vec<(String, Box<dyn ProblemSolver>)>,
}

impl SolverRegistry {
    /// Every built-in solver: the baselines, one greedy constructor and one
    /// descent per priority rule, and tabu search under `taboo`.
    pub fn standard() -> Self {
        let mut registry = SolverRegistry::default();
        registry.insert("basic", BasicSolver);
        registry.insert("random", RandomSolver::default());
        for rule in PriorityRule::ALL {
            registry.insert(rule.to_string(), GreedySolver::new(rule));
        }
        for rule in PriorityRule::ALL {
            registry.insert(format!("{}_descent", rule), Descent::new(rule));
        }
        registry.insert("taboo", TabuSearch::default());
        registry
    }

    /// Registers `solver` under `name`, replacing any solver of the same name.
    pub fn insert<S>(&mut self, name: impl Into<String>, solver: S)
    where
        S: ProblemSolver + 'static,
    {
        let name = name.into();
        let solver: Box<dyn ProblemSolver> = Box::new(solver);
        match self.solvers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = solver,
            None => self.solvers.push((name, solver)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&dyn ProblemSolver, RegistryError> {
        self.solvers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, solver)| &**solver)
            .ok_or_else(|| RegistryError::UnknownSolver {
                name: name.to_owned(),
                known: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.solvers.iter().map(|(name, _)| name.as_str())
    }
}
