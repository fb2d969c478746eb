pub mod baseline;
pub mod greedy;
pub mod local_search;
pub mod problem;
pub mod registry;
pub mod schedule;

pub use greedy::PriorityRule;
pub use problem::{ExitCause, Problem, ProblemError, ProblemSolver, SolveResult, Task};
pub use registry::{RegistryError, SolverRegistry};
pub use schedule::{ResourceOrder, Schedule};

#[cfg(test)]
mod tests;
