//! Scenario tests on known instances.


use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::problem::Problem;
use crate::schedule::ResourceOrder;

/// Fisher and Thompson's 6x6 instance, optimum 55.
pub const FT06: &str = "\
# ft06
6 6
2 1 0 3 1 6 3 7 5 3 4 6
1 8 2 5 4 10 5 10 0 10 3 4
2 5 3 4 5 8 0 9 1 1 4 7
1 5 0 5 2 5 3 3 4 8 5 9
2 9 1 3 4 5 5 4 0 3 3 1
1 3 3 3 5 9 0 10 4 4 2 1
";

/// Two jobs on three machines, optimum 11.
pub const AAA1: &str = "\
2 3
0 3 1 3 2 2
1 2 0 2 2 4
";

pub fn ft06() -> Problem {
    Problem::from_reader(FT06.as_bytes()).unwrap()
}

pub fn aaa1() -> Problem {
    Problem::from_reader(AAA1.as_bytes()).unwrap()
}

/// Uniformly shuffled job-number encoding of `problem`.
pub fn random_order(problem: &Problem, rng: &mut StdRng) -> ResourceOrder {
    let mut jobs = (0..problem.num_operations())
        .map(|i| i % problem.num_jobs())
        .collect::<Vec<_>>();
    jobs.shuffle(rng);
    ResourceOrder::from_job_numbers(problem, &jobs).unwrap()
}
