//! Restricted neighborhood of Nowicki and Smutnicki: only swaps at the borders
//! of critical blocks are considered.

use itertools::Itertools;

use crate::problem::Task;
use crate::schedule::{ResourceOrder, Schedule};

/// A maximal run of at least two consecutive critical tasks on one machine,
/// identified by the positions of its first and last task in that machine's
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub machine: usize,
    pub first: usize,
    pub last: usize,
}

impl Block {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Swaps of the neighborhood: the only pair of a two-task block, otherwise
    /// the first two and the last two tasks.
    pub fn neighbors(&self) -> Vec<Swap> {
        if self.len() == 2 {
            vec![Swap::new(self.machine, self.first, self.last)]
        } else {
            vec![
                Swap::new(self.machine, self.first, self.first + 1),
                Swap::new(self.machine, self.last - 1, self.last),
            ]
        }
    }
}

/// Exchange of the tasks at positions `a` and `b` of one machine. Applying the
/// same swap twice restores the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub machine: usize,
    pub a: usize,
    pub b: usize,
}

impl Swap {
    pub fn new(machine: usize, a: usize, b: usize) -> Self {
        Swap { machine, a, b }
    }

    pub fn apply_on(&self, order: &mut ResourceOrder) {
        order.swap(self.machine, self.a, self.b);
    }

    /// The tasks this swap exchanges in `order`, in position order.
    pub fn tasks(&self, order: &ResourceOrder) -> (Task, Task) {
        let sequence = order.machine(self.machine);
        (sequence[self.a], sequence[self.b])
    }
}

/// Blocks of the critical path of `schedule`, in path order.
pub fn blocks_of_critical_path(schedule: &Schedule<'_>) -> Vec<Block> {
    let problem = schedule.problem();
    let order = schedule.order();

    schedule
        .critical_path()
        .into_iter()
        .chunk_by(|task| problem.machine(*task))
        .into_iter()
        .filter_map(|(machine, run)| {
            let run = run.collect::<Vec<_>>();
            if run.len() < 2 {
                return None;
            }
            let first = order.position(machine, run[0])?;
            let last = order.position(machine, run[run.len() - 1])?;
            Some(Block { machine, first, last })
        })
        .collect()
}

/// Every candidate swap around the critical path of `schedule`.
pub fn neighborhood(schedule: &Schedule<'_>) -> Vec<Swap> {
    blocks_of_critical_path(schedule)
        .iter()
        .flat_map(Block::neighbors)
        .collect()
}
