use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{arg, value_parser, ArgMatches, Command};
use jobshop::local_search::TabuSearch;
use jobshop::{Problem, SolverRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("jobshop")
        .about("Solves job-shop scheduling instances and compares solvers")
        .arg(
            arg!(--solver <NAME>... "Solver(s) to run on every instance")
                .required(true)
                .value_parser(value_parser!(String)),
        )
        .arg(
            arg!(--instance <PATH>... "Instance file(s) to solve")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-t --timeout [SECONDS] "Time budget per solver and instance")
                .default_value("1")
                .value_parser(value_parser!(u64)),
        )
        .arg(arg!(--tenure [TENURE] "Tabu tenure of the `taboo` solver").value_parser(value_parser!(usize)))
        .arg(
            arg!(--iterations [ITERATIONS] "Iteration budget of the `taboo` solver")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--dot [DIR] "Write the precedence graph of every best schedule to DIR")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn registry(matches: &ArgMatches) -> SolverRegistry {
    let mut registry = SolverRegistry::standard();

    let tenure = matches.get_one::<usize>("tenure").copied();
    let iterations = matches.get_one::<usize>("iterations").copied();
    if tenure.is_some() || iterations.is_some() {
        let mut taboo = TabuSearch::default();
        if let Some(tenure) = tenure {
            taboo = taboo.with_tenure(tenure);
        }
        if let Some(iterations) = iterations {
            taboo = taboo.with_max_iterations(iterations);
        }
        registry.insert("taboo", taboo);
    }

    registry
}

/// Used when the requested timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn deadline(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

fn instance_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_graph(dir: &Path, instance: &str, solver: &str, schedule: &jobshop::Schedule<'_>) -> Result<()> {
    let graph = schedule
        .order()
        .to_graph(schedule.problem())
        .map_err(|e| anyhow!("{}: {}", instance, e))?;
    let path = dir.join(format!("{}_{}.dot", instance, solver));
    let mut file = File::create(&path).with_context(|| format!("could not create {}", path.display()))?;
    disjunctgraph::render(&graph, &mut file).with_context(|| format!("could not write {}", path.display()))?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let registry = registry(matches);
    let timeout = Duration::from_secs(*matches.get_one::<u64>("timeout").unwrap_or(&1));
    let dot_dir = matches.get_one::<PathBuf>("dot");
    if let Some(dir) = dot_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("could not create {}", dir.display()))?;
    }

    let solver_names: Vec<&String> = matches.get_many::<String>("solver").into_iter().flatten().collect();
    let solvers = solver_names
        .iter()
        .map(|name| registry.get(name))
        .collect::<Result<Vec<_>, _>>()?;

    let paths: Vec<&PathBuf> = matches.get_many::<PathBuf>("instance").into_iter().flatten().collect();
    let problems = paths
        .iter()
        .map(|path| Problem::read(path).with_context(|| format!("could not load {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    write!(out, "{:<26}", "")?;
    for name in &solver_names {
        write!(out, "{:<30}", name)?;
    }
    writeln!(out)?;
    write!(out, "{:<8} {:<5} {:>5}      ", "instance", "size", "bound")?;
    for _ in &solver_names {
        write!(out, "runtime makespan   gap        ")?;
    }
    writeln!(out)?;

    let mut runtimes = vec![0.0f64; solvers.len()];
    let mut gaps = vec![0.0f64; solvers.len()];

    for (path, problem) in paths.iter().zip(&problems) {
        let instance = instance_name(path);
        let bound = problem.lower_bound();
        let size = format!("{}x{}", problem.num_jobs(), problem.num_tasks());
        write!(out, "{:<8} {:<5} {:>5}      ", instance, size, bound)?;

        for (index, (name, solver)) in solver_names.iter().zip(&solvers).enumerate() {
            let start = Instant::now();
            let result = solver.solve(problem, deadline(start, timeout));
            let runtime = start.elapsed().as_millis();

            if !result.schedule.is_valid() {
                bail!("solver `{}` returned an invalid schedule for {}", name, instance);
            }
            info!(solver = %name, instance = %instance, exit = %result.exit_cause, "solved");

            let makespan = result.schedule.makespan();
            let gap = 100.0 * (f64::from(makespan) - f64::from(bound)) / f64::from(bound.max(1));
            runtimes[index] += runtime as f64 / problems.len() as f64;
            gaps[index] += gap / problems.len() as f64;

            write!(out, "{:>7} {:>8} {:>5.1}        ", runtime, makespan, gap)?;
            out.flush()?;

            if let Some(dir) = dot_dir {
                write_graph(dir, &instance, name, &result.schedule)?;
            }
        }
        writeln!(out)?;
    }

    write!(out, "{:<8} {:<5} {:>5}      ", "AVG", "-", "-")?;
    for (runtime, gap) in runtimes.iter().zip(&gaps) {
        write!(out, "{:>7.1} {:>8} {:>5.1}        ", runtime, "-", gap)?;
    }
    writeln!(out)?;

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();
    run(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_timeout_does_not_overflow() {
        let start = Instant::now();
        assert!(deadline(start, Duration::from_secs(u64::MAX)) > start);
        assert_eq!(deadline(start, Duration::from_secs(2)), start + Duration::from_secs(2));
    }

    #[test]
    fn timeout_flag_accepts_the_full_range() {
        let matches = cli()
            .try_get_matches_from(["jobshop", "--solver", "SPT", "--instance", "ft06", "-t", "18446744073709551615"])
            .unwrap();
        assert_eq!(matches.get_one::<u64>("timeout"), Some(&u64::MAX));
    }
}
