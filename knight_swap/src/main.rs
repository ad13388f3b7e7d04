//! Knight Swap CLI: parses an instance file, runs the coordinator/worker
//! search protocol, and prints the solution (SPEC_FULL.md §4.9, §6).
//!
//! Grounded on `crates/cli/src/main.rs`'s `clap::Parser` + subcommand-free
//! flat-options shape. The binary re-execs itself (`std::env::current_exe`)
//! to become a worker subprocess, following the child-process pattern
//! `automatch::engine::GtpEngine` uses for an external engine, except the
//! child here is this same binary invoked with `--role worker`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use knight_swap_core::coordinator::{self, worker, CoordinatorConfig};
use knight_swap_core::error::{KnightSwapError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Role {
    Coordinator,
    Worker,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Solves the Knight Swap puzzle via parallel branch-and-bound search"
)]
struct Cli {
    /// Path to the instance file (required unless `--role worker`).
    instance_file: Option<PathBuf>,

    /// Internal: which role this process invocation plays. Set by the
    /// coordinator when it re-execs itself to spawn a worker; never passed
    /// by a human invoking the solver directly.
    #[arg(long, value_enum, default_value_t = Role::Coordinator, hide = true)]
    role: Role,

    /// Internal: index of this worker among its siblings, set by the
    /// coordinator alongside `--role worker`.
    #[arg(long, hide = true)]
    worker_index: Option<usize>,

    /// Number of worker processes to spawn. Omit (or pass 1) to run the
    /// degenerate single-rank coordinator-plus-inline-worker mode.
    #[arg(long)]
    workers: Option<usize>,

    /// Threads per worker's task pool. Defaults to available parallelism.
    #[arg(long)]
    threads_per_worker: Option<usize>,

    /// Minimum root-queue size per worker, as a multiple of `workers`.
    #[arg(long, default_value_t = knight_swap_core::constants::ROOT_SPLIT_FACTOR)]
    root_split_factor: usize,

    /// How many times to double the heuristic ceiling and retry if no
    /// solution is found under it (SPEC_FULL.md §4.3 fallback policy).
    #[arg(long, default_value_t = knight_swap_core::constants::DEFAULT_U0_RETRY_ROUNDS)]
    u0_retry_rounds: u32,

    /// Absolute cap on the retried ceiling. Defaults to `4 * nSquares`.
    #[arg(long)]
    u0_cap: Option<u32>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let threads_per_worker = cli.threads_per_worker.unwrap_or_else(num_cpus::get);
    if threads_per_worker == 0 {
        return Err(KnightSwapError::Config(
            "--threads-per-worker must be at least 1".to_string(),
        ));
    }

    if cli.role == Role::Worker {
        return run_worker(cli.worker_index, threads_per_worker);
    }

    run_coordinator(cli, threads_per_worker)
}

/// Runs as a worker subprocess: the coordinator link is this process's own
/// stdin/stdout, piped from the parent (SPEC_FULL.md §6 "self-exec'd OS
/// subprocesses over piped stdio").
fn run_worker(worker_index: Option<usize>, threads_per_worker: usize) -> Result<()> {
    if let Some(index) = worker_index {
        eprintln!("worker {index} starting with {threads_per_worker} thread(s)");
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    worker::run(stdin.lock(), stdout.lock(), threads_per_worker)
}

fn run_coordinator(cli: Cli, threads_per_worker: usize) -> Result<()> {
    let path = cli.instance_file.ok_or_else(|| {
        KnightSwapError::Config("missing required argument: instance file path".to_string())
    })?;
    if !path.exists() {
        return Err(KnightSwapError::Config(format!(
            "instance file not found: {}",
            path.display()
        )));
    }

    let workers = cli.workers.unwrap_or(1);
    if workers == 0 {
        return Err(KnightSwapError::Config(
            "--workers must be at least 1".to_string(),
        ));
    }

    eprintln!("loading instance from {}", path.display());
    let instance = knight_swap_core::io::read_instance_file(&path)?;
    eprintln!(
        "instance loaded: {}x{} board, k={}",
        instance.n_cols, instance.n_rows, instance.k
    );

    let self_exe = std::env::current_exe().map_err(KnightSwapError::Io)?;
    let u0_cap = cli.u0_cap.unwrap_or(4 * instance.n_squares);

    let config = CoordinatorConfig {
        workers,
        threads_per_worker,
        root_split_factor: cli.root_split_factor.max(1),
        u0_retry_rounds: cli.u0_retry_rounds,
        u0_cap,
        self_exe,
    };

    let solution = coordinator::run(&instance, &config)?;
    eprintln!(
        "search complete: {} move(s), {} iteration(s)",
        solution.moves.len(),
        solution.iterations
    );
    knight_swap_core::io::print_solution(&instance, &solution.moves, solution.iterations);
    Ok(())
}
