//! Coordinator process: distributes sub-problem roots to worker subprocesses,
//! rebroadcasts the shrinking global upper bound, and detects termination
//! (SPEC_FULL.md §4.7/§4.8).
//!
//! Grounded on `automatch::engine::GtpEngine`'s piped-subprocess pattern,
//! generalized from line-oriented GTP text to the length-prefixed binary
//! frames of [`crate::protocol`]. One reader thread per worker forwards
//! decoded messages onto a single shared channel tagged with the worker's
//! index, so the coordinator's main loop can poll every worker without
//! blocking on any single one (SPEC_FULL.md §5 suspension points).

pub mod worker;

use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::board_state::{BoardState, Move};
use crate::error::{KnightSwapError, Result};
use crate::instance::Instance;
use crate::protocol::{self, AssignMeta, SolutionReport, Tag};
use crate::search::bound::initial_upper_bound;
use crate::search::global_state::GlobalState;
use crate::search::root_splitter::split_roots;
use crate::search::SearchWorker;
use crate::types::Dist;

/// How often the main loop polls for incoming messages before sleeping again
/// (SPEC_FULL.md §4.7 step 5, §5 "bounded sleep").
const POLL_SLEEP: Duration = Duration::from_millis(5);

/// Tuning knobs for the coordinator, all exposed on the CLI (SPEC_FULL.md §4.9).
pub struct CoordinatorConfig {
    /// Number of worker processes to spawn. `<= 1` runs the degenerate
    /// coordinator-plus-inline-worker mode (SPEC_FULL.md §6) with no
    /// subprocesses at all.
    pub workers: usize,
    pub threads_per_worker: usize,
    pub root_split_factor: usize,
    pub u0_retry_rounds: u32,
    pub u0_cap: Dist,
    /// Path to this binary, used to re-exec itself as a worker.
    pub self_exe: PathBuf,
}

/// Final result handed back to the CLI for printing.
pub struct Solution {
    pub moves: Vec<Move>,
    pub iterations: u64,
}

/// Runs the full coordinator protocol against `instance` and returns the
/// best solution found, applying the `U0` fallback policy (SPEC_FULL.md
/// §4.3) if no solution is found under the heuristic ceiling.
pub fn run(instance: &Instance, config: &CoordinatorConfig) -> Result<Solution> {
    let root_state = BoardState::initial(instance);
    let init_lower_bound = root_state.lower_bound;
    let mut ceiling = initial_upper_bound(instance, &root_state);

    let mut rounds_tried = 0u32;
    loop {
        let outcome = run_one_round(instance, &root_state, init_lower_bound, ceiling, config)?;
        if !outcome.moves.is_empty() || rounds_tried >= config.u0_retry_rounds {
            return Ok(outcome);
        }

        rounds_tried += 1;
        let doubled = ceiling.saturating_mul(2).max(ceiling + 1);
        if doubled > config.u0_cap {
            return Ok(outcome);
        }
        eprintln!(
            "no solution found under ceiling {ceiling}; retrying with doubled ceiling {doubled} \
             (round {rounds_tried}/{})",
            config.u0_retry_rounds
        );
        ceiling = doubled;
    }
}

/// Runs a single coordinator pass at a fixed `ceiling`, either inline
/// (degenerate single-rank mode) or across `config.workers` subprocesses.
fn run_one_round(
    instance: &Instance,
    root_state: &BoardState,
    init_lower_bound: Dist,
    ceiling: Dist,
    config: &CoordinatorConfig,
) -> Result<Solution> {
    if config.workers <= 1 {
        eprintln!("running single-rank (coordinator-plus-inline-worker) search, ceiling={ceiling}");
        let worker = SearchWorker::new(config.threads_per_worker);
        let outcome = worker.run(instance, root_state.clone(), 0, ceiling);
        return Ok(Solution {
            moves: outcome.best,
            iterations: outcome.iterations,
        });
    }

    run_multi_process(instance, root_state, init_lower_bound, ceiling, config)
}

struct WorkerLink {
    child: Child,
    stdin: ChildStdin,
    busy: bool,
}

enum FromWorker {
    UpperBoundUpdate(u32),
    SolutionReport(SolutionReport),
    Disconnected,
}

fn run_multi_process(
    instance: &Instance,
    root_state: &BoardState,
    init_lower_bound: Dist,
    ceiling: Dist,
    config: &CoordinatorConfig,
) -> Result<Solution> {
    let global = GlobalState::new(ceiling, init_lower_bound);

    eprintln!("splitting root into sub-problems for {} workers", config.workers);
    let min_roots = config.workers * config.root_split_factor;
    let mut roots = split_roots(
        instance,
        root_state.clone(),
        0,
        &global,
        min_roots,
    )
    .into_iter();
    eprintln!("root queue built, dispatching to workers");

    let (tx, rx) = mpsc::channel::<(usize, FromWorker)>();
    let mut links = Vec::with_capacity(config.workers);
    for worker_index in 0..config.workers {
        links.push(spawn_worker(config, worker_index, &tx)?);
    }

    for link in &mut links {
        protocol::write_instance(&mut link.stdin, instance).map_err(KnightSwapError::Io)?;
    }

    let mut iterations_total = 0u64;

    for link in links.iter_mut() {
        match roots.next() {
            Some(root) => {
                dispatch(link, &root.state, root.step, ceiling, init_lower_bound)?;
            }
            None => {
                protocol::write_terminate(&mut link.stdin).map_err(KnightSwapError::Io)?;
                link.busy = false;
            }
        }
    }

    while links.iter().any(|l| l.busy) {
        match rx.recv_timeout(POLL_SLEEP) {
            Ok((worker_index, FromWorker::UpperBoundUpdate(new_upper))) => {
                if new_upper < global.upper_bound() {
                    global.try_tighten_upper_bound(new_upper);
                    for (i, link) in links.iter_mut().enumerate() {
                        if i != worker_index && link.busy {
                            let _ = protocol::write_upper_bound_update(&mut link.stdin, new_upper);
                        }
                    }
                }
            }
            Ok((worker_index, FromWorker::SolutionReport(report))) => {
                iterations_total += report.iteration_count;
                let current_upper = global.upper_bound();
                if !report.moves.is_empty() && report.moves.len() as Dist <= current_upper {
                    global.try_adopt_solution(&report.moves);
                }

                let link = &mut links[worker_index];
                match roots.next() {
                    Some(root) => {
                        dispatch(link, &root.state, root.step, global.upper_bound(), init_lower_bound)?;
                    }
                    None => {
                        protocol::write_terminate(&mut link.stdin).map_err(KnightSwapError::Io)?;
                        link.busy = false;
                    }
                }
            }
            Ok((worker_index, FromWorker::Disconnected)) => {
                return Err(KnightSwapError::Communication(format!(
                    "worker {worker_index} exited unexpectedly"
                )));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for link in &mut links {
        let _ = link.child.wait();
    }

    Ok(Solution {
        moves: global.best_solution(),
        iterations: iterations_total,
    })
}

fn dispatch(
    link: &mut WorkerLink,
    state: &BoardState,
    step: crate::types::Step,
    upper_bound: Dist,
    init_lower_bound: Dist,
) -> Result<()> {
    protocol::write_board_state(&mut link.stdin, Tag::AssignRoot, state).map_err(KnightSwapError::Io)?;
    protocol::write_assign_meta(
        &mut link.stdin,
        &AssignMeta {
            init_lower_bound,
            upper_bound,
            step,
        },
    )
    .map_err(KnightSwapError::Io)?;
    link.busy = true;
    Ok(())
}

fn spawn_worker(
    config: &CoordinatorConfig,
    worker_index: usize,
    tx: &mpsc::Sender<(usize, FromWorker)>,
) -> Result<WorkerLink> {
    let mut child = Command::new(&config.self_exe)
        .arg("--role")
        .arg("worker")
        .arg("--worker-index")
        .arg(worker_index.to_string())
        .arg("--threads-per-worker")
        .arg(config.threads_per_worker.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(KnightSwapError::Io)?;

    let stdin = child.stdin.take().ok_or_else(|| {
        KnightSwapError::Communication(format!("worker {worker_index} has no stdin pipe"))
    })?;
    let stdout = child.stdout.take().ok_or_else(|| {
        KnightSwapError::Communication(format!("worker {worker_index} has no stdout pipe"))
    })?;

    let tx = tx.clone();
    thread::spawn(move || reader_loop(worker_index, BufReader::new(stdout), tx));

    Ok(WorkerLink {
        child,
        stdin,
        busy: false,
    })
}

fn reader_loop<R: std::io::Read>(worker_index: usize, mut reader: R, tx: mpsc::Sender<(usize, FromWorker)>) {
    loop {
        let tag = match protocol::read_tag(&mut reader) {
            Ok(t) => t,
            Err(_) => {
                let _ = tx.send((worker_index, FromWorker::Disconnected));
                return;
            }
        };

        let message = match tag {
            Tag::UpperBoundUpdate => match protocol::read_upper_bound_update(&mut reader) {
                Ok(v) => FromWorker::UpperBoundUpdate(v),
                Err(_) => {
                    let _ = tx.send((worker_index, FromWorker::Disconnected));
                    return;
                }
            },
            Tag::SolutionReport => match protocol::read_solution_report(&mut reader) {
                Ok(r) => FromWorker::SolutionReport(r),
                Err(_) => {
                    let _ = tx.send((worker_index, FromWorker::Disconnected));
                    return;
                }
            },
            _ => continue,
        };

        if tx.send((worker_index, message)).is_err() {
            return;
        }
    }
}
