//! Worker process entry point: the "Worker protocol" and state machine of
//! SPEC_FULL.md §4.7/§4.8.
//!
//! A dedicated reader thread owns the inbound byte stream and forwards
//! decoded messages over an `mpsc` channel, so the main control thread can
//! `try_recv` for `UpperBoundUpdate`s without blocking while a search is in
//! flight, and `recv` (blocking) while idle between assignments.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::board_state::BoardState;
use crate::error::{KnightSwapError, Result};
use crate::instance::Instance;
use crate::protocol::{self, AssignMeta, InstanceBlob, SolutionReport, Tag};
use crate::search::global_state::GlobalState;
use crate::search::SearchWorker;

/// How often the designated polling thread checks for an incoming
/// `UpperBoundUpdate`, and for outgoing bound improvements to report,
/// while a search is in flight (SPEC_FULL.md §4.7 steps 3-4).
const POLL_INTERVAL: Duration = Duration::from_millis(10);

enum Inbound {
    AssignRoot {
        state: BoardState,
        meta: AssignMeta,
    },
    UpperBoundUpdate(u32),
    Terminate,
}

/// Runs the worker state machine: `Idle -> Receiving -> Searching ->
/// Reporting -> Idle | Terminated` (SPEC_FULL.md §4.8).
///
/// `input`/`output` stand in for the worker's side of the coordinator link;
/// in the spawned-subprocess topology these are the child process's stdin
/// and stdout, piped by the coordinator.
pub fn run<R: Read + Send + 'static, W: Write>(
    mut input: R,
    mut output: W,
    threads_per_worker: usize,
) -> Result<()> {
    let instance = receive_instance(&mut input)?;
    let search_worker = SearchWorker::new(threads_per_worker);

    let (tx, rx) = mpsc::channel::<Inbound>();
    let reader_handle = thread::spawn(move || reader_loop(input, tx));

    loop {
        let message = rx
            .recv()
            .map_err(|_| KnightSwapError::Communication("coordinator link closed".to_string()))?;

        match message {
            Inbound::Terminate => break,
            Inbound::UpperBoundUpdate(_) => {
                // Arrives while idle only if the coordinator races a broadcast
                // against this worker's own assignment completion; harmless
                // to discard since the next AssignMeta carries a fresh bound.
                continue;
            }
            Inbound::AssignRoot { state, meta } => {
                let (report, coordinator_gone) =
                    run_one_assignment(&instance, &search_worker, state, meta, &mut output, &rx)?;
                protocol::write_solution_report(&mut output, &report).map_err(KnightSwapError::Io)?;
                if coordinator_gone {
                    break;
                }
            }
        }
    }

    drop(rx);
    let _ = reader_handle.join();
    Ok(())
}

fn receive_instance<R: Read>(input: &mut R) -> Result<Instance> {
    let tag = protocol::read_tag(input).map_err(KnightSwapError::Io)?;
    if tag != Tag::InstanceBlob {
        return Err(KnightSwapError::Communication(
            "expected InstanceBlob as the first message".to_string(),
        ));
    }
    let InstanceBlob {
        n_squares,
        k,
        moves,
        square_type,
        dist_to_white,
        dist_to_black,
    } = protocol::read_instance_blob(input).map_err(KnightSwapError::Io)?;

    // The wire format carries only the flattened `n_squares`, not the
    // original (n_cols, n_rows) shape: nothing past instance construction
    // ever needs the 2D layout again, only per-square tables indexed 0..n.
    // A degenerate 1-row shape keeps `Instance::from_tables`'s
    // `n_squares = n_cols * n_rows` invariant intact.
    Ok(Instance::from_tables(
        n_squares as u32,
        1,
        k as u32,
        square_type,
        moves,
        dist_to_black,
        dist_to_white,
    ))
}

/// Reads messages off `input` until EOF or a framing error, forwarding each
/// to the control thread. Runs for the lifetime of the worker process.
fn reader_loop<R: Read>(mut input: R, tx: mpsc::Sender<Inbound>) {
    loop {
        let tag = match protocol::read_tag(&mut input) {
            Ok(tag) => tag,
            Err(_) => return,
        };

        let message = match tag {
            Tag::Terminate => Inbound::Terminate,
            Tag::UpperBoundUpdate => match protocol::read_upper_bound_update(&mut input) {
                Ok(v) => Inbound::UpperBoundUpdate(v),
                Err(_) => return,
            },
            Tag::AssignRoot => {
                let blob = match protocol::read_board_state_blob(&mut input) {
                    Ok(b) => b,
                    Err(_) => return,
                };
                let meta_tag = match protocol::read_tag(&mut input) {
                    Ok(t) => t,
                    Err(_) => return,
                };
                if meta_tag != Tag::AssignMeta {
                    return;
                }
                let meta = match protocol::read_assign_meta(&mut input) {
                    Ok(m) => m,
                    Err(_) => return,
                };
                let state = BoardState::from_parts(
                    blob.whites_left,
                    blob.blacks_left,
                    &blob.whites,
                    &blob.blacks,
                    &blob.occupied,
                    blob.lower_bound,
                    blob.moves,
                );
                Inbound::AssignRoot { state, meta }
            }
            other => {
                let _ = other;
                continue;
            }
        };

        let is_terminate = matches!(message, Inbound::Terminate);
        if tx.send(message).is_err() || is_terminate {
            return;
        }
    }
}

/// Runs one assignment to completion, draining inbound `UpperBoundUpdate`s
/// into the shared [`GlobalState`] and emitting outbound ones whenever the
/// search's own bound tightens (SPEC_FULL.md §4.7 steps 2-4).
fn run_one_assignment<W: Write>(
    instance: &Instance,
    search_worker: &SearchWorker,
    state: BoardState,
    meta: AssignMeta,
    output: &mut W,
    rx: &Receiver<Inbound>,
) -> Result<(SolutionReport, bool)> {
    let global = Arc::new(GlobalState::new(meta.upper_bound, meta.init_lower_bound));
    let done = Arc::new(AtomicBool::new(false));
    let last_reported = Arc::new(AtomicU32::new(meta.upper_bound));

    let search_done = done.clone();
    let search_instance = instance as *const Instance as usize;
    let search_global = global.clone();
    let search_state = state;
    let search_step = meta.step;
    let worker_threads = search_worker.n_threads();

    let search_handle = thread::spawn(move || {
        // SAFETY: `instance` is owned by `run`'s caller for the lifetime of
        // the whole worker process, which outlives this assignment.
        let instance = unsafe { &*(search_instance as *const Instance) };
        let worker = SearchWorker::new(worker_threads);
        let outcome = worker.run_with_shared_state(instance, search_state, search_step, search_global);
        search_done.store(true, Ordering::Release);
        outcome
    });

    // Set once a `Terminate` arrives while this assignment is still running:
    // the search is left to finish and report as usual, but the caller's
    // main loop is told not to `recv` again afterward (the reader thread
    // will have already exited, so a further `recv` would hang).
    let mut coordinator_terminated = false;

    while !done.load(Ordering::Acquire) {
        match rx.try_recv() {
            Ok(Inbound::UpperBoundUpdate(new_upper)) => {
                global.try_tighten_upper_bound(new_upper);
            }
            Ok(Inbound::Terminate) => {
                coordinator_terminated = true;
            }
            Err(TryRecvError::Disconnected) => {
                coordinator_terminated = true;
            }
            Ok(Inbound::AssignRoot { .. }) => {
                // The coordinator protocol never double-assigns a busy
                // worker; ignore defensively rather than panic.
            }
            Err(TryRecvError::Empty) => {}
        }

        let current_upper = global.upper_bound();
        if current_upper < last_reported.load(Ordering::Relaxed) {
            last_reported.store(current_upper, Ordering::Relaxed);
            let _ = protocol::write_upper_bound_update(output, current_upper);
        }

        thread::sleep(POLL_INTERVAL);
    }

    let outcome = search_handle
        .join()
        .map_err(|_| KnightSwapError::Communication("search thread panicked".to_string()))?;

    Ok((
        SolutionReport {
            moves: outcome.best,
            iteration_count: outcome.iterations,
        },
        coordinator_terminated,
    ))
}
