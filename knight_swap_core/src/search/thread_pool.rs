//! Cooperative work-stealing task pool for parallel search within one worker.
//!
//! Grounded in spirit on the teacher's `search/threading.rs` (`Arc<ThreadPool>`,
//! an idle-thread loop, a `Condvar`-based park/unpark), but simplified: rather
//! than the teacher's per-split-point helper assignment, every thread pulls
//! from a single shared job queue. A thread that is waiting on a group of
//! child tasks it spawned helps drain that same queue instead of blocking,
//! so the pool never deadlocks even when fully saturated.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    queue: Mutex<VecDeque<Job>>,
    queue_non_empty: Condvar,
    shutdown: AtomicBool,
}

/// A pool of worker threads sharing a single job queue.
pub struct ThreadPool {
    inner: Arc<Inner>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    n_threads: usize,
}

impl ThreadPool {
    /// Spawns `n_threads` worker threads, each running [`Inner::idle_loop`].
    pub fn new(n_threads: usize) -> Arc<ThreadPool> {
        let n_threads = n_threads.max(1);
        let inner = Arc::new(Inner {
            queue: Mutex::new(VecDeque::new()),
            queue_non_empty: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let mut handles = Vec::with_capacity(n_threads);
        for _ in 0..n_threads {
            let inner = inner.clone();
            handles.push(std::thread::spawn(move || inner.idle_loop()));
        }

        Arc::new(ThreadPool {
            inner,
            handles: Mutex::new(handles),
            n_threads,
        })
    }

    #[inline]
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Pushes `job` onto the shared queue and wakes one idle thread.
    fn push(&self, job: Job) {
        self.inner.queue.lock().unwrap().push_back(job);
        self.inner.queue_non_empty.notify_one();
    }

    /// Runs `jobs` to completion, splitting work across the pool.
    ///
    /// The calling thread blocks until every job has run, draining the
    /// shared queue itself while it waits so forward progress never depends
    /// on a dedicated idle worker being available.
    pub fn run_and_wait(&self, jobs: Vec<Job>) {
        if jobs.is_empty() {
            return;
        }

        let remaining = Arc::new(AtomicUsize::new(jobs.len()));
        let done = Arc::new((Mutex::new(false), Condvar::new()));

        for job in jobs {
            let remaining = remaining.clone();
            let done = done.clone();
            self.push(Box::new(move || {
                job();
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let (lock, cvar) = &*done;
                    *lock.lock().unwrap() = true;
                    cvar.notify_all();
                }
            }));
        }

        let (lock, cvar) = &*done;
        let mut finished = lock.lock().unwrap();
        while !*finished {
            // Help drain the shared queue instead of idling.
            let maybe_job = {
                let mut queue = self.inner.queue.lock().unwrap();
                queue.pop_front()
            };
            match maybe_job {
                Some(job) => {
                    drop(finished);
                    job();
                    finished = lock.lock().unwrap();
                }
                None => {
                    if *finished {
                        break;
                    }
                    let (f, _timeout) = cvar
                        .wait_timeout(finished, std::time::Duration::from_millis(1))
                        .unwrap();
                    finished = f;
                }
            }
        }
    }

    /// Signals every idle thread to exit and joins them.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.queue_non_empty.notify_all();
        let mut handles = self.handles.lock().unwrap();
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn idle_loop(self: Arc<Self>) {
        loop {
            let mut queue = self.queue.lock().unwrap();
            loop {
                if let Some(job) = queue.pop_front() {
                    drop(queue);
                    job();
                    break;
                }
                if self.shutdown.load(Ordering::Acquire) {
                    return;
                }
                let (q, _timeout) = self
                    .queue_non_empty
                    .wait_timeout(queue, std::time::Duration::from_millis(50))
                    .unwrap();
                queue = q;
                if self.shutdown.load(Ordering::Acquire) && queue.is_empty() {
                    return;
                }
            }
        }
    }
}
