use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default number of worker threads for builds, crawls, and query batches.
pub const DEFAULT_THREADS: usize = 5;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct State {
    tasks: VecDeque<Task>,
    pending: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    work_available: Condvar,
    work_done: Condvar,
}

/// Fixed pool of worker threads draining a shared task queue. Tasks may
/// submit further tasks (the crawler fans out this way); `finish` blocks
/// until the pending count, which covers dynamically spawned work, reaches
/// zero.
pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkQueue {
    /// Starts `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                pending: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            work_done: Condvar::new(),
        });
        let workers = (0..threads.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(shared))
            })
            .collect();
        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Enqueues a task without blocking. The pending count is raised before
    /// the task becomes visible to workers, so a `finish` that races this
    /// call can never miss it. Dropped with a warning after `shutdown`.
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                tracing::warn!("task submitted after shutdown, dropping it");
                return;
            }
            state.pending += 1;
            state.tasks.push_back(Box::new(task));
        }
        self.shared.work_available.notify_one();
    }

    /// Blocks the calling thread until every submitted task, including
    /// tasks spawned by running tasks, has completed. Returns immediately
    /// when nothing is pending. Must not be called from a worker.
    pub fn finish(&self) {
        let mut state = self.shared.state.lock();
        while state.pending > 0 {
            self.shared.work_done.wait(&mut state);
        }
    }

    /// Lets workers drain the queue, then joins them. Idempotent; later
    /// `execute` calls become no-ops.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.shared.work_available.notify_all();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.tasks.pop_front() {
                    break task;
                }
                if state.shutdown {
                    return;
                }
                shared.work_available.wait(&mut state);
            }
        };

        // a panicking task must not kill the worker or leave the pending
        // count inconsistent
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("queued task panicked");
        }

        let mut state = shared.state.lock();
        state.pending -= 1;
        if state.pending == 0 {
            shared.work_done.notify_all();
        }
    }
}
