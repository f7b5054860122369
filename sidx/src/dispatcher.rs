//! Worker pool and completion delivery for asynchronous index operations.
//!
//! `submit` hands a task to a bounded pool of worker threads and returns
//! immediately; the task's execute phase never runs on the submitting
//! thread. Finished tasks are forwarded to a single completion thread that
//! invokes each callback exactly once, in the order tasks finish executing.
//! Tasks targeting the same resource are serialized by the resource lock;
//! tasks for distinct resources run in parallel across the pool.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, LazyLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::errors::{SidxError, SidxResult};
use crate::task::{Outcome, Task};

/// Completion callback invoked with the task's outcome.
pub(crate) type Callback = Box<dyn FnOnce(SidxResult<Outcome>) + Send + 'static>;

/// Pool size of the source host runtime.
const DEFAULT_WORKERS: usize = 4;

static GLOBAL: LazyLock<Dispatcher> = LazyLock::new(Dispatcher::default);

struct Job {
    task: Task,
    callback: Callback,
}

struct Completion {
    result: SidxResult<Outcome>,
    callback: Callback,
}

/// A bounded worker pool with callback-based completion delivery.
///
/// Cheap to clone; all clones share the same pool. Dropping the last clone
/// drains the queues and joins the threads.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    submit_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    completion: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Creates a pool with the given number of worker threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (submit_tx, submit_rx) = unbounded::<Job>();
        let (completion_tx, completion_rx) = unbounded::<Completion>();

        let worker_handles = (0..workers)
            .map(|_| {
                let rx = submit_rx.clone();
                let tx = completion_tx.clone();
                thread::spawn(move || worker_loop(rx, tx))
            })
            .collect();
        drop(completion_tx);

        let completion = thread::spawn(move || completion_loop(completion_rx));

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                submit_tx: Some(submit_tx),
                workers: worker_handles,
                completion: Some(completion),
            }),
        }
    }

    /// The process-wide default pool.
    pub fn global() -> &'static Dispatcher {
        &GLOBAL
    }

    /// Enqueues a task. Returns immediately; the outcome is delivered to
    /// `callback` on the completion thread.
    pub(crate) fn submit(&self, task: Task, callback: Callback) {
        let Some(tx) = self.inner.submit_tx.as_ref() else {
            log::error!("dispatcher queue is closed; dropping task");
            return;
        };
        if let Err(err) = tx.send(Job { task, callback }) {
            let Job { callback, .. } = err.into_inner();
            callback(Err(SidxError::Engine(
                "Error submitting task: dispatcher is shut down".to_string(),
            )));
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(DEFAULT_WORKERS)
    }
}

impl Drop for DispatcherInner {
    fn drop(&mut self) {
        // Closing the submit queue lets the workers drain and exit; the
        // completion thread follows once the last worker drops its sender.
        self.submit_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(completion) = self.completion.take() {
            let _ = completion.join();
        }
    }
}

fn worker_loop(rx: Receiver<Job>, tx: Sender<Completion>) {
    for job in rx.iter() {
        let result = job.task.execute();
        if tx
            .send(Completion {
                result,
                callback: job.callback,
            })
            .is_err()
        {
            return;
        }
    }
}

fn completion_loop(rx: Receiver<Completion>) {
    for completion in rx.iter() {
        let Completion { result, callback } = completion;
        if catch_unwind(AssertUnwindSafe(move || callback(result))).is_err() {
            log::error!("completion callback panicked");
        }
    }
}
