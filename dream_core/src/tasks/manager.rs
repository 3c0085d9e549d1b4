use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;

use crate::error::{DreamError, Result};
use crate::tasks::task::{Task, TaskId, TaskOutcome};

enum WorkerMessage {
    Run(Arc<Task>),
    Shutdown,
}

/// State shared between the public handle and the worker threads.
struct Shared {
    ready_tx: Sender<WorkerMessage>,
    in_flight: Mutex<usize>,
    all_done: Condvar,
    /// Task ids pushed since the last `clear_fences`. Re-pushing a fenced
    /// id within the same frame is a no-op.
    fence: Mutex<FxHashSet<TaskId>>,
}

impl Shared {
    fn dispatch(&self, task: &Arc<Task>) {
        if task.is_completed() {
            return;
        }
        if task
            .dispatched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        trace!("dispatching task {} ({})", task.id(), task.name());
        if self.ready_tx.send(WorkerMessage::Run(Arc::clone(task))).is_err() {
            warn!("task {} dropped, worker pool is shut down", task.id());
        }
    }

    fn complete(&self, task: &Arc<Task>) {
        for dependent in task.mark_completed() {
            // The last unmet dependency releases the dependent. A dependent
            // that has not been pushed yet dispatches from push_task instead.
            if dependent.unmet_deps.fetch_sub(1, Ordering::AcqRel) == 1
                && dependent.queued.load(Ordering::Acquire)
            {
                self.dispatch(&dependent);
            }
        }
        let mut in_flight = self.in_flight.lock().expect("in-flight mutex poisoned");
        *in_flight -= 1;
        if *in_flight == 0 {
            self.all_done.notify_all();
        }
    }
}

/// Worker pool executing the per-frame task graph.
///
/// Tasks enter through [`push_task`](TaskManager::push_task); they run as
/// soon as their unmet-dependency count reaches zero and a worker is free.
/// A task whose work reports [`TaskOutcome::Deferred`] is resent to the
/// queue, so contention on an entity lock costs a retry, never a blocked
/// worker.
pub struct TaskManager {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskManager {
    /// Pool sized to the machine, matching the frame driver's assumption
    /// that tasks of one frame can all be in flight together.
    pub fn new() -> Result<Self> {
        let count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_workers(count)
    }

    pub fn with_workers(count: usize) -> Result<Self> {
        let count = count.max(1);
        let (ready_tx, ready_rx) = unbounded();
        let shared = Arc::new(Shared {
            ready_tx,
            in_flight: Mutex::new(0),
            all_done: Condvar::new(),
            fence: Mutex::new(FxHashSet::default()),
        });
        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let shared = Arc::clone(&shared);
            let rx = ready_rx.clone();
            let worker = thread::Builder::new()
                .name(format!("dream-task-{i}"))
                .spawn(move || worker_loop(shared, rx))
                .map_err(|e| {
                    DreamError::SubsystemInit(format!("failed to spawn task worker: {e}"))
                })?;
            workers.push(worker);
        }
        debug!("task manager started with {count} workers");
        Ok(TaskManager { shared, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submit a task for this frame. Idempotent two ways: a task id already
    /// fenced this frame is skipped, and a task object is only ever queued
    /// once in its lifetime.
    pub fn push_task(&self, task: &Arc<Task>) {
        {
            let mut fence = self.shared.fence.lock().expect("fence mutex poisoned");
            if !fence.insert(task.id()) {
                trace!("task {} already fenced this frame", task.id());
                return;
            }
        }
        // Count the task before it is visible as queued. The moment `queued`
        // flips, a worker completing an upstream may dispatch, run, and
        // decrement the in-flight count for this task.
        {
            let mut in_flight = self
                .shared
                .in_flight
                .lock()
                .expect("in-flight mutex poisoned");
            *in_flight += 1;
        }
        if task.queued.swap(true, Ordering::AcqRel) {
            let mut in_flight = self
                .shared
                .in_flight
                .lock()
                .expect("in-flight mutex poisoned");
            *in_flight -= 1;
            if *in_flight == 0 {
                self.shared.all_done.notify_all();
            }
            return;
        }
        if task.is_ready() {
            self.shared.dispatch(task);
        }
    }

    /// Open the next frame: previously fenced ids may be pushed again.
    pub fn clear_fences(&self) {
        self.shared
            .fence
            .lock()
            .expect("fence mutex poisoned")
            .clear();
    }

    /// Block until every pushed task has completed. This is the frame
    /// boundary: after it returns no task of the frame is running or
    /// pending.
    pub fn wait_for_all(&self) {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .expect("in-flight mutex poisoned");
        while *in_flight > 0 {
            in_flight = self
                .shared
                .all_done
                .wait(in_flight)
                .expect("in-flight mutex poisoned");
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.shared.ready_tx.send(WorkerMessage::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>, rx: Receiver<WorkerMessage>) {
    loop {
        let task = match rx.recv() {
            Ok(WorkerMessage::Run(task)) => task,
            Ok(WorkerMessage::Shutdown) | Err(_) => break,
        };
        if task.has_expired() {
            trace!("task {} ({}) expired, completing as no-op", task.id(), task.name());
            shared.complete(&task);
            continue;
        }
        match task.run() {
            TaskOutcome::Completed => shared.complete(&task),
            TaskOutcome::Deferred => {
                task.increment_deferral();
                trace!(
                    "task {} ({}) deferred ({} so far)",
                    task.id(),
                    task.name(),
                    task.deferral_count()
                );
                // Yield before resending so the lock holder gets a chance
                // to finish; keeps a single-worker pool from spinning hot.
                thread::yield_now();
                if shared.ready_tx.send(WorkerMessage::Run(task)).is_err() {
                    break;
                }
            }
        }
    }
}
