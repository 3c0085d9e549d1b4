use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type TaskId = u64;

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Result of one execution attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// A precondition (typically the target entity's lock) was not met.
    /// The task stays incomplete and is retried on a later pass.
    Deferred,
}

/// The work a task performs. Implementations check their preconditions
/// with `try_lock` and report `Deferred` rather than blocking or panicking.
pub trait TaskWork: Send + Sync {
    fn execute(&self) -> TaskOutcome;
}

impl<F> TaskWork for F
where
    F: Fn() -> TaskOutcome + Send + Sync,
{
    fn execute(&self) -> TaskOutcome {
        self()
    }
}

/// A node in the per-frame task graph.
///
/// Readiness is explicit data: an unmet-dependency counter decremented
/// when an upstream task completes, so dispatch is O(1) rather than a
/// scan of the pending set.
pub struct Task {
    id: TaskId,
    name: &'static str,
    completed: AtomicBool,
    expired: AtomicBool,
    /// Set once when the task is first pushed to the manager; a task
    /// object is never queued twice.
    pub(crate) queued: AtomicBool,
    /// Guards against double-dispatch from the push and completion paths.
    pub(crate) dispatched: AtomicBool,
    deferral_count: AtomicU32,
    pub(crate) unmet_deps: AtomicUsize,
    dependents: Mutex<Vec<Arc<Task>>>,
    work: Box<dyn TaskWork>,
}

impl Task {
    pub fn new(name: &'static str, work: impl TaskWork + 'static) -> Arc<Task> {
        Arc::new(Task {
            id: TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            name,
            completed: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            queued: AtomicBool::new(false),
            dispatched: AtomicBool::new(false),
            deferral_count: AtomicU32::new(0),
            unmet_deps: AtomicUsize::new(0),
            dependents: Mutex::new(Vec::new()),
            work: Box::new(work),
        })
    }

    /// A task with no work, useful as a pure ordering point.
    pub fn noop(name: &'static str) -> Arc<Task> {
        Task::new(name, || TaskOutcome::Completed)
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn has_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Invalidate a task whose target has been destroyed. The executor
    /// completes it as a silent no-op instead of touching the target.
    pub fn set_expired(&self, expired: bool) {
        self.expired.store(expired, Ordering::Release);
    }

    pub fn deferral_count(&self) -> u32 {
        self.deferral_count.load(Ordering::Relaxed)
    }

    pub(crate) fn increment_deferral(&self) {
        self.deferral_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.unmet_deps.load(Ordering::Acquire) == 0
    }

    /// Register an upstream dependency. Returns self so chains can be
    /// built inline while constructing the frame graph:
    ///
    /// `task.depends_on(&input).depends_on(&lifetime)`
    ///
    /// An already-completed upstream is a no-op.
    pub fn depends_on<'a>(self: &'a Arc<Self>, upstream: &Arc<Task>) -> &'a Arc<Self> {
        let mut dependents = upstream
            .dependents
            .lock()
            .expect("task dependents mutex poisoned");
        // completed flips inside this same lock, so the check cannot race
        // with upstream completion.
        if upstream.completed.load(Ordering::Acquire) {
            return self;
        }
        self.unmet_deps.fetch_add(1, Ordering::AcqRel);
        dependents.push(Arc::clone(self));
        self
    }

    pub(crate) fn run(&self) -> TaskOutcome {
        self.work.execute()
    }

    /// Flag completion and take the dependents to notify. Flipping the
    /// flag under the dependents lock keeps `depends_on` race-free.
    pub(crate) fn mark_completed(&self) -> Vec<Arc<Task>> {
        let mut dependents = self
            .dependents
            .lock()
            .expect("task dependents mutex poisoned");
        self.completed.store(true, Ordering::Release);
        std::mem::take(&mut *dependents)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("completed", &self.is_completed())
            .field("expired", &self.has_expired())
            .field("deferrals", &self.deferral_count())
            .finish()
    }
}
