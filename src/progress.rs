//! Stage-observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via [`crate::workflow::Workflow::with_observer`]
//! to hear about each stage as a request moves through
//! `Reading → Generating → Publishing`. The CLI uses it to drive a spinner;
//! the RPC server keeps the no-op default and relies on logs.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about. Observers must be `Send + Sync` because one
//! workflow is shared by every concurrent request on the server.
//!
//! # Example
//!
//! ```rust
//! use study_forge::{WorkflowObserver, WorkflowStage};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct StageCounter(AtomicUsize);
//!
//! impl WorkflowObserver for StageCounter {
//!     fn on_stage_complete(&self, stage: WorkflowStage) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} done", stage);
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// Workflow stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    Reading,
    Generating,
    Publishing,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStage::Reading => "reading",
            WorkflowStage::Generating => "generating",
            WorkflowStage::Publishing => "publishing",
        };
        f.write_str(s)
    }
}

/// Called by [`crate::workflow::Workflow`] around each stage.
pub trait WorkflowObserver: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: WorkflowStage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: WorkflowStage) {
        let _ = stage;
    }

    /// Called when a stage fails; no further stages run.
    ///
    /// # Arguments
    /// * `stage`: the stage that failed
    /// * `error`: human-readable error description
    fn on_stage_error(&self, stage: WorkflowStage, error: &str) {
        let _ = (stage, error);
    }
}

/// Observer that ignores every event. The default.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the type stored in [`crate::workflow::Workflow`].
pub type SharedObserver = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl WorkflowObserver for EventLog {
        fn on_stage_start(&self, stage: WorkflowStage) {
            self.0.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_error(&self, stage: WorkflowStage, error: &str) {
            self.0.lock().unwrap().push(format!("error {stage}: {error}"));
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_stage_start(WorkflowStage::Reading);
        obs.on_stage_complete(WorkflowStage::Reading);
        obs.on_stage_error(WorkflowStage::Publishing, "boom");
    }

    #[test]
    fn partial_observer_keeps_defaults() {
        let log = EventLog::default();
        log.on_stage_start(WorkflowStage::Generating);
        log.on_stage_complete(WorkflowStage::Generating);
        log.on_stage_error(WorkflowStage::Generating, "timeout");

        let events = log.0.lock().unwrap();
        assert_eq!(*events, ["start generating", "error generating: timeout"]);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: SharedObserver = Arc::new(NoopObserver);
        obs.on_stage_start(WorkflowStage::Publishing);
    }
}
