use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which stage of generation a [`ProgressEvent`] was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Solve,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Solve => write!(f, "solve"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// A single progress notification from the solver.
///
/// Delivery is synchronous with the solver and strictly ordered: a
/// subscriber sees events in the exact order the solver emits them, and
/// must not block since it runs on the solver's own call stack.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub percent: f32,
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(phase: Phase, percent: f32) -> Self {
        Self {
            phase,
            percent,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// When applied to a struct, allows injecting it into
/// [`crate::solver::Solver`] to observe generation progress.
///
/// Mirrors `grid-forge`'s `singular::Subscriber`, generalised from "a tile
/// was collapsed" to a full init/solve/finalize progress contract.
/// Subscribers may attach before generation starts and are dropped along
/// with the `Solver` otherwise; there is no detach call because a `Solver`
/// only ever drives one generation's worth of subscribers.
pub trait ProgressSink {
    fn on_progress(&mut self, event: ProgressEvent);
}

/// A `ProgressSink` that discards every event; the default when a caller
/// supplies none.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_progress(&mut self, _event: ProgressEvent) {}
}

/// Collects every event it sees, in order - useful for tests asserting on
/// the progress contract and for a caller replaying a run.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    events: Vec<ProgressEvent>,
}

impl RecordingProgressSink {
    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }
}

impl ProgressSink for RecordingProgressSink {
    fn on_progress(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }
}

/// A one-shot, cooperative cancellation signal.
///
/// Cloning shares the same underlying flag, so a caller can hold one clone
/// and fire it from another thread while [`crate::solver::Solver::generate`]
/// polls its own clone at its defined checkpoints.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
