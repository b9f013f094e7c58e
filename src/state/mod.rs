//! Shared marking state and the locks around it.
//!
//! - [`SharedState`]: the synchronized protocol, every region behind a [`NamedLock`]
//! - [`UnsyncState`]: the lock-free baseline, kept racy on purpose
//! - [`StopFlag`]: monotone stop signal
//! - [`Journal`]: events serialized by the print lock
//! - [`GradingMetrics`]: claim, correction and transition counters

pub mod journal;
pub mod lock;
pub mod metrics;
pub mod shared;
pub mod sheet;
pub mod stop;
pub mod unsync;

use serde::Serialize;

use crate::store::StudentId;

pub use journal::{GradingEvent, Journal, JournalEntry};
pub use lock::{LockName, NamedLock};
pub use metrics::{GradingMetrics, MetricsSnapshot};
pub use shared::SharedState;
pub use sheet::{ExamSheet, QuestionStatus};
pub use stop::StopFlag;
pub use unsync::UnsyncState;

/// A question a TA has taken for marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub question: usize,
    pub student: StudentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(Claim),
    /// Every question is already taken or done.
    NothingUnmarked,
    /// The stop flag was seen while holding the exam lock.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    SentinelExam,
    /// The next exam could not be read; the sentinel student was forced.
    LoadFailed(String),
}

/// Result of one attempt to move to the next exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Another TA already advanced, the exam is not finished, or the run is stopping.
    Skipped,
    Loaded { exam_index: u32, student: StudentId },
    Terminated { exam_index: u32, cause: Termination },
    /// Baseline only: the load failed and the previous exam stays on the table.
    Stale { exam_index: u32, reason: String },
}

/// Point-in-time view of the shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub exam_index: u32,
    pub student: StudentId,
    pub rubric: String,
    pub statuses: Vec<QuestionStatus>,
    pub stopped: bool,
}
