//! TAs: the concurrent agents that review the rubric and mark exams.
//!
//! - **Synchronized**: [`TeachingAssistant`] drives the [`Phase`] state machine
//!   against [`SharedState`](crate::state::SharedState)
//! - **Baseline**: [`UnsyncAssistant`] runs the same loop against
//!   [`UnsyncState`](crate::state::UnsyncState) with no locks
//! - **Pacing**: [`Pacing`] supplies seeded delays and correction decisions
//!
//! # Loop
//!
//! 1. Stop check (unlocked read of the monotone flag)
//! 2. Review each rubric question after a thinking delay, correcting about
//!    one in four
//! 3. Claim the lowest unmarked question and grade it outside any lock
//! 4. If every question is done, try to load the next exam
//!
//! The only suspension points are the review and marking delays, and neither
//! holds a lock. A delay cannot be interrupted; a TA notices the stop flag
//! when it comes back to the top of its loop.

pub mod pacing;
pub mod ta;
pub mod unsync;

pub use pacing::Pacing;
pub use ta::{Phase, TeachingAssistant};
pub use unsync::UnsyncAssistant;
