use std::sync::Arc;

use crate::state::{ClaimOutcome, GradingEvent, SharedState};
use crate::store::{ExamLoader, RubricStore};
use crate::worker::pacing::Pacing;

/// Where a TA is in its marking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Walk the rubric, occasionally correcting an answer.
    Reviewing,
    /// Claim one unmarked question and grade it.
    Marking,
    /// Look for a fully marked exam.
    CheckingCompletion,
    /// Try to put the next exam on the table.
    Transitioning,
    Exiting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Reviewing => write!(f, "reviewing"),
            Phase::Marking => write!(f, "marking"),
            Phase::CheckingCompletion => write!(f, "checking_completion"),
            Phase::Transitioning => write!(f, "transitioning"),
            Phase::Exiting => write!(f, "exiting"),
        }
    }
}

/// A TA following the synchronized protocol.
pub struct TeachingAssistant {
    id: usize,
    state: Arc<SharedState>,
    rubric_store: Arc<dyn RubricStore>,
    exams: Arc<dyn ExamLoader>,
    pacing: Pacing,
}

impl TeachingAssistant {
    pub fn new(
        id: usize,
        state: Arc<SharedState>,
        rubric_store: Arc<dyn RubricStore>,
        exams: Arc<dyn ExamLoader>,
        pacing: Pacing,
    ) -> Self {
        Self {
            id,
            state,
            rubric_store,
            exams,
            pacing,
        }
    }

    /// Run until the stop flag is seen at the top of the loop.
    pub async fn run(mut self) {
        let mut phase = Phase::Reviewing;
        while phase != Phase::Exiting {
            phase = self.step(phase).await;
        }
        self.state
            .record(GradingEvent::TaExited { ta: self.id })
            .await;
    }

    /// Execute one phase and return the next one.
    pub async fn step(&mut self, phase: Phase) -> Phase {
        tracing::trace!(ta = self.id, %phase, "Entering phase");
        match phase {
            Phase::Reviewing => {
                // Unlocked read; the flag is monotone so a late view only
                // costs one more iteration.
                if self.state.stop_flag().is_raised() {
                    return Phase::Exiting;
                }
                self.review().await;
                Phase::Marking
            }
            Phase::Marking => self.mark().await,
            Phase::CheckingCompletion => {
                if self.state.exam_fully_marked().await {
                    Phase::Transitioning
                } else {
                    Phase::Reviewing
                }
            }
            Phase::Transitioning => {
                self.state.advance_exam(self.id, self.exams.as_ref()).await;
                Phase::Reviewing
            }
            Phase::Exiting => Phase::Exiting,
        }
    }

    async fn review(&mut self) {
        let questions = self.state.questions();
        for question in 0..questions {
            tokio::time::sleep(self.pacing.review_delay()).await;
            if self.pacing.should_correct() {
                self.state
                    .correct_rubric(self.id, question, self.rubric_store.as_ref())
                    .await;
            }
        }
    }

    async fn mark(&mut self) -> Phase {
        match self.state.claim_question().await {
            ClaimOutcome::Stopped => Phase::Reviewing,
            ClaimOutcome::NothingUnmarked => Phase::CheckingCompletion,
            ClaimOutcome::Claimed(claim) => {
                // Grading holds no lock so other TAs can mark other questions.
                tokio::time::sleep(self.pacing.mark_delay()).await;
                self.state.complete_question(self.id, claim).await;
                Phase::CheckingCompletion
            }
        }
    }
}
