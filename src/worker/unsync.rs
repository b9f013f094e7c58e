use std::sync::Arc;

use crate::state::{Transition, UnsyncState};
use crate::store::{ExamLoader, RubricStore};
use crate::worker::pacing::Pacing;

/// A TA running the baseline loop: the same phases as
/// [`TeachingAssistant`](crate::worker::TeachingAssistant) with no locks.
pub struct UnsyncAssistant {
    id: usize,
    state: Arc<UnsyncState>,
    rubric_store: Arc<dyn RubricStore>,
    exams: Arc<dyn ExamLoader>,
    pacing: Pacing,
}

impl UnsyncAssistant {
    pub fn new(
        id: usize,
        state: Arc<UnsyncState>,
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

    /// Loop until the stop flag is seen, or until this TA itself loads the
    /// termination exam.
    pub async fn run(mut self) {
        while !self.state.stop_flag().is_raised() {
            for question in 0..self.state.questions() {
                tokio::time::sleep(self.pacing.review_delay()).await;
                if self.pacing.should_correct() {
                    self.state
                        .correct_rubric(self.id, question, self.rubric_store.as_ref())
                        .await;
                }
            }

            if let Some(claim) = self.state.claim_question().await {
                tokio::time::sleep(self.pacing.mark_delay()).await;
                self.state.complete_question(self.id, claim);
            }

            if self.state.exam_fully_marked() {
                let transition = self
                    .state
                    .advance_exam(self.id, self.exams.as_ref())
                    .await;
                if matches!(transition, Transition::Terminated { .. }) {
                    break;
                }
            }
        }
        tracing::info!(ta = self.id, "TA {} exiting", self.id);
    }
}
