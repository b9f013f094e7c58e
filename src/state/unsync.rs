use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

use crate::error::{MarkerError, Result};
use crate::state::metrics::GradingMetrics;
use crate::state::sheet::QuestionStatus;
use crate::state::stop::StopFlag;
use crate::state::{Claim, StateSnapshot, Termination, Transition};
use crate::store::rubric::next_answer;
use crate::store::{Correction, ExamLoader, Rubric, RubricStore, StudentId};

/// Shared state for the unsynchronized baseline.
///
/// Every cell is an individual relaxed atomic, so there is no undefined
/// behavior, but every read-modify-write is a separate load and store with a
/// yield in between. Duplicate claims, lost rubric updates and duplicate
/// transitions all happen here; [`GradingMetrics`] counts the ones it can
/// see.
#[derive(Debug)]
pub struct UnsyncState {
    student: AtomicI64,
    exam_index: AtomicU32,
    rubric: Vec<AtomicU8>,
    statuses: Vec<AtomicU8>,
    stop: StopFlag,
    metrics: GradingMetrics,
    sentinel: StudentId,
}

impl UnsyncState {
    /// Build the state and load exam 0. A failed first load is only logged;
    /// the TAs then mark an exam for student 0.
    pub fn initialize(
        rubric: Rubric,
        exams: &dyn ExamLoader,
        questions: usize,
        stop: StopFlag,
    ) -> Result<Self> {
        if rubric.len() != questions {
            return Err(MarkerError::Resource(format!(
                "rubric has {} answers but exams have {} questions",
                rubric.len(),
                questions
            )));
        }

        let path = exams.resolve(0);
        let student = match exams.load(&path) {
            Ok(student) => {
                tracing::info!(student, path = %path.display(), "Loaded first exam");
                student
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load first exam");
                0
            }
        };

        Ok(Self {
            student: AtomicI64::new(student),
            exam_index: AtomicU32::new(0),
            rubric: rubric.as_bytes().iter().map(|&a| AtomicU8::new(a)).collect(),
            statuses: (0..questions)
                .map(|_| AtomicU8::new(QuestionStatus::Unmarked.as_u8()))
                .collect(),
            stop,
            metrics: GradingMetrics::new(questions),
            sentinel: exams.sentinel_student(),
        })
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn metrics(&self) -> &GradingMetrics {
        &self.metrics
    }

    pub fn questions(&self) -> usize {
        self.statuses.len()
    }

    fn rubric_copy(&self) -> Rubric {
        Rubric::new(
            self.rubric
                .iter()
                .map(|a| a.load(Ordering::Relaxed))
                .collect::<Vec<_>>(),
        )
    }

    fn status(&self, question: usize) -> QuestionStatus {
        QuestionStatus::from_u8(self.statuses[question].load(Ordering::Relaxed))
    }

    fn set_status(&self, question: usize, status: QuestionStatus) {
        self.statuses[question].store(status.as_u8(), Ordering::Relaxed);
    }

    /// Read, yield, write. A concurrent correction in the window is lost.
    pub async fn correct_rubric(
        &self,
        ta: usize,
        question: usize,
        store: &dyn RubricStore,
    ) -> Option<Correction> {
        let slot = self.rubric.get(question)?;
        let from = slot.load(Ordering::Relaxed);
        tokio::task::yield_now().await;
        if slot.load(Ordering::Relaxed) != from {
            self.metrics.record_lost_update();
        }
        let to = next_answer(from);
        slot.store(to, Ordering::Relaxed);
        self.metrics.record_correction();

        let correction = Correction {
            question,
            from: from as char,
            to: to as char,
        };
        tracing::info!(
            ta,
            question = question + 1,
            from = %correction.from,
            to = %correction.to,
            "TA {} corrected rubric Q{} from {} to {}",
            ta,
            question + 1,
            correction.from,
            correction.to
        );
        if let Err(e) = store.save(&self.rubric_copy()) {
            tracing::warn!(ta, error = %e, "Rubric correction not persisted");
        }
        Some(correction)
    }

    /// Find an unmarked question, yield, then take it. Two TAs can take the
    /// same question.
    pub async fn claim_question(&self) -> Option<Claim> {
        for question in 0..self.statuses.len() {
            if self.status(question) == QuestionStatus::Unmarked {
                tokio::task::yield_now().await;
                self.set_status(question, QuestionStatus::Marking);
                self.metrics.begin_marking(question);
                return Some(Claim {
                    question,
                    student: self.student.load(Ordering::Relaxed),
                });
            }
        }
        None
    }

    /// Mark the question done and report whichever student is current now,
    /// which may already be the next exam's.
    pub fn complete_question(&self, ta: usize, claim: Claim) {
        self.set_status(claim.question, QuestionStatus::Done);
        self.metrics.end_marking(claim.question);
        let student = self.student.load(Ordering::Relaxed);
        tracing::info!(
            ta,
            question = claim.question + 1,
            student,
            "TA {} marked Question {} for Student {}",
            ta,
            claim.question + 1,
            student
        );
    }

    pub fn exam_fully_marked(&self) -> bool {
        (0..self.statuses.len()).all(|q| self.status(q) == QuestionStatus::Done)
    }

    /// Advance without any lock. Several TAs may advance for the same exam,
    /// and increments of the exam index can be lost.
    pub async fn advance_exam(&self, ta: usize, exams: &dyn ExamLoader) -> Transition {
        let current = self.exam_index.load(Ordering::Relaxed);
        tokio::task::yield_now().await;
        if self.exam_index.load(Ordering::Relaxed) != current {
            self.metrics.record_lost_transition();
        }
        let exam_index = current.saturating_add(1);
        self.exam_index.store(exam_index, Ordering::Relaxed);
        self.metrics.record_transition();

        let path = exams.resolve(exam_index);
        match exams.load(&path) {
            Ok(student) => {
                self.metrics.record_exam_load();
                self.student.store(student, Ordering::Relaxed);
                for question in 0..self.statuses.len() {
                    self.set_status(question, QuestionStatus::Unmarked);
                }
                if student == self.sentinel {
                    self.stop.raise();
                    tracing::info!(ta, exam_index, "TA {} detected termination exam", ta);
                    Transition::Terminated {
                        exam_index,
                        cause: Termination::SentinelExam,
                    }
                } else {
                    tracing::info!(ta, exam_index, student, "Loading next exam: Student {}", student);
                    Transition::Loaded {
                        exam_index,
                        student,
                    }
                }
            }
            Err(e) => {
                tracing::error!(ta, exam_index, error = %e, "Error opening exam file");
                Transition::Stale {
                    exam_index,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Unlocked read of every cell; only meaningful once the TAs are joined.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            exam_index: self.exam_index.load(Ordering::Relaxed),
            student: self.student.load(Ordering::Relaxed),
            rubric: self.rubric_copy().to_string(),
            statuses: (0..self.statuses.len()).map(|q| self.status(q)).collect(),
            stopped: self.stop.is_raised(),
        }
    }
}
