use crate::error::{MarkerError, Result};
use crate::state::journal::{GradingEvent, Journal, JournalEntry};
use crate::state::lock::{LockName, NamedLock};
use crate::state::metrics::GradingMetrics;
use crate::state::sheet::{ExamSheet, QuestionStatus};
use crate::state::stop::StopFlag;
use crate::state::{Claim, ClaimOutcome, StateSnapshot, Termination, Transition};
use crate::store::{Correction, ExamLoader, Rubric, RubricStore, StudentId};

/// State shared by all TAs under the synchronized protocol.
///
/// Fields are only reachable through methods, and each method documents the
/// lock it runs under:
///
/// | lock     | guards                                              |
/// |----------|-----------------------------------------------------|
/// | `rubric` | the rubric and its persisted copy                   |
/// | `exam`   | question statuses, current student                  |
/// | `loader` | the transition decision and the exam index          |
/// | `print`  | the journal                                         |
///
/// No method holds a lock across a delay. `loader` is the only lock that
/// nests another (`exam`).
#[derive(Debug)]
pub struct SharedState {
    rubric: NamedLock<Rubric>,
    exam: NamedLock<ExamSheet>,
    loader: NamedLock<u32>,
    print: NamedLock<Journal>,
    stop: StopFlag,
    metrics: GradingMetrics,
    questions: usize,
    sentinel: StudentId,
}

impl SharedState {
    /// Build the shared state and put exam 0 on the table.
    ///
    /// If the first exam cannot be loaded, the run starts already stopped
    /// with the sentinel student, the same way a failed transition ends it.
    /// A first exam that is the termination exam is still marked; stop is
    /// only raised by a transition.
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

        let sentinel = exams.sentinel_student();
        let path = exams.resolve(0);
        let sheet = match exams.load(&path) {
            Ok(student) => {
                tracing::info!(student, path = %path.display(), "Loaded first exam");
                ExamSheet::new(student, questions)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load first exam, stopping");
                stop.raise();
                ExamSheet::new(sentinel, questions)
            }
        };

        Ok(Self {
            rubric: NamedLock::new(LockName::Rubric, rubric),
            exam: NamedLock::new(LockName::Exam, sheet),
            loader: NamedLock::new(LockName::Loader, 0),
            print: NamedLock::new(LockName::Print, Journal::new()),
            stop,
            metrics: GradingMetrics::new(questions),
            questions,
            sentinel,
        })
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn metrics(&self) -> &GradingMetrics {
        &self.metrics
    }

    pub fn questions(&self) -> usize {
        self.questions
    }

    /// Apply the correction rule to `question` and persist the rubric.
    ///
    /// Runs under `rubric`; the event is journaled after it is released. A
    /// failed save is logged and the in-memory rubric stays authoritative.
    pub async fn correct_rubric(
        &self,
        ta: usize,
        question: usize,
        store: &dyn RubricStore,
    ) -> Option<Correction> {
        let correction = {
            let mut rubric = self.rubric.acquire().await;
            let correction = rubric.correct(question)?;
            if let Err(e) = store.save(&rubric) {
                tracing::warn!(ta, question = question + 1, error = %e, "Rubric correction not persisted");
            }
            correction
        };
        self.metrics.record_correction();
        self.record(GradingEvent::RubricCorrected {
            ta,
            question,
            from: correction.from,
            to: correction.to,
        })
        .await;
        Some(correction)
    }

    /// Claim the lowest unmarked question of the current exam. Runs under `exam`.
    pub async fn claim_question(&self) -> ClaimOutcome {
        let mut sheet = self.exam.acquire().await;
        if self.stop.is_raised() {
            return ClaimOutcome::Stopped;
        }
        match sheet.claim_next() {
            Some(question) => {
                self.metrics.begin_marking(question);
                ClaimOutcome::Claimed(Claim {
                    question,
                    student: sheet.student(),
                })
            }
            None => ClaimOutcome::NothingUnmarked,
        }
    }

    /// Mark a claimed question done. Runs under `exam`, then journals.
    pub async fn complete_question(&self, ta: usize, claim: Claim) {
        {
            let mut sheet = self.exam.acquire().await;
            if !sheet.finish(claim.question) {
                tracing::warn!(
                    ta,
                    question = claim.question + 1,
                    "Completed a question that was not being marked"
                );
            }
            self.metrics.end_marking(claim.question);
        }
        self.record(GradingEvent::QuestionMarked {
            ta,
            question: claim.question,
            student: claim.student,
        })
        .await;
    }

    /// Whether every question of the current exam is done. Runs under `exam`.
    pub async fn exam_fully_marked(&self) -> bool {
        self.exam.acquire().await.all_done()
    }

    /// Move to the next exam if the current one is fully marked.
    ///
    /// Runs under `loader`, which makes the transition exactly-once. The
    /// all-done check is repeated under a nested `exam` acquisition because
    /// the caller's earlier check was made without `loader` held. The reset
    /// of the sheet also happens under nested `exam`.
    pub async fn advance_exam(&self, ta: usize, exams: &dyn ExamLoader) -> Transition {
        let transition = {
            let mut exam_index = self.loader.acquire().await;

            let confirmed = self.exam.acquire().await.all_done();
            if !confirmed || self.stop.is_raised() {
                Transition::Skipped
            } else {
                *exam_index += 1;
                self.metrics.record_transition();

                let path = exams.resolve(*exam_index);
                let loaded = exams.load(&path);
                // Stop is raised before `exam` is released so nobody can
                // claim a question of the termination exam.
                let mut sheet = self.exam.acquire().await;
                match loaded {
                    Ok(student) => {
                        self.metrics.record_exam_load();
                        sheet.reset(student);
                        if student == self.sentinel {
                            self.stop.raise();
                            Transition::Terminated {
                                exam_index: *exam_index,
                                cause: Termination::SentinelExam,
                            }
                        } else {
                            Transition::Loaded {
                                exam_index: *exam_index,
                                student,
                            }
                        }
                    }
                    Err(e) => {
                        sheet.force_student(self.sentinel);
                        self.stop.raise();
                        Transition::Terminated {
                            exam_index: *exam_index,
                            cause: Termination::LoadFailed(e.to_string()),
                        }
                    }
                }
            }
        };

        match &transition {
            Transition::Skipped | Transition::Stale { .. } => {}
            Transition::Loaded {
                exam_index,
                student,
            } => {
                self.record(GradingEvent::ExamLoaded {
                    ta,
                    exam_index: *exam_index,
                    student: *student,
                })
                .await;
            }
            Transition::Terminated { exam_index, cause } => {
                if let Termination::LoadFailed(reason) = cause {
                    self.record(GradingEvent::ExamLoadFailed {
                        ta,
                        exam_index: *exam_index,
                        reason: reason.clone(),
                    })
                    .await;
                }
                self.record(GradingEvent::TerminationDetected {
                    ta,
                    exam_index: *exam_index,
                })
                .await;
            }
        }
        transition
    }

    /// Journal an event. Runs under `print`, always as a leaf.
    pub async fn record(&self, event: GradingEvent) {
        self.print.acquire().await.record(event);
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.print.acquire().await.entries().to_vec()
    }

    /// Read every region, one lock at a time.
    pub async fn snapshot(&self) -> StateSnapshot {
        let rubric = self.rubric.acquire().await.to_string();
        let (student, statuses): (StudentId, Vec<QuestionStatus>) = {
            let sheet = self.exam.acquire().await;
            (sheet.student(), sheet.statuses().to_vec())
        };
        let exam_index = *self.loader.acquire().await;
        StateSnapshot {
            exam_index,
            student,
            rubric,
            statuses,
            stopped: self.stop.is_raised(),
        }
    }
}
