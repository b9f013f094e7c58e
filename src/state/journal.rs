use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::StudentId;

/// Externally observable things a TA did.
///
/// Question numbers are zero-based here and rendered one-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradingEvent {
    RubricCorrected {
        ta: usize,
        question: usize,
        from: char,
        to: char,
    },
    QuestionMarked {
        ta: usize,
        question: usize,
        student: StudentId,
    },
    ExamLoaded {
        ta: usize,
        exam_index: u32,
        student: StudentId,
    },
    ExamLoadFailed {
        ta: usize,
        exam_index: u32,
        reason: String,
    },
    TerminationDetected {
        ta: usize,
        exam_index: u32,
    },
    TaExited {
        ta: usize,
    },
}

impl std::fmt::Display for GradingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradingEvent::RubricCorrected { ta, question, from, to } => {
                write!(f, "TA {} corrected rubric Q{} from {} to {}", ta, question + 1, from, to)
            }
            GradingEvent::QuestionMarked { ta, question, student } => {
                write!(f, "TA {} marked Question {} for Student {}", ta, question + 1, student)
            }
            GradingEvent::ExamLoaded { student, .. } => {
                write!(f, "Loading next exam: Student {}", student)
            }
            GradingEvent::ExamLoadFailed { ta, exam_index, reason } => {
                write!(f, "TA {} could not load exam {}: {}", ta, exam_index, reason)
            }
            GradingEvent::TerminationDetected { ta, .. } => {
                write!(f, "TA {} detected termination exam", ta)
            }
            GradingEvent::TaExited { ta } => write!(f, "TA {} exiting (stop flag set)", ta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: GradingEvent,
}

/// Ordered log of grading events, guarded by the print lock.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and emit it through `tracing`.
    pub fn record(&mut self, event: GradingEvent) {
        match &event {
            GradingEvent::RubricCorrected { ta, question, from, to } => {
                tracing::info!(ta, question = question + 1, %from, %to, "{}", event);
            }
            GradingEvent::QuestionMarked { ta, question, student } => {
                tracing::info!(ta, question = question + 1, student, "{}", event);
            }
            GradingEvent::ExamLoaded { ta, exam_index, student } => {
                tracing::info!(ta, exam_index, student, "{}", event);
            }
            GradingEvent::ExamLoadFailed { ta, exam_index, .. } => {
                tracing::error!(ta, exam_index, "{}", event);
            }
            GradingEvent::TerminationDetected { ta, exam_index } => {
                tracing::info!(ta, exam_index, "{}", event);
            }
            GradingEvent::TaExited { ta } => {
                tracing::info!(ta, "{}", event);
            }
        }
        self.entries.push(JournalEntry {
            at: Utc::now(),
            event,
        });
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_one_based() {
        let event = GradingEvent::QuestionMarked {
            ta: 2,
            question: 0,
            student: 42,
        };
        assert_eq!(event.to_string(), "TA 2 marked Question 1 for Student 42");

        let event = GradingEvent::RubricCorrected {
            ta: 1,
            question: 4,
            from: 'E',
            to: 'F',
        };
        assert_eq!(event.to_string(), "TA 1 corrected rubric Q5 from E to F");
    }

    #[test]
    fn record_keeps_order() {
        let mut journal = Journal::new();
        assert!(journal.is_empty());
        journal.record(GradingEvent::TerminationDetected { ta: 3, exam_index: 20 });
        journal.record(GradingEvent::TaExited { ta: 3 });
        assert_eq!(journal.len(), 2);
        assert!(matches!(
            journal.entries()[0].event,
            GradingEvent::TerminationDetected { ta: 3, exam_index: 20 }
        ));
        assert!(journal.entries()[0].at <= journal.entries()[1].at);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let entry = JournalEntry {
            at: Utc::now(),
            event: GradingEvent::TaExited { ta: 1 },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "ta_exited");
        assert_eq!(json["ta"], 1);
    }
}
