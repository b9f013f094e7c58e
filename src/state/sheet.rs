use serde::Serialize;

use crate::store::StudentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionStatus {
    Unmarked,
    Marking,
    Done,
}

impl QuestionStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            QuestionStatus::Unmarked => 0,
            QuestionStatus::Marking => 1,
            QuestionStatus::Done => 2,
        }
    }

    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => QuestionStatus::Unmarked,
            1 => QuestionStatus::Marking,
            _ => QuestionStatus::Done,
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionStatus::Unmarked => write!(f, "unmarked"),
            QuestionStatus::Marking => write!(f, "marking"),
            QuestionStatus::Done => write!(f, "done"),
        }
    }
}

/// Marking progress of the exam currently on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSheet {
    student: StudentId,
    statuses: Vec<QuestionStatus>,
}

impl ExamSheet {
    pub fn new(student: StudentId, questions: usize) -> Self {
        Self {
            student,
            statuses: vec![QuestionStatus::Unmarked; questions],
        }
    }

    pub fn student(&self) -> StudentId {
        self.student
    }

    pub fn statuses(&self) -> &[QuestionStatus] {
        &self.statuses
    }

    /// Move the lowest-index unmarked question to `Marking`.
    pub fn claim_next(&mut self) -> Option<usize> {
        let question = self
            .statuses
            .iter()
            .position(|s| *s == QuestionStatus::Unmarked)?;
        self.statuses[question] = QuestionStatus::Marking;
        Some(question)
    }

    /// Move a question from `Marking` to `Done`. Any other starting status is
    /// left untouched and reported as false.
    pub fn finish(&mut self, question: usize) -> bool {
        match self.statuses.get_mut(question) {
            Some(status) if *status == QuestionStatus::Marking => {
                *status = QuestionStatus::Done;
                true
            }
            _ => false,
        }
    }

    pub fn all_done(&self) -> bool {
        self.statuses.iter().all(|s| *s == QuestionStatus::Done)
    }

    /// Put a freshly loaded exam on the table.
    pub fn reset(&mut self, student: StudentId) {
        self.student = student;
        self.statuses.fill(QuestionStatus::Unmarked);
    }

    /// Replace the student without touching question progress.
    pub fn force_student(&mut self, student: StudentId) {
        self.student = student;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_in_ascending_order() {
        let mut sheet = ExamSheet::new(42, 3);
        assert_eq!(sheet.claim_next(), Some(0));
        assert_eq!(sheet.claim_next(), Some(1));
        assert_eq!(sheet.claim_next(), Some(2));
        assert_eq!(sheet.claim_next(), None);
        assert!(!sheet.all_done());
    }

    #[test]
    fn finish_only_from_marking() {
        let mut sheet = ExamSheet::new(42, 2);
        assert!(!sheet.finish(0));
        sheet.claim_next();
        assert!(sheet.finish(0));
        assert!(!sheet.finish(0));
        assert!(!sheet.finish(7));
        assert_eq!(sheet.statuses(), [QuestionStatus::Done, QuestionStatus::Unmarked]);
    }

    #[test]
    fn all_done_then_reset() {
        let mut sheet = ExamSheet::new(42, 2);
        while let Some(q) = sheet.claim_next() {
            sheet.finish(q);
        }
        assert!(sheet.all_done());
        sheet.reset(43);
        assert_eq!(sheet.student(), 43);
        assert!(sheet.statuses().iter().all(|s| *s == QuestionStatus::Unmarked));
    }

    #[test]
    fn force_student_keeps_progress() {
        let mut sheet = ExamSheet::new(42, 1);
        sheet.claim_next();
        sheet.finish(0);
        sheet.force_student(9999);
        assert_eq!(sheet.student(), 9999);
        assert!(sheet.all_done());
    }

    #[test]
    fn status_byte_round_trip() {
        for status in [QuestionStatus::Unmarked, QuestionStatus::Marking, QuestionStatus::Done] {
            assert_eq!(QuestionStatus::from_u8(status.as_u8()), status);
        }
    }
}
