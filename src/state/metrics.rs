use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every TA of a run.
///
/// `double_claims`, `lost_updates` and `lost_transitions` stay at zero under
/// the synchronized protocol; the unsynchronized baseline is expected to bump
/// them.
#[derive(Debug)]
pub struct GradingMetrics {
    corrections: AtomicU64,
    claims: AtomicU64,
    questions_marked: AtomicU64,
    double_claims: AtomicU64,
    /// Rubric writes that overwrote a concurrent correction
    lost_updates: AtomicU64,
    /// Exam index writes that overwrote a concurrent transition
    lost_transitions: AtomicU64,
    transitions: AtomicU64,
    exam_loads: AtomicU64,
    /// TAs currently holding each question
    holders: Vec<AtomicU32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub corrections: u64,
    pub claims: u64,
    pub questions_marked: u64,
    pub double_claims: u64,
    pub lost_updates: u64,
    pub lost_transitions: u64,
    pub transitions: u64,
    pub exam_loads: u64,
}

impl GradingMetrics {
    pub fn new(questions: usize) -> Self {
        Self {
            corrections: AtomicU64::new(0),
            claims: AtomicU64::new(0),
            questions_marked: AtomicU64::new(0),
            double_claims: AtomicU64::new(0),
            lost_updates: AtomicU64::new(0),
            lost_transitions: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            exam_loads: AtomicU64::new(0),
            holders: (0..questions).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// A TA took `question`. Returns true if another TA already held it.
    pub fn begin_marking(&self, question: usize) -> bool {
        self.claims.fetch_add(1, Ordering::Relaxed);
        let Some(holders) = self.holders.get(question) else {
            return false;
        };
        let overlapped = holders.fetch_add(1, Ordering::AcqRel) > 0;
        if overlapped {
            self.double_claims.fetch_add(1, Ordering::Relaxed);
        }
        overlapped
    }

    pub fn end_marking(&self, question: usize) {
        self.questions_marked.fetch_add(1, Ordering::Relaxed);
        if let Some(holders) = self.holders.get(question) {
            let _ = holders.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        }
    }

    pub fn record_correction(&self) {
        self.corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost_update(&self) {
        self.lost_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost_transition(&self) {
        self.lost_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exam_load(&self) {
        self.exam_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            corrections: self.corrections.load(Ordering::Relaxed),
            claims: self.claims.load(Ordering::Relaxed),
            questions_marked: self.questions_marked.load(Ordering::Relaxed),
            double_claims: self.double_claims.load(Ordering::Relaxed),
            lost_updates: self.lost_updates.load(Ordering::Relaxed),
            lost_transitions: self.lost_transitions.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
            exam_loads: self.exam_loads.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_claims_do_not_overlap() {
        let metrics = GradingMetrics::new(2);
        assert!(!metrics.begin_marking(0));
        metrics.end_marking(0);
        assert!(!metrics.begin_marking(0));
        assert!(!metrics.begin_marking(1));
        metrics.end_marking(0);
        metrics.end_marking(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.claims, 3);
        assert_eq!(snap.questions_marked, 3);
        assert_eq!(snap.double_claims, 0);
    }

    #[test]
    fn overlapping_claim_is_counted() {
        let metrics = GradingMetrics::new(1);
        assert!(!metrics.begin_marking(0));
        assert!(metrics.begin_marking(0));
        metrics.end_marking(0);
        metrics.end_marking(0);
        assert_eq!(metrics.snapshot().double_claims, 1);
    }

    #[test]
    fn out_of_range_question_is_ignored() {
        let metrics = GradingMetrics::new(1);
        assert!(!metrics.begin_marking(5));
        metrics.end_marking(5);
        assert_eq!(metrics.snapshot().double_claims, 0);
    }
}
