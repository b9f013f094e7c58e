use std::path::PathBuf;

use serde::Serialize;

use crate::error::{MarkerError, Result};

/// Which marking protocol the TAs follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Lock-protected protocol.
    #[default]
    Synchronized,
    /// Baseline without any locks. Races are expected and kept.
    Unsynchronized,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Synchronized => write!(f, "synchronized"),
            Variant::Unsynchronized => write!(f, "unsynchronized"),
        }
    }
}

/// Where the exam sequence ends.
///
/// Exam indices at or past `threshold` all resolve to the sentinel exam file,
/// whose student id is expected to be `sentinel_student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamSequence {
    pub threshold: u32,
    /// File number of the terminal exam (`exam_9999.txt`).
    pub sentinel_exam: u32,
    pub sentinel_student: i64,
}

impl Default for ExamSequence {
    fn default() -> Self {
        Self {
            threshold: 20,
            sentinel_exam: 9999,
            sentinel_student: 9999,
        }
    }
}

/// Delays and correction odds for each TA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Thinking time per rubric question, inclusive range
    pub review_min_ms: u64,
    pub review_max_ms: u64,
    /// Time spent grading one question, inclusive range
    pub mark_min_ms: u64,
    pub mark_max_ms: u64,
    /// A reviewed question is corrected with probability `1 / correction_odds`
    pub correction_odds: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            review_min_ms: 500,
            review_max_ms: 999,
            mark_min_ms: 1000,
            mark_max_ms: 2000,
            correction_odds: 4,
        }
    }
}

impl PacingConfig {
    /// Fixed, minimal delays. Maximizes contention between TAs.
    pub fn hurried() -> Self {
        Self {
            review_min_ms: 1,
            review_max_ms: 1,
            mark_min_ms: 1,
            mark_max_ms: 1,
            correction_odds: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkerConfig {
    pub ta_count: usize,
    pub variant: Variant,
    /// Number of questions per exam; also the rubric length.
    pub questions: usize,
    pub rubric_path: PathBuf,
    pub exams_dir: PathBuf,
    pub sequence: ExamSequence,
    pub pacing: PacingConfig,
    /// Base seed for the per-TA generators. `None` draws one at startup.
    pub seed: Option<u64>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            ta_count: 2,
            variant: Variant::default(),
            questions: 5,
            rubric_path: PathBuf::from("rubric.txt"),
            exams_dir: PathBuf::from("exams"),
            sequence: ExamSequence::default(),
            pacing: PacingConfig::default(),
            seed: None,
        }
    }
}

impl MarkerConfig {
    pub fn new(ta_count: usize) -> Self {
        Self {
            ta_count,
            ..Default::default()
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_rubric_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rubric_path = path.into();
        self
    }

    pub fn with_exams_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exams_dir = dir.into();
        self
    }

    pub fn with_sequence(mut self, sequence: ExamSequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_questions(mut self, questions: usize) -> Self {
        self.questions = questions;
        self
    }

    /// Reject configurations that cannot run. Called before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.ta_count < 2 {
            return Err(MarkerError::Config(format!(
                "at least 2 TAs required, got {}",
                self.ta_count
            )));
        }
        if self.questions == 0 {
            return Err(MarkerError::Config(
                "an exam needs at least one question".to_string(),
            ));
        }
        let pacing = &self.pacing;
        if pacing.review_min_ms > pacing.review_max_ms {
            return Err(MarkerError::Config(format!(
                "review delay range {}..={} is empty",
                pacing.review_min_ms, pacing.review_max_ms
            )));
        }
        if pacing.mark_min_ms > pacing.mark_max_ms {
            return Err(MarkerError::Config(format!(
                "marking delay range {}..={} is empty",
                pacing.mark_min_ms, pacing.mark_max_ms
            )));
        }
        if pacing.correction_odds == 0 {
            return Err(MarkerError::Config(
                "correction odds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_config_default() {
        let cfg = MarkerConfig::default();
        assert_eq!(cfg.ta_count, 2);
        assert_eq!(cfg.variant, Variant::Synchronized);
        assert_eq!(cfg.questions, 5);
        assert_eq!(cfg.rubric_path, PathBuf::from("rubric.txt"));
        assert_eq!(cfg.exams_dir, PathBuf::from("exams"));
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn exam_sequence_default() {
        let seq = ExamSequence::default();
        assert_eq!(seq.threshold, 20);
        assert_eq!(seq.sentinel_exam, 9999);
        assert_eq!(seq.sentinel_student, 9999);
    }

    #[test]
    fn pacing_default_timings() {
        let pacing = PacingConfig::default();
        assert_eq!((pacing.review_min_ms, pacing.review_max_ms), (500, 999));
        assert_eq!((pacing.mark_min_ms, pacing.mark_max_ms), (1000, 2000));
        assert_eq!(pacing.correction_odds, 4);
    }

    #[test]
    fn builder_methods_set_fields() {
        let cfg = MarkerConfig::new(4)
            .with_variant(Variant::Unsynchronized)
            .with_rubric_path("/tmp/r.txt")
            .with_exams_dir("/tmp/exams")
            .with_seed(7)
            .with_questions(3);
        assert_eq!(cfg.ta_count, 4);
        assert_eq!(cfg.variant, Variant::Unsynchronized);
        assert_eq!(cfg.rubric_path, PathBuf::from("/tmp/r.txt"));
        assert_eq!(cfg.exams_dir, PathBuf::from("/tmp/exams"));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.questions, 3);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(MarkerConfig::new(2).validate().is_ok());
        assert!(MarkerConfig::new(16).validate().is_ok());
    }

    #[test]
    fn validate_rejects_single_ta() {
        for count in [0, 1] {
            let err = MarkerConfig::new(count).validate().unwrap_err();
            assert!(matches!(err, MarkerError::Config(_)));
            assert!(err.is_setup_error());
        }
    }

    #[test]
    fn validate_rejects_bad_pacing() {
        let mut pacing = PacingConfig::default();
        pacing.review_min_ms = 2000;
        assert!(MarkerConfig::new(2).with_pacing(pacing).validate().is_err());

        let mut pacing = PacingConfig::default();
        pacing.mark_max_ms = 10;
        assert!(MarkerConfig::new(2).with_pacing(pacing).validate().is_err());

        let mut pacing = PacingConfig::default();
        pacing.correction_odds = 0;
        assert!(MarkerConfig::new(2).with_pacing(pacing).validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_exam() {
        assert!(MarkerConfig::new(3).with_questions(0).validate().is_err());
    }

    #[test]
    fn variant_display() {
        assert_eq!(Variant::Synchronized.to_string(), "synchronized");
        assert_eq!(Variant::Unsynchronized.to_string(), "unsynchronized");
    }
}
