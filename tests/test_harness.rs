//! Test harness for marking runs.
//!
//! Provides a temporary rubric/exam directory and helpers to run a
//! supervisor with a bound on (virtual) time.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use exam_marker::config::{ExamSequence, MarkerConfig, PacingConfig, Variant};
use exam_marker::state::{GradingEvent, JournalEntry};
use exam_marker::store::FsExamLoader;
use exam_marker::{RunSummary, Supervisor};

pub const SENTINEL: i64 = 9999;

/// Five questions, answers A..E.
pub const RUBRIC_A_TO_E: &str = "1,A\n2,B\n3,C\n4,D\n5,E\n";

/// A rubric file plus an exam directory in a temp dir.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new(rubric: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("exams")).unwrap();
        std::fs::write(dir.path().join("rubric.txt"), rubric).unwrap();
        Self { dir }
    }

    pub fn rubric_path(&self) -> PathBuf {
        self.dir.path().join("rubric.txt")
    }

    pub fn exams_dir(&self) -> PathBuf {
        self.dir.path().join("exams")
    }

    /// Write `exam_{number:04}.txt` holding `student`.
    pub fn write_exam(&self, number: u32, student: i64) {
        std::fs::write(
            self.exams_dir().join(FsExamLoader::file_name(number)),
            format!("{}\n", student),
        )
        .unwrap();
    }

    /// Write `exam_{number:04}.txt` with arbitrary contents.
    pub fn write_exam_body(&self, number: u32, body: &str) {
        std::fs::write(self.exams_dir().join(FsExamLoader::file_name(number)), body).unwrap();
    }

    /// Exams 1..=students.len() in order, plus the termination exam.
    pub fn write_sequence(&self, students: &[i64]) {
        for (i, &student) in students.iter().enumerate() {
            self.write_exam(i as u32 + 1, student);
        }
        self.write_exam(9999, SENTINEL);
    }

    pub fn config(&self, tas: usize, threshold: u32) -> MarkerConfig {
        MarkerConfig::new(tas)
            .with_rubric_path(self.rubric_path())
            .with_exams_dir(self.exams_dir())
            .with_sequence(ExamSequence {
                threshold,
                ..Default::default()
            })
    }

    pub fn unsync_config(&self, tas: usize, threshold: u32) -> MarkerConfig {
        self.config(tas, threshold)
            .with_variant(Variant::Unsynchronized)
            .with_pacing(PacingConfig::hurried())
    }
}

/// Run to completion, failing the test if it takes more than an hour of
/// (usually virtual) time.
pub async fn run_bounded(config: MarkerConfig) -> RunSummary {
    tokio::time::timeout(Duration::from_secs(3600), Supervisor::new(config).run())
        .await
        .expect("marking run did not finish")
        .expect("marking run failed")
}

pub fn count_events(events: &[JournalEntry], pred: impl Fn(&GradingEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(&e.event)).count()
}
