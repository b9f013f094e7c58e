use std::path::{Path, PathBuf};

use crate::config::ExamSequence;
use crate::error::{MarkerError, Result};

pub type StudentId = i64;

/// Student id recorded for an exam whose body holds no integer.
pub const UNREADABLE_STUDENT: StudentId = 0;

/// Source of exams, addressed by their position in the sequence.
pub trait ExamLoader: Send + Sync {
    /// Map an exam index to the file holding that exam.
    fn resolve(&self, exam_index: u32) -> PathBuf;

    /// Read the student id from an exam file. Only a file that cannot be
    /// opened is an error.
    fn load(&self, path: &Path) -> Result<StudentId>;

    /// The student id that marks the end of the sequence.
    fn sentinel_student(&self) -> StudentId;
}

/// Exams stored as `exam_0001.txt`, `exam_0002.txt`, ... in one directory.
#[derive(Debug, Clone)]
pub struct FsExamLoader {
    dir: PathBuf,
    sequence: ExamSequence,
}

impl FsExamLoader {
    pub fn new(dir: impl Into<PathBuf>, sequence: ExamSequence) -> Self {
        Self {
            dir: dir.into(),
            sequence,
        }
    }

    pub fn file_name(number: u32) -> String {
        format!("exam_{:04}.txt", number)
    }
}

impl ExamLoader for FsExamLoader {
    /// Index `i` is exam file `i + 1`; every index at or past the threshold
    /// resolves to the sentinel exam.
    fn resolve(&self, exam_index: u32) -> PathBuf {
        let number = if exam_index >= self.sequence.threshold {
            self.sequence.sentinel_exam
        } else {
            exam_index.saturating_add(1)
        };
        self.dir.join(Self::file_name(number))
    }

    fn load(&self, path: &Path) -> Result<StudentId> {
        let bytes = std::fs::read(path).map_err(|source| MarkerError::ExamLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let student = content
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<StudentId>().ok());
        Ok(student.unwrap_or_else(|| {
            let excerpt: String = content.trim().chars().take(32).collect();
            tracing::warn!(
                path = %path.display(),
                content = %excerpt,
                "Exam has no student id, marking it as student {}",
                UNREADABLE_STUDENT
            );
            UNREADABLE_STUDENT
        }))
    }

    fn sentinel_student(&self) -> StudentId {
        self.sequence.sentinel_student
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(dir: &Path, threshold: u32) -> FsExamLoader {
        FsExamLoader::new(
            dir,
            ExamSequence {
                threshold,
                ..Default::default()
            },
        )
    }

    #[test]
    fn resolve_numbers_from_one() {
        let l = loader(Path::new("exams"), 20);
        assert_eq!(l.resolve(0), Path::new("exams/exam_0001.txt"));
        assert_eq!(l.resolve(19), Path::new("exams/exam_0020.txt"));
    }

    #[test]
    fn resolve_past_threshold_is_sentinel() {
        let l = loader(Path::new("exams"), 20);
        assert_eq!(l.resolve(20), Path::new("exams/exam_9999.txt"));
        assert_eq!(l.resolve(21), Path::new("exams/exam_9999.txt"));
        assert_eq!(l.resolve(u32::MAX), Path::new("exams/exam_9999.txt"));
    }

    #[test]
    fn load_reads_first_integer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam_0001.txt");
        std::fs::write(&path, "  42\nignored\n").unwrap();
        assert_eq!(loader(dir.path(), 20).load(&path).unwrap(), 42);
    }

    #[test]
    fn load_missing_file_is_exam_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader(dir.path(), 20)
            .load(&dir.path().join("exam_0005.txt"))
            .unwrap_err();
        assert!(matches!(err, MarkerError::ExamLoad { .. }));
        assert!(!err.is_setup_error());
    }

    #[test]
    fn load_non_numeric_reads_as_unreadable_student() {
        let dir = tempfile::tempdir().unwrap();
        let l = loader(dir.path(), 20);
        for (name, body) in [("exam_0001.txt", "alice"), ("exam_0002.txt", ""), ("exam_0003.txt", "12x")] {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            assert_eq!(l.load(&path).unwrap(), UNREADABLE_STUDENT, "body {body:?}");
        }
        let path = dir.path().join("exam_0004.txt");
        std::fs::write(&path, [0xff, 0xfe, b'7']).unwrap();
        assert_eq!(l.load(&path).unwrap(), UNREADABLE_STUDENT);
    }
}
