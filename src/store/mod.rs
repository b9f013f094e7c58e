//! External collaborators: where the rubric and the exams live.
//!
//! - [`RubricStore`]: loads and persists the shared answer key
//! - [`ExamLoader`]: resolves exam indices to files and reads student ids
//!
//! Both are traits so tests can substitute in-memory doubles; the file-backed
//! implementations are [`FsRubricStore`] and [`FsExamLoader`].

pub mod exam;
pub mod rubric;

pub use exam::{ExamLoader, FsExamLoader, StudentId, UNREADABLE_STUDENT};
pub use rubric::{Correction, FsRubricStore, Rubric, RubricStore};
