use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{MarkerError, Result};

/// Replacement for answers outside the printable range.
pub const DEFAULT_ANSWER: u8 = b'A';
const FIRST_PRINTABLE: u8 = b' ';
/// `~`, the last printable ASCII code point.
const LAST_PRINTABLE: u8 = b'~';

/// Force an answer into printable ASCII.
pub fn sanitize_answer(answer: u8) -> u8 {
    if (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&answer) {
        answer
    } else {
        DEFAULT_ANSWER
    }
}

/// The correction rule: step forward one code point, wrapping from `~` back
/// to `A` (not to the start of the printable range).
pub fn next_answer(answer: u8) -> u8 {
    if answer >= LAST_PRINTABLE {
        DEFAULT_ANSWER
    } else {
        answer + 1
    }
}

/// One applied correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub question: usize,
    pub from: char,
    pub to: char,
}

/// Per-question answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    answers: Vec<u8>,
}

impl Rubric {
    pub fn new(answers: impl IntoIterator<Item = u8>) -> Self {
        Self {
            answers: answers.into_iter().map(sanitize_answer).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Apply the correction rule to one question. Returns `None` if the
    /// question is out of range.
    pub fn correct(&mut self, question: usize) -> Option<Correction> {
        let slot = self.answers.get_mut(question)?;
        let from = *slot;
        *slot = next_answer(from);
        Some(Correction {
            question,
            from: from as char,
            to: *slot as char,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.answers
    }

    /// Render in the persisted `index, answer` layout.
    pub fn to_records(&self) -> String {
        let mut out = String::with_capacity(self.answers.len() * 5);
        for (i, &answer) in self.answers.iter().enumerate() {
            let _ = writeln!(out, "{}, {}", i + 1, answer as char);
        }
        out
    }

    /// Parse the persisted layout, expecting exactly `questions` records.
    ///
    /// Records are positional: the leading index is not checked. Missing
    /// records and answers outside printable ASCII become [`DEFAULT_ANSWER`].
    pub fn from_records(text: &str, questions: usize) -> Self {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let answers = (0..questions).map(|question| {
            let Some(line) = lines.next() else {
                tracing::warn!(question = question + 1, "Rubric record missing, using default");
                return DEFAULT_ANSWER;
            };
            match parse_record(line) {
                Some(answer) => sanitize_answer(answer),
                None => {
                    tracing::warn!(question = question + 1, line, "Malformed rubric record, using default");
                    DEFAULT_ANSWER
                }
            }
        });
        Self::new(answers.collect::<Vec<_>>())
    }
}

impl std::fmt::Display for Rubric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &answer in &self.answers {
            write!(f, "{}", answer as char)?;
        }
        Ok(())
    }
}

fn parse_record(line: &str) -> Option<u8> {
    let (_, rest) = line.split_once(',')?;
    let answer = rest.trim_start().chars().next()?;
    // Non-ASCII answers map to a byte outside the printable range.
    Some(u8::try_from(answer).unwrap_or(0))
}

/// Persistence for the shared rubric.
pub trait RubricStore: Send + Sync {
    fn load(&self) -> Result<Rubric>;

    /// Rewrite the whole rubric. Called after every correction.
    fn save(&self, rubric: &Rubric) -> Result<()>;
}

/// Rubric stored as a plain text file, one `index, answer` line per question.
#[derive(Debug, Clone)]
pub struct FsRubricStore {
    path: PathBuf,
    questions: usize,
}

impl FsRubricStore {
    pub fn new(path: impl Into<PathBuf>, questions: usize) -> Self {
        Self {
            path: path.into(),
            questions,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RubricStore for FsRubricStore {
    fn load(&self) -> Result<Rubric> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            MarkerError::RubricLoad {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(Rubric::from_records(&text, self.questions))
    }

    fn save(&self, rubric: &Rubric) -> Result<()> {
        std::fs::write(&self.path, rubric.to_records()).map_err(|source| {
            MarkerError::RubricSave {
                path: self.path.clone(),
                source,
            }
        })
    }
}
