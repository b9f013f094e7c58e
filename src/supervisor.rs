use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{MarkerConfig, Variant};
use crate::error::{MarkerError, Result};
use crate::state::{JournalEntry, MetricsSnapshot, SharedState, StateSnapshot, StopFlag, UnsyncState};
use crate::store::{ExamLoader, FsExamLoader, FsRubricStore, Rubric, RubricStore};
use crate::worker::{Pacing, TeachingAssistant, UnsyncAssistant};

/// Outcome of one marking run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub variant: Variant,
    pub ta_count: usize,
    pub seed: u64,
    /// TAs whose task panicked instead of exiting.
    pub failed_tas: usize,
    #[serde(flatten)]
    pub state: StateSnapshot,
    pub metrics: MetricsSnapshot,
    /// Journal of the synchronized protocol; empty for the baseline.
    pub events: Vec<JournalEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn summary_line(&self) -> String {
        format!(
            "All TAs finished ({}): {} exams transitioned, last student {}, rubric {}",
            self.variant, self.metrics.transitions, self.state.student, self.state.rubric
        )
    }
}

/// Owns the shared state for a run: creates it, spawns the TAs, joins them
/// all, then drops it.
pub struct Supervisor {
    config: MarkerConfig,
    rubric_store: Arc<dyn RubricStore>,
    exams: Arc<dyn ExamLoader>,
    stop: StopFlag,
}

impl Supervisor {
    /// Supervisor backed by the rubric file and exam directory in `config`.
    pub fn new(config: MarkerConfig) -> Self {
        let rubric_store = Arc::new(FsRubricStore::new(
            config.rubric_path.clone(),
            config.questions,
        ));
        let exams = Arc::new(FsExamLoader::new(config.exams_dir.clone(), config.sequence));
        Self::with_stores(config, rubric_store, exams)
    }

    pub fn with_stores(
        config: MarkerConfig,
        rubric_store: Arc<dyn RubricStore>,
        exams: Arc<dyn ExamLoader>,
    ) -> Self {
        Self {
            config,
            rubric_store,
            exams,
            stop: StopFlag::new(),
        }
    }

    /// Handle on the run's stop flag, e.g. for a signal handler.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Run the whole marking session.
    ///
    /// 1. Validates the configuration
    /// 2. Loads the rubric and the first exam into fresh shared state
    /// 3. Spawns one task per TA
    /// 4. Joins every TA, then releases the shared state
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: bad configuration, an unreadable
    /// rubric, or a rubric that does not match the question count. Problems
    /// inside a TA end in termination or stale state, never in an error here.
    pub async fn run(self) -> Result<RunSummary> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let rubric = self.rubric_store.load()?;

        tracing::info!(
            %run_id,
            variant = %self.config.variant,
            tas = self.config.ta_count,
            seed,
            rubric = %rubric,
            "Starting marking run"
        );

        let (state, metrics, events, failed_tas) = match self.config.variant {
            Variant::Synchronized => self.run_synchronized(rubric, seed).await?,
            Variant::Unsynchronized => self.run_unsynchronized(rubric, seed).await?,
        };

        let summary = RunSummary {
            run_id,
            variant: self.config.variant,
            ta_count: self.config.ta_count,
            seed,
            failed_tas,
            state,
            metrics,
            events,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            %run_id,
            exam_index = summary.state.exam_index,
            transitions = summary.metrics.transitions,
            double_claims = summary.metrics.double_claims,
            lost_updates = summary.metrics.lost_updates,
            lost_transitions = summary.metrics.lost_transitions,
            "Marking run finished"
        );
        Ok(summary)
    }

    async fn run_synchronized(
        &self,
        rubric: Rubric,
        seed: u64,
    ) -> Result<(StateSnapshot, MetricsSnapshot, Vec<JournalEntry>, usize)> {
        let state = Arc::new(SharedState::initialize(
            rubric,
            self.exams.as_ref(),
            self.config.questions,
            self.stop.clone(),
        )?);

        let handles = (1..=self.config.ta_count)
            .map(|id| {
                let ta = TeachingAssistant::new(
                    id,
                    state.clone(),
                    self.rubric_store.clone(),
                    self.exams.clone(),
                    Pacing::seeded(self.config.pacing, Pacing::seed_for(seed, id)),
                );
                (id, tokio::spawn(ta.run()))
            })
            .collect();
        let failed = join_all(handles).await;

        let snapshot = state.snapshot().await;
        let metrics = state.metrics().snapshot();
        let events = state.journal().await;
        drop(state);
        Ok((snapshot, metrics, events, failed))
    }

    async fn run_unsynchronized(
        &self,
        rubric: Rubric,
        seed: u64,
    ) -> Result<(StateSnapshot, MetricsSnapshot, Vec<JournalEntry>, usize)> {
        let state = Arc::new(UnsyncState::initialize(
            rubric,
            self.exams.as_ref(),
            self.config.questions,
            self.stop.clone(),
        )?);

        let handles = (1..=self.config.ta_count)
            .map(|id| {
                let ta = UnsyncAssistant::new(
                    id,
                    state.clone(),
                    self.rubric_store.clone(),
                    self.exams.clone(),
                    Pacing::seeded(self.config.pacing, Pacing::seed_for(seed, id)),
                );
                (id, tokio::spawn(ta.run()))
            })
            .collect();
        let failed = join_all(handles).await;

        let snapshot = state.snapshot();
        let metrics = state.metrics().snapshot();
        drop(state);
        Ok((snapshot, metrics, Vec::new(), failed))
    }
}

/// Wait for every TA. A panicked TA is logged and counted, and the rest are
/// still joined.
async fn join_all(handles: Vec<(usize, JoinHandle<()>)>) -> usize {
    let mut failed = 0;
    for (id, handle) in handles {
        if let Err(e) = handle.await {
            failed += 1;
            let error = MarkerError::Worker(format!("TA {}: {}", id, e));
            tracing::error!(ta = id, error = %error, "TA did not exit cleanly");
        }
    }
    failed
}
