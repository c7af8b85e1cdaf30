use backend::{AnalysisBackend, BackendError, StatsStore};
use chrono::{DateTime, Utc};
use common::config::AppConfig;
use common::models::{AuthSession, ImagePayload, ParsedAnalysis, TradeOutcome, TradingStats};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AnalysisError, ErrorCategory, OutcomeError, PreconditionError};
use crate::progress::{ProgressCurve, ProgressTicker};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Validating,
    Requesting,
    Parsing,
    Complete,
    Error {
        category: ErrorCategory,
        message: String,
    },
}

impl AnalysisState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Requesting | Self::Parsing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    pub progress_tick: Duration,
    pub progress_ceiling: f64,
    pub progress_rate: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let curve = ProgressCurve::default();
        Self {
            progress_tick: curve.tick,
            progress_ceiling: curve.ceiling,
            progress_rate: curve.rate,
        }
    }
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            progress_tick: config.progress_tick,
            progress_ceiling: config.progress_ceiling,
            ..Self::default()
        }
    }
}

impl OrchestratorConfig {
    fn curve(&self) -> ProgressCurve {
        ProgressCurve {
            tick: self.progress_tick,
            ceiling: self.progress_ceiling,
            rate: self.progress_rate,
        }
    }
}

/// A parsed analysis that became current, plus the outcome the user marked on it.
#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub parsed: ParsedAnalysis,
    pub outcome: Option<TradeOutcome>,
}

impl CompletedAnalysis {
    fn new(parsed: ParsedAnalysis) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            parsed,
            outcome: None,
        }
    }
}

/// Drives one chart image through the backend and keeps the result current.
///
/// State and progress are published on watch channels so a front end can follow
/// the request without polling. Only one request runs at a time.
pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    stats: Arc<dyn StatsStore>,
    config: OrchestratorConfig,
    state: watch::Sender<AnalysisState>,
    progress: Arc<watch::Sender<f64>>,
    image: RwLock<Option<ImagePayload>>,
    current: RwLock<Option<CompletedAnalysis>>,
    // Bumped by `clear`; work started under an older value is discarded.
    epoch: Arc<AtomicU64>,
}

/// Resets the published state if an analysis future is dropped mid-flight.
struct InFlight<'a> {
    orchestrator: &'a AnalysisOrchestrator,
    epoch: u64,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.orchestrator.transition(self.epoch, AnalysisState::Idle) {
            warn!("Analysis abandoned before completion, resetting to idle");
            self.orchestrator.set_progress(self.epoch, 0.0);
        }
    }
}

impl AnalysisOrchestrator {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        stats: Arc<dyn StatsStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let (state, _) = watch::channel(AnalysisState::Idle);
        let (progress, _) = watch::channel(0.0);

        Self {
            backend,
            stats,
            config,
            state,
            progress: Arc::new(progress),
            image: RwLock::new(None),
            current: RwLock::new(None),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state.borrow().clone()
    }

    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AnalysisState> {
        self.state.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub async fn current(&self) -> Option<CompletedAnalysis> {
        self.current.read().await.clone()
    }

    pub async fn has_image(&self) -> bool {
        self.image.read().await.is_some()
    }

    /// Stores a new upload or paste. The previous result and its outcome are dropped.
    pub async fn set_image(&self, image: ImagePayload) -> Result<(), AnalysisError> {
        if self.state.borrow().is_busy() {
            return Err(AnalysisError::Busy);
        }
        image.validate().map_err(BackendError::from)?;

        info!("Image set ({}, ~{} bytes)", image.format(), image.estimated_size());
        *self.image.write().await = Some(image);
        *self.current.write().await = None;
        self.progress.send_replace(0.0);
        self.state.send_replace(AnalysisState::Idle);
        Ok(())
    }

    /// Analyzes the stored image.
    ///
    /// Precondition failures and backend failures both end in `AnalysisState::Error`
    /// with a categorized user message; nothing is retried. A `clear` issued while the
    /// request runs wins: nothing from this request is published afterwards and the
    /// call returns `AnalysisError::Cleared`.
    pub async fn analyze(&self, auth: Option<&AuthSession>) -> Result<CompletedAnalysis, AnalysisError> {
        let mut epoch = 0;
        let started = self.state.send_if_modified(|state| {
            if state.is_busy() {
                false
            } else {
                epoch = self.epoch.load(Ordering::SeqCst);
                *state = AnalysisState::Validating;
                true
            }
        });
        if !started {
            warn!("Analysis requested while another one is running");
            return Err(AnalysisError::Busy);
        }

        let mut guard = InFlight {
            orchestrator: self,
            epoch,
            armed: true,
        };

        let result = self.run(auth, epoch).await;
        guard.disarm();

        let published = match &result {
            Ok(_) => self.transition(epoch, AnalysisState::Complete),
            Err(AnalysisError::Cleared) => false,
            Err(err) => self.fail(err, epoch),
        };
        if !published {
            info!("Analysis finished after a clear, result discarded");
            return Err(AnalysisError::Cleared);
        }
        self.set_progress(epoch, 0.0);

        if let Ok(completed) = &result {
            info!(
                "Analysis {} complete: {} at {}%",
                completed.id, completed.parsed.signal, completed.parsed.confidence
            );
        }
        result
    }

    /// Runs the stored image through the backend again.
    pub async fn reanalyze(&self, auth: Option<&AuthSession>) -> Result<CompletedAnalysis, AnalysisError> {
        info!("Re-analyzing stored image");
        self.analyze(auth).await
    }

    async fn run(&self, auth: Option<&AuthSession>, epoch: u64) -> Result<CompletedAnalysis, AnalysisError> {
        let auth = auth.ok_or(PreconditionError::NotAuthenticated)?;
        let image = self
            .image
            .read()
            .await
            .clone()
            .ok_or(PreconditionError::NoImage)?;

        if !self.store_current(epoch, None).await
            || !self.transition(epoch, AnalysisState::Requesting)
            || !self.set_progress(epoch, 0.0)
        {
            return Err(AnalysisError::Cleared);
        }

        let ticker = ProgressTicker::start(
            self.progress.clone(),
            self.config.curve(),
            self.epoch.clone(),
            epoch,
        );
        let response = self.backend.analyze(&image, auth).await;
        ticker.stop();

        let remote = match response {
            Ok(remote) => remote,
            Err(_) if self.is_stale(epoch) => return Err(AnalysisError::Cleared),
            Err(err) => return Err(err.into()),
        };

        if !self.set_progress(epoch, 100.0) || !self.transition(epoch, AnalysisState::Parsing) {
            return Err(AnalysisError::Cleared);
        }

        let completed = CompletedAnalysis::new(parser::parse_response(&remote));
        if !self.store_current(epoch, Some(completed.clone())).await {
            return Err(AnalysisError::Cleared);
        }
        Ok(completed)
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) != epoch
    }

    /// Publishes `next` unless a clear happened since `epoch`.
    ///
    /// `clear` bumps the epoch inside the state channel's own lock, so a transition
    /// either lands before the clear (and is overwritten by it) or is refused.
    fn transition(&self, epoch: u64, next: AnalysisState) -> bool {
        self.state.send_if_modified(|state| {
            if self.is_stale(epoch) {
                return false;
            }
            *state = next;
            true
        })
    }

    fn set_progress(&self, epoch: u64, value: f64) -> bool {
        self.progress.send_if_modified(|progress| {
            if self.is_stale(epoch) {
                return false;
            }
            *progress = value;
            true
        })
    }

    async fn store_current(&self, epoch: u64, value: Option<CompletedAnalysis>) -> bool {
        let mut current = self.current.write().await;
        if self.is_stale(epoch) {
            return false;
        }
        *current = value;
        true
    }

    /// Publishes the error state for `err`; false when a clear got there first.
    fn fail(&self, err: &AnalysisError, epoch: u64) -> bool {
        let category = err.category();
        let published = self.transition(
            epoch,
            AnalysisState::Error {
                category,
                message: err.user_message().to_string(),
            },
        );
        if published {
            error!("Analysis failed ({category:?}): {err}");
        }
        published
    }

    /// Discards image, result, outcome and progress. An in-flight request is left to
    /// finish but its result is thrown away.
    pub async fn clear(&self) {
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = AnalysisState::Idle;
        });
        self.progress.send_replace(0.0);
        *self.image.write().await = None;
        *self.current.write().await = None;
        info!("Analyzer cleared");
    }

    /// Marks the current analysis as a win or a loss and reports it to the
    /// statistics store.
    ///
    /// The mark is kept even when the store call fails, so an analysis can only ever
    /// be counted once.
    pub async fn mark_outcome(
        &self,
        auth: &AuthSession,
        outcome: TradeOutcome,
    ) -> Result<TradingStats, OutcomeError> {
        {
            let mut current = self.current.write().await;
            let analysis = current.as_mut().ok_or(OutcomeError::NoAnalysis)?;
            if let Some(existing) = analysis.outcome {
                return Err(OutcomeError::AlreadyMarked(existing));
            }
            analysis.outcome = Some(outcome);
            info!("Analysis {} marked as {}", analysis.id, outcome);
        }

        self.stats
            .record_outcome(auth, outcome)
            .await
            .map_err(|err| {
                error!("Failed to record {outcome}: {err}");
                OutcomeError::Stats(err)
            })
    }

    pub async fn load_stats(&self, auth: &AuthSession) -> Result<TradingStats, BackendError> {
        self.stats.load_stats(auth).await
    }
}
