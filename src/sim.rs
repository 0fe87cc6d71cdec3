//! Simulated collaborators backing the `run` subcommand.
//!
//! Stand-ins for a real browser: the tab controller fabricates tab handles
//! and emits load signals after a configurable latency, and the actuator
//! gates actions against a deterministic page observation derived from the
//! queue position instead of a live DOM.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use autoengage_engine::EngineHandle;
use autoengage_protocols::{
    ActionError, ActionPlan, ActionRequest, ActuatorError, ActuatorOutcome, EngineNotification,
    ErrorCode, Notifier, PageActuator, PageObservation, Summary, TabController, TabError, TabId,
};

use crate::config::SimulatorConfig;

/// Tab controller that fabricates tabs and load signals.
pub struct SimTabController {
    next_id: AtomicU64,
    load_delay: Duration,
    handle: OnceLock<EngineHandle>,
}

impl SimTabController {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            load_delay: Duration::from_millis(config.load_delay_ms),
            handle: OnceLock::new(),
        }
    }

    /// Wire the engine handle so load signals can be delivered.
    ///
    /// Must be called before the first `open`.
    pub fn attach(&self, handle: EngineHandle) {
        let _ = self.handle.set(handle);
    }

    fn emit_load(&self, tab: TabId) {
        let Some(handle) = self.handle.get().cloned() else {
            warn!(%tab, "no engine handle attached, dropping load signal");
            return;
        };
        let delay = self.load_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if handle.tab_loaded(tab).await.is_err() {
                debug!(%tab, "engine gone before load signal");
            }
        });
    }
}

#[async_trait]
impl TabController for SimTabController {
    async fn open(&self, url: &str) -> Result<TabId, TabError> {
        let tab = TabId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%tab, url, "opening simulated tab");
        self.emit_load(tab);
        Ok(tab)
    }

    async fn navigate(&self, tab: TabId, url: &str) -> Result<(), TabError> {
        debug!(%tab, url, "navigating simulated tab");
        self.emit_load(tab);
        Ok(())
    }

    async fn close(&self, tab: TabId) -> Result<(), TabError> {
        debug!(%tab, "closing simulated tab");
        Ok(())
    }
}

/// Actuator that gates actions against a fabricated page observation.
///
/// The observation is derived from the 1-based queue position, so runs are
/// reproducible: every Nth URL can present as already liked, already
/// commented, or failing on its first attempt.
pub struct SimPageActuator {
    config: SimulatorConfig,
    attempts: Mutex<HashMap<usize, u32>>,
}

impl SimPageActuator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn every(n: usize, position: usize) -> bool {
        n > 0 && position % n == 0
    }

    fn observe(&self, position: usize) -> PageObservation {
        PageObservation {
            is_liked: Self::every(self.config.already_liked_every, position),
            has_commented: Self::every(self.config.already_commented_every, position),
        }
    }
}

#[async_trait]
impl PageActuator for SimPageActuator {
    async fn process(
        &self,
        tab: TabId,
        request: ActionRequest,
    ) -> Result<ActuatorOutcome, ActuatorError> {
        tokio::time::sleep(Duration::from_millis(self.config.action_delay_ms)).await;

        let position = request.index + 1;
        let attempt = {
            let mut attempts = self.attempts.lock();
            let counter = attempts.entry(request.index).or_insert(0);
            *counter += 1;
            *counter
        };

        if attempt == 1 && Self::every(self.config.fail_first_attempt_every, position) {
            debug!(%tab, url = %request.url, "injecting first-attempt failure");
            return Ok(ActuatorOutcome::failure(
                ActionError::new(ErrorCode::DomNotFound, "like button not found"),
                false,
                false,
            ));
        }

        let observation = self.observe(position);
        match ActionPlan::decide(request.enable_like, request.enable_comment, observation) {
            ActionPlan::Skip(reason) => {
                debug!(%tab, url = %request.url, %reason, "skipping page");
                Ok(ActuatorOutcome::skipped(
                    reason,
                    observation.is_liked,
                    observation.has_commented,
                ))
            }
            ActionPlan::Perform {
                attempt_like,
                attempt_comment,
            } => {
                let liked = observation.is_liked || attempt_like;
                let commented = observation.has_commented || attempt_comment;
                if request.dry_run {
                    debug!(%tab, url = %request.url, liked, commented, "dry-run, leaving the page untouched");
                    Ok(ActuatorOutcome::simulated(liked, commented))
                } else {
                    debug!(%tab, url = %request.url, liked, commented, "applying actions");
                    Ok(ActuatorOutcome::success(liked, commented))
                }
            }
        }
    }
}

/// Prints engine activity to the terminal and flags run completion.
pub struct CliNotifier {
    completed: mpsc::UnboundedSender<Summary>,
}

impl CliNotifier {
    /// Returns the notifier and the channel carrying the final summary.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Summary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { completed: tx }, rx)
    }
}

#[async_trait]
impl Notifier for CliNotifier {
    async fn notify(&self, notification: EngineNotification) {
        match notification {
            EngineNotification::Log { entry } => {
                println!("[{:>7}] {}", entry.kind.to_string(), entry.message);
            }
            EngineNotification::Completed { summary } => {
                let _ = self.completed.send(summary);
            }
            EngineNotification::Progress { index, status, .. } => {
                debug!(index, phase = %status.phase, "url finished");
            }
            other => debug!(?other, "engine notification"),
        }
    }

    async fn set_indicator(&self, text: Option<String>) {
        debug!(?text, "indicator");
    }
}
