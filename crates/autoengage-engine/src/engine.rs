//! The engine actor and its public handle.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use autoengage_protocols::{
    ActionError, ActionRequest, ActuatorOutcome, ErrorCode, ExportFormat, ExportPayload, Notifier,
    PageActuator, StartRequest, TabController, TabId,
};
use autoengage_state::{AutomationState, StateStore};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::{ControlRequest, EngineEvent};
use crate::export;
use crate::timer::TimerService;
use crate::transition::{self, Command, VolatileFlags};

/// Cloneable front door to a running engine.
///
/// Everything funnels through the one event channel, so control requests,
/// tab signals, and actuator outcomes are serialized with the rest of the
/// loop.
#[derive(Clone)]
pub struct EngineHandle {
    events: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    async fn send(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.events
            .send(event)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Begin a fresh run.
    pub async fn start(&self, request: StartRequest) -> Result<(), EngineError> {
        self.send(EngineEvent::Control(ControlRequest::Start(request)))
            .await
    }

    /// Abort the run and reset to idle.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Control(ControlRequest::Stop)).await
    }

    /// Suspend the run at the current URL.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Control(ControlRequest::Pause)).await
    }

    /// Continue a paused run.
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Control(ControlRequest::Resume))
            .await
    }

    /// Snapshot the full engine state.
    pub async fn status(&self) -> Result<AutomationState, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::Control(ControlRequest::GetStatus {
            reply: tx,
        }))
        .await?;
        rx.await.map_err(|_| EngineError::ReplyDropped)
    }

    /// Render the activity log in the requested format.
    pub async fn export_logs(&self, format: ExportFormat) -> Result<String, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::Control(ControlRequest::ExportLogs {
            format,
            reply: tx,
        }))
        .await?;
        rx.await.map_err(|_| EngineError::ReplyDropped)
    }

    /// Feed a tab-load signal from the driver.
    pub async fn tab_loaded(&self, tab_id: TabId) -> Result<(), EngineError> {
        self.send(EngineEvent::TabLoaded { tab_id }).await
    }

    /// Feed an external tab closure from the driver.
    pub async fn tab_removed(&self, tab_id: TabId) -> Result<(), EngineError> {
        self.send(EngineEvent::TabRemoved { tab_id }).await
    }

    /// Feed an actuator outcome produced outside the engine's own dispatch.
    pub async fn post_processed(
        &self,
        index: usize,
        outcome: ActuatorOutcome,
    ) -> Result<(), EngineError> {
        self.send(EngineEvent::PostProcessed { index, outcome })
            .await
    }

    /// Drain and terminate the actor.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Shutdown).await
    }
}

/// The single-actor automation engine.
///
/// Owns the in-memory state snapshot; persists it after every mutating
/// transition, then executes the returned commands. Navigation failures
/// and actuator outcomes re-enter the loop as events rather than being
/// handled inline, so the loop never blocks on a page.
pub struct AutomationEngine {
    state: AutomationState,
    volatile: VolatileFlags,
    config: EngineConfig,
    store: Arc<dyn StateStore>,
    tabs: Arc<dyn TabController>,
    actuator: Arc<dyn PageActuator>,
    notifier: Arc<dyn Notifier>,
    timers: TimerService,
    events: mpsc::Receiver<EngineEvent>,
    self_sender: mpsc::Sender<EngineEvent>,
}

impl AutomationEngine {
    /// Build the actor and its handle.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn StateStore>,
        tabs: Arc<dyn TabController>,
        actuator: Arc<dyn PageActuator>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(config.event_capacity);
        let engine = Self {
            state: AutomationState::idle(),
            volatile: VolatileFlags::default(),
            timers: TimerService::new(tx.clone()),
            self_sender: tx.clone(),
            events: rx,
            config,
            store,
            tabs,
            actuator,
            notifier,
        };
        (engine, EngineHandle { events: tx })
    }

    /// Spawn the actor onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Recover persisted state, then consume events until shutdown.
    pub async fn run(mut self) {
        self.recover().await;

        while let Some(event) = self.events.recv().await {
            match event {
                EngineEvent::Shutdown => {
                    info!("Engine shutting down");
                    self.timers.cancel_all();
                    break;
                }
                EngineEvent::Control(ControlRequest::GetStatus { reply }) => {
                    let _ = reply.send(self.state.clone());
                }
                EngineEvent::Control(ControlRequest::ExportLogs { format, reply }) => {
                    let payload = ExportPayload {
                        statistics: self.state.statistics,
                        logs: self.state.activity_log.to_vec(),
                    };
                    let _ = reply.send(export::render(format, &payload, Utc::now()));
                }
                event => self.dispatch(event).await,
            }
        }
    }

    /// Re-seed the working state from the store and rebuild timers.
    async fn recover(&mut self) {
        match self.store.load().await {
            Ok(Some(state)) => {
                info!(
                    "Recovered persisted state (phase {}, cursor {}/{})",
                    state.phase,
                    state.current_index,
                    state.urls.len()
                );
                self.state = state;
            }
            Ok(None) => debug!("No persisted state; starting idle"),
            Err(e) => error!("Failed to load persisted state, starting idle: {e}"),
        }

        let commands = transition::on_recover(
            &mut self.state,
            &mut self.volatile,
            &self.config,
            Utc::now(),
        );
        self.persist().await;
        self.execute(commands).await;
    }

    /// Run one mutating event through its transition, persist, execute.
    async fn dispatch(&mut self, event: EngineEvent) {
        let now = Utc::now();
        let commands = match event {
            EngineEvent::Control(ControlRequest::Start(request)) => transition::on_start(
                &mut self.state,
                &mut self.volatile,
                &self.config,
                now,
                request,
            ),
            EngineEvent::Control(ControlRequest::Stop) => transition::on_stop(&mut self.state, now),
            EngineEvent::Control(ControlRequest::Pause) => transition::on_pause(&mut self.state),
            EngineEvent::Control(ControlRequest::Resume) => {
                transition::on_resume(&mut self.state, &mut self.volatile, &self.config, now)
            }
            EngineEvent::TabLoaded { tab_id } => {
                transition::on_tab_loaded(&mut self.state, &self.volatile, &self.config, tab_id)
            }
            EngineEvent::TabRemoved { tab_id } => {
                transition::on_tab_removed(&mut self.state, tab_id)
            }
            EngineEvent::SettleElapsed { index, tab_id } => {
                transition::on_settle_elapsed(&mut self.state, &mut self.volatile, index, tab_id)
            }
            EngineEvent::WatchdogFired { index } => transition::on_watchdog_fired(
                &mut self.state,
                &mut self.volatile,
                &self.config,
                now,
                index,
            ),
            EngineEvent::AdvanceDue { index } => transition::on_advance_due(
                &mut self.state,
                &mut self.volatile,
                &self.config,
                now,
                index,
            ),
            EngineEvent::PostProcessed { index, outcome } => transition::on_post_processed(
                &mut self.state,
                &mut self.volatile,
                &self.config,
                now,
                index,
                outcome,
            ),
            EngineEvent::UrlFailed { index, error } => transition::on_url_failed(
                &mut self.state,
                &mut self.volatile,
                &self.config,
                now,
                index,
                error,
            ),
            // Shutdown and read-only control are handled by the run loop.
            _ => return,
        };

        self.persist().await;
        self.execute(commands).await;
    }

    /// Save the snapshot; a failed save is logged, not fatal to the run.
    async fn persist(&self) {
        if let Err(e) = self.store.save(&self.state).await {
            error!("Failed to persist automation state: {e}");
        }
    }

    async fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Navigate { index, url } => self.navigate(index, url).await,
                Command::CloseTab { tab_id } => {
                    if let Err(e) = self.tabs.close(tab_id).await {
                        debug!("Closing tab {} failed: {e}", tab_id);
                    }
                }
                Command::Dispatch { index, tab_id } => self.dispatch_actuator(index, tab_id),
                Command::Arm { delay, event } => self.timers.arm(delay, event),
                Command::Cancel { class } => self.timers.cancel(class),
                Command::CancelAllTimers => self.timers.cancel_all(),
                Command::Notify(notification) => self.notifier.notify(notification).await,
                Command::SetIndicator(text) => self.notifier.set_indicator(text).await,
            }
        }
    }

    /// Point the owned tab at `url`, opening a fresh one when there is no
    /// tab yet or the old handle is dead.
    async fn navigate(&mut self, index: usize, url: String) {
        if let Some(tab_id) = self.state.tab_id {
            match self.tabs.navigate(tab_id, &url).await {
                Ok(()) => return,
                Err(e) => {
                    debug!("Navigate on tab {} failed ({e}); opening a fresh tab", tab_id);
                }
            }
        }

        match self.tabs.open(&url).await {
            Ok(tab_id) => {
                self.state.tab_id = Some(tab_id);
                self.persist().await;
            }
            Err(e) => {
                warn!("Could not open a tab for {url}: {e}");
                let error = ActionError::new(ErrorCode::TabClosed, e.to_string());
                // try_send: awaiting our own full channel here would wedge
                // the loop; the watchdog covers a dropped event.
                if let Err(e) = self
                    .self_sender
                    .try_send(EngineEvent::UrlFailed { index, error })
                {
                    warn!("Dropped navigation failure event: {e}");
                }
            }
        }
    }

    /// Run the actuator in a spawned task; its outcome re-enters the loop.
    fn dispatch_actuator(&self, index: usize, tab_id: TabId) {
        let request = ActionRequest {
            url: self.state.current_url().unwrap_or_default().to_string(),
            comment: self.state.settings.comment.clone(),
            dry_run: self.state.settings.dry_run,
            enable_like: self.state.settings.enable_like,
            enable_comment: self.state.settings.enable_comment,
            index,
        };
        let actuator = self.actuator.clone();
        let events = self.self_sender.clone();
        tokio::spawn(async move {
            let event = match actuator.process(tab_id, request).await {
                Ok(outcome) => EngineEvent::PostProcessed { index, outcome },
                Err(e) => EngineEvent::UrlFailed {
                    index,
                    error: ActionError::new(ErrorCode::ContentScriptError, e.to_string()),
                },
            };
            let _ = events.send(event).await;
        });
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
