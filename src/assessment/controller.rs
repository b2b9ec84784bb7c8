//! Async driver around [`AssessmentEngine`].
//!
//! One task owns the engine and applies events in arrival order. User input
//! comes in through [`AssessmentController`] and waits for the engine's
//! verdict; timers, scenario fetches and submissions post their results back
//! into the same loop. Every timer is a child of the session's root token, so
//! leaving the session cancels whatever is still pending.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{mpsc, oneshot, watch, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    db::Database,
    error::{EngineError, EngineResult},
    models::{EmotionLabel, ResponseCategory, SessionContext, SubmissionRequest},
    reaction::{DelaySampler, UniformDelay},
    remote::{ScenarioProvider, SessionSubmitter},
    settings::AssessmentSettings,
};

use super::{
    engine::AssessmentEngine,
    events::{Effect, EngineEvent, Presenter},
    state::SessionSnapshot,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Collaborators a session needs besides its context and settings.
pub struct SessionServices {
    pub provider: Arc<dyn ScenarioProvider>,
    pub submitter: Arc<dyn SessionSubmitter>,
    pub presenter: Arc<dyn Presenter>,
    pub outbox: Option<Database>,
    pub sampler: Box<dyn DelaySampler>,
}

impl SessionServices {
    pub fn new(
        provider: Arc<dyn ScenarioProvider>,
        submitter: Arc<dyn SessionSubmitter>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            provider,
            submitter,
            presenter,
            outbox: None,
            sampler: Box::new(UniformDelay::from_entropy()),
        }
    }

    pub fn with_outbox(mut self, outbox: Database) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn with_sampler(mut self, sampler: Box<dyn DelaySampler>) -> Self {
        self.sampler = sampler;
        self
    }
}

struct Envelope {
    event: EngineEvent,
    reply: oneshot::Sender<EngineResult<()>>,
}

#[derive(Clone)]
pub struct AssessmentController {
    inbox: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<SessionSnapshot>,
    runtime: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AssessmentController {
    /// Spawns the session loop. Must be called from within a tokio runtime.
    pub fn start(
        context: SessionContext,
        settings: AssessmentSettings,
        services: SessionServices,
    ) -> Self {
        let SessionServices {
            provider,
            submitter,
            presenter,
            outbox,
            sampler,
        } = services;

        let engine = AssessmentEngine::new(context, settings, sampler);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        log_info!("Starting assessment session {}", engine.context().session_id);

        let runtime = SessionRuntime {
            engine,
            provider,
            submitter,
            presenter,
            outbox,
            internal_tx,
            root: CancellationToken::new(),
            timer: None,
            snapshots: snapshot_tx,
        };
        let handle = tokio::spawn(runtime.run(inbox_rx, internal_rx));

        Self {
            inbox: inbox_tx,
            snapshots: snapshot_rx,
            runtime: Arc::new(Mutex::new(Some(handle))),
        }
    }

    pub async fn begin(&self) -> EngineResult<()> {
        self.dispatch(EngineEvent::Begin, "begin").await
    }

    pub async fn start_trial(&self) -> EngineResult<()> {
        self.dispatch(EngineEvent::StartTrial, "start a trial").await
    }

    /// A tap during the randomized wait is presented as premature input and
    /// the same trial is rescheduled.
    pub async fn tap(&self) -> EngineResult<()> {
        self.dispatch(EngineEvent::Tap, "tap").await
    }

    pub async fn choose(&self, category: ResponseCategory) -> EngineResult<()> {
        self.dispatch(EngineEvent::Choose(category), "choose").await
    }

    pub async fn guess(&self, label: EmotionLabel) -> EngineResult<()> {
        self.dispatch(EngineEvent::Guess(label), "guess").await
    }

    pub async fn abandon(&self) -> EngineResult<()> {
        self.dispatch(EngineEvent::Abandon, "abandon").await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Resolves once the session reaches a terminal stage. Any clone may wait.
    pub async fn wait_until_finished(&self) -> SessionSnapshot {
        let mut snapshots = self.snapshots.clone();
        let finished = snapshots
            .wait_for(|snapshot| snapshot.stage.is_terminal())
            .await
            .map(|snapshot| snapshot.clone());

        let handle = self.runtime.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log_error!("Assessment session task failed: {err}");
            }
        }

        finished.unwrap_or_else(|_| self.snapshot())
    }

    async fn dispatch(&self, event: EngineEvent, action: &'static str) -> EngineResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let closed = || EngineError::invalid(self.snapshots.borrow().stage, action);

        self.inbox
            .send(Envelope {
                event,
                reply: reply_tx,
            })
            .map_err(|_| closed())?;

        reply_rx.await.map_err(|_| closed())?
    }
}

struct SessionRuntime {
    engine: AssessmentEngine,
    provider: Arc<dyn ScenarioProvider>,
    submitter: Arc<dyn SessionSubmitter>,
    presenter: Arc<dyn Presenter>,
    outbox: Option<Database>,
    internal_tx: mpsc::UnboundedSender<EngineEvent>,
    root: CancellationToken,
    timer: Option<CancellationToken>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionRuntime {
    async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<Envelope>,
        mut internal: mpsc::UnboundedReceiver<EngineEvent>,
    ) {
        let mut inbox_open = true;
        loop {
            tokio::select! {
                envelope = inbox.recv(), if inbox_open => match envelope {
                    Some(Envelope { event, reply }) => {
                        let result = self.apply(event).await;
                        let _ = reply.send(result);
                    }
                    None => {
                        // A session already finalizing still waits for its submission.
                        inbox_open = false;
                        if self.engine.stage().is_abandonable() {
                            log_warn!("All session handles dropped; abandoning");
                            if let Err(err) = self.apply(EngineEvent::Abandon).await {
                                log_error!("Failed to abandon orphaned session: {err}");
                            }
                        }
                    }
                },
                Some(event) = internal.recv() => {
                    if let Err(err) = self.apply(event).await {
                        log_debug!("Dropped internal event: {err}");
                    }
                }
            }

            if self.engine.stage().is_terminal() {
                break;
            }
        }

        self.root.cancel();
        log_info!(
            "Assessment session {} ended in {}",
            self.engine.context().session_id,
            self.engine.stage().as_str()
        );
    }

    async fn apply(&mut self, event: EngineEvent) -> EngineResult<()> {
        let now = time::Instant::now().into_std();
        // Snapshots are published after the effects run: a terminal snapshot
        // means the local save has already finished.
        let outcome = match self.engine.handle(event, now) {
            Ok(effects) => {
                for effect in effects {
                    self.perform(effect).await;
                }
                Ok(())
            }
            Err(err) => Err(err),
        };
        self.snapshots.send_replace(self.engine.snapshot());
        outcome
    }

    async fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule { after, event } => self.schedule(after, event),
            Effect::CancelTimers => self.cancel_timer(),
            Effect::FetchScenarios { context } => self.fetch_scenarios(context),
            Effect::Submit(request) => self.submit(*request),
            Effect::SaveLocally(request) => save_locally(self.outbox.clone(), &request).await,
            Effect::Present(event) => self.presenter.present(event),
        }
    }

    fn schedule(&mut self, after: Duration, event: EngineEvent) {
        self.cancel_timer();
        let token = self.root.child_token();
        self.timer = Some(token.clone());
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(after) => {
                    let _ = tx.send(event);
                }
            }
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }

    fn fetch_scenarios(&self, context: String) {
        let provider = Arc::clone(&self.provider);
        let limit = Duration::from_millis(self.engine.settings().decision.fetch_timeout_ms);
        let token = self.root.child_token();
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let fetched = tokio::select! {
                _ = token.cancelled() => return,
                fetched = time::timeout(limit, provider.fetch_scenarios(&context)) => fetched,
            };
            let fetched = fetched.unwrap_or_else(|_| {
                Err(EngineError::ContentUnavailable(format!(
                    "scenario request timed out after {}ms",
                    limit.as_millis()
                )))
            });
            let _ = tx.send(EngineEvent::ScenariosLoaded(fetched));
        });
    }

    fn submit(&self, request: SubmissionRequest) {
        let submitter = Arc::clone(&self.submitter);
        let limit = Duration::from_millis(self.engine.settings().remote.submit_timeout_ms);
        let token = self.root.child_token();
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let submitted = tokio::select! {
                _ = token.cancelled() => return,
                submitted = time::timeout(limit, submitter.submit(&request)) => submitted,
            };
            let submitted = submitted.unwrap_or_else(|_| {
                Err(EngineError::SubmissionFailure(format!(
                    "submission timed out after {}ms",
                    limit.as_millis()
                )))
            });
            let _ = tx.send(EngineEvent::SubmissionFinished(submitted));
        });
    }
}

async fn save_locally(outbox: Option<Database>, request: &SubmissionRequest) {
    let Some(outbox) = outbox else {
        log_warn!(
            "No outbox configured; record for session {} kept in memory only",
            request.session_id()
        );
        return;
    };
    match outbox.save_pending(request, Utc::now()).await {
        Ok(()) => log_info!("Session {} saved to the local outbox", request.session_id()),
        Err(err) => log_error!(
            "Failed to save session {} locally: {err:?}",
            request.session_id()
        ),
    }
}
