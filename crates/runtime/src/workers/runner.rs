//! Session runner that owns one session's [`RunnerState`] end to end.
//!
//! The runner drives the session's [`GameRules`] on a fixed cadence from a
//! dedicated task, ingests buffered input, and publishes state summaries at a
//! rate decoupled from the tick rate. Whatever way the loop exits (outcome,
//! rule failure, stop request), the session is finalized exactly once: one
//! last `game_state` broadcast and one `ended` status write.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{Instrument, debug, error, info, info_span, warn};

use game_core::{
    ActorId, GameRules, InputDelta, RulesError, RunStatus, RunnerState, StateSummary,
};

use super::input::InputBuffer;
use super::metrics::{MetricsSnapshot, TickMetrics};
use crate::catalog::{ReadySession, SessionCatalog, SessionId, SessionStatus, bounded};
use crate::config::RunnerConfig;
use crate::events::{Broadcast, BroadcastGateway};

/// Handle to the runner of one session.
///
/// Cloning is cheap; every clone controls the same runner.
#[derive(Clone)]
pub struct SessionRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    id: SessionId,
    name: String,
    group: String,
    config: RunnerConfig,
    input: InputBuffer,
    catalog: Arc<dyn SessionCatalog>,
    gateway: Arc<dyn BroadcastGateway>,
    metrics: Arc<TickMetrics>,
    /// Taken by the tick task on start.
    rules: Mutex<Option<Box<dyn GameRules>>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    stop_tx: watch::Sender<bool>,
    started: AtomicBool,
    running: AtomicBool,
    stop_requested: AtomicBool,
    /// Set once the final broadcast is out. Every publish holds this lock.
    finalized: Mutex<bool>,
    last_summary: Mutex<Option<StateSummary>>,
}

impl SessionRunner {
    pub fn new(
        session: &ReadySession,
        rules: Box<dyn GameRules>,
        config: RunnerConfig,
        catalog: Arc<dyn SessionCatalog>,
        gateway: Arc<dyn BroadcastGateway>,
    ) -> Self {
        let (stop_tx, _stop_rx) = watch::channel(false);

        Self {
            inner: Arc::new(RunnerInner {
                id: session.id,
                name: session.name.clone(),
                group: session.id.group_name(),
                config,
                input: InputBuffer::new(),
                catalog,
                gateway,
                metrics: Arc::new(TickMetrics::new()),
                rules: Mutex::new(Some(rules)),
                task: tokio::sync::Mutex::new(None),
                stop_tx,
                started: AtomicBool::new(false),
                running: AtomicBool::new(false),
                stop_requested: AtomicBool::new(false),
                finalized: Mutex::new(false),
                last_summary: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Broadcast group of this session.
    pub fn group(&self) -> &str {
        &self.inner.group
    }

    /// True from `start` until the tick task exits or `stop` returns.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Writes `ongoing` and spawns the tick task.
    ///
    /// Starting twice, or after `stop`, only logs a warning.
    pub async fn start(&self) {
        let inner = &self.inner;
        let mut task = inner.task.lock().await;

        if inner.stop_requested.load(Ordering::Acquire) {
            warn!(target: "runtime::runner", session = %inner.id, "start requested after stop, ignoring");
            return;
        }
        if inner.started.swap(true, Ordering::AcqRel) {
            warn!(target: "runtime::runner", session = %inner.id, "runner already started");
            return;
        }

        let rules = inner
            .rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(rules) = rules else {
            error!(target: "runtime::runner", session = %inner.id, "runner has no rules to drive");
            return;
        };

        inner.write_status(SessionStatus::Ongoing).await;
        inner.running.store(true, Ordering::Release);

        let span = info_span!("session", id = %inner.id, game = rules.name());
        let stop_rx = inner.stop_tx.subscribe();
        let loop_inner = Arc::clone(inner);
        *task = Some(tokio::spawn(
            async move { loop_inner.run(rules, stop_rx).await }.instrument(span),
        ));

        info!(target: "runtime::runner", session = %inner.id, name = %inner.name, "runner started");
    }

    /// Stops the runner and finalizes the session.
    ///
    /// Idempotent and callable from any task. Waits up to the configured stop
    /// timeout for the tick task; the session is finalized whether or not the
    /// task finished in time.
    pub async fn stop(&self) {
        let inner = &self.inner;
        if inner.stop_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        inner.stop_tx.send_replace(true);

        let handle = inner.task.lock().await.take();
        let Some(mut handle) = handle else {
            debug!(target: "runtime::runner", session = %inner.id, "stopping a runner that never started");
            inner.running.store(false, Ordering::Release);
            return;
        };

        let status = match timeout(inner.config.stop_timeout, &mut handle).await {
            Ok(Ok(())) => RunStatus::Ended,
            Ok(Err(join_error)) => {
                error!(target: "runtime::runner", session = %inner.id, error = %join_error, "tick task failed");
                RunStatus::Error
            }
            Err(_) => {
                warn!(
                    target: "runtime::runner",
                    session = %inner.id,
                    timeout = ?inner.config.stop_timeout,
                    "tick task did not stop in time, finalizing without it"
                );
                RunStatus::Ended
            }
        };

        let summary = inner
            .last_summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| StateSummary::from_state(&RunnerState::new(inner.config.cadence)));
        inner
            .finalize(summary.with_status(status), None)
            .await;
        inner.running.store(false, Ordering::Release);
    }

    /// Merges an input delta for `actor`; applied on the next tick.
    pub fn process_input(&self, actor: ActorId, delta: InputDelta) {
        self.inner.input.merge(actor, delta);
    }
}

impl RunnerInner {
    async fn run(self: Arc<Self>, mut rules: Box<dyn GameRules>, mut stop_rx: watch::Receiver<bool>) {
        let _running = RunningGuard(&self.running);
        let cadence = self.config.cadence;
        let mut state = RunnerState::new(cadence);

        match guarded(|| rules.initialize(&mut state)) {
            Ok(()) => {
                state.transition(RunStatus::Active);
                debug!(target: "runtime::runner", "rules initialized");
            }
            Err(error) => {
                error!(target: "runtime::runner", %error, "rules failed to initialize");
                state.transition(RunStatus::Error);
            }
        }

        let mut last_broadcast: Option<Instant> = None;

        while state.status == RunStatus::Active {
            if *stop_rx.borrow_and_update() {
                debug!(target: "runtime::runner", ticks = state.ticks, "stop requested");
                break;
            }

            let tick_started = Instant::now();
            state.ticks += 1;

            let snapshot = self.input.drain();
            if let Err(error) = guarded(|| rules.tick(&mut state, &snapshot)) {
                error!(target: "runtime::runner", tick = state.ticks, %error, "tick failed");
                state.finish(RunStatus::Error);
            }

            if state.status.is_outcome() {
                self.metrics.record_tick(tick_started.elapsed());
                info!(target: "runtime::runner", status = %state.status, tick = state.ticks, "session reached an outcome");
                break;
            }

            let now = Instant::now();
            if last_broadcast
                .is_none_or(|at| now.duration_since(at) >= cadence.broadcast_interval)
            {
                match guarded(|| Ok((rules.summary(&state), rules.entities()))) {
                    Ok((summary, entities)) => {
                        // `stop` gave up waiting and already published the final state.
                        if !self.publish_update(summary, entities) {
                            break;
                        }
                        last_broadcast = Some(now);
                    }
                    Err(error) => {
                        error!(target: "runtime::runner", tick = state.ticks, %error, "rendering the state failed");
                        state.finish(RunStatus::Error);
                        self.metrics.record_tick(tick_started.elapsed());
                        break;
                    }
                }
            }

            let elapsed = tick_started.elapsed();
            self.metrics.record_tick(elapsed);

            match cadence.tick_interval.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => {
                    tokio::select! {
                        _ = sleep(remaining) => {}
                        _ = stop_rx.changed() => {}
                    }
                }
                _ => {
                    self.metrics.record_overrun();
                    warn!(
                        target: "runtime::runner",
                        tick = state.ticks,
                        elapsed = ?elapsed,
                        interval = ?cadence.tick_interval,
                        "tick overran its interval"
                    );
                }
            }
        }

        let final_status = if state.status.is_outcome() {
            state.status
        } else {
            RunStatus::Ended
        };
        let (summary, entities) = match guarded(|| Ok((rules.summary(&state), rules.entities()))) {
            Ok((summary, entities)) => (summary.with_status(final_status), entities),
            Err(error) => {
                error!(target: "runtime::runner", %error, "rendering the final state failed");
                (StateSummary::from_state(&state).with_status(RunStatus::Error), None)
            }
        };
        state.transition(RunStatus::Ended);

        self.finalize(summary, entities).await;
    }

    /// Publishes a periodic update; false once the session is finalized.
    fn publish_update(&self, summary: StateSummary, entities: Option<Vec<game_core::Entity>>) -> bool {
        let finalized = self.finalized.lock().unwrap_or_else(PoisonError::into_inner);
        if *finalized {
            return false;
        }
        self.publish(summary, entities);
        true
    }

    fn publish(&self, summary: StateSummary, entities: Option<Vec<game_core::Entity>>) {
        *self
            .last_summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());

        self.gateway.publish(&self.group, Broadcast::game_state(summary));
        self.metrics.record_state_broadcast();

        if let Some(items) = entities {
            self.gateway.publish(&self.group, Broadcast::elems_update(items));
            self.metrics.record_entity_broadcast();
        }
    }

    /// Final broadcast and `ended` write; only the first call does anything.
    async fn finalize(&self, summary: StateSummary, entities: Option<Vec<game_core::Entity>>) {
        let status = summary.status;
        {
            let mut finalized = self.finalized.lock().unwrap_or_else(PoisonError::into_inner);
            if *finalized {
                return;
            }
            *finalized = true;
            self.publish(summary, entities);
        }
        self.write_status(SessionStatus::Ended).await;

        info!(target: "runtime::runner", session = %self.id, %status, "session finalized");
    }

    async fn write_status(&self, status: SessionStatus) {
        let write = self.catalog.write_status(self.id, status);
        if let Err(error) = bounded("write_status", self.config.status_write_timeout, write).await {
            warn!(target: "runtime::runner", session = %self.id, %status, %error, "failed to write session status");
        }
    }
}

/// Clears the running flag when the tick task exits, unwinding included.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs a rules call, turning panics into [`RulesError::Panicked`].
fn guarded<T>(call: impl FnOnce() -> Result<T, RulesError>) -> Result<T, RulesError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|message| (*message).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            Err(RulesError::Panicked(message))
        }
    }
}
