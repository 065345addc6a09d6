//! Bot manager: owns at most one bot session at a time

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use botrunner_commands::CommandTable;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{BotPhase, BotStatus, LifecycleEvent};
use crate::error::LifecycleError;
use crate::gateway::{BotIdentity, Connector};
use crate::session::{Session, SessionExit, SessionObserver};
use crate::token::{BotToken, DEFAULT_MIN_TOKEN_LENGTH};

/// Timing and validation knobs for [`BotManager`]
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Tokens shorter than this are rejected before connecting
    pub min_token_length: usize,
    /// How long `start` waits to confirm the session is alive
    pub start_probe: Duration,
    /// Poll interval while probing
    pub probe_interval: Duration,
    /// How long `stop` waits before abandoning the session
    pub stop_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            start_probe: Duration::from_secs(2),
            probe_interval: Duration::from_millis(50),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Successful `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub session_id: Uuid,
    /// False when the probe window ended before the handshake did
    pub handshake_complete: bool,
}

/// Successful `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    /// False when the session had to be abandoned after the timeout
    pub graceful: bool,
}

struct SessionHandle {
    generation: u64,
    id: Uuid,
    cancel: CancellationToken,
    alive: Arc<AtomicBool>,
    /// Taken by the first `stop`
    task: Option<JoinHandle<SessionExit>>,
    started_at: DateTime<Utc>,
}

impl SessionHandle {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct ManagerState {
    generation: u64,
    session: Option<SessionHandle>,
    phase: BotPhase,
    identity: Option<BotIdentity>,
    token: Option<BotToken>,
    last_error: Option<LifecycleError>,
}

impl ManagerState {
    fn owns(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    /// Release a session whose task ended without reporting
    fn reap_dead_session(&mut self) {
        let dead = self
            .session
            .as_ref()
            .is_some_and(|s| !s.is_alive() && s.task.is_some());
        if !dead {
            return;
        }
        if let Some(session) = self.session.take() {
            warn!(session_id = %session.id, "Releasing bot session that exited without notice");
        }
        let reason = "session task ended".to_string();
        self.last_error = Some(if self.phase == BotPhase::Connected {
            LifecycleError::DisconnectedUnexpectedly(reason)
        } else {
            LifecycleError::ConnectFailed(reason)
        });
        self.phase = BotPhase::Idle;
        self.identity = None;
    }
}

fn lock(state: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the liveness flag when the session task finishes, panics, or is aborted
struct LivenessGuard(Arc<AtomicBool>);

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Session callbacks, ignored once a newer session owns the manager
struct ManagerObserver {
    state: Weak<Mutex<ManagerState>>,
    generation: u64,
    event_tx: broadcast::Sender<LifecycleEvent>,
}

impl SessionObserver for ManagerObserver {
    fn on_ready(&self, identity: &BotIdentity) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if !state.owns(self.generation) || state.phase != BotPhase::Starting {
            return;
        }
        state.phase = BotPhase::Connected;
        state.identity = Some(identity.clone());
        drop(state);

        let _ = self.event_tx.send(LifecycleEvent::Connected {
            name: identity.name.clone(),
            guilds: identity.guilds,
        });
    }

    fn on_disconnect(&self, exit: &SessionExit) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if !state.owns(self.generation) || state.phase == BotPhase::Stopping {
            return;
        }

        let error = match exit {
            SessionExit::Requested => return,
            SessionExit::ConnectFailed(reason) => LifecycleError::ConnectFailed(reason.clone()),
            SessionExit::Disconnected(reason) if state.phase == BotPhase::Connected => {
                LifecycleError::DisconnectedUnexpectedly(reason.clone())
            }
            SessionExit::Disconnected(reason) => LifecycleError::ConnectFailed(reason.clone()),
        };
        // The token stays so a later stop still has something to clear
        state.session = None;
        state.identity = None;
        state.phase = BotPhase::Idle;
        state.last_error = Some(error.clone());
        drop(state);

        let _ = self.event_tx.send(LifecycleEvent::Disconnected {
            reason: error.to_string(),
        });
    }
}

enum Probe {
    Pending,
    Connected,
    Exited(LifecycleError),
    /// Stopped or superseded while probing
    Released,
}

/// Starts, stops and reports on the managed bot
///
/// All bookkeeping sits behind one mutex that is never held across an
/// await, so `status` is cheap and safe to call from any context.
pub struct BotManager {
    connector: Arc<dyn Connector>,
    commands: Arc<CommandTable>,
    config: ManagerConfig,
    state: Arc<Mutex<ManagerState>>,
    event_tx: broadcast::Sender<LifecycleEvent>,
}

impl BotManager {
    pub fn new(connector: Arc<dyn Connector>, commands: Arc<CommandTable>) -> Self {
        Self::with_config(connector, commands, ManagerConfig::default())
    }

    pub fn with_config(
        connector: Arc<dyn Connector>,
        commands: Arc<CommandTable>,
        config: ManagerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            connector,
            commands,
            config,
            state: Arc::new(Mutex::new(ManagerState::default())),
            event_tx,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.event_tx.subscribe()
    }

    /// Start a bot session with `raw_token`
    ///
    /// Returns once the handshake completed, or after the probe window if
    /// the session is still alive. A session that dies inside the window
    /// yields [`LifecycleError::ConnectFailed`] and the token is forgotten.
    pub async fn start(&self, raw_token: &str) -> Result<Started, LifecycleError> {
        let token = BotToken::parse(raw_token, self.config.min_token_length)?;

        let (generation, session_id) = {
            let mut state = lock(&self.state);
            state.reap_dead_session();
            if state.session.is_some() {
                return Err(LifecycleError::AlreadyRunning);
            }

            state.generation += 1;
            let generation = state.generation;
            let session_id = Uuid::new_v4();
            let cancel = CancellationToken::new();
            let alive = Arc::new(AtomicBool::new(true));
            let observer = Arc::new(ManagerObserver {
                state: Arc::downgrade(&self.state),
                generation,
                event_tx: self.event_tx.clone(),
            });
            let session = Session::new(
                session_id,
                token.clone(),
                Arc::clone(&self.connector),
                Arc::clone(&self.commands),
                observer,
                cancel.clone(),
            );

            let guard = LivenessGuard(Arc::clone(&alive));
            let task = tokio::spawn(async move {
                let _guard = guard;
                session.run().await
            });

            state.session = Some(SessionHandle {
                generation,
                id: session_id,
                cancel,
                alive,
                task: Some(task),
                started_at: Utc::now(),
            });
            state.phase = BotPhase::Starting;
            state.identity = None;
            state.token = Some(token);
            state.last_error = None;
            (generation, session_id)
        };

        info!(session_id = %session_id, "Starting bot session");
        let _ = self.event_tx.send(LifecycleEvent::Starting {
            session_id: session_id.to_string(),
        });

        let deadline = Instant::now() + self.config.start_probe;
        loop {
            match self.probe(generation) {
                Probe::Connected => {
                    return Ok(Started {
                        session_id,
                        handshake_complete: true,
                    });
                }
                Probe::Exited(error) => {
                    warn!(session_id = %session_id, error = %error, "Bot session failed to start");
                    return Err(error);
                }
                Probe::Released => break,
                Probe::Pending => {}
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(self.config.probe_interval).await;
        }

        debug!(session_id = %session_id, "Probe window ended before handshake");
        Ok(Started {
            session_id,
            handshake_complete: false,
        })
    }

    fn probe(&self, generation: u64) -> Probe {
        let mut state = lock(&self.state);
        if let Some(session) = state.session.as_ref().filter(|s| s.generation == generation) {
            if !session.is_alive() {
                state.reap_dead_session();
                state.token = None;
                let error = LifecycleError::ConnectFailed("session task ended".into());
                state.last_error = Some(error.clone());
                return Probe::Exited(error);
            }
            return match state.phase {
                BotPhase::Connected => Probe::Connected,
                _ => Probe::Pending,
            };
        }

        // Released by the observer, unless a stop or a newer start got here first
        if state.session.is_some() || state.generation != generation {
            return Probe::Released;
        }
        match state.last_error.clone() {
            Some(error) => {
                state.token = None;
                let error = match error {
                    LifecycleError::DisconnectedUnexpectedly(reason) => {
                        LifecycleError::ConnectFailed(reason)
                    }
                    other => other,
                };
                state.last_error = Some(error.clone());
                Probe::Exited(error)
            }
            None => Probe::Released,
        }
    }

    /// Stop the current session
    ///
    /// Waits up to the stop timeout for a clean shutdown, then abandons the
    /// session. Clears the token and identity either way. With no session
    /// but a leftover token from an unexpected disconnect, only the token
    /// is cleared.
    pub async fn stop(&self) -> Result<Stopped, LifecycleError> {
        let (mut task, cancel, session_id) = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            let Some(session) = state.session.as_mut() else {
                if state.token.take().is_some() {
                    state.identity = None;
                    state.phase = BotPhase::Idle;
                    state.last_error = None;
                    info!("Cleared token of a disconnected bot");
                    return Ok(Stopped { graceful: true });
                }
                return Err(LifecycleError::NotRunning);
            };
            // Another stop is already waiting on this session
            let Some(task) = session.task.take() else {
                return Err(LifecycleError::NotRunning);
            };
            let cancel = session.cancel.clone();
            let session_id = session.id;
            state.phase = BotPhase::Stopping;
            (task, cancel, session_id)
        };

        info!(session_id = %session_id, "Stopping bot session");
        cancel.cancel();

        let graceful = match tokio::time::timeout(self.config.stop_timeout, &mut task).await {
            Ok(Ok(exit)) => {
                debug!(session_id = %session_id, exit = ?exit, "Bot session ended");
                true
            }
            Ok(Err(e)) => {
                warn!(session_id = %session_id, error = %e, "Bot session task failed");
                false
            }
            Err(_) => {
                warn!(
                    session_id = %session_id,
                    timeout = ?self.config.stop_timeout,
                    "Bot session did not stop in time, abandoning it"
                );
                task.abort();
                false
            }
        };

        {
            let mut state = lock(&self.state);
            if state.session.as_ref().is_some_and(|s| s.id == session_id) {
                state.session = None;
            }
            state.phase = BotPhase::Idle;
            state.identity = None;
            state.token = None;
            state.last_error = None;
        }

        info!(session_id = %session_id, graceful, "Bot session stopped");
        let _ = self.event_tx.send(LifecycleEvent::Stopped { graceful });
        Ok(Stopped { graceful })
    }

    /// Current status; never exposes the token
    pub fn status(&self) -> BotStatus {
        let mut state = lock(&self.state);
        state.reap_dead_session();
        let running = state.session.as_ref().is_some_and(SessionHandle::is_alive);
        BotStatus {
            running,
            info: if running { state.identity.clone() } else { None },
            has_token: state.token.is_some(),
            phase: state.phase,
            last_error: state.last_error.as_ref().map(ToString::to_string),
        }
    }

    /// Whether a live session is owned
    pub fn is_running(&self) -> bool {
        self.status().running
    }

    /// When the current session was spawned
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).session.as_ref().map(|s| s.started_at)
    }

    /// Id of the current session
    pub fn session_id(&self) -> Option<Uuid> {
        lock(&self.state).session.as_ref().map(|s| s.id)
    }
}
