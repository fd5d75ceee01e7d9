//! Runtime of one playing session: state machine, persistence gate and countdown.

use std::{
    future::Future,
    sync::{Arc, Mutex as StdMutex, PoisonError, Weak},
    time::Duration,
};

use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{Instant, interval_at, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    config::ExitPolicy,
    dao::game::GameRepository,
    error::ServiceError,
    services::session_events::broadcast_session_ended,
    state::{
        events::EventHub,
        game::{Game, GameId},
        state_machine::{Effect, Plan, SessionEvent, SessionPhase, SessionStateMachine, Snapshot},
        transitions::run_transition_with_broadcast,
    },
};

/// Shared handle on a [`GameSession`].
pub type SharedSession = Arc<GameSession>;

/// Interval between two countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A game being played.
///
/// Transitions run one at a time behind the transition gate. A transition only
/// moves the state machine once its persistence work succeeded.
pub struct GameSession {
    game_id: GameId,
    repository: Arc<GameRepository>,
    events: Arc<EventHub>,
    machine: RwLock<SessionStateMachine>,
    /// Serializes transitions; holds `true` once the session is closed.
    transition_gate: Mutex<bool>,
    transition_timeout: Option<Duration>,
    countdown: StdMutex<Option<JoinHandle<()>>>,
}

impl GameSession {
    /// Open a session on `game`, resuming from its stored progress.
    pub fn start(
        game: &Game,
        repository: Arc<GameRepository>,
        events: Arc<EventHub>,
        exit_policy: ExitPolicy,
        transition_timeout: Option<Duration>,
    ) -> SharedSession {
        let machine = SessionStateMachine::for_game(game, exit_policy);
        info!(game_id = %game.id, phase = ?machine.phase(), "session started");
        Arc::new(Self {
            game_id: game.id.clone(),
            repository,
            events,
            machine: RwLock::new(machine),
            transition_gate: Mutex::new(false),
            transition_timeout,
            countdown: StdMutex::new(None),
        })
    }

    /// Game being played.
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Game storage.
    pub fn repository(&self) -> &Arc<GameRepository> {
        &self.repository
    }

    /// Notice hub.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Current phase.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Current state machine snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Whether a countdown task is currently attached to the session.
    pub fn countdown_active(&self) -> bool {
        self.countdown_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Plan `event` against the stored game, run `work` on the plan's effect and
    /// apply the plan only if the work succeeded within the transition timeout.
    ///
    /// A timed-out work future is dropped; blob stores guarantee a dropped write
    /// never lands, so storage keeps the pre-transition data.
    pub async fn run_transition<F, Fut, T>(
        self: &Arc<Self>,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, Snapshot), ServiceError>
    where
        F: FnOnce(Effect) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        if *gate {
            return Err(ServiceError::InvalidState("session is closed".into()));
        }

        let game = self
            .repository
            .get_game(&self.game_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("game {}", self.game_id)))?;
        let Plan {
            id: plan_id,
            effect,
            ..
        } = self.machine.write().await.plan(event.clone(), &game)?;

        let work_future = work(effect);
        let outcome = match self.transition_timeout {
            Some(limit) => match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout),
            },
            None => work_future.await,
        };

        match outcome {
            Ok(value) => {
                let snapshot = {
                    let mut machine = self.machine.write().await;
                    machine.apply(plan_id)?;
                    machine.snapshot()
                };
                self.sync_countdown(&snapshot.phase, &event);
                debug!(
                    game_id = %self.game_id,
                    event = ?event,
                    version = snapshot.version,
                    "session transition applied"
                );
                drop(gate);
                Ok((value, snapshot))
            }
            Err(err) => {
                if let Err(abort_err) = self.machine.write().await.abort(plan_id) {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition"
                    );
                }
                warn!(
                    game_id = %self.game_id,
                    event = ?event,
                    error = %err,
                    "session transition aborted"
                );
                drop(gate);
                Err(err)
            }
        }
    }

    /// Close the session: no further transition is accepted and the countdown
    /// is cancelled. Closing twice is a no-op.
    pub async fn close(&self) {
        let mut closed = self.transition_gate.lock().await;
        if *closed {
            return;
        }
        *closed = true;
        self.cancel_countdown();
        drop(closed);

        info!(game_id = %self.game_id, "session closed");
        broadcast_session_ended(&self.events, &self.game_id);
    }

    /// Attach or detach the countdown task to match `phase`.
    ///
    /// A tick that stopped the countdown comes from the task itself, which
    /// then ends on its own; any other transition cancels the task.
    fn sync_countdown(self: &Arc<Self>, phase: &SessionPhase, event: &SessionEvent) {
        let running = matches!(phase, SessionPhase::QuestionOpen(open) if open.countdown_running());
        let mut slot = self.countdown_slot();

        if running {
            if slot.as_ref().is_none_or(JoinHandle::is_finished) {
                *slot = Some(spawn_countdown(Arc::downgrade(self)));
                debug!(game_id = %self.game_id, "countdown started");
            }
            return;
        }

        if let Some(handle) = slot.take() {
            if *event != SessionEvent::Tick {
                handle.abort();
                debug!(game_id = %self.game_id, "countdown cancelled");
            }
        }
    }

    fn cancel_countdown(&self) {
        if let Some(handle) = self.countdown_slot().take() {
            handle.abort();
        }
    }

    fn countdown_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.cancel_countdown();
    }
}

/// Tick the session once per second until its countdown stops running.
fn spawn_countdown(session: Weak<GameSession>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        loop {
            ticker.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            match run_transition_with_broadcast(&session, SessionEvent::Tick).await {
                Ok(SessionPhase::QuestionOpen(open)) if open.countdown_running() => continue,
                Ok(_) => break,
                Err(err) => {
                    debug!(game_id = %session.game_id, error = %err, "countdown stopped");
                    break;
                }
            }
        }
    })
}
