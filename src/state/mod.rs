/// Board grid and cells.
pub mod board;
/// Notice broadcasting.
pub mod events;
/// Game aggregate and its stored form.
pub mod game;
/// Runtime of a playing session.
pub mod session;
/// Session phases and the plan/apply/abort machine.
pub mod state_machine;
/// Transitions that persist and broadcast.
pub mod transitions;

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::{
    config::HostConfig,
    dao::{
        app_store::{LoadIssue, PersistentStore},
        blob_store::{BlobStore, FileBlobStore},
        game::GameRepository,
    },
    dto::events::SessionNotice,
    state::game::GameId,
};

pub use self::events::EventHub;
pub use self::session::{GameSession, SharedSession};
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

/// Shared handle on [`AppState`].
pub type SharedState = Arc<AppState>;

/// Capacity of the session notice channel.
const EVENT_CAPACITY: usize = 64;

/// Central application state: configuration, game storage, notifications and
/// the single active session.
pub struct AppState {
    config: HostConfig,
    repository: Arc<GameRepository>,
    events: Arc<EventHub>,
    load_issue: Option<LoadIssue>,
    active_session: RwLock<Option<SharedSession>>,
}

impl AppState {
    /// Open the state on the file store described by `config`.
    pub async fn open(config: HostConfig) -> SharedState {
        let mut blob = FileBlobStore::new(config.data_dir.clone());
        if let Some(limit) = config.quota_bytes {
            blob = blob.with_quota(limit);
        }
        Self::with_store(config, Arc::new(blob)).await
    }

    /// Open the state on an arbitrary blob store.
    pub async fn with_store(config: HostConfig, blob: Arc<dyn BlobStore>) -> SharedState {
        let store = PersistentStore::new(blob, config.storage_key.as_str());
        let (repository, load_issue) =
            GameRepository::open(store, config.game_defaults.clone()).await;
        if let Some(issue) = &load_issue {
            warn!(
                error = %issue,
                saves_blocked = issue.blocks_overwrite(),
                "starting with an empty data set"
            );
        }

        Arc::new(Self {
            config,
            repository: Arc::new(repository),
            events: Arc::new(EventHub::new(EVENT_CAPACITY)),
            load_issue,
            active_session: RwLock::new(None),
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Game storage.
    pub fn repository(&self) -> &Arc<GameRepository> {
        &self.repository
    }

    /// Notice hub.
    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    /// Subscribe to session notices.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.events.subscribe()
    }

    /// Why stored data was discarded at startup, if it was.
    pub fn load_issue(&self) -> Option<&LoadIssue> {
        self.load_issue.as_ref()
    }

    /// Accept losing stored data that failed to load, so saves may proceed.
    pub fn allow_overwrite(&self) {
        self.repository.allow_overwrite();
    }

    /// Session currently being played, if any.
    pub async fn active_session(&self) -> Option<SharedSession> {
        self.active_session.read().await.clone()
    }

    /// Active session if it plays `game_id`.
    pub async fn session_for(&self, game_id: &GameId) -> Option<SharedSession> {
        self.active_session
            .read()
            .await
            .as_ref()
            .filter(|session| session.game_id() == game_id)
            .cloned()
    }

    /// Install `session` as the active one, closing its predecessor.
    pub async fn replace_session(&self, session: SharedSession) {
        let previous = self.active_session.write().await.replace(session);
        if let Some(previous) = previous {
            previous.close().await;
        }
    }

    /// Close and forget the active session. Returns whether one was running.
    pub async fn end_session(&self) -> bool {
        let previous = self.active_session.write().await.take();
        match previous {
            Some(session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// Close the active session before the host goes away.
    pub async fn shutdown(&self) {
        if self.end_session().await {
            info!("active session closed on shutdown");
        }
    }
}
