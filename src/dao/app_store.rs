//! Loads and saves the whole application data set as a single JSON blob.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        blob_store::BlobStore,
        models::AppDataEntity,
        storage::{StorageError, StorageResult},
    },
    state::game::AppData,
};

/// Storage key the application blob lives under.
pub const DEFAULT_STORAGE_KEY: &str = "gameshow.app.v1";

/// Reason why a load fell back to an empty data set.
///
/// Until the stored bytes are safe, either copied to a backup key or released
/// with [`PersistentStore::allow_overwrite`], saves are refused.
#[derive(Debug, Error)]
pub enum LoadIssue {
    /// The storage medium could not be read.
    #[error("stored application data could not be read")]
    Unreadable(#[source] StorageError),
    /// The stored blob is not valid application data.
    #[error("stored application data is corrupted")]
    Corrupted {
        /// Key holding a copy of the unparsable blob, `None` when the copy failed.
        backup_key: Option<String>,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
}

impl LoadIssue {
    /// Whether saving now would destroy stored bytes that were never loaded.
    pub fn blocks_overwrite(&self) -> bool {
        match self {
            LoadIssue::Unreadable(_) => true,
            LoadIssue::Corrupted { backup_key, .. } => backup_key.is_none(),
        }
    }
}

/// Outcome of [`PersistentStore::load`].
#[derive(Debug)]
pub struct LoadReport {
    /// Loaded data, or an empty data set when nothing usable was stored.
    pub data: AppData,
    /// Set when stored data existed but had to be discarded.
    pub issue: Option<LoadIssue>,
}

/// Serializes [`AppData`] into a [`BlobStore`] under one key.
#[derive(Clone)]
pub struct PersistentStore {
    blob: Arc<dyn BlobStore>,
    key: Arc<str>,
    /// Cleared while the stored blob could neither be loaded nor backed up.
    overwrite_allowed: Arc<AtomicBool>,
}

impl PersistentStore {
    /// Store keeping the application blob under `key`.
    pub fn new(blob: Arc<dyn BlobStore>, key: impl Into<Arc<str>>) -> Self {
        Self {
            blob,
            key: key.into(),
            overwrite_allowed: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Store using [`DEFAULT_STORAGE_KEY`].
    pub fn with_default_key(blob: Arc<dyn BlobStore>) -> Self {
        Self::new(blob, DEFAULT_STORAGE_KEY)
    }

    /// Let saves replace a stored blob that failed to load.
    pub fn allow_overwrite(&self) {
        if !self.overwrite_allowed.swap(true, Ordering::SeqCst) {
            warn!(key = %self.key, "overwriting stored application data that was never loaded");
        }
    }

    /// Load the application data. Never fails: unusable content yields an
    /// empty data set together with the reason it was discarded.
    ///
    /// An unparsable blob is first copied to a backup key.
    pub async fn load(&self) -> LoadReport {
        let report = self.load_report().await;
        let blocked = report.issue.as_ref().is_some_and(LoadIssue::blocks_overwrite);
        self.overwrite_allowed.store(!blocked, Ordering::SeqCst);
        report
    }

    async fn load_report(&self) -> LoadReport {
        let raw = match self.blob.read(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored application data; starting empty");
                return LoadReport {
                    data: AppData::default(),
                    issue: None,
                };
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read application data; starting empty");
                return LoadReport {
                    data: AppData::default(),
                    issue: Some(LoadIssue::Unreadable(err)),
                };
            }
        };

        match serde_json::from_str::<AppDataEntity>(&raw) {
            Ok(entity) => LoadReport {
                data: entity.into(),
                issue: None,
            },
            Err(source) => {
                warn!(key = %self.key, error = %source, "stored application data is corrupted; starting empty");
                let backup_key = self.back_up(raw).await;
                LoadReport {
                    data: AppData::default(),
                    issue: Some(LoadIssue::Corrupted { backup_key, source }),
                }
            }
        }
    }

    /// Copy `raw` next to the application key, returning the backup key.
    async fn back_up(&self, raw: String) -> Option<String> {
        let backup_key = format!(
            "{}.corrupt-{}",
            self.key,
            OffsetDateTime::now_utc().unix_timestamp()
        );
        match self.blob.write(&backup_key, raw).await {
            Ok(()) => {
                info!(key = %self.key, backup_key = %backup_key, "backed up corrupted application data");
                Some(backup_key)
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to back up corrupted application data");
                None
            }
        }
    }

    /// Persist the application data, surfacing quota and medium failures.
    pub async fn save(&self, data: &AppData) -> StorageResult<()> {
        if !self.overwrite_allowed.load(Ordering::SeqCst) {
            return Err(StorageError::Protected {
                key: self.key.to_string(),
            });
        }
        let entity = AppDataEntity::from(data);
        let raw = serde_json::to_string(&entity).map_err(|err| {
            StorageError::unavailable("failed to serialize application data".into(), err)
        })?;
        self.blob.write(&self.key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::blob_store::MemoryBlobStore,
        state::{
            board::{Board, Cell},
            game::{Game, GameMode, Question, QuestionId, Scores, Teams, WagerQuestion},
        },
    };

    fn store_with(blob: &MemoryBlobStore) -> PersistentStore {
        PersistentStore::with_default_key(Arc::new(blob.clone()))
    }

    #[tokio::test]
    async fn empty_medium_loads_default_without_issue() {
        let blob = MemoryBlobStore::new();
        let report = store_with(&blob).load().await;
        assert_eq!(report.data, AppData::default());
        assert!(report.issue.is_none());
    }

    #[tokio::test]
    async fn corrupted_blob_is_backed_up_before_any_save() {
        let blob = MemoryBlobStore::new();
        blob.insert_raw(DEFAULT_STORAGE_KEY, "{not json");
        let store = store_with(&blob);

        let report = store.load().await;
        assert_eq!(report.data, AppData::default());
        let Some(LoadIssue::Corrupted {
            backup_key: Some(backup_key),
            ..
        }) = &report.issue
        else {
            panic!("expected a backed up corruption, got {:?}", report.issue);
        };
        assert!(backup_key.starts_with("gameshow.app.v1.corrupt-"));
        assert_eq!(blob.get_raw(backup_key).as_deref(), Some("{not json"));

        store.save(&AppData::default()).await.unwrap();
        assert_eq!(blob.get_raw(backup_key).as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn corrupted_blob_without_room_for_a_backup_is_protected() {
        let blob = MemoryBlobStore::new().with_quota(48);
        blob.insert_raw(DEFAULT_STORAGE_KEY, "{\"games\": [ broken and long");
        let store = store_with(&blob);

        let report = store.load().await;
        assert!(matches!(
            report.issue,
            Some(LoadIssue::Corrupted {
                backup_key: None,
                ..
            })
        ));

        let err = store.save(&AppData::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::Protected { .. }));
        assert_eq!(
            blob.get_raw(DEFAULT_STORAGE_KEY).as_deref(),
            Some("{\"games\": [ broken and long")
        );

        store.allow_overwrite();
        store.save(&AppData::default()).await.unwrap();
        assert_ne!(
            blob.get_raw(DEFAULT_STORAGE_KEY).as_deref(),
            Some("{\"games\": [ broken and long")
        );
    }

    #[tokio::test]
    async fn legacy_content_survives_load_and_save() {
        let blob = MemoryBlobStore::new();
        blob.insert_raw(
            DEFAULT_STORAGE_KEY,
            r#"{"games":[{"id":"g1","name":"Old","modes":{
                "jeopardy":[{"id":"q1","category":"Art","question":"Water lilies?","answer":"Monet","points":200}],
                "priceIsRight":[{"id":"p1","item":"Toaster","price":30}],
                "familyFeud":[]
            }}]}"#,
        );
        let store = store_with(&blob);

        let report = store.load().await;
        assert!(report.issue.is_none());
        store.save(&report.data).await.unwrap();

        let raw = blob.get_raw(DEFAULT_STORAGE_KEY).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let modes = &saved["games"][0]["modes"];
        assert_eq!(modes["jeopardy"][0]["answer"], "Monet");
        assert_eq!(modes["priceIsRight"][0]["item"], "Toaster");
        assert_eq!(modes["familyFeud"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_collections_default_to_empty() {
        let blob = MemoryBlobStore::new();
        blob.insert_raw(DEFAULT_STORAGE_KEY, r#"{"lastUser":"ada"}"#);

        let report = store_with(&blob).load().await;
        assert!(report.issue.is_none());
        assert!(report.data.users.is_empty());
        assert!(report.data.games.is_empty());
        assert_eq!(report.data.last_user.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn saved_game_loads_back_field_for_field() {
        let blob = MemoryBlobStore::new();
        let store = store_with(&blob);

        let mut board = Board::new();
        board.set_category(0, "History".into());
        let cell = Cell::new(0, 1).unwrap();
        board.place(Question {
            id: QuestionId::new(),
            category: "History".into(),
            question: "Who crossed the Rubicon?".into(),
            answer: "Caesar".into(),
            points: cell.points(),
            used: true,
            cell,
        });
        let mut game = Game::new("Friday Night".into(), board, Teams::default(), 45);
        game.scores = Scores::new(200, 0);
        game.progress.current_mode = Some(GameMode::Jeopardy);
        game.wager_question = Some(WagerQuestion {
            id: QuestionId::new(),
            category: "Geography".into(),
            question: "Longest river?".into(),
            answer: "Nile".into(),
            used: false,
        });

        let mut data = AppData {
            users: vec!["ada".into()],
            last_user: Some("ada".into()),
            ..AppData::default()
        };
        data.games.insert(game.id.clone(), game.clone());

        store.save(&data).await.unwrap();
        let report = store.load().await;

        assert!(report.issue.is_none());
        assert_eq!(report.data, data);
        assert_eq!(report.data.games.get(&game.id), Some(&game));
    }

    #[tokio::test]
    async fn save_surfaces_quota_errors() {
        let blob = MemoryBlobStore::new().with_quota(32);
        let store = store_with(&blob);

        let mut data = AppData::default();
        let game = Game::new("A rather long game name".into(), Board::new(), Teams::default(), 30);
        data.games.insert(game.id.clone(), game);

        let err = store.save(&data).await.unwrap_err();
        assert!(err.is_quota_exceeded());
    }
}
