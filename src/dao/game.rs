use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    config::GameDefaults,
    dao::{
        app_store::{LoadIssue, PersistentStore},
        storage::StorageResult,
    },
    state::{
        board::{Board, CATEGORY_COUNT},
        game::{AppData, Game, GameId, GameMode, Question, QuestionId, Scores, Teams, WagerQuestion},
    },
};

/// Typed partial update of a [`Game`]. Only the fields that are set change.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    /// New name.
    pub name: Option<String>,
    /// New column names.
    pub categories: Option<[String; CATEGORY_COUNT]>,
    /// Replacement question set; used flags already set are kept.
    pub questions: Option<Vec<Question>>,
    /// New team names.
    pub teams: Option<Teams>,
    /// New scores.
    pub scores: Option<Scores>,
    /// New last-played mode; `Some(None)` clears it.
    pub current_mode: Option<Option<GameMode>>,
    /// New countdown.
    pub question_timer_seconds: Option<u32>,
    /// New wager question; `Some(None)` removes it.
    pub wager_question: Option<Option<WagerQuestion>>,
}

impl GamePatch {
    /// Merge the patch over `game`.
    pub fn apply_to(self, game: &mut Game) {
        if let Some(name) = self.name {
            game.name = name;
        }
        if let Some(categories) = self.categories {
            game.board.set_categories(categories);
        }
        if let Some(questions) = self.questions {
            game.board.replace_questions(questions);
        }
        if let Some(teams) = self.teams {
            game.teams = teams;
        }
        if let Some(scores) = self.scores {
            game.scores = scores;
        }
        if let Some(current_mode) = self.current_mode {
            game.progress.current_mode = current_mode;
        }
        if let Some(seconds) = self.question_timer_seconds {
            game.question_timer_seconds = seconds;
        }
        if let Some(wager_question) = self.wager_question {
            game.wager_question = match (wager_question, game.wager_question.take()) {
                (Some(mut next), Some(previous)) if previous.id == next.id => {
                    next.used |= previous.used;
                    Some(next)
                }
                (next, _) => next,
            };
        }
    }
}

/// In-memory game collection backed by a [`PersistentStore`].
///
/// Mutations run against a copy of the data set under the write lock; the copy
/// only replaces the live data once it has been saved.
pub struct GameRepository {
    store: PersistentStore,
    data: RwLock<AppData>,
    defaults: GameDefaults,
}

impl GameRepository {
    /// Load the stored data set. The load issue, if any, is handed back so the
    /// caller can report it.
    pub async fn open(store: PersistentStore, defaults: GameDefaults) -> (Self, Option<LoadIssue>) {
        let report = store.load().await;
        info!(games = report.data.games.len(), "game repository loaded");
        let repository = Self {
            store,
            data: RwLock::new(report.data),
            defaults,
        };
        (repository, report.issue)
    }

    /// Let saves replace stored data that failed to load. See
    /// [`LoadIssue::blocks_overwrite`].
    pub fn allow_overwrite(&self) {
        self.store.allow_overwrite();
    }

    /// Apply `mutation` to a copy of the data set and persist it.
    ///
    /// A mutation returning `None` changed nothing and skips the save. The
    /// commit follows the save with no await in between, so a mutation
    /// cancelled mid-save leaves memory and storage untouched.
    async fn mutate<T>(&self, mutation: impl FnOnce(&mut AppData) -> Option<T>) -> StorageResult<Option<T>> {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        let Some(result) = mutation(&mut next) else {
            return Ok(None);
        };
        self.store.save(&next).await?;
        *guard = next;
        Ok(Some(result))
    }

    /// Create a game with default teams, zero scores and the default timer,
    /// placed in front of the existing games.
    pub async fn create_game(
        &self,
        name: impl Into<String>,
        initial_board: Option<Board>,
    ) -> StorageResult<GameId> {
        self.create_game_with(name, initial_board, GamePatch::default())
            .await
    }

    /// Like [`create_game`](Self::create_game), with `overrides` merged over
    /// the defaults before the single save.
    pub async fn create_game_with(
        &self,
        name: impl Into<String>,
        initial_board: Option<Board>,
        overrides: GamePatch,
    ) -> StorageResult<GameId> {
        let mut game = Game::new(
            name.into(),
            initial_board.unwrap_or_default(),
            self.defaults.teams.clone(),
            self.defaults.question_timer_seconds,
        );
        overrides.apply_to(&mut game);
        let id = game.id.clone();
        self.mutate(move |data| {
            data.games.shift_insert(0, game.id.clone(), game);
            Some(())
        })
        .await?;
        info!(game_id = %id, "game created");
        Ok(id)
    }

    /// Copy of the game `id`.
    pub async fn get_game(&self, id: &GameId) -> Option<Game> {
        self.data.read().await.games.get(id).cloned()
    }

    /// All games, newest first.
    pub async fn list_games(&self) -> Vec<Game> {
        self.data.read().await.games.values().cloned().collect()
    }

    /// Run `edit` against the stored game in one persisted step.
    pub async fn modify_game<T>(
        &self,
        id: &GameId,
        edit: impl FnOnce(&mut Game) -> T,
    ) -> StorageResult<Option<T>> {
        self.mutate(|data| data.games.get_mut(id).map(edit)).await
    }

    /// Merge `patch` over the stored game, returning the updated game.
    pub async fn update_game(&self, id: &GameId, patch: GamePatch) -> StorageResult<Option<Game>> {
        self.modify_game(id, |game| {
            patch.apply_to(game);
            game.clone()
        })
        .await
    }

    /// Replace only the scores of a game.
    pub async fn update_scores(&self, id: &GameId, scores: Scores) -> StorageResult<Option<Game>> {
        self.modify_game(id, |game| {
            game.scores = scores;
            game.clone()
        })
        .await
    }

    /// Set the scores and flag `question_id` as used in one persisted step.
    ///
    /// `question_id` may name a board question or the wager question. Returns
    /// `None`, changing nothing, when the game or the question does not exist.
    pub async fn mark_question_used_and_score(
        &self,
        id: &GameId,
        scores: Scores,
        question_id: &QuestionId,
    ) -> StorageResult<Option<Game>> {
        let updated = self
            .mutate(|data| {
                let game = data.games.get_mut(id)?;
                if !game.mark_question_used(question_id) {
                    return None;
                }
                game.scores = scores;
                Some(game.clone())
            })
            .await?;
        if updated.is_some() {
            debug!(game_id = %id, question_id = %question_id, ?scores, "question marked used");
        }
        Ok(updated)
    }

    /// Delete a game together with its questions. `false` when it did not exist.
    pub async fn remove_game(&self, id: &GameId) -> StorageResult<bool> {
        let removed = self
            .mutate(|data| data.games.shift_remove(id).map(|_| ()))
            .await?
            .is_some();
        if removed {
            info!(game_id = %id, "game removed");
        }
        Ok(removed)
    }

    /// Record `name` as a known user and as the last one signed in.
    pub async fn remember_user(&self, name: &str) -> StorageResult<()> {
        self.mutate(|data| {
            if !data.users.iter().any(|user| user == name) {
                data.users.push(name.to_string());
            }
            data.last_user = Some(name.to_string());
            Some(())
        })
        .await?;
        Ok(())
    }

    /// User who signed in last.
    pub async fn last_user(&self) -> Option<String> {
        self.data.read().await.last_user.clone()
    }

    /// Every user that signed in.
    pub async fn users(&self) -> Vec<String> {
        self.data.read().await.users.clone()
    }
}
