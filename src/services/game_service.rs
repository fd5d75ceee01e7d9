use tracing::info;
use validator::Validate;

use crate::{
    dao::game::GamePatch,
    dto::{
        game::{CreateGameRequest, GameListItem, GameSummary},
        validation::validate_user_name,
    },
    error::ServiceError,
    state::{SharedState, game::GameId},
};

/// Create a game with an empty board, returning its projection.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;

    let CreateGameRequest {
        name,
        teams,
        question_timer_seconds,
    } = request;
    let overrides = GamePatch {
        teams: teams.map(Into::into),
        question_timer_seconds,
        ..GamePatch::default()
    };

    let id = state
        .repository()
        .create_game_with(name.trim(), None, overrides)
        .await?;
    get_game(state, &id).await
}

/// Editor view of game `id`.
pub async fn get_game(state: &SharedState, id: &GameId) -> Result<GameSummary, ServiceError> {
    state
        .repository()
        .get_game(id)
        .await
        .map(|game| GameSummary::from(&game))
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

/// All games, newest first.
pub async fn list_games(state: &SharedState) -> Vec<GameListItem> {
    state
        .repository()
        .list_games()
        .await
        .iter()
        .map(GameListItem::from)
        .collect()
}

/// Delete a game and its questions. Refused while the game is being played.
pub async fn remove_game(state: &SharedState, id: &GameId) -> Result<(), ServiceError> {
    if state.session_for(id).await.is_some() {
        return Err(ServiceError::InvalidState(format!(
            "game `{id}` is being played; end the session first"
        )));
    }

    if !state.repository().remove_game(id).await? {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    }
    Ok(())
}

/// Record `name` as the signed-in user, returning the stored name.
pub async fn sign_in(state: &SharedState, name: &str) -> Result<String, ServiceError> {
    validate_user_name(name)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid user name: {err}")))?;

    let name = name.trim();
    state.repository().remember_user(name).await?;
    info!(user = name, "user signed in");
    Ok(name.to_string())
}

/// User who signed in last, if any.
pub async fn current_user(state: &SharedState) -> Option<String> {
    state.repository().last_user().await
}

/// Every user that ever signed in on this host.
pub async fn known_users(state: &SharedState) -> Vec<String> {
    state.repository().users().await
}
