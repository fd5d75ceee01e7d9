//! Host actions on the active session.

use crate::{
    dao::game::GamePatch,
    dto::session::{Scoreboard, SessionSnapshot},
    error::ServiceError,
    services::session_events::broadcast_phase_changed,
    state::{
        GameSession, SharedSession, SharedState,
        board::Cell,
        game::{GameId, GameMode, Team},
        state_machine::{SessionEvent, WagerOutcome},
        transitions::run_transition_with_broadcast,
    },
};

/// Start playing `game_id`, closing any session already running.
pub async fn start_session(
    state: &SharedState,
    game_id: &GameId,
) -> Result<SessionSnapshot, ServiceError> {
    let game = state
        .repository()
        .update_game(
            game_id,
            GamePatch {
                current_mode: Some(Some(GameMode::Jeopardy)),
                ..GamePatch::default()
            },
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))?;

    let config = state.config();
    let session = GameSession::start(
        &game,
        state.repository().clone(),
        state.events().clone(),
        config.exit_policy,
        config.transition_timeout,
    );
    state.replace_session(session.clone()).await;

    let snapshot = session.snapshot().await;
    broadcast_phase_changed(session.events(), &game.id, &snapshot);
    Ok(SessionSnapshot::new(&game, &snapshot))
}

/// Close the active session. Progress already persisted is kept.
pub async fn end_session(state: &SharedState) -> Result<(), ServiceError> {
    if !state.end_session().await {
        return Err(no_session());
    }
    Ok(())
}

/// Host screen view of the active session.
pub async fn snapshot(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    let session = active(state).await?;
    session_snapshot(&session).await
}

/// Open the question on a board cell.
pub async fn select_cell(
    state: &SharedState,
    category_index: u8,
    row_index: u8,
) -> Result<SessionSnapshot, ServiceError> {
    let cell = Cell::new(category_index, row_index).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "cell ({category_index}, {row_index}) is outside the board"
        ))
    })?;
    transition(state, SessionEvent::SelectCell(cell)).await
}

/// Reveal the answer of the open board or wager question.
pub async fn reveal(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::Reveal).await
}

/// Give the open question's points to `team`.
pub async fn award(state: &SharedState, team: Team) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::Award(team)).await
}

/// Close the open question without awarding points.
pub async fn mark_wrong(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::MarkWrong).await
}

/// Back to the board, leaving the question unplayed.
pub async fn exit_to_board(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::ExitToBoard).await
}

/// Move on from the round summary or the wager result.
pub async fn advance(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::Advance).await
}

/// Record a final-round wager.
pub async fn place_wager(
    state: &SharedState,
    team: Team,
    amount: u32,
) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::PlaceWager { team, amount }).await
}

/// Show the wager question.
pub async fn open_wager_question(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::OpenWagerQuestion).await
}

/// Settle the wagers against the scores.
pub async fn resolve_wager(
    state: &SharedState,
    outcome: WagerOutcome,
) -> Result<SessionSnapshot, ServiceError> {
    transition(state, SessionEvent::ResolveWager(outcome)).await
}

/// Standings of the game being played.
pub async fn scoreboard(state: &SharedState) -> Result<Scoreboard, ServiceError> {
    let session = active(state).await?;
    let game = state
        .repository()
        .get_game(session.game_id())
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("game `{}` not found", session.game_id())))?;
    Ok(Scoreboard::from(&game))
}

async fn transition(
    state: &SharedState,
    event: SessionEvent,
) -> Result<SessionSnapshot, ServiceError> {
    let session = active(state).await?;
    run_transition_with_broadcast(&session, event).await?;
    session_snapshot(&session).await
}

async fn active(state: &SharedState) -> Result<SharedSession, ServiceError> {
    state.active_session().await.ok_or_else(no_session)
}

async fn session_snapshot(session: &SharedSession) -> Result<SessionSnapshot, ServiceError> {
    let game = session
        .repository()
        .get_game(session.game_id())
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("game `{}` not found", session.game_id())))?;
    let snapshot = session.snapshot().await;
    Ok(SessionSnapshot::new(&game, &snapshot))
}

fn no_session() -> ServiceError {
    ServiceError::InvalidState("no session is running".into())
}
