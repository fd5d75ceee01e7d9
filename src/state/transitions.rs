use crate::{
    dao::game::GameRepository,
    error::ServiceError,
    services::session_events::{broadcast_phase_changed, broadcast_scores_changed},
    state::{
        game::{GameId, Scores},
        session::SharedSession,
        state_machine::{Effect, SessionEvent, SessionPhase},
    },
};

/// Execute a session transition, persisting its effect, then broadcast the
/// resulting phase change and any score update.
pub async fn run_transition_with_broadcast(
    session: &SharedSession,
    event: SessionEvent,
) -> Result<SessionPhase, ServiceError> {
    let repository = session.repository().clone();
    let game_id = session.game_id().clone();
    let (scores, snapshot) = session
        .run_transition(event, move |effect| async move {
            persist_effect(&repository, &game_id, effect).await
        })
        .await?;

    broadcast_phase_changed(session.events(), session.game_id(), &snapshot);
    if let Some(scores) = scores {
        broadcast_scores_changed(session.events(), session.game_id(), scores);
    }
    Ok(snapshot.phase)
}

/// Perform the persistence a plan requires, returning the stored scores when
/// they changed.
async fn persist_effect(
    repository: &GameRepository,
    game_id: &GameId,
    effect: Effect,
) -> Result<Option<Scores>, ServiceError> {
    match effect {
        Effect::None => Ok(None),
        Effect::ScoreQuestion {
            question_id,
            scores,
        } => {
            repository
                .mark_question_used_and_score(game_id, scores, &question_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("question {question_id}")))?;
            Ok(Some(scores))
        }
    }
}
