use serde::Serialize;

use crate::{dto::session::PhaseSnapshot, state::game::Scores};

/// Notification fanned out to presentation clients while a session runs.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SessionNotice {
    /// The session moved to a new phase.
    PhaseChanged(PhaseSnapshot),
    /// Scores were persisted after a question or the wager was resolved.
    ScoresChanged(ScoresChangedEvent),
    /// The session was closed.
    SessionEnded(SessionEndedEvent),
}

/// Payload of [`SessionNotice::ScoresChanged`].
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ScoresChangedEvent {
    /// Game being played.
    pub game_id: String,
    /// Scores as stored.
    pub scores: Scores,
}

/// Payload of [`SessionNotice::SessionEnded`].
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SessionEndedEvent {
    /// Game that was being played.
    pub game_id: String,
}
