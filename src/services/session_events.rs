use crate::{
    dto::{
        events::{ScoresChangedEvent, SessionEndedEvent, SessionNotice},
        session::PhaseSnapshot,
    },
    state::{
        Snapshot,
        events::EventHub,
        game::{GameId, Scores},
    },
};

/// Broadcast the phase reached by the latest transition.
pub fn broadcast_phase_changed(events: &EventHub, game_id: &GameId, snapshot: &Snapshot) {
    events.broadcast(SessionNotice::PhaseChanged(PhaseSnapshot::new(
        game_id, snapshot,
    )));
}

/// Broadcast freshly persisted scores.
pub fn broadcast_scores_changed(events: &EventHub, game_id: &GameId, scores: Scores) {
    events.broadcast(SessionNotice::ScoresChanged(ScoresChangedEvent {
        game_id: game_id.to_string(),
        scores,
    }));
}

/// Announce that the session was closed.
pub fn broadcast_session_ended(events: &EventHub, game_id: &GameId) {
    events.broadcast(SessionNotice::SessionEnded(SessionEndedEvent {
        game_id: game_id.to_string(),
    }));
}
