use serde::Serialize;

use crate::state::state_machine::{SessionPhase, WagerPhase};

/// Session phase exposed to presentation clients.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// Board shown, waiting for a cell.
    Idle,
    /// Board question on screen.
    QuestionOpen,
    /// All board questions played.
    RoundComplete,
    /// Teams are placing wagers.
    WagerPending,
    /// Wager question on screen.
    WagerQuestion,
    /// Wager settled.
    WagerResolved,
    /// Final scoreboard.
    GameOver,
}

impl From<&SessionPhase> for VisibleSessionPhase {
    fn from(value: &SessionPhase) -> Self {
        match value {
            SessionPhase::Idle => VisibleSessionPhase::Idle,
            SessionPhase::QuestionOpen(_) => VisibleSessionPhase::QuestionOpen,
            SessionPhase::RoundComplete => VisibleSessionPhase::RoundComplete,
            SessionPhase::Wager(WagerPhase::Pending(_)) => VisibleSessionPhase::WagerPending,
            SessionPhase::Wager(WagerPhase::QuestionOpen { .. }) => {
                VisibleSessionPhase::WagerQuestion
            }
            SessionPhase::Wager(WagerPhase::Resolved(_)) => VisibleSessionPhase::WagerResolved,
            SessionPhase::GameOver(_) => VisibleSessionPhase::GameOver,
        }
    }
}
