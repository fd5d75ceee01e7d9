use serde::Serialize;

use crate::{
    dto::{game::TeamsSummary, phase::VisibleSessionPhase},
    state::{
        Snapshot,
        board::Cell,
        game::{Game, GameId, Outcome, Scores, Team},
        state_machine::{SessionPhase, WagerOutcome, WagerPhase},
    },
};

/// Board coordinates of the open question.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Board column.
    pub category_index: u8,
    /// Board row.
    pub row_index: u8,
}

impl From<Cell> for CellSnapshot {
    fn from(cell: Cell) -> Self {
        Self {
            category_index: cell.category(),
            row_index: cell.row(),
        }
    }
}

/// Wagers as currently placed; `None` until a team commits.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct WagersSnapshot {
    /// Wager of the first team.
    pub team_a: Option<u32>,
    /// Wager of the second team.
    pub team_b: Option<u32>,
}

/// Host ruling on the wager question.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "team")]
pub enum WagerOutcomeSnapshot {
    /// This team answered correctly.
    Correct(Team),
    /// Neither team answered correctly.
    BothWrong,
}

impl From<WagerOutcome> for WagerOutcomeSnapshot {
    fn from(value: WagerOutcome) -> Self {
        match value {
            WagerOutcome::Correct(team) => WagerOutcomeSnapshot::Correct(team),
            WagerOutcome::BothWrong => WagerOutcomeSnapshot::BothWrong,
        }
    }
}

/// Serializable view of the session phase, broadcast on every transition.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PhaseSnapshot {
    /// Game being played.
    pub game_id: String,
    /// Current phase tag.
    pub phase: VisibleSessionPhase,
    /// Increments with every applied transition; lets clients drop stale notices.
    pub version: usize,
    /// Open board cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<CellSnapshot>,
    /// Value of the open question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    /// Whether the open answer is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed: Option<bool>,
    /// Seconds left on the question timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    /// Wagers during the final round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wagers: Option<WagersSnapshot>,
    /// Ruling once the wager question is resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wager_outcome: Option<WagerOutcomeSnapshot>,
    /// Final result once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl PhaseSnapshot {
    /// Project a state machine snapshot.
    pub fn new(game_id: &GameId, snapshot: &Snapshot) -> Self {
        let mut view = Self {
            game_id: game_id.to_string(),
            phase: VisibleSessionPhase::from(&snapshot.phase),
            version: snapshot.version,
            cell: None,
            points: None,
            revealed: None,
            countdown: None,
            wagers: None,
            wager_outcome: None,
            outcome: None,
        };

        match &snapshot.phase {
            SessionPhase::Idle | SessionPhase::RoundComplete => {}
            SessionPhase::QuestionOpen(open) => {
                view.cell = Some(open.cell.into());
                view.points = Some(open.points);
                view.revealed = Some(open.revealed);
                view.countdown = open.countdown;
            }
            SessionPhase::Wager(WagerPhase::Pending(wagers)) => {
                view.wagers = Some(WagersSnapshot {
                    team_a: wagers.team_a,
                    team_b: wagers.team_b,
                });
            }
            SessionPhase::Wager(WagerPhase::QuestionOpen { wagers, revealed }) => {
                view.wagers = Some(WagersSnapshot {
                    team_a: Some(wagers.team_a),
                    team_b: Some(wagers.team_b),
                });
                view.revealed = Some(*revealed);
            }
            SessionPhase::Wager(WagerPhase::Resolved(result)) => {
                view.wagers = Some(WagersSnapshot {
                    team_a: Some(result.wagers.team_a),
                    team_b: Some(result.wagers.team_b),
                });
                view.wager_outcome = Some(result.outcome.into());
            }
            SessionPhase::GameOver(outcome) => view.outcome = Some(*outcome),
        }

        view
    }
}

/// Question text as shown on the host screen. The answer stays hidden until
/// revealed.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct QuestionOnScreen {
    /// Category name.
    pub category: String,
    /// Clue text.
    pub question: String,
    /// Answer, once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Board value, absent for the wager question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

/// Everything a host screen needs to render the current session.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Game name.
    pub game_name: String,
    /// Team names.
    pub teams: TeamsSummary,
    /// Stored scores.
    pub scores: Scores,
    /// Phase details.
    pub phase: PhaseSnapshot,
    /// Open question, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionOnScreen>,
}

impl SessionSnapshot {
    /// Combine the stored game with a state machine snapshot.
    pub fn new(game: &Game, snapshot: &Snapshot) -> Self {
        let question = match &snapshot.phase {
            SessionPhase::QuestionOpen(open) => {
                game.board
                    .question(&open.question_id)
                    .map(|question| QuestionOnScreen {
                        category: question.category.clone(),
                        question: question.question.clone(),
                        answer: open.revealed.then(|| question.answer.clone()),
                        points: Some(open.points),
                    })
            }
            SessionPhase::Wager(WagerPhase::QuestionOpen { revealed, .. }) => {
                game.wager_question.as_ref().map(|question| QuestionOnScreen {
                    category: question.category.clone(),
                    question: question.question.clone(),
                    answer: revealed.then(|| question.answer.clone()),
                    points: None,
                })
            }
            _ => None,
        };

        Self {
            game_name: game.name.clone(),
            teams: (&game.teams).into(),
            scores: game.scores,
            phase: PhaseSnapshot::new(&game.id, snapshot),
            question,
        }
    }
}

/// Current standings.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    /// Team names.
    pub teams: TeamsSummary,
    /// Stored scores.
    pub scores: Scores,
    /// Team ahead, or a tie.
    pub leader: Outcome,
}

impl From<&Game> for Scoreboard {
    fn from(game: &Game) -> Self {
        Self {
            teams: (&game.teams).into(),
            scores: game.scores,
            leader: game.scores.outcome(),
        }
    }
}
