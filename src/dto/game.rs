use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    dto::validation::validate_not_blank,
    state::{
        board::CATEGORY_COUNT,
        game::{Game, Question, Scores, Teams, WagerQuestion},
    },
};

/// Longest accepted game, team or category name.
const NAME_MAX_LEN: u64 = 120;
/// Longest accepted question or answer text.
const TEXT_MAX_LEN: u64 = 2_000;
const CATEGORIES_MAX: u64 = CATEGORY_COUNT as u64;
/// Upper bound of the per-question countdown.
pub const TIMER_MAX_SECONDS: u32 = 600;

/// Payload used to create a new game.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGameRequest {
    /// Game name.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = NAME_MAX_LEN)
    )]
    pub name: String,
    /// Team names; the configured defaults apply when omitted.
    #[serde(default)]
    #[validate(nested)]
    pub teams: Option<TeamsInput>,
    /// Countdown per question; the configured default applies when omitted.
    #[serde(default)]
    #[validate(range(max = TIMER_MAX_SECONDS))]
    pub question_timer_seconds: Option<u32>,
}

/// Display names of both teams.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TeamsInput {
    /// Name of the first team.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = NAME_MAX_LEN)
    )]
    pub team_a: String,
    /// Name of the second team.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = NAME_MAX_LEN)
    )]
    pub team_b: String,
}

impl From<TeamsInput> for Teams {
    fn from(value: TeamsInput) -> Self {
        Self {
            team_a: value.team_a.trim().to_string(),
            team_b: value.team_b.trim().to_string(),
        }
    }
}

/// Question written into a board cell.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionInput {
    /// Board column, `0..=5`.
    #[validate(range(max = 5))]
    pub category_index: u8,
    /// Board row, `0..=4`; fixes the point value.
    #[validate(range(max = 4))]
    pub row_index: u8,
    /// Clue read to the teams.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = TEXT_MAX_LEN)
    )]
    pub question: String,
    /// Expected answer.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = TEXT_MAX_LEN)
    )]
    pub answer: String,
}

/// Category names in column order. Missing trailing names are left blank.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoriesInput {
    /// At most one name per column.
    #[validate(length(max = CATEGORIES_MAX))]
    pub categories: Vec<String>,
}

/// Editable game settings; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GameSettingsInput {
    /// New game name.
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = NAME_MAX_LEN)
    )]
    pub name: Option<String>,
    /// New countdown, `0` disables it.
    #[serde(default)]
    #[validate(range(max = TIMER_MAX_SECONDS))]
    pub question_timer_seconds: Option<u32>,
}

/// Final wager question content.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WagerQuestionInput {
    /// Category announced before wagering.
    #[validate(length(max = NAME_MAX_LEN))]
    pub category: String,
    /// Clue read once both wagers are in.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = TEXT_MAX_LEN)
    )]
    pub question: String,
    /// Expected answer.
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = TEXT_MAX_LEN)
    )]
    pub answer: String,
}

/// Row of the game picker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GameListItem {
    /// Game id.
    pub id: String,
    /// Game name.
    pub name: String,
    /// Questions on the board.
    pub question_count: usize,
    /// Questions not played yet.
    pub unused_count: usize,
    /// Whether a final wager question is set.
    pub has_wager_question: bool,
    /// Stored scores.
    pub scores: Scores,
}

impl From<&Game> for GameListItem {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.to_string(),
            name: game.name.clone(),
            question_count: game.board.questions().len(),
            unused_count: game.board.unused_count(),
            has_wager_question: game.wager_question.is_some(),
            scores: game.scores,
        }
    }
}

/// Display names of both teams.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TeamsSummary {
    /// First team.
    pub team_a: String,
    /// Second team.
    pub team_b: String,
}

impl From<&Teams> for TeamsSummary {
    fn from(teams: &Teams) -> Self {
        Self {
            team_a: teams.team_a.clone(),
            team_b: teams.team_b.clone(),
        }
    }
}

/// Board question as listed in the editor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuestionSummary {
    /// Question id.
    pub id: String,
    /// Board column.
    pub category_index: u8,
    /// Board row.
    pub row_index: u8,
    /// Category name captured when written.
    pub category: String,
    /// Clue text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Point value of the cell.
    pub points: u32,
    /// Whether the question was played.
    pub used: bool,
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.to_string(),
            category_index: question.cell.category(),
            row_index: question.cell.row(),
            category: question.category.clone(),
            question: question.question.clone(),
            answer: question.answer.clone(),
            points: question.points,
            used: question.used,
        }
    }
}

/// Final wager question as listed in the editor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WagerQuestionSummary {
    /// Question id.
    pub id: String,
    /// Category name.
    pub category: String,
    /// Clue text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Whether the wager round was played.
    pub used: bool,
}

impl From<&WagerQuestion> for WagerQuestionSummary {
    fn from(question: &WagerQuestion) -> Self {
        Self {
            id: question.id.to_string(),
            category: question.category.clone(),
            question: question.question.clone(),
            answer: question.answer.clone(),
            used: question.used,
        }
    }
}

/// Full projection of a game for the editor and the host screen.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GameSummary {
    /// Game id.
    pub id: String,
    /// Game name.
    pub name: String,
    /// Team names.
    pub teams: TeamsSummary,
    /// Stored scores.
    pub scores: Scores,
    /// Display names, blank columns replaced by "Category N".
    pub categories: Vec<String>,
    /// Placed questions in board order of insertion.
    pub questions: Vec<QuestionSummary>,
    /// Countdown per question, `0` when disabled.
    pub question_timer_seconds: u32,
    /// Final wager question, if set.
    pub wager_question: Option<WagerQuestionSummary>,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.to_string(),
            name: game.name.clone(),
            teams: (&game.teams).into(),
            scores: game.scores,
            categories: (0..CATEGORY_COUNT as u8)
                .map(|index| game.board.category_name(index))
                .collect(),
            questions: game.board.questions().iter().map(Into::into).collect(),
            question_timer_seconds: game.question_timer_seconds,
            wager_question: game.wager_question.as_ref().map(Into::into),
        }
    }
}
