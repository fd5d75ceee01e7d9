use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{
        AppDataEntity, GameEntity, GameModeEntity, ModesEntity, ProgressEntity, QuestionEntity,
        ScoresEntity, TeamsEntity,
    },
    state::board::{Board, Cell},
};

/// Default display name of the first team.
pub const DEFAULT_TEAM_A: &str = "Team A";
/// Default display name of the second team.
pub const DEFAULT_TEAM_B: &str = "Team B";
/// Per-question countdown applied to freshly created games.
pub const DEFAULT_QUESTION_TIMER_SECONDS: u32 = 30;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Allocate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Identifier as stored.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Opaque identifier of a game.
    GameId
);
opaque_id!(
    /// Opaque identifier of a question.
    QuestionId
);

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// First team.
    #[serde(rename = "teamA")]
    A,
    /// Second team.
    #[serde(rename = "teamB")]
    B,
}

impl Team {
    /// The opposing team.
    pub fn other(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

/// Display names of both teams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teams {
    /// First team.
    pub team_a: String,
    /// Second team.
    pub team_b: String,
}

impl Teams {
    /// Name of `team`.
    pub fn name(&self, team: Team) -> &str {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }
}

impl Default for Teams {
    fn default() -> Self {
        Self {
            team_a: DEFAULT_TEAM_A.into(),
            team_b: DEFAULT_TEAM_B.into(),
        }
    }
}

/// Scores of both teams. Never negative: deductions clamp at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    /// First team.
    pub team_a: u32,
    /// Second team.
    pub team_b: u32,
}

impl Scores {
    /// Scores of both teams.
    pub fn new(team_a: u32, team_b: u32) -> Self {
        Self { team_a, team_b }
    }

    /// Score of `team`.
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }

    fn slot(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        }
    }

    /// Scores after `team` gains `points`.
    pub fn awarded(mut self, team: Team, points: u32) -> Self {
        let slot = self.slot(team);
        *slot = slot.saturating_add(points);
        self
    }

    /// Scores after `team` loses `points`, clamped at zero.
    pub fn deducted(mut self, team: Team, points: u32) -> Self {
        let slot = self.slot(team);
        *slot = slot.saturating_sub(points);
        self
    }

    /// Winner by score; equal scores are a tie.
    pub fn outcome(&self) -> Outcome {
        match self.team_a.cmp(&self.team_b) {
            std::cmp::Ordering::Greater => Outcome::Winner(Team::A),
            std::cmp::Ordering::Less => Outcome::Winner(Team::B),
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "team")]
pub enum Outcome {
    /// This team has more points.
    Winner(Team),
    /// Both teams have the same score.
    Tie,
}

/// Mode tag recorded as the last one played. Only [`GameMode::Jeopardy`] is
/// still playable; the other tags survive from older saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Retired price guessing mode.
    PriceIsRight,
    /// Retired survey mode.
    FamilyFeud,
    /// Board mode.
    Jeopardy,
}

/// Where a game was left off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Last mode played.
    pub current_mode: Option<GameMode>,
    /// Round counter, starting at 1.
    pub round: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_mode: None,
            round: 1,
        }
    }
}

/// A clue placed on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Question id.
    pub id: QuestionId,
    /// Category name captured when the question was written.
    pub category: String,
    /// Clue text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Point value of the cell.
    pub points: u32,
    /// Set once the question has been played; never reset.
    pub used: bool,
    /// Board cell.
    pub cell: Cell,
}

/// Final-round clue that both teams wager on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerQuestion {
    /// Question id.
    pub id: QuestionId,
    /// Category announced before wagering.
    pub category: String,
    /// Clue text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Set once the wager round was resolved.
    pub used: bool,
}

/// Stored content the board cannot hold, written back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedContent {
    /// Clues without a valid free cell, in stored order.
    pub unplaced: Vec<QuestionEntity>,
    /// Collections of retired modes keyed by their stored name.
    pub retired_modes: Map<String, Value>,
}

impl RetainedContent {
    /// True when nothing was retained.
    pub fn is_empty(&self) -> bool {
        self.unplaced.is_empty() && self.retired_modes.is_empty()
    }
}

/// Root aggregate: everything needed to edit and play one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Game id.
    pub id: GameId,
    /// Game name.
    pub name: String,
    /// Board questions and categories.
    pub board: Board,
    /// Team names.
    pub teams: Teams,
    /// Current scores.
    pub scores: Scores,
    /// Stored progress.
    pub progress: Progress,
    /// Per-question countdown in seconds, `0` disables it.
    pub question_timer_seconds: u32,
    /// Final wager question, if set.
    pub wager_question: Option<WagerQuestion>,
    /// Stored content carried through saves without being played.
    pub retained: RetainedContent,
}

impl Game {
    /// Fresh game with zero scores and no progress.
    pub fn new(name: String, board: Board, teams: Teams, question_timer_seconds: u32) -> Self {
        Self {
            id: GameId::new(),
            name,
            board,
            teams,
            scores: Scores::default(),
            progress: Progress::default(),
            question_timer_seconds,
            wager_question: None,
            retained: RetainedContent::default(),
        }
    }

    /// Flag the board or wager question `id` as used. `false` when unknown.
    pub fn mark_question_used(&mut self, id: &QuestionId) -> bool {
        if self.board.mark_used(id) {
            return true;
        }
        match self.wager_question.as_mut() {
            Some(wager) if &wager.id == id => {
                wager.used = true;
                true
            }
            _ => false,
        }
    }
}

/// Whole application data set held by the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppData {
    /// Every user that signed in.
    pub users: Vec<String>,
    /// Games keyed by id, newest first.
    pub games: IndexMap<GameId, Game>,
    /// User who signed in last.
    pub last_user: Option<String>,
}

impl From<GameModeEntity> for GameMode {
    fn from(value: GameModeEntity) -> Self {
        match value {
            GameModeEntity::PriceIsRight => GameMode::PriceIsRight,
            GameModeEntity::FamilyFeud => GameMode::FamilyFeud,
            GameModeEntity::Jeopardy => GameMode::Jeopardy,
        }
    }
}

impl From<GameMode> for GameModeEntity {
    fn from(value: GameMode) -> Self {
        match value {
            GameMode::PriceIsRight => GameModeEntity::PriceIsRight,
            GameMode::FamilyFeud => GameModeEntity::FamilyFeud,
            GameMode::Jeopardy => GameModeEntity::Jeopardy,
        }
    }
}

impl From<ScoresEntity> for Scores {
    fn from(value: ScoresEntity) -> Self {
        let clamp = |score: i64| u32::try_from(score.max(0)).unwrap_or(u32::MAX);
        Self {
            team_a: clamp(value.team_a),
            team_b: clamp(value.team_b),
        }
    }
}

impl From<Scores> for ScoresEntity {
    fn from(value: Scores) -> Self {
        Self {
            team_a: value.team_a.into(),
            team_b: value.team_b.into(),
        }
    }
}

impl From<TeamsEntity> for Teams {
    fn from(value: TeamsEntity) -> Self {
        Self {
            team_a: value.team_a,
            team_b: value.team_b,
        }
    }
}

impl From<Teams> for TeamsEntity {
    fn from(value: Teams) -> Self {
        Self {
            team_a: value.team_a,
            team_b: value.team_b,
        }
    }
}

impl From<ProgressEntity> for Progress {
    fn from(value: ProgressEntity) -> Self {
        Self {
            current_mode: value.current_mode.map(Into::into),
            round: value.round,
        }
    }
}

impl From<Progress> for ProgressEntity {
    fn from(value: Progress) -> Self {
        Self {
            current_mode: value.current_mode.map(Into::into),
            round: value.round,
        }
    }
}

impl TryFrom<QuestionEntity> for Question {
    type Error = QuestionEntity;

    /// Fails, handing the entity back, when it carries no valid board cell.
    fn try_from(value: QuestionEntity) -> Result<Self, Self::Error> {
        let cell = match (value.category_index, value.row_index) {
            (Some(category), Some(row)) => Cell::new(category, row),
            _ => None,
        };
        let Some(cell) = cell else {
            return Err(value);
        };
        Ok(Self {
            id: value.id.into(),
            category: value.category,
            question: value.question,
            answer: value.answer,
            points: value.points,
            used: value.used,
            cell,
        })
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            id: value.id.0,
            category: value.category,
            question: value.question,
            answer: value.answer,
            points: value.points,
            used: value.used,
            category_index: Some(value.cell.category()),
            row_index: Some(value.cell.row()),
        }
    }
}

impl From<QuestionEntity> for WagerQuestion {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id.into(),
            category: value.category,
            question: value.question,
            answer: value.answer,
            used: value.used,
        }
    }
}

impl From<WagerQuestion> for QuestionEntity {
    fn from(value: WagerQuestion) -> Self {
        Self {
            id: value.id.0,
            category: value.category,
            question: value.question,
            answer: value.answer,
            points: 0,
            used: value.used,
            category_index: None,
            row_index: None,
        }
    }
}

impl From<GameEntity> for Game {
    fn from(value: GameEntity) -> Self {
        let ModesEntity {
            jeopardy,
            jeopardy_categories,
            retired,
        } = value.modes;

        let mut questions: Vec<Question> = Vec::with_capacity(jeopardy.len());
        let mut unplaced: Vec<QuestionEntity> = Vec::new();
        for entity in jeopardy {
            match Question::try_from(entity) {
                Ok(question) if questions.iter().any(|placed| placed.cell == question.cell) => {
                    unplaced.push(question.into());
                }
                Ok(question) => questions.push(question),
                Err(entity) => unplaced.push(entity),
            }
        }

        let retained = RetainedContent {
            unplaced,
            retired_modes: retired,
        };
        if !retained.is_empty() {
            info!(
                game_id = %value.id,
                unplaced = retained.unplaced.len(),
                retired_modes = retained.retired_modes.len(),
                "keeping stored content the board cannot show"
            );
        }

        Self {
            id: value.id.into(),
            name: value.name,
            board: Board::from_parts(jeopardy_categories, questions),
            teams: value.teams.into(),
            scores: value.scores.into(),
            progress: value.progress.into(),
            question_timer_seconds: value.question_timer_seconds,
            wager_question: value.wager_question.map(Into::into),
            retained,
        }
    }
}

impl From<Game> for GameEntity {
    fn from(value: Game) -> Self {
        Self {
            id: value.id.0,
            name: value.name,
            modes: ModesEntity {
                jeopardy: value
                    .board
                    .questions()
                    .iter()
                    .cloned()
                    .map(Into::into)
                    .chain(value.retained.unplaced)
                    .collect(),
                jeopardy_categories: value.board.categories().to_vec(),
                retired: value.retained.retired_modes,
            },
            teams: value.teams.into(),
            scores: value.scores.into(),
            progress: value.progress.into(),
            question_timer_seconds: value.question_timer_seconds,
            wager_question: value.wager_question.map(Into::into),
        }
    }
}

impl From<AppDataEntity> for AppData {
    fn from(value: AppDataEntity) -> Self {
        let mut games = IndexMap::with_capacity(value.games.len());
        for entity in value.games {
            let game = Game::from(entity);
            if games.contains_key(&game.id) {
                warn!(game_id = %game.id, "dropping duplicate game record");
                continue;
            }
            games.insert(game.id.clone(), game);
        }
        Self {
            users: value.users,
            games,
            last_user: value.last_user,
        }
    }
}

impl From<&AppData> for AppDataEntity {
    fn from(value: &AppData) -> Self {
        Self {
            users: value.users.clone(),
            games: value.games.values().cloned().map(Into::into).collect(),
            last_user: value.last_user.clone(),
        }
    }
}
