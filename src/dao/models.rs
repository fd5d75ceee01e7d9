use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root blob persisted under the application storage key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppDataEntity {
    /// Names of every user that signed in on this device.
    #[serde(default)]
    pub users: Vec<String>,
    /// Games, newest first.
    #[serde(default)]
    pub games: Vec<GameEntity>,
    /// Last signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user: Option<String>,
}

/// Persisted shape of a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameEntity {
    /// Opaque game id.
    pub id: String,
    /// Game name.
    #[serde(default)]
    pub name: String,
    /// Content per mode.
    #[serde(default)]
    pub modes: ModesEntity,
    /// Team names.
    #[serde(default)]
    pub teams: TeamsEntity,
    /// Scores.
    #[serde(default)]
    pub scores: ScoresEntity,
    /// Last mode played.
    #[serde(default)]
    pub progress: ProgressEntity,
    /// Seconds per question; records written before timers existed have none.
    #[serde(default)]
    pub question_timer_seconds: u32,
    /// Final wager question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wager_question: Option<QuestionEntity>,
}

/// Per-mode content of a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModesEntity {
    /// Board clues, placed or not.
    #[serde(default)]
    pub jeopardy: Vec<QuestionEntity>,
    /// Board column names.
    #[serde(default)]
    pub jeopardy_categories: Vec<String>,
    /// Collections of retired modes such as `priceIsRight` and `familyFeud`,
    /// kept verbatim.
    #[serde(flatten)]
    pub retired: Map<String, Value>,
}

/// Persisted clue. Board coordinates are absent on wager questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntity {
    /// Opaque question id.
    pub id: String,
    /// Category name captured when written.
    #[serde(default)]
    pub category: String,
    /// Clue text.
    #[serde(default)]
    pub question: String,
    /// Answer text.
    #[serde(default)]
    pub answer: String,
    /// Point value.
    #[serde(default)]
    pub points: u32,
    /// Whether the clue was played.
    #[serde(default)]
    pub used: bool,
    /// Board column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_index: Option<u8>,
    /// Board row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u8>,
}

/// Team names as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamsEntity {
    /// First team.
    pub team_a: String,
    /// Second team.
    pub team_b: String,
}

impl Default for TeamsEntity {
    fn default() -> Self {
        Self {
            team_a: "Team A".into(),
            team_b: "Team B".into(),
        }
    }
}

/// Scores as stored. Older revisions could persist negative values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoresEntity {
    /// First team.
    #[serde(default)]
    pub team_a: i64,
    /// Second team.
    #[serde(default)]
    pub team_b: i64,
}

/// Progress record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntity {
    /// Last mode played.
    #[serde(default)]
    pub current_mode: Option<GameModeEntity>,
    /// Round counter, starting at 1.
    #[serde(default = "default_round")]
    pub round: u32,
}

impl Default for ProgressEntity {
    fn default() -> Self {
        Self {
            current_mode: None,
            round: default_round(),
        }
    }
}

/// Mode tag recorded as the last one played.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameModeEntity {
    /// Retired price guessing mode.
    PriceIsRight,
    /// Retired survey mode.
    FamilyFeud,
    /// Board mode.
    Jeopardy,
}

fn default_round() -> u32 {
    1
}
