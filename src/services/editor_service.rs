//! Board and game editing.

use tracing::{debug, info};
use validator::Validate;

use crate::{
    dao::game::GamePatch,
    dto::game::{
        CategoriesInput, GameSettingsInput, GameSummary, QuestionInput, QuestionSummary,
        TeamsInput, WagerQuestionInput,
    },
    error::ServiceError,
    state::{
        SharedState,
        board::{CATEGORY_COUNT, Cell},
        game::{Game, GameId, Question, QuestionId, WagerQuestion},
    },
};

/// Write a new question into a cell, replacing whatever occupied it.
///
/// The question takes the cell's point value and a snapshot of the category
/// name, "Category N" when the column is still blank.
pub async fn save_question(
    state: &SharedState,
    game_id: &GameId,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    input.validate()?;
    ensure_not_playing(state, game_id).await?;
    let cell = parse_cell(input.category_index, input.row_index)?;

    let saved = state
        .repository()
        .modify_game(game_id, |game| {
            let question = Question {
                id: QuestionId::new(),
                category: game.board.category_name(cell.category()),
                question: input.question.trim().to_string(),
                answer: input.answer.trim().to_string(),
                points: cell.points(),
                used: false,
                cell,
            };
            let summary = QuestionSummary::from(&question);
            if let Some(previous) = game.board.place(question) {
                debug!(game_id = %game.id, question_id = %previous.id, %cell, "question replaced");
            }
            summary
        })
        .await?
        .ok_or_else(|| game_not_found(game_id))?;
    Ok(saved)
}

/// Remove a question from the board.
pub async fn delete_question(
    state: &SharedState,
    game_id: &GameId,
    question_id: &QuestionId,
) -> Result<GameSummary, ServiceError> {
    ensure_not_playing(state, game_id).await?;
    let game = load_game(state, game_id).await?;
    if game.board.question(question_id).is_none() {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found"
        )));
    }

    edit_game(state, game_id, |game| {
        game.board.remove(question_id);
    })
    .await
}

/// Empty a cell. Clearing an empty cell is a no-op.
pub async fn clear_cell(
    state: &SharedState,
    game_id: &GameId,
    category_index: u8,
    row_index: u8,
) -> Result<GameSummary, ServiceError> {
    ensure_not_playing(state, game_id).await?;
    let cell = parse_cell(category_index, row_index)?;
    let game = load_game(state, game_id).await?;
    if game.board.question_at(cell).is_none() {
        return Ok(GameSummary::from(&game));
    }

    edit_game(state, game_id, |game| {
        game.board.clear(cell);
    })
    .await
}

/// Rename the board columns. Names already captured by questions are kept.
pub async fn set_categories(
    state: &SharedState,
    game_id: &GameId,
    input: CategoriesInput,
) -> Result<GameSummary, ServiceError> {
    input.validate()?;
    let mut categories: [String; CATEGORY_COUNT] = Default::default();
    for (slot, name) in categories.iter_mut().zip(input.categories) {
        *slot = name.trim().to_string();
    }

    update(
        state,
        game_id,
        GamePatch {
            categories: Some(categories),
            ..GamePatch::default()
        },
    )
    .await
}

/// Rename both teams.
pub async fn set_teams(
    state: &SharedState,
    game_id: &GameId,
    input: TeamsInput,
) -> Result<GameSummary, ServiceError> {
    input.validate()?;
    update(
        state,
        game_id,
        GamePatch {
            teams: Some(input.into()),
            ..GamePatch::default()
        },
    )
    .await
}

/// Rename the game or change its question timer. A new timer applies from
/// the next question opened.
pub async fn update_settings(
    state: &SharedState,
    game_id: &GameId,
    input: GameSettingsInput,
) -> Result<GameSummary, ServiceError> {
    input.validate()?;
    update(
        state,
        game_id,
        GamePatch {
            name: input.name.map(|name| name.trim().to_string()),
            question_timer_seconds: input.question_timer_seconds,
            ..GamePatch::default()
        },
    )
    .await
}

/// Set or remove the final wager question.
///
/// Editing an existing wager question keeps its identity, so a question that
/// was already played stays played.
pub async fn set_wager_question(
    state: &SharedState,
    game_id: &GameId,
    input: Option<WagerQuestionInput>,
) -> Result<GameSummary, ServiceError> {
    if let Some(input) = &input {
        input.validate()?;
    }
    ensure_not_playing(state, game_id).await?;
    let game = load_game(state, game_id).await?;

    let wager_question = input.map(|input| WagerQuestion {
        id: game
            .wager_question
            .as_ref()
            .map(|existing| existing.id.clone())
            .unwrap_or_default(),
        category: input.category.trim().to_string(),
        question: input.question.trim().to_string(),
        answer: input.answer.trim().to_string(),
        used: false,
    });

    let summary = update(
        state,
        game_id,
        GamePatch {
            wager_question: Some(wager_question),
            ..GamePatch::default()
        },
    )
    .await?;
    info!(game_id = %game_id, present = summary.wager_question.is_some(), "wager question updated");
    Ok(summary)
}

/// Board-shape edits would invalidate the phase of a running session.
async fn ensure_not_playing(state: &SharedState, game_id: &GameId) -> Result<(), ServiceError> {
    if state.session_for(game_id).await.is_some() {
        return Err(ServiceError::InvalidState(format!(
            "game `{game_id}` is being played; end the session before editing its questions"
        )));
    }
    Ok(())
}

async fn load_game(state: &SharedState, game_id: &GameId) -> Result<Game, ServiceError> {
    state
        .repository()
        .get_game(game_id)
        .await
        .ok_or_else(|| game_not_found(game_id))
}

async fn update(
    state: &SharedState,
    game_id: &GameId,
    patch: GamePatch,
) -> Result<GameSummary, ServiceError> {
    state
        .repository()
        .update_game(game_id, patch)
        .await?
        .map(|game| GameSummary::from(&game))
        .ok_or_else(|| game_not_found(game_id))
}

async fn edit_game(
    state: &SharedState,
    game_id: &GameId,
    edit: impl FnOnce(&mut Game),
) -> Result<GameSummary, ServiceError> {
    state
        .repository()
        .modify_game(game_id, |game| {
            edit(game);
            GameSummary::from(&*game)
        })
        .await?
        .ok_or_else(|| game_not_found(game_id))
}

fn parse_cell(category_index: u8, row_index: u8) -> Result<Cell, ServiceError> {
    Cell::new(category_index, row_index).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "cell ({category_index}, {row_index}) is outside the board"
        ))
    })
}

fn game_not_found(game_id: &GameId) -> ServiceError {
    ServiceError::NotFound(format!("game `{game_id}` not found"))
}
