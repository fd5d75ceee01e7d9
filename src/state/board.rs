//! Categories × rows grid of questions for a single game.

use std::fmt;

use tracing::warn;

use crate::state::game::{Question, QuestionId};

/// Number of category columns on the board.
pub const CATEGORY_COUNT: usize = 6;
/// Number of point rows on the board.
pub const ROW_COUNT: usize = 5;
/// Point value of each row, top to bottom.
pub const ROW_POINTS: [u32; ROW_COUNT] = [100, 200, 300, 400, 500];

/// Coordinate of a board cell. Always within the board bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    category: u8,
    row: u8,
}

impl Cell {
    /// Build a cell, `None` when the coordinate falls outside the board.
    pub fn new(category: u8, row: u8) -> Option<Self> {
        ((category as usize) < CATEGORY_COUNT && (row as usize) < ROW_COUNT)
            .then_some(Self { category, row })
    }

    /// Column index in `0..CATEGORY_COUNT`.
    pub fn category(self) -> u8 {
        self.category
    }

    /// Row index in `0..ROW_COUNT`.
    pub fn row(self) -> u8 {
        self.row
    }

    /// Point value attached to this cell's row.
    pub fn points(self) -> u32 {
        ROW_POINTS[self.row as usize]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.category, self.row)
    }
}

/// Board of a game: six category names and the questions occupying its cells.
///
/// At most one question occupies a cell. Insertion order of the questions is
/// kept for editor listings and has no gameplay meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    categories: [String; CATEGORY_COUNT],
    questions: Vec<Question>,
}

impl Board {
    /// Empty board with blank category names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from loosely shaped parts.
    ///
    /// Categories are padded or truncated to [`CATEGORY_COUNT`]; a question whose
    /// cell is already taken is dropped.
    pub fn from_parts(categories: Vec<String>, questions: Vec<Question>) -> Self {
        let mut board = Self {
            categories: normalize_categories(categories),
            questions: Vec::with_capacity(questions.len()),
        };
        for question in questions {
            if board.question_at(question.cell).is_some() {
                warn!(
                    question_id = %question.id,
                    cell = %question.cell,
                    "dropping question for an already occupied cell"
                );
                continue;
            }
            board.questions.push(question);
        }
        board
    }

    /// Category names in column order.
    pub fn categories(&self) -> &[String; CATEGORY_COUNT] {
        &self.categories
    }

    /// Display name of a column, falling back to "Category N" when blank.
    pub fn category_name(&self, index: u8) -> String {
        match self.categories.get(index as usize) {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Category {}", index as usize + 1),
        }
    }

    /// Replace every column name.
    pub fn set_categories(&mut self, categories: [String; CATEGORY_COUNT]) {
        self.categories = categories;
    }

    /// Rename one column. Returns `false` when the index is out of range.
    pub fn set_category(&mut self, index: u8, name: String) -> bool {
        match self.categories.get_mut(index as usize) {
            Some(slot) => {
                *slot = name;
                true
            }
            None => false,
        }
    }

    /// Questions in insertion order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question placed on `cell`.
    pub fn question_at(&self, cell: Cell) -> Option<&Question> {
        self.questions.iter().find(|question| question.cell == cell)
    }

    /// Question with id `id`.
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    /// Every cell in row-major order together with its occupant.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, Option<&Question>)> + '_ {
        (0..ROW_COUNT as u8).flat_map(move |row| {
            (0..CATEGORY_COUNT as u8).map(move |category| {
                let cell = Cell { category, row };
                (cell, self.question_at(cell))
            })
        })
    }

    /// Put `question` on its cell, returning the previous occupant if any.
    pub fn place(&mut self, question: Question) -> Option<Question> {
        match self.questions.iter().position(|q| q.cell == question.cell) {
            Some(index) => Some(std::mem::replace(&mut self.questions[index], question)),
            None => {
                self.questions.push(question);
                None
            }
        }
    }

    /// Take the question `id` off the board.
    pub fn remove(&mut self, id: &QuestionId) -> Option<Question> {
        let index = self.questions.iter().position(|q| &q.id == id)?;
        Some(self.questions.remove(index))
    }

    /// Take the question on `cell` off the board.
    pub fn clear(&mut self, cell: Cell) -> Option<Question> {
        let index = self.questions.iter().position(|q| q.cell == cell)?;
        Some(self.questions.remove(index))
    }

    /// Flag a question as used. Returns `false` when no such question exists.
    pub fn mark_used(&mut self, id: &QuestionId) -> bool {
        match self.questions.iter_mut().find(|q| &q.id == id) {
            Some(question) => {
                question.used = true;
                true
            }
            None => false,
        }
    }

    /// Replace the whole question set.
    ///
    /// Cells stay single-occupancy and a question that was already used keeps
    /// its flag even when the replacement says otherwise.
    pub fn replace_questions(&mut self, questions: Vec<Question>) {
        let previous = std::mem::take(&mut self.questions);
        let questions = questions
            .into_iter()
            .map(|mut question| {
                if previous.iter().any(|old| old.id == question.id && old.used) {
                    question.used = true;
                }
                question
            })
            .collect();
        let categories = std::mem::take(&mut self.categories);
        *self = Self::from_parts(categories.into(), questions);
    }

    /// Questions not played yet.
    pub fn unused_count(&self) -> usize {
        self.questions.iter().filter(|q| !q.used).count()
    }

    /// True when no unused question remains (vacuously true for an empty board).
    pub fn is_exhausted(&self) -> bool {
        self.unused_count() == 0
    }
}

fn normalize_categories(categories: Vec<String>) -> [String; CATEGORY_COUNT] {
    let mut normalized: [String; CATEGORY_COUNT] = Default::default();
    for (slot, name) in normalized.iter_mut().zip(categories) {
        *slot = name;
    }
    normalized
}
