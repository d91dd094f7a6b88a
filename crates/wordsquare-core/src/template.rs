//! Per-game custom multiplier layouts.

use crate::board::{SquareType, BOARD_SIZE, CENTER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of cells per multiplier code in a custom template
pub const MAX_DOUBLE_LETTER: usize = 28;
pub const MAX_TRIPLE_LETTER: usize = 20;
pub const MAX_DOUBLE_WORD: usize = 20;
pub const MAX_TRIPLE_WORD: usize = 12;

/// Multiplier code of one template cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateCode {
    #[serde(rename = "2L")]
    DoubleLetter,
    #[serde(rename = "3L")]
    TripleLetter,
    #[serde(rename = "2W")]
    DoubleWord,
    #[serde(rename = "3W")]
    TripleWord,
    #[serde(rename = "STAR")]
    Star,
}

impl TemplateCode {
    /// Square type this code resolves to.
    ///
    /// `Star` resolves to no multiplier, unlike the standard layout where
    /// the center is a double word square.
    pub fn square_type(self) -> SquareType {
        match self {
            TemplateCode::DoubleLetter => SquareType::DoubleLetter,
            TemplateCode::TripleLetter => SquareType::TripleLetter,
            TemplateCode::DoubleWord => SquareType::DoubleWord,
            TemplateCode::TripleWord => SquareType::TripleWord,
            TemplateCode::Star => SquareType::Normal,
        }
    }

    /// Wire form of the code
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateCode::DoubleLetter => "2L",
            TemplateCode::TripleLetter => "3L",
            TemplateCode::DoubleWord => "2W",
            TemplateCode::TripleWord => "3W",
            TemplateCode::Star => "STAR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TemplateError {
    #[error("Template must have 15 rows, got {0}")]
    WrongRowCount(usize),

    #[error("Template row {row} must have 15 cells, got {len}")]
    WrongRowLength { row: usize, len: usize },

    #[error("Template center cell must be STAR")]
    MissingCenterStar,

    #[error("Template has {count} {code} cells, at most {max} allowed")]
    TooMany {
        code: String,
        count: usize,
        max: usize,
    },
}

pub type TemplateRows = Vec<Vec<Option<TemplateCode>>>;

/// A validated 15x15 grid of multiplier codes, indexed `[y][x]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemplateRows", into = "TemplateRows")]
pub struct BoardTemplate {
    rows: TemplateRows,
}

impl BoardTemplate {
    /// Validate dimensions, the center star and per-code limits
    pub fn new(rows: TemplateRows) -> Result<Self, TemplateError> {
        if rows.len() != BOARD_SIZE {
            return Err(TemplateError::WrongRowCount(rows.len()));
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != BOARD_SIZE) {
            return Err(TemplateError::WrongRowLength {
                row,
                len: cells.len(),
            });
        }
        if rows[CENTER][CENTER] != Some(TemplateCode::Star) {
            return Err(TemplateError::MissingCenterStar);
        }

        let limits = [
            (TemplateCode::DoubleLetter, MAX_DOUBLE_LETTER),
            (TemplateCode::TripleLetter, MAX_TRIPLE_LETTER),
            (TemplateCode::DoubleWord, MAX_DOUBLE_WORD),
            (TemplateCode::TripleWord, MAX_TRIPLE_WORD),
        ];
        for (code, max) in limits {
            let count = rows.iter().flatten().filter(|c| **c == Some(code)).count();
            if count > max {
                return Err(TemplateError::TooMany {
                    code: code.as_str().to_string(),
                    count,
                    max,
                });
            }
        }

        Ok(Self { rows })
    }

    /// Template with only the center star set
    pub fn blank() -> Self {
        let mut rows = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
        rows[CENTER][CENTER] = Some(TemplateCode::Star);
        Self { rows }
    }

    /// Code at a cell, `None` for plain cells or out-of-range coordinates
    pub fn code_at(&self, x: usize, y: usize) -> Option<TemplateCode> {
        self.rows.get(y).and_then(|row| row.get(x)).copied().flatten()
    }
}

impl TryFrom<TemplateRows> for BoardTemplate {
    type Error = TemplateError;

    fn try_from(rows: TemplateRows) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<BoardTemplate> for TemplateRows {
    fn from(template: BoardTemplate) -> Self {
        template.rows
    }
}
