//! The game aggregate and its error taxonomy.
//!
//! `Game` is plain data: board, bag, participants, turn bookkeeping and
//! move history. All transitions are driven by [`crate::engine::GameEngine`].

use crate::actions::Move;
use crate::bag::TileBag;
use crate::board::{Board, BoardError};
use crate::player::{GamePlayer, UserId};
use crate::rules::{RuleViolation, ViolationKind};
use crate::template::TemplateError;
use crate::tile::TileDistribution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for a second participant
    Pending,
    /// Both participants present, turns running
    Active,
    /// Terminal; no further mutation
    Finished,
}

/// Broad class of a rejected action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A placement or dictionary rule failed; the user can correct it
    Validation,
    /// The caller may not act on this game right now
    Authorization,
    /// The action does not apply to the game's current status
    IllegalState,
    /// The request referenced tiles the player does not hold
    DataIntegrity,
}

/// Errors that can occur when applying actions.
///
/// Every error is raised before any state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("{message}")]
    Validation { rule: String, message: String },

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Not a participant in this game")]
    NotParticipant,

    #[error("Cannot {action} while the game is {status:?}")]
    InvalidState { status: GameStatus, action: String },

    #[error("Game is full")]
    GameFull,

    #[error("Already joined this game")]
    AlreadyJoined,

    #[error("{message}")]
    TileNotInRack { message: String },

    #[error("Not enough tiles in the bag to swap ({available} left)")]
    InsufficientTiles { available: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid board template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    #[error("Turn has not expired yet")]
    TurnNotExpired,
}

impl GameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GameError::Validation { .. }
            | GameError::InsufficientTiles { .. }
            | GameError::UnsupportedLanguage(_)
            | GameError::InvalidTemplate(_)
            | GameError::Board(_) => ErrorCategory::Validation,
            GameError::NotYourTurn | GameError::NotParticipant => ErrorCategory::Authorization,
            GameError::InvalidState { .. }
            | GameError::GameFull
            | GameError::AlreadyJoined
            | GameError::TurnNotExpired => ErrorCategory::IllegalState,
            GameError::TileNotInRack { .. } => ErrorCategory::DataIntegrity,
        }
    }

    pub(crate) fn invalid_state(status: GameStatus, action: &str) -> Self {
        GameError::InvalidState {
            status,
            action: action.to_string(),
        }
    }
}

impl From<RuleViolation> for GameError {
    fn from(violation: RuleViolation) -> Self {
        match violation.kind {
            ViolationKind::Placement => GameError::Validation {
                rule: violation.rule.to_string(),
                message: violation.message,
            },
            ViolationKind::Integrity => GameError::TileNotInRack {
                message: violation.message,
            },
        }
    }
}

/// The complete state of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    /// Language code used for the bag and dictionary lookups
    pub language: String,
    pub status: GameStatus,
    pub board: Board,
    pub bag: TileBag,
    /// Participants in join order
    pub players: Vec<GamePlayer>,
    /// Set only while the game is active
    pub current_turn: Option<UserId>,
    pub consecutive_passes: u32,
    /// `None` while running, and on a draw
    pub winner_id: Option<UserId>,
    pub turn_expires_at: Option<DateTime<Utc>>,
    /// A "turn about to expire" reminder went out for the current turn
    pub expiry_reminder_sent: bool,
    /// Player who emptied their rack on an empty bag, leaving the opponent one turn
    pub final_turn_owed_by: Option<UserId>,
    pub moves: Vec<Move>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    pub fn player(&self, user: UserId) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.user_id == user)
    }

    pub(crate) fn player_mut(&mut self, user: UserId) -> Option<&mut GamePlayer> {
        self.players.iter_mut().find(|p| p.user_id == user)
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.player(user).is_some()
    }

    /// First participant other than `user`
    pub fn opponent_of(&self, user: UserId) -> Option<UserId> {
        self.players
            .iter()
            .find(|p| p.user_id != user)
            .map(|p| p.user_id)
    }

    /// Player following `user` in the fixed turn rotation
    pub fn next_in_rotation(&self, user: UserId) -> Option<UserId> {
        let mut order: Vec<&GamePlayer> = self.players.iter().collect();
        order.sort_by_key(|p| p.turn_order);
        let pos = order.iter().position(|p| p.user_id == user)?;
        order.get((pos + 1) % order.len()).map(|p| p.user_id)
    }

    /// Current scores in join order
    pub fn scores(&self) -> Vec<(UserId, u32)> {
        self.players.iter().map(|p| (p.user_id, p.score)).collect()
    }

    /// Tiles held by the bag, every rack and the board together
    pub fn tile_count(&self) -> usize {
        self.bag.total_held()
            + self.players.iter().map(|p| p.rack.len()).sum::<usize>()
            + self.board.occupied_count()
    }

    /// Size of the full tile set for this game's language
    pub fn total_tiles_for_language(&self) -> usize {
        TileDistribution::for_language(&self.language).map_or(0, |d| d.total_tiles())
    }

    /// Serialize the whole aggregate as one JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a game saved with [`Game::to_json`]. Board templates are
    /// validated again on the way in.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            GameError::Validation {
                rule: "no_gaps".into(),
                message: "gap".into()
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(GameError::NotYourTurn.category(), ErrorCategory::Authorization);
        assert_eq!(
            GameError::invalid_state(GameStatus::Finished, "pass").category(),
            ErrorCategory::IllegalState
        );
        assert_eq!(
            GameError::TileNotInRack {
                message: "missing".into()
            }
            .category(),
            ErrorCategory::DataIntegrity
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = GameError::invalid_state(GameStatus::Pending, "play");
        assert_eq!(err.to_string(), "Cannot play while the game is Pending");
    }

    #[test]
    fn test_rule_violation_conversion() {
        let err: GameError = RuleViolation {
            rule: "tiles_in_rack",
            kind: ViolationKind::Integrity,
            message: "Tile not in rack.".into(),
        }
        .into();
        assert!(matches!(err, GameError::TileNotInRack { .. }));

        let err: GameError = RuleViolation {
            rule: "no_gaps",
            kind: ViolationKind::Placement,
            message: "There are gaps between the placed tiles.".into(),
        }
        .into();
        assert_eq!(err.to_string(), "There are gaps between the placed tiles.");
    }
}
