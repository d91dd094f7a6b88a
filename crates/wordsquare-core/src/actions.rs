//! Player actions, the move history they produce, and transition events.

use crate::player::UserId;
use crate::scoring::MoveScore;
use crate::tile::{PlacedTile, Tile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a participant can ask the engine to do on their turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Place tiles from the rack on the board
    Play(Vec<PlacedTile>),
    /// Give up the turn without placing tiles
    Pass,
    /// Exchange rack tiles with tiles from the bag
    Swap(Vec<Tile>),
    /// Leave the game; the opponent wins
    Resign,
}

impl GameAction {
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::Play(_) => "play",
            GameAction::Pass => "pass",
            GameAction::Swap(_) => "swap",
            GameAction::Resign => "resign",
        }
    }
}

/// What an accepted action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    Play {
        tiles: Vec<PlacedTile>,
        words: Vec<String>,
        score: MoveScore,
    },
    Pass {
        /// Forced by the turn timer rather than chosen
        timed_out: bool,
    },
    Swap {
        count: usize,
        /// Used the one-time free swap
        free: bool,
    },
    Resign,
}

/// One entry of a game's move history. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub user_id: UserId,
    pub kind: MoveKind,
    pub created_at: DateTime<Utc>,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A second participant joined
    PlayerJoined { user: UserId },

    /// The game became active
    GameStarted {
        first_player: UserId,
        turn_expires_at: DateTime<Utc>,
    },

    /// Tiles were placed and scored
    TilesPlaced {
        user: UserId,
        words: Vec<String>,
        score: u32,
    },

    /// A turn was passed
    TurnPassed { user: UserId, timed_out: bool },

    /// Rack tiles were exchanged
    TilesSwapped {
        user: UserId,
        count: usize,
        free: bool,
    },

    /// The blank fairness rule handed a player their blank
    BlankAwarded { user: UserId },

    /// A player emptied their rack on an empty bag; `owed_to` gets one last turn
    FinalTurnOwed { finisher: UserId, owed_to: UserId },

    /// The turn moved to the next player
    TurnSwitched {
        from: UserId,
        to: UserId,
        turn_expires_at: DateTime<Utc>,
    },

    /// A player resigned
    PlayerResigned { user: UserId },

    /// The game is over; `winner` is `None` on a draw
    GameFinished {
        winner: Option<UserId>,
        scores: Vec<(UserId, u32)>,
    },
}
