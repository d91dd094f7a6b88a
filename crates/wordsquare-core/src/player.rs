//! Per-participant game state.
//!
//! This module contains the `GamePlayer` record with its rack and the two
//! once-per-game flags (free swap, blank received).

use crate::tile::{PlacedTile, Tile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user taking part in games
pub type UserId = Uuid;

/// A participant in one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayer {
    pub user_id: UserId,
    pub score: u32,
    /// Position in the fixed turn rotation, assigned when the game starts
    pub turn_order: u8,
    pub rack: Vec<Tile>,
    /// One penalty-free swap that keeps the turn
    pub has_free_swap: bool,
    /// Set once the blank fairness rule has fired; never reset
    pub has_received_blank: bool,
}

impl GamePlayer {
    pub fn new(user_id: UserId, turn_order: u8, free_swap: bool) -> Self {
        Self {
            user_id,
            score: 0,
            turn_order,
            rack: Vec::new(),
            has_free_swap: free_swap,
            has_received_blank: false,
        }
    }

    /// Sum of the point values left on the rack
    pub fn rack_points(&self) -> u32 {
        self.rack.iter().map(|t| t.points).sum()
    }

    pub fn rack_is_empty(&self) -> bool {
        self.rack.is_empty()
    }

    /// Rack indices consumed by `placed`, each physical tile used at most once.
    ///
    /// Blanks are matched by the blank flag and must carry 0 points, other
    /// tiles by letter and point value.
    /// Returns `None` if any placed tile cannot be found on the rack.
    pub fn match_placed(&self, placed: &[PlacedTile]) -> Option<Vec<usize>> {
        match_tiles(&self.rack, placed.iter().map(|p| p.tile))
    }

    /// Rack indices consumed by `tiles`, matched the same way as placed tiles
    pub fn match_tiles(&self, tiles: &[Tile]) -> Option<Vec<usize>> {
        match_tiles(&self.rack, tiles.iter().copied())
    }

    /// Remove the tiles at `indices` from the rack and return them
    pub fn take_from_rack(&mut self, indices: &[usize]) -> Vec<Tile> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        let mut taken = Vec::with_capacity(sorted.len());
        for i in sorted {
            if i < self.rack.len() {
                taken.push(self.rack.remove(i));
            }
        }
        taken.reverse();
        taken
    }
}

/// Find a distinct rack slot for every wanted tile
pub(crate) fn match_tiles<I>(rack: &[Tile], wanted: I) -> Option<Vec<usize>>
where
    I: IntoIterator<Item = Tile>,
{
    let mut used = vec![false; rack.len()];
    let mut indices = Vec::new();
    for tile in wanted {
        let slot = rack.iter().enumerate().position(|(i, held)| {
            !used[i]
                && held.is_blank == tile.is_blank
                && held.points == tile.points
                && (tile.is_blank || held.letter == tile.letter)
        })?;
        used[slot] = true;
        indices.push(slot);
    }
    Some(indices)
}
