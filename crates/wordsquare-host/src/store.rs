//! Game persistence.
//!
//! A repository stores each game aggregate as one unit together with a
//! version number. Saves name the version they were based on, and a stale
//! save is rejected rather than overwriting a newer write.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;
use wordsquare_core::Game;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Game {0} not found")]
    NotFound(Uuid),

    #[error("Game {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: Uuid, expected: u64, found: u64 },
}

/// A game as last written, with its version
#[derive(Debug, Clone)]
pub struct StoredGame {
    pub game: Game,
    /// Starts at 1 and grows by one per save
    pub version: u64,
}

pub trait GameRepository: Send + Sync {
    fn load(&self, id: Uuid) -> Result<StoredGame, StoreError>;

    /// Write `game` if the stored version still equals `expected_version`
    /// (0 for a game that has never been saved). Returns the new version.
    fn save(&self, game: &Game, expected_version: u64) -> Result<u64, StoreError>;

    /// Ids of every game currently in the active state
    fn list_active(&self) -> Vec<Uuid>;
}

/// Process-local repository
#[derive(Default)]
pub struct InMemoryRepository {
    games: DashMap<Uuid, StoredGame>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameRepository for InMemoryRepository {
    fn load(&self, id: Uuid) -> Result<StoredGame, StoreError> {
        self.games
            .get(&id)
            .map(|stored| stored.clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn save(&self, game: &Game, expected_version: u64) -> Result<u64, StoreError> {
        match self.games.entry(game.id) {
            Entry::Occupied(mut entry) => {
                let found = entry.get().version;
                if found != expected_version {
                    return Err(StoreError::VersionConflict {
                        id: game.id,
                        expected: expected_version,
                        found,
                    });
                }
                let version = found + 1;
                entry.insert(StoredGame {
                    game: game.clone(),
                    version,
                });
                Ok(version)
            }
            Entry::Vacant(entry) => {
                if expected_version != 0 {
                    return Err(StoreError::VersionConflict {
                        id: game.id,
                        expected: expected_version,
                        found: 0,
                    });
                }
                entry.insert(StoredGame {
                    game: game.clone(),
                    version: 1,
                });
                Ok(1)
            }
        }
    }

    fn list_active(&self) -> Vec<Uuid> {
        self.games
            .iter()
            .filter(|stored| stored.game.is_active())
            .map(|stored| *stored.key())
            .collect()
    }
}
