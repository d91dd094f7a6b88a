//! Wordsquare - rules and scoring core for a two-player word placement game
//!
//! This crate provides the game logic, including:
//! - The 15x15 board with its multiplier layout and word extraction
//! - Letter tiles, per-language distributions and the shared tile bag
//! - A composable turn-validation pipeline
//! - A composable scoring pipeline
//! - The turn and game state machine, including the two-stage end of the game
//!
//! # Architecture
//!
//! All state lives in plain data ([`Game`], [`GamePlayer`], [`Move`]) and is
//! driven by a [`GameEngine`]. The engine does no I/O: randomness, the
//! current time and the dictionary are passed in by the host, which is also
//! responsible for serializing writes to each game.
//!
//! # Modules
//!
//! - [`tile`], [`bag`]: tiles, distributions and the bag
//! - [`board`], [`template`]: the grid, multipliers and word extraction
//! - [`rules`], [`scoring`]: validation and scoring pipelines
//! - [`engine`]: game orchestration

pub mod actions;
pub mod bag;
pub mod board;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod game;
pub mod player;
pub mod rules;
pub mod scoring;
pub mod template;
pub mod tile;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Move, MoveKind};
pub use bag::TileBag;
pub use board::{Board, BoardError, Orientation, SquareType, Word, BOARD_SIZE, CENTER};
pub use config::GameSettings;
pub use dictionary::{Dictionary, DictionaryError, WordList};
pub use engine::GameEngine;
pub use game::{ErrorCategory, Game, GameError, GameStatus};
pub use player::{GamePlayer, UserId};
pub use rules::{Rule, RuleEngine, RuleResult, RuleViolation, ValidationMode, ViolationKind};
pub use scoring::{MoveScore, ScoringEngine, ScoringRule};
pub use template::{BoardTemplate, TemplateCode, TemplateError, TemplateRows};
pub use tile::{PlacedTile, Tile, TileDistribution};
