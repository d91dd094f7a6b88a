//! Wordsquare host - runs the game core for many concurrent games.
//!
//! The host serializes writes to each game, stores games behind a
//! repository interface, fans transition events out as notifications and
//! sweeps for expired turns.

pub mod config;
pub mod notify;
pub mod service;
pub mod store;
pub mod sweep;

pub use config::Config;
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifier};
pub use service::{GameService, ServiceError};
pub use store::{GameRepository, InMemoryRepository, StoreError, StoredGame};
pub use sweep::{run_sweep, sweep_once, SweepReport};
