//! Tunable game settings.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default time a player has to act, in seconds (72 hours)
pub const DEFAULT_TURN_DURATION_SECS: i64 = 72 * 60 * 60;

/// Settings shared by every game an engine runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Tiles a full rack holds
    pub rack_size: usize,
    /// Participants per game
    pub player_count: usize,
    /// Time allowed per turn before an automatic pass
    pub turn_duration_secs: i64,
    /// Chance per draw that a player who has not had a blank gets one
    pub blank_chance: f64,
    /// Drawable tiles the bag must hold for a swap
    pub min_bag_for_swap: usize,
    /// Whether each player gets one swap that keeps the turn
    pub free_swap_enabled: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rack_size: 7,
            player_count: 2,
            turn_duration_secs: DEFAULT_TURN_DURATION_SECS,
            blank_chance: 0.10,
            min_bag_for_swap: 7,
            free_swap_enabled: true,
        }
    }
}

impl GameSettings {
    pub fn turn_duration(&self) -> Duration {
        Duration::seconds(self.turn_duration_secs)
    }

    /// `blank_chance` clamped into a valid probability
    pub fn blank_probability(&self) -> f64 {
        if self.blank_chance.is_nan() {
            0.0
        } else {
            self.blank_chance.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.rack_size, 7);
        assert_eq!(settings.player_count, 2);
        assert_eq!(settings.turn_duration(), Duration::hours(72));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let settings: GameSettings = serde_json::from_str(r#"{"blank_chance": 1.5}"#).unwrap();
        assert_eq!(settings.rack_size, 7);
        assert_eq!(settings.blank_probability(), 1.0);
    }
}
