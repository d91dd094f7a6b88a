use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use wordsquare_core::GameSettings;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<language>.txt` word list per language
    pub dictionary_path: PathBuf,
    pub default_language: String,
    pub sweep_interval_secs: u64,
    pub reminder_lead_secs: i64,
    pub game: GameSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameSettings::default();

        let game = GameSettings {
            turn_duration_secs: match lookup("TURN_DURATION_SECS") {
                Some(v) => v.parse().context("TURN_DURATION_SECS must be a number")?,
                None => defaults.turn_duration_secs,
            },
            blank_chance: match lookup("BLANK_CHANCE") {
                Some(v) => v.parse().context("BLANK_CHANCE must be a number")?,
                None => defaults.blank_chance,
            },
            ..defaults
        };

        Ok(Self {
            dictionary_path: lookup("DICTIONARY_PATH")
                .unwrap_or_else(|| "./dictionaries".to_string())
                .into(),
            default_language: lookup("DEFAULT_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            sweep_interval_secs: lookup("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .context("SWEEP_INTERVAL_SECS must be a number")?,
            reminder_lead_secs: lookup("REMINDER_LEAD_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .context("REMINDER_LEAD_SECS must be a number")?,
            game,
        })
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn reminder_lead(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reminder_lead_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.default_language, "en");
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.reminder_lead(), chrono::Duration::hours(1));
        assert_eq!(config.game, GameSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DICTIONARY_PATH", "/srv/words"),
            ("TURN_DURATION_SECS", "600"),
            ("BLANK_CHANCE", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.dictionary_path, PathBuf::from("/srv/words"));
        assert_eq!(config.game.turn_duration_secs, 600);
        assert_eq!(config.game.blank_chance, 0.5);
        assert_eq!(config.game.rack_size, 7);
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("SWEEP_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("SWEEP_INTERVAL_SECS"));
    }
}
