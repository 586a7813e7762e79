//! Application settings loading from config.toml
//!
//! Every field has a built-in default, so a missing `config.toml` still yields
//! a usable configuration. A present but malformed file is an error.

use crate::{
    entities::EventKind,
    errors::{Error, Result},
};
use chrono_tz::Tz;
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// IANA timezone of the campus, e.g. `America/Los_Angeles`
    pub timezone: String,
    /// Meetup event settings
    pub events: EventSettings,
    /// Coin economy settings
    pub economy: EconomySettings,
}

/// Settings for dining and podrun events
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// How long a resolved event lingers before its rows are deleted
    pub deletion_delay_secs: u64,
    /// Dining halls offered in the venue picker
    pub venues: Vec<String>,
    /// Per-kind opening windows; a kind without entries is unrestricted
    pub windows: Vec<WindowConfig>,
}

/// One opening window for a meal kind
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Event kind this window applies to
    pub kind: EventKind,
    /// Weekday abbreviations (`Mon` .. `Sun`)
    pub days: Vec<String>,
    /// Local opening time, `HH:MM`
    pub start: String,
    /// Local closing time, `HH:MM`, inclusive
    pub end: String,
}

/// Settings for the coin economy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EconomySettings {
    /// Balance of a freshly created wallet
    pub starting_balance: i64,
    /// Coins granted by `/daily`
    pub daily_amount: i64,
    /// Hours between two `/daily` claims
    pub daily_cooldown_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Los_Angeles".to_string(),
            events: EventSettings::default(),
            economy: EconomySettings::default(),
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];
        const WEEKEND: [&str; 2] = ["Sat", "Sun"];
        const ALL_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

        let window = |kind, days: &[&str], start: &str, end: &str| WindowConfig {
            kind,
            days: days.iter().map(ToString::to_string).collect(),
            start: start.to_string(),
            end: end.to_string(),
        };

        Self {
            deletion_delay_secs: 300,
            venues: vec![
                "North Dining Hall".to_string(),
                "South Dining Hall".to_string(),
                "West Commons".to_string(),
            ],
            windows: vec![
                window(EventKind::Breakfast, &WEEKDAYS, "07:00", "10:30"),
                window(EventKind::Breakfast, &WEEKEND, "09:00", "11:00"),
                window(EventKind::Lunch, &WEEKDAYS, "11:00", "15:00"),
                window(EventKind::Lunch, &WEEKEND, "11:00", "14:00"),
                window(EventKind::Dinner, &ALL_DAYS, "16:30", "21:00"),
            ],
        }
    }
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            daily_amount: 100,
            daily_cooldown_hours: 24,
        }
    }
}

impl AppConfig {
    /// Parses the configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| Error::Config {
            message: format!("Invalid timezone '{}': {e}", self.timezone),
        })
    }
}

impl EventSettings {
    /// Delay before a resolved event is deleted.
    #[must_use]
    pub const fn deletion_delay(&self) -> Duration {
        Duration::from_secs(self.deletion_delay_secs)
    }

    /// Whether `venue` is one of the configured dining halls (case-insensitive).
    #[must_use]
    pub fn canonical_venue(&self, venue: &str) -> Option<&str> {
        let wanted = venue.trim();
        self.venues
            .iter()
            .find(|v| v.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads the configuration from `CONFIG_PATH` (default `config.toml`).
///
/// A missing file falls back to [`AppConfig::default`].
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::warn!("Config file {} not found, using built-in defaults", path);
        return Ok(AppConfig::default());
    }
    let config = load_config(&path)?;
    tracing::info!("Loaded configuration from {}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            timezone = "America/New_York"

            [events]
            deletion_delay_secs = 60
            venues = ["Hall A", "Hall B"]

            [[events.windows]]
            kind = "dinner"
            days = ["Mon", "Tue"]
            start = "17:00"
            end = "20:00"

            [economy]
            starting_balance = 50
            daily_amount = 25
            daily_cooldown_hours = 12
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tz().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.events.deletion_delay(), Duration::from_secs(60));
        assert_eq!(config.events.venues, vec!["Hall A", "Hall B"]);
        assert_eq!(config.events.windows.len(), 1);
        assert_eq!(config.events.windows[0].kind, EventKind::Dinner);
        assert_eq!(config.economy.daily_amount, 25);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("timezone = \"UTC\"").unwrap();
        assert_eq!(config.events.deletion_delay_secs, 300);
        assert_eq!(config.economy.starting_balance, 100);
        assert!(!config.events.windows.is_empty());
    }

    #[test]
    fn test_invalid_timezone_is_config_error() {
        let config = AppConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.tz(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_canonical_venue_lookup() {
        let settings = EventSettings::default();
        assert_eq!(
            settings.canonical_venue("  north dining hall "),
            Some("North Dining Hall")
        );
        assert_eq!(settings.canonical_venue("Food Truck"), None);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
        let shipped = load_config(path).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(shipped.timezone, defaults.timezone);
        assert_eq!(shipped.events.venues, defaults.events.venues);
        assert_eq!(shipped.events.windows.len(), defaults.events.windows.len());
        for (a, b) in shipped.events.windows.iter().zip(&defaults.events.windows) {
            assert_eq!((a.kind, &a.days, &a.start, &a.end), (b.kind, &b.days, &b.start, &b.end));
        }
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            load_config("/nonexistent/dining_buddy.toml"),
            Err(Error::Config { .. })
        ));
    }
}
