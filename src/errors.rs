//! Unified error type for the bot.
//!
//! Every layer returns [`Result`]. Variants fall in two groups: user-facing
//! rejections (bad input, duplicates, privilege checks) that are shown to the
//! person who triggered them, and internal failures (database, Discord, I/O)
//! that are logged and replaced by a generic message.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the configuration, core and bot layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any persistence-layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed user input that is not about time
    #[error("{message}")]
    InvalidInput {
        /// Explanation shown to the user
        message: String,
    },

    /// Unparseable time, time in the past, or outside the allowed window
    #[error("{message}")]
    InvalidTime {
        /// Explanation shown to the user
        message: String,
    },

    /// An active event already occupies this key
    #[error("There is already an active event for `{key}`")]
    DuplicateActiveEvent {
        /// The contested event key
        key: String,
    },

    /// Privileged action attempted by someone other than the creator
    #[error("Only the event creator can {action}")]
    Forbidden {
        /// The rejected action, phrased as a verb
        action: String,
    },

    /// No active event exists for this key
    #[error("No active event found for `{key}`")]
    EventNotFound {
        /// The key that was looked up
        key: String,
    },

    /// Wallet balance too low for the requested bet
    #[error("Insufficient funds: you have {current} coins but need {required}")]
    InsufficientFunds {
        /// Current wallet balance
        current: i64,
        /// Amount the operation needs
        required: i64,
    },

    /// Daily reward already claimed within the cooldown window
    #[error("You already claimed your daily coins, try again in {}", format_remaining(.remaining))]
    CooldownActive {
        /// Time left until the next claim
        remaining: Duration,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Failure while formatting a message
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/poise failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether the message is meant for the user who triggered the error.
    ///
    /// Internal failures return `false` and should be logged instead of echoed.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::InvalidTime { .. }
                | Self::DuplicateActiveEvent { .. }
                | Self::Forbidden { .. }
                | Self::EventNotFound { .. }
                | Self::InsufficientFunds { .. }
                | Self::CooldownActive { .. }
        )
    }

    /// Text to show in Discord for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            format!("❌ {self}")
        } else {
            "❌ Something went wrong on our side. Please try again in a moment.".to_string()
        }
    }
}

fn format_remaining(remaining: &Duration) -> String {
    let total_minutes = remaining.as_secs().div_ceil(60);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(
            Error::Forbidden {
                action: "cancel this event".to_string()
            }
            .is_user_facing()
        );
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_user_facing());
    }

    #[test]
    fn test_internal_errors_are_not_echoed() {
        let err = Error::Database(sea_orm::DbErr::Custom("secret connection string".to_string()));
        assert!(!err.user_message().contains("secret"));
    }

    #[test]
    fn test_cooldown_message_rounds_up_minutes() {
        let err = Error::CooldownActive {
            remaining: Duration::from_secs(3 * 3600 + 61),
        };
        assert_eq!(
            err.to_string(),
            "You already claimed your daily coins, try again in 3h 2m"
        );
    }
}
