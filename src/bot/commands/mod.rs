//! Discord command implementations organized by category.

/// Coin economy commands
pub mod economy;

/// Meal and podrun event commands
pub mod events;

/// General utility commands
pub mod general;

// Export commands
pub use economy::*;
pub use events::*;
pub use general::*;

use crate::{bot::BotData, errors::Error};

/// Every slash command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        breakfast(),
        lunch(),
        dinner(),
        podrun(),
        cancel_event(),
        list_events(),
        balance(),
        daily(),
        roulette(),
        leaderboard(),
        ping(),
        help(),
    ]
}
