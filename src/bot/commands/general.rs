//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        entities::EventKind,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Explains the available commands and when meals can be planned.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let mut help_text = String::from(
            "**Dining Buddy Help**\n\
            Plan meals and podruns with your channel.\n\n\
            **Events**\n\
            • `/breakfast <time> [date] [venue]` - Invite the channel to breakfast.\n\
            • `/lunch <time> [date] [venue]` - Invite the channel to lunch.\n\
            • `/dinner <time> [date] [venue]` - Invite the channel to dinner.\n\
            • `/podrun <time> [date] [place]` - Rally a podrun.\n\
            • `/cancel_event <kind> [date]` - Call off an event you started.\n\
            • `/events` - List the events open in this channel.\n\
            Use the buttons on an event to join or decline. The creator can pick the venue, \
            start early with **Go now** or **Cancel**.\n\n\
            **Coins**\n\
            • `/balance` - Show your coins.\n\
            • `/daily` - Claim your daily coins.\n\
            • `/roulette <bet> <color>` - Red or black pays 2x, green pays 36x.\n\
            • `/leaderboard` - The richest players.\n\n\
            **Utility**\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.\n\n\
            **Meal hours**\n",
        );

        let windows = ctx.data().controller.windows();
        for kind in [EventKind::Breakfast, EventKind::Lunch, EventKind::Dinner] {
            writeln!(help_text, "• {kind}: {}", windows.describe(kind))?;
        }

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
