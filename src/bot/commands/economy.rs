//! Coin economy Discord commands - balance, daily reward, roulette and leaderboard.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, member_from_user},
        core::economy::{self, RouletteColor},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    type Context<'a> = poise::Context<'a, BotData, Error>;

    const LEADERBOARD_SIZE: u64 = 10;

    /// Colors offered by `/roulette`.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ColorChoice {
        #[name = "red (pays 2x)"]
        Red,
        #[name = "black (pays 2x)"]
        Black,
        #[name = "green (pays 36x)"]
        Green,
    }

    impl From<ColorChoice> for RouletteColor {
        fn from(choice: ColorChoice) -> Self {
            match choice {
                ColorChoice::Red => Self::Red,
                ColorChoice::Black => Self::Black,
                ColorChoice::Green => Self::Green,
            }
        }
    }

    /// Shows how many coins you have.
    #[poise::command(slash_command)]
    pub async fn balance(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let member = member_from_user(ctx.author());
        let coins = economy::balance(
            &data.database,
            &member,
            &data.config.economy,
            data.controller.now(),
        )
        .await?;

        ctx.say(format!("💰 {}, you have **{coins}** coins.", member.name))
            .await?;
        Ok(())
    }

    /// Claims your daily coins.
    #[poise::command(slash_command)]
    pub async fn daily(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let member = member_from_user(ctx.author());
        let claim = economy::claim_daily(
            &data.database,
            &member,
            &data.config.economy,
            data.controller.now(),
        )
        .await?;

        ctx.say(format!(
            "🎁 +{} coins! You now have **{}**. Come back <t:{}:R>.",
            claim.amount,
            claim.balance,
            claim.next_claim_at.timestamp()
        ))
        .await?;
        Ok(())
    }

    /// Bets coins on a color of the roulette wheel.
    #[poise::command(slash_command)]
    pub async fn roulette(
        ctx: Context<'_>,
        #[description = "How many coins to bet"]
        #[min = 1]
        bet: i64,
        #[description = "Color to bet on"] color: ColorChoice,
    ) -> Result<()> {
        let data = ctx.data();
        let member = member_from_user(ctx.author());
        let choice = RouletteColor::from(color);
        let pocket = economy::spin(&mut rand::thread_rng());

        let outcome = economy::play_roulette(
            &data.database,
            &member,
            &data.config.economy,
            bet,
            choice,
            pocket,
            data.controller.now(),
        )
        .await?;

        let verdict = if outcome.won {
            format!("You won **{}** coins!", outcome.net)
        } else {
            format!("You lost **{}** coins.", -outcome.net)
        };
        ctx.say(format!(
            "🎰 The ball lands on {} **{}**. {verdict} Balance: **{}**.",
            outcome.color.emoji(),
            outcome.pocket,
            outcome.balance
        ))
        .await?;
        Ok(())
    }

    /// Shows the richest players.
    #[poise::command(slash_command)]
    pub async fn leaderboard(ctx: Context<'_>) -> Result<()> {
        let wallets = economy::leaderboard(&ctx.data().database, LEADERBOARD_SIZE).await?;
        if wallets.is_empty() {
            ctx.say("Nobody has any coins yet. Try `/daily`!").await?;
            return Ok(());
        }

        let mut description = String::new();
        for (rank, wallet) in wallets.iter().enumerate() {
            writeln!(
                description,
                "**{}.** {} - {} coins",
                rank + 1,
                wallet.username,
                wallet.balance
            )?;
        }

        let embed = serenity::CreateEmbed::new()
            .title("🏆 Leaderboard")
            .description(description)
            .colour(0xF1_C4_0F);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
