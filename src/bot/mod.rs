//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the dining bot, including
//! all slash commands, component handlers, and bot context management.

/// Discord command implementations (events, economy, general)
pub mod commands;
/// Discord interaction handlers (components, autocomplete, announcements)
pub mod handlers;
/// Rendering of events into embeds and components
pub mod views;

use crate::{
    config::AppConfig,
    core::{
        EventController, LifecycleSettings, Member,
        clock::{CivilTime, MealWindows, SystemClock},
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::{env, sync::Arc};
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the event controller and
/// the application configuration.
pub struct BotData {
    /// Database connection for wallet operations
    pub database: DatabaseConnection,
    /// Owner of every event state transition
    pub controller: EventController,
    /// Loaded application configuration
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        controller: EventController,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            database,
            controller,
            config,
        }
    }
}

/// Reduces a Discord user to the canonical id and a display name.
#[must_use]
pub fn member_from_user(user: &serenity::User) -> Member {
    let name = user.global_name.as_deref().unwrap_or(&user.name);
    Member::new(user.id.to_string(), name)
}

/// Controller settings derived from the configuration.
pub fn lifecycle_settings(config: &AppConfig) -> Result<LifecycleSettings> {
    Ok(LifecycleSettings {
        civil: CivilTime::new(config.tz()?),
        windows: MealWindows::from_config(&config.events.windows)?,
        deletion_delay: config.events.deletion_delay(),
    })
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                warn!("Command `{}` rejected: {}", ctx.command().name, error);
            } else {
                error!("Error in command `{}`: {:?}", ctx.command().name, error);
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

fn dev_guild() -> Option<serenity::GuildId> {
    let raw = env::var("DEV_GUILD_ID").ok()?;
    match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Some(serenity::GuildId::new(id)),
        _ => {
            warn!("Ignoring invalid DEV_GUILD_ID '{}'", raw);
            None
        }
    }
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let settings = lifecycle_settings(&config)?;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if let Some(guild_id) = dev_guild() {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {}", guild_id);
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Registered commands globally");
                }

                let announcer = Arc::new(handlers::DiscordAnnouncer::new(Arc::clone(&ctx.http)));
                let controller = EventController::new(
                    database.clone(),
                    Arc::new(SystemClock),
                    announcer,
                    settings,
                );
                controller.restore_pending().await?;
                Ok(BotData::new(database, controller, config))
            })
        })
        .build();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, serenity::GatewayIntents::non_privileged())
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
