//! Discord side of event announcements.

use crate::{
    bot::views,
    core::{Announcer, EventView},
    entities::EventModel,
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, warn};

/// Posts announcements in the event's channel and retires the event message.
pub struct DiscordAnnouncer {
    http: Arc<serenity::Http>,
}

impl DiscordAnnouncer {
    /// Creates an announcer sending through `http`.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Announcer for DiscordAnnouncer {
    async fn announce(&self, event: &EventModel, text: &str) -> Result<()> {
        let http: &serenity::Http = &self.http;
        let channel = channel_id(&event.channel_id)?;
        channel.say(http, text).await?;

        // The rendering message may be gone or never attached; the announcement
        // itself already went out.
        if let Some(message) = event.message_id.as_deref().and_then(parse_snowflake) {
            if let Err(e) = channel
                .edit_message(
                    http,
                    serenity::MessageId::new(message),
                    serenity::EditMessage::new().components(vec![]),
                )
                .await
            {
                warn!(key = %event.key, "Failed to retire event message: {}", e);
            }
        }
        debug!(key = %event.key, "Announcement posted");
        Ok(())
    }
}

/// Re-renders the message of `view` in place, if it has one.
pub async fn refresh_event_message(
    http: &serenity::Http,
    view: &EventView,
    venues: &[String],
) -> Result<()> {
    let Some(message) = view.event.message_id.as_deref().and_then(parse_snowflake) else {
        return Ok(());
    };
    let (embed, components) = views::render(view, venues);
    channel_id(&view.event.channel_id)?
        .edit_message(
            http,
            serenity::MessageId::new(message),
            serenity::EditMessage::new().embed(embed).components(components),
        )
        .await?;
    Ok(())
}

fn channel_id(raw: &str) -> Result<serenity::ChannelId> {
    parse_snowflake(raw)
        .map(serenity::ChannelId::new)
        .ok_or_else(|| Error::InvalidInput {
            message: format!("'{raw}' is not a Discord channel"),
        })
}

/// Parses a stored snowflake. Zero is rejected since serenity ids can't hold it.
fn parse_snowflake(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}
