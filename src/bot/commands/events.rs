//! Event Discord commands - meal meetups, podruns and cancellation.
//!
//! `/breakfast`, `/lunch`, `/dinner` and `/podrun` all go through the same
//! flow: parse the civil time, derive the channel-scoped key, create the event
//! through the controller, then post the event message and remember its id.

use crate::{
    config::EventSettings,
    entities::EventKind,
    errors::{Error, Result},
};
use chrono::NaiveDate;

/// Longest free-text meeting point accepted for podruns.
const MAX_PLACE_LEN: usize = 100;

/// Furthest day ahead an event can be planned. Keys carry only the weekday, so
/// the horizon stays under a week.
const MAX_DAYS_AHEAD: i64 = 6;

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{check_horizon, resolve_venue};
    use crate::{
        bot::{
            BotData,
            handlers::{announcer::refresh_event_message, autocomplete},
            member_from_user, views,
        },
        core::{
            CreateRequest, clock, event_key, store,
            summary::{kind_emoji, kind_label},
        },
        entities::EventKind,
        errors::{Error, Result},
    };
    use std::fmt::Write;
    use tracing::warn;

    type Context<'a> = poise::Context<'a, BotData, Error>;

    /// Event kinds offered by `/cancel_event`.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum EventKindChoice {
        #[name = "breakfast"]
        Breakfast,
        #[name = "lunch"]
        Lunch,
        #[name = "dinner"]
        Dinner,
        #[name = "podrun"]
        Podrun,
    }

    impl From<EventKindChoice> for EventKind {
        fn from(choice: EventKindChoice) -> Self {
            match choice {
                EventKindChoice::Breakfast => Self::Breakfast,
                EventKindChoice::Lunch => Self::Lunch,
                EventKindChoice::Dinner => Self::Dinner,
                EventKindChoice::Podrun => Self::Podrun,
            }
        }
    }

    /// Invites the channel to breakfast.
    #[poise::command(slash_command, guild_only)]
    pub async fn breakfast(
        ctx: Context<'_>,
        #[description = "When to meet, e.g. 8:30am"] time: String,
        #[description = "Day, e.g. tomorrow or 03/14 (defaults to today)"] date: Option<String>,
        #[description = "Dining hall"]
        #[autocomplete = "autocomplete::autocomplete_venue"]
        venue: Option<String>,
    ) -> Result<()> {
        start_event(ctx, EventKind::Breakfast, &time, date.as_deref(), venue).await
    }

    /// Invites the channel to lunch.
    #[poise::command(slash_command, guild_only)]
    pub async fn lunch(
        ctx: Context<'_>,
        #[description = "When to meet, e.g. 12:15pm"] time: String,
        #[description = "Day, e.g. tomorrow or 03/14 (defaults to today)"] date: Option<String>,
        #[description = "Dining hall"]
        #[autocomplete = "autocomplete::autocomplete_venue"]
        venue: Option<String>,
    ) -> Result<()> {
        start_event(ctx, EventKind::Lunch, &time, date.as_deref(), venue).await
    }

    /// Invites the channel to dinner.
    #[poise::command(slash_command, guild_only)]
    pub async fn dinner(
        ctx: Context<'_>,
        #[description = "When to meet, e.g. 6pm"] time: String,
        #[description = "Day, e.g. tomorrow or 03/14 (defaults to today)"] date: Option<String>,
        #[description = "Dining hall"]
        #[autocomplete = "autocomplete::autocomplete_venue"]
        venue: Option<String>,
    ) -> Result<()> {
        start_event(ctx, EventKind::Dinner, &time, date.as_deref(), venue).await
    }

    /// Rallies the channel for a podrun.
    #[poise::command(slash_command, guild_only)]
    pub async fn podrun(
        ctx: Context<'_>,
        #[description = "When to leave, e.g. 11pm"] time: String,
        #[description = "Day, e.g. tomorrow or 03/14 (defaults to today)"] date: Option<String>,
        #[description = "Where to meet"] place: Option<String>,
    ) -> Result<()> {
        start_event(ctx, EventKind::Podrun, &time, date.as_deref(), place).await
    }

    /// Calls off an event you started in this channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn cancel_event(
        ctx: Context<'_>,
        #[description = "Which event to cancel"] kind: EventKindChoice,
        #[description = "Day of the event (defaults to today)"] date: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let kind = EventKind::from(kind);
        let guild_id = guild_id(ctx)?;
        let civil = data.controller.civil();
        let today = civil.local_date(data.controller.now());
        let day = match date.as_deref() {
            Some(raw) => clock::parse_date(raw, today)?,
            None => today,
        };
        check_horizon(day, today)?;

        let key = event_key(&guild_id, &ctx.channel_id().to_string(), kind, day);
        let view = data
            .controller
            .cancel(&key, &member_from_user(ctx.author()))
            .await
            .map_err(|e| match e {
                Error::EventNotFound { .. } => Error::InvalidInput {
                    message: format!(
                        "There's no open {kind} in this channel on {}.",
                        day.format("%a %b %-d")
                    ),
                },
                other => other,
            })?;

        if let Err(e) = refresh_event_message(ctx.http(), &view, &data.config.events.venues).await {
            warn!(key = %key, "Failed to update cancelled event message: {}", e);
        }
        ctx.say(format!("{} {} cancelled.", kind_emoji(kind), kind_label(kind)))
            .await?;
        Ok(())
    }

    /// Lists the events still open in this channel.
    #[poise::command(slash_command, guild_only, rename = "events")]
    pub async fn list_events(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let open = store::active_in_channel(&data.database, &ctx.channel_id().to_string()).await?;

        if open.is_empty() {
            ctx.say("Nothing is planned in this channel. Start something with `/dinner 6pm`!")
                .await?;
            return Ok(());
        }

        let mut text = String::from("**Open events**\n");
        for event in &open {
            write!(
                text,
                "{} {} <t:{}:f>",
                kind_emoji(event.kind),
                kind_label(event.kind),
                event.scheduled_at.timestamp()
            )?;
            if let Some(venue) = &event.venue {
                write!(text, " at {venue}")?;
            }
            writeln!(text, " (by {})", event.creator_name)?;
        }
        ctx.say(text).await?;
        Ok(())
    }

    fn guild_id(ctx: Context<'_>) -> Result<String> {
        ctx.guild_id()
            .map(|id| id.to_string())
            .ok_or_else(|| Error::InvalidInput {
                message: "Events can only be planned in a server channel.".to_string(),
            })
    }

    async fn start_event(
        ctx: Context<'_>,
        kind: EventKind,
        time: &str,
        date: Option<&str>,
        venue: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let guild_id = guild_id(ctx)?;
        let channel_id = ctx.channel_id().to_string();
        let civil = data.controller.civil();

        let now = data.controller.now();
        let scheduled_at = civil.parse_civil_datetime(now, date, time)?;
        let day = civil.local_date(scheduled_at);
        check_horizon(day, civil.local_date(now))?;
        let venue = resolve_venue(&data.config.events, kind, venue)?;
        let key = event_key(&guild_id, &channel_id, kind, day);

        let view = data
            .controller
            .create(CreateRequest {
                key: key.clone(),
                guild_id,
                channel_id,
                creator: member_from_user(ctx.author()),
                kind,
                venue,
                scheduled_at,
            })
            .await?;

        let (embed, components) = views::render(&view, &data.config.events.venues);
        let reply = ctx
            .send(
                poise::CreateReply::default()
                    .embed(embed)
                    .components(components),
            )
            .await?;
        let message = reply.message().await?;
        data.controller
            .attach_message(&key, &message.id.to_string())
            .await
    }
}

/// Rejects days in the past or more than [`MAX_DAYS_AHEAD`] days from `today`,
/// so a weekday in an event key names exactly one date.
fn check_horizon(day: NaiveDate, today: NaiveDate) -> Result<()> {
    let ahead = (day - today).num_days();
    if ahead < 0 {
        return Err(Error::InvalidTime {
            message: format!("{} has already passed.", day.format("%a %b %-d")),
        });
    }
    if ahead > MAX_DAYS_AHEAD {
        return Err(Error::InvalidTime {
            message: format!("Events can be planned at most {MAX_DAYS_AHEAD} days ahead."),
        });
    }
    Ok(())
}

/// Validates the optional venue of a new event.
///
/// Meals must name a configured dining hall, matched case-insensitively and
/// stored under its configured spelling. Podrun meeting points are free text.
fn resolve_venue(
    settings: &EventSettings,
    kind: EventKind,
    raw: Option<String>,
) -> Result<Option<String>> {
    let Some(raw) = raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if !kind.is_meal() {
        if raw.chars().count() > MAX_PLACE_LEN {
            return Err(Error::InvalidInput {
                message: format!("Keep the meeting point under {MAX_PLACE_LEN} characters."),
            });
        }
        return Ok(Some(raw));
    }

    settings
        .canonical_venue(&raw)
        .map(|venue| Some(venue.to_string()))
        .ok_or_else(|| Error::InvalidInput {
            message: format!(
                "'{raw}' is not a dining venue. Pick one of: {}",
                settings.venues.join(", ")
            ),
        })
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_meal_venues_are_canonicalized() {
        let settings = EventSettings::default();
        assert_eq!(
            resolve_venue(&settings, EventKind::Dinner, Some("  west commons ".to_string())).ok(),
            Some(Some("West Commons".to_string()))
        );
        assert!(matches!(
            resolve_venue(&settings, EventKind::Lunch, Some("Taco Bell".to_string())),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_blank_venue_is_none() {
        let settings = EventSettings::default();
        assert_eq!(
            resolve_venue(&settings, EventKind::Breakfast, Some("   ".to_string())).ok(),
            Some(None)
        );
        assert_eq!(resolve_venue(&settings, EventKind::Breakfast, None).ok(), Some(None));
    }

    #[test]
    fn test_horizon_keeps_weekday_keys_unique() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert!(check_horizon(monday, monday).is_ok());
        assert!(check_horizon(sunday, monday).is_ok());
        // Same weekday as today, so it would share today's key
        assert!(matches!(
            check_horizon(next_monday, monday),
            Err(Error::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_horizon_rejects_past_days() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let sunday_before = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert!(matches!(
            check_horizon(sunday_before, monday),
            Err(Error::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_podrun_place_is_free_text() {
        let settings = EventSettings::default();
        assert_eq!(
            resolve_venue(&settings, EventKind::Podrun, Some("Lot 7".to_string())).ok(),
            Some(Some("Lot 7".to_string()))
        );
        assert!(resolve_venue(&settings, EventKind::Podrun, Some("x".repeat(101))).is_err());
    }
}
