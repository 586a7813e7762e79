//! Rendering of events into Discord embeds and message components.
//!
//! Every component carries a custom id of the form `event:{action}:{key}`, so
//! the interaction handler can route a click without any in-memory state.

use crate::{
    core::{
        EventView,
        summary::{kind_emoji, kind_label},
    },
    entities::{EventStatus, ParticipantModel},
};
use poise::serenity_prelude as serenity;
use serenity::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
    CreateSelectMenu, CreateSelectMenuKind, CreateSelectMenuOption,
};

const CUSTOM_ID_PREFIX: &str = "event";

/// Discord caps select menus at 25 options.
const MAX_SELECT_OPTIONS: usize = 25;

const COLOUR_ACTIVE: u32 = 0x2E_CC_71;
const COLOUR_COMPLETED: u32 = 0x34_98_DB;
const COLOUR_CANCELLED: u32 = 0x95_A5_A6;

/// What a component on an event message does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// Mark the clicking user as attending
    Join,
    /// Mark the clicking user as not coming
    Decline,
    /// Resolve the event now (creator only)
    Go,
    /// Call the event off (creator only)
    Cancel,
    /// Pick a venue from the select menu (creator only)
    Venue,
}

impl EventAction {
    /// Token used inside custom ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Decline => "decline",
            Self::Go => "go",
            Self::Cancel => "cancel",
            Self::Venue => "venue",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "join" => Some(Self::Join),
            "decline" => Some(Self::Decline),
            "go" => Some(Self::Go),
            "cancel" => Some(Self::Cancel),
            "venue" => Some(Self::Venue),
            _ => None,
        }
    }
}

/// Builds the custom id of a component acting on the event stored under `key`.
#[must_use]
pub fn custom_id(action: EventAction, key: &str) -> String {
    format!("{CUSTOM_ID_PREFIX}:{}:{key}", action.as_str())
}

/// Splits a custom id into action and event key.
///
/// Returns `None` for components that don't belong to an event message.
#[must_use]
pub fn parse_custom_id(id: &str) -> Option<(EventAction, &str)> {
    let rest = id.strip_prefix(CUSTOM_ID_PREFIX)?.strip_prefix(':')?;
    let (action, key) = rest.split_once(':')?;
    if key.is_empty() {
        return None;
    }
    Some((EventAction::parse(action)?, key))
}

/// Embed and components for an event message.
#[must_use]
pub fn render(view: &EventView, venues: &[String]) -> (CreateEmbed, Vec<CreateActionRow>) {
    (event_embed(view), event_components(view, venues))
}

/// The embed describing an event in its current state.
#[must_use]
pub fn event_embed(view: &EventView) -> CreateEmbed {
    let event = &view.event;
    let unix = event.scheduled_at.timestamp();

    let colour = match event.status {
        EventStatus::Active => COLOUR_ACTIVE,
        EventStatus::Completed => COLOUR_COMPLETED,
        EventStatus::Cancelled => COLOUR_CANCELLED,
    };

    let mut embed = CreateEmbed::new()
        .title(title(view))
        .description(format!("<t:{unix}:t> (<t:{unix}:R>)"))
        .colour(colour)
        .field(
            format!("Going ({})", view.attendees.len()),
            format_people(&view.attendees),
            true,
        )
        .field(
            format!("Not going ({})", view.declined.len()),
            format_people(&view.declined),
            true,
        )
        .footer(CreateEmbedFooter::new(format!(
            "Started by {}",
            event.creator_name
        )));

    if let Some(venue) = &event.venue {
        let label = if event.kind.is_meal() { "Venue" } else { "Meeting point" };
        embed = embed.field(label, venue, false);
    }
    embed
}

/// Buttons, plus a venue picker for meals. Resolved events get none.
#[must_use]
pub fn event_components(view: &EventView, venues: &[String]) -> Vec<CreateActionRow> {
    if !view.is_active() {
        return Vec::new();
    }
    let key = &view.event.key;

    let mut buttons = vec![
        CreateButton::new(custom_id(EventAction::Join, key))
            .label("Join")
            .style(ButtonStyle::Success),
        CreateButton::new(custom_id(EventAction::Decline, key))
            .label("Decline")
            .style(ButtonStyle::Secondary),
    ];
    if view.privileged_actions_available() {
        buttons.push(
            CreateButton::new(custom_id(EventAction::Go, key))
                .label("Go now")
                .style(ButtonStyle::Primary),
        );
        buttons.push(
            CreateButton::new(custom_id(EventAction::Cancel, key))
                .label("Cancel")
                .style(ButtonStyle::Danger),
        );
    }
    let mut rows = vec![CreateActionRow::Buttons(buttons)];

    if view.event.kind.is_meal() && view.privileged_actions_available() && !venues.is_empty() {
        let current = view.event.venue.as_deref();
        let options = venues
            .iter()
            .take(MAX_SELECT_OPTIONS)
            .map(|venue| {
                CreateSelectMenuOption::new(venue, venue)
                    .default_selection(current == Some(venue.as_str()))
            })
            .collect();
        rows.push(CreateActionRow::SelectMenu(
            CreateSelectMenu::new(
                custom_id(EventAction::Venue, key),
                CreateSelectMenuKind::String { options },
            )
            .placeholder("📍 Choose a venue"),
        ));
    }
    rows
}

fn title(view: &EventView) -> String {
    let kind = view.event.kind;
    let base = format!("{} {}", kind_emoji(kind), kind_label(kind));
    match view.event.status {
        EventStatus::Active => base,
        EventStatus::Completed => format!("{base} (done)"),
        EventStatus::Cancelled => format!("{base} (cancelled)"),
    }
}

/// Mentions of `people`, one per line, or a dash when empty.
#[must_use]
pub fn format_people(people: &[ParticipantModel]) -> String {
    if people.is_empty() {
        return "-".to_string();
    }
    people
        .iter()
        .map(|p| format!("<@{}>", p.user_id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entities::{EventKind, Rsvp},
        test_utils::{test_event_model, test_participant},
    };

    fn view(kind: EventKind, status: EventStatus) -> EventView {
        let mut event = test_event_model("G1-C1-dinner-Mon", "U1");
        event.kind = kind;
        event.status = status;
        EventView {
            event,
            attendees: vec![test_participant("U1", Rsvp::Attending)],
            declined: vec![],
        }
    }

    fn venues() -> Vec<String> {
        vec!["North Dining Hall".to_string(), "West Commons".to_string()]
    }

    #[test]
    fn test_custom_id_parsing() {
        let id = custom_id(EventAction::Decline, "G1-C1-dinner-Mon");
        assert_eq!(id, "event:decline:G1-C1-dinner-Mon");
        assert_eq!(
            parse_custom_id(&id),
            Some((EventAction::Decline, "G1-C1-dinner-Mon"))
        );
    }

    #[test]
    fn test_foreign_custom_ids_are_ignored() {
        assert_eq!(parse_custom_id("pronouns_he"), None);
        assert_eq!(parse_custom_id("event:dance:G1-C1-dinner-Mon"), None);
        assert_eq!(parse_custom_id("event:join:"), None);
        assert_eq!(parse_custom_id("eventual:join:key"), None);
    }

    #[test]
    fn test_meals_get_a_venue_picker() {
        let rows = event_components(&view(EventKind::Dinner, EventStatus::Active), &venues());
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], CreateActionRow::Buttons(buttons) if buttons.len() == 4));
        assert!(matches!(&rows[1], CreateActionRow::SelectMenu(_)));
    }

    #[test]
    fn test_podrun_has_buttons_only() {
        let rows = event_components(&view(EventKind::Podrun, EventStatus::Active), &venues());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_resolved_events_have_no_components() {
        for status in [EventStatus::Completed, EventStatus::Cancelled] {
            assert!(event_components(&view(EventKind::Lunch, status), &venues()).is_empty());
        }
    }

    #[test]
    fn test_title_reflects_status() {
        assert_eq!(title(&view(EventKind::Lunch, EventStatus::Active)), "🥪 Lunch");
        assert_eq!(
            title(&view(EventKind::Podrun, EventStatus::Cancelled)),
            "🏃 Podrun (cancelled)"
        );
    }

    #[test]
    fn test_format_people() {
        assert_eq!(format_people(&[]), "-");
        let people = vec![
            test_participant("U1", Rsvp::Attending),
            test_participant("U2", Rsvp::Attending),
        ];
        assert_eq!(format_people(&people), "<@U1>\n<@U2>");
    }
}
