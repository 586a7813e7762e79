//! Announcement text for resolved events.

use crate::entities::{EventKind, EventModel, ParticipantModel, Rsvp};

/// Outcome of an event at its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Nobody is attending, not even the creator
    NobodyJoined,
    /// A single attendee is left, usually the creator
    OnlyOne {
        /// The lone attendee
        user_id: String,
    },
    /// Two or more people are going
    Gathering {
        /// Attendees in RSVP order
        user_ids: Vec<String>,
    },
}

impl Summary {
    /// Classifies the RSVPs of an event. Declined users are ignored.
    #[must_use]
    pub fn from_participants(participants: &[ParticipantModel]) -> Self {
        let mut attending: Vec<String> = participants
            .iter()
            .filter(|p| p.rsvp == Rsvp::Attending)
            .map(|p| p.user_id.clone())
            .collect();

        match attending.len() {
            0 => Self::NobodyJoined,
            1 => Self::OnlyOne {
                user_id: attending.remove(0),
            },
            _ => Self::Gathering {
                user_ids: attending,
            },
        }
    }

    /// An event with at most one attendee is announced as called off.
    #[must_use]
    pub const fn is_effectively_cancelled(&self) -> bool {
        matches!(self, Self::NobodyJoined | Self::OnlyOne { .. })
    }

    /// Text posted in the event channel when the event resolves.
    #[must_use]
    pub fn render(&self, event: &EventModel) -> String {
        let what = describe_event(event);
        match self {
            Self::NobodyJoined => {
                format!("😢 Nobody wanted to join the {what}, so it's off.")
            }
            Self::OnlyOne { user_id } if *user_id == event.creator_id => {
                format!("😢 Nobody wanted to join <@{user_id}> for the {what}, so it's off.")
            }
            Self::OnlyOne { user_id } => {
                format!("😢 Only <@{user_id}> signed up for the {what}, so it's off.")
            }
            Self::Gathering { user_ids } => {
                let mentions: Vec<String> = user_ids.iter().map(|id| format!("<@{id}>")).collect();
                format!(
                    "{} It's time for the {what}! {}",
                    kind_emoji(event.kind),
                    mentions.join(" ")
                )
            }
        }
    }
}

/// "dinner at West Commons", "podrun", ...
fn describe_event(event: &EventModel) -> String {
    match &event.venue {
        Some(venue) => format!("{} at {venue}", event.kind),
        None => event.kind.to_string(),
    }
}

/// Capitalized name of an event kind.
#[must_use]
pub const fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Breakfast => "Breakfast",
        EventKind::Lunch => "Lunch",
        EventKind::Dinner => "Dinner",
        EventKind::Podrun => "Podrun",
    }
}

/// Emoji used in titles and announcements.
#[must_use]
pub const fn kind_emoji(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Breakfast => "🥞",
        EventKind::Lunch => "🥪",
        EventKind::Dinner => "🍽️",
        EventKind::Podrun => "🏃",
    }
}
