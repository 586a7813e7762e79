//! Event entity - A dining meetup or podrun gathering posted in a channel.
//!
//! The `key` column is unique: one row per (guild, channel, kind, day). Terminal
//! rows linger until deferred deletion removes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of gathering. Dining kinds are meal periods with opening windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Breakfast at a dining hall
    #[sea_orm(string_value = "breakfast")]
    Breakfast,
    /// Lunch at a dining hall
    #[sea_orm(string_value = "lunch")]
    Lunch,
    /// Dinner at a dining hall
    #[sea_orm(string_value = "dinner")]
    Dinner,
    /// Podrun gathering, no meal window
    #[sea_orm(string_value = "podrun")]
    Podrun,
}

impl EventKind {
    /// Lowercase identifier used in keys, config and custom ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Podrun => "podrun",
        }
    }

    /// Whether this kind is a dining-hall meal (and so has a venue picker).
    #[must_use]
    pub const fn is_meal(self) -> bool {
        !matches!(self, Self::Podrun)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EventStatus {
    /// Accepting RSVPs, deadline pending
    #[sea_orm(string_value = "active")]
    Active,
    /// Resolved at (or forced before) the deadline
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled by the creator
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Unique identifier for the event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Natural dedup key, see `core::event_key`
    #[sea_orm(unique)]
    pub key: String,
    /// Discord guild ID
    pub guild_id: String,
    /// Discord channel ID the event was posted in
    pub channel_id: String,
    /// Discord user ID of the creator
    pub creator_id: String,
    /// Display name of the creator at creation time
    pub creator_name: String,
    /// Kind of event
    pub kind: EventKind,
    /// Chosen dining hall or meeting spot
    pub venue: Option<String>,
    /// Discord message rendering the event, once posted
    pub message_id: Option<String>,
    /// When the event resolves
    pub scheduled_at: DateTimeUtc,
    /// When the event was created
    pub created_at: DateTimeUtc,
    /// Lifecycle status
    pub status: EventStatus,
}

/// Defines relationships between Event and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One event has many participants
    #[sea_orm(has_many = "super::participant::Entity")]
    Participants,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
