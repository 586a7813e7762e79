//! Participant entity - One user's RSVP to an event.
//!
//! A user has at most one row per event; switching between attending and
//! declined replaces the row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// RSVP answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Rsvp {
    /// Coming
    #[sea_orm(string_value = "attending")]
    Attending,
    /// Not coming
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Participant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Event this RSVP belongs to
    pub event_id: i64,
    /// Discord user ID
    pub user_id: String,
    /// Display name at the time of the RSVP
    pub username: String,
    /// Attending or declined
    pub rsvp: Rsvp,
    /// When the RSVP was last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Participant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each participant belongs to one event
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
