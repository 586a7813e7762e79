//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases, a pinned clock and a
//! controller whose announcements are recorded instead of sent.

#![allow(clippy::unwrap_used)]

use crate::{
    config::EventSettings,
    core::{
        Announcer, EventController, LifecycleSettings,
        clock::{CivilTime, FixedClock, MealWindows},
        store::NewEvent,
    },
    entities::{EventKind, EventModel, EventStatus, ParticipantModel, Rsvp},
    errors::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Monday 2025-03-03, 09:00 in Los Angeles.
#[must_use]
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 17, 0, 0).unwrap()
}

/// Monday 2025-03-03, 16:30 in Los Angeles, when dinner opens.
#[must_use]
pub fn monday_dinner_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 0, 30, 0).unwrap()
}

/// A dinner event in guild `G1`, channel `C1`.
#[must_use]
pub fn test_new_event(key: &str, creator: &str) -> NewEvent {
    NewEvent {
        key: key.to_string(),
        guild_id: "G1".to_string(),
        channel_id: "C1".to_string(),
        creator_id: creator.to_string(),
        creator_name: format!("user {creator}"),
        kind: EventKind::Dinner,
        venue: None,
        scheduled_at: monday_dinner_time(),
        created_at: monday_morning(),
    }
}

/// An active event row that was never stored.
#[must_use]
pub fn test_event_model(key: &str, creator: &str) -> EventModel {
    EventModel {
        id: 1,
        key: key.to_string(),
        guild_id: "G1".to_string(),
        channel_id: "C1".to_string(),
        creator_id: creator.to_string(),
        creator_name: format!("user {creator}"),
        kind: EventKind::Dinner,
        venue: None,
        message_id: None,
        scheduled_at: monday_dinner_time(),
        created_at: monday_morning(),
        status: EventStatus::Active,
    }
}

/// A participant row of event 1 that was never stored.
#[must_use]
pub fn test_participant(user_id: &str, rsvp: Rsvp) -> ParticipantModel {
    ParticipantModel {
        id: 0,
        event_id: 1,
        user_id: user_id.to_string(),
        username: format!("user {user_id}"),
        rsvp,
        updated_at: monday_morning(),
    }
}

/// Announcer that keeps every announcement in memory.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    texts: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    /// Announcements received so far, oldest first.
    pub async fn texts(&self) -> Vec<String> {
        self.texts.lock().await.clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce(&self, _event: &EventModel, text: &str) -> Result<()> {
        self.texts.lock().await.push(text.to_string());
        Ok(())
    }
}

/// A controller over a fresh database, a pinned clock and a recording announcer.
pub struct Harness {
    /// The database behind the controller
    pub db: DatabaseConnection,
    /// Controller under test
    pub controller: EventController,
    /// Where the controller's announcements end up
    pub announcer: Arc<RecordingAnnouncer>,
}

impl Harness {
    /// Clock at [`monday_morning`], deletion delayed long enough to never run.
    pub async fn new() -> Result<Self> {
        Self::with_clock(monday_morning(), Duration::from_secs(3600)).await
    }

    /// Custom clock and deletion delay.
    pub async fn with_clock(now: DateTime<Utc>, deletion_delay: Duration) -> Result<Self> {
        let db = setup_test_db().await?;
        let announcer = Arc::new(RecordingAnnouncer::default());
        let settings = LifecycleSettings {
            civil: CivilTime::new(chrono_tz::America::Los_Angeles),
            windows: MealWindows::from_config(&EventSettings::default().windows)?,
            deletion_delay,
        };
        let controller = EventController::new(
            db.clone(),
            Arc::new(FixedClock(now)),
            Arc::clone(&announcer) as Arc<dyn Announcer>,
            settings,
        );
        Ok(Self {
            db,
            controller,
            announcer,
        })
    }
}
