//! Event lifecycle controller.
//!
//! Owns the state machine of an event:
//!
//! ```text
//!   create ──> active ──cancel──> cancelled
//!                 │
//!                 └──deadline / finish──> completed
//! ```
//!
//! The controller is the only writer of `status`. It also owns the map of
//! pending deadline tasks and clears the matching entry inside every terminal
//! transition, so a stale timer can never announce an event twice. Resolved
//! events are deleted after a configurable delay.

use crate::{
    core::{
        clock::{CivilTime, Clock, MealWindows},
        store::{self, NewEvent},
        summary::{Summary, kind_label},
    },
    entities::{EventKind, EventModel, EventStatus, ParticipantModel, Rsvp},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// A Discord user reduced to what the controller needs.
///
/// `id` is the canonical decimal form of the snowflake; privilege checks
/// compare it with plain string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Canonical user ID
    pub id: String,
    /// Display name
    pub name: String,
}

impl Member {
    /// Creates a member from an already-normalized ID.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Builds the natural key of an event: one per guild, channel, kind and day.
#[must_use]
pub fn event_key(guild_id: &str, channel_id: &str, kind: EventKind, local_date: NaiveDate) -> String {
    format!("{guild_id}-{channel_id}-{kind}-{}", local_date.format("%a"))
}

/// A request to start a new event.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Natural key, see [`event_key`]
    pub key: String,
    /// Guild the event is created in
    pub guild_id: String,
    /// Channel the event is posted in
    pub channel_id: String,
    /// Who is creating it
    pub creator: Member,
    /// Kind of event
    pub kind: EventKind,
    /// Optional venue
    pub venue: Option<String>,
    /// When the event resolves
    pub scheduled_at: DateTime<Utc>,
}

/// Everything needed to render an event after a mutation.
#[derive(Debug, Clone)]
pub struct EventView {
    /// The event row
    pub event: EventModel,
    /// Users attending, in RSVP order
    pub attendees: Vec<ParticipantModel>,
    /// Users who declined, in RSVP order
    pub declined: Vec<ParticipantModel>,
}

impl EventView {
    fn new(event: EventModel, participants: Vec<ParticipantModel>) -> Self {
        let (attendees, declined): (Vec<_>, Vec<_>) = participants
            .into_iter()
            .partition(|p| p.rsvp == Rsvp::Attending);
        Self {
            event,
            attendees,
            declined,
        }
    }

    /// Whether the event still accepts interactions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.event.status == EventStatus::Active
    }

    /// Whether creator-only actions (cancel, finish, venue) can still be offered.
    #[must_use]
    pub fn privileged_actions_available(&self) -> bool {
        self.is_active()
    }

    /// Whether `user_id` may perform creator-only actions.
    #[must_use]
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.event.creator_id == user_id
    }

    /// IDs of attending users.
    #[must_use]
    pub fn attendee_ids(&self) -> Vec<&str> {
        self.attendees.iter().map(|p| p.user_id.as_str()).collect()
    }

    /// IDs of users who declined.
    #[must_use]
    pub fn declined_ids(&self) -> Vec<&str> {
        self.declined.iter().map(|p| p.user_id.as_str()).collect()
    }
}

/// Where resolution announcements go.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Publishes `text` for a just-completed `event`.
    async fn announce(&self, event: &EventModel, text: &str) -> Result<()>;
}

/// Static settings of the controller.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Campus timezone
    pub civil: CivilTime,
    /// Per-kind opening windows
    pub windows: MealWindows,
    /// Delay between resolution and deletion of the rows
    pub deletion_delay: Duration,
}

struct PendingDeadline {
    event_id: i64,
    handle: JoinHandle<()>,
}

struct Inner {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    announcer: Arc<dyn Announcer>,
    settings: LifecycleSettings,
    deadlines: Mutex<HashMap<String, PendingDeadline>>,
}

/// Drives events through their lifecycle. Cheap to clone.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Inner>,
}

impl EventController {
    /// Creates a controller over `db`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        announcer: Arc<dyn Announcer>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                clock,
                announcer,
                settings,
                deadlines: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Timezone conversions used by this controller.
    #[must_use]
    pub fn civil(&self) -> CivilTime {
        self.inner.settings.civil
    }

    /// Opening windows used to validate new events.
    #[must_use]
    pub fn windows(&self) -> &MealWindows {
        &self.inner.settings.windows
    }

    /// Current instant according to the controller's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Starts a new event and schedules its deadline.
    ///
    /// The creator is recorded as the first attendee. Nothing is scheduled
    /// unless the insert committed.
    #[instrument(skip(self, request), fields(key = %request.key, creator = %request.creator.id))]
    pub async fn create(&self, request: CreateRequest) -> Result<EventView> {
        let settings = &self.inner.settings;
        let now = self.now();

        if request.scheduled_at <= now {
            return Err(Error::InvalidTime {
                message: "That time has already passed. Pick a time later today or add a date."
                    .to_string(),
            });
        }

        let local = settings.civil.to_local(request.scheduled_at);
        if !settings.windows.is_within_window(request.kind, &local) {
            return Err(Error::InvalidTime {
                message: format!(
                    "{} can't be scheduled at {}. Allowed: {}.",
                    kind_label(request.kind),
                    local.format("%a %-I:%M%P"),
                    settings.windows.describe(request.kind)
                ),
            });
        }

        // Best-effort pre-check; the unique index on the key is the real guard.
        if store::exists(&self.inner.db, &request.key).await? {
            return Err(Error::DuplicateActiveEvent { key: request.key });
        }

        let event = store::insert(
            &self.inner.db,
            NewEvent {
                key: request.key,
                guild_id: request.guild_id,
                channel_id: request.channel_id,
                creator_id: request.creator.id,
                creator_name: request.creator.name,
                kind: request.kind,
                venue: request.venue,
                scheduled_at: request.scheduled_at,
                created_at: now,
            },
        )
        .await?;

        info!(
            event_id = event.id,
            "Created {} event scheduled for {}",
            event.kind,
            local.format("%Y-%m-%d %H:%M %Z")
        );
        self.schedule_deadline(&event).await;
        self.view_of(event).await
    }

    /// Records whether `member` is coming. Idempotent; last answer wins.
    #[instrument(skip(self, member), fields(user = %member.id))]
    pub async fn set_attendance(&self, key: &str, member: &Member, attending: bool) -> Result<EventView> {
        let event = self.active_event(key).await?;
        let rsvp = if attending {
            Rsvp::Attending
        } else {
            Rsvp::Declined
        };

        store::upsert_participant(
            &self.inner.db,
            event.id,
            &member.id,
            &member.name,
            rsvp,
            self.now(),
        )
        .await
        .map_err(|e| match e {
            Error::EventNotFound { .. } => Error::EventNotFound {
                key: key.to_string(),
            },
            other => other,
        })?;

        debug!(?rsvp, "RSVP recorded");
        self.view_of(event).await
    }

    /// Changes the venue. Creator only.
    #[instrument(skip(self, requester), fields(user = %requester.id))]
    pub async fn set_venue(&self, key: &str, requester: &Member, venue: &str) -> Result<EventView> {
        let mut event = self.active_event(key).await?;
        ensure_creator(&event, requester, "choose the venue")?;

        if !store::set_venue(&self.inner.db, event.id, venue).await? {
            return Err(Error::EventNotFound {
                key: key.to_string(),
            });
        }

        info!("Venue set to {}", venue);
        event.venue = Some(venue.to_string());
        self.view_of(event).await
    }

    /// Cancels the event and its pending deadline. Creator only.
    #[instrument(skip(self, requester), fields(user = %requester.id))]
    pub async fn cancel(&self, key: &str, requester: &Member) -> Result<EventView> {
        let mut event = self.active_event(key).await?;
        ensure_creator(&event, requester, "cancel this event")?;

        if !store::transition(&self.inner.db, event.id, EventStatus::Cancelled).await? {
            warn!("Event resolved before the cancellation landed");
            return Err(Error::EventNotFound {
                key: key.to_string(),
            });
        }

        self.clear_deadline(key, event.id).await;
        self.schedule_deletion(event.id);
        info!(event_id = event.id, "Event cancelled");

        event.status = EventStatus::Cancelled;
        self.view_of(event).await
    }

    /// Resolves the event right away instead of waiting for the deadline. Creator only.
    #[instrument(skip(self, requester), fields(user = %requester.id))]
    pub async fn finish(&self, key: &str, requester: &Member) -> Result<(EventView, Summary)> {
        let event = self.active_event(key).await?;
        ensure_creator(&event, requester, "start this event early")?;

        self.resolve(key, Some(event.id))
            .await?
            .ok_or_else(|| Error::EventNotFound {
                key: key.to_string(),
            })
    }

    /// Resolves the event whose deadline has passed.
    ///
    /// Returns `Ok(None)` without side effects when no active event exists for
    /// `key`, e.g. because it was cancelled first.
    #[instrument(skip(self))]
    pub async fn on_deadline(&self, key: &str) -> Result<Option<Summary>> {
        Ok(self.resolve(key, None).await?.map(|(_, summary)| summary))
    }

    /// Schedules deadlines for events left active by a previous run.
    ///
    /// Events whose time already passed resolve right away.
    #[instrument(skip(self))]
    pub async fn restore_pending(&self) -> Result<usize> {
        let active = store::all_active(&self.inner.db).await?;
        for event in &active {
            self.schedule_deadline(event).await;
        }
        if !active.is_empty() {
            info!(count = active.len(), "Restored pending deadlines");
        }
        Ok(active.len())
    }

    /// Remembers which Discord message renders the event.
    pub async fn attach_message(&self, key: &str, message_id: &str) -> Result<()> {
        match store::get(&self.inner.db, key).await? {
            Some(event) => store::set_message_id(&self.inner.db, event.id, message_id).await,
            None => {
                debug!(key, "Event vanished before its message was attached");
                Ok(())
            }
        }
    }

    /// Current state of the event stored under `key`, active or not.
    pub async fn view(&self, key: &str) -> Result<EventView> {
        let event = store::get(&self.inner.db, key)
            .await?
            .ok_or_else(|| Error::EventNotFound {
                key: key.to_string(),
            })?;
        self.view_of(event).await
    }

    /// Whether an active event exists under `key`.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        store::exists(&self.inner.db, key).await
    }

    /// Whether a deadline task is still pending for `key`.
    pub async fn has_pending_deadline(&self, key: &str) -> bool {
        self.inner
            .deadlines
            .lock()
            .await
            .get(key)
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    async fn active_event(&self, key: &str) -> Result<EventModel> {
        store::get_active(&self.inner.db, key)
            .await?
            .ok_or_else(|| Error::EventNotFound {
                key: key.to_string(),
            })
    }

    async fn view_of(&self, event: EventModel) -> Result<EventView> {
        let participants = store::participants(&self.inner.db, event.id).await?;
        Ok(EventView::new(event, participants))
    }

    /// Completes the active event under `key`, announces it and schedules cleanup.
    ///
    /// With `expected_id`, an event that has since been replaced under the same
    /// key is left alone.
    async fn resolve(&self, key: &str, expected_id: Option<i64>) -> Result<Option<(EventView, Summary)>> {
        let Some(mut event) = store::get_active(&self.inner.db, key).await? else {
            debug!(key, "No active event to resolve");
            return Ok(None);
        };
        if expected_id.is_some_and(|id| id != event.id) {
            debug!(key, "Deadline belongs to a replaced event");
            return Ok(None);
        }

        let participants = store::participants(&self.inner.db, event.id).await?;
        let summary = Summary::from_participants(&participants);

        if !store::transition(&self.inner.db, event.id, EventStatus::Completed).await? {
            warn!(key, "Event was resolved concurrently, skipping announcement");
            return Ok(None);
        }

        self.clear_deadline(key, event.id).await;
        self.schedule_deletion(event.id);
        event.status = EventStatus::Completed;

        info!(
            event_id = event.id,
            attendees = ?summary,
            "Event completed"
        );

        let text = summary.render(&event);
        if let Err(e) = self.inner.announcer.announce(&event, &text).await {
            error!(key, "Failed to announce completed event: {}", e);
        }

        Ok(Some((EventView::new(event, participants), summary)))
    }

    async fn schedule_deadline(&self, event: &EventModel) {
        let delay = (event.scheduled_at - self.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let key = event.key.clone();
        let event_id = event.id;
        let controller = self.clone();

        // Hold the lock across the spawn so the task cannot look for its own
        // entry before it is inserted.
        let mut deadlines = self.inner.deadlines.lock().await;
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.fire_deadline(&task_key, event_id).await;
        });

        debug!(key = %key, ?delay, "Deadline scheduled");
        if let Some(previous) = deadlines.insert(key, PendingDeadline { event_id, handle }) {
            previous.handle.abort();
        }
    }

    /// Body of the deadline task.
    async fn fire_deadline(&self, key: &str, event_id: i64) {
        {
            // Take our own entry without aborting: we are that task.
            let mut deadlines = self.inner.deadlines.lock().await;
            if deadlines.get(key).is_some_and(|p| p.event_id == event_id) {
                deadlines.remove(key);
            }
        }

        match self.resolve(key, Some(event_id)).await {
            Ok(Some(_)) => {}
            Ok(None) => debug!(key, "Deadline fired for an already resolved event"),
            Err(e) => error!(key, "Failed to resolve event at its deadline: {}", e),
        }
    }

    async fn clear_deadline(&self, key: &str, event_id: i64) {
        let mut deadlines = self.inner.deadlines.lock().await;
        if deadlines.get(key).is_some_and(|p| p.event_id == event_id) {
            if let Some(pending) = deadlines.remove(key) {
                pending.handle.abort();
                debug!(key, "Deadline cleared");
            }
        }
    }

    fn schedule_deletion(&self, event_id: i64) {
        let db = self.inner.db.clone();
        let delay = self.inner.settings.deletion_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store::delete_resolved(&db, event_id).await {
                Ok(removed) => debug!(event_id, removed, "Resolved event deleted"),
                Err(e) => error!(event_id, "Failed to delete resolved event: {}", e),
            }
        });
    }
}

fn ensure_creator(event: &EventModel, requester: &Member, action: &str) -> Result<()> {
    if event.creator_id == requester.id {
        Ok(())
    } else {
        warn!(
            key = %event.key,
            user = %requester.id,
            "Rejected privileged action: {}",
            action
        );
        Err(Error::Forbidden {
            action: action.to_string(),
        })
    }
}
