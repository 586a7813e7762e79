//! Event store - persistence for events and their participants.
//!
//! The database is the single source of truth for event state. Every status
//! change is a conditional write (`status = active`), so when two tasks race
//! to resolve the same event only the first write applies and the other sees
//! `false`. Uniqueness of active events per key is backed by the unique index
//! on `events.key`.

use crate::{
    entities::{Event, EventKind, EventStatus, Participant, Rsvp, event, participant},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};

/// Everything needed to persist a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Natural dedup key
    pub key: String,
    /// Guild the event belongs to
    pub guild_id: String,
    /// Channel the event is posted in
    pub channel_id: String,
    /// Creator's user ID
    pub creator_id: String,
    /// Creator's display name
    pub creator_name: String,
    /// Kind of event
    pub kind: EventKind,
    /// Optional venue picked at creation
    pub venue: Option<String>,
    /// When the event resolves
    pub scheduled_at: DateTime<Utc>,
    /// Creation instant
    pub created_at: DateTime<Utc>,
}

/// Whether an active event exists for `key`.
pub async fn exists<C: ConnectionTrait>(db: &C, key: &str) -> Result<bool> {
    Ok(get_active(db, key).await?.is_some())
}

/// Fetches the event stored under `key`, whatever its status.
pub async fn get<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<event::Model>> {
    Event::find()
        .filter(event::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fetches the active event stored under `key`.
pub async fn get_active<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<event::Model>> {
    Event::find()
        .filter(event::Column::Key.eq(key))
        .filter(event::Column::Status.eq(EventStatus::Active))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists active events in a channel, soonest first.
pub async fn active_in_channel<C: ConnectionTrait>(
    db: &C,
    channel_id: &str,
) -> Result<Vec<event::Model>> {
    Event::find()
        .filter(event::Column::ChannelId.eq(channel_id))
        .filter(event::Column::Status.eq(EventStatus::Active))
        .order_by_asc(event::Column::ScheduledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every active event, soonest first.
pub async fn all_active<C: ConnectionTrait>(db: &C) -> Result<Vec<event::Model>> {
    Event::find()
        .filter(event::Column::Status.eq(EventStatus::Active))
        .order_by_asc(event::Column::ScheduledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts a new active event with its creator as the first attendee.
///
/// A terminal event still occupying the key is removed first. Returns
/// [`Error::DuplicateActiveEvent`] when an active event holds the key, including
/// when a concurrent insert wins the race to the unique index.
pub async fn insert(db: &DatabaseConnection, new: NewEvent) -> Result<event::Model> {
    let txn = db.begin().await?;

    if let Some(existing) = get(&txn, &new.key).await? {
        if existing.status == EventStatus::Active {
            return Err(Error::DuplicateActiveEvent { key: new.key });
        }
        tracing::debug!(key = %new.key, "Replacing resolved event {}", existing.id);
        delete_event_rows(&txn, existing.id).await?;
    }

    let key = new.key.clone();
    let event = event::ActiveModel {
        key: Set(new.key),
        guild_id: Set(new.guild_id),
        channel_id: Set(new.channel_id),
        creator_id: Set(new.creator_id.clone()),
        creator_name: Set(new.creator_name.clone()),
        kind: Set(new.kind),
        venue: Set(new.venue),
        message_id: Set(None),
        scheduled_at: Set(new.scheduled_at),
        created_at: Set(new.created_at),
        status: Set(EventStatus::Active),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| map_unique_violation(e, &key))?;

    participant::ActiveModel {
        event_id: Set(event.id),
        user_id: Set(new.creator_id),
        username: Set(new.creator_name),
        rsvp: Set(Rsvp::Attending),
        updated_at: Set(new.created_at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit()
        .await
        .map_err(|e| map_unique_violation(e, &key))?;

    Ok(event)
}

fn map_unique_violation(err: DbErr, key: &str) -> Error {
    if is_unique_violation(&err) {
        Error::DuplicateActiveEvent {
            key: key.to_string(),
        }
    } else {
        err.into()
    }
}

/// Moves an active event to `to`. Returns `false` if the event was no longer active.
pub async fn transition<C: ConnectionTrait>(
    db: &C,
    event_id: i64,
    to: EventStatus,
) -> Result<bool> {
    let result = Event::update_many()
        .col_expr(event::Column::Status, Expr::value(to))
        .filter(event::Column::Id.eq(event_id))
        .filter(event::Column::Status.eq(EventStatus::Active))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Moves the active event under `key` to `to`. Returns `false` if none was active.
pub async fn update_status<C: ConnectionTrait>(
    db: &C,
    key: &str,
    to: EventStatus,
) -> Result<bool> {
    let result = Event::update_many()
        .col_expr(event::Column::Status, Expr::value(to))
        .filter(event::Column::Key.eq(key))
        .filter(event::Column::Status.eq(EventStatus::Active))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Sets the venue of an active event. Returns `false` if the event was no longer active.
pub async fn set_venue<C: ConnectionTrait>(db: &C, event_id: i64, venue: &str) -> Result<bool> {
    let result = Event::update_many()
        .col_expr(event::Column::Venue, Expr::value(venue))
        .filter(event::Column::Id.eq(event_id))
        .filter(event::Column::Status.eq(EventStatus::Active))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Records the Discord message that renders the event.
pub async fn set_message_id<C: ConnectionTrait>(
    db: &C,
    event_id: i64,
    message_id: &str,
) -> Result<()> {
    Event::update_many()
        .col_expr(event::Column::MessageId, Expr::value(message_id))
        .filter(event::Column::Id.eq(event_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Records a user's RSVP, replacing any previous answer.
///
/// Runs as delete-then-insert in one transaction; the unique index on
/// `(event_id, user_id)` keeps a user out of both lists. When a concurrent
/// RSVP of the same user wins the insert, the transaction is replayed once so
/// the last answer wins. Fails with [`Error::EventNotFound`] if the event is
/// no longer active by the time the transaction runs.
pub async fn upsert_participant(
    db: &DatabaseConnection,
    event_id: i64,
    user_id: &str,
    username: &str,
    rsvp: Rsvp,
    now: DateTime<Utc>,
) -> Result<()> {
    match replace_participant(db, event_id, user_id, username, rsvp, now).await {
        Err(Error::Database(e)) if is_unique_violation(&e) => {
            tracing::debug!(event_id, user_id, "Concurrent RSVP collided, replaying");
            replace_participant(db, event_id, user_id, username, rsvp, now).await
        }
        other => other,
    }
}

async fn replace_participant(
    db: &DatabaseConnection,
    event_id: i64,
    user_id: &str,
    username: &str,
    rsvp: Rsvp,
    now: DateTime<Utc>,
) -> Result<()> {
    let txn = db.begin().await?;

    let event = Event::find_by_id(event_id)
        .one(&txn)
        .await?
        .filter(|e| e.status == EventStatus::Active)
        .ok_or_else(|| Error::EventNotFound {
            key: event_id.to_string(),
        })?;

    Participant::delete_many()
        .filter(participant::Column::EventId.eq(event.id))
        .filter(participant::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    participant::ActiveModel {
        event_id: Set(event.id),
        user_id: Set(user_id.to_string()),
        username: Set(username.to_string()),
        rsvp: Set(rsvp),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// All RSVPs of an event in the order they were given.
pub async fn participants<C: ConnectionTrait>(
    db: &C,
    event_id: i64,
) -> Result<Vec<participant::Model>> {
    Participant::find()
        .filter(participant::Column::EventId.eq(event_id))
        .order_by_asc(participant::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes resolved events stored under `key`, together with their participants.
///
/// Active events are never touched, so a deferred deletion that fires after the
/// key was reused leaves the new event alone. Returns the number of events removed.
pub async fn delete_by_key(db: &DatabaseConnection, key: &str) -> Result<u64> {
    let txn = db.begin().await?;

    let resolved = Event::find()
        .filter(event::Column::Key.eq(key))
        .filter(event::Column::Status.ne(EventStatus::Active))
        .all(&txn)
        .await?;

    for event in &resolved {
        delete_event_rows(&txn, event.id).await?;
    }

    txn.commit().await?;
    Ok(resolved.len() as u64)
}

/// Deletes the event with `event_id` and its participants if it is resolved.
///
/// Returns whether a row was removed. An active event, or one already gone, is
/// left alone.
pub async fn delete_resolved(db: &DatabaseConnection, event_id: i64) -> Result<bool> {
    let txn = db.begin().await?;

    let resolved = Event::find_by_id(event_id)
        .filter(event::Column::Status.ne(EventStatus::Active))
        .one(&txn)
        .await?;
    if resolved.is_some() {
        delete_event_rows(&txn, event_id).await?;
    }

    txn.commit().await?;
    Ok(resolved.is_some())
}

async fn delete_event_rows<C: ConnectionTrait>(db: &C, event_id: i64) -> Result<()> {
    Participant::delete_many()
        .filter(participant::Column::EventId.eq(event_id))
        .exec(db)
        .await?;
    Event::delete_by_id(event_id).exec(db).await?;
    Ok(())
}
