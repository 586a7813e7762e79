//! Core business logic - framework-agnostic event lifecycle and economy.
//!
//! Nothing in here knows about Discord; the bot layer converts Discord users
//! into [`Member`]s and renders the views returned from these modules.

/// Clock abstraction, date/time parsing and meal windows
pub mod clock;
/// Coin wallets, daily rewards and roulette
pub mod economy;
/// Event state machine and deadline scheduling
pub mod lifecycle;
/// Persistence of events and participants
pub mod store;
/// Announcement text for resolved events
pub mod summary;

pub use lifecycle::{
    Announcer, CreateRequest, EventController, EventView, LifecycleSettings, Member, event_key,
};
