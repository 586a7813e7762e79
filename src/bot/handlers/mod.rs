//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete,
//! button clicks and select menus, plus the announcer that posts event results.

/// Posting announcements and refreshing event messages
pub mod announcer;
/// Autocomplete handlers for venue names
pub mod autocomplete;
/// Button and select-menu routing for event messages
pub mod components;

pub use announcer::DiscordAnnouncer;
pub use components::event_handler;
