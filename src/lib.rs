//! `DiningBuddy` - A Discord bot for campus meal meetups
//!
//! Members start breakfast, lunch, dinner and podrun events in a channel,
//! others join or decline with buttons, and at the scheduled time the bot
//! announces who is going. A small coin economy with daily rewards and
//! roulette rounds it out.

#![deny(unsafe_code, unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::all,
    clippy::pedantic,
    clippy::clone_on_ref_ptr,
    clippy::expect_used,
    clippy::unwrap_used
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

/// Discord bot interface - commands, handlers, and bot context
pub mod bot;
/// Configuration management for database and application settings
pub mod config;
/// Core business logic - framework-agnostic event lifecycle, time handling and economy
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;
