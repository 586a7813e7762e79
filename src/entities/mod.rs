//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod event;
pub mod participant;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use event::{
    Column as EventColumn, Entity as Event, EventKind, EventStatus, Model as EventModel,
};
pub use participant::{
    Column as ParticipantColumn, Entity as Participant, Model as ParticipantModel, Rsvp,
};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
