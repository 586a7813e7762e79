//! Wallet entity - Per-user coin balance for the economy commands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID owning the wallet
    #[sea_orm(unique)]
    pub user_id: String,
    /// Last known display name, used by the leaderboard
    pub username: String,
    /// Coin balance
    pub balance: i64,
    /// Last time the daily reward was claimed
    pub last_daily: Option<DateTimeUtc>,
    /// When the wallet was last modified
    pub updated_at: DateTimeUtc,
}

/// `Wallet` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
