//! Coin economy business logic - wallets, daily rewards and roulette.
//!
//! Wallets are created lazily on first use with the configured starting
//! balance. Balance changes are applied with a single `balance = balance + delta`
//! statement inside a transaction, never read-modify-write.

use crate::{
    config::EconomySettings,
    core::Member,
    entities::{Wallet, wallet},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};

/// Red pockets of a European wheel; every other non-zero pocket is black.
const RED_POCKETS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Colors a roulette bet can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouletteColor {
    /// Eighteen red pockets, pays 2×
    Red,
    /// Eighteen black pockets, pays 2×
    Black,
    /// The single zero, pays 36×
    Green,
}

impl RouletteColor {
    /// Color of a wheel pocket (0–36).
    #[must_use]
    pub fn of_pocket(pocket: u8) -> Self {
        if pocket == 0 {
            Self::Green
        } else if RED_POCKETS.contains(&pocket) {
            Self::Red
        } else {
            Self::Black
        }
    }

    /// Total returned per coin staked when this color wins.
    #[must_use]
    pub const fn payout_multiplier(self) -> i64 {
        match self {
            Self::Red | Self::Black => 2,
            Self::Green => 36,
        }
    }

    /// Emoji for result messages.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Red => "🔴",
            Self::Black => "⚫",
            Self::Green => "🟢",
        }
    }
}

/// Result of a `/daily` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyClaim {
    /// Coins granted
    pub amount: i64,
    /// Balance after the claim
    pub balance: i64,
    /// Earliest time of the next claim
    pub next_claim_at: DateTime<Utc>,
}

/// Result of one roulette spin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouletteOutcome {
    /// Pocket the ball landed in
    pub pocket: u8,
    /// Color of that pocket
    pub color: RouletteColor,
    /// Whether the bet won
    pub won: bool,
    /// Balance change (negative on a loss)
    pub net: i64,
    /// Balance after the spin
    pub balance: i64,
}

/// Spins the wheel. Kept separate from [`play_roulette`] so the RNG never
/// lives across an await point.
pub fn spin<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..=36)
}

/// Fetches the wallet of `member`, creating it with the starting balance if needed.
pub async fn get_or_create_wallet<C: ConnectionTrait>(
    db: &C,
    member: &Member,
    settings: &EconomySettings,
    now: DateTime<Utc>,
) -> Result<wallet::Model> {
    if let Some(existing) = Wallet::find()
        .filter(wallet::Column::UserId.eq(member.id.as_str()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    tracing::info!(user = %member.id, "Opening wallet");
    wallet::ActiveModel {
        user_id: Set(member.id.clone()),
        username: Set(member.name.clone()),
        balance: Set(settings.starting_balance),
        last_daily: Set(None),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Current balance of `member`.
pub async fn balance(
    db: &DatabaseConnection,
    member: &Member,
    settings: &EconomySettings,
    now: DateTime<Utc>,
) -> Result<i64> {
    Ok(get_or_create_wallet(db, member, settings, now).await?.balance)
}

/// Grants the daily reward unless it was claimed within the cooldown.
pub async fn claim_daily(
    db: &DatabaseConnection,
    member: &Member,
    settings: &EconomySettings,
    now: DateTime<Utc>,
) -> Result<DailyClaim> {
    let cooldown = chrono::Duration::hours(settings.daily_cooldown_hours);
    let txn = db.begin().await?;

    let wallet = get_or_create_wallet(&txn, member, settings, now).await?;
    if let Some(last) = wallet.last_daily {
        let next = last + cooldown;
        if next > now {
            return Err(Error::CooldownActive {
                remaining: (next - now).to_std().unwrap_or_default(),
            });
        }
    }

    Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(settings.daily_amount),
        )
        .col_expr(wallet::Column::LastDaily, Expr::value(Some(now)))
        .col_expr(wallet::Column::UpdatedAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(wallet.id))
        .exec(&txn)
        .await?;

    let balance = reload_balance(&txn, wallet.id).await?;
    txn.commit().await?;

    tracing::info!(user = %member.id, amount = settings.daily_amount, "Daily reward claimed");
    Ok(DailyClaim {
        amount: settings.daily_amount,
        balance,
        next_claim_at: now + cooldown,
    })
}

/// Settles a bet of `bet` coins on `choice` for a wheel that landed on `pocket`.
pub async fn play_roulette(
    db: &DatabaseConnection,
    member: &Member,
    settings: &EconomySettings,
    bet: i64,
    choice: RouletteColor,
    pocket: u8,
    now: DateTime<Utc>,
) -> Result<RouletteOutcome> {
    if bet <= 0 {
        return Err(Error::InvalidInput {
            message: "Your bet must be at least 1 coin.".to_string(),
        });
    }
    if pocket > 36 {
        return Err(Error::InvalidInput {
            message: format!("Pocket {pocket} is not on the wheel."),
        });
    }

    let txn = db.begin().await?;
    let wallet = get_or_create_wallet(&txn, member, settings, now).await?;
    if wallet.balance < bet {
        return Err(Error::InsufficientFunds {
            current: wallet.balance,
            required: bet,
        });
    }

    let color = RouletteColor::of_pocket(pocket);
    let won = color == choice;
    let net = if won {
        bet * (choice.payout_multiplier() - 1)
    } else {
        -bet
    };

    Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(net),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(wallet.id))
        .exec(&txn)
        .await?;

    let balance = reload_balance(&txn, wallet.id).await?;
    txn.commit().await?;

    tracing::debug!(user = %member.id, pocket, won, net, "Roulette settled");
    Ok(RouletteOutcome {
        pocket,
        color,
        won,
        net,
        balance,
    })
}

/// Richest wallets first.
pub async fn leaderboard(db: &DatabaseConnection, limit: u64) -> Result<Vec<wallet::Model>> {
    Wallet::find()
        .order_by_desc(wallet::Column::Balance)
        .order_by_asc(wallet::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn reload_balance<C: ConnectionTrait>(db: &C, wallet_id: i64) -> Result<i64> {
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await?
        .map(|w| w.balance)
        .ok_or_else(|| Error::Database(DbErr::RecordNotFound(format!("wallet {wallet_id}"))))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn settings() -> EconomySettings {
        EconomySettings {
            starting_balance: 100,
            daily_amount: 50,
            daily_cooldown_hours: 24,
        }
    }

    #[test]
    fn test_pocket_colors() {
        assert_eq!(RouletteColor::of_pocket(0), RouletteColor::Green);
        assert_eq!(RouletteColor::of_pocket(1), RouletteColor::Red);
        assert_eq!(RouletteColor::of_pocket(2), RouletteColor::Black);
        assert_eq!(RouletteColor::of_pocket(36), RouletteColor::Red);
        let reds = (0..=36).filter(|p| RouletteColor::of_pocket(*p) == RouletteColor::Red).count();
        assert_eq!(reds, 18);
    }

    #[test]
    fn test_spin_stays_on_wheel() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(spin(&mut rng) <= 36);
        }
    }

    #[tokio::test]
    async fn test_new_wallet_gets_starting_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let member = Member::new("U1", "one");
        assert_eq!(balance(&db, &member, &settings(), monday_morning()).await?, 100);
        // Second lookup reuses the same wallet
        assert_eq!(balance(&db, &member, &settings(), monday_morning()).await?, 100);
        assert_eq!(leaderboard(&db, 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_respects_cooldown() -> Result<()> {
        let db = setup_test_db().await?;
        let member = Member::new("U1", "one");
        let now = monday_morning();

        let claim = claim_daily(&db, &member, &settings(), now).await?;
        assert_eq!(claim.balance, 150);
        assert_eq!(claim.next_claim_at, now + chrono::Duration::hours(24));

        let again = claim_daily(&db, &member, &settings(), now + chrono::Duration::hours(23)).await;
        match again {
            Err(Error::CooldownActive { remaining }) => {
                assert_eq!(remaining, std::time::Duration::from_secs(3600));
            }
            other => panic!("expected cooldown, got {other:?}"),
        }

        let later = claim_daily(&db, &member, &settings(), now + chrono::Duration::hours(24)).await?;
        assert_eq!(later.balance, 200);
        Ok(())
    }

    #[tokio::test]
    async fn test_roulette_win_and_loss() -> Result<()> {
        let db = setup_test_db().await?;
        let member = Member::new("U1", "one");
        let now = monday_morning();

        // 1 is red: even-money win
        let win = play_roulette(&db, &member, &settings(), 40, RouletteColor::Red, 1, now).await?;
        assert!(win.won);
        assert_eq!(win.net, 40);
        assert_eq!(win.balance, 140);

        // 0 is green: red loses
        let loss = play_roulette(&db, &member, &settings(), 40, RouletteColor::Red, 0, now).await?;
        assert!(!loss.won);
        assert_eq!(loss.net, -40);
        assert_eq!(loss.balance, 100);

        // Green pays 36x
        let jackpot = play_roulette(&db, &member, &settings(), 10, RouletteColor::Green, 0, now).await?;
        assert_eq!(jackpot.net, 350);
        assert_eq!(jackpot.balance, 450);
        Ok(())
    }

    #[tokio::test]
    async fn test_roulette_rejects_bad_bets() -> Result<()> {
        let db = setup_test_db().await?;
        let member = Member::new("U1", "one");
        let now = monday_morning();

        let zero = play_roulette(&db, &member, &settings(), 0, RouletteColor::Black, 2, now).await;
        assert!(matches!(zero, Err(Error::InvalidInput { .. })));

        let too_much = play_roulette(&db, &member, &settings(), 101, RouletteColor::Black, 2, now).await;
        assert!(matches!(
            too_much,
            Err(Error::InsufficientFunds {
                current: 100,
                required: 101
            })
        ));
        assert_eq!(balance(&db, &member, &settings(), now).await?, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let now = monday_morning();
        let rich = Member::new("U1", "rich");
        let poor = Member::new("U2", "poor");

        balance(&db, &poor, &settings(), now).await?;
        claim_daily(&db, &rich, &settings(), now).await?;

        let board = leaderboard(&db, 10).await?;
        assert_eq!(board[0].user_id, "U1");
        assert_eq!(board[1].user_id, "U2");
        assert_eq!(leaderboard(&db, 1).await?.len(), 1);
        Ok(())
    }
}
