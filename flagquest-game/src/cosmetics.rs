//! Avatar catalog and role purchases.
use serde::Serialize;
use thiserror::Error;

use crate::record::PlayerRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cosmetic {
    pub id: &'static str,
    pub name: &'static str,
    /// Price in coins; zero for free items.
    pub cost: u32,
}

/// Free base characters.
pub const AVATARS: [Cosmetic; 5] = [
    Cosmetic {
        id: "char-1",
        name: "Alex",
        cost: 0,
    },
    Cosmetic {
        id: "char-2",
        name: "Sam",
        cost: 0,
    },
    Cosmetic {
        id: "char-3",
        name: "Jordan",
        cost: 0,
    },
    Cosmetic {
        id: "char-4",
        name: "Casey",
        cost: 0,
    },
    Cosmetic {
        id: "char-5",
        name: "Taylor",
        cost: 0,
    },
];

/// Purchasable roles, worn as the avatar accessory.
pub const ROLES: [Cosmetic; 6] = [
    Cosmetic {
        id: "role-1",
        name: "Rookie",
        cost: 0,
    },
    Cosmetic {
        id: "role-2",
        name: "Compass",
        cost: 500,
    },
    Cosmetic {
        id: "role-3",
        name: "Photographer",
        cost: 1_000,
    },
    Cosmetic {
        id: "role-4",
        name: "Cartographer",
        cost: 1_500,
    },
    Cosmetic {
        id: "role-5",
        name: "Backpacker",
        cost: 2_000,
    },
    Cosmetic {
        id: "role-6",
        name: "Lookout",
        cost: 2_500,
    },
];

#[must_use]
pub fn find_avatar(id: &str) -> Option<&'static Cosmetic> {
    AVATARS.iter().find(|avatar| avatar.id == id)
}

#[must_use]
pub fn find_role(id: &str) -> Option<&'static Cosmetic> {
    ROLES.iter().find(|role| role.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("unknown avatar {0}")]
    UnknownAvatar(String),
    #[error("unknown role {0}")]
    UnknownRole(String),
    #[error("role {role} costs {cost} coins but only {available} are available")]
    InsufficientCoins {
        role: &'static str,
        cost: u32,
        available: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOutcome {
    /// Already owned; just equipped.
    Equipped,
    /// Bought for `cost` coins and equipped.
    Purchased { cost: u32 },
}

/// Equip a role, buying it first when it is still locked.
///
/// Buying spends `coins` only; the lifetime `total_coins` counter is left alone.
///
/// # Errors
///
/// Returns [`PurchaseError::UnknownRole`] for ids outside [`ROLES`] and
/// [`PurchaseError::InsufficientCoins`] when a locked role is unaffordable.
/// The record is unchanged on error.
pub fn acquire_role(record: &mut PlayerRecord, role_id: &str) -> Result<RoleOutcome, PurchaseError> {
    let role = find_role(role_id).ok_or_else(|| PurchaseError::UnknownRole(role_id.to_string()))?;
    let ledger = &mut record.ledger;

    let outcome = if ledger.has_unlocked(role.id) || role.cost == 0 {
        RoleOutcome::Equipped
    } else {
        if ledger.coins < role.cost {
            return Err(PurchaseError::InsufficientCoins {
                role: role.id,
                cost: role.cost,
                available: ledger.coins,
            });
        }
        ledger.coins -= role.cost;
        RoleOutcome::Purchased { cost: role.cost }
    };
    if !ledger.has_unlocked(role.id) {
        ledger.unlocked_avatars.push(role.id.to_string());
    }
    record.avatar.accessory = role.id.to_string();
    Ok(outcome)
}

/// Switch the base character. Base characters are always free.
///
/// # Errors
///
/// Returns [`PurchaseError::UnknownAvatar`] for ids outside [`AVATARS`].
pub fn select_avatar(record: &mut PlayerRecord, avatar_id: &str) -> Result<(), PurchaseError> {
    let avatar =
        find_avatar(avatar_id).ok_or_else(|| PurchaseError::UnknownAvatar(avatar_id.to_string()))?;
    record.avatar.base = avatar.id.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> PlayerRecord {
        PlayerRecord::initial(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn buying_spends_coins_but_not_lifetime_total() {
        let mut record = record();
        record.ledger.coins = 600;
        record.ledger.total_coins = 1_400;
        let outcome = acquire_role(&mut record, "role-2").unwrap();
        assert_eq!(outcome, RoleOutcome::Purchased { cost: 500 });
        assert_eq!(record.ledger.coins, 100);
        assert_eq!(record.ledger.total_coins, 1_400);
        assert!(record.ledger.has_unlocked("role-2"));
        assert_eq!(record.avatar.accessory, "role-2");

        assert_eq!(
            acquire_role(&mut record, "role-2").unwrap(),
            RoleOutcome::Equipped
        );
        assert_eq!(record.ledger.coins, 100);
        assert_eq!(
            record
                .ledger
                .unlocked_avatars
                .iter()
                .filter(|id| *id == "role-2")
                .count(),
            1
        );
    }

    #[test]
    fn unaffordable_role_leaves_record_untouched() {
        let mut record = record();
        let before = record.clone();
        let err = acquire_role(&mut record, "role-6").unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientCoins {
                role: "role-6",
                cost: 2_500,
                available: 100
            }
        );
        assert_eq!(record, before);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut record = record();
        assert!(matches!(
            acquire_role(&mut record, "role-9"),
            Err(PurchaseError::UnknownRole(_))
        ));
        assert!(matches!(
            select_avatar(&mut record, "char-9"),
            Err(PurchaseError::UnknownAvatar(_))
        ));
        select_avatar(&mut record, "char-3").unwrap();
        assert_eq!(record.avatar.base, "char-3");
    }
}
