//! Persisted player record: the ledger plus profile and cosmetic selection.
//!
//! Loading never fails. Every field is merged individually against the
//! initial template, so one bad value only resets that value.
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_AVATAR_BASE, DEFAULT_ROLE, DEFAULT_USERNAME};
use crate::ledger::Ledger;
use crate::numbers::floor_f64_to_u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarSelection {
    /// One of the free base characters.
    pub base: String,
    /// The equipped role.
    pub accessory: String,
}

impl Default for AvatarSelection {
    fn default() -> Self {
        Self {
            base: DEFAULT_AVATAR_BASE.to_string(),
            accessory: DEFAULT_ROLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    #[serde(flatten)]
    pub ledger: Ledger,
    pub username: String,
    pub is_dark_mode: bool,
    pub avatar: AvatarSelection,
}

impl PlayerRecord {
    #[must_use]
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            ledger: Ledger::initial(today),
            username: DEFAULT_USERNAME.to_string(),
            is_dark_mode: false,
            avatar: AvatarSelection::default(),
        }
    }

    /// Parse a stored record, defaulting whatever is missing or malformed.
    ///
    /// The flag is `true` when the stored text had to be repaired or
    /// replaced, meaning it no longer matches the returned record.
    #[must_use]
    pub fn from_json_lenient(raw: &str, today: NaiveDate) -> (Self, bool) {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Self::merge(&fields, today),
            Ok(other) => {
                log::warn!("stored player record is not an object ({other}); using defaults");
                (Self::initial(today), true)
            }
            Err(err) => {
                log::warn!("stored player record is not valid JSON: {err}; using defaults");
                (Self::initial(today), true)
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn merge(fields: &Map<String, Value>, today: NaiveDate) -> (Self, bool) {
        let mut record = Self::initial(today);
        let mut rejected: Vec<&'static str> = Vec::new();
        let ledger = &mut record.ledger;

        for (key, slot) in [
            ("xp", &mut ledger.xp),
            ("coins", &mut ledger.coins),
            ("totalCoins", &mut ledger.total_coins),
            ("streak", &mut ledger.streak),
            ("bestSurvivalStreak", &mut ledger.best_survival_streak),
            ("dailyChallengesCompleted", &mut ledger.daily_challenges_completed),
        ] {
            merge_field(fields, key, slot, counter, &mut rejected);
        }
        merge_field(
            fields,
            "lastLogin",
            &mut ledger.last_login,
            login_date,
            &mut rejected,
        );
        merge_field(
            fields,
            "unlockedAvatars",
            &mut ledger.unlocked_avatars,
            string_list,
            &mut rejected,
        );
        merge_field(
            fields,
            "username",
            &mut record.username,
            |v| v.as_str().map(str::to_string),
            &mut rejected,
        );
        merge_field(
            fields,
            "isDarkMode",
            &mut record.is_dark_mode,
            Value::as_bool,
            &mut rejected,
        );

        match fields.get("avatar") {
            None => {}
            Some(Value::Object(avatar)) => {
                let selection = &mut record.avatar;
                for (key, slot) in [
                    ("base", &mut selection.base),
                    ("accessory", &mut selection.accessory),
                ] {
                    merge_field(
                        avatar,
                        key,
                        slot,
                        |v| v.as_str().map(str::to_string),
                        &mut rejected,
                    );
                }
            }
            Some(_) => rejected.push("avatar"),
        }

        let repaired = record.ledger.repair();
        if repaired {
            log::warn!("stored totalCoins was below coins; raised to match");
        }
        if !rejected.is_empty() {
            log::warn!(
                "stored player record had malformed fields reset to defaults: {}",
                rejected.join(", ")
            );
        }
        (record, repaired || !rejected.is_empty())
    }
}

fn merge_field<T>(
    fields: &Map<String, Value>,
    key: &'static str,
    slot: &mut T,
    parse: impl Fn(&Value) -> Option<T>,
    rejected: &mut Vec<&'static str>,
) {
    let Some(raw) = fields.get(key) else {
        return;
    };
    match parse(raw) {
        Some(value) => *slot = value,
        None => rejected.push(key),
    }
}

fn counter(value: &Value) -> Option<u32> {
    if let Some(int) = value.as_u64() {
        return Some(u32::try_from(int).unwrap_or(u32::MAX));
    }
    value.as_f64().and_then(floor_f64_to_u32)
}

/// Accepts a plain calendar date or a full RFC 3339 timestamp.
fn login_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?;
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn initial_matches_template() {
        let record = PlayerRecord::initial(today());
        assert_eq!(record.ledger.coins, 100);
        assert_eq!(record.ledger.total_coins, 100);
        assert_eq!(record.ledger.unlocked_avatars, vec!["role-1".to_string()]);
        assert_eq!(record.avatar.base, "char-1");
        assert_eq!(record.username, "Explorer");
        assert!(!record.is_dark_mode);
    }

    #[test]
    fn serializes_camel_case_flat() {
        let json = PlayerRecord::initial(today()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalCoins"], 100);
        assert_eq!(value["lastLogin"], "2026-10-16");
        assert_eq!(value["avatar"]["accessory"], "role-1");
        assert_eq!(value["isDarkMode"], false);
    }

    #[test]
    fn bad_fields_default_individually() {
        let raw = r#"{
            "xp": "lots",
            "coins": 250.9,
            "totalCoins": 900,
            "streak": -2,
            "lastLogin": "2026-10-15T21:04:00.000Z",
            "unlockedAvatars": ["role-1", 7, "role-3"],
            "avatar": {"base": "char-4"},
            "username": "Mara"
        }"#;
        let (record, repaired) = PlayerRecord::from_json_lenient(raw, today());
        assert!(repaired);
        assert_eq!(record.ledger.xp, 0);
        assert_eq!(record.ledger.coins, 250);
        assert_eq!(record.ledger.total_coins, 900);
        assert_eq!(record.ledger.streak, 0);
        assert_eq!(
            record.ledger.last_login,
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
        assert_eq!(record.ledger.unlocked_avatars, ["role-1", "role-3"]);
        assert_eq!(record.avatar.base, "char-4");
        assert_eq!(record.avatar.accessory, "role-1");
        assert_eq!(record.username, "Mara");
    }

    #[test]
    fn unparseable_record_falls_back_to_template() {
        for raw in ["", "{not json", "[1,2]", "null"] {
            assert_eq!(
                PlayerRecord::from_json_lenient(raw, today()),
                (PlayerRecord::initial(today()), true)
            );
        }
    }

    #[test]
    fn total_coins_is_repaired() {
        let (record, repaired) =
            PlayerRecord::from_json_lenient(r#"{"coins": 700, "totalCoins": 300}"#, today());
        assert!(repaired);
        assert_eq!(record.ledger.total_coins, 700);
    }

    #[test]
    fn round_trips_through_lenient_loader() {
        let mut record = PlayerRecord::initial(today());
        record.ledger.xp = 1_234;
        record.is_dark_mode = true;
        record.ledger.unlocked_avatars.push("role-2".into());
        let json = record.to_json().unwrap();
        let other_day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(
            PlayerRecord::from_json_lenient(&json, other_day),
            (record, false)
        );
    }
}
