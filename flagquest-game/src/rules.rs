//! Session pacing rules: question counts, lives, timer, powerups and delays.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::session::PowerupInventory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Questions drawn for every mode except daily.
    pub questions_per_session: usize,
    pub daily_questions: usize,
    pub points_per_correct: u32,
    pub starting_lives: u8,
    pub survival_lives: u8,
    pub timed_seconds: u32,
    pub powerups: PowerupInventory,
    pub fact_reveal_delay_ms: u64,
    pub miss_advance_delay_ms: u64,
    pub miss_end_delay_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            questions_per_session: 10,
            daily_questions: 5,
            points_per_correct: 100,
            starting_lives: 3,
            survival_lives: 1,
            timed_seconds: 60,
            powerups: PowerupInventory::default(),
            fact_reveal_delay_ms: 500,
            miss_advance_delay_ms: 1_000,
            miss_end_delay_ms: 1_000,
        }
    }
}

impl RulesConfig {
    /// Load rules from JSON; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns [`RulesError::Zero`] for the first count that would make a
    /// session unplayable.
    pub fn validate(&self) -> Result<(), RulesError> {
        let checks: [(&'static str, bool); 6] = [
            ("questions_per_session", self.questions_per_session > 0),
            ("daily_questions", self.daily_questions > 0),
            ("points_per_correct", self.points_per_correct > 0),
            ("starting_lives", self.starting_lives > 0),
            ("survival_lives", self.survival_lives > 0),
            ("timed_seconds", self.timed_seconds > 0),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(RulesError::Zero { field: *field }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub const fn fact_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.fact_reveal_delay_ms)
    }

    #[must_use]
    pub const fn miss_advance_delay(&self) -> Duration {
        Duration::from_millis(self.miss_advance_delay_ms)
    }

    #[must_use]
    pub const fn miss_end_delay(&self) -> Duration {
        Duration::from_millis(self.miss_end_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let rules = RulesConfig::from_json(r#"{"timed_seconds": 30, "powerups": {"skip": 3}}"#)
            .unwrap();
        assert_eq!(rules.timed_seconds, 30);
        assert_eq!(rules.powerups.skip, 3);
        assert_eq!(rules.powerups.fifty_fifty, 2);
        assert_eq!(rules.powerups.hint, 2);
        assert_eq!(rules.questions_per_session, 10);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn zero_lives_is_rejected() {
        let rules = RulesConfig {
            starting_lives: 0,
            ..RulesConfig::default()
        };
        assert_eq!(
            rules.validate(),
            Err(RulesError::Zero {
                field: "starting_lives"
            })
        );
    }
}
