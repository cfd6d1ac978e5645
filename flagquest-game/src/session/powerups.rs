use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerupKind {
    /// Disable two wrong options for the current question.
    FiftyFifty,
    /// Move on without scoring the current question.
    Skip,
    /// Reveal the continent of the current country.
    Hint,
}

impl PowerupKind {
    pub const ALL: [Self; 3] = [Self::FiftyFifty, Self::Skip, Self::Hint];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiftyFifty => "fiftyFifty",
            Self::Skip => "skip",
            Self::Hint => "hint",
        }
    }
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerupKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fiftyFifty" | "fifty_fifty" | "5050" => Ok(Self::FiftyFifty),
            "skip" => Ok(Self::Skip),
            "hint" => Ok(Self::Hint),
            _ => Err(()),
        }
    }
}

/// Session-scoped powerup counters. Decremented on use, never refilled
/// until the next session starts.
///
/// The default is the starting loadout, so a partial override keeps the
/// counters it does not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PowerupInventory {
    #[serde(alias = "fifty_fifty")]
    pub fifty_fifty: u8,
    pub skip: u8,
    pub hint: u8,
}

impl Default for PowerupInventory {
    fn default() -> Self {
        Self {
            fifty_fifty: 2,
            skip: 1,
            hint: 2,
        }
    }
}

impl PowerupInventory {
    #[must_use]
    pub const fn remaining(&self, kind: PowerupKind) -> u8 {
        match kind {
            PowerupKind::FiftyFifty => self.fifty_fifty,
            PowerupKind::Skip => self.skip,
            PowerupKind::Hint => self.hint,
        }
    }

    /// Spend one unit; returns `false` and leaves the counter alone when empty.
    pub fn consume(&mut self, kind: PowerupKind) -> bool {
        let slot = match kind {
            PowerupKind::FiftyFifty => &mut self.fifty_fifty,
            PowerupKind::Skip => &mut self.skip,
            PowerupKind::Hint => &mut self.hint,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_stops_at_zero() {
        let mut inventory = PowerupInventory {
            fifty_fifty: 1,
            skip: 0,
            hint: 2,
        };
        assert!(inventory.consume(PowerupKind::FiftyFifty));
        assert!(!inventory.consume(PowerupKind::FiftyFifty));
        assert!(!inventory.consume(PowerupKind::Skip));
        assert_eq!(inventory.remaining(PowerupKind::FiftyFifty), 0);
        assert_eq!(inventory.remaining(PowerupKind::Skip), 0);
        assert_eq!(inventory.remaining(PowerupKind::Hint), 2);
    }

    #[test]
    fn missing_counters_take_the_starting_loadout() {
        let inventory: PowerupInventory = serde_json::from_str(r#"{"hint": 5}"#).unwrap();
        assert_eq!(
            inventory,
            PowerupInventory {
                fifty_fifty: 2,
                skip: 1,
                hint: 5,
            }
        );
    }

    #[test]
    fn parses_wire_names() {
        for kind in PowerupKind::ALL {
            assert_eq!(kind.as_str().parse::<PowerupKind>(), Ok(kind));
        }
        assert!("freeze".parse::<PowerupKind>().is_err());
    }
}
