//! Progression ledger: cross-session counters and the end-of-session reducer.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COIN_SCORE_DIVISOR, DEFAULT_ROLE, STARTING_COINS, SURVIVAL_STREAK_POINTS, XP_PER_LEVEL,
    XP_SCORE_DIVISOR,
};
use crate::session::GameMode;

/// Rewards granted for one final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionReward {
    pub xp: u32,
    pub coins: u32,
}

impl SessionReward {
    #[must_use]
    pub const fn for_score(final_score: u32) -> Self {
        Self {
            xp: final_score / XP_SCORE_DIVISOR,
            coins: final_score / COIN_SCORE_DIVISOR,
        }
    }
}

/// Level derived from accumulated XP; never stored.
#[must_use]
pub const fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub xp: u32,
    pub coins: u32,
    /// Lifetime coin counter; spending never lowers it.
    pub total_coins: u32,
    /// Consecutive daily logins.
    pub streak: u32,
    pub last_login: NaiveDate,
    pub best_survival_streak: u32,
    pub daily_challenges_completed: u32,
    pub unlocked_avatars: Vec<String>,
}

impl Ledger {
    #[must_use]
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            xp: 0,
            coins: STARTING_COINS,
            total_coins: STARTING_COINS,
            streak: 0,
            last_login: today,
            best_survival_streak: 0,
            daily_challenges_completed: 0,
            unlocked_avatars: vec![DEFAULT_ROLE.to_string()],
        }
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    #[must_use]
    pub fn has_unlocked(&self, cosmetic_id: &str) -> bool {
        self.unlocked_avatars.iter().any(|id| id == cosmetic_id)
    }

    /// Restore `total_coins >= coins` after loading an externally edited record.
    pub fn repair(&mut self) -> bool {
        if self.total_coins < self.coins {
            self.total_coins = self.coins;
            return true;
        }
        false
    }
}

/// Fold one finished session into the ledger.
///
/// A zero score leaves the ledger untouched, including the daily counter.
#[must_use]
pub fn apply_session_result(ledger: &Ledger, mode: GameMode, final_score: u32) -> Ledger {
    if final_score == 0 {
        return ledger.clone();
    }
    let reward = SessionReward::for_score(final_score);
    let mut next = ledger.clone();
    next.xp = next.xp.saturating_add(reward.xp);
    next.coins = next.coins.saturating_add(reward.coins);
    next.total_coins = next.total_coins.saturating_add(reward.coins);

    match mode {
        GameMode::Survival => {
            let candidate = final_score / SURVIVAL_STREAK_POINTS;
            next.best_survival_streak = next.best_survival_streak.max(candidate);
        }
        GameMode::Daily => {
            next.daily_challenges_completed = next.daily_challenges_completed.saturating_add(1);
        }
        GameMode::Adventure | GameMode::Timed | GameMode::Multiplayer => {}
    }
    next
}

/// Update the login streak for a process start on `today`.
///
/// A one-day gap extends the streak, a longer gap restarts it at 1 and the
/// same day changes nothing.
#[must_use]
pub fn register_login(ledger: &Ledger, today: NaiveDate) -> Ledger {
    if ledger.last_login == today {
        return ledger.clone();
    }
    let gap = (today - ledger.last_login).num_days().unsigned_abs();
    let mut next = ledger.clone();
    next.streak = if gap == 1 {
        next.streak.saturating_add(1)
    } else {
        1
    };
    next.last_login = today;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn score_620_rewards_xp_and_coins() {
        let ledger = Ledger::initial(today());
        let next = apply_session_result(&ledger, GameMode::Adventure, 620);
        assert_eq!(next.xp, 310);
        assert_eq!(next.level(), 1);
        assert_eq!(next.coins, 162);
        assert_eq!(next.total_coins, 162);
        assert_eq!(ledger.coins, 100);
    }

    #[test]
    fn zero_score_is_identity() {
        let ledger = Ledger::initial(today());
        for mode in GameMode::ALL {
            assert_eq!(apply_session_result(&ledger, mode, 0), ledger);
        }
    }

    #[test]
    fn level_tracks_xp() {
        let mut ledger = Ledger::initial(today());
        for score in [1_000, 7, 999, 1] {
            ledger = apply_session_result(&ledger, GameMode::Timed, score);
            assert_eq!(ledger.level(), ledger.xp / 500 + 1);
        }
        assert_eq!(ledger.xp, 500 + 3 + 499);
        assert_eq!(ledger.level(), 3);
    }

    #[test]
    fn mode_specific_counters() {
        let ledger = Ledger::initial(today());
        let survived = apply_session_result(&ledger, GameMode::Survival, 700);
        assert_eq!(survived.best_survival_streak, 7);
        let worse = apply_session_result(&survived, GameMode::Survival, 300);
        assert_eq!(worse.best_survival_streak, 7);

        let daily = apply_session_result(&ledger, GameMode::Daily, 200);
        assert_eq!(daily.daily_challenges_completed, 1);
        assert_eq!(daily.best_survival_streak, 0);
    }

    #[test]
    fn rewards_are_monotonic() {
        let mut ledger = Ledger::initial(today());
        ledger.coins = 40;
        for score in [5, 9, 10, 155, 1_160] {
            let next = apply_session_result(&ledger, GameMode::Multiplayer, score);
            assert!(next.coins >= ledger.coins);
            assert!(next.total_coins >= ledger.total_coins);
            assert!(next.xp >= ledger.xp);
            ledger = next;
        }
    }

    #[test]
    fn login_streak_extends_or_resets() {
        let mut ledger = Ledger::initial(today());
        ledger.streak = 4;

        ledger.last_login = today() - Days::new(1);
        let next = register_login(&ledger, today());
        assert_eq!(next.streak, 5);
        assert_eq!(next.last_login, today());

        ledger.last_login = today() - Days::new(3);
        assert_eq!(register_login(&ledger, today()).streak, 1);

        ledger.last_login = today();
        assert_eq!(register_login(&ledger, today()).streak, 4);
    }

    #[test]
    fn repair_restores_total_coins() {
        let mut ledger = Ledger::initial(today());
        ledger.coins = 900;
        assert!(ledger.repair());
        assert_eq!(ledger.total_coins, 900);
        assert!(!ledger.repair());
    }
}
