//! Achievement tiers derived from the ledger on demand. Nothing here is stored.
use serde::Serialize;
use std::fmt;

use crate::constants::{
    DAILY_CHALLENGE_MAX_TARGET, LOGIN_STREAK_MAX_TARGET, STAR_MILESTONE_MAX, STAR_MILESTONE_STEP,
    STAR_RECENT_WINDOW, STAR_UPCOMING_WINDOW, SURVIVAL_MILESTONE_MAX, SURVIVAL_MILESTONE_STEP,
};
use crate::ledger::Ledger;
use crate::numbers::progress_pct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementFamily {
    LoginStreak,
    Stars,
    Survival,
    DailyChallenge,
}

impl AchievementFamily {
    pub const ALL: [Self; 4] = [
        Self::LoginStreak,
        Self::Stars,
        Self::Survival,
        Self::DailyChallenge,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginStreak => "daily",
            Self::Stars => "stars",
            Self::Survival => "survival",
            Self::DailyChallenge => "challenge",
        }
    }

    /// Number of tiers in the full family.
    #[must_use]
    pub const fn tier_count(self) -> u32 {
        match self {
            Self::LoginStreak => LOGIN_STREAK_MAX_TARGET,
            Self::Stars => STAR_MILESTONE_MAX / STAR_MILESTONE_STEP,
            Self::Survival => SURVIVAL_MILESTONE_MAX / SURVIVAL_MILESTONE_STEP,
            Self::DailyChallenge => DAILY_CHALLENGE_MAX_TARGET,
        }
    }

    /// Counter the family measures.
    #[must_use]
    pub const fn current(self, ledger: &Ledger) -> u32 {
        match self {
            Self::LoginStreak => ledger.streak,
            Self::Stars => ledger.total_coins,
            Self::Survival => ledger.best_survival_streak,
            Self::DailyChallenge => ledger.daily_challenges_completed,
        }
    }

    /// Tiers reached for `current`.
    #[must_use]
    pub fn completed_count(self, current: u32) -> u32 {
        let reached = match self {
            Self::LoginStreak | Self::DailyChallenge => current,
            Self::Stars => current / STAR_MILESTONE_STEP,
            Self::Survival => current / SURVIVAL_MILESTONE_STEP,
        };
        reached.min(self.tier_count())
    }
}

impl fmt::Display for AchievementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tier {
    pub id: String,
    pub family: AchievementFamily,
    pub target: u32,
    pub current: u32,
    pub completed: bool,
}

impl Tier {
    fn new(family: AchievementFamily, target: u32, current: u32) -> Self {
        Self {
            id: format!("{family}-{target}"),
            family,
            target,
            current,
            completed: current >= target,
        }
    }

    #[must_use]
    pub fn progress_pct(&self) -> f32 {
        progress_pct(self.current, self.target)
    }
}

#[must_use]
pub fn login_tiers(streak: u32) -> Vec<Tier> {
    (1..=LOGIN_STREAK_MAX_TARGET)
        .map(|target| Tier::new(AchievementFamily::LoginStreak, target, streak))
        .collect()
}

/// The next uncompleted star milestones above `total_coins`.
#[must_use]
pub fn upcoming_star_tiers(total_coins: u32) -> Vec<Tier> {
    let base = total_coins / STAR_MILESTONE_STEP;
    (1..=STAR_UPCOMING_WINDOW)
        .map(|offset| (base + offset).saturating_mul(STAR_MILESTONE_STEP))
        .take_while(|target| *target <= STAR_MILESTONE_MAX)
        .map(|target| Tier::new(AchievementFamily::Stars, target, total_coins))
        .collect()
}

/// The most recently reached star milestones, newest first.
#[must_use]
pub fn recent_star_tiers(total_coins: u32) -> Vec<Tier> {
    let base = (total_coins / STAR_MILESTONE_STEP).min(STAR_MILESTONE_MAX / STAR_MILESTONE_STEP);
    (0..STAR_RECENT_WINDOW)
        .map_while(|back| base.checked_sub(back))
        .filter(|step| *step > 0)
        .map(|step| Tier::new(AchievementFamily::Stars, step * STAR_MILESTONE_STEP, total_coins))
        .collect()
}

#[must_use]
pub fn survival_tiers(best_streak: u32) -> Vec<Tier> {
    (1..=SURVIVAL_MILESTONE_MAX / SURVIVAL_MILESTONE_STEP)
        .map(|n| Tier::new(AchievementFamily::Survival, n * SURVIVAL_MILESTONE_STEP, best_streak))
        .collect()
}

#[must_use]
pub fn challenge_tiers(completed: u32) -> Vec<Tier> {
    (1..=DAILY_CHALLENGE_MAX_TARGET)
        .map(|target| Tier::new(AchievementFamily::DailyChallenge, target, completed))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub family: AchievementFamily,
    pub completed: u32,
    pub total: u32,
}

/// Everything the achievements screen shows, evaluated from one ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementBoard {
    pub login: Vec<Tier>,
    pub stars_upcoming: Vec<Tier>,
    pub stars_recent: Vec<Tier>,
    pub survival: Vec<Tier>,
    pub challenges: Vec<Tier>,
    pub summary: Vec<FamilySummary>,
}

impl AchievementBoard {
    #[must_use]
    pub fn evaluate(ledger: &Ledger) -> Self {
        let summary = AchievementFamily::ALL
            .into_iter()
            .map(|family| FamilySummary {
                family,
                completed: family.completed_count(family.current(ledger)),
                total: family.tier_count(),
            })
            .collect();
        Self {
            login: login_tiers(ledger.streak),
            stars_upcoming: upcoming_star_tiers(ledger.total_coins),
            stars_recent: recent_star_tiers(ledger.total_coins),
            survival: survival_tiers(ledger.best_survival_streak),
            challenges: challenge_tiers(ledger.daily_challenges_completed),
            summary,
        }
    }

    #[must_use]
    pub fn summary_for(&self, family: AchievementFamily) -> Option<FamilySummary> {
        self.summary.iter().copied().find(|s| s.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn targets(tiers: &[Tier]) -> Vec<u32> {
        tiers.iter().map(|tier| tier.target).collect()
    }

    #[test]
    fn star_windows_follow_total_coins() {
        let upcoming = upcoming_star_tiers(162);
        assert_eq!(upcoming.len(), 20);
        assert_eq!(upcoming[0].target, 200);
        assert_eq!(upcoming[19].target, 1_150);
        assert!(upcoming.iter().all(|tier| !tier.completed));
        assert!((upcoming[0].progress_pct() - 81.0).abs() < f32::EPSILON);

        assert_eq!(targets(&recent_star_tiers(162)), [150, 100, 50]);
        assert_eq!(targets(&recent_star_tiers(1_000)), [1_000, 950, 900, 850, 800]);
        assert!(recent_star_tiers(49).is_empty());
        assert!(recent_star_tiers(1_000).iter().all(|tier| tier.completed));
    }

    #[test]
    fn star_windows_stop_at_cap() {
        let upcoming = upcoming_star_tiers(99_900);
        assert_eq!(targets(&upcoming), [99_950, 100_000]);
        assert!(upcoming_star_tiers(100_000).is_empty());
        assert_eq!(recent_star_tiers(250_000)[0].target, 100_000);
    }

    #[test]
    fn fixed_families_have_expected_targets() {
        let login = login_tiers(3);
        assert_eq!(login.len(), 30);
        assert_eq!(login.iter().filter(|tier| tier.completed).count(), 3);
        assert_eq!(login[0].id, "daily-1");
        assert_eq!(login[29].id, "daily-30");

        let survival = survival_tiers(31);
        assert_eq!(targets(&survival)[..3], [15, 30, 45]);
        assert_eq!(survival.last().unwrap().target, 150);
        assert_eq!(survival.iter().filter(|tier| tier.completed).count(), 2);

        let challenges = challenge_tiers(25);
        assert_eq!(challenges.len(), 20);
        assert!(challenges.iter().all(|tier| tier.completed));
        assert_eq!(challenges[0].id, "challenge-1");
    }

    #[test]
    fn board_summarises_every_family() {
        let mut ledger = Ledger::initial(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        ledger.streak = 7;
        ledger.total_coins = 1_260;
        ledger.best_survival_streak = 16;
        ledger.daily_challenges_completed = 2;
        let board = AchievementBoard::evaluate(&ledger);

        let stars = board.summary_for(AchievementFamily::Stars).unwrap();
        assert_eq!((stars.completed, stars.total), (25, 2_000));
        let login = board.summary_for(AchievementFamily::LoginStreak).unwrap();
        assert_eq!((login.completed, login.total), (7, 30));
        let survival = board.summary_for(AchievementFamily::Survival).unwrap();
        assert_eq!((survival.completed, survival.total), (1, 10));
        let challenge = board.summary_for(AchievementFamily::DailyChallenge).unwrap();
        assert_eq!((challenge.completed, challenge.total), (2, 20));
        assert_eq!(board.stars_recent[0].target, 1_250);
    }
}
