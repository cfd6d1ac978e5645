//! Centralized balance and progression constants for FlagQuest game logic.
//!
//! Session pacing (question counts, lives, timer, delays) is tunable through
//! [`crate::rules::RulesConfig`]; the values here define the progression math
//! and must only change through reviewed code.

// Persistence ---------------------------------------------------------------
/// Fixed storage identifier for the serialized player record.
pub const PLAYER_RECORD_KEY: &str = "flagquest_user";
/// Config name resolved through [`crate::DataLoader::load_config`] for rules.
pub const RULES_CONFIG_NAME: &str = "rules";

// Progression ---------------------------------------------------------------
pub const XP_PER_LEVEL: u32 = 500;
/// `xp_gained = final_score / XP_SCORE_DIVISOR`
pub const XP_SCORE_DIVISOR: u32 = 2;
/// `coins_gained = final_score / COIN_SCORE_DIVISOR`
pub const COIN_SCORE_DIVISOR: u32 = 10;
/// Points that make up one "correct answer" when deriving a survival streak.
pub const SURVIVAL_STREAK_POINTS: u32 = 100;

// Initial player template ---------------------------------------------------
pub const STARTING_COINS: u32 = 100;
pub const DEFAULT_USERNAME: &str = "Explorer";
pub const DEFAULT_AVATAR_BASE: &str = "char-1";
pub const DEFAULT_ROLE: &str = "role-1";

// Achievements --------------------------------------------------------------
pub const LOGIN_STREAK_MAX_TARGET: u32 = 30;
pub const STAR_MILESTONE_STEP: u32 = 50;
pub const STAR_MILESTONE_MAX: u32 = 100_000;
pub const STAR_UPCOMING_WINDOW: u32 = 20;
pub const STAR_RECENT_WINDOW: u32 = 5;
pub const SURVIVAL_MILESTONE_STEP: u32 = 15;
pub const SURVIVAL_MILESTONE_MAX: u32 = 150;
pub const DAILY_CHALLENGE_MAX_TARGET: u32 = 20;

// Daily challenge -----------------------------------------------------------
pub const DAILY_ORDINAL_MODULUS: u32 = 100;
/// Date layout hashed into the daily seed, e.g. `Fri Oct 16 2026`.
pub const DAILY_DATE_FORMAT: &str = "%a %b %d %Y";

// Round layout --------------------------------------------------------------
pub const OPTIONS_PER_ROUND: usize = 4;
pub const DISTRACTORS_PER_ROUND: usize = OPTIONS_PER_ROUND - 1;
pub const FIFTY_FIFTY_REMOVALS: usize = 2;
