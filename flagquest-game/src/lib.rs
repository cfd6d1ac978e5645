//! FlagQuest Game Engine
//!
//! Platform-agnostic core logic for the FlagQuest flag trivia game: question
//! sampling, the per-session round state machine, the daily challenge and the
//! persistent player progression. Presentation layers drive it through
//! [`GameEngine`] and render its snapshots.

pub mod achievements;
pub mod catalog;
pub mod constants;
pub mod cosmetics;
pub mod daily;
pub mod ledger;
pub mod numbers;
pub mod record;
pub mod rules;
pub mod sampler;
pub mod session;

use anyhow::Context;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::Duration;

// Re-export commonly used types
pub use achievements::{AchievementBoard, AchievementFamily, FamilySummary, Tier};
pub use catalog::{CatalogError, Continent, Country, CountryCatalog};
pub use cosmetics::{AVATARS, Cosmetic, PurchaseError, ROLES, RoleOutcome};
pub use daily::{daily_challenge, date_seed};
pub use ledger::{Ledger, SessionReward, apply_session_result, level_for_xp, register_login};
pub use record::{AvatarSelection, PlayerRecord};
pub use rules::{RulesConfig, RulesError};
pub use session::{
    DuelScore, DuelVerdict, EndReason, Feedback, GameMode, GameSession, Player, PowerupInventory,
    PowerupKind, RoundPhase, SessionContext, SessionEffect, SessionEvent, SessionId,
    SessionResult, SessionSnapshot, TransitionScheduler,
};

use constants::{PLAYER_RECORD_KEY, RULES_CONFIG_NAME};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the country catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<CountryCatalog, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Key-value store for the serialized player record
/// Platform-specific implementations should provide this
pub trait PlayerStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store the serialized record under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save_record(&self, key: &str, raw: &str) -> Result<(), Self::Error>;

    /// Fetch the serialized record, `None` when nothing was stored yet
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load_record(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Remove the stored record
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    fn delete_record(&self, key: &str) -> Result<(), Self::Error>;
}

/// Main game engine: owns the player record, the active session and the
/// clock that delivers its delayed transitions.
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: PlayerStorage,
{
    data_loader: L,
    storage: S,
    catalog: CountryCatalog,
    rules: RulesConfig,
    record: PlayerRecord,
    today: NaiveDate,
    session: Option<GameSession>,
    scheduler: TransitionScheduler,
    rng: ChaCha20Rng,
    next_session: u64,
    last_result: Option<SessionResult>,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: PlayerStorage,
{
    /// Load catalog, rules and the stored player record, then register
    /// today's login.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or rules cannot be loaded or fail
    /// validation. A missing or corrupt player record is never an error.
    pub fn new(data_loader: L, storage: S, today: NaiveDate, seed: u64) -> anyhow::Result<Self> {
        let catalog = data_loader
            .load_catalog()
            .context("loading country catalog")?;
        catalog.validate().context("validating country catalog")?;
        let rules: RulesConfig = data_loader
            .load_config(RULES_CONFIG_NAME)
            .context("loading rules config")?;
        rules.validate().context("validating rules config")?;

        let (record, repaired) = match storage.load_record(PLAYER_RECORD_KEY) {
            Ok(Some(raw)) => PlayerRecord::from_json_lenient(&raw, today),
            Ok(None) => (PlayerRecord::initial(today), false),
            Err(err) => {
                log::warn!("player record could not be read: {err}; starting fresh");
                (PlayerRecord::initial(today), false)
            }
        };

        let mut engine = Self {
            data_loader,
            storage,
            catalog,
            rules,
            record,
            today,
            session: None,
            scheduler: TransitionScheduler::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
            next_session: 1,
            last_result: None,
        };
        if repaired {
            engine.persist();
        }
        engine.check_login();
        Ok(engine)
    }

    /// Apply the login-streak rule for `today` and flush when it changed.
    pub fn check_login(&mut self) {
        let ledger = register_login(&self.record.ledger, self.today);
        if ledger != self.record.ledger {
            log::debug!(
                "login streak {} -> {}",
                self.record.ledger.streak,
                ledger.streak
            );
            self.record.ledger = ledger;
            self.persist();
        }
    }

    /// Start a new session, discarding the current one unscored.
    ///
    /// Returns `None` when an adventure continent is still locked for the
    /// player's level.
    pub fn start_session(
        &mut self,
        mode: GameMode,
        continent: Option<Continent>,
    ) -> Option<(SessionId, Vec<SessionEffect>)> {
        if mode == GameMode::Adventure
            && let Some(continent) = continent
            && !continent.is_unlocked_at(self.record.ledger.level())
        {
            log::info!(
                "{continent} requires level {}, player is level {}",
                continent.required_level(),
                self.record.ledger.level()
            );
            return None;
        }
        self.abandon_session();

        let id = SessionId(self.next_session);
        self.next_session += 1;
        let mut ctx = SessionContext {
            catalog: &self.catalog,
            rules: &self.rules,
            rng: &mut self.rng,
        };
        let (session, effects) = GameSession::start(id, mode, continent, self.today, &mut ctx);
        self.session = Some(session);
        self.absorb(&effects);
        Some((id, effects))
    }

    /// Drop the active session without touching the ledger.
    pub fn abandon_session(&mut self) {
        if let Some(session) = self.session.take() {
            let dropped = self.scheduler.cancel_session(session.id());
            log::debug!(
                "session {} closed, {dropped} pending transitions dropped",
                session.id().0
            );
        }
    }

    pub fn submit_answer(&mut self, option_id: &str) -> Vec<SessionEffect> {
        self.dispatch(SessionEvent::Answer(option_id.to_string()))
    }

    pub fn use_powerup(&mut self, kind: PowerupKind) -> Vec<SessionEffect> {
        self.dispatch(SessionEvent::UsePowerup(kind))
    }

    pub fn advance(&mut self) -> Vec<SessionEffect> {
        self.dispatch(SessionEvent::Advance)
    }

    pub fn acknowledge_fact(&mut self) -> Vec<SessionEffect> {
        self.dispatch(SessionEvent::AcknowledgeFact)
    }

    /// Let `elapsed` pass on the engine clock, delivering every delayed
    /// transition that comes due in order.
    pub fn elapse(&mut self, elapsed: Duration) -> Vec<SessionEffect> {
        let until = self.scheduler.now() + elapsed;
        let mut effects = Vec::new();
        while let Some(transition) = self.scheduler.pop_due(until) {
            effects.extend(self.dispatch(SessionEvent::Deferred(transition)));
        }
        self.scheduler.settle_at(until);
        effects
    }

    fn dispatch(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let mut ctx = SessionContext {
            catalog: &self.catalog,
            rules: &self.rules,
            rng: &mut self.rng,
        };
        let effects = session.handle(event, &mut ctx);
        self.absorb(&effects);
        effects
    }

    fn absorb(&mut self, effects: &[SessionEffect]) {
        for effect in effects {
            match effect {
                SessionEffect::Schedule { transition, delay } => {
                    self.scheduler.schedule(*transition, *delay);
                }
                SessionEffect::Ended(_) => self.settle_session(),
                _ => {}
            }
        }
    }

    fn settle_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(result) = session.take_result() else {
            return;
        };
        self.scheduler.cancel_session(result.session);
        self.record.ledger =
            apply_session_result(&self.record.ledger, result.mode, result.final_score);
        log::debug!(
            "session {} settled: score={} xp={} coins={}",
            result.session.0,
            result.final_score,
            self.record.ledger.xp,
            self.record.ledger.coins
        );
        self.last_result = Some(result);
        self.persist();
    }

    /// Equip a role, buying it when locked, and flush the record.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown roles or insufficient coins.
    pub fn purchase_role(&mut self, role_id: &str) -> Result<RoleOutcome, PurchaseError> {
        let outcome = cosmetics::acquire_role(&mut self.record, role_id)?;
        self.persist();
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns an error for unknown avatar ids.
    pub fn select_avatar(&mut self, avatar_id: &str) -> Result<(), PurchaseError> {
        cosmetics::select_avatar(&mut self.record, avatar_id)?;
        self.persist();
        Ok(())
    }

    pub fn rename(&mut self, username: &str) {
        let trimmed = username.trim();
        if trimmed.is_empty() || trimmed == self.record.username {
            return;
        }
        self.record.username = trimmed.to_string();
        self.persist();
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.record.is_dark_mode = !self.record.is_dark_mode;
        self.persist();
        self.record.is_dark_mode
    }

    /// Wipe the stored record and start over from the initial template.
    pub fn reset_progress(&mut self) {
        self.abandon_session();
        if let Err(err) = self.storage.delete_record(PLAYER_RECORD_KEY) {
            log::error!("player record could not be deleted: {err}");
        }
        self.record = PlayerRecord::initial(self.today);
        self.last_result = None;
    }

    /// Reload the rules from the data loader, for the next session.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded or are invalid; the
    /// current rules stay in place.
    pub fn reload_rules(&mut self) -> anyhow::Result<()> {
        let rules: RulesConfig = self
            .data_loader
            .load_config(RULES_CONFIG_NAME)
            .context("loading rules config")?;
        rules.validate().context("validating rules config")?;
        self.rules = rules;
        Ok(())
    }

    fn persist(&self) {
        let raw = match self.record.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                log::error!("player record could not be serialized: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.save_record(PLAYER_RECORD_KEY, &raw) {
            log::error!("player record could not be saved: {err}");
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(GameSession::snapshot)
    }

    #[must_use]
    pub const fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn last_result(&self) -> Option<&SessionResult> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub const fn record(&self) -> &PlayerRecord {
        &self.record
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.record.ledger
    }

    #[must_use]
    pub fn achievements(&self) -> AchievementBoard {
        AchievementBoard::evaluate(&self.record.ledger)
    }

    /// Continents open on the adventure map, in map order.
    #[must_use]
    pub fn unlocked_continents(&self) -> Vec<Continent> {
        let level = self.record.ledger.level();
        Continent::ALL
            .into_iter()
            .filter(|continent| continent.is_unlocked_at(level))
            .collect()
    }

    #[must_use]
    pub const fn catalog(&self) -> &CountryCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of delayed transitions still waiting on the clock.
    #[must_use]
    pub fn pending_transitions(&self) -> usize {
        self.scheduler.len()
    }
}
