//! Drives a [`GameEngine`] through one session with a scripted player.
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use flagquest_game::{
    AchievementBoard, Continent, DataLoader, GameEngine, GameMode, GameSession, Ledger,
    PlayerRecord, PlayerStorage, PowerupInventory, PowerupKind, RoundPhase, RulesConfig,
    SessionEffect, SessionResult,
};

use crate::logic::policy::{GameplayStrategy, PlayerAction, PlayerPolicy};
use crate::storage::{AssetLoader, ProfileStore};

/// Clock step used while feedback is on screen.
const FEEDBACK_STEP: Duration = Duration::from_millis(250);
const MAX_STEPS: usize = 2_000;

/// Shared inputs for every simulation of a run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    rules_path: Option<PathBuf>,
    profile_dir: Option<PathBuf>,
    today: NaiveDate,
}

impl TesterAssets {
    #[must_use]
    pub const fn new(
        rules_path: Option<PathBuf>,
        profile_dir: Option<PathBuf>,
        today: NaiveDate,
    ) -> Self {
        Self {
            rules_path,
            profile_dir,
            today,
        }
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    fn loader(&self) -> AssetLoader {
        AssetLoader::new(self.rules_path.clone())
    }

    /// Plans with their own profile always run in memory so a shared
    /// profile directory never leaks into them.
    fn store(&self, seeded: Option<String>) -> ProfileStore {
        match (&self.profile_dir, seeded) {
            (Some(dir), None) => ProfileStore::Disk(dir.clone()),
            (_, seeded) => ProfileStore::memory(seeded),
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub mode: GameMode,
    pub continent: Option<Continent>,
    pub strategy: GameplayStrategy,
    /// Clock time spent before the first action of every round.
    pub think_time: Duration,
    /// Record to start from instead of the stored profile.
    pub profile: Option<fn(NaiveDate) -> PlayerRecord>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(mode: GameMode, strategy: GameplayStrategy) -> Self {
        Self {
            mode,
            continent: None,
            strategy,
            think_time: Duration::ZERO,
            profile: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_continent(mut self, continent: Continent) -> Self {
        self.continent = Some(continent);
        self
    }

    #[must_use]
    pub const fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: fn(NaiveDate) -> PlayerRecord) -> Self {
        self.profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// What happened to one question.
#[derive(Debug, Clone, Default)]
pub struct RoundLog {
    pub index: usize,
    pub flag_id: String,
    pub actions: Vec<String>,
    /// `None` when the round was skipped or the session ended first.
    pub correct: Option<bool>,
    pub points: u32,
    pub disabled: usize,
    pub hint: Option<Continent>,
    pub powerups: Vec<PowerupKind>,
    thought: bool,
}

impl RoundLog {
    fn new(index: usize, flag_id: String) -> Self {
        Self {
            index,
            flag_id,
            ..Self::default()
        }
    }

    fn absorb(&mut self, effects: &[SessionEffect]) {
        for effect in effects {
            match effect {
                SessionEffect::AnswerJudged { correct, points } => {
                    self.correct = Some(*correct);
                    self.points = *points;
                }
                SessionEffect::OptionsDisabled(ids) => self.disabled += ids.len(),
                SessionEffect::HintRevealed(continent) => self.hint = Some(*continent),
                SessionEffect::PowerupUsed { kind, .. } => self.powerups.push(*kind),
                _ => {}
            }
        }
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: GameMode,
    pub strategy: GameplayStrategy,
    pub today: NaiveDate,
    pub rules: RulesConfig,
    pub started: bool,
    pub questions: Vec<String>,
    pub rounds: Vec<RoundLog>,
    pub result: Option<SessionResult>,
    pub powerups_left: Option<PowerupInventory>,
    pub ledger_before: Ledger,
    pub ledger_after: Ledger,
    pub achievements: AchievementBoard,
    pub clock: Duration,
}

impl SimulationSummary {
    #[must_use]
    pub fn score(&self) -> u32 {
        self.result.as_ref().map_or(0, |result| result.final_score)
    }

    #[must_use]
    pub fn correct_rounds(&self) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.correct == Some(true))
            .count()
    }

    #[must_use]
    pub fn outcome_label(&self) -> String {
        match &self.result {
            Some(result) => format!("{:?}", result.reason),
            None if self.started => "unfinished".to_string(),
            None => "not started".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct GameTester {
    assets: Arc<TesterAssets>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { assets, verbose }
    }

    /// Play one session of `plan` with everything seeded from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be built or the session stops
    /// making progress.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let today = self.assets.today();
        let seeded = plan
            .profile
            .map(|build| build(today).to_json())
            .transpose()
            .context("serializing scenario profile")?;
        let store = self.assets.store(seeded);
        let mut engine = GameEngine::new(self.assets.loader(), store, today, seed)?;
        let ledger_before = engine.ledger().clone();
        let mut policy = plan.strategy.create_policy(seed);

        let started = engine.start_session(plan.mode, plan.continent).is_some();
        let questions = engine
            .session()
            .map(|session| {
                session
                    .questions()
                    .iter()
                    .map(|country| country.id.clone())
                    .collect()
            })
            .unwrap_or_default();
        let mut rounds = Vec::new();
        if started {
            drive(&mut engine, policy.as_mut(), plan.think_time, &mut rounds)
                .with_context(|| format!("{} session with seed {seed}", plan.mode))?;
        }

        let summary = SimulationSummary {
            seed,
            mode: plan.mode,
            strategy: plan.strategy,
            today,
            rules: engine.rules().clone(),
            started,
            questions,
            rounds,
            result: engine.last_result().cloned(),
            powerups_left: engine.session().map(GameSession::powerups),
            ledger_before,
            ledger_after: engine.ledger().clone(),
            achievements: engine.achievements(),
            clock: engine.clock(),
        };
        if self.verbose {
            println!(
                "     ↳ {} {} seed {}: {} score {} in {} rounds ({:?} on the clock)",
                summary.mode,
                summary.strategy,
                seed,
                summary.outcome_label(),
                summary.score(),
                summary.rounds.len(),
                summary.clock
            );
        }
        Ok(summary)
    }
}

fn drive<L, S>(
    engine: &mut GameEngine<L, S>,
    policy: &mut dyn PlayerPolicy,
    think_time: Duration,
    rounds: &mut Vec<RoundLog>,
) -> Result<()>
where
    L: DataLoader,
    S: PlayerStorage,
{
    for _ in 0..MAX_STEPS {
        let Some(view) = engine.snapshot() else {
            bail!("session disappeared mid-run");
        };
        if view.ended.is_some() {
            return Ok(());
        }
        if rounds
            .last()
            .is_none_or(|round| round.index != view.question_index)
        {
            let flag = view.flag_id.clone().unwrap_or_default();
            rounds.push(RoundLog::new(view.question_index, flag));
        }
        let Some(round) = rounds.last_mut() else {
            bail!("no round log for question {}", view.question_index);
        };

        match view.phase {
            RoundPhase::AwaitingAnswer if !round.thought && !think_time.is_zero() => {
                round.thought = true;
                engine.elapse(think_time);
            }
            RoundPhase::AwaitingAnswer => {
                let action = policy.act(&view);
                round.actions.push(action.to_string());
                let effects = match &action {
                    PlayerAction::Answer(id) => engine.submit_answer(id),
                    PlayerAction::UsePowerup(kind) => engine.use_powerup(*kind),
                };
                if effects.is_empty() {
                    bail!(
                        "{} policy made no progress with '{action}' on question {}",
                        policy.name(),
                        view.question_index
                    );
                }
                round.absorb(&effects);
            }
            RoundPhase::Answered => {
                engine.elapse(FEEDBACK_STEP);
            }
            RoundPhase::ShowingFact => {
                engine.acknowledge_fact();
            }
        }
    }
    bail!("session did not finish within {MAX_STEPS} steps")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        GameTester::new(Arc::new(TesterAssets::new(None, None, today)), false)
    }

    #[test]
    fn perfect_run_completes_every_round() {
        let plan = SimulationPlan::new(GameMode::Adventure, GameplayStrategy::Perfect)
            .with_continent(Continent::Europe);
        let summary = tester().run_plan(&plan, 11).unwrap();
        assert!(summary.started);
        assert_eq!(summary.rounds.len(), 7);
        assert_eq!(summary.correct_rounds(), 7);
        assert_eq!(summary.score(), 700);
        assert_eq!(summary.ledger_after.xp, summary.ledger_before.xp + 350);
    }

    #[test]
    fn same_seed_replays_identically() {
        let plan = SimulationPlan::new(GameMode::Survival, GameplayStrategy::Scholar);
        let first = tester().run_plan(&plan, 2024).unwrap();
        let second = tester().run_plan(&plan, 2024).unwrap();
        assert_eq!(first.questions, second.questions);
        assert_eq!(first.score(), second.score());
        assert_eq!(first.rounds.len(), second.rounds.len());
    }

    #[test]
    fn think_time_drains_the_timer() {
        let plan = SimulationPlan::new(GameMode::Timed, GameplayStrategy::Perfect)
            .with_think_time(Duration::from_secs(7));
        let summary = tester().run_plan(&plan, 3).unwrap();
        assert_eq!(summary.outcome_label(), "TimeUp");
        assert!(summary.rounds.len() < 10);
    }
}
