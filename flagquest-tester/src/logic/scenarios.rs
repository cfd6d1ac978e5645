use anyhow::{Result, ensure};
use chrono::NaiveDate;
use std::time::Duration;

use flagquest_game::constants::{FIFTY_FIFTY_REMOVALS, SURVIVAL_STREAK_POINTS};
use flagquest_game::{
    Continent, CountryCatalog, DuelVerdict, EndReason, GameMode, PlayerRecord, PowerupKind,
    SessionReward, daily_challenge, level_for_xp,
};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationPlan, SimulationSummary};

/// A named simulation the tester can run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: [(&str, &str); 11] = [
    ("smoke", "Adventure in Europe answered perfectly"),
    ("timed-clock", "Timed mode drained by slow answers"),
    ("timed-guess", "Timed mode with random guesses"),
    ("survival", "Survival streak until the first mistake"),
    ("lives-exhausted", "Adventure lost by always missing"),
    ("daily", "Daily challenge for the configured date"),
    ("powerups", "Every powerup spent before answering"),
    ("duel", "Two-player hot-seat session"),
    ("locked-continent", "Adventure on a continent above the player's level"),
    ("veteran", "High-level profile plays Oceania"),
    ("login-streak", "Returning player extends the login streak"),
];

/// Keys and descriptions of every scenario.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

/// Replace `all` with every scenario key, keeping explicit keys in order.
#[must_use]
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = requested
        .iter()
        .filter(|key| !key.eq_ignore_ascii_case("all"))
        .cloned()
        .collect();
    if requested.iter().any(|key| key.eq_ignore_ascii_case("all")) {
        for (key, _) in SCENARIOS {
            if !keys.iter().any(|existing| existing == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let plan = match key.to_ascii_lowercase().as_str() {
        "smoke" => plan(GameMode::Adventure, GameplayStrategy::Perfect)
            .with_continent(Continent::Europe)
            .with_expectation(perfect_run_expectation),
        "timed-clock" => plan(GameMode::Timed, GameplayStrategy::Perfect)
            .with_think_time(Duration::from_secs(7))
            .with_expectation(timed_clock_expectation),
        "timed-guess" => plan(GameMode::Timed, GameplayStrategy::Guesser)
            .with_think_time(Duration::from_secs(1))
            .with_expectation(timed_guess_expectation),
        "survival" => plan(GameMode::Survival, GameplayStrategy::Scholar)
            .with_expectation(survival_expectation),
        "lives-exhausted" => plan(GameMode::Adventure, GameplayStrategy::Reckless)
            .with_expectation(lives_exhausted_expectation),
        "daily" => plan(GameMode::Daily, GameplayStrategy::Perfect)
            .with_expectation(daily_expectation)
            .with_expectation(perfect_run_expectation),
        "powerups" => plan(GameMode::Adventure, GameplayStrategy::PowerUser)
            .with_expectation(powerups_expectation),
        "duel" => plan(GameMode::Multiplayer, GameplayStrategy::Scholar)
            .with_expectation(duel_expectation),
        "locked-continent" => plan(GameMode::Adventure, GameplayStrategy::Perfect)
            .with_continent(Continent::Oceania)
            .with_profile(PlayerRecord::initial)
            .with_expectation(locked_expectation),
        "veteran" => plan(GameMode::Adventure, GameplayStrategy::Perfect)
            .with_continent(Continent::Oceania)
            .with_profile(veteran_profile)
            .with_expectation(perfect_run_expectation),
        "login-streak" => plan(GameMode::Adventure, GameplayStrategy::Scholar)
            .with_profile(returning_profile)
            .with_expectation(login_streak_expectation),
        _ => return None,
    };
    let name = SCENARIOS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map_or(key, |(candidate, _)| *candidate);
    Some(TestScenario::simulation(name, plan))
}

fn plan(mode: GameMode, strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(mode, strategy).with_expectation(ledger_expectation)
}

fn veteran_profile(today: NaiveDate) -> PlayerRecord {
    let mut record = PlayerRecord::initial(today);
    record.ledger.xp = 2_000;
    record
}

fn returning_profile(today: NaiveDate) -> PlayerRecord {
    let mut record = PlayerRecord::initial(today);
    record.ledger.streak = 4;
    record.ledger.last_login = today.pred_opt().unwrap_or(today);
    record
}

/// Checks every simulation must pass regardless of scenario.
fn ledger_expectation(summary: &SimulationSummary) -> Result<()> {
    let before = &summary.ledger_before;
    let after = &summary.ledger_after;
    ensure!(
        after.total_coins >= after.coins,
        "lifetime coins {} fell below balance {}",
        after.total_coins,
        after.coins
    );
    ensure!(
        after.level() == level_for_xp(after.xp),
        "level out of step with xp"
    );
    if summary.started {
        ensure!(summary.result.is_some(), "started session never settled");
    }
    if let Some(result) = &summary.result {
        ensure!(
            result.questions == summary.questions.len(),
            "result counts {} questions, session asked {}",
            result.questions,
            summary.questions.len()
        );
        let logged = u32::try_from(summary.correct_rounds()).unwrap_or(u32::MAX);
        ensure!(
            result.correct_answers == logged,
            "result counts {} correct answers, rounds show {logged}",
            result.correct_answers
        );
    }

    let score = summary.score();
    let reward = SessionReward::for_score(score);
    ensure!(
        after.xp == before.xp.saturating_add(reward.xp),
        "xp {} -> {} for score {score}",
        before.xp,
        after.xp
    );
    ensure!(
        after.coins == before.coins.saturating_add(reward.coins),
        "coins {} -> {} for score {score}",
        before.coins,
        after.coins
    );
    ensure!(
        after.total_coins == before.total_coins.saturating_add(reward.coins),
        "lifetime coins {} -> {} for score {score}",
        before.total_coins,
        after.total_coins
    );
    if score == 0 {
        ensure!(after == before, "zero score changed the ledger");
    }
    let daily_bump = u32::from(summary.mode == GameMode::Daily && score > 0);
    ensure!(
        after.daily_challenges_completed == before.daily_challenges_completed + daily_bump,
        "daily counter {} -> {}",
        before.daily_challenges_completed,
        after.daily_challenges_completed
    );
    Ok(())
}

fn reason(summary: &SimulationSummary) -> Option<EndReason> {
    summary.result.as_ref().map(|result| result.reason)
}

fn perfect_run_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.started, "session did not start");
    ensure!(
        reason(summary) == Some(EndReason::Completed),
        "perfect run ended with {}",
        summary.outcome_label()
    );
    ensure!(
        summary.correct_rounds() == summary.questions.len(),
        "{} of {} answers were correct",
        summary.correct_rounds(),
        summary.questions.len()
    );
    let per_question = summary.rules.points_per_correct;
    let expected = u32::try_from(summary.questions.len()).unwrap_or(u32::MAX) * per_question;
    ensure!(
        summary.score() == expected,
        "score {} != {expected}",
        summary.score()
    );
    Ok(())
}

fn timed_points(summary: &SimulationSummary) -> Result<Vec<u32>> {
    let points: Vec<u32> = summary
        .rounds
        .iter()
        .filter(|round| round.correct == Some(true))
        .map(|round| round.points)
        .collect();
    for &earned in &points {
        ensure!(
            earned > summary.rules.points_per_correct,
            "timed answer earned {earned} without a time bonus"
        );
    }
    Ok(points)
}

fn timed_clock_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        matches!(
            reason(summary),
            Some(EndReason::TimeUp | EndReason::Completed)
        ),
        "timed session ended with {}",
        summary.outcome_label()
    );
    if reason(summary) == Some(EndReason::TimeUp) {
        let limit = Duration::from_secs(u64::from(summary.rules.timed_seconds));
        ensure!(
            summary.clock >= limit,
            "clock ran out after only {:?}",
            summary.clock
        );
    }
    let points = timed_points(summary)?;
    ensure!(
        points.windows(2).all(|pair| pair[0] > pair[1]),
        "time bonus should shrink every round: {points:?}"
    );
    Ok(())
}

fn timed_guess_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        matches!(
            reason(summary),
            Some(EndReason::TimeUp | EndReason::Completed)
        ),
        "misses must not end a timed session: {}",
        summary.outcome_label()
    );
    timed_points(summary)?;
    for round in &summary.rounds {
        if round.correct == Some(false) {
            ensure!(round.points == 0, "a miss earned {} points", round.points);
        }
    }
    Ok(())
}

fn survival_expectation(summary: &SimulationSummary) -> Result<()> {
    let judged: Vec<bool> = summary.rounds.iter().filter_map(|r| r.correct).collect();
    match reason(summary) {
        Some(EndReason::Mistake) => {
            ensure!(
                judged.last() == Some(&false),
                "survival ended without a final miss"
            );
            ensure!(
                judged[..judged.len() - 1].iter().all(|&correct| correct),
                "survival continued after a miss"
            );
        }
        Some(EndReason::Completed) => {
            ensure!(
                judged.iter().all(|&correct| correct),
                "survival completed with a miss"
            );
        }
        _ => anyhow::bail!("survival ended with {}", summary.outcome_label()),
    }
    let streak = summary.score() / SURVIVAL_STREAK_POINTS;
    ensure!(
        summary.ledger_after.best_survival_streak >= streak,
        "best streak {} below this run's {streak}",
        summary.ledger_after.best_survival_streak
    );
    Ok(())
}

fn lives_exhausted_expectation(summary: &SimulationSummary) -> Result<()> {
    let lives = usize::from(summary.rules.starting_lives);
    if lives <= summary.questions.len() {
        ensure!(
            reason(summary) == Some(EndReason::OutOfLives),
            "reckless run ended with {}",
            summary.outcome_label()
        );
        ensure!(
            summary.rounds.len() == lives,
            "expected {lives} rounds, played {}",
            summary.rounds.len()
        );
    }
    ensure!(summary.score() == 0, "misses scored {}", summary.score());
    Ok(())
}

fn daily_expectation(summary: &SimulationSummary) -> Result<()> {
    let expected: Vec<String> = daily_challenge(
        CountryCatalog::builtin(),
        summary.today,
        summary.rules.daily_questions,
    )
    .into_iter()
    .map(|country| country.id)
    .collect();
    ensure!(
        summary.questions == expected,
        "daily questions {:?} differ from {expected:?}",
        summary.questions
    );
    Ok(())
}

fn powerups_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(left) = summary.powerups_left else {
        anyhow::bail!("no session left to inspect");
    };
    let stock = summary.rules.powerups;
    let used = |kind: PowerupKind| {
        summary
            .rounds
            .iter()
            .flat_map(|round| &round.powerups)
            .filter(|used| **used == kind)
            .count()
    };
    for kind in PowerupKind::ALL {
        let spent = usize::from(stock.remaining(kind) - left.remaining(kind));
        ensure!(
            used(kind) == spent,
            "{kind} used {} times but inventory dropped by {spent}",
            used(kind)
        );
    }
    let disabled: usize = summary.rounds.iter().map(|round| round.disabled).sum();
    ensure!(
        disabled == used(PowerupKind::FiftyFifty) * FIFTY_FIFTY_REMOVALS,
        "fifty-fifty disabled {disabled} options"
    );
    for round in &summary.rounds {
        if let Some(hint) = round.hint {
            let actual = CountryCatalog::builtin()
                .find(&round.flag_id)
                .map(|country| country.continent);
            ensure!(
                actual == Some(hint),
                "hint {hint} is wrong for {}",
                round.flag_id
            );
        }
    }
    ensure!(
        reason(summary) == Some(EndReason::Completed),
        "power user ended with {}",
        summary.outcome_label()
    );
    Ok(())
}

fn duel_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(result) = &summary.result else {
        anyhow::bail!("duel never finished");
    };
    let Some(duel) = result.duel else {
        anyhow::bail!("multiplayer result without a duel score");
    };
    ensure!(
        duel.p1 + duel.p2 == result.correct_answers,
        "duel {}-{} does not add up to {} correct answers",
        duel.p1,
        duel.p2,
        result.correct_answers
    );
    let expected = match duel.p1.cmp(&duel.p2) {
        std::cmp::Ordering::Greater => DuelVerdict::PlayerOne,
        std::cmp::Ordering::Less => DuelVerdict::PlayerTwo,
        std::cmp::Ordering::Equal => DuelVerdict::Draw,
    };
    ensure!(duel.verdict() == expected, "wrong verdict for {duel:?}");
    Ok(())
}

fn locked_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(!summary.started, "locked continent started a session");
    ensure!(summary.result.is_none(), "locked continent produced a result");
    ensure!(
        summary.ledger_after == summary.ledger_before,
        "refused start changed the ledger"
    );
    Ok(())
}

fn login_streak_expectation(summary: &SimulationSummary) -> Result<()> {
    let ledger = &summary.ledger_before;
    ensure!(ledger.streak == 5, "streak is {} after a 1-day gap", ledger.streak);
    ensure!(
        ledger.last_login == summary.today,
        "last login {} not moved to {}",
        ledger.last_login,
        summary.today
    );
    ensure!(
        summary
            .achievements
            .login
            .get(4)
            .is_some_and(|tier| tier.completed),
        "five-day login tier not reached"
    );
    Ok(())
}
