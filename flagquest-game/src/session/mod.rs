//! Round engine: the per-session state machine.
//!
//! A [`GameSession`] is a reducer over discrete events. Every command that is
//! not valid in the current state is a no-op that yields no effects; delayed
//! transitions come back in as [`SessionEvent::Deferred`] and are discarded
//! when their ticket no longer matches the live session and round.
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::{Continent, Country, CountryCatalog};
use crate::constants::FIFTY_FIFTY_REMOVALS;
use crate::daily::daily_challenge;
use crate::rules::RulesConfig;
use crate::sampler::{pick_removals, round_options, sample};

pub mod powerups;
pub mod round;
pub mod scheduler;
pub mod snapshot;

pub use powerups::{PowerupInventory, PowerupKind};
pub use round::{Feedback, QuestionRound, RoundPhase};
pub use scheduler::{DeferredKind, DeferredTransition, SessionId, Ticket, TransitionScheduler};
pub use snapshot::{OptionView, SessionSnapshot};

const CLOCK_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Adventure,
    Timed,
    Survival,
    Daily,
    Multiplayer,
}

impl GameMode {
    pub const ALL: [Self; 5] = [
        Self::Adventure,
        Self::Timed,
        Self::Survival,
        Self::Daily,
        Self::Multiplayer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adventure => "adventure",
            Self::Timed => "timed",
            Self::Survival => "survival",
            Self::Daily => "daily",
            Self::Multiplayer => "multiplayer",
        }
    }

    /// Whether a miss costs a life. Timed mode runs on the clock instead.
    #[must_use]
    pub const fn uses_lives(self) -> bool {
        !matches!(self, Self::Timed)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adventure" => Ok(Self::Adventure),
            "timed" => Ok(Self::Timed),
            "survival" => Ok(Self::Survival),
            "daily" => Ok(Self::Daily),
            "multiplayer" => Ok(Self::Multiplayer),
            _ => Err(()),
        }
    }
}

/// Whose turn it is in pass-and-play multiplayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    #[default]
    P1,
    P2,
}

impl Player {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every question was played.
    Completed,
    /// The last life was lost.
    OutOfLives,
    /// A miss in survival mode.
    Mistake,
    /// The timed-mode clock reached zero.
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelVerdict {
    PlayerOne,
    PlayerTwo,
    Draw,
}

/// Correct answers per player in multiplayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DuelScore {
    pub p1: u32,
    pub p2: u32,
}

impl DuelScore {
    #[must_use]
    pub const fn verdict(&self) -> DuelVerdict {
        if self.p1 > self.p2 {
            DuelVerdict::PlayerOne
        } else if self.p2 > self.p1 {
            DuelVerdict::PlayerTwo
        } else {
            DuelVerdict::Draw
        }
    }
}

/// Terminal summary of a session, folded into the ledger exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session: SessionId,
    pub mode: GameMode,
    pub final_score: u32,
    pub correct_answers: u32,
    pub questions: usize,
    pub reason: EndReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duel: Option<DuelScore>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Answer(String),
    UsePowerup(PowerupKind),
    Advance,
    AcknowledgeFact,
    Deferred(DeferredTransition),
}

/// Observable consequences of handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Ask the owner's scheduler to deliver `transition` after `delay`.
    Schedule {
        transition: DeferredTransition,
        delay: Duration,
    },
    RoundStarted {
        index: usize,
    },
    AnswerJudged {
        correct: bool,
        points: u32,
    },
    FactRevealed(Country),
    PowerupUsed {
        kind: PowerupKind,
        remaining: u8,
    },
    OptionsDisabled(SmallVec<[String; 2]>),
    HintRevealed(Continent),
    ClockTicked {
        remaining: u32,
    },
    Ended(SessionResult),
}

/// Explicit collaborators handed to every command.
pub struct SessionContext<'a, R: Rng + ?Sized> {
    pub catalog: &'a CountryCatalog,
    pub rules: &'a RulesConfig,
    pub rng: &'a mut R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    id: SessionId,
    mode: GameMode,
    continent: Option<Continent>,
    questions: Vec<Country>,
    current_index: usize,
    round: Option<QuestionRound>,
    round_serial: u32,
    score: u32,
    correct_answers: u32,
    lives: u8,
    time_remaining: u32,
    powerups: PowerupInventory,
    turn: Player,
    duel: DuelScore,
    ended: Option<EndReason>,
    result_taken: bool,
}

impl GameSession {
    /// Pick the question sequence for `mode` and open the first round.
    ///
    /// `continent` only scopes adventure sessions; other modes draw from the
    /// whole catalog. The daily mode ignores randomness entirely.
    pub fn start<R: Rng + ?Sized>(
        id: SessionId,
        mode: GameMode,
        continent: Option<Continent>,
        today: NaiveDate,
        ctx: &mut SessionContext<'_, R>,
    ) -> (Self, Vec<SessionEffect>) {
        let continent = continent.filter(|_| mode == GameMode::Adventure);
        let questions = match mode {
            GameMode::Daily => daily_challenge(ctx.catalog, today, ctx.rules.daily_questions),
            _ => sample(
                ctx.catalog,
                ctx.rules.questions_per_session,
                None,
                continent,
                ctx.rng,
            ),
        };
        let lives = match mode {
            GameMode::Survival => ctx.rules.survival_lives,
            _ => ctx.rules.starting_lives,
        };

        let mut session = Self {
            id,
            mode,
            continent,
            questions,
            current_index: 0,
            round: None,
            round_serial: 0,
            score: 0,
            correct_answers: 0,
            lives,
            time_remaining: ctx.rules.timed_seconds,
            powerups: ctx.rules.powerups,
            turn: Player::P1,
            duel: DuelScore::default(),
            ended: None,
            result_taken: false,
        };

        let mut effects = Vec::new();
        log::debug!(
            "session {} started: mode={mode} continent={continent:?} questions={}",
            id.0,
            session.questions.len()
        );
        if session.questions.is_empty() {
            session.end(EndReason::Completed, &mut effects);
            return (session, effects);
        }
        session.open_round(ctx);
        effects.push(SessionEffect::RoundStarted { index: 0 });
        if mode == GameMode::Timed {
            session.schedule(DeferredKind::ClockTick, CLOCK_TICK, &mut effects);
        }
        (session, effects)
    }

    /// Apply one event. Invalid events leave the session untouched and
    /// return no effects.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        event: SessionEvent,
        ctx: &mut SessionContext<'_, R>,
    ) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        if self.ended.is_some() {
            return effects;
        }
        match event {
            SessionEvent::Answer(option_id) => self.on_answer(&option_id, ctx, &mut effects),
            SessionEvent::UsePowerup(kind) => self.on_powerup(kind, ctx, &mut effects),
            SessionEvent::Advance => {
                // A correct answer only moves on through its fact prompt.
                if self.round.as_ref().is_some_and(|round| {
                    round.phase == RoundPhase::ShowingFact || round.feedback == Feedback::Wrong
                }) {
                    self.advance(ctx, &mut effects);
                }
            }
            SessionEvent::AcknowledgeFact => {
                if self
                    .round
                    .as_ref()
                    .is_some_and(|round| round.phase == RoundPhase::ShowingFact)
                {
                    self.advance(ctx, &mut effects);
                }
            }
            SessionEvent::Deferred(transition) => self.on_deferred(transition, ctx, &mut effects),
        }
        effects
    }

    fn on_answer<R: Rng + ?Sized>(
        &mut self,
        option_id: &str,
        ctx: &SessionContext<'_, R>,
        effects: &mut Vec<SessionEffect>,
    ) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if !round.accepts_input() || !round.is_selectable(option_id) {
            return;
        }
        round.phase = RoundPhase::Answered;

        if option_id == round.correct_id() {
            round.feedback = Feedback::Correct;
            let bonus = if self.mode == GameMode::Timed {
                self.time_remaining
            } else {
                0
            };
            let points = ctx.rules.points_per_correct + bonus;
            self.score += points;
            self.correct_answers += 1;
            if self.mode == GameMode::Multiplayer {
                match self.turn {
                    Player::P1 => self.duel.p1 += 1,
                    Player::P2 => self.duel.p2 += 1,
                }
            }
            log::debug!(
                "session {} round {}: correct (+{points})",
                self.id.0,
                self.current_index
            );
            effects.push(SessionEffect::AnswerJudged {
                correct: true,
                points,
            });
            self.schedule(
                DeferredKind::RevealFact,
                ctx.rules.fact_reveal_delay(),
                effects,
            );
            return;
        }

        round.feedback = Feedback::Wrong;
        log::debug!(
            "session {} round {}: wrong answer {option_id}",
            self.id.0,
            self.current_index
        );
        effects.push(SessionEffect::AnswerJudged {
            correct: false,
            points: 0,
        });
        match self.mode {
            GameMode::Survival => self.end(EndReason::Mistake, effects),
            GameMode::Timed => self.schedule(
                DeferredKind::AdvanceAfterMiss,
                ctx.rules.miss_advance_delay(),
                effects,
            ),
            _ => {
                self.lives = self.lives.saturating_sub(1);
                if self.lives == 0 {
                    self.schedule(
                        DeferredKind::EndAfterMiss,
                        ctx.rules.miss_end_delay(),
                        effects,
                    );
                } else {
                    self.schedule(
                        DeferredKind::AdvanceAfterMiss,
                        ctx.rules.miss_advance_delay(),
                        effects,
                    );
                }
            }
        }
    }

    fn on_powerup<R: Rng + ?Sized>(
        &mut self,
        kind: PowerupKind,
        ctx: &mut SessionContext<'_, R>,
        effects: &mut Vec<SessionEffect>,
    ) {
        if !self.round.as_ref().is_some_and(QuestionRound::accepts_input) {
            return;
        }
        if !self.powerups.consume(kind) {
            return;
        }
        log::debug!("session {} used powerup {kind}", self.id.0);
        effects.push(SessionEffect::PowerupUsed {
            kind,
            remaining: self.powerups.remaining(kind),
        });

        match kind {
            PowerupKind::FiftyFifty => {
                if let Some(round) = self.round.as_mut() {
                    let removals = pick_removals(
                        &round.options,
                        round.correct_id(),
                        &round.disabled,
                        FIFTY_FIFTY_REMOVALS,
                        ctx.rng,
                    );
                    round.disabled.extend(removals.iter().cloned());
                    effects.push(SessionEffect::OptionsDisabled(removals));
                }
            }
            PowerupKind::Skip => self.advance(ctx, effects),
            PowerupKind::Hint => {
                if let Some(round) = self.round.as_ref() {
                    effects.push(SessionEffect::HintRevealed(round.country.continent));
                }
            }
        }
    }

    fn on_deferred<R: Rng + ?Sized>(
        &mut self,
        transition: DeferredTransition,
        ctx: &mut SessionContext<'_, R>,
        effects: &mut Vec<SessionEffect>,
    ) {
        let ticket = transition.ticket;
        let stale = ticket.session != self.id
            || (transition.kind.is_round_bound() && ticket.round != self.round_serial);
        if stale {
            log::debug!(
                "session {} discarded stale {:?} from session {} round {}",
                self.id.0,
                transition.kind,
                ticket.session.0,
                ticket.round
            );
            return;
        }

        match transition.kind {
            DeferredKind::RevealFact => {
                if let Some(round) = self.round.as_mut()
                    && round.phase == RoundPhase::Answered
                    && round.feedback == Feedback::Correct
                {
                    round.phase = RoundPhase::ShowingFact;
                    effects.push(SessionEffect::FactRevealed(round.country.clone()));
                }
            }
            DeferredKind::AdvanceAfterMiss => {
                if self
                    .round
                    .as_ref()
                    .is_some_and(|round| round.feedback == Feedback::Wrong)
                {
                    self.advance(ctx, effects);
                }
            }
            DeferredKind::EndAfterMiss => self.end(EndReason::OutOfLives, effects),
            DeferredKind::ClockTick => {
                if self.mode != GameMode::Timed {
                    return;
                }
                self.time_remaining = self.time_remaining.saturating_sub(1);
                effects.push(SessionEffect::ClockTicked {
                    remaining: self.time_remaining,
                });
                if self.time_remaining == 0 {
                    self.end(EndReason::TimeUp, effects);
                } else {
                    self.schedule(DeferredKind::ClockTick, CLOCK_TICK, effects);
                }
            }
        }
    }

    /// Move to the next question, or end the session. An exhausted life
    /// pool always wins over advancing.
    fn advance<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut SessionContext<'_, R>,
        effects: &mut Vec<SessionEffect>,
    ) {
        if self.mode.uses_lives() && self.lives == 0 {
            self.end(EndReason::OutOfLives, effects);
            return;
        }
        if self.current_index + 1 >= self.questions.len() {
            self.end(EndReason::Completed, effects);
            return;
        }
        self.current_index += 1;
        self.round_serial += 1;
        self.open_round(ctx);
        if self.mode == GameMode::Multiplayer {
            self.turn = self.turn.other();
        }
        effects.push(SessionEffect::RoundStarted {
            index: self.current_index,
        });
    }

    fn open_round<R: Rng + ?Sized>(&mut self, ctx: &mut SessionContext<'_, R>) {
        let country = self.questions[self.current_index].clone();
        let options = round_options(ctx.catalog, &country, self.continent, ctx.rng);
        self.round = Some(QuestionRound::new(country, options));
    }

    fn end(&mut self, reason: EndReason, effects: &mut Vec<SessionEffect>) {
        if self.ended.is_some() {
            return;
        }
        self.ended = Some(reason);
        log::debug!(
            "session {} ended: {reason:?} score={}",
            self.id.0,
            self.score
        );
        if let Some(result) = self.result() {
            effects.push(SessionEffect::Ended(result));
        }
    }

    fn schedule(&self, kind: DeferredKind, delay: Duration, effects: &mut Vec<SessionEffect>) {
        effects.push(SessionEffect::Schedule {
            transition: DeferredTransition {
                ticket: self.ticket(),
                kind,
            },
            delay,
        });
    }

    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        Ticket {
            session: self.id,
            round: self.round_serial,
        }
    }

    /// Summary of an ended session; `None` while still in play.
    #[must_use]
    pub fn result(&self) -> Option<SessionResult> {
        let reason = self.ended?;
        Some(SessionResult {
            session: self.id,
            mode: self.mode,
            final_score: self.score,
            correct_answers: self.correct_answers,
            questions: self.questions.len(),
            reason,
            duel: (self.mode == GameMode::Multiplayer).then_some(self.duel),
        })
    }

    /// Hand out the result the first time it is asked for after the session
    /// ended, and `None` ever after.
    pub fn take_result(&mut self) -> Option<SessionResult> {
        if self.result_taken {
            return None;
        }
        let result = self.result()?;
        self.result_taken = true;
        Some(result)
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub const fn continent(&self) -> Option<Continent> {
        self.continent
    }

    #[must_use]
    pub fn questions(&self) -> &[Country] {
        &self.questions
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn round(&self) -> Option<&QuestionRound> {
        self.round.as_ref()
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn lives(&self) -> u8 {
        self.lives
    }

    #[must_use]
    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub const fn powerups(&self) -> PowerupInventory {
        self.powerups
    }

    #[must_use]
    pub const fn turn(&self) -> Player {
        self.turn
    }

    #[must_use]
    pub const fn duel(&self) -> DuelScore {
        self.duel
    }

    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.ended
    }
}
