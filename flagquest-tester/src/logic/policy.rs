use std::fmt;
use std::str::FromStr;

use flagquest_game::{PowerupKind, SessionSnapshot};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// What a scripted player does with an open round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Answer(String),
    UsePowerup(PowerupKind),
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(id) => write!(f, "answer {id}"),
            Self::UsePowerup(kind) => write!(f, "powerup {kind}"),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Act on a round that is waiting for input.
    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction;
}

/// Built-in player strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Always picks the right flag.
    Perfect,
    /// Picks uniformly among the selectable options.
    Guesser,
    /// Always picks a wrong option.
    Reckless,
    /// Right 70% of the time.
    Scholar,
    /// Burns every powerup before answering correctly.
    PowerUser,
}

impl GameplayStrategy {
    pub const ALL: [Self; 5] = [
        Self::Perfect,
        Self::Guesser,
        Self::Reckless,
        Self::Scholar,
        Self::PowerUser,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Guesser => "guesser",
            Self::Reckless => "reckless",
            Self::Scholar => "scholar",
            Self::PowerUser => "power-user",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Perfect => Box::new(PerfectPolicy),
            Self::Guesser => Box::new(GuesserPolicy::new(seed)),
            Self::Reckless => Box::new(RecklessPolicy),
            Self::Scholar => Box::new(ScholarPolicy::new(seed, 0.7)),
            Self::PowerUser => Box::new(PowerUserPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

fn correct_id(view: &SessionSnapshot) -> String {
    view.flag_id.clone().unwrap_or_default()
}

fn selectable(view: &SessionSnapshot) -> Vec<&str> {
    view.options
        .iter()
        .filter(|option| !option.disabled)
        .map(|option| option.id.as_str())
        .collect()
}

fn wrong_id(view: &SessionSnapshot) -> Option<String> {
    let correct = view.flag_id.as_deref()?;
    selectable(view)
        .into_iter()
        .find(|id| *id != correct)
        .map(str::to_string)
}

struct PerfectPolicy;
struct RecklessPolicy;
struct PowerUserPolicy;

struct GuesserPolicy {
    rng: ChaCha20Rng,
}

impl GuesserPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct ScholarPolicy {
    rng: ChaCha20Rng,
    accuracy: f64,
}

impl ScholarPolicy {
    fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            accuracy,
        }
    }
}

impl PlayerPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction {
        PlayerAction::Answer(correct_id(view))
    }
}

impl PlayerPolicy for RecklessPolicy {
    fn name(&self) -> &'static str {
        "Reckless"
    }

    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction {
        PlayerAction::Answer(wrong_id(view).unwrap_or_else(|| correct_id(view)))
    }
}

impl PlayerPolicy for GuesserPolicy {
    fn name(&self) -> &'static str {
        "Guesser"
    }

    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction {
        let options = selectable(view);
        let pick = options
            .choose(&mut self.rng)
            .map_or_else(|| correct_id(view), |id| (*id).to_string());
        PlayerAction::Answer(pick)
    }
}

impl PlayerPolicy for ScholarPolicy {
    fn name(&self) -> &'static str {
        "Scholar"
    }

    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction {
        if self.rng.gen_bool(self.accuracy) {
            return PlayerAction::Answer(correct_id(view));
        }
        PlayerAction::Answer(wrong_id(view).unwrap_or_else(|| correct_id(view)))
    }
}

impl PlayerPolicy for PowerUserPolicy {
    fn name(&self) -> &'static str {
        "PowerUser"
    }

    fn act(&mut self, view: &SessionSnapshot) -> PlayerAction {
        let stock = view.powerups;
        let fully_open = view.options.iter().all(|option| !option.disabled);
        if stock.fifty_fifty > 0 && fully_open {
            return PlayerAction::UsePowerup(PowerupKind::FiftyFifty);
        }
        if stock.hint > 0 {
            return PlayerAction::UsePowerup(PowerupKind::Hint);
        }
        if stock.skip > 0 {
            return PlayerAction::UsePowerup(PowerupKind::Skip);
        }
        PlayerAction::Answer(correct_id(view))
    }
}
