use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::Country;
use crate::sampler::OptionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    #[default]
    None,
    Correct,
    Wrong,
}

impl Feedback {
    #[must_use]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Where the current round sits in the answer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    #[default]
    AwaitingAnswer,
    /// Feedback is on screen; a deferred transition decides what comes next.
    Answered,
    /// The trivia fact is blocking until the player acknowledges it.
    ShowingFact,
}

/// One question: the country being asked, its options and transient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRound {
    pub country: Country,
    pub options: OptionSet,
    pub disabled: SmallVec<[String; 2]>,
    pub feedback: Feedback,
    pub phase: RoundPhase,
}

impl QuestionRound {
    #[must_use]
    pub fn new(country: Country, options: OptionSet) -> Self {
        Self {
            country,
            options,
            disabled: SmallVec::new(),
            feedback: Feedback::None,
            phase: RoundPhase::AwaitingAnswer,
        }
    }

    #[must_use]
    pub fn correct_id(&self) -> &str {
        &self.country.id
    }

    #[must_use]
    pub fn is_disabled(&self, option_id: &str) -> bool {
        self.disabled.iter().any(|id| id == option_id)
    }

    /// An option the player may still pick.
    #[must_use]
    pub fn is_selectable(&self, option_id: &str) -> bool {
        self.options.iter().any(|c| c.id == option_id) && !self.is_disabled(option_id)
    }

    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        matches!(self.phase, RoundPhase::AwaitingAnswer) && !self.feedback.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CountryCatalog;

    #[test]
    fn disabled_options_are_not_selectable() {
        let catalog = CountryCatalog::builtin();
        let options: OptionSet = ["es", "fr", "it", "pt"]
            .iter()
            .filter_map(|id| catalog.find(id).cloned())
            .collect();
        let mut round = QuestionRound::new(catalog.find("fr").unwrap().clone(), options);
        assert!(round.accepts_input());
        assert!(round.is_selectable("es"));
        assert!(!round.is_selectable("jp"));

        round.disabled.push("es".to_string());
        assert!(!round.is_selectable("es"));
        assert_eq!(round.correct_id(), "fr");

        round.feedback = Feedback::Wrong;
        assert!(!round.accepts_input());
    }
}
