use serde::Serialize;

use super::{
    DuelScore, EndReason, Feedback, GameMode, GameSession, Player, PowerupInventory, RoundPhase,
};
use crate::catalog::Continent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: String,
    pub name: String,
    pub disabled: bool,
}

/// Read-only view of a session for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session: u64,
    pub mode: GameMode,
    pub continent: Option<Continent>,
    pub question_index: usize,
    pub question_count: usize,
    pub flag_id: Option<String>,
    pub options: Vec<OptionView>,
    pub feedback: Feedback,
    pub phase: RoundPhase,
    /// Trivia text, present only while the fact is on screen.
    pub fact: Option<String>,
    pub score: u32,
    /// `None` in modes that do not track lives.
    pub lives: Option<u8>,
    /// `None` outside timed mode.
    pub time_remaining: Option<u32>,
    pub powerups: PowerupInventory,
    pub turn: Option<Player>,
    pub duel: Option<DuelScore>,
    pub ended: Option<EndReason>,
}

impl GameSession {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let round = self.round();
        let options = round
            .map(|round| {
                round
                    .options
                    .iter()
                    .map(|c| OptionView {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        disabled: round.is_disabled(&c.id),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let multiplayer = self.mode() == GameMode::Multiplayer;

        SessionSnapshot {
            session: self.id().0,
            mode: self.mode(),
            continent: self.continent(),
            question_index: self.current_index(),
            question_count: self.questions().len(),
            flag_id: round.map(|round| round.country.id.clone()),
            options,
            feedback: round.map_or(Feedback::None, |round| round.feedback),
            phase: round.map_or(RoundPhase::AwaitingAnswer, |round| round.phase),
            fact: round
                .filter(|round| round.phase == RoundPhase::ShowingFact)
                .map(|round| round.country.fact.clone()),
            score: self.score(),
            lives: self.mode().uses_lives().then_some(self.lives()),
            time_remaining: (self.mode() == GameMode::Timed).then_some(self.time_remaining()),
            powerups: self.powerups(),
            turn: multiplayer.then_some(self.turn()),
            duel: multiplayer.then_some(self.duel()),
            ended: self.end_reason(),
        }
    }
}
