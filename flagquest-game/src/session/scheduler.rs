//! Cancellable delayed transitions keyed to session identity.
//!
//! The scheduler owns a logical clock. Callers push transitions with a delay
//! and later pull whatever has come due; a transition whose ticket no longer
//! matches the live session is discarded by the session itself.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of one session; never reused within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Binds a deferred transition to the session and round that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub session: SessionId,
    /// Serial of the round at scheduling time.
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeferredKind {
    /// Surface the trivia fact after a correct answer.
    RevealFact,
    /// Clear a miss and move to the next question.
    AdvanceAfterMiss,
    /// End the session after the last life was lost.
    EndAfterMiss,
    /// One second of the timed-mode countdown.
    ClockTick,
}

impl DeferredKind {
    /// Whether the transition dies with the round that scheduled it.
    /// Clock ticks survive round changes and only die with the session.
    #[must_use]
    pub const fn is_round_bound(self) -> bool {
        !matches!(self, Self::ClockTick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeferredTransition {
    pub ticket: Ticket,
    pub kind: DeferredKind,
}

#[derive(Debug, Clone)]
struct Pending {
    due: Duration,
    seq: u64,
    transition: DeferredTransition,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionScheduler {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl TransitionScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, transition: DeferredTransition, delay: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: self.now + delay,
            seq,
            transition,
        });
    }

    /// Drop every transition scheduled by `session`.
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|pending| pending.transition.ticket.session != session);
        before - self.pending.len()
    }

    /// Pop the earliest transition due at or before `until`, moving the clock
    /// to its due time. Equal due times fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<DeferredTransition> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= until)
            .min_by_key(|(_, pending)| (pending.due, pending.seq))
            .map(|(idx, _)| idx)?;
        let pending = self.pending.swap_remove(idx);
        self.now = self.now.max(pending.due);
        Some(pending.transition)
    }

    /// Move the clock forward without firing anything.
    pub fn settle_at(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(session: u64, round: u32, kind: DeferredKind) -> DeferredTransition {
        DeferredTransition {
            ticket: Ticket {
                session: SessionId(session),
                round,
            },
            kind,
        }
    }

    #[test]
    fn pops_in_due_then_schedule_order() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(
            transition(1, 0, DeferredKind::ClockTick),
            Duration::from_secs(1),
        );
        scheduler.schedule(
            transition(1, 0, DeferredKind::RevealFact),
            Duration::from_millis(500),
        );
        scheduler.schedule(
            transition(1, 0, DeferredKind::AdvanceAfterMiss),
            Duration::from_secs(1),
        );

        let until = Duration::from_secs(2);
        let order: Vec<DeferredKind> = std::iter::from_fn(|| scheduler.pop_due(until))
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            order,
            [
                DeferredKind::RevealFact,
                DeferredKind::ClockTick,
                DeferredKind::AdvanceAfterMiss
            ]
        );
        assert_eq!(scheduler.now(), Duration::from_secs(1));
        scheduler.settle_at(until);
        assert_eq!(scheduler.now(), until);
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(
            transition(1, 0, DeferredKind::EndAfterMiss),
            Duration::from_secs(1),
        );
        assert!(scheduler.pop_due(Duration::from_millis(999)).is_none());
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn cancel_drops_only_that_session() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(transition(1, 0, DeferredKind::ClockTick), Duration::ZERO);
        scheduler.schedule(transition(2, 0, DeferredKind::ClockTick), Duration::ZERO);
        assert_eq!(scheduler.cancel_session(SessionId(1)), 1);
        let left = scheduler.pop_due(Duration::ZERO).unwrap();
        assert_eq!(left.ticket.session, SessionId(2));
        assert!(scheduler.is_empty());
    }
}
