//! Deferred actions.
//!
//! The host's fire-and-forget "wait N seconds, then run" continuations become
//! typed entries in a queue the controller owns. An action fires on the first
//! inbound callback at or after its due time, which satisfies the same
//! "at or after the requested delay" contract the host gives its own timers.
//! Nothing is ever cancelled: a fired action re-validates match state instead.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::types::{PlayerId, Seconds, TeamId};

/// Grace delay between `initialize` and the first roster scan + VIP picks,
/// giving the host time to assign everyone to teams.
pub const STARTUP_GRACE_SECS: Seconds = 5.0;
/// Roster settle delay after a join before recomputing active teams.
pub const JOIN_SETTLE_SECS: Seconds = 1.0;
/// Roster settle delay after a leave before recomputing active teams.
pub const LEAVE_SETTLE_SECS: Seconds = 0.5;
/// How long the one-time intro panel stays on screen.
pub const INTRO_SECS: Seconds = 3.0;

/// Work the controller postponed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeferredAction {
    /// Roster scan plus board refresh, delayed so the host can finish moving
    /// players between teams first.
    RecomputeActiveTeams,
    /// First VIP pick for every active team, once after the startup grace.
    FirstVipSelection,
    /// A team's post-VIP-death delay elapsed; a replacement may be selected.
    EndVipCooldown { team: TeamId },
    /// Take the intro panel off a player's screen.
    HideIntro { player: PlayerId },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Seconds,
    /// Insertion counter; keeps same-due actions FIFO.
    seq: u64,
    action: DeferredAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.total_cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// Min-queue of deferred actions ordered by due time, FIFO within a tie.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Seconds, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { due, seq, action }));
        log::debug!("scheduled {:?} for t={:.2}", action, due);
    }

    /// Pop the earliest action whose due time has arrived.
    ///
    /// Callers drain in a loop so that an action which schedules further
    /// work (with `due <= now`) sees that work fire in the same drain.
    pub fn pop_due(&mut self, now: Seconds) -> Option<DeferredAction> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due <= now => {
                self.queue.pop().map(|Reverse(entry)| entry.action)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_respects_due_time() {
        let mut sched = Scheduler::new();
        sched.schedule(5.0, DeferredAction::FirstVipSelection);
        sched.schedule(2.0, DeferredAction::RecomputeActiveTeams);

        assert_eq!(sched.pop_due(1.0), None);
        assert_eq!(sched.pop_due(2.0), Some(DeferredAction::RecomputeActiveTeams));
        assert_eq!(sched.pop_due(2.0), None);
        assert_eq!(sched.pop_due(10.0), Some(DeferredAction::FirstVipSelection));
        assert!(sched.is_empty());
    }

    #[test]
    fn test_same_due_is_fifo() {
        let mut sched = Scheduler::new();
        sched.schedule(5.0, DeferredAction::RecomputeActiveTeams);
        sched.schedule(5.0, DeferredAction::FirstVipSelection);
        sched.schedule(5.0, DeferredAction::EndVipCooldown { team: TeamId(1) });

        assert_eq!(sched.pop_due(5.0), Some(DeferredAction::RecomputeActiveTeams));
        assert_eq!(sched.pop_due(5.0), Some(DeferredAction::FirstVipSelection));
        assert_eq!(sched.pop_due(5.0), Some(DeferredAction::EndVipCooldown { team: TeamId(1) }));
    }

    #[test]
    fn test_earlier_due_jumps_queue() {
        let mut sched = Scheduler::new();
        sched.schedule(8.0, DeferredAction::HideIntro { player: PlayerId(1) });
        sched.schedule(3.0, DeferredAction::EndVipCooldown { team: TeamId(2) });

        assert_eq!(sched.pop_due(9.0), Some(DeferredAction::EndVipCooldown { team: TeamId(2) }));
        assert_eq!(sched.pop_due(9.0), Some(DeferredAction::HideIntro { player: PlayerId(1) }));
    }

    #[test]
    fn test_drain_sees_actions_scheduled_mid_drain() {
        let mut sched = Scheduler::new();
        sched.schedule(1.0, DeferredAction::RecomputeActiveTeams);

        let mut fired = Vec::new();
        while let Some(action) = sched.pop_due(4.0) {
            if action == DeferredAction::RecomputeActiveTeams {
                // An action may queue follow-up work that is already due.
                sched.schedule(2.0, DeferredAction::FirstVipSelection);
            }
            fired.push(action);
        }
        assert_eq!(
            fired,
            vec![DeferredAction::RecomputeActiveTeams, DeferredAction::FirstVipSelection]
        );
    }
}
