//! Per-match mutable state.
//!
//! One [`MatchState`] exists per match, owned by the controller and dropped
//! with it. Nothing here talks to the host except the roster scan behind
//! [`compute_active_teams`]; transitions with side effects live in the VIP
//! manager and controller layers.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::ModeConfig;
use crate::host::Host;
use crate::types::{PlayerId, TeamId};

/// Lifecycle of one match.
///
/// Transitions are monotonic: `Pending → Running → Ended`. `Ended` implies
/// the match has started, so the two booleans of old become one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Pending,
    Running,
    Ended,
}

/// Per-team VIP slot.
///
/// The enum is the slot state machine itself: a team can never be both in
/// cooldown and hold an assigned VIP, because there is no such variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VipSlot {
    /// No VIP and no pending delay; any selection trigger may fill the slot.
    Unassigned,
    /// This player is the team's VIP.
    Assigned(PlayerId),
    /// The VIP died recently; the slot is locked until the delay elapses.
    Cooldown,
}

impl VipSlot {
    /// The assigned VIP, if the slot holds one.
    pub fn assigned(&self) -> Option<PlayerId> {
        match self {
            VipSlot::Assigned(player) => Some(*player),
            _ => None,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, VipSlot::Unassigned)
    }

    pub fn is_cooldown(&self) -> bool {
        matches!(self, VipSlot::Cooldown)
    }
}

/// Per-player counters backing the built-in scoreboard.
///
/// Created lazily on first increment; every counter is non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub vip_kills: u32,
    pub kills: u32,
    pub deaths: u32,
}

/// All mutable state for one match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchState {
    /// Score per team; every configured team is present from creation and
    /// scores only ever go up until the match ends.
    pub team_scores: BTreeMap<TeamId, u32>,
    /// VIP slot per team; every configured team is present from creation.
    pub vip_slots: BTreeMap<TeamId, VipSlot>,
    /// Teams with at least one connected player, ascending. Recomputed from
    /// the roster on change events, never patched incrementally.
    pub active_teams: Vec<TeamId>,
    pub phase: MatchPhase,
    pub stats: BTreeMap<PlayerId, PlayerStats>,
    /// Players whose one-time intro panel has already been scheduled.
    pub intro_shown: BTreeSet<PlayerId>,
}

impl MatchState {
    /// Fresh state sized for the configured team count.
    pub fn new(cfg: &ModeConfig) -> Self {
        let mut team_scores = BTreeMap::new();
        let mut vip_slots = BTreeMap::new();
        for id in 1..=cfg.team_count {
            team_scores.insert(TeamId(id), 0);
            vip_slots.insert(TeamId(id), VipSlot::Unassigned);
        }
        Self {
            team_scores,
            vip_slots,
            active_teams: Vec::new(),
            phase: MatchPhase::Pending,
            stats: BTreeMap::new(),
            intro_shown: BTreeSet::new(),
        }
    }

    pub fn score(&self, team: TeamId) -> u32 {
        self.team_scores.get(&team).copied().unwrap_or(0)
    }

    /// The slot for a team; out-of-range teams read as `Unassigned`.
    pub fn slot(&self, team: TeamId) -> VipSlot {
        self.vip_slots.get(&team).copied().unwrap_or(VipSlot::Unassigned)
    }

    pub fn set_slot(&mut self, team: TeamId, slot: VipSlot) {
        if let Some(entry) = self.vip_slots.get_mut(&team) {
            *entry = slot;
        }
    }

    pub fn vip_of(&self, team: TeamId) -> Option<PlayerId> {
        self.slot(team).assigned()
    }

    pub fn is_vip(&self, player: PlayerId, team: TeamId) -> bool {
        self.vip_of(team) == Some(player)
    }

    /// Teams whose slot currently holds `player`.
    ///
    /// At most one team can hold a given player, but the scan mirrors how
    /// leave events arrive: as a bare id with no team attached.
    pub fn teams_with_vip(&self, player: PlayerId) -> Vec<TeamId> {
        self.vip_slots
            .iter()
            .filter(|(_, slot)| slot.assigned() == Some(player))
            .map(|(team, _)| *team)
            .collect()
    }

    pub fn is_active(&self, team: TeamId) -> bool {
        self.active_teams.contains(&team)
    }

    /// Replace the active-team set; returns whether it changed.
    pub fn replace_active_teams(&mut self, new_teams: Vec<TeamId>) -> bool {
        if self.active_teams == new_teams {
            return false;
        }
        self.active_teams = new_teams;
        true
    }

    /// Bump a team's score by one and return the new value.
    ///
    /// Eligibility (cross-team, id range, activity, match still running) is
    /// the caller's job; this only keeps the counter monotonic.
    pub fn award_point(&mut self, team: TeamId) -> u32 {
        let entry = self.team_scores.entry(team).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Winner at time-limit expiry: highest score among active teams, ties
    /// going to the lowest team id. An empty active set falls back to team 1.
    pub fn timeout_winner(&self) -> TeamId {
        let mut winner = self.active_teams.first().copied().unwrap_or(TeamId(1));
        let mut best = -1i64;
        for &team in &self.active_teams {
            let score = self.score(team) as i64;
            if score > best {
                best = score;
                winner = team;
            }
        }
        winner
    }

    pub fn stats_of(&self, player: PlayerId) -> PlayerStats {
        self.stats.get(&player).copied().unwrap_or_default()
    }

    pub fn record_death(&mut self, player: PlayerId) {
        self.stats.entry(player).or_default().deaths += 1;
    }

    pub fn record_kill(&mut self, player: PlayerId) {
        self.stats.entry(player).or_default().kills += 1;
    }

    pub fn record_vip_kill(&mut self, player: PlayerId) {
        self.stats.entry(player).or_default().vip_kills += 1;
    }

    /// Mark the intro as scheduled for a player; returns `true` the first
    /// time only.
    pub fn mark_intro_shown(&mut self, player: PlayerId) -> bool {
        self.intro_shown.insert(player)
    }
}

/// Scan the roster and return the ids of teams that currently have at least
/// one connected player, ascending.
///
/// Ids outside `1..=team_count` (spectators, unassigned slots) are ignored,
/// and so is any player the host cannot report a team for.
pub fn compute_active_teams<H: Host>(host: &H, cfg: &ModeConfig) -> Vec<TeamId> {
    let mut active = BTreeSet::new();
    for player in host.all_players() {
        if let Ok(team) = host.player_team(player) {
            if team.in_range(cfg.team_count) {
                active.insert(team);
            }
        }
    }
    active.into_iter().collect()
}

// ========== Tests ==========
