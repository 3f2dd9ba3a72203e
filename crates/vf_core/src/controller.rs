//! Match controller.
//!
//! [`VipFiesta`] is the single entry point the host calls into: one method
//! per engine event, all running synchronously on the host's dispatch
//! thread. Every handler first drains due deferred actions, so internal
//! timers fire on the next callback at or after their delay, then applies
//! its own transition. After [`MatchPhase::Ended`] the handlers keep
//! draining but drop everything, which is how stale timers die.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::ModeConfig;
use crate::error::HostError;
use crate::host::{
    Audience, Host, Notice, ScoreboardKind, ScoreboardRow, ScoreboardSpec,
};
use crate::schedule::{
    DeferredAction, Scheduler, JOIN_SETTLE_SECS, LEAVE_SETTLE_SECS, STARTUP_GRACE_SECS,
};
use crate::state::{compute_active_teams, MatchPhase, MatchState, VipSlot};
use crate::types::{PlayerId, TeamId};
use crate::ui::ScoreUi;
use crate::vip::VipManager;

/// One VIP Fiesta match bound to a host.
///
/// Owns all per-match state; drop it when the round is over and build a new
/// one for the next round.
pub struct VipFiesta<H: Host> {
    host: H,
    cfg: ModeConfig,
    state: MatchState,
    vip: VipManager,
    ui: ScoreUi,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
}

impl<H: Host> VipFiesta<H> {
    /// Build a controller for one match. The seed fixes every VIP pick, so
    /// a replayed event script reproduces the match exactly.
    pub fn new(host: H, cfg: ModeConfig, seed: u64) -> Self {
        Self {
            host,
            state: MatchState::new(&cfg),
            cfg,
            vip: VipManager::new(),
            ui: ScoreUi::new(),
            scheduler: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ModeConfig {
        &self.cfg
    }

    /// Deferred actions not yet fired.
    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    // ========== Inbound handlers ==========

    /// Match start. Arms the host round timer, publishes the scoreboard
    /// schema and queues the first roster scan + VIP picks for after the
    /// startup grace, so the host can finish assigning teams first.
    pub fn initialize(&mut self) {
        self.host.set_time_limit(self.cfg.time_limit_secs);
        self.host.set_scoreboard(&ScoreboardSpec {
            kind: ScoreboardKind::CustomFfa,
            header: Notice::ScoreboardTitle,
            columns: [
                Notice::ColumnTeam,
                Notice::ColumnVipKills,
                Notice::ColumnKills,
                Notice::ColumnDeaths,
            ],
            column_widths: [1.0, 1.0, 1.0, 1.0],
            // Sort by VIP kills, best first.
            sort_column: 2,
            sort_descending: true,
        });
        self.ui.rebuild_all(&self.host, &self.state, &self.cfg);

        self.state.phase = MatchPhase::Running;
        self.host.display_notification(Notice::GameStarting, Audience::All);

        let due = self.host.match_seconds() + STARTUP_GRACE_SECS;
        self.scheduler.schedule(due, DeferredAction::RecomputeActiveTeams);
        self.scheduler.schedule(due, DeferredAction::FirstVipSelection);
        log::info!(
            "vip fiesta started: first to {} vip kills, {} s limit",
            self.cfg.target_vip_kills,
            self.cfg.time_limit_secs
        );
    }

    /// Death event. Keeps the generic counters for every death; a death of
    /// a sitting VIP additionally locks the slot into cooldown, notifies the
    /// team and runs the scoring rule.
    pub fn on_player_died(&mut self, victim: PlayerId, killer: PlayerId) -> Result<(), HostError> {
        self.pump();
        if self.state.phase != MatchPhase::Running {
            return Ok(());
        }
        let victim_team = self.host.player_team(victim)?;

        self.state.record_death(victim);
        if killer != victim {
            self.state.record_kill(killer);
        }

        if self.state.is_vip(victim, victim_team) {
            self.vip.begin_cooldown(
                &self.host,
                &mut self.state,
                &mut self.scheduler,
                &self.cfg,
                victim_team,
                victim,
            );
            self.host.display_world_log(Notice::VipDied, Audience::Team(victim_team));
            self.host.display_world_log(Notice::SelectingNewVip, Audience::Team(victim_team));

            match self.host.player_team(killer) {
                Ok(killer_team) => {
                    let qualifies = killer_team != victim_team
                        && killer_team.in_range(self.cfg.team_count)
                        && self.state.is_active(killer_team)
                        && self.state.is_active(victim_team);
                    if qualifies {
                        self.state.record_vip_kill(killer);
                        self.award_point(killer_team);
                    }
                }
                Err(err) => {
                    log::warn!("no team for killer {} of VIP {}: {}", killer, victim, err);
                }
            }
        }

        self.push_scoreboard_row(victim);
        if killer != victim {
            self.push_scoreboard_row(killer);
        }
        Ok(())
    }

    /// Deploy event. Lazily fills an open VIP slot on the deployer's team,
    /// re-arms spotting for a deploying VIP and brings this one player's
    /// board, HUD line, scoreboard row and one-time intro up to date.
    pub fn on_player_deployed(&mut self, player: PlayerId) -> Result<(), HostError> {
        self.pump();
        if self.state.phase != MatchPhase::Running {
            return Ok(());
        }
        let team = self.host.player_team(player)?;

        if team.in_range(self.cfg.team_count) && self.state.slot(team).is_unassigned() {
            self.select_and_install(team);
        }
        if self.state.is_vip(player, team) {
            self.vip.apply_spotting(&self.host, player);
        }

        self.ui.rebuild_for(&self.host, &self.state, &self.cfg, player);
        self.ui.refresh_hud(&self.host, &self.state, player, team);
        self.push_scoreboard_row(player);
        self.ui.show_intro_once(&self.host, &mut self.state, &mut self.scheduler, player);
        Ok(())
    }

    /// Join event. The host assigns the newcomer a team moments later, so
    /// the roster scan waits out a settle delay.
    pub fn on_player_join_game(&mut self, player: PlayerId) {
        self.pump();
        if self.state.phase != MatchPhase::Running {
            return;
        }
        log::debug!("{} joined, roster scan queued", player);
        self.scheduler.schedule(
            self.host.match_seconds() + JOIN_SETTLE_SECS,
            DeferredAction::RecomputeActiveTeams,
        );
    }

    /// Leave event, carrying only the leaver's id. A leaving VIP is replaced
    /// immediately, without the death cooldown.
    pub fn on_player_leave_game(&mut self, player: PlayerId) {
        self.pump();
        if self.state.phase == MatchPhase::Ended {
            return;
        }
        for team in self.state.teams_with_vip(player) {
            log::info!("VIP {} left, reselecting for {}", player, team);
            self.state.set_slot(team, VipSlot::Unassigned);
            self.reselect_excluding(team, player);
        }
        self.scheduler.schedule(
            self.host.match_seconds() + LEAVE_SETTLE_SECS,
            DeferredAction::RecomputeActiveTeams,
        );
    }

    /// Team-switch event. A VIP switching away vacates the old team's slot
    /// and is replaced immediately; the active-team set is rescanned at
    /// once since the host has already moved the player.
    pub fn on_player_switch_team(&mut self, player: PlayerId, new_team: TeamId) {
        self.pump();
        if self.state.phase == MatchPhase::Ended {
            return;
        }
        for team in self.state.teams_with_vip(player) {
            if team == new_team {
                continue;
            }
            log::info!("VIP {} switched {} -> {}", player, team, new_team);
            self.vip.clear_presentation(&self.host, player);
            self.state.set_slot(team, VipSlot::Unassigned);
            self.reselect_excluding(team, player);
        }
        self.recompute_active_teams();
    }

    /// Host round timer expired: highest-scoring active team wins, ties to
    /// the lower id.
    pub fn on_time_limit_reached(&mut self) {
        self.pump();
        if self.state.phase != MatchPhase::Running {
            return;
        }
        let winner = self.state.timeout_winner();
        log::info!("time limit reached, {} leads with {}", winner, self.state.score(winner));
        self.end_match(winner);
    }

    /// Per-tick per-player hook, ~30 Hz each. Everything here must stay
    /// cheap; the only real work is the throttled VIP spot refresh.
    pub fn ongoing_player(&mut self, player: PlayerId) {
        self.pump();
        if self.state.phase != MatchPhase::Running {
            return;
        }
        self.vip.maintain_spotting(&self.host, &self.state, &self.cfg, player);
    }

    // ========== Deferred actions ==========

    fn pump(&mut self) {
        let now = self.host.match_seconds();
        while let Some(action) = self.scheduler.pop_due(now) {
            self.run_action(action);
        }
    }

    /// Run one deferred action, re-validating first: the world has moved on
    /// since it was scheduled.
    fn run_action(&mut self, action: DeferredAction) {
        if self.state.phase == MatchPhase::Ended {
            log::debug!("dropping {:?}: match already over", action);
            return;
        }
        match action {
            DeferredAction::RecomputeActiveTeams => self.recompute_active_teams(),
            DeferredAction::FirstVipSelection => {
                for team in self.state.active_teams.clone() {
                    if self.state.slot(team).is_unassigned() {
                        self.select_and_install(team);
                    }
                }
            }
            DeferredAction::EndVipCooldown { team } => {
                // The slot may have been vacated and refilled since.
                if !self.state.slot(team).is_cooldown() {
                    log::debug!("{} cooldown already resolved, ignoring timer", team);
                    return;
                }
                self.state.set_slot(team, VipSlot::Unassigned);
                self.select_and_install(team);
            }
            DeferredAction::HideIntro { player } => self.ui.hide_intro(&self.host, player),
        }
    }

    /// Rescan the roster; on a change, rebuild every board and give each
    /// newly active team with an open slot a VIP.
    fn recompute_active_teams(&mut self) {
        let previous = self.state.active_teams.clone();
        let current = compute_active_teams(&self.host, &self.cfg);
        if !self.state.replace_active_teams(current) {
            return;
        }
        log::debug!("active teams now {:?}", self.state.active_teams);
        self.ui.rebuild_all(&self.host, &self.state, &self.cfg);

        for team in self.state.active_teams.clone() {
            if !previous.contains(&team) && self.state.slot(team).is_unassigned() {
                self.select_and_install(team);
            }
        }
    }

    // ========== VIP selection ==========

    fn select_and_install(&mut self, team: TeamId) {
        match self.vip.pick_candidate(&self.host, team, None, &mut self.rng) {
            Some(pick) => self.install_and_announce(team, pick),
            None => log::debug!("{} has nobody deployed, slot stays open", team),
        }
    }

    fn reselect_excluding(&mut self, team: TeamId, outgoing: PlayerId) {
        match self.vip.pick_candidate(&self.host, team, Some(outgoing), &mut self.rng) {
            Some(pick) => self.install_and_announce(team, pick),
            None => log::debug!("{} has no replacement candidate, slot stays open", team),
        }
    }

    fn install_and_announce(&mut self, team: TeamId, player: PlayerId) {
        self.vip.install(&self.host, &mut self.state, team, player);
        // The VIP gets a notification; everyone else a log line.
        self.host.display_notification(Notice::YouAreVip, Audience::Player(player));
        self.host.display_world_log(Notice::NewVip { player }, Audience::All);
        self.vip.add_friendly_icon(&self.host, player, team);
    }

    // ========== Scoring ==========

    fn award_point(&mut self, team: TeamId) {
        let score = self.state.award_point(team);
        self.ui.rebuild_all(&self.host, &self.state, &self.cfg);
        self.ui.announce_score(&self.host, &self.cfg, team, score);
        log::info!("{} scores: {}/{}", team, score, self.cfg.target_vip_kills);

        if score >= self.cfg.target_vip_kills {
            self.end_match(team);
        }
    }

    fn end_match(&mut self, winner: TeamId) {
        if self.state.phase == MatchPhase::Ended {
            return;
        }
        self.state.phase = MatchPhase::Ended;
        self.ui.highlight_team(&self.host, &self.state, &self.cfg, winner);
        self.host.display_notification(Notice::TeamWins { team: winner }, Audience::All);
        self.host.end_round(winner);
        log::info!("match over: {} wins with {} vip kills", winner, self.state.score(winner));
    }

    fn push_scoreboard_row(&self, player: PlayerId) {
        let Ok(team) = self.host.player_team(player) else {
            return;
        };
        let stats = self.state.stats_of(player);
        self.host.set_scoreboard_row(
            player,
            ScoreboardRow {
                team,
                vip_kills: stats.vip_kills,
                kills: stats.kills,
                deaths: stats.deaths,
            },
        );
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimHost;

    /// Two teams of two, everyone deployed, controller past the startup
    /// grace so both teams hold a VIP.
    fn running_match(seed: u64) -> VipFiesta<SimHost> {
        let host = SimHost::new();
        host.add_player(PlayerId(1), "ada", TeamId(1));
        host.add_player(PlayerId(2), "bob", TeamId(1));
        host.add_player(PlayerId(3), "cyd", TeamId(2));
        host.add_player(PlayerId(4), "dee", TeamId(2));
        for id in 1..=4 {
            host.deploy(PlayerId(id));
        }

        let mut game = VipFiesta::new(host.clone(), ModeConfig::default(), seed);
        game.initialize();
        host.advance(STARTUP_GRACE_SECS);
        game.ongoing_player(PlayerId(1));
        game
    }

    #[test]
    fn test_initialize_configures_host() {
        let host = SimHost::new();
        host.add_player(PlayerId(1), "ada", TeamId(1));
        let mut game = VipFiesta::new(host.clone(), ModeConfig::default(), 1);
        game.initialize();

        assert_eq!(host.time_limit(), Some(1200));
        let board = host.scoreboard().unwrap();
        assert_eq!(board.kind, ScoreboardKind::CustomFfa);
        assert_eq!(board.sort_column, 2);
        assert!(host.notifications().contains(&(Notice::GameStarting, Audience::All)));
        assert_eq!(game.state().phase, MatchPhase::Running);
    }

    #[test]
    fn test_selection_waits_for_startup_grace() {
        let host = SimHost::new();
        host.add_player(PlayerId(1), "ada", TeamId(1));
        host.deploy(PlayerId(1));

        let mut game = VipFiesta::new(host.clone(), ModeConfig::default(), 1);
        game.initialize();

        host.advance(STARTUP_GRACE_SECS - 1.0);
        game.ongoing_player(PlayerId(1));
        assert_eq!(game.state().vip_of(TeamId(1)), None);

        host.advance(1.0);
        game.ongoing_player(PlayerId(1));
        assert_eq!(game.state().vip_of(TeamId(1)), Some(PlayerId(1)));
        assert!(host.is_spotted(PlayerId(1)));
    }

    #[test]
    fn test_both_teams_get_a_vip() {
        let game = running_match(7);
        assert!(game.state().vip_of(TeamId(1)).is_some());
        assert!(game.state().vip_of(TeamId(2)).is_some());
        assert_eq!(game.state().active_teams, vec![TeamId(1), TeamId(2)]);
    }

    #[test]
    fn test_vip_death_locks_slot_until_delay() {
        let mut game = running_match(7);
        let host = game.host().clone();
        let vip = game.state().vip_of(TeamId(1)).unwrap();
        let killer = game.state().vip_of(TeamId(2)).unwrap();

        game.on_player_died(vip, killer).unwrap();
        assert!(game.state().slot(TeamId(1)).is_cooldown());
        assert!(!host.is_spotted(vip));

        // Before the delay, nothing happens; after it, a new VIP appears.
        host.advance(4.9);
        game.ongoing_player(PlayerId(1));
        assert!(game.state().slot(TeamId(1)).is_cooldown());

        host.advance(0.1);
        game.ongoing_player(PlayerId(1));
        assert!(game.state().vip_of(TeamId(1)).is_some());
    }

    #[test]
    fn test_deploy_into_open_slot_assigns_lazily() {
        let host = SimHost::new();
        host.add_player(PlayerId(1), "ada", TeamId(1));
        let mut game = VipFiesta::new(host.clone(), ModeConfig::default(), 3);
        game.initialize();
        host.advance(STARTUP_GRACE_SECS);
        game.ongoing_player(PlayerId(1));
        // Nobody was deployed at selection time.
        assert_eq!(game.state().vip_of(TeamId(1)), None);

        host.deploy(PlayerId(1));
        game.on_player_deployed(PlayerId(1)).unwrap();
        assert_eq!(game.state().vip_of(TeamId(1)), Some(PlayerId(1)));
    }

    #[test]
    fn test_handlers_ignore_events_after_end() {
        let mut game = running_match(7);
        let host = game.host().clone();
        game.on_time_limit_reached();
        assert_eq!(game.state().phase, MatchPhase::Ended);
        let winner = host.round_winner().unwrap();

        // A VIP kill after the whistle changes nothing.
        let vip = game.state().vip_of(TeamId(2)).unwrap();
        game.on_player_died(vip, PlayerId(1)).unwrap();
        assert_eq!(game.state().score(TeamId(1)), 0);
        assert_eq!(host.round_winner(), Some(winner));
    }
}
