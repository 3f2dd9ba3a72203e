//! VIP slot transitions and spotting upkeep.
//!
//! The slot state itself lives in [`MatchState`]; this manager implements the
//! transitions that need host queries or randomness, and owns the per-player
//! spot-refresh throttle so it ends with the match instead of leaking across
//! rounds in a long-lived process.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::ModeConfig;
use crate::host::{Host, Notice, SpotMode, WorldIcon};
use crate::schedule::{DeferredAction, Scheduler};
use crate::state::{MatchState, VipSlot};
use crate::types::{Color, PlayerId, Seconds, TeamId};

/// How long a single spot marker lasts host-side before it fades.
pub const SPOT_DURATION_SECS: Seconds = 10.0;
/// Height of the friendly VIP icon above the player's head, meters.
const ICON_HEIGHT_M: f32 = 2.0;

/// Selection and spotting logic for the per-team VIP slots.
#[derive(Debug, Default)]
pub struct VipManager {
    /// Last spot-refresh time per player, for the maintenance throttle.
    last_spot_at: std::collections::BTreeMap<PlayerId, Seconds>,
}

impl VipManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a VIP candidate for a team: uniform among deployed members,
    /// preferring the pool without `exclude` but falling back to the full
    /// pool when excluding would leave nobody.
    ///
    /// Returns `None` when no member is deployed — a valid transient state,
    /// not an error. A member whose deployment the host cannot answer for is
    /// treated as not deployed and never enters the pool.
    pub fn pick_candidate<H: Host>(
        &self,
        host: &H,
        team: TeamId,
        exclude: Option<PlayerId>,
        rng: &mut ChaCha8Rng,
    ) -> Option<PlayerId> {
        let alive: Vec<PlayerId> = host
            .team_members(team)
            .into_iter()
            .filter(|&p| host.is_deployed(p).unwrap_or(false))
            .collect();

        let eligible: Vec<PlayerId> = match exclude {
            Some(out) => alive.iter().copied().filter(|&p| p != out).collect(),
            None => alive.clone(),
        };
        let pool = if eligible.is_empty() { &alive } else { &eligible };

        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    /// Install a player as a team's VIP: assign the slot and start spotting.
    ///
    /// Announcements and the friendly icon are the controller's business.
    pub fn install<H: Host>(
        &mut self,
        host: &H,
        state: &mut MatchState,
        team: TeamId,
        player: PlayerId,
    ) {
        state.set_slot(team, VipSlot::Assigned(player));
        self.apply_spotting(host, player);
        log::info!("{} is now the VIP of {}", player, team);
    }

    /// Death transition: lock the slot in cooldown, drop the dead VIP's
    /// markers and queue the eventual replacement pick.
    pub fn begin_cooldown<H: Host>(
        &mut self,
        host: &H,
        state: &mut MatchState,
        scheduler: &mut Scheduler,
        cfg: &ModeConfig,
        team: TeamId,
        dead_vip: PlayerId,
    ) {
        self.clear_presentation(host, dead_vip);
        state.set_slot(team, VipSlot::Cooldown);
        let due = host.match_seconds() + cfg.vip_respawn_delay_secs;
        scheduler.schedule(due, DeferredAction::EndVipCooldown { team });
        log::info!("{} VIP slot in cooldown until t={:.1}", team, due);
    }

    /// Refresh the VIP's everyone-visible marker, called from the per-tick
    /// hook. Throttled to one host call per [`ModeConfig::spotting_period`];
    /// anything sooner is a no-op.
    pub fn maintain_spotting<H: Host>(
        &mut self,
        host: &H,
        state: &MatchState,
        cfg: &ModeConfig,
        player: PlayerId,
    ) {
        if !host.is_deployed(player).unwrap_or(false) {
            return;
        }
        let Ok(team) = host.player_team(player) else {
            return;
        };
        if !state.is_vip(player, team) {
            return;
        }

        let now = host.match_seconds();
        let refresh_due = match self.last_spot_at.get(&player) {
            Some(&last) => now - last >= cfg.spotting_period(),
            None => true,
        };
        if refresh_due {
            host.spot_target(player, SPOT_DURATION_SECS, SpotMode::Both);
            self.last_spot_at.insert(player, now);
        }
    }

    /// Start (or restart) the everyone-visible marker for a player.
    pub fn apply_spotting<H: Host>(&mut self, host: &H, player: PlayerId) {
        host.spot_target(player, SPOT_DURATION_SECS, SpotMode::Both);
        self.last_spot_at.insert(player, host.match_seconds());
    }

    /// Attach the team-only icon floating above the VIP.
    pub fn add_friendly_icon<H: Host>(&self, host: &H, player: PlayerId, team: TeamId) {
        host.add_world_icon(
            player,
            WorldIcon::Skull,
            ICON_HEIGHT_M,
            Color::VIP_GREEN,
            Notice::VipMarker,
            team,
        );
    }

    /// Remove everything that marks a player as VIP on screen.
    pub fn clear_presentation<H: Host>(&self, host: &H, player: PlayerId) {
        host.unspot_target(player);
        host.remove_world_icon(player);
    }
}

// ========== Tests ==========
