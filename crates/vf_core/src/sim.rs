//! Simulated host backend.
//!
//! A deterministic, in-memory stand-in for the engine: a roster, a manually
//! advanced clock, widget and marker stores, and transcripts of everything
//! the mode asked the host to show. Unit tests, the scenario tests and the
//! scripted-match binary all drive the mode through this.
//!
//! Handles are cheap clones over shared interior state, so a test can keep
//! one handle for inspection while the controller owns another. Everything
//! iterates in `BTreeMap` order; two runs with the same seed and script
//! produce byte-identical transcripts.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::HostError;
use crate::host::{
    Audience, ContainerSpec, Host, ImageSpec, Notice, ScoreboardRow, ScoreboardSpec, SpotMode,
    TextSpec, WidgetHandle, WorldIcon,
};
use crate::ring::RingHost;
use crate::types::{Color, PlayerId, Seconds, TeamId, Vec3};

#[derive(Debug, Clone)]
struct SimPlayer {
    name: String,
    team: TeamId,
    deployed: bool,
}

/// What kind of widget a [`SimWidget`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimWidgetKind {
    Container,
    Text,
    Image,
}

/// Snapshot of one live widget, for assertions and reports.
#[derive(Debug, Clone)]
pub struct SimWidget {
    pub handle: WidgetHandle,
    pub name: String,
    pub kind: SimWidgetKind,
    pub owner: Option<PlayerId>,
    pub parent: Option<String>,
    pub visible: bool,
    pub label: Option<Notice>,
    pub bg_color: Color,
    pub bg_alpha: f32,
    pub position: Vec3,
    pub size: Vec3,
}

/// Floating icon attached to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct SimIcon {
    pub icon: WorldIcon,
    pub vertical_offset: f32,
    pub color: Color,
    pub label: Notice,
    pub visible_to: TeamId,
}

#[derive(Debug, Default)]
struct SimInner {
    clock: Seconds,
    players: BTreeMap<PlayerId, SimPlayer>,
    fail_deploy: BTreeSet<PlayerId>,

    widgets: BTreeMap<String, SimWidget>,
    handle_names: BTreeMap<WidgetHandle, String>,
    next_handle: u64,
    adds_by_name: BTreeMap<String, usize>,

    notifications: Vec<(Notice, Audience)>,
    world_log: Vec<(Notice, Audience)>,
    spot_log: Vec<(PlayerId, Seconds)>,
    spotted: BTreeSet<PlayerId>,
    icons: BTreeMap<PlayerId, SimIcon>,

    scoreboard: Option<ScoreboardSpec>,
    scoreboard_rows: BTreeMap<PlayerId, ScoreboardRow>,
    time_limit: Option<u32>,
    round_winner: Option<TeamId>,

    rings: BTreeMap<u32, Vec3>,
    failing_rings: BTreeSet<u32>,
}

/// Clonable handle to a simulated engine.
#[derive(Debug, Clone, Default)]
pub struct SimHost {
    inner: Rc<RefCell<SimInner>>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Roster control ==========

    pub fn add_player(&self, player: PlayerId, name: &str, team: TeamId) {
        self.inner.borrow_mut().players.insert(
            player,
            SimPlayer { name: name.to_string(), team, deployed: false },
        );
    }

    pub fn remove_player(&self, player: PlayerId) {
        let mut inner = self.inner.borrow_mut();
        inner.players.remove(&player);
        // The engine tears the soldier down with its markers.
        inner.spotted.remove(&player);
        inner.icons.remove(&player);
    }

    pub fn switch_team(&self, player: PlayerId, team: TeamId) {
        if let Some(p) = self.inner.borrow_mut().players.get_mut(&player) {
            p.team = team;
        }
    }

    pub fn deploy(&self, player: PlayerId) {
        if let Some(p) = self.inner.borrow_mut().players.get_mut(&player) {
            p.deployed = true;
        }
    }

    pub fn undeploy(&self, player: PlayerId) {
        if let Some(p) = self.inner.borrow_mut().players.get_mut(&player) {
            p.deployed = false;
        }
    }

    /// Make `is_deployed` fail for a player, exercising the fails-closed
    /// path in candidate selection.
    pub fn fail_deploy_query(&self, player: PlayerId, failing: bool) {
        let mut inner = self.inner.borrow_mut();
        if failing {
            inner.fail_deploy.insert(player);
        } else {
            inner.fail_deploy.remove(&player);
        }
    }

    // ========== Clock ==========

    pub fn advance(&self, secs: Seconds) {
        self.inner.borrow_mut().clock += secs;
    }

    // ========== Rings ==========

    pub fn add_ring(&self, ring: u32, position: Vec3) {
        self.inner.borrow_mut().rings.insert(ring, position);
    }

    pub fn fail_ring(&self, ring: u32, failing: bool) {
        let mut inner = self.inner.borrow_mut();
        if failing {
            inner.failing_rings.insert(ring);
        } else {
            inner.failing_rings.remove(&ring);
        }
    }

    pub fn ring_pos(&self, ring: u32) -> Option<Vec3> {
        self.inner.borrow().rings.get(&ring).copied()
    }

    // ========== Inspection ==========

    pub fn notifications(&self) -> Vec<(Notice, Audience)> {
        self.inner.borrow().notifications.clone()
    }

    pub fn world_log(&self) -> Vec<(Notice, Audience)> {
        self.inner.borrow().world_log.clone()
    }

    /// Spot-marker refreshes recorded for one player.
    pub fn spot_count(&self, player: PlayerId) -> usize {
        self.inner.borrow().spot_log.iter().filter(|(p, _)| *p == player).count()
    }

    pub fn spot_events(&self) -> usize {
        self.inner.borrow().spot_log.len()
    }

    pub fn is_spotted(&self, player: PlayerId) -> bool {
        self.inner.borrow().spotted.contains(&player)
    }

    pub fn world_icon(&self, player: PlayerId) -> Option<SimIcon> {
        self.inner.borrow().icons.get(&player).cloned()
    }

    pub fn widget_info(&self, name: &str) -> Option<SimWidget> {
        self.inner.borrow().widgets.get(name).cloned()
    }

    /// How many times a widget with this name has been created, ever.
    pub fn widget_count_named(&self, name: &str) -> usize {
        self.inner.borrow().adds_by_name.get(name).copied().unwrap_or(0)
    }

    pub fn live_widgets(&self) -> usize {
        self.inner.borrow().widgets.len()
    }

    pub fn round_winner(&self) -> Option<TeamId> {
        self.inner.borrow().round_winner
    }

    pub fn time_limit(&self) -> Option<u32> {
        self.inner.borrow().time_limit
    }

    pub fn scoreboard(&self) -> Option<ScoreboardSpec> {
        self.inner.borrow().scoreboard.clone()
    }

    pub fn scoreboard_row(&self, player: PlayerId) -> Option<ScoreboardRow> {
        self.inner.borrow().scoreboard_rows.get(&player).copied()
    }

    fn insert_widget(&self, mut widget: SimWidget) {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        widget.handle = WidgetHandle(inner.next_handle);
        *inner.adds_by_name.entry(widget.name.clone()).or_insert(0) += 1;
        inner.handle_names.insert(widget.handle, widget.name.clone());
        if let Some(old) = inner.widgets.insert(widget.name.clone(), widget) {
            inner.handle_names.remove(&old.handle);
        }
    }

    fn with_widget_mut(&self, handle: WidgetHandle, f: impl FnOnce(&mut SimWidget)) {
        let mut inner = self.inner.borrow_mut();
        if let Some(name) = inner.handle_names.get(&handle).cloned() {
            if let Some(widget) = inner.widgets.get_mut(&name) {
                f(widget);
            }
        }
    }
}

impl Host for SimHost {
    fn all_players(&self) -> Vec<PlayerId> {
        self.inner.borrow().players.keys().copied().collect()
    }

    fn team_members(&self, team: TeamId) -> Vec<PlayerId> {
        self.inner
            .borrow()
            .players
            .iter()
            .filter(|(_, p)| p.team == team)
            .map(|(id, _)| *id)
            .collect()
    }

    fn player_team(&self, player: PlayerId) -> Result<TeamId, HostError> {
        self.inner
            .borrow()
            .players
            .get(&player)
            .map(|p| p.team)
            .ok_or(HostError::UnknownPlayer(player))
    }

    fn player_name(&self, player: PlayerId) -> String {
        self.inner
            .borrow()
            .players
            .get(&player)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("player-{}", player.0))
    }

    fn is_deployed(&self, player: PlayerId) -> Result<bool, HostError> {
        let inner = self.inner.borrow();
        if inner.fail_deploy.contains(&player) {
            return Err(HostError::StateUnavailable(player));
        }
        inner
            .players
            .get(&player)
            .map(|p| p.deployed)
            .ok_or(HostError::UnknownPlayer(player))
    }

    fn match_seconds(&self) -> Seconds {
        self.inner.borrow().clock
    }

    fn set_time_limit(&self, secs: u32) {
        self.inner.borrow_mut().time_limit = Some(secs);
    }

    fn end_round(&self, winner: TeamId) {
        // First declaration wins; the engine ignores repeats.
        self.inner.borrow_mut().round_winner.get_or_insert(winner);
    }

    fn spot_target(&self, player: PlayerId, _duration_secs: Seconds, _mode: SpotMode) {
        let mut inner = self.inner.borrow_mut();
        let now = inner.clock;
        inner.spot_log.push((player, now));
        inner.spotted.insert(player);
    }

    fn unspot_target(&self, player: PlayerId) {
        self.inner.borrow_mut().spotted.remove(&player);
    }

    fn add_world_icon(
        &self,
        player: PlayerId,
        icon: WorldIcon,
        vertical_offset: f32,
        color: Color,
        label: Notice,
        visible_to: TeamId,
    ) {
        self.inner
            .borrow_mut()
            .icons
            .insert(player, SimIcon { icon, vertical_offset, color, label, visible_to });
    }

    fn remove_world_icon(&self, player: PlayerId) {
        self.inner.borrow_mut().icons.remove(&player);
    }

    fn add_container(&self, spec: &ContainerSpec) {
        self.insert_widget(SimWidget {
            handle: WidgetHandle(0),
            name: spec.name.clone(),
            kind: SimWidgetKind::Container,
            owner: spec.owner,
            parent: spec.parent.clone(),
            visible: spec.visible,
            label: None,
            bg_color: spec.bg_color,
            bg_alpha: spec.bg_alpha,
            position: spec.position,
            size: spec.size,
        });
    }

    fn add_text(&self, spec: &TextSpec) {
        self.insert_widget(SimWidget {
            handle: WidgetHandle(0),
            name: spec.name.clone(),
            kind: SimWidgetKind::Text,
            owner: spec.owner,
            parent: spec.parent.clone(),
            visible: spec.visible,
            label: Some(spec.label.clone()),
            bg_color: spec.bg_color,
            bg_alpha: spec.bg_alpha,
            position: spec.position,
            size: spec.size,
        });
    }

    fn add_image(&self, spec: &ImageSpec) {
        self.insert_widget(SimWidget {
            handle: WidgetHandle(0),
            name: spec.name.clone(),
            kind: SimWidgetKind::Image,
            owner: spec.owner,
            parent: spec.parent.clone(),
            visible: spec.visible,
            label: None,
            bg_color: spec.color,
            bg_alpha: spec.alpha,
            position: spec.position,
            size: spec.size,
        });
    }

    fn find_widget(&self, name: &str) -> Option<WidgetHandle> {
        self.inner.borrow().widgets.get(name).map(|w| w.handle)
    }

    fn set_text_label(&self, widget: WidgetHandle, label: Notice) {
        self.with_widget_mut(widget, |w| w.label = Some(label));
    }

    fn set_widget_visible(&self, widget: WidgetHandle, visible: bool) {
        self.with_widget_mut(widget, |w| w.visible = visible);
    }

    fn set_widget_bg(&self, widget: WidgetHandle, color: Color, alpha: f32) {
        self.with_widget_mut(widget, |w| {
            w.bg_color = color;
            w.bg_alpha = alpha;
        });
    }

    fn delete_widget(&self, widget: WidgetHandle) {
        let mut inner = self.inner.borrow_mut();
        if let Some(name) = inner.handle_names.remove(&widget) {
            inner.widgets.remove(&name);
        }
    }

    fn display_notification(&self, notice: Notice, audience: Audience) {
        self.inner.borrow_mut().notifications.push((notice, audience));
    }

    fn display_world_log(&self, notice: Notice, audience: Audience) {
        self.inner.borrow_mut().world_log.push((notice, audience));
    }

    fn set_scoreboard(&self, spec: &ScoreboardSpec) {
        self.inner.borrow_mut().scoreboard = Some(spec.clone());
    }

    fn set_scoreboard_row(&self, player: PlayerId, row: ScoreboardRow) {
        self.inner.borrow_mut().scoreboard_rows.insert(player, row);
    }
}

impl RingHost for SimHost {
    fn ring_position(&self, ring: u32) -> Result<Vec3, HostError> {
        let inner = self.inner.borrow();
        if inner.failing_rings.contains(&ring) {
            return Err(HostError::CallFailed(format!("ring {} query rejected", ring)));
        }
        inner.rings.get(&ring).copied().ok_or(HostError::UnknownRing(ring))
    }

    fn set_ring_position(&self, ring: u32, position: Vec3) -> Result<(), HostError> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_rings.contains(&ring) {
            return Err(HostError::CallFailed(format!("ring {} move rejected", ring)));
        }
        match inner.rings.get_mut(&ring) {
            Some(slot) => {
                *slot = position;
                Ok(())
            }
            None => Err(HostError::UnknownRing(ring)),
        }
    }

    fn broadcast(&self, notice: Notice) {
        self.inner.borrow_mut().notifications.push((notice, Audience::All));
    }
}

// ========== Tests ==========
