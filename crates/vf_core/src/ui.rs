//! Host-widget sync for the board, the HUD line and the intro panel.
//!
//! Widgets are keyed by name so a missing one is simply created on first
//! use. The board is rebuilt from scratch (delete, then recreate) on every
//! change; score changes arrive per kill, not per tick, so correctness wins
//! over patching.

use crate::board::{self, BoardView};
use crate::config::ModeConfig;
use crate::host::{
    Audience, ContainerSpec, Host, ImageSpec, Notice, TextSpec, UiAnchor, UiBgFill, UiDepth,
};
use crate::schedule::{DeferredAction, Scheduler, INTRO_SECS};
use crate::state::MatchState;
use crate::types::{Color, PlayerId, TeamId, Vec3};

fn board_name(observer: PlayerId) -> String {
    format!("vipfiesta_board_{}", observer.0)
}

fn row_name(observer: PlayerId, idx: usize) -> String {
    format!("vipfiesta_board_{}_row_{}", observer.0, idx)
}

fn bar_name(observer: PlayerId, idx: usize) -> String {
    format!("vipfiesta_board_{}_bar_{}", observer.0, idx)
}

fn hud_name(player: PlayerId) -> String {
    format!("vipfiesta_hud_{}", player.0)
}

fn intro_name(player: PlayerId) -> String {
    format!("vipfiesta_intro_{}", player.0)
}

/// Projects [`MatchState`] onto host widgets.
#[derive(Debug, Default)]
pub struct ScoreUi;

impl ScoreUi {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild every connected observer's board.
    pub fn rebuild_all<H: Host>(&self, host: &H, state: &MatchState, cfg: &ModeConfig) {
        for observer in host.all_players() {
            self.rebuild_for(host, state, cfg, observer);
        }
    }

    /// Rebuild one observer's board from the current ranking.
    pub fn rebuild_for<H: Host>(
        &self,
        host: &H,
        state: &MatchState,
        cfg: &ModeConfig,
        observer: PlayerId,
    ) {
        let observer_team = host.player_team(observer).ok();
        let view = BoardView::project(state, cfg, observer_team);

        self.clear_board(host, observer);
        if view.rows.is_empty() {
            return;
        }

        let height = view.rows.len() as f32 * board::ROW_HEIGHT + 2.0 * board::BOARD_PADDING;
        host.add_container(&ContainerSpec {
            name: board_name(observer),
            position: Vec3::new(0.0, board::BOARD_MARGIN_TOP, 0.0),
            size: Vec3::new(board::BOARD_WIDTH, height, 0.0),
            anchor: UiAnchor::TopCenter,
            parent: None,
            visible: true,
            padding: board::BOARD_PADDING,
            bg_color: Color::BLACK,
            bg_alpha: 0.6,
            bg_fill: UiBgFill::Blur,
            owner: Some(observer),
        });

        for (idx, row) in view.rows.iter().enumerate() {
            let y = idx as f32 * board::ROW_HEIGHT;
            host.add_text(&TextSpec {
                name: row_name(observer, idx),
                position: Vec3::new(0.0, y, 0.0),
                size: Vec3::new(board::BAR_MAX_WIDTH, board::ROW_TEXT_HEIGHT, 0.0),
                anchor: UiAnchor::TopLeft,
                parent: Some(board_name(observer)),
                visible: true,
                padding: 2.0,
                bg_color: row.color,
                bg_alpha: 0.25,
                bg_fill: UiBgFill::Solid,
                label: Notice::BoardLine { team: row.team, score: row.score },
                text_size: 14.0,
                text_color: Color::WHITE,
                text_alpha: 1.0,
                text_anchor: UiAnchor::CenterLeft,
                depth: UiDepth::GameUi,
                owner: Some(observer),
            });
            host.add_image(&ImageSpec {
                name: bar_name(observer, idx),
                position: Vec3::new(0.0, y + board::ROW_TEXT_HEIGHT, 0.0),
                size: Vec3::new(row.fill * board::BAR_MAX_WIDTH, board::BAR_HEIGHT, 0.0),
                anchor: UiAnchor::TopLeft,
                parent: Some(board_name(observer)),
                visible: true,
                color: row.color,
                alpha: 0.9,
                owner: Some(observer),
            });
        }
    }

    /// Brighten the winning team's row on every board that shows it.
    pub fn highlight_team<H: Host>(
        &self,
        host: &H,
        state: &MatchState,
        cfg: &ModeConfig,
        team: TeamId,
    ) {
        for observer in host.all_players() {
            let observer_team = host.player_team(observer).ok();
            let view = BoardView::project(state, cfg, observer_team);
            let Some(idx) = view.row_index_of(team) else {
                continue;
            };
            if let Some(widget) = host.find_widget(&row_name(observer, idx)) {
                host.set_widget_bg(widget, board::team_color(team), 0.8);
            }
        }
    }

    /// Create or refresh a player's one-line HUD status.
    pub fn refresh_hud<H: Host>(
        &self,
        host: &H,
        state: &MatchState,
        player: PlayerId,
        team: TeamId,
    ) {
        let label = if state.is_vip(player, team) {
            Notice::HudYouAreVip
        } else {
            Notice::HudYourVip { vip: state.vip_of(team) }
        };

        match host.find_widget(&hud_name(player)) {
            Some(widget) => {
                host.set_text_label(widget, label);
                host.set_widget_visible(widget, true);
            }
            None => host.add_text(&TextSpec {
                name: hud_name(player),
                position: Vec3::new(10.0, 70.0, 0.0),
                size: Vec3::new(300.0, 24.0, 0.0),
                anchor: UiAnchor::TopLeft,
                parent: None,
                visible: true,
                padding: 4.0,
                bg_color: Color::BLACK,
                bg_alpha: 0.4,
                bg_fill: UiBgFill::Blur,
                label,
                text_size: 16.0,
                text_color: Color::WHITE,
                text_alpha: 1.0,
                text_anchor: UiAnchor::CenterLeft,
                depth: UiDepth::AboveGameUi,
                owner: Some(player),
            }),
        }
    }

    /// Show the one-time intro panel on a player's first deploy and queue
    /// its removal. Marked as shown at schedule time, so a redeploy during
    /// the display window cannot queue a second removal.
    pub fn show_intro_once<H: Host>(
        &self,
        host: &H,
        state: &mut MatchState,
        scheduler: &mut Scheduler,
        player: PlayerId,
    ) {
        if !state.mark_intro_shown(player) {
            return;
        }
        if host.find_widget(&intro_name(player)).is_none() {
            host.add_text(&TextSpec {
                name: intro_name(player),
                position: Vec3::new(0.0, 120.0, 0.0),
                size: Vec3::new(520.0, 26.0, 0.0),
                anchor: UiAnchor::TopCenter,
                parent: None,
                visible: true,
                padding: 6.0,
                bg_color: Color::BLACK,
                bg_alpha: 0.5,
                bg_fill: UiBgFill::Blur,
                label: Notice::GameStarting,
                text_size: 18.0,
                text_color: Color::WHITE,
                text_alpha: 1.0,
                text_anchor: UiAnchor::Center,
                depth: UiDepth::AboveGameUi,
                owner: Some(player),
            });
        }
        scheduler.schedule(
            host.match_seconds() + INTRO_SECS,
            DeferredAction::HideIntro { player },
        );
    }

    /// Deferred counterpart of [`ScoreUi::show_intro_once`].
    pub fn hide_intro<H: Host>(&self, host: &H, player: PlayerId) {
        if let Some(widget) = host.find_widget(&intro_name(player)) {
            host.set_widget_visible(widget, false);
        }
    }

    /// Broadcast one line announcing a score change.
    pub fn announce_score<H: Host>(&self, host: &H, cfg: &ModeConfig, team: TeamId, score: u32) {
        host.display_world_log(
            Notice::VipKilled { team, score, target: cfg.target_vip_kills },
            Audience::All,
        );
    }

    fn clear_board<H: Host>(&self, host: &H, observer: PlayerId) {
        for idx in 0..board::MAX_ROWS {
            if let Some(widget) = host.find_widget(&row_name(observer, idx)) {
                host.delete_widget(widget);
            }
            if let Some(widget) = host.find_widget(&bar_name(observer, idx)) {
                host.delete_widget(widget);
            }
        }
        if let Some(widget) = host.find_widget(&board_name(observer)) {
            host.delete_widget(widget);
        }
    }
}

// ========== Tests ==========
