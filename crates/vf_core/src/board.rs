//! Ranked score-board projection.
//!
//! Pure functions from match state to the small board each player sees. With
//! up to 100 teams in a match, the board shows only the top three active
//! teams plus the observer's own, so the projection is recomputed in full on
//! every score or roster change instead of patching widgets in place.

use serde::Serialize;

use crate::config::ModeConfig;
use crate::state::MatchState;
use crate::types::{Color, TeamId};

/// Ranked teams shown before the observer's own row is considered.
pub const MAX_RANKED_ROWS: usize = 3;
/// Ranked rows plus the appended observer row.
pub const MAX_ROWS: usize = MAX_RANKED_ROWS + 1;

// Screen layout, pixels. One container under the top-center edge with a
// text line and a score bar per row.
pub const BOARD_MARGIN_TOP: f32 = 10.0;
pub const BOARD_WIDTH: f32 = 320.0;
pub const BOARD_PADDING: f32 = 4.0;
pub const ROW_HEIGHT: f32 = 30.0;
pub const ROW_TEXT_HEIGHT: f32 = 20.0;
pub const BAR_HEIGHT: f32 = 6.0;
pub const BAR_MAX_WIDTH: f32 = BOARD_WIDTH - 2.0 * BOARD_PADDING;

/// Classic palette for the first eight teams.
const TEAM_PALETTE: [Color; 8] = [
    Color { r: 1.0, g: 0.2, b: 0.2 }, // red
    Color { r: 0.2, g: 0.4, b: 1.0 }, // blue
    Color { r: 0.2, g: 1.0, b: 0.2 }, // green
    Color { r: 1.0, g: 1.0, b: 0.2 }, // yellow
    Color { r: 0.2, g: 1.0, b: 1.0 }, // cyan
    Color { r: 1.0, g: 0.2, b: 1.0 }, // magenta
    Color { r: 1.0, g: 0.6, b: 0.2 }, // orange
    Color { r: 0.6, g: 0.2, b: 1.0 }, // purple
];

/// Hue step that keeps procedurally generated team colors far apart.
const GOLDEN_ANGLE_DEG: f32 = 137.508;

/// One visible line of the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardRow {
    pub team: TeamId,
    pub score: u32,
    /// Progress toward the match target, `0.0..=1.0`.
    pub fill: f32,
    pub color: Color,
}

/// What one observer's board shows, top row first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoardView {
    pub rows: Vec<BoardRow>,
}

impl BoardView {
    /// Project the state into the board an observer on `observer_team` sees:
    /// the top [`MAX_RANKED_ROWS`] active teams by score (ties to the lower
    /// id), with the observer's team appended when it missed the cut.
    pub fn project(state: &MatchState, cfg: &ModeConfig, observer_team: Option<TeamId>) -> Self {
        let mut ranked: Vec<TeamId> = state.active_teams.clone();
        ranked.sort_by(|a, b| state.score(*b).cmp(&state.score(*a)).then(a.cmp(b)));
        ranked.truncate(MAX_RANKED_ROWS);

        if let Some(own) = observer_team {
            if own.in_range(cfg.team_count) && !ranked.contains(&own) {
                ranked.push(own);
            }
        }

        let rows = ranked
            .into_iter()
            .map(|team| {
                let score = state.score(team);
                BoardRow { team, score, fill: score_fill(score, cfg), color: team_color(team) }
            })
            .collect();
        Self { rows }
    }

    /// Index of the row showing `team`, if it is visible at all.
    pub fn row_index_of(&self, team: TeamId) -> Option<usize> {
        self.rows.iter().position(|row| row.team == team)
    }
}

/// Bar fraction for a score: `score / target`, clamped into `[0, 1]`.
pub fn score_fill(score: u32, cfg: &ModeConfig) -> f32 {
    let target = cfg.target_vip_kills.max(1) as f32;
    (score as f32 / target).clamp(0.0, 1.0)
}

/// Stable color for a team: the classic palette for the first eight ids,
/// then golden-angle hue rotation so that even a hundred teams stay
/// distinguishable at a glance.
pub fn team_color(team: TeamId) -> Color {
    let idx = team.0.saturating_sub(1) as usize;
    if let Some(&color) = TEAM_PALETTE.get(idx) {
        return color;
    }
    let hue = (idx as f32 * GOLDEN_ANGLE_DEG) % 360.0;
    hsv_to_rgb(hue, 0.7, 0.95)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let sector = h.rem_euclid(360.0) / 60.0;
    let f = sector - sector.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Color::rgb(r, g, b)
}

// ========== Tests ==========
