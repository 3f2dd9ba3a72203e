//! Host engine surface.
//!
//! The mode never owns players, teams, widgets or the clock; it talks to the
//! engine that does through the [`Host`] trait. Inbound events arrive on the
//! controller (see [`crate::controller`]), outbound calls leave through here.
//!
//! Only queries whose failure the mode reacts to are fallible. Presentation
//! calls (widgets, notices, spotting) are fire-and-forget; if the engine
//! rejects one it reports that on its own error channel.

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::types::{Color, PlayerId, Seconds, TeamId, Vec3};

/// Opaque handle to a screen widget, valid until the widget is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetHandle(pub u64);

/// Every message the mode can show a player.
///
/// The host owns the string table and the rendering; this layer only names
/// the message and carries its parameters. Keeping text out of the rules
/// crate means localization lives entirely host-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    GameStarting,
    YouAreVip,
    NewVip { player: PlayerId },
    VipDied,
    SelectingNewVip,
    VipKilled { team: TeamId, score: u32, target: u32 },
    TeamWins { team: TeamId },
    /// HUD line shown to the VIP themselves.
    HudYouAreVip,
    /// HUD line naming the observer's team VIP; `None` while selection is
    /// pending.
    HudYourVip { vip: Option<PlayerId> },
    /// Label on the world icon floating above a VIP.
    VipMarker,
    /// One line of the ranked score board.
    BoardLine { team: TeamId, score: u32 },
    ScoreboardTitle,
    ColumnTeam,
    ColumnVipKills,
    ColumnKills,
    ColumnDeaths,
    RingTestInitialized,
    RingTestMoved,
    RingTestMoveFailed,
    RingTestError,
}

/// Who receives a notification or world-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    All,
    Player(PlayerId),
    Team(TeamId),
}

/// Where a spot marker is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotMode {
    Minimap,
    World,
    /// Minimap and world at once; the form the mode always uses.
    Both,
}

/// Icon set the host can attach above an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldIcon {
    Skull,
    Crown,
}

/// Screen-anchor points, matching the host's widget layout model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Background fill style for widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiBgFill {
    None,
    Solid,
    Blur,
}

/// Z-ordering layer for widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiDepth {
    GameUi,
    AboveGameUi,
}

/// A plain rectangle grouping child widgets.
///
/// Positions and sizes are screen pixels wrapped in the host's vector type;
/// the `z` component is ignored by the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub position: Vec3,
    pub size: Vec3,
    pub anchor: UiAnchor,
    /// Name of the parent widget; `None` attaches to the UI root.
    pub parent: Option<String>,
    pub visible: bool,
    pub padding: f32,
    pub bg_color: Color,
    pub bg_alpha: f32,
    pub bg_fill: UiBgFill,
    /// Restricts the widget to one player's screen when set.
    pub owner: Option<PlayerId>,
}

/// A text label widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub name: String,
    pub position: Vec3,
    pub size: Vec3,
    pub anchor: UiAnchor,
    pub parent: Option<String>,
    pub visible: bool,
    pub padding: f32,
    pub bg_color: Color,
    pub bg_alpha: f32,
    pub bg_fill: UiBgFill,
    pub label: Notice,
    pub text_size: f32,
    pub text_color: Color,
    pub text_alpha: f32,
    pub text_anchor: UiAnchor,
    pub depth: UiDepth,
    pub owner: Option<PlayerId>,
}

/// A flat colored image widget, used for score bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: String,
    pub position: Vec3,
    pub size: Vec3,
    pub anchor: UiAnchor,
    pub parent: Option<String>,
    pub visible: bool,
    pub color: Color,
    pub alpha: f32,
    pub owner: Option<PlayerId>,
}

/// Layout kind of the host's built-in scoreboard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreboardKind {
    /// Engine default for the current base mode.
    Standard,
    /// Free-for-all board with caller-defined columns.
    CustomFfa,
}

/// Schema for the built-in scoreboard: header, four columns and sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardSpec {
    pub kind: ScoreboardKind,
    pub header: Notice,
    pub columns: [Notice; 4],
    pub column_widths: [f32; 4],
    /// 1-based column index used for sorting, per host convention.
    pub sort_column: u8,
    pub sort_descending: bool,
}

/// One player's row on the built-in scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardRow {
    pub team: TeamId,
    pub vip_kills: u32,
    pub kills: u32,
    pub deaths: u32,
}

/// Outbound calls into the engine that hosts this mode.
///
/// All methods take `&self`; the host serializes every callback and timer on
/// one logical queue, so the mode never needs exclusive access to it.
pub trait Host {
    // ========== Roster ==========

    /// Ids of all currently connected players, in a stable order.
    fn all_players(&self) -> Vec<PlayerId>;

    /// Connected players assigned to `team`.
    fn team_members(&self, team: TeamId) -> Vec<PlayerId>;

    /// Team the player is currently assigned to.
    fn player_team(&self, player: PlayerId) -> Result<TeamId, HostError>;

    /// Display name for timelines and reports.
    fn player_name(&self, player: PlayerId) -> String;

    // ========== Liveness ==========

    /// Whether the player has a soldier deployed in the world.
    ///
    /// Callers treat an `Err` as not deployed; a player the engine cannot
    /// answer for is never put in a candidate pool.
    fn is_deployed(&self, player: PlayerId) -> Result<bool, HostError>;

    // ========== Clock and round control ==========

    /// Match-elapsed seconds.
    fn match_seconds(&self) -> Seconds;

    /// Arm the host's own round timer.
    fn set_time_limit(&self, secs: u32);

    /// End the round with a declared winner.
    fn end_round(&self, winner: TeamId);

    // ========== Spotting ==========

    /// Mark the player visible to everyone for `duration_secs`.
    fn spot_target(&self, player: PlayerId, duration_secs: Seconds, mode: SpotMode);

    /// Clear any active spot marker on the player.
    fn unspot_target(&self, player: PlayerId);

    // ========== World icons ==========

    /// Attach a floating icon `vertical_offset` meters above the player,
    /// visible only to `visible_to`.
    fn add_world_icon(
        &self,
        player: PlayerId,
        icon: WorldIcon,
        vertical_offset: f32,
        color: Color,
        label: Notice,
        visible_to: TeamId,
    );

    /// Remove the player's floating icon, if any.
    fn remove_world_icon(&self, player: PlayerId);

    // ========== Screen widgets ==========

    fn add_container(&self, spec: &ContainerSpec);
    fn add_text(&self, spec: &TextSpec);
    fn add_image(&self, spec: &ImageSpec);

    /// Look a widget up by name.
    fn find_widget(&self, name: &str) -> Option<WidgetHandle>;

    fn set_text_label(&self, widget: WidgetHandle, label: Notice);
    fn set_widget_visible(&self, widget: WidgetHandle, visible: bool);
    fn set_widget_bg(&self, widget: WidgetHandle, color: Color, alpha: f32);
    fn delete_widget(&self, widget: WidgetHandle);

    // ========== Messages ==========

    /// Prominent center-screen notification.
    fn display_notification(&self, notice: Notice, audience: Audience);

    /// Highlighted line in the scrolling world log.
    fn display_world_log(&self, notice: Notice, audience: Audience);

    // ========== Built-in scoreboard ==========

    fn set_scoreboard(&self, spec: &ScoreboardSpec);
    fn set_scoreboard_row(&self, player: PlayerId, row: ScoreboardRow);
}
