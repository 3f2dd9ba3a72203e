//! Mode configuration.
//!
//! One immutable snapshot of tunables per match. Hosts usually ship the
//! defaults and override a field or two through [`ModeConfig::merge_json`]
//! from their rules editor.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// Tunables for one VIP Fiesta match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModeConfig {
    /// Team score that ends the match immediately.
    pub target_vip_kills: u32,
    /// Host match timer, seconds.
    pub time_limit_secs: u32,
    /// Delay between a VIP death and the replacement selection.
    pub vip_respawn_delay_secs: f64,
    /// Highest valid team id; gameplay teams are `1..=team_count`.
    pub team_count: u32,
    /// Desired spot-marker refresh rate while a VIP stays deployed.
    pub spotting_refresh_hz: f64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            target_vip_kills: 20,
            time_limit_secs: 1200,
            vip_respawn_delay_secs: 5.0,
            team_count: 100,
            spotting_refresh_hz: 1.0,
        }
    }
}

impl ModeConfig {
    /// Stock 20-minute round.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Short round for smoke tests: low target, tight timer.
    pub fn quick() -> Self {
        let mut cfg = Self::default();
        cfg.target_vip_kills = 5;
        cfg.time_limit_secs = 300;
        cfg
    }

    /// Long round with a slower spot cadence.
    pub fn endurance() -> Self {
        let mut cfg = Self::default();
        cfg.target_vip_kills = 50;
        cfg.time_limit_secs = 3600;
        cfg.spotting_refresh_hz = 0.5;
        cfg
    }

    /// Overlay the fields present in `partial` (a JSON object) onto `self`.
    ///
    /// Unknown keys are rejected so a typoed override fails loudly instead
    /// of silently keeping the default.
    pub fn merge_json(&self, partial: &str) -> Result<Self, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        let overlay: serde_json::Value = serde_json::from_str(partial)?;
        let over = overlay
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("expected a JSON object of overrides"))?;
        if let Some(base) = value.as_object_mut() {
            for (key, val) in over {
                base.insert(key.clone(), val.clone());
            }
        }
        serde_json::from_value(value)
    }

    /// Seconds between spot-marker refreshes for the same VIP.
    ///
    /// The refresh rate is clamped at 0.1 Hz so a zero in the config can
    /// never divide the period into infinity.
    pub fn spotting_period(&self) -> f64 {
        1.0 / self.spotting_refresh_hz.max(0.1)
    }
}

// ========== Tests ==========
