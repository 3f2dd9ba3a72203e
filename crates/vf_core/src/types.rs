//! Shared identifier and value types.
//!
//! Ids are host object ids, never indices into our own storage; the host
//! owns the entity space and we only ever compare and map them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned player object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Host-assigned team object id.
///
/// Valid gameplay teams are `1..=team_count`; anything else (spectator
/// slots, not-yet-assigned players) is outside the mode's interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl TeamId {
    /// Is this a real gameplay team under the configured team count?
    pub fn in_range(self, team_count: u32) -> bool {
        self.0 >= 1 && self.0 <= team_count
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Match-elapsed time in seconds, as reported by the host clock.
pub type Seconds = f64;

/// World-space vector in the host coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:.2}, {:.2}, {:.2}>", self.x, self.y, self.z)
    }
}

/// RGB color with channels in `[0, 1]`, the form host UI calls take.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };

    /// VIP friendly-marker green.
    pub const VIP_GREEN: Self = Self { r: 0.2, g: 0.8, b: 0.2 };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
