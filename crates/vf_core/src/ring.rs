//! Ring-of-fire patrol harness.
//!
//! A tiny probe, unrelated to the VIP mode, that nudges a map's ring object
//! back and forth to verify the host honors transform writes. Kept behind
//! its own narrow trait so the mode host surface stays free of ring calls.

use crate::error::HostError;
use crate::host::Notice;
use crate::types::{Seconds, Vec3};

/// Ring object the patrol drives by default.
pub const DEFAULT_RING_ID: u32 = 1;
/// Seconds between moves.
const MOVE_INTERVAL_SECS: Seconds = 2.0;
/// Distance per move, world units.
const MOVE_STEP: f32 = 100.0;
/// Patrol turns around once the ring drifts this far from its start.
const PATROL_BOUND: f32 = 500.0;

/// The few host calls the patrol needs.
pub trait RingHost {
    fn ring_position(&self, ring: u32) -> Result<Vec3, HostError>;
    fn set_ring_position(&self, ring: u32, position: Vec3) -> Result<(), HostError>;
    /// Notification to everyone; the patrol is chatty on purpose so a tester
    /// sees every probe result in game.
    fn broadcast(&self, notice: Notice);
}

/// Moves one ring left and right along the x axis on a fixed cadence.
#[derive(Debug)]
pub struct RingPatrol {
    ring: u32,
    center: Vec3,
    direction: f32,
    last_move_at: Seconds,
    active: bool,
}

impl RingPatrol {
    pub fn new(ring: u32) -> Self {
        Self { ring, center: Vec3::default(), direction: 1.0, last_move_at: 0.0, active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Read the ring's starting position and arm the patrol. A ring the host
    /// cannot find leaves the patrol inactive.
    pub fn activate<H: RingHost>(&mut self, host: &H) {
        match host.ring_position(self.ring) {
            Ok(position) => {
                self.center = position;
                self.active = true;
                host.broadcast(Notice::RingTestInitialized);
                log::info!("ring patrol armed at {}", position);
            }
            Err(err) => {
                host.broadcast(Notice::RingTestError);
                log::warn!("ring patrol could not read ring {}: {}", self.ring, err);
            }
        }
    }

    /// Advance the patrol; at most one move per [`MOVE_INTERVAL_SECS`].
    /// A rejected transform write reports once and stops the patrol.
    pub fn update<H: RingHost>(&mut self, host: &H, now: Seconds) {
        if !self.active {
            return;
        }
        if now - self.last_move_at < MOVE_INTERVAL_SECS {
            return;
        }
        self.last_move_at = now;

        self.center.x += MOVE_STEP * self.direction;
        if self.center.x > PATROL_BOUND || self.center.x < -PATROL_BOUND {
            self.direction = -self.direction;
        }

        match host.set_ring_position(self.ring, self.center) {
            Ok(()) => host.broadcast(Notice::RingTestMoved),
            Err(err) => {
                host.broadcast(Notice::RingTestMoveFailed);
                self.active = false;
                log::warn!("ring patrol stopped, move rejected: {}", err);
            }
        }
    }
}

// ========== Tests ==========
