//! # vf_core - VIP Fiesta game-mode rules engine
//!
//! The rules layer of the VIP Fiesta mode: every team marks one player as
//! its VIP, visible to everyone, and killing an enemy VIP scores a point.
//! First team to the target wins; the clock decides otherwise.
//!
//! The engine hosting the match stays behind the [`Host`] trait. This crate
//! holds only rules state and decisions, which makes a whole match
//! replayable in memory against the simulated host in [`sim`].
//!
//! ## Features
//! - 100% deterministic: same seed + same event script = same match
//! - Single-threaded by design, matching the host's serialized dispatch
//! - Internal typed timer queue instead of host fire-and-forget waits
//! - Simulated host for tests and scripted replays

pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod ring;
pub mod schedule;
pub mod sim;
pub mod state;
pub mod types;
pub mod ui;
pub mod vip;

// Re-export the surface a host integration needs
pub use config::ModeConfig;
pub use controller::VipFiesta;
pub use error::HostError;
pub use host::{Audience, Host, Notice, ScoreboardRow, ScoreboardSpec, SpotMode};
pub use ring::{RingHost, RingPatrol};
pub use sim::SimHost;
pub use state::{MatchPhase, MatchState, PlayerStats, VipSlot};
pub use types::{Color, PlayerId, Seconds, TeamId, Vec3};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod scenario_tests;
