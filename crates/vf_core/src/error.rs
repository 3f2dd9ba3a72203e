use thiserror::Error;

use crate::types::{PlayerId, TeamId};

/// Failures surfaced by outbound host calls.
///
/// Only calls whose failure the mode must react to return these; pure
/// presentation calls (widgets, notices) are infallible on the trait and
/// any underlying trouble stays on the host's own error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown team: {0}")]
    UnknownTeam(TeamId),

    #[error("unknown ring: {0}")]
    UnknownRing(u32),

    #[error("no queryable state for {0}")]
    StateUnavailable(PlayerId),

    #[error("host call failed: {0}")]
    CallFailed(String),
}

impl HostError {
    /// Whether the next natural recurrence of the failing call can succeed
    /// without intervention (roster churn settles, per-tick queries repeat).
    pub fn is_recoverable(&self) -> bool {
        match self {
            HostError::UnknownPlayer(_) => true,
            HostError::UnknownTeam(_) => false,
            HostError::UnknownRing(_) => false,
            HostError::StateUnavailable(_) => true,
            HostError::CallFailed(_) => false,
        }
    }
}
