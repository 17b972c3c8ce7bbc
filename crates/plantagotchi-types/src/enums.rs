//! Enumeration types shared between the model and its presentation layer.

use serde::{Deserialize, Serialize};

use crate::structs::GeoPosition;

/// Whether the sun is currently up at the player's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPhase {
    /// Current time lies strictly between sunrise and sunset.
    Daylight,
    /// Any other time, including the exact sunrise and sunset instants.
    Nighttime,
}

impl DayPhase {
    /// Human-readable label shown next to the plant.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daylight => "We are in daylight",
            Self::Nighttime => "It's nighttime",
        }
    }
}

/// Progress of the initial game state load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    /// The state store has not answered yet.
    Loading,
    /// A game state is loaded; the fast tick is live.
    Ready,
    /// The last load attempt failed; it is retried on the next slow tick.
    Failed(String),
}

impl LoadPhase {
    /// Whether the fast tick may mutate the state.
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// What the model currently knows about the device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// No location lookup has completed yet.
    Pending,
    /// The last lookup succeeded.
    Known(GeoPosition),
    /// The last lookup failed; the message is shown instead of coordinates.
    Unavailable(String),
    /// Location permission was denied and a grant was requested from the host.
    PermissionRequested,
}

impl PositionStatus {
    /// Text shown in place of the coordinates.
    pub fn describe(&self) -> String {
        match self {
            Self::Pending => "Getting position ...".to_owned(),
            Self::Known(pos) => format!("{},{}", pos.latitude, pos.longitude),
            Self::Unavailable(reason) => reason.clone(),
            Self::PermissionRequested => "Waiting for location permission".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ready_allows_ticks() {
        assert!(LoadPhase::Ready.is_ready());
        assert!(!LoadPhase::Loading.is_ready());
        assert!(!LoadPhase::Failed("offline".to_owned()).is_ready());
    }

    #[test]
    fn known_position_is_rendered_as_pair() {
        let status = PositionStatus::Known(GeoPosition::new(47.5, 7.6));
        assert_eq!(status.describe(), "47.5,7.6");
    }
}
