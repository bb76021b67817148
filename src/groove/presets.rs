// Pattern Presets - Named one-handed bar patterns usable in groove files
// Six-slot figures written for triplet grids (one bar of 6/8, or two beats of 12/8)

use serde::{Deserialize, Serialize};

use super::model::{BarPattern, GrooveError, GrooveResult};

/// Built-in one-handed cymbal figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneHandedPattern {
    /// Classic spang-a-lang ride
    JazzRide,

    /// Ride figure with the skip on the second beat
    JazzRide2,

    Shuffle,
}

impl OneHandedPattern {
    /// Convert from string representation
    pub fn from_string(s: &str) -> GrooveResult<Self> {
        match s {
            "jazz_ride" => Ok(OneHandedPattern::JazzRide),
            "jazz_ride2" => Ok(OneHandedPattern::JazzRide2),
            "shuffle" => Ok(OneHandedPattern::Shuffle),
            other => Err(GrooveError::UnknownPreset(other.to_string())),
        }
    }

    /// Step notation for the figure
    pub fn steps(&self) -> &'static [u8] {
        match self {
            OneHandedPattern::JazzRide => &[1, 0, 0, 1, 0, 1],
            OneHandedPattern::JazzRide2 => &[1, 0, 1, 1, 0, 0],
            OneHandedPattern::Shuffle => &[1, 0, 1, 1, 0, 1],
        }
    }

    pub fn bar(&self) -> BarPattern {
        BarPattern::from_steps(self.steps())
    }
}

/// Names accepted by [`OneHandedPattern::from_string`]
pub fn list_preset_names() -> Vec<&'static str> {
    vec!["jazz_ride", "jazz_ride2", "shuffle"]
}
