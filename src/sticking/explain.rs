// Sticking Explainability - Which rule put which limb on which note
// One record per event, serializable as JSON lines for inspection

use serde::{Deserialize, Serialize};

use crate::groove::GridPosition;
use crate::kit::{Instrument, Limb};

/// Rule name recorded for feet, which are pinned by the kit layout
pub const FIXED_FOOT: &str = "fixed_foot";

/// Rule name recorded when a hand was flipped to avoid double-booking
pub const RESOLVED_CONFLICT: &str = "resolved_conflict";

/// How a single event got its limb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickingDecision {
    /// Flat slot index in the song
    pub slot: usize,

    pub position: GridPosition,
    pub instrument: Instrument,
    pub limb: Limb,

    /// Name of the deciding rule
    pub rule: String,
}

impl StickingDecision {
    pub fn is_hand(&self) -> bool {
        self.limb.is_hand()
    }

    /// Human-readable account of the decision
    pub fn reasoning(&self) -> String {
        let why = match self.rule.as_str() {
            FIXED_FOOT => "the kit pins this instrument to one foot".to_string(),
            RESOLVED_CONFLICT => "the other hand was already taken in this slot".to_string(),
            "backbeat_snare" => "backbeat snare stays on the backbeat hand".to_string(),
            "rudiment" => "follows the bound rudiment".to_string(),
            "crossed_hands" => "crossed hands with the snare on the hi-hat".to_string(),
            "open_hands" => "open hands around the ride".to_string(),
            "tom_fill" => "tom fill alternation".to_string(),
            "alternation" => "alternates from the previous note".to_string(),
            "dominant_hand" => "dominant hand default".to_string(),
            other => format!("decided by {}", other),
        };

        format!(
            "{} at {} played with {} ({}).",
            self.instrument.label(),
            self.position.describe(),
            self.limb.letter(),
            why
        )
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Serialize a run of decisions, one JSON object per line
pub fn to_json_lines(decisions: &[StickingDecision]) -> Result<String, serde_json::Error> {
    decisions
        .iter()
        .map(StickingDecision::to_json_line)
        .collect()
}
