// Rudiments - Fixed hand stickings that can be bound to an instrument
// Strokes are written relative to the dominant hand, so a rudiment reads the same for lefties

use serde::{Deserialize, Serialize};

use crate::kit::Hand;

/// One stroke of a rudiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stroke {
    /// Dominant hand ('R' for a right-handed player)
    Lead,

    /// Non-dominant hand
    Off,
}

impl Stroke {
    pub fn hand(&self, dominant: Hand) -> Hand {
        match self {
            Stroke::Lead => dominant,
            Stroke::Off => dominant.opposite(),
        }
    }
}

/// Built-in sticking rudiments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rudiment {
    /// R L (open stroke)
    SingleStroke,

    /// R R L L
    DoubleStrokeRoll,

    /// R L R R
    Paradiddle,

    /// R L R L R R
    DoubleParadiddle,
}

impl Rudiment {
    /// Convert from string representation
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single_stroke" | "open_stroke" => Some(Rudiment::SingleStroke),
            "double_stroke_roll" => Some(Rudiment::DoubleStrokeRoll),
            "paradiddle" => Some(Rudiment::Paradiddle),
            "double_paradiddle" => Some(Rudiment::DoubleParadiddle),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn to_string(&self) -> &'static str {
        match self {
            Rudiment::SingleStroke => "single_stroke",
            Rudiment::DoubleStrokeRoll => "double_stroke_roll",
            Rudiment::Paradiddle => "paradiddle",
            Rudiment::DoubleParadiddle => "double_paradiddle",
        }
    }

    pub fn strokes(&self) -> &'static [Stroke] {
        use Stroke::{Lead, Off};
        match self {
            Rudiment::SingleStroke => &[Lead, Off],
            Rudiment::DoubleStrokeRoll => &[Lead, Lead, Off, Off],
            Rudiment::Paradiddle => &[Lead, Off, Lead, Lead],
            Rudiment::DoubleParadiddle => &[Lead, Off, Lead, Off, Lead, Lead],
        }
    }

    /// Hand for the n-th note played with this rudiment (wraps around)
    pub fn hand_at(&self, n: usize, dominant: Hand) -> Hand {
        let strokes = self.strokes();
        strokes[n % strokes.len()].hand(dominant)
    }

    /// Sticking as letters, e.g. `RLRR`
    pub fn sticking(&self, dominant: Hand) -> String {
        (0..self.strokes().len())
            .map(|n| match self.hand_at(n, dominant) {
                Hand::Right => 'R',
                Hand::Left => 'L',
            })
            .collect()
    }
}

/// Get a rudiment by name
pub fn get_rudiment(name: &str) -> Option<Rudiment> {
    Rudiment::from_string(name)
}

/// Get all rudiment names
pub fn list_rudiment_names() -> Vec<String> {
    vec![
        "single_stroke".to_string(),
        "double_stroke_roll".to_string(),
        "paradiddle".to_string(),
        "double_paradiddle".to_string(),
    ]
}
