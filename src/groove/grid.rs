// Musical Grid - Time signature, bar grid, and backbeat placement
// Provides the slot structure every instrument pattern is written against

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::model::GrooveError;

/// Musical time signature, written `[beats, unit]` in groove files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct TimeSignature {
    /// Beats per bar (numerator)
    pub beats: u32,

    /// The note value that gets one beat (denominator)
    pub unit: u32,
}

/// Broad metric family of a time signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meter {
    /// Triplet-based: 6/8, 9/8, 12/8
    Compound,

    /// Even: 2/4, 4/4, 6/4
    Simple,

    /// Odd: 3/4, 5/4, 7/4, ...
    Odd,
}

impl TimeSignature {
    /// Create a validated time signature
    pub fn new(beats: u32, unit: u32) -> Result<Self, GrooveError> {
        let valid_unit = unit.is_power_of_two() && unit <= 32;
        if beats == 0 || !valid_unit {
            return Err(GrooveError::InvalidTimeSignature { beats, unit });
        }
        Ok(TimeSignature { beats, unit })
    }

    /// 4/4 time
    pub fn common() -> Self {
        TimeSignature { beats: 4, unit: 4 }
    }

    /// Classify into compound, simple, or odd meter
    pub fn meter(&self) -> Meter {
        if self.unit >= 8 && self.beats % 3 == 0 && self.beats > 3 {
            Meter::Compound
        } else if self.beats % 2 == 0 {
            Meter::Simple
        } else {
            Meter::Odd
        }
    }

    /// Pulse counts a bar grid may mark for this signature
    ///
    /// Compound meters may be felt in dotted pulses (6/8 in two) or in the
    /// written beats (6/8 in six).
    pub fn accepted_pulse_counts(&self) -> Vec<u32> {
        match self.meter() {
            Meter::Compound => vec![self.beats / 3, self.beats],
            Meter::Simple | Meter::Odd => vec![self.beats],
        }
    }
}

impl TryFrom<[u32; 2]> for TimeSignature {
    type Error = GrooveError;

    fn try_from(raw: [u32; 2]) -> Result<Self, Self::Error> {
        TimeSignature::new(raw[0], raw[1])
    }
}

impl From<TimeSignature> for [u32; 2] {
    fn from(sig: TimeSignature) -> Self {
        [sig.beats, sig.unit]
    }
}

/// Groove feel - decides where the backbeat falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrooveFeel {
    /// Backbeat on every second pulse (2 and 4 in 4/4)
    #[default]
    Straight,

    /// Halftime feel - snare on 3 instead of 2 and 4
    Halftime,
}

/// Grid position - describes location in musical time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    /// Bar number (0-indexed)
    pub bar: usize,

    /// Beat number within bar (0-indexed)
    pub beat: usize,

    /// Subdivision within beat (0-indexed)
    pub subdivision: usize,
}

impl GridPosition {
    /// Human-readable `bar.beat.subdivision`, all 1-indexed
    pub fn describe(&self) -> String {
        format!("{}.{}.{}", self.bar + 1, self.beat + 1, self.subdivision + 1)
    }
}

/// One bar of subdivision slots with the pulse (beat) slots marked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarGrid {
    signature: TimeSignature,
    pulses: Vec<bool>,
}

impl BarGrid {
    /// Create a bar grid and check it against the time signature
    /// - at least one slot, first slot is a pulse
    /// - pulse count is one the signature accepts
    /// - pulses are evenly spaced
    pub fn new(signature: TimeSignature, pulses: Vec<bool>) -> Result<Self, GrooveError> {
        let pulse_slots: Vec<usize> = pulses
            .iter()
            .enumerate()
            .filter_map(|(idx, &is_pulse)| is_pulse.then_some(idx))
            .collect();

        let count = pulse_slots.len() as u32;
        if pulses.is_empty() || !signature.accepted_pulse_counts().contains(&count) {
            return Err(GrooveError::ShapeMismatch {
                instrument: "bar_grid".to_string(),
                bar: 0,
                expected: signature.beats as usize,
                found: count as usize,
            });
        }

        let spacing = pulses.len() / pulse_slots.len();
        let evenly_spaced = pulses.len() % pulse_slots.len() == 0
            && pulse_slots
                .iter()
                .enumerate()
                .all(|(n, &slot)| slot == n * spacing);
        if !evenly_spaced {
            return Err(GrooveError::ShapeMismatch {
                instrument: "bar_grid".to_string(),
                bar: 0,
                expected: pulses.len(),
                found: pulses.len(),
            });
        }

        Ok(BarGrid { signature, pulses })
    }

    /// Straight grid with `slots_per_beat` slots under every written beat
    pub fn uniform(signature: TimeSignature, slots_per_beat: usize) -> Result<Self, GrooveError> {
        let slots_per_beat = slots_per_beat.max(1);
        let pulses = (0..signature.beats as usize * slots_per_beat)
            .map(|slot| slot % slots_per_beat == 0)
            .collect();
        BarGrid::new(signature, pulses)
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    /// Number of subdivision slots in one bar
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn pulse_count(&self) -> usize {
        self.pulses.iter().filter(|&&p| p).count()
    }

    /// Slots between two pulses
    pub fn slots_per_beat(&self) -> usize {
        self.len() / self.pulse_count().max(1)
    }

    /// Slot indices (within a bar) that carry a pulse
    pub fn pulse_slots(&self) -> Vec<usize> {
        (0..self.len()).step_by(self.slots_per_beat().max(1)).collect()
    }

    /// Backbeat slot indices within a bar for a feel
    pub fn backbeat_slots(&self, feel: GrooveFeel) -> BTreeSet<usize> {
        let pulses = self.pulse_slots();
        match feel {
            GrooveFeel::Straight => pulses.iter().skip(1).step_by(2).copied().collect(),
            GrooveFeel::Halftime => pulses.get(pulses.len() / 2).copied().into_iter().collect(),
        }
    }

    /// Counting line for one bar, e.g. `1..2..3..4..`
    ///
    /// Beats past nine count on in letters: `a` is beat ten.
    pub fn count_line(&self) -> String {
        let mut beat = 0;
        self.pulses
            .iter()
            .map(|&is_pulse| {
                if is_pulse {
                    beat += 1;
                    char::from_digit(beat, 36).unwrap_or('.')
                } else {
                    '.'
                }
            })
            .collect()
    }

    /// Slot structure handed to the sticking engine
    pub fn beat_map(
        &self,
        feel: GrooveFeel,
        backbeats: Option<&[usize]>,
    ) -> Result<BeatMap, GrooveError> {
        let backbeats = match backbeats {
            Some(explicit) => {
                if let Some(&outside) = explicit.iter().find(|&&slot| slot >= self.len()) {
                    return Err(GrooveError::ShapeMismatch {
                        instrument: "backbeats".to_string(),
                        bar: 0,
                        expected: self.len(),
                        found: outside,
                    });
                }
                explicit.iter().copied().collect()
            }
            None => self.backbeat_slots(feel),
        };

        Ok(BeatMap {
            slots_per_bar: self.len(),
            slots_per_beat: self.slots_per_beat(),
            backbeats,
        })
    }
}

/// Per-bar slot structure the sticking rules reason over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatMap {
    /// Subdivision slots per bar
    pub slots_per_bar: usize,

    /// Slots between two pulses; closer events count as subdivided playing
    pub slots_per_beat: usize,

    /// Slot indices within a bar where the backbeat falls
    pub backbeats: BTreeSet<usize>,
}

impl BeatMap {
    pub fn is_backbeat(&self, slot_in_bar: usize) -> bool {
        self.backbeats.contains(&slot_in_bar)
    }

    /// Locate a flat slot index in bars and beats
    pub fn position(&self, slot: usize) -> GridPosition {
        let slots_per_bar = self.slots_per_bar.max(1);
        let slots_per_beat = self.slots_per_beat.max(1);
        let slot_in_bar = slot % slots_per_bar;
        GridPosition {
            bar: slot / slots_per_bar,
            beat: slot_in_bar / slots_per_beat,
            subdivision: slot_in_bar % slots_per_beat,
        }
    }
}
