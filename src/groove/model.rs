// Groove Model - Song-level pattern data for every instrument on the kit
// Pure data with validated construction; expansion and sticking live elsewhere

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::grid::{BarGrid, GrooveFeel, TimeSignature};
use super::sections::SongForm;
use crate::kit::Instrument;

/// Errors raised while building or expanding a groove
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrooveError {
    #[error("Shape mismatch in {instrument} bar {bar}: expected {expected} slots, found {found}")]
    ShapeMismatch {
        instrument: String,
        bar: usize,
        expected: usize,
        found: usize,
    },

    #[error("Empty pattern: {instrument} variant '{variant}' has no bars")]
    EmptyPattern { instrument: String, variant: String },

    #[error("Unknown variant key '{key}' for {instrument}")]
    UnknownVariantKey { instrument: String, key: String },

    #[error("No variant selected for {instrument} at bar {bar} and it has several to choose from")]
    MissingVariantSelection { instrument: String, bar: usize },

    #[error("Invalid time signature {beats}/{unit}")]
    InvalidTimeSignature { beats: u32, unit: u32 },

    #[error("Variant '{variant}' of {instrument} is {length} bars long but the song has {bars}")]
    InvalidBarCount {
        instrument: String,
        variant: String,
        length: usize,
        bars: usize,
    },

    #[error("A groove needs at least one bar")]
    NoBars,

    #[error("Invalid sections: {0}")]
    InvalidSections(String),

    #[error("Unknown pattern preset '{0}'")]
    UnknownPreset(String),
}

pub type GrooveResult<T> = Result<T, GrooveError>;

/// Which time-keeping cymbal leads the groove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrooveType {
    /// Hi-hat grooves (usually verses) - played crossed-hands
    #[serde(rename = "hihat_led")]
    HiHatLed,

    /// Ride grooves (usually choruses) - played open-handed
    #[serde(rename = "ride_led")]
    RideLed,
}

impl GrooveType {
    /// Classify from event counts; ties go to the hi-hat
    pub fn infer(hihat_events: usize, ride_events: usize) -> Self {
        if ride_events > hihat_events {
            GrooveType::RideLed
        } else {
            GrooveType::HiHatLed
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            GrooveType::HiHatLed => "hihat_led",
            GrooveType::RideLed => "ride_led",
        }
    }
}

/// One bar of one instrument: active (`true`) or silent per slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarPattern(Vec<bool>);

impl BarPattern {
    pub fn new(slots: Vec<bool>) -> Self {
        BarPattern(slots)
    }

    /// Build from the 0/1 step notation used in groove files
    pub fn from_steps(steps: &[u8]) -> Self {
        BarPattern(steps.iter().map(|&step| step != 0).collect())
    }

    /// A bar with no events
    pub fn silent(len: usize) -> Self {
        BarPattern(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn slots(&self) -> &[bool] {
        &self.0
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&active| active).count()
    }
}

/// A named, cyclable sequence of bars for one instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternVariant {
    pub key: String,
    pub bars: Vec<BarPattern>,
}

impl PatternVariant {
    pub fn new(key: impl Into<String>, bars: Vec<BarPattern>) -> Self {
        PatternVariant {
            key: key.into(),
            bars,
        }
    }

    /// Cycle length in bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Pattern variant library for one instrument, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentTrack {
    pub instrument: Instrument,
    pub variants: Vec<PatternVariant>,
}

impl InstrumentTrack {
    /// Create a new track with no variants
    pub fn new(instrument: Instrument) -> Self {
        InstrumentTrack {
            instrument,
            variants: Vec::new(),
        }
    }

    /// Add a variant, replacing any earlier one with the same key
    pub fn with_variant(mut self, variant: PatternVariant) -> Self {
        match self.variants.iter_mut().find(|v| v.key == variant.key) {
            Some(existing) => *existing = variant,
            None => self.variants.push(variant),
        }
        self
    }

    /// Look up a variant by key
    pub fn variant(&self, key: &str) -> GrooveResult<&PatternVariant> {
        self.variants
            .iter()
            .find(|v| v.key == key)
            .ok_or_else(|| GrooveError::UnknownVariantKey {
                instrument: self.instrument.to_string().to_string(),
                key: key.to_string(),
            })
    }

    /// The only variant, when there is exactly one
    pub fn sole_variant(&self) -> Option<&PatternVariant> {
        match self.variants.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn variant_keys(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.key.as_str()).collect()
    }
}

/// A complete groove: timing structure, per-instrument pattern libraries, song form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Groove {
    name: String,
    bars: usize,
    bar_grid: BarGrid,
    feel: GrooveFeel,
    backbeats: Option<Vec<usize>>,
    groove_type: Option<GrooveType>,
    tracks: BTreeMap<Instrument, InstrumentTrack>,
    form: SongForm,
}

impl Groove {
    /// Create an empty groove of `bars` bars over a bar grid
    pub fn new(name: impl Into<String>, bar_grid: BarGrid, bars: usize) -> GrooveResult<Self> {
        if bars == 0 {
            return Err(GrooveError::NoBars);
        }

        Ok(Groove {
            name: name.into(),
            bars,
            bar_grid,
            feel: GrooveFeel::default(),
            backbeats: None,
            groove_type: None,
            tracks: BTreeMap::new(),
            form: SongForm::whole(bars),
        })
    }

    pub fn with_feel(mut self, feel: GrooveFeel) -> Self {
        self.feel = feel;
        self
    }

    /// Explicit backbeat slots (within a bar), overriding the feel
    pub fn with_backbeats(mut self, backbeats: Vec<usize>) -> Self {
        self.backbeats = Some(backbeats);
        self
    }

    /// Fix the groove type instead of inferring it per section
    pub fn with_groove_type(mut self, groove_type: GrooveType) -> Self {
        self.groove_type = Some(groove_type);
        self
    }

    /// Add an instrument track after checking every bar against the grid
    pub fn with_track(mut self, track: InstrumentTrack) -> GrooveResult<Self> {
        self.check_track(&track)?;
        self.tracks.insert(track.instrument, track);
        Ok(self)
    }

    /// Replace the song form after checking it covers the whole song
    pub fn with_form(mut self, form: SongForm) -> GrooveResult<Self> {
        if form.total_bars != self.bars {
            return Err(GrooveError::InvalidSections(format!(
                "song form spans {} bars but the groove has {}",
                form.total_bars, self.bars
            )));
        }
        form.validate()?;
        self.form = form;
        Ok(self)
    }

    fn check_track(&self, track: &InstrumentTrack) -> GrooveResult<()> {
        let instrument = track.instrument.to_string();
        if track.variants.is_empty() {
            return Err(GrooveError::EmptyPattern {
                instrument: instrument.to_string(),
                variant: String::new(),
            });
        }

        for variant in &track.variants {
            if variant.is_empty() {
                return Err(GrooveError::EmptyPattern {
                    instrument: instrument.to_string(),
                    variant: variant.key.clone(),
                });
            }
            if variant.len() > self.bars {
                return Err(GrooveError::InvalidBarCount {
                    instrument: instrument.to_string(),
                    variant: variant.key.clone(),
                    length: variant.len(),
                    bars: self.bars,
                });
            }
            for (bar, pattern) in variant.bars.iter().enumerate() {
                if pattern.len() != self.bar_grid.len() {
                    return Err(GrooveError::ShapeMismatch {
                        instrument: instrument.to_string(),
                        bar,
                        expected: self.bar_grid.len(),
                        found: pattern.len(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Re-check every track and the song form
    pub fn validate(&self) -> GrooveResult<()> {
        for track in self.tracks.values() {
            self.check_track(track)?;
        }
        self.form.validate()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn signature(&self) -> TimeSignature {
        self.bar_grid.signature()
    }

    pub fn bar_grid(&self) -> &BarGrid {
        &self.bar_grid
    }

    pub fn feel(&self) -> GrooveFeel {
        self.feel
    }

    pub fn backbeats(&self) -> Option<&[usize]> {
        self.backbeats.as_deref()
    }

    pub fn groove_type(&self) -> Option<GrooveType> {
        self.groove_type
    }

    pub fn tracks(&self) -> &BTreeMap<Instrument, InstrumentTrack> {
        &self.tracks
    }

    pub fn track(&self, instrument: Instrument) -> Option<&InstrumentTrack> {
        self.tracks.get(&instrument)
    }

    pub fn form(&self) -> &SongForm {
        &self.form
    }
}
