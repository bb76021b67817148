// Song Form - Divides a groove into sections that pick pattern variants
// Each section maps instruments to the variant they play for its bar range

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::{GrooveError, GrooveResult, GrooveType};
use crate::kit::Instrument;

/// A section of the song - a contiguous bar range with its own variant choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Starting bar number (0-indexed)
    pub start_bar: usize,

    /// Ending bar number (exclusive, 0-indexed)
    pub end_bar: usize,

    /// Overrides the groove-wide groove type for these bars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groove_type: Option<GrooveType>,

    /// Variant key played by each instrument in this section
    #[serde(default)]
    pub variants: BTreeMap<Instrument, String>,
}

impl Section {
    /// Create a new section with no variant selections
    pub fn new(start_bar: usize, end_bar: usize) -> Self {
        Section {
            start_bar,
            end_bar,
            groove_type: None,
            variants: BTreeMap::new(),
        }
    }

    /// Select the variant an instrument plays in this section
    pub fn with_variant(mut self, instrument: Instrument, key: impl Into<String>) -> Self {
        self.variants.insert(instrument, key.into());
        self
    }

    pub fn with_groove_type(mut self, groove_type: GrooveType) -> Self {
        self.groove_type = Some(groove_type);
        self
    }

    /// Get the length of this section in bars
    pub fn length_bars(&self) -> usize {
        self.end_bar.saturating_sub(self.start_bar)
    }

    /// Variant key selected for an instrument, if any
    pub fn variant_for(&self, instrument: Instrument) -> Option<&str> {
        self.variants.get(&instrument).map(String::as_str)
    }
}

/// Complete song form for a groove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongForm {
    /// All sections in the song
    pub sections: Vec<Section>,

    /// Total number of bars in the song
    pub total_bars: usize,
}

impl SongForm {
    /// Create a new song form with no sections
    pub fn new(total_bars: usize) -> Self {
        SongForm {
            sections: Vec::new(),
            total_bars,
        }
    }

    /// A single section spanning the whole song
    pub fn whole(total_bars: usize) -> Self {
        let mut form = SongForm::new(total_bars);
        form.add_section(Section::new(0, total_bars));
        form
    }

    /// Add a section to the form
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Sections ordered by start bar
    pub fn ordered(&self) -> Vec<&Section> {
        let mut sorted: Vec<&Section> = self.sections.iter().collect();
        sorted.sort_by_key(|s| s.start_bar);
        sorted
    }

    /// Validate that the song form is consistent
    /// - No empty sections
    /// - No gaps between sections
    /// - No overlapping sections
    /// - Covers all bars from 0 to total_bars
    pub fn validate(&self) -> GrooveResult<()> {
        let sorted = self.ordered();

        let first = sorted
            .first()
            .ok_or_else(|| GrooveError::InvalidSections("song form has no sections".to_string()))?;

        if first.start_bar != 0 {
            return Err(GrooveError::InvalidSections(format!(
                "first section must start at bar 0, but starts at {}",
                first.start_bar
            )));
        }

        if let Some(empty) = sorted.iter().find(|s| s.length_bars() == 0) {
            return Err(GrooveError::InvalidSections(format!(
                "section starting at bar {} is empty",
                empty.start_bar
            )));
        }

        for (i, pair) in sorted.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            if current.end_bar != next.start_bar {
                return Err(GrooveError::InvalidSections(format!(
                    "gap or overlap between sections: section {} ends at bar {}, section {} starts at bar {}",
                    i,
                    current.end_bar,
                    i + 1,
                    next.start_bar
                )));
            }
        }

        if let Some(last) = sorted.last() {
            if last.end_bar != self.total_bars {
                return Err(GrooveError::InvalidSections(format!(
                    "last section must end at bar {}, but ends at {}",
                    self.total_bars, last.end_bar
                )));
            }
        }

        Ok(())
    }
}
