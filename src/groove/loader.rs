// Groove Loader - JSON groove files into validated grooves
// Bars are written as 0/1 arrays or as the name of a one-handed preset

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::grid::{BarGrid, GrooveFeel, TimeSignature};
use super::model::{BarPattern, Groove, GrooveError, GrooveResult, GrooveType, InstrumentTrack, PatternVariant};
use super::presets::OneHandedPattern;
use super::sections::{Section, SongForm};
use crate::kit::{Instrument, KitError, KitLayout, Limb};
use crate::render::GlyphTable;
use crate::sticking::RuleConfig;

/// Errors that can occur while reading a groove file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid groove file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Groove(#[from] GrooveError),

    #[error(transparent)]
    Kit(#[from] KitError),
}

/// One bar as written in a groove file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarSpec {
    Steps(Vec<u8>),
    Preset(String),
}

impl BarSpec {
    pub fn to_pattern(&self) -> GrooveResult<BarPattern> {
        match self {
            BarSpec::Steps(steps) => Ok(BarPattern::from_steps(steps)),
            BarSpec::Preset(name) => Ok(OneHandedPattern::from_string(name)?.bar()),
        }
    }
}

/// On-disk shape of a groove file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrooveDefinition {
    #[serde(default = "default_name")]
    pub name: String,

    /// `[beats, unit]`
    pub sig: [u32; 2],

    pub bars: usize,

    /// 1 marks a counted pulse
    pub bar_grid: Vec<u8>,

    #[serde(default)]
    pub feel: GrooveFeel,

    #[serde(default)]
    pub backbeats: Option<Vec<usize>>,

    #[serde(default)]
    pub groove_type: Option<GrooveType>,

    /// Instrument -> variant key -> bars, variants in file order
    pub tracks: BTreeMap<Instrument, serde_json::Map<String, serde_json::Value>>,

    #[serde(default)]
    pub sections: Vec<Section>,

    /// Limb -> instruments it can reach
    #[serde(default)]
    pub kit: Option<BTreeMap<Limb, Vec<Instrument>>>,

    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default)]
    pub glyphs: BTreeMap<Instrument, char>,
}

fn default_name() -> String {
    "untitled".to_string()
}

/// Everything a groove file configures
#[derive(Debug, Clone)]
pub struct LoadedGroove {
    pub groove: Groove,
    pub layout: KitLayout,
    pub rules: RuleConfig,
    pub glyphs: GlyphTable,
}

impl GrooveDefinition {
    /// Validate and assemble the groove, kit and rendering setup
    pub fn build(self) -> Result<LoadedGroove, LoadError> {
        let signature = TimeSignature::new(self.sig[0], self.sig[1])?;
        let pulses = self.bar_grid.iter().map(|&step| step != 0).collect();
        let bar_grid = BarGrid::new(signature, pulses)?;

        let mut groove = Groove::new(self.name, bar_grid, self.bars)?.with_feel(self.feel);
        if let Some(backbeats) = self.backbeats {
            groove = groove.with_backbeats(backbeats);
        }
        if let Some(groove_type) = self.groove_type {
            groove = groove.with_groove_type(groove_type);
        }

        for (instrument, variants) in self.tracks {
            let mut track = InstrumentTrack::new(instrument);
            for (key, bars) in variants {
                let bars: Vec<BarSpec> = serde_json::from_value(bars)?;
                let patterns = bars
                    .iter()
                    .map(BarSpec::to_pattern)
                    .collect::<GrooveResult<Vec<_>>>()?;
                track = track.with_variant(PatternVariant::new(key, patterns));
            }
            groove = groove.with_track(track)?;
        }

        if !self.sections.is_empty() {
            let mut form = SongForm::new(self.bars);
            for section in self.sections {
                form.add_section(section);
            }
            groove = groove.with_form(form)?;
        }

        let layout = match self.kit {
            Some(reach) => KitLayout::try_from(reach)?,
            None => KitLayout::conventional(),
        };

        Ok(LoadedGroove {
            groove,
            layout,
            rules: self.rules,
            glyphs: GlyphTable::default().with_overrides(self.glyphs),
        })
    }
}

/// Parse a groove from JSON text
pub fn parse_groove(json: &str) -> Result<LoadedGroove, LoadError> {
    let definition: GrooveDefinition = serde_json::from_str(json)?;
    definition.build()
}

/// Read and parse a groove file
pub fn load_groove_file(path: impl AsRef<Path>) -> Result<LoadedGroove, LoadError> {
    let path = path.as_ref();
    log::info!("Loading groove from {}", path.display());

    let json = std::fs::read_to_string(path)?;
    let loaded = parse_groove(&json)?;

    log::info!(
        "Loaded '{}': {} bars of {}/{}, {} tracks",
        loaded.groove.name(),
        loaded.groove.bars(),
        loaded.groove.signature().beats,
        loaded.groove.signature().unit,
        loaded.groove.tracks().len()
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::Hand;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SWING: &str = r#"{
        "name": "Swing",
        "sig": [4, 4],
        "bars": 2,
        "bar_grid": [1,0,0, 1,0,0, 1,0,0, 1,0,0],
        "tracks": {
            "ride": {"0": [[1,0,0, 1,0,1, 1,0,0, 1,0,1], [1,0,0, 1,0,0, 1,0,0, 1,0,0]]},
            "hihat_foot": {"0": [[0,0,0, 1,0,0, 0,0,0, 1,0,0]]}
        },
        "rules": {"dominant_hand": "left", "backbeat_hand": "right"},
        "glyphs": {"ride": "*"}
    }"#;

    #[test]
    fn test_parse_groove() {
        let loaded = parse_groove(SWING).unwrap();

        assert_eq!(loaded.groove.name(), "Swing");
        assert_eq!(loaded.groove.bars(), 2);
        assert_eq!(loaded.groove.bar_grid().slots_per_beat(), 3);
        assert_eq!(loaded.groove.tracks().len(), 2);
        assert_eq!(loaded.layout, KitLayout::conventional());
        assert_eq!(loaded.rules.dominant_hand, Hand::Left);
        assert_eq!(loaded.glyphs.glyph(Instrument::Ride, Some(Limb::LeftHand)), '*');
        assert_eq!(loaded.glyphs.glyph(Instrument::HiHatFoot, Some(Limb::LeftFoot)), 'x');
    }

    #[test]
    fn test_preset_bars() {
        let json = r#"{
            "sig": [6, 8], "bars": 1, "bar_grid": [1,0,0,1,0,0],
            "tracks": {"ride": {"0": ["jazz_ride"]}}
        }"#;
        let loaded = parse_groove(json).unwrap();
        let track = loaded.groove.track(Instrument::Ride).unwrap();

        assert_eq!(loaded.groove.name(), "untitled");
        assert_eq!(track.variants[0].bars[0], OneHandedPattern::JazzRide.bar());

        let unknown = json.replace("jazz_ride", "bossa");
        assert!(matches!(
            parse_groove(&unknown),
            Err(LoadError::Groove(GrooveError::UnknownPreset(name))) if name == "bossa"
        ));
    }

    #[test]
    fn test_sections_select_variants() {
        let json = r#"{
            "sig": [4, 4], "bars": 4, "bar_grid": [1,0, 1,0, 1,0, 1,0],
            "tracks": {"hihat": {
                "verse": [[1,1,1,1,1,1,1,1]],
                "chorus": [[1,0,1,0,1,0,1,0]]
            }},
            "sections": [
                {"start_bar": 0, "end_bar": 2, "variants": {"hihat": "verse"}},
                {"start_bar": 2, "end_bar": 4, "groove_type": "ride_led", "variants": {"hihat": "chorus"}}
            ]
        }"#;
        let loaded = parse_groove(json).unwrap();
        let sections = loaded.groove.form().ordered();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].groove_type, Some(GrooveType::RideLed));
        assert_eq!(sections[0].variant_for(Instrument::HiHat), Some("verse"));
    }

    #[test]
    fn test_variants_keep_file_order() {
        let json = r#"{
            "sig": [4, 4], "bars": 2, "bar_grid": [1,0, 1,0, 1,0, 1,0],
            "tracks": {"snare": {
                "2": [[0,0,1,0,0,0,1,0]],
                "10": [[0,0,1,0,0,0,1,1]],
                "1": [[0,0,1,1,0,0,1,0]]
            }},
            "sections": [
                {"start_bar": 0, "end_bar": 1, "variants": {"snare": "2"}},
                {"start_bar": 1, "end_bar": 2, "variants": {"snare": "10"}}
            ]
        }"#;
        let loaded = parse_groove(json).unwrap();
        let track = loaded.groove.track(Instrument::Snare).unwrap();

        assert_eq!(track.variant_keys(), vec!["2", "10", "1"]);
    }

    #[test]
    fn test_load_errors() {
        let bad_sig = SWING.replace("[4, 4]", "[4, 5]");
        assert!(matches!(
            parse_groove(&bad_sig),
            Err(LoadError::Groove(GrooveError::InvalidTimeSignature { beats: 4, unit: 5 }))
        ));

        let short_bar = SWING.replace("[[0,0,0, 1,0,0, 0,0,0, 1,0,0]]", "[[0,0,0, 1]]");
        assert!(matches!(
            parse_groove(&short_bar),
            Err(LoadError::Groove(GrooveError::ShapeMismatch { found: 4, .. }))
        ));

        let bad_kit = SWING.replace(
            r#""glyphs""#,
            r#""kit": {"right_foot": ["kick", "hihat_foot"]}, "glyphs""#,
        );
        assert!(matches!(parse_groove(&bad_kit), Err(LoadError::Kit(_))));

        let typo = SWING.replace("\"bars\"", "\"barz\"");
        assert!(matches!(parse_groove(&typo), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_load_groove_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SWING.as_bytes()).unwrap();

        let loaded = load_groove_file(file.path()).unwrap();
        assert_eq!(loaded.groove.name(), "Swing");

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_groove_file(missing), Err(LoadError::Io(_))));
    }
}
