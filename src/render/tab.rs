// Tablature Renderer - ASCII drum tab from an assigned grid
// One row per instrument, `|` between bars, every row the same width

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::groove::{BarGrid, GrooveError};
use crate::kit::{Instrument, KitLayout, Limb};
use crate::sticking::AssignedGrid;

/// Glyph drawn for a silent slot
pub const SILENCE: char = '.';

/// Bar separator
pub const BAR_LINE: char = '|';

/// Characters drawn for played notes
///
/// Hand notes show the hand letter unless the instrument has its own glyph;
/// pedals default to `o` (kick) and `x` (hi-hat foot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphTable {
    #[serde(default)]
    pub instruments: BTreeMap<Instrument, char>,

    #[serde(default = "default_silence")]
    pub silence: char,
}

fn default_silence() -> char {
    SILENCE
}

impl GlyphTable {
    pub fn new() -> Self {
        GlyphTable {
            instruments: BTreeMap::from([(Instrument::Kick, 'o'), (Instrument::HiHatFoot, 'x')]),
            silence: SILENCE,
        }
    }

    /// Layer per-instrument glyphs over the defaults
    pub fn with_overrides(mut self, overrides: BTreeMap<Instrument, char>) -> Self {
        self.instruments.extend(overrides);
        self
    }

    /// Glyph for one slot of an instrument row
    pub fn glyph(&self, instrument: Instrument, limb: Option<Limb>) -> char {
        match limb {
            None => self.silence,
            Some(limb) => self
                .instruments
                .get(&instrument)
                .copied()
                .unwrap_or_else(|| limb.letter()),
        }
    }
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Which rows to draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Draw every kit instrument, not only those that play
    pub all_rows: bool,
}

/// One rendered instrument row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabLine {
    pub instrument: Instrument,
    pub label: String,
    pub text: String,
}

/// Rendered tablature: a count header plus one line per instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tablature {
    pub header: String,
    pub lines: Vec<TabLine>,
}

impl Tablature {
    /// Look up a row by its display label
    pub fn line(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.text.as_str())
    }

    /// Width in characters shared by every line
    pub fn width(&self) -> usize {
        self.header.chars().count()
    }

    /// Label to line text, in row order
    pub fn by_label(&self) -> Vec<(&str, &str)> {
        self.lines
            .iter()
            .map(|line| (line.label.as_str(), line.text.as_str()))
            .collect()
    }
}

impl fmt::Display for Tablature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Width of the label column, wide enough for every instrument
fn label_width() -> usize {
    Instrument::ALL
        .iter()
        .map(|instrument| instrument.label().len())
        .max()
        .unwrap_or(0)
        + 2
}

fn bar_lines(cells: impl Iterator<Item = char>, slots_per_bar: usize) -> String {
    let mut text = String::from(BAR_LINE);
    for (slot, cell) in cells.enumerate() {
        text.push(cell);
        if (slot + 1) % slots_per_bar == 0 {
            text.push(BAR_LINE);
        }
    }
    text
}

/// Render an assigned grid as fixed-width tablature
pub fn render(
    grid: &AssignedGrid,
    layout: &KitLayout,
    bar_grid: &BarGrid,
    glyphs: &GlyphTable,
    options: RenderOptions,
) -> Result<Tablature, GrooveError> {
    let slots_per_bar = grid.beat_map.slots_per_bar;
    if bar_grid.len() != slots_per_bar || slots_per_bar == 0 {
        return Err(GrooveError::ShapeMismatch {
            instrument: "bar_grid".to_string(),
            bar: 0,
            expected: slots_per_bar,
            found: bar_grid.len(),
        });
    }

    let width = label_width();
    let count = bar_grid.count_line();
    let header = format!(
        "{:width$}{}",
        "",
        bar_lines(count.chars().cycle().take(grid.total_slots()), slots_per_bar),
        width = width
    );

    let rows: BTreeSet<Instrument> = if options.all_rows {
        layout
            .instruments()
            .into_iter()
            .chain(grid.tracks.keys().copied())
            .collect()
    } else {
        grid.tracks
            .iter()
            .filter(|(_, slots)| slots.iter().any(Option::is_some))
            .map(|(instrument, _)| *instrument)
            .collect()
    };

    let silent = vec![None; grid.total_slots()];
    let lines = rows
        .into_iter()
        .map(|instrument| {
            let slots = grid.tracks.get(&instrument).unwrap_or(&silent);
            let cells = slots.iter().map(|limb| glyphs.glyph(instrument, *limb));
            let label = instrument.label().to_string();
            let text = format!(
                "{:width$}{}",
                format!("{}:", label),
                bar_lines(cells, slots_per_bar),
                width = width
            );
            TabLine {
                instrument,
                label,
                text,
            }
        })
        .collect();

    Ok(Tablature { header, lines })
}
