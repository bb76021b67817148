// Pattern Expander - Unrolls cyclic pattern variants into flat song-length grids
// Variants repeat from their first bar and are truncated at the song end

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::grid::BeatMap;
use super::model::{Groove, GrooveError, GrooveResult, GrooveType, InstrumentTrack, PatternVariant};
use crate::kit::Instrument;

/// Flat event grids for every instrument, all `bars * slots_per_bar` long
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatGrids {
    /// Slot structure shared by every track
    pub beat_map: BeatMap,

    /// Number of bars covered
    pub bars: usize,

    /// Active (`true`) or silent per slot, keyed by instrument
    pub tracks: BTreeMap<Instrument, Vec<bool>>,
}

impl FlatGrids {
    /// Create empty grids for a song of `bars` bars
    pub fn new(beat_map: BeatMap, bars: usize) -> Self {
        FlatGrids {
            beat_map,
            bars,
            tracks: BTreeMap::new(),
        }
    }

    /// Add (or replace) one instrument's flat grid
    pub fn with_track(mut self, instrument: Instrument, slots: Vec<bool>) -> Self {
        self.tracks.insert(instrument, slots);
        self
    }

    /// Total number of slots in the song
    pub fn total_slots(&self) -> usize {
        self.bars * self.beat_map.slots_per_bar
    }

    /// Count the events an instrument plays within a bar range
    pub fn event_count(&self, instrument: Instrument, start_bar: usize, end_bar: usize) -> usize {
        let spb = self.beat_map.slots_per_bar;
        self.tracks
            .get(&instrument)
            .map(|slots| {
                slots
                    .iter()
                    .skip(start_bar * spb)
                    .take(end_bar.saturating_sub(start_bar) * spb)
                    .filter(|&&active| active)
                    .count()
            })
            .unwrap_or(0)
    }
}

/// Expand one variant to exactly `total_bars` bars
///
/// The variant cycles from its first bar. When `total_bars` is not a multiple
/// of the variant length, the trailing bars of the last cycle are dropped
/// rather than padded with silence.
pub fn expand(
    instrument: Instrument,
    variant: &PatternVariant,
    total_bars: usize,
    slots_per_bar: usize,
) -> GrooveResult<Vec<bool>> {
    if variant.is_empty() {
        return Err(GrooveError::EmptyPattern {
            instrument: instrument.to_string().to_string(),
            variant: variant.key.clone(),
        });
    }

    if let Some((bar, pattern)) = variant
        .bars
        .iter()
        .enumerate()
        .find(|(_, pattern)| pattern.len() != slots_per_bar)
    {
        return Err(GrooveError::ShapeMismatch {
            instrument: instrument.to_string().to_string(),
            bar,
            expected: slots_per_bar,
            found: pattern.len(),
        });
    }

    Ok(variant
        .bars
        .iter()
        .cycle()
        .take(total_bars)
        .flat_map(|pattern| pattern.slots().iter().copied())
        .collect())
}

/// Expand a track for one bar range, picking the variant by key
///
/// A selected variant restarts at `start_bar`. Without a key the track must
/// hold exactly one variant, which keeps cycling from the first bar of the
/// song; several variants and no selection is an error.
pub fn expand_track(
    track: &InstrumentTrack,
    key: Option<&str>,
    start_bar: usize,
    bars: usize,
    slots_per_bar: usize,
) -> GrooveResult<Vec<bool>> {
    let (variant, offset) = match key {
        Some(key) => (track.variant(key)?, 0),
        None => {
            let sole = track
                .sole_variant()
                .ok_or_else(|| GrooveError::MissingVariantSelection {
                    instrument: track.instrument.to_string().to_string(),
                    bar: start_bar,
                })?;
            (sole, start_bar)
        }
    };

    let mut slots = expand(track.instrument, variant, offset + bars, slots_per_bar)?;
    Ok(slots.split_off(offset * slots_per_bar))
}

/// Expand every track of a groove across its song form
pub fn expand_groove(groove: &Groove) -> GrooveResult<FlatGrids> {
    groove.validate()?;

    let beat_map = groove
        .bar_grid()
        .beat_map(groove.feel(), groove.backbeats())?;
    let slots_per_bar = beat_map.slots_per_bar;
    let sections = groove.form().ordered();

    for section in &sections {
        if let Some((instrument, key)) = section
            .variants
            .iter()
            .find(|(instrument, _)| groove.track(**instrument).is_none())
        {
            return Err(GrooveError::UnknownVariantKey {
                instrument: instrument.to_string().to_string(),
                key: key.clone(),
            });
        }
    }

    let mut grids = FlatGrids::new(beat_map, groove.bars());
    for (instrument, track) in groove.tracks() {
        let mut slots = Vec::with_capacity(groove.bars() * slots_per_bar);
        for section in &sections {
            let expanded = expand_track(
                track,
                section.variant_for(*instrument),
                section.start_bar,
                section.length_bars(),
                slots_per_bar,
            )?;
            slots.extend(expanded);
        }

        log::debug!(
            "Expanded {} to {} slots ({} events)",
            instrument.label(),
            slots.len(),
            slots.iter().filter(|&&active| active).count()
        );
        grids.tracks.insert(*instrument, slots);
    }

    Ok(grids)
}

/// Groove type for every bar
///
/// A section's own type wins, then the groove-wide type; otherwise the section
/// is classified by whether ride or hi-hat events dominate it.
pub fn resolve_groove_types(groove: &Groove, grids: &FlatGrids) -> Vec<GrooveType> {
    let mut per_bar = Vec::with_capacity(groove.bars());
    for section in groove.form().ordered() {
        let groove_type = section
            .groove_type
            .or(groove.groove_type())
            .unwrap_or_else(|| {
                GrooveType::infer(
                    grids.event_count(Instrument::HiHat, section.start_bar, section.end_bar),
                    grids.event_count(Instrument::Ride, section.start_bar, section.end_bar),
                )
            });
        per_bar.extend(std::iter::repeat(groove_type).take(section.length_bars()));
    }
    per_bar
}
