// Pipeline - Groove to tablature, end to end
// Expand, classify, assign limbs, render; one log line per stage

use thiserror::Error;

use crate::groove::{
    expand_groove, resolve_groove_types, FlatGrids, Groove, GrooveError, GrooveType, LoadError,
    LoadedGroove,
};
use crate::kit::{KitError, KitLayout};
use crate::render::{render, GlyphTable, RenderOptions, Tablature};
use crate::sticking::{assign_sections, AssignedGrid, RuleSet, StickingError};

/// Any failure between reading a groove and printing its tablature
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Groove(#[from] GrooveError),

    #[error(transparent)]
    Kit(#[from] KitError),

    #[error(transparent)]
    Sticking(#[from] StickingError),

    #[error("Failed to serialize decisions: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    /// Error kind name, as printed by the command line
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Load(LoadError::Io(_)) => "Io",
            PipelineError::Load(LoadError::Json(_)) => "Json",
            PipelineError::Load(LoadError::Groove(e)) | PipelineError::Groove(e) => {
                groove_category(e)
            }
            PipelineError::Load(LoadError::Kit(_)) | PipelineError::Kit(_) => "InvalidKitLayout",
            PipelineError::Sticking(e) => match e {
                StickingError::UnplayableChord { .. } => "UnplayableChord",
                StickingError::ShapeMismatch { .. } => "ShapeMismatch",
                StickingError::Kit(_) => "InvalidKitLayout",
                StickingError::UnknownRudiment(_) => "UnknownRudiment",
            },
            PipelineError::Serialize(_) => "Json",
        }
    }
}

fn groove_category(error: &GrooveError) -> &'static str {
    match error {
        GrooveError::ShapeMismatch { .. } => "ShapeMismatch",
        GrooveError::EmptyPattern { .. } => "EmptyPattern",
        GrooveError::UnknownVariantKey { .. } => "UnknownVariantKey",
        GrooveError::MissingVariantSelection { .. } => "MissingVariantSelection",
        GrooveError::InvalidTimeSignature { .. } => "InvalidTimeSignature",
        GrooveError::InvalidBarCount { .. } => "InvalidBarCount",
        GrooveError::NoBars => "NoBars",
        GrooveError::InvalidSections(_) => "InvalidSections",
        GrooveError::UnknownPreset(_) => "UnknownPreset",
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Every intermediate product of one run
#[derive(Debug, Clone)]
pub struct Performance {
    pub grids: FlatGrids,

    /// Groove type in force for each bar
    pub groove_types: Vec<GrooveType>,

    pub assigned: AssignedGrid,
    pub tablature: Tablature,
}

/// Run a groove through expansion, sticking and rendering
pub fn perform(
    groove: &Groove,
    layout: &KitLayout,
    rules: &RuleSet,
    glyphs: &GlyphTable,
    options: RenderOptions,
) -> PipelineResult<Performance> {
    layout.validate()?;

    let grids = expand_groove(groove)?;
    log::info!(
        "Expanded '{}': {} tracks over {} slots",
        groove.name(),
        grids.tracks.len(),
        grids.total_slots()
    );
    for (instrument, slots) in &grids.tracks {
        if !slots.iter().any(|&active| active) {
            log::warn!("{} has a track but never plays", instrument.label());
        }
    }

    let groove_types = resolve_groove_types(groove, &grids);
    log::info!(
        "Groove types by bar: {}",
        groove_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let assigned = assign_sections(&grids, layout, rules, &groove_types)?;
    log::info!(
        "Assigned {} events ({} by hand) with rules [{}]",
        assigned.decisions.len(),
        assigned.hand_decisions().count(),
        rules.rule_names().join(", ")
    );

    let tablature = render(&assigned, layout, groove.bar_grid(), glyphs, options)?;
    log::info!("Rendered {} tab lines", tablature.lines.len());

    Ok(Performance {
        grids,
        groove_types,
        assigned,
        tablature,
    })
}

/// Perform a groove exactly as its file configures it
pub fn perform_loaded(loaded: &LoadedGroove, options: RenderOptions) -> PipelineResult<Performance> {
    let rules = RuleSet::from_config(&loaded.rules)?;
    perform(&loaded.groove, &loaded.layout, &rules, &loaded.glyphs, options)
}
