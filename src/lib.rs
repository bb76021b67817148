// Groovetab - Drum grooves to sticking-annotated ASCII tablature
// Module declarations and the one-call entry point used by the binary

pub mod groove;
pub mod kit;
pub mod pipeline;
pub mod render;
pub mod sticking;

use std::path::Path;

pub use groove::{load_groove_file, parse_groove, Groove, GrooveError, LoadedGroove};
pub use kit::{Hand, Instrument, KitLayout, Limb};
pub use pipeline::{perform, perform_loaded, Performance, PipelineError, PipelineResult};
pub use render::{GlyphTable, RenderOptions, Tablature};
pub use sticking::{assign, AssignedGrid, RuleSet, StickingError};

/// What to print for a groove file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub render: RenderOptions,

    /// Append one JSON line per hand decision
    pub explain: bool,
}

/// Load a groove file and produce the text to print
pub fn run_file(path: impl AsRef<Path>, options: RunOptions) -> PipelineResult<String> {
    let loaded = load_groove_file(path)?;
    let performance = perform_loaded(&loaded, options.render)?;

    let mut output = performance.tablature.to_string();
    if options.explain {
        for decision in performance.assigned.hand_decisions() {
            output.push_str(&decision.to_json_line()?);
        }
    }

    Ok(output)
}
