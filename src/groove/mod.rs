// Groove - Declarative drum grooves and their expansion to flat grids
// Time signatures, bar grids, variant libraries, song form, file loading

pub mod expand;
pub mod grid;
pub mod loader;
pub mod model;
pub mod presets;
pub mod sections;

pub use expand::{expand, expand_groove, expand_track, resolve_groove_types, FlatGrids};
pub use grid::{BarGrid, BeatMap, GridPosition, GrooveFeel, Meter, TimeSignature};
pub use loader::{load_groove_file, parse_groove, LoadError, LoadedGroove};
pub use model::{BarPattern, Groove, GrooveError, GrooveResult, GrooveType, InstrumentTrack, PatternVariant};
pub use presets::{list_preset_names, OneHandedPattern};
pub use sections::{Section, SongForm};
