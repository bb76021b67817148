// Sticking - Limb assignment for expanded grooves
// Rules decide hands, the kit pins feet, the engine resolves each slot

pub mod engine;
pub mod explain;
pub mod rudiments;
pub mod rules;

pub use engine::{assign, assign_sections, AssignedGrid, StickingError, StickingResult};
pub use explain::{to_json_lines, StickingDecision};
pub use rudiments::{get_rudiment, list_rudiment_names, Rudiment, Stroke};
pub use rules::{Handedness, RuleConfig, RuleSet, SlotContext, StickingRule};
