// Render - Text output for assigned grooves
// Fixed-width ASCII tablature; no audio or notation engraving

pub mod tab;

pub use tab::{render, GlyphTable, RenderOptions, TabLine, Tablature};
