//! linesetter
//!
//! Text layout for a variable-font editor: parsing typed text into glyph
//! references, shaping, variable kerning with undoable edit sessions, and
//! positioning lines of glyphs.
pub mod core;
pub mod data;
pub mod kerning;
pub mod layout;
pub mod logging;
pub mod shaping;
pub mod text;
pub mod variation;
