//! Font resolution and glyph shaping for the overlay text.

/// Medium/bold face resolution.
pub mod fonts;
/// Parley-backed line shaping and measurement.
pub mod shaper;
