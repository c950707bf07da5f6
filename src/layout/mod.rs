//! Text wrapping and banner geometry, computed once per job.

/// Banner and baseline planning.
pub mod geometry;
/// Text style and measurement seam.
pub mod measure;
/// Greedy word wrapping.
pub mod wrap;
