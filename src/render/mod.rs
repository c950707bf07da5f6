//! CPU rasterization: frame surface, overlay band and per-frame compositing.

/// Separable gaussian blur for text shadows.
pub mod blur;
/// Per-frame compositor.
pub mod compositor;
/// Prerendered gradient band with shadowed text.
pub mod overlay;
/// Output-sized premultiplied RGBA8 surface.
pub mod surface;
