use crate::config::OverlayConfig;
use crate::foundation::core::FrameDimensions;
use crate::foundation::error::BrandResult;
use crate::layout::geometry::{LayoutPlan, plan_layout};
use crate::media::source::SourceFrame;
use crate::render::overlay::OverlayLayer;
use crate::render::surface::RasterSurface;
use crate::text::fonts::FontSet;
use crate::text::shaper::TextShaper;

/// Draws each source frame plus the job's overlay onto one reusable surface.
pub struct FrameCompositor {
    surface: RasterSurface,
    overlay: OverlayLayer,
    frames: u64,
}

impl FrameCompositor {
    /// Pair an output surface of `dims` with a prerendered overlay band.
    pub fn new(dims: FrameDimensions, overlay: OverlayLayer) -> BrandResult<Self> {
        Ok(Self {
            surface: RasterSurface::new(dims)?,
            overlay,
            frames: 0,
        })
    }

    /// Plan the layout and prerender the overlay for one job.
    pub fn prepare(
        dims: FrameDimensions,
        config: &OverlayConfig,
        fonts: &FontSet,
    ) -> BrandResult<(LayoutPlan, Self)> {
        let mut shaper = TextShaper::new(fonts)?;
        let plan = plan_layout(dims, config, &mut shaper)?;
        let overlay = OverlayLayer::render(&plan, &mut shaper)?;
        let compositor = Self::new(dims, overlay)?;
        Ok((plan, compositor))
    }

    /// Blit `frame` scaled to the surface, then composite the overlay band over it.
    pub fn composite(&mut self, frame: &SourceFrame) -> BrandResult<()> {
        self.surface.blit_scaled(frame)?;
        let dims = self.surface.dims();
        self.overlay.composite_onto(self.surface.data_mut(), dims)?;
        self.frames += 1;
        Ok(())
    }

    /// The output surface.
    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// Number of frames composited so far.
    pub fn frames_composited(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
