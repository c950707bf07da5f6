use crate::foundation::core::FrameDimensions;
use crate::foundation::error::{BrandError, BrandResult};
use crate::foundation::math::premul_over_in_place;
use crate::layout::geometry::LayoutPlan;
use crate::render::blur::{blur_rgba8_premul, shadow_kernel};
use crate::text::shaper::{ShapedLine, TextShaper};

/// Banner gradient stops as `(offset, black alpha)`, offset 0 at the banner top.
pub const GRADIENT_STOPS: [(f32, f32); 4] = [(0.0, 0.0), (0.2, 0.6), (0.6, 0.85), (1.0, 0.95)];

/// Soft drop shadow behind a text block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextShadow {
    /// Canvas-style blur length in pixels.
    pub blur_px: f32,
    /// Shadow offset in pixels.
    pub offset: (f32, f32),
}

/// Shadow behind the address lines.
pub const ADDRESS_SHADOW: TextShadow = TextShadow {
    blur_px: 4.0,
    offset: (0.0, 0.0),
};
/// Shadow behind the mobile number.
pub const MOBILE_SHADOW: TextShadow = TextShadow {
    blur_px: 8.0,
    offset: (0.0, 2.0),
};

const TEXT_RGBA: [u8; 4] = [255, 255, 255, 255];
const SHADOW_RGBA: [u8; 4] = [0, 0, 0, 255];

/// Black alpha of the banner gradient at `t` in `[0, 1]` (0 = banner top).
pub fn gradient_alpha_at(t: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    for pair in GRADIENT_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            let u = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
            return a0 + (a1 - a0) * u;
        }
    }
    GRADIENT_STOPS[GRADIENT_STOPS.len() - 1].1
}

struct TextPlacement<'a> {
    line: &'a ShapedLine,
    /// Left edge of the line and its baseline, in band coordinates.
    origin: (f32, f32),
}

/// The static part of the overlay, rasterized once per job.
///
/// Covers the frame rows from the banner top to the bottom edge: gradient, then both shadows
/// and text blocks in draw order. Compositing the band over a frame is equivalent to drawing
/// the four layers onto that frame directly.
#[derive(Clone, Debug)]
pub struct OverlayLayer {
    width: u32,
    top: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

impl OverlayLayer {
    /// Rasterize the band for `plan`.
    #[tracing::instrument(level = "debug", skip_all, fields(w = plan.dims.width, h = plan.dims.height))]
    pub fn render(plan: &LayoutPlan, shaper: &mut TextShaper) -> BrandResult<Self> {
        let dims = plan.dims;
        let top = plan.banner_first_row();
        let height = dims.height - top;
        let mut band = Self {
            width: dims.width,
            top,
            height,
            rgba8_premul: vec![0u8; (dims.width as usize) * (height as usize) * 4],
        };
        if height == 0 {
            return Ok(band);
        }

        band.paint_gradient(plan);

        let center_x = dims.width_f32() / 2.0;
        let band_top = top as f32;

        let address_lines = plan
            .address_lines
            .iter()
            .map(|l| shaper.shape_line(l, plan.address_style))
            .collect::<BrandResult<Vec<_>>>()?;
        let address_placements: Vec<TextPlacement<'_>> = address_lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.glyphs.is_empty())
            .map(|(i, line)| TextPlacement {
                line,
                // Top-aligned: the line box starts at the planned y.
                origin: (
                    center_x - line.width / 2.0,
                    plan.address_line_y(i) + line.ascent - band_top,
                ),
            })
            .collect();

        let mobile_line = shaper.shape_line(&plan.mobile_text, plan.mobile_style)?;
        let mobile_placements: Vec<TextPlacement<'_>> = if mobile_line.glyphs.is_empty() {
            Vec::new()
        } else {
            // Bottom-aligned: the line box ends at the planned y.
            vec![TextPlacement {
                line: &mobile_line,
                origin: (
                    center_x - mobile_line.width / 2.0,
                    plan.mobile_baseline_y - mobile_line.descent - band_top,
                ),
            }]
        };

        band.draw_text_block(&address_placements, ADDRESS_SHADOW)?;
        band.draw_text_block(&mobile_placements, MOBILE_SHADOW)?;

        tracing::debug!(top, height, "overlay band rendered");
        Ok(band)
    }

    /// First frame row covered by the band.
    pub fn top(&self) -> u32 {
        self.top
    }

    /// Number of rows in the band.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Band pixels, premultiplied RGBA8.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    /// Composite the band over a full frame of premultiplied RGBA8.
    pub fn composite_onto(&self, frame: &mut [u8], dims: FrameDimensions) -> BrandResult<()> {
        if dims.width != self.width || frame.len() != dims.rgba8_len() {
            return Err(BrandError::validation(
                "overlay band does not match the frame size",
            ));
        }
        let start = (self.top as usize) * (self.width as usize) * 4;
        let dst = frame
            .get_mut(start..start + self.rgba8_premul.len())
            .ok_or_else(|| BrandError::validation("overlay band exceeds the frame"))?;
        if !premul_over_in_place(dst, &self.rgba8_premul) {
            return Err(BrandError::validation("overlay band length mismatch"));
        }
        Ok(())
    }

    fn paint_gradient(&mut self, plan: &LayoutPlan) {
        let banner_top = plan.banner_top;
        let banner_height = plan.banner_height().max(f32::EPSILON);
        let row_len = (self.width as usize) * 4;
        for (row, px_row) in self.rgba8_premul.chunks_exact_mut(row_len).enumerate() {
            let y = (self.top as usize + row) as f32 + 0.5;
            let alpha = gradient_alpha_at((y - banner_top) / banner_height);
            let a = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
            for px in px_row.chunks_exact_mut(4) {
                px.copy_from_slice(&[0, 0, 0, a]);
            }
        }
    }

    fn draw_text_block(
        &mut self,
        placements: &[TextPlacement<'_>],
        shadow: TextShadow,
    ) -> BrandResult<()> {
        if placements.is_empty() {
            return Ok(());
        }

        let shadow_layer = self.rasterize_glyphs(placements, SHADOW_RGBA, shadow.offset)?;
        let (radius, sigma) = shadow_kernel(shadow.blur_px);
        let shadow_layer = if radius > 0 {
            blur_rgba8_premul(&shadow_layer, self.width, self.height, radius, sigma)?
        } else {
            shadow_layer
        };
        premul_over_in_place(&mut self.rgba8_premul, &shadow_layer);

        let text_layer = self.rasterize_glyphs(placements, TEXT_RGBA, (0.0, 0.0))?;
        premul_over_in_place(&mut self.rgba8_premul, &text_layer);
        Ok(())
    }

    fn rasterize_glyphs(
        &self,
        placements: &[TextPlacement<'_>],
        rgba: [u8; 4],
        offset: (f32, f32),
    ) -> BrandResult<Vec<u8>> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| BrandError::resource("overlay width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| BrandError::resource("overlay height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        for p in placements {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(p.origin.0 + offset.0),
                f64::from(p.origin.1 + offset.1),
            )));
            for span in &p.line.spans {
                let Some(run) = p.line.glyphs.get(span.range.clone()) else {
                    continue;
                };
                let glyphs = run.iter().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&span.font)
                    .font_size(p.line.style.size_px)
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
