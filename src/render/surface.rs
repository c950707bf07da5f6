use std::sync::Arc;

use crate::foundation::core::{Affine, FrameDimensions, Rect};
use crate::foundation::error::{BrandError, BrandResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::media::source::SourceFrame;

/// Reusable output-sized raster surface holding premultiplied RGBA8.
///
/// Mutated only by the compositor and read by the capture clock between composites.
pub struct RasterSurface {
    dims: FrameDimensions,
    pixmap: vello_cpu::Pixmap,
    ctx: Option<vello_cpu::RenderContext>,
}

impl RasterSurface {
    /// Allocate a transparent surface of `dims`.
    pub fn new(dims: FrameDimensions) -> BrandResult<Self> {
        if dims.width > FrameDimensions::MAX_SIDE || dims.height > FrameDimensions::MAX_SIDE {
            return Err(BrandError::resource(format!(
                "cannot allocate a {}x{} raster surface",
                dims.width, dims.height
            )));
        }
        Ok(Self {
            dims,
            pixmap: vello_cpu::Pixmap::new(dims.width_u16(), dims.height_u16()),
            ctx: None,
        })
    }

    /// Surface size.
    pub fn dims(&self) -> FrameDimensions {
        self.dims
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data_mut().fill(0);
    }

    /// Draw `frame` scaled to fill the whole surface, replacing previous contents.
    ///
    /// Frames that already match the surface size are copied without resampling.
    pub fn blit_scaled(&mut self, frame: &SourceFrame) -> BrandResult<()> {
        let expected = (frame.width as usize)
            .saturating_mul(frame.height as usize)
            .saturating_mul(4);
        if frame.width == 0 || frame.height == 0 || frame.rgba.len() != expected {
            return Err(BrandError::validation(format!(
                "source frame {}x{} carries {} bytes, expected {expected}",
                frame.width,
                frame.height,
                frame.rgba.len()
            )));
        }

        if frame.width == self.dims.width && frame.height == self.dims.height {
            let dst = self.data_mut();
            dst.copy_from_slice(&frame.rgba);
            premultiply_rgba8_in_place(dst);
            return Ok(());
        }

        let image = rgba_straight_to_image_premul(&frame.rgba, frame.width, frame.height)?;
        let sx = f64::from(self.dims.width) / f64::from(frame.width);
        let sy = f64::from(self.dims.height) / f64::from(frame.height);
        let (w, h) = (self.dims.width_u16(), self.dims.height_u16());

        let ctx = self
            .ctx
            .get_or_insert_with(|| vello_cpu::RenderContext::new(w, h));
        ctx.reset();
        ctx.set_transform(affine_to_cpu(Affine::scale_non_uniform(sx, sy)));
        ctx.set_paint(image);
        ctx.fill_rect(&rect_to_cpu(Rect::new(
            0.0,
            0.0,
            f64::from(frame.width),
            f64::from(frame.height),
        )));
        ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> BrandResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BrandError::resource("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BrandError::resource("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(BrandError::validation("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn rgba_straight_to_image_premul(
    bytes_rgba: &[u8],
    width: u32,
    height: u32,
) -> BrandResult<vello_cpu::Image> {
    let mut tmp = bytes_rgba.to_vec();
    premultiply_rgba8_in_place(&mut tmp);
    let pixmap = pixmap_from_premul_bytes(&tmp, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
