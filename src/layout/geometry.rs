use crate::config::OverlayConfig;
use crate::foundation::core::{FrameDimensions, Rect};
use crate::foundation::error::BrandResult;
use crate::layout::measure::{TextMeasure, TextStyle, TextWeight};
use crate::layout::wrap::wrap_lines;

const MOBILE_FONT_RATIO: f32 = 0.045;
const ADDRESS_FONT_RATIO: f32 = 0.028;
const ADDRESS_LINE_HEIGHT: f32 = 1.35;
const SIDE_PADDING_RATIO: f32 = 0.06;
const BOTTOM_MARGIN_RATIO: f32 = 0.05;
const ELEMENT_GAP_RATIO: f32 = 0.025;
const BANNER_PADDING_RATIO: f32 = 0.05;
/// Smallest banner height as a fraction of frame height.
pub const MIN_BANNER_RATIO: f32 = 0.25;

/// Text layout and banner geometry for one job. Immutable once planned.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    /// Output frame size the plan was computed for.
    pub dims: FrameDimensions,
    /// Wrapped address lines, top to bottom.
    pub address_lines: Vec<String>,
    /// Mobile number; line breaks are folded into spaces.
    pub mobile_text: String,
    /// Address font (medium weight).
    pub address_style: TextStyle,
    /// Mobile font (bold weight).
    pub mobile_style: TextStyle,
    /// Distance between consecutive address lines.
    pub line_height: f32,
    /// Top edge of the gradient banner. Negative when the text stack exceeds the frame.
    pub banner_top: f32,
    /// Top of the first address line (text is top-aligned).
    pub address_baseline_start: f32,
    /// Bottom of the mobile line (text is bottom-aligned).
    pub mobile_baseline_y: f32,
    /// Width available to the address block.
    pub max_text_width: f32,
}

impl LayoutPlan {
    /// Banner height in pixels.
    pub fn banner_height(&self) -> f32 {
        self.dims.height_f32() - self.banner_top
    }

    /// Top edge of address line `i`.
    pub fn address_line_y(&self, i: usize) -> f32 {
        self.address_baseline_start + (i as f32) * self.line_height
    }

    /// Banner rectangle in frame space (may extend above the frame).
    pub fn banner_rect(&self) -> Rect {
        Rect::new(
            0.0,
            f64::from(self.banner_top),
            f64::from(self.dims.width),
            f64::from(self.dims.height),
        )
    }

    /// First pixel row covered by the banner, clamped to the frame.
    pub fn banner_first_row(&self) -> u32 {
        let top = self.banner_top.floor().max(0.0);
        (top as u32).min(self.dims.height)
    }
}

/// Compute the layout for `config` on a frame of size `dims`.
///
/// Address lines are stacked bottom-up above the mobile line; the banner grows beyond its
/// 25% floor as needed to enclose both blocks plus padding.
#[tracing::instrument(level = "debug", skip(config, measure), fields(w = dims.width, h = dims.height))]
pub fn plan_layout(
    dims: FrameDimensions,
    config: &OverlayConfig,
    measure: &mut dyn TextMeasure,
) -> BrandResult<LayoutPlan> {
    config.validate()?;

    let w = dims.width_f32();
    let h = dims.height_f32();

    let font_size_mobile = h * MOBILE_FONT_RATIO * config.mobile_scale;
    let font_size_address = h * ADDRESS_FONT_RATIO * config.address_scale;
    let line_height = font_size_address * ADDRESS_LINE_HEIGHT;

    let side_padding = w * SIDE_PADDING_RATIO;
    let bottom_margin = h * BOTTOM_MARGIN_RATIO;
    let element_gap = h * ELEMENT_GAP_RATIO;
    let max_text_width = w - 2.0 * side_padding;

    let address_style = TextStyle::new(TextWeight::Medium, font_size_address);
    let mobile_style = TextStyle::new(TextWeight::Bold, font_size_mobile);

    let address_lines = wrap_lines(&config.address_text, max_text_width, |s| {
        measure.measure(s, address_style)
    });

    let mobile_baseline_y = h - bottom_margin;
    let address_baseline_start = mobile_baseline_y
        - font_size_mobile
        - element_gap
        - (address_lines.len() as f32) * line_height
        + font_size_address;

    let tallest = font_size_mobile.max(font_size_address);
    let stack_height =
        (mobile_baseline_y - address_baseline_start) + tallest + h * BANNER_PADDING_RATIO;
    let banner_height = (h * MIN_BANNER_RATIO).max(stack_height);
    let banner_top = h - banner_height;

    tracing::debug!(
        lines = address_lines.len(),
        banner_height,
        font_size_address,
        font_size_mobile,
        "planned overlay layout"
    );

    Ok(LayoutPlan {
        dims,
        address_lines,
        mobile_text: config.mobile_text.replace(['\r', '\n'], " "),
        address_style,
        mobile_style,
        line_height,
        banner_top,
        address_baseline_start,
        mobile_baseline_y,
        max_text_width,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
