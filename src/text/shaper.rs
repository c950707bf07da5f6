use std::borrow::Cow;
use std::ops::Range;

use crate::foundation::error::{BrandError, BrandResult};
use crate::layout::measure::{TextMeasure, TextStyle, TextWeight};
use crate::text::fonts::{FontFace, FontSet};

/// One glyph positioned relative to the line origin (x) and baseline (y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// Glyph id in the face.
    pub id: u32,
    /// Horizontal offset from the line start.
    pub x: f32,
    /// Vertical offset from the baseline.
    pub y: f32,
}

/// Glyphs of one line that were shaped against the same font.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphSpan {
    /// Face the glyph ids belong to.
    pub font: vello_cpu::peniko::FontData,
    /// Slice of [`ShapedLine::glyphs`].
    pub range: Range<usize>,
}

/// A single shaped line ready for rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedLine {
    /// Glyphs in visual order.
    pub glyphs: Vec<PlacedGlyph>,
    /// Font runs covering `glyphs`, in order.
    pub spans: Vec<GlyphSpan>,
    /// Advance width of the line.
    pub width: f32,
    /// Distance from the baseline up to the top of the line box.
    pub ascent: f32,
    /// Distance from the baseline down to the bottom of the line box.
    pub descent: f32,
    /// Style the line was shaped with.
    pub style: TextStyle,
}

struct RegisteredFace {
    family: String,
}

/// Parley-backed shaper bound to one [`FontSet`].
///
/// Implements [`TextMeasure`], so the same engine measures during wrapping and shapes for
/// drawing; both passes therefore agree on widths. Only the two registered faces take part in
/// shaping: characters they lack shape to the missing-glyph id instead of an installed font.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    medium: RegisteredFace,
    bold: RegisteredFace,
}

impl TextShaper {
    /// Register both faces of `fonts` with a fresh font context.
    pub fn new(fonts: &FontSet) -> BrandResult<Self> {
        let mut font_ctx = parley::FontContext {
            collection: parley::fontique::Collection::new(parley::fontique::CollectionOptions {
                shared: false,
                system_fonts: false,
            }),
            source_cache: parley::fontique::SourceCache::default(),
        };
        let medium = register_face(&mut font_ctx, fonts.face(TextWeight::Medium))?;
        let bold = register_face(&mut font_ctx, fonts.face(TextWeight::Bold))?;
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            medium,
            bold,
        })
    }

    fn registered(&self, weight: TextWeight) -> &RegisteredFace {
        match weight {
            TextWeight::Medium => &self.medium,
            TextWeight::Bold => &self.bold,
        }
    }

    fn layout(&mut self, text: &str, style: TextStyle) -> BrandResult<parley::Layout<()>> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(BrandError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family = self.registered(style.weight).family.clone();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.weight.value())),
        ));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Shape `text` as one line.
    pub fn shape_line(&mut self, text: &str, style: TextStyle) -> BrandResult<ShapedLine> {
        let layout = self.layout(text, style)?;

        let mut glyphs = Vec::new();
        let mut spans: Vec<GlyphSpan> = Vec::new();
        let mut ascent = 0.0f32;
        let mut descent = 0.0f32;
        if let Some(line) = layout.lines().next() {
            let metrics = line.metrics();
            ascent = metrics.ascent;
            descent = metrics.descent;
            let baseline = metrics.baseline;
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let start = glyphs.len();
                glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                }));
                if glyphs.len() == start {
                    continue;
                }
                let font = run.run().font();
                match spans.last_mut() {
                    Some(last) if last.font == *font && last.range.end == start => {
                        last.range.end = glyphs.len();
                    }
                    _ => spans.push(GlyphSpan {
                        font: font.clone(),
                        range: start..glyphs.len(),
                    }),
                }
            }
        }

        Ok(ShapedLine {
            glyphs,
            spans,
            width: layout.width(),
            ascent,
            descent,
            style,
        })
    }
}

impl TextMeasure for TextShaper {
    fn measure(&mut self, text: &str, style: TextStyle) -> f32 {
        match self.layout(text, style) {
            Ok(layout) => layout.width(),
            Err(_) => 0.0,
        }
    }
}

fn register_face(
    font_ctx: &mut parley::FontContext,
    face: &FontFace,
) -> BrandResult<RegisteredFace> {
    let families = font_ctx.collection.register_fonts(
        parley::fontique::Blob::from(face.bytes.as_ref().clone()),
        None,
    );
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| BrandError::resource("no font families registered from font bytes"))?;
    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| BrandError::resource("registered font family has no name"))?
        .to_string();
    Ok(RegisteredFace { family })
}

#[cfg(test)]
#[path = "../../tests/unit/text/shaper.rs"]
mod tests;
