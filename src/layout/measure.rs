/// Font weight used by the two overlay fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextWeight {
    /// Weight 500, used for the address block.
    Medium,
    /// Weight 700, used for the mobile number.
    Bold,
}

impl TextWeight {
    /// CSS-style numeric weight.
    pub fn value(self) -> u16 {
        match self {
            Self::Medium => 500,
            Self::Bold => 700,
        }
    }
}

/// Font settings a measurement is bound to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Face weight.
    pub weight: TextWeight,
    /// Font size in pixels.
    pub size_px: f32,
}

impl TextStyle {
    /// Create a style.
    pub fn new(weight: TextWeight, size_px: f32) -> Self {
        Self { weight, size_px }
    }
}

/// Measures the advance width of a single line of text.
pub trait TextMeasure {
    /// Width in pixels of `text` rendered with `style` on one line.
    fn measure(&mut self, text: &str, style: TextStyle) -> f32;
}

impl<F> TextMeasure for F
where
    F: FnMut(&str, TextStyle) -> f32,
{
    fn measure(&mut self, text: &str, style: TextStyle) -> f32 {
        self(text, style)
    }
}
