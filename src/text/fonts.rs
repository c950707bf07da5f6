use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FONT_DIR_ENV;
use crate::foundation::error::{BrandError, BrandResult};
use crate::layout::measure::TextWeight;

/// Preferred family names, tried in order before falling back to any face.
const PREFERRED_FAMILIES: &[&str] = &["Inter", "DejaVu Sans", "Liberation Sans", "Noto Sans"];

/// Raw bytes of one font face.
#[derive(Clone, Debug)]
pub struct FontFace {
    /// Font file bytes (may be a collection).
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection; 0 for single-face files.
    pub index: u32,
}

impl FontFace {
    /// Load a single-face font file.
    pub fn from_path(path: &Path) -> BrandResult<Self> {
        use anyhow::Context as _;
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Wrap in-memory font bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            index: 0,
        }
    }
}

/// The medium and bold faces used by one job.
#[derive(Clone, Debug)]
pub struct FontSet {
    medium: FontFace,
    bold: FontFace,
}

impl FontSet {
    /// Build from explicit faces.
    pub fn new(medium: FontFace, bold: FontFace) -> Self {
        Self { medium, bold }
    }

    /// Load both faces from files.
    pub fn from_files(medium: &Path, bold: &Path) -> BrandResult<Self> {
        Ok(Self::new(
            FontFace::from_path(medium)?,
            FontFace::from_path(bold)?,
        ))
    }

    /// Resolve faces from system fonts, `extra_dirs` and the directory named by
    /// `REELBRAND_FONT_DIR`.
    ///
    /// Family preference: Inter, then common sans-serif families, then the generic sans-serif
    /// family, then any installed face.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn discover(extra_dirs: &[PathBuf]) -> BrandResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in extra_dirs {
            db.load_fonts_dir(dir);
        }
        if let Some(dir) = std::env::var_os(FONT_DIR_ENV) {
            db.load_fonts_dir(PathBuf::from(dir));
        }
        tracing::debug!(faces = db.len(), "font database loaded");

        let medium = query_face(&db, TextWeight::Medium)?;
        let bold = query_face(&db, TextWeight::Bold)?;
        Ok(Self::new(medium, bold))
    }

    /// Face for `weight`.
    pub fn face(&self, weight: TextWeight) -> &FontFace {
        match weight {
            TextWeight::Medium => &self.medium,
            TextWeight::Bold => &self.bold,
        }
    }
}

fn query_face(db: &usvg::fontdb::Database, weight: TextWeight) -> BrandResult<FontFace> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    let mut families: Vec<Family<'_>> = PREFERRED_FAMILIES
        .iter()
        .copied()
        .map(Family::Name)
        .collect();
    families.push(Family::SansSerif);

    let id = db
        .query(&Query {
            families: &families,
            weight: Weight(weight.value()),
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
        .or_else(|| db.faces().next().map(|face| face.id))
        .ok_or_else(|| BrandError::resource("no usable fonts found"))?;

    db.with_face_data(id, |data, index| FontFace {
        bytes: Arc::new(data.to_vec()),
        index,
    })
    .ok_or_else(|| BrandError::resource("failed to read font face data"))
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
