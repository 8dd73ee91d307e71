//! Font loading and measurement. Fonts are never bundled: they come
//! from the document's configured directories or the standard system
//! locations, through an explicitly owned registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{RenderError, Result};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

#[cfg(target_os = "linux")]
const SYSTEM_FONT_DIRS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];
#[cfg(target_os = "macos")]
const SYSTEM_FONT_DIRS: &[&str] = &["/System/Library/Fonts", "/Library/Fonts"];
#[cfg(target_os = "windows")]
const SYSTEM_FONT_DIRS: &[&str] = &["C:\\Windows\\Fonts"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const SYSTEM_FONT_DIRS: &[&str] = &[];

/// One parsed font file. The raw bytes are kept so the PDF backend
/// can embed the same face the raster backend rasterizes.
#[derive(Debug)]
pub struct FontFace {
    data: Vec<u8>,
    index: u32,
    pub family: String,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
}

impl FontFace {
    pub fn parse(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| RenderError::Font(format!("failed to parse font: {e}")))?;

        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::FAMILY)
            .find_map(|name| name.to_string())
            .unwrap_or_default();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        Ok(Self {
            data,
            index,
            family,
            units_per_em,
            ascender,
            descender,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Run a closure against the parsed face. Parsing is a cheap
    /// zero-copy view over the stored bytes.
    pub fn with_face<T>(&self, f: impl FnOnce(&ttf_parser::Face) -> T) -> Result<T> {
        let face = ttf_parser::Face::parse(&self.data, self.index)
            .map_err(|e| RenderError::Font(format!("failed to parse font: {e}")))?;
        Ok(f(&face))
    }

    fn units_to_px(&self, units: f64, px_size: f64) -> f64 {
        units * px_size / self.units_per_em.max(1) as f64
    }

    /// Advance width of a string at the given pixel size
    pub fn measure(&self, text: &str, px_size: f64) -> Result<f64> {
        self.with_face(|face| {
            let mut width = 0.0;
            for ch in text.chars() {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .unwrap_or(0);
                width += advance as f64;
            }
            self.units_to_px(width, px_size)
        })
    }

    pub fn ascent(&self, px_size: f64) -> f64 {
        self.units_to_px(self.ascender as f64, px_size)
    }

    pub fn descent(&self, px_size: f64) -> f64 {
        self.units_to_px(self.descender as f64, px_size)
    }

    /// Baseline-to-baseline distance at the given pixel size
    pub fn line_height(&self, px_size: f64) -> f64 {
        self.ascent(px_size) - self.descent(px_size)
    }
}

/// The set of fonts available to a render. Loaded once, owned by the
/// caller, shared with the worker.
#[derive(Debug, Default)]
pub struct FontRegistry {
    faces: Vec<Arc<FontFace>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the given directories, then fall back to the system font
    /// locations. Order matters: the first face loaded becomes the
    /// default.
    pub fn discover(extra_dirs: &[PathBuf]) -> Self {
        let mut registry = Self::new();
        for dir in extra_dirs {
            registry.load_dir(dir);
        }
        for dir in SYSTEM_FONT_DIRS {
            registry.load_dir(Path::new(dir));
        }
        registry
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let face = FontFace::parse(data, 0)?;
        log::debug!("Loaded font '{}' from {}", face.family, path.display());
        self.faces.push(Arc::new(face));
        Ok(())
    }

    /// Recursively load every font file under a directory, skipping
    /// unparsable files.
    pub fn load_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.load_dir(&path);
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
            {
                if let Err(e) = self.load_file(&path) {
                    log::debug!("Skipping font {}: {}", path.display(), e);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The face used where no family is requested
    pub fn default_face(&self) -> Result<Arc<FontFace>> {
        self.faces
            .first()
            .cloned()
            .ok_or_else(|| RenderError::Font("no font available".to_string()))
    }

    /// Case-insensitive family lookup, falling back to the default
    pub fn resolve(&self, family: &str) -> Result<Arc<FontFace>> {
        let wanted = family.to_ascii_lowercase();
        self.faces
            .iter()
            .find(|face| face.family.to_ascii_lowercase() == wanted)
            .cloned()
            .map(Ok)
            .unwrap_or_else(|| self.default_face())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_has_no_default() {
        let registry = FontRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.default_face().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(FontFace::parse(b"not a font".to_vec(), 0).is_err());
    }
}
