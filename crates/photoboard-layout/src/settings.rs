//! The configuration tree consumed by the layout, pagination and
//! render components. The editing UI (out of tree) is a producer of
//! these values, never their storage.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::photo::Photo;
use crate::types::*;

/// A rich-text source shared between an editor and the render worker.
/// Writers take the write lock; the renderer holds the read lock for
/// the duration of one draw.
pub type SharedRichText = Arc<RwLock<String>>;

pub fn shared_text(text: impl Into<String>) -> SharedRichText {
    Arc::new(RwLock::new(text.into()))
}

/// Read a shared source, recovering from a poisoned lock (a panicked
/// writer leaves the last written value in place).
pub fn read_text(text: &SharedRichText) -> String {
    text.read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

#[cfg(feature = "serde")]
mod shared_text_serde {
    use super::SharedRichText;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(text: &SharedRichText, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::read_text(text))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<SharedRichText, D::Error> {
        let value = String::deserialize(de)?;
        Ok(super::shared_text(value))
    }
}

/// Repeating brush patterns for page backgrounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternStyle {
    Horizontal,
    Vertical,
    Cross,
    #[default]
    BDiag,
    FDiag,
    DiagCross,
    Dense,
}

/// Background of a page, header or footer: a fill color, an optional
/// photo stretched over the rectangle, and an optional pattern drawn
/// on top.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackgroundSettings {
    pub color: Color,
    pub display_photo: bool,
    pub display_pattern: bool,
    pub pattern_style: PatternStyle,
    pub pattern_color: Color,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub photo: Option<Arc<Photo>>,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            display_photo: false,
            display_pattern: false,
            pattern_style: PatternStyle::default(),
            pattern_color: Color::BLACK,
            photo: None,
        }
    }
}

/// Border drawn around every set rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BordersSettings {
    pub display: bool,
    /// Line width in pixels at the reference resolution; the renderer
    /// scales it by the output upscale factor.
    pub width: f64,
    pub color: Color,
    pub dashed: bool,
}

impl Default for BordersSettings {
    fn default() -> Self {
        Self {
            display: false,
            width: 1.0,
            color: Color::BLACK,
            dashed: false,
        }
    }
}

/// Header band configuration. The footer uses the same shape.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderFooterSettings {
    pub enabled: bool,
    /// Fraction of the usable page height reserved for this band
    pub ratio: f64,
    pub background: BackgroundSettings,
    #[cfg_attr(feature = "serde", serde(with = "shared_text_serde"))]
    pub text: SharedRichText,
}

impl Default for HeaderFooterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ratio: 0.1,
            background: BackgroundSettings::default(),
            text: shared_text(""),
        }
    }
}

impl HeaderFooterSettings {
    /// Copy with its own text source, for pages that do not share the
    /// document-wide header/footer.
    pub fn detached(&self) -> Self {
        Self {
            text: shared_text(read_text(&self.text)),
            ..self.clone()
        }
    }
}

/// Per-set styling: how the rectangle splits between photo and text
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetStyleSettings {
    /// Fraction of the split axis given to the photo
    pub ratio_photo: f64,
    pub text_position: Position,
    pub photo_adjust: PhotoAdjust,
    pub photo_alignment: Alignment,
}

impl Default for SetStyleSettings {
    fn default() -> Self {
        Self {
            ratio_photo: 0.85,
            text_position: Position::Bottom,
            photo_adjust: PhotoAdjust::Fit,
            photo_alignment: Alignment::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MiscSettings {
    pub do_not_display_header: bool,
    pub do_not_display_footer: bool,
}

/// How the sets rectangle is subdivided: a weighted H×V grid, or an
/// explicit list of relative rectangles ("custom mode").
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetsPositionSettings {
    pub custom_mode: bool,
    pub nb_photos_h: usize,
    pub nb_photos_v: usize,
    /// One height fraction per row; sums to 1
    pub lines_height: Vec<f64>,
    /// One width fraction per column; sums to 1
    pub columns_width: Vec<f64>,
    /// Custom mode: relative rectangles in [0,1]² of the sets area,
    /// applied in stored order
    pub relative_rects: Vec<Rect>,
}

impl Default for SetsPositionSettings {
    fn default() -> Self {
        SetsPositionSettings::grid(2, 2)
    }
}

impl SetsPositionSettings {
    /// A grid with evenly distributed rows and columns.
    pub fn grid(nb_photos_h: usize, nb_photos_v: usize) -> Self {
        let mut settings = Self {
            custom_mode: false,
            nb_photos_h: 0,
            nb_photos_v: 0,
            lines_height: Vec::new(),
            columns_width: Vec::new(),
            relative_rects: Vec::new(),
        };
        settings.set_columns(nb_photos_h);
        settings.set_lines(nb_photos_v);
        settings
    }

    /// A custom arrangement from explicit relative rectangles.
    pub fn custom(rects: Vec<Rect>) -> Self {
        Self {
            custom_mode: true,
            nb_photos_h: 0,
            nb_photos_v: 0,
            lines_height: Vec::new(),
            columns_width: Vec::new(),
            relative_rects: rects,
        }
    }

    /// Photos held by one page of this arrangement
    pub fn capacity(&self) -> usize {
        if self.custom_mode {
            self.relative_rects.len()
        } else {
            self.nb_photos_h * self.nb_photos_v
        }
    }

    /// Change the column count, redistributing width fractions: new
    /// columns take `1/(n+1)` and existing fractions shrink by the
    /// complement; removal renormalizes the survivors. Growing from
    /// one column to two lands on exactly 0.5/0.5.
    pub fn set_columns(&mut self, count: usize) {
        resize_axis(&mut self.columns_width, count);
        self.nb_photos_h = count;
    }

    /// Change the row count; same redistribution as [`set_columns`].
    ///
    /// [`set_columns`]: SetsPositionSettings::set_columns
    pub fn set_lines(&mut self, count: usize) {
        resize_axis(&mut self.lines_height, count);
        self.nb_photos_v = count;
    }
}

fn resize_axis(fractions: &mut Vec<f64>, count: usize) {
    if count < fractions.len() {
        fractions.truncate(count);
        let total: f64 = fractions.iter().sum();
        if total > 0.0 {
            for f in fractions.iter_mut() {
                *f /= total;
            }
        }
        return;
    }

    while fractions.len() < count {
        if fractions.is_empty() {
            fractions.push(1.0);
        } else if fractions.len() == 1 {
            fractions[0] = 0.5;
            fractions.push(0.5);
        } else {
            let value = 1.0 / (fractions.len() as f64 + 1.0);
            let factor = 1.0 - value;
            for f in fractions.iter_mut() {
                *f *= factor;
            }
            fractions.push(value);
        }
    }
}

/// Everything one page needs besides its sets: margins, decorations,
/// header/footer bands and the subdivision of the sets area.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSettings {
    pub margins: RatioMargins,
    pub borders: BordersSettings,
    pub background: BackgroundSettings,
    pub header: HeaderFooterSettings,
    pub footer: HeaderFooterSettings,
    pub positions: SetsPositionSettings,
    pub misc: MiscSettings,
}

/// Per-photo consign override
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualConsign {
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(with = "shared_text_serde"))]
    pub text: SharedRichText,
}

impl Default for IndividualConsign {
    fn default() -> Self {
        Self {
            enabled: false,
            text: shared_text(""),
        }
    }
}

/// The full document configuration handed to pagination and rendering.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentSettings {
    pub paper: PaperFormat,
    pub orientation: PageOrientation,
    pub grayscale: bool,
    /// Render only `current_page` during full generation
    pub save_only_current_page: bool,
    pub current_page: usize,
    /// Template applied to every page
    pub page: PageSettings,
    /// Style applied to every set
    pub set_style: SetStyleSettings,
    /// The document-wide consign, used where no override applies
    #[cfg_attr(feature = "serde", serde(with = "shared_text_serde"))]
    pub consign_text: SharedRichText,
    /// Indexed by the photo's global id
    pub individual_consigns: Vec<IndividualConsign>,
    /// Share one header text across pages instead of per-page copies
    pub header_on_all_pages: bool,
    pub footer_on_all_pages: bool,
    /// Extra font directories searched before the system locations
    pub font_dirs: Vec<PathBuf>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            paper: PaperFormat::default(),
            orientation: PageOrientation::Portrait,
            grayscale: false,
            save_only_current_page: false,
            current_page: 0,
            page: PageSettings::default(),
            set_style: SetStyleSettings::default(),
            consign_text: shared_text(""),
            individual_consigns: Vec::new(),
            header_on_all_pages: true,
            footer_on_all_pages: true,
            font_dirs: Vec::new(),
        }
    }
}

impl DocumentSettings {
    /// Load settings from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let settings = serde_json::from_slice(&bytes)
            .map_err(|e| LayoutError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LayoutError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let positions = &self.page.positions;
        if !positions.custom_mode {
            if positions.lines_height.len() != positions.nb_photos_v {
                return Err(LayoutError::Config(
                    "Row fraction count does not match grid height".to_string(),
                ));
            }
            if positions.columns_width.len() != positions.nb_photos_h {
                return Err(LayoutError::Config(
                    "Column fraction count does not match grid width".to_string(),
                ));
            }
        }
        for rect in &positions.relative_rects {
            if rect.x + rect.width > 1.0 || rect.y + rect.height > 1.0 {
                return Err(LayoutError::Config(format!(
                    "Custom rectangle exceeds the unit square: {:?}",
                    rect
                )));
            }
        }
        if self.paper.dpi == 0 {
            return Err(LayoutError::Config("DPI must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(fractions: &[f64]) {
        let total: f64 = fractions.iter().sum();
        assert!(
            (total - 1.0).abs() < 1e-9,
            "fractions {:?} sum to {}",
            fractions,
            total
        );
    }

    #[test]
    fn test_grid_fractions_sum_to_one() {
        for (h, v) in [(1, 1), (2, 2), (3, 2), (5, 4)] {
            let grid = SetsPositionSettings::grid(h, v);
            assert_eq!(grid.columns_width.len(), h);
            assert_eq!(grid.lines_height.len(), v);
            assert_sums_to_one(&grid.columns_width);
            assert_sums_to_one(&grid.lines_height);
        }
    }

    #[test]
    fn test_second_cell_defaults_to_half() {
        let mut grid = SetsPositionSettings::grid(1, 1);
        assert_eq!(grid.columns_width, vec![1.0]);

        grid.set_columns(2);
        assert_eq!(grid.columns_width, vec![0.5, 0.5]);
    }

    #[test]
    fn test_growth_redistributes_proportionally() {
        let mut grid = SetsPositionSettings::grid(2, 1);
        // Skew the grid, then grow: the skew survives, scaled down
        grid.columns_width = vec![0.8, 0.2];
        grid.set_columns(3);

        assert_eq!(grid.columns_width.len(), 3);
        assert!((grid.columns_width[2] - 1.0 / 3.0).abs() < 1e-9);
        // Existing fractions scaled by 2/3, preserving their ratio
        assert!((grid.columns_width[0] / grid.columns_width[1] - 4.0).abs() < 1e-9);
        assert_sums_to_one(&grid.columns_width);
    }

    #[test]
    fn test_shrink_renormalizes() {
        let mut grid = SetsPositionSettings::grid(3, 1);
        grid.columns_width = vec![0.5, 0.3, 0.2];
        grid.set_columns(2);

        assert!((grid.columns_width[0] - 0.625).abs() < 1e-9);
        assert!((grid.columns_width[1] - 0.375).abs() < 1e-9);
        assert_sums_to_one(&grid.columns_width);
    }

    #[test]
    fn test_capacity() {
        assert_eq!(SetsPositionSettings::grid(3, 2).capacity(), 6);
        assert_eq!(SetsPositionSettings::grid(0, 2).capacity(), 0);

        let custom = SetsPositionSettings::custom(vec![
            Rect::new(0.0, 0.0, 0.5, 0.5),
            Rect::new(0.5, 0.5, 0.5, 0.5),
        ]);
        assert_eq!(custom.capacity(), 2);
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_custom_rect() {
        let mut settings = DocumentSettings::default();
        settings.page.positions =
            SetsPositionSettings::custom(vec![Rect::new(0.6, 0.0, 0.5, 0.5)]);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_detached_header_has_own_text() {
        let header = HeaderFooterSettings {
            text: shared_text("shared"),
            ..HeaderFooterSettings::default()
        };
        let copy = header.detached();

        *copy.text.write().unwrap() = "edited".to_string();
        assert_eq!(read_text(&header.text), "shared");
        assert_eq!(read_text(&copy.text), "edited");
    }
}
