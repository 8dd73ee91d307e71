use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageOrientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Placement of one element relative to another: the consign text
/// relative to its photo, within the rectangle they share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    /// Overlaid: both elements occupy the same rectangle
    On,
}

/// How a photo is scaled into its target rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhotoAdjust {
    /// Center without scaling
    Center,
    /// Largest aspect-preserving scale that fits entirely
    #[default]
    Fit,
    /// Smallest aspect-preserving scale that covers the rectangle (cropped)
    Extend,
    /// Stretch to the rectangle, ignoring aspect ratio
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Placement of a fitted photo inside its rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alignment {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

/// An RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A rectangular area in pixels at the current output resolution.
/// Origin is the top-left corner of the page; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Margin configuration, every value a fraction of the relevant page
/// dimension. Exterior margins surround the whole page, interior
/// margins are the gutters between grid cells, and the header/footer
/// margins are the bands separating header and footer from the sets
/// area. Each group is independently toggleable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatioMargins {
    pub exterior_enabled: bool,
    pub interior_enabled: bool,
    pub footer_header_enabled: bool,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub inter_width: f64,
    pub inter_height: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for RatioMargins {
    fn default() -> Self {
        Self {
            exterior_enabled: true,
            interior_enabled: true,
            footer_header_enabled: false,
            left: 0.02,
            right: 0.02,
            top: 0.02,
            bottom: 0.02,
            inter_width: 0.1,
            inter_height: 0.1,
            header: 0.01,
            footer: 0.01,
        }
    }
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    A6,
    B5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_in: f64, height_in: f64 },
}

impl PaperSize {
    /// Base dimensions in millimeters (always portrait: width < height
    /// for standard sizes)
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A6 => (105.0, 148.0),
            PaperSize::B5 => (176.0, 250.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_in,
                height_in,
            } => (width_in * 25.4, height_in * 25.4),
        }
    }

    /// Portrait dimensions as inch ratios (pixels = ratio × dpi)
    pub fn dimensions_in(self) -> (f64, f64) {
        let (w_mm, h_mm) = self.dimensions_mm();
        (w_mm / 25.4, h_mm / 25.4)
    }
}

/// A named paper size bound to an output resolution. The same format
/// serves the capped-DPI preview and the full-DPI print path.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaperFormat {
    pub dpi: u32,
    pub width_ratio: f64,
    pub height_ratio: f64,
    pub size: PaperSize,
}

impl PaperFormat {
    pub fn new(size: PaperSize, dpi: u32) -> Self {
        let (width_ratio, height_ratio) = size.dimensions_in();
        Self {
            dpi,
            width_ratio,
            height_ratio,
            size,
        }
    }

    pub fn width_pixels(&self, wanted_dpi: u32) -> i64 {
        (self.width_ratio * wanted_dpi as f64) as i64
    }

    pub fn height_pixels(&self, wanted_dpi: u32) -> i64 {
        (self.height_ratio * wanted_dpi as f64) as i64
    }

    /// Pixel dimensions at the given resolution, with the orientation
    /// swap applied for landscape pages.
    pub fn pixel_size(&self, wanted_dpi: u32, orientation: PageOrientation) -> (i64, i64) {
        match orientation {
            PageOrientation::Portrait => (self.width_pixels(wanted_dpi), self.height_pixels(wanted_dpi)),
            PageOrientation::Landscape => (self.height_pixels(wanted_dpi), self.width_pixels(wanted_dpi)),
        }
    }

    /// Paper dimensions in points (1/72 in), orientation applied.
    pub fn point_size(&self, orientation: PageOrientation) -> (f64, f64) {
        match orientation {
            PageOrientation::Portrait => (self.width_ratio * 72.0, self.height_ratio * 72.0),
            PageOrientation::Landscape => (self.height_ratio * 72.0, self.width_ratio * 72.0),
        }
    }
}

impl Default for PaperFormat {
    fn default() -> Self {
        PaperFormat::new(PaperSize::A4, 300)
    }
}
