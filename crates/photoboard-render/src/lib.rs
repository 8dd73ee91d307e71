pub mod assemble;
pub mod fitting;
pub mod fonts;
pub mod painter;
pub mod pattern;
pub mod pdf;
pub mod raster;
pub mod render;
pub mod richtext;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Font error: {0}")]
    Font(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No pages to render")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// The resolution rich text is authored at. The substitution size
/// factor for an output device is `output_dpi / REFERENCE_DPI`.
pub const REFERENCE_DPI: f64 = 96.0;

pub use assemble::{
    generate_pdf, generate_pdf_bytes, render_preview, CancelToken, GenerationOutcome,
    GenerationProgress, PREVIEW_MAX_DPI,
};
pub use fitting::fit_photo;
pub use fonts::{FontFace, FontRegistry};
pub use painter::{grayscale_image, luma, Painter, TextRun};
pub use pattern::render_pattern;
pub use pdf::{EmbeddedFonts, PdfPainter};
pub use raster::RasterPainter;
pub use render::draw_page;
pub use richtext::{
    draw_markup, parse_markup, substitute, Block, ExtraInfo, ImageCache, Inline, TextStyle,
    DEFAULT_FONT_SIZE_PT,
};
