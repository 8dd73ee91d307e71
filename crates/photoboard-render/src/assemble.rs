//! The document assembler: drives the per-page draw pass into an
//! in-memory preview bitmap or a multi-page PDF.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use photoboard_layout::{Document, Rect};
use printpdf::{Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt};

use crate::fonts::FontRegistry;
use crate::painter::grayscale_image;
use crate::pdf::{EmbeddedFonts, PdfPainter};
use crate::raster::RasterPainter;
use crate::render::draw_page;
use crate::richtext::ImageCache;
use crate::{RenderError, Result, REFERENCE_DPI};

/// Preview resolution cap, for responsiveness
pub const PREVIEW_MAX_DPI: u32 = 150;

/// Cooperative cancellation handle for full generation, checked
/// between pages. Cancelling mid-page waits for that page to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    /// Early termination by request; not an error, and no output file
    /// was produced
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum GenerationProgress {
    Page { current: usize, total: usize },
    Set { total_id: usize },
}

/// Render one page at preview resolution (capped at
/// [`PREVIEW_MAX_DPI`]) into a bitmap, with optional grayscale
/// conversion and the optional zone overlay.
pub fn render_preview(
    document: &mut Document,
    page_index: usize,
    draw_zones: bool,
    fonts: &FontRegistry,
) -> Result<RgbaImage> {
    let page = document.pages.get(page_index).ok_or_else(|| {
        RenderError::InvalidConfiguration(format!("page {page_index} out of range"))
    })?;
    let orientation = page.orientation;

    let dpi = document.paper.dpi.min(PREVIEW_MAX_DPI);
    let (width, height) = document.paper.pixel_size(dpi, orientation);

    document.pages[page_index].compute_layout(Rect::new(0.0, 0.0, width as f64, height as f64));

    let mut painter = RasterPainter::new(width.max(1) as u32, height.max(1) as u32)?;
    let mut images = ImageCache::new();
    draw_page(
        &mut painter,
        document,
        page_index,
        dpi as f64 / REFERENCE_DPI,
        true,
        draw_zones,
        fonts,
        &mut images,
        &mut |_| {},
    )?;

    let mut image = painter.into_image();
    if document.grayscale {
        grayscale_image(&mut image);
    }
    Ok(image)
}

/// Render every page flagged for drawing into PDF bytes at the full
/// configured resolution. Returns `None` when cancelled; nothing is
/// written anywhere either way.
pub fn generate_pdf_bytes(
    document: &mut Document,
    fonts: &FontRegistry,
    cancel: &CancelToken,
    mut progress: impl FnMut(GenerationProgress),
) -> Result<Option<Vec<u8>>> {
    if document.pages.is_empty() {
        return Err(RenderError::NoPages);
    }

    let dpi = document.paper.dpi;
    let total = document.pages.len();

    let mut pdf = PdfDocument::new("photoboard");
    let mut embedded: EmbeddedFonts = EmbeddedFonts::new();
    let mut images = ImageCache::new();
    let mut pdf_pages = Vec::new();

    for index in 0..total {
        if cancel.is_cancelled() {
            log::info!("Generation cancelled after {} page(s)", pdf_pages.len());
            return Ok(None);
        }
        if !document.pages[index].draw_this_page {
            continue;
        }

        progress(GenerationProgress::Page {
            current: index + 1,
            total,
        });

        let orientation = document.pages[index].orientation;
        let (width_px, height_px) = document.paper.pixel_size(dpi, orientation);
        document.pages[index]
            .compute_layout(Rect::new(0.0, 0.0, width_px as f64, height_px as f64));

        let mut painter = PdfPainter::new(
            &mut pdf,
            &mut embedded,
            width_px as f64,
            height_px as f64,
            dpi,
            document.grayscale,
        );
        let mut on_set = |total_id: usize| progress(GenerationProgress::Set { total_id });
        draw_page(
            &mut painter,
            document,
            index,
            dpi as f64 / REFERENCE_DPI,
            false,
            false,
            fonts,
            &mut images,
            &mut on_set,
        )?;
        let ops = painter.finish();

        let (width_pt, height_pt) = document.paper.point_size(orientation);
        pdf_pages.push(PdfPage::new(
            Mm::from(Pt(width_pt as f32)),
            Mm::from(Pt(height_pt as f32)),
            ops,
        ));
    }

    pdf.pages = pdf_pages;

    let mut warnings = Vec::new();
    let bytes = pdf.save(&PdfSaveOptions::default(), &mut warnings);
    for warning in &warnings {
        log::debug!("pdf writer: {warning:?}");
    }
    Ok(Some(bytes))
}

/// Generate the document's PDF at its configured output path. The
/// bytes are assembled fully in memory and written once, so a failed
/// or cancelled run leaves no partial file behind.
pub async fn generate_pdf(
    mut document: Document,
    fonts: Arc<FontRegistry>,
    cancel: CancelToken,
    progress: impl FnMut(GenerationProgress) + Send + 'static,
) -> Result<GenerationOutcome> {
    let path = document.pdf_path.clone();

    let bytes = tokio::task::spawn_blocking(move || {
        generate_pdf_bytes(&mut document, &fonts, &cancel, progress)
    })
    .await??;

    match bytes {
        Some(bytes) => {
            tokio::fs::write(&path, bytes).await?;
            Ok(GenerationOutcome::Completed)
        }
        None => Ok(GenerationOutcome::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_round_trip() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
