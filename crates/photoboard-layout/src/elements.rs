//! The document tree handed to the render pipeline. Every node owns
//! the rectangle assigned to it by the layout engine; rectangles are
//! only ever rewritten by re-running the layout.

use std::path::PathBuf;
use std::sync::Arc;

use crate::photo::Photo;
use crate::settings::*;
use crate::types::*;

/// A rich-text caption bound to a photo, a page band or the document.
#[derive(Debug, Clone)]
pub struct Consign {
    pub text: SharedRichText,
    pub rect_on_page: Rect,
}

impl Consign {
    pub fn new(text: SharedRichText) -> Self {
        Self {
            text,
            rect_on_page: Rect::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Header {
    pub settings: HeaderFooterSettings,
    pub rect_on_page: Rect,
}

#[derive(Debug, Clone)]
pub struct Footer {
    pub settings: HeaderFooterSettings,
    pub rect_on_page: Rect,
}

/// One photo paired with its consign: the atomic layout unit of a
/// page grid.
#[derive(Debug, Clone)]
pub struct PhotoSet {
    /// Index within the page, row-major
    pub id: usize,
    /// Global index across the whole document
    pub total_id: usize,
    pub photo: Arc<Photo>,
    pub consign: Consign,
    pub style: SetStyleSettings,
    pub rect_on_page: Rect,
    pub photo_rect: Rect,
}

impl PhotoSet {
    pub fn new(
        id: usize,
        total_id: usize,
        photo: Arc<Photo>,
        consign_text: SharedRichText,
        style: SetStyleSettings,
    ) -> Self {
        Self {
            id,
            total_id,
            photo,
            consign: Consign::new(consign_text),
            style,
            rect_on_page: Rect::default(),
            photo_rect: Rect::default(),
        }
    }
}

/// One output page: its decorations, bands and ordered sets, plus
/// every rectangle the layout engine computed for it.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: usize,
    /// Cleared when the document is generated with "save only the
    /// current page"
    pub draw_this_page: bool,
    pub orientation: PageOrientation,
    pub margins: RatioMargins,
    pub borders: BordersSettings,
    pub background: BackgroundSettings,
    pub misc: MiscSettings,
    pub positions: SetsPositionSettings,
    pub header: Header,
    pub footer: Footer,
    /// Insertion order is reading order (row-major in grid mode)
    pub sets: Vec<PhotoSet>,

    pub rect_on_page: Rect,
    pub page_minus_margins_rect: Rect,
    pub sets_rect: Rect,
    pub margin_header_rect: Rect,
    pub margin_footer_rect: Rect,
    /// One per set in grid mode: the set rectangle grown by its
    /// trailing gutters, for the zone overlay
    pub inter_margins_rects: Vec<Rect>,
}

impl Page {
    pub fn new(id: usize, settings: &PageSettings, orientation: PageOrientation) -> Self {
        Self {
            id,
            draw_this_page: true,
            orientation,
            margins: settings.margins,
            borders: settings.borders,
            background: settings.background.clone(),
            misc: settings.misc,
            positions: settings.positions.clone(),
            header: Header {
                settings: settings.header.clone(),
                rect_on_page: Rect::default(),
            },
            footer: Footer {
                settings: settings.footer.clone(),
                rect_on_page: Rect::default(),
            },
            sets: Vec::new(),
            rect_on_page: Rect::default(),
            page_minus_margins_rect: Rect::default(),
            sets_rect: Rect::default(),
            margin_header_rect: Rect::default(),
            margin_footer_rect: Rect::default(),
            inter_margins_rects: Vec::new(),
        }
    }
}

/// The whole paginated document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub paper: PaperFormat,
    pub grayscale: bool,
    pub pdf_path: PathBuf,
}

impl Document {
    /// Number of sets on the given page
    pub fn page_photos_count(&self, index: usize) -> usize {
        self.pages.get(index).map(|page| page.sets.len()).unwrap_or(0)
    }

    /// Total sets across every page
    pub fn total_sets(&self) -> usize {
        self.pages.iter().map(|page| page.sets.len()).sum()
    }

    /// Recompute every page layout for the given output size.
    pub fn compute_all_layouts(&mut self, width: f64, height: f64) {
        for page in &mut self.pages {
            page.compute_layout(Rect::new(0.0, 0.0, width, height));
        }
    }
}
