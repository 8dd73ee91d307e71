mod worker;

use std::path::PathBuf;

use image::RgbaImage;

// Re-export the types callers hand to the worker
pub use photoboard_layout::{Document, DocumentSettings};
pub use photoboard_render::{CancelToken, FontRegistry, GenerationProgress};
pub use worker::{spawn_worker, worker_task};

/// Commands sent from the editing side to the render worker. Each
/// command carries its own document snapshot: the editing side clones
/// the tree on handoff, so later edits never race an in-flight
/// render. Rich-text sources stay shared behind their lock and are
/// read-locked per draw.
#[derive(Debug)]
pub enum RenderCommand {
    GeneratePreview {
        document: Document,
        page_index: usize,
        draw_zones: bool,
    },
    GeneratePdf {
        document: Document,
        /// Kept by the caller too; cancelling aborts between pages
        cancel: CancelToken,
    },
}

/// Updates sent from the worker back to the caller
#[derive(Debug)]
pub enum RenderUpdate {
    PreviewReady {
        page_index: usize,
        image: RgbaImage,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    PdfComplete {
        path: PathBuf,
    },
    /// Cancelled generation is a normal early termination: no file
    /// was written and no error is surfaced
    PdfCancelled {
        path: PathBuf,
    },
    Error {
        message: String,
    },
}
