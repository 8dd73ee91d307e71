//! The render worker task. Rendering never runs on the editing side:
//! callers enqueue commands over a channel and receive updates back.
//! Preview requests are coalesced so at most one regeneration is ever
//! pending.

use std::sync::Arc;

use photoboard_render::{
    generate_pdf, render_preview, CancelToken, FontRegistry, GenerationOutcome,
    GenerationProgress,
};
use tokio::sync::mpsc;

use crate::{Document, RenderCommand, RenderUpdate};

/// Spawn the worker on the current tokio runtime and return its
/// channel endpoints.
pub fn spawn_worker(
    fonts: Arc<FontRegistry>,
) -> (
    mpsc::UnboundedSender<RenderCommand>,
    mpsc::UnboundedReceiver<RenderUpdate>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    tokio::spawn(worker_task(fonts, command_rx, update_tx));
    (command_tx, update_rx)
}

/// Async worker loop processing render commands until the command
/// channel closes.
pub async fn worker_task(
    fonts: Arc<FontRegistry>,
    mut command_rx: mpsc::UnboundedReceiver<RenderCommand>,
    update_tx: mpsc::UnboundedSender<RenderUpdate>,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &fonts, &mut command_rx, &update_tx).await;
    }
}

async fn process_command(
    cmd: RenderCommand,
    fonts: &Arc<FontRegistry>,
    command_rx: &mut mpsc::UnboundedReceiver<RenderCommand>,
    update_tx: &mpsc::UnboundedSender<RenderUpdate>,
) {
    match cmd {
        RenderCommand::GeneratePreview {
            mut document,
            mut page_index,
            mut draw_zones,
        } => {
            // Drain any queued commands, keeping only the most recent
            // preview request
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let RenderCommand::GeneratePreview {
                    document: new_document,
                    page_index: new_page_index,
                    draw_zones: new_draw_zones,
                } = next_cmd
                {
                    log::debug!("Discarding queued preview generation, using newer request");
                    document = new_document;
                    page_index = new_page_index;
                    draw_zones = new_draw_zones;
                } else {
                    // Non-preview command found; process it before the
                    // preview, preserving its arrival order
                    Box::pin(process_command(next_cmd, fonts, command_rx, update_tx)).await;
                }
            }

            handle_preview(document, page_index, draw_zones, fonts.clone(), update_tx).await;
        }
        RenderCommand::GeneratePdf { document, cancel } => {
            handle_generate(document, cancel, fonts.clone(), update_tx).await;
        }
    }
}

async fn handle_preview(
    mut document: Document,
    page_index: usize,
    draw_zones: bool,
    fonts: Arc<FontRegistry>,
    update_tx: &mpsc::UnboundedSender<RenderUpdate>,
) {
    let rendered = tokio::task::spawn_blocking(move || {
        render_preview(&mut document, page_index, draw_zones, &fonts)
    })
    .await;

    let update = match rendered {
        Ok(Ok(image)) => RenderUpdate::PreviewReady { page_index, image },
        Ok(Err(e)) => RenderUpdate::Error {
            message: format!("Preview failed: {e}"),
        },
        Err(e) => RenderUpdate::Error {
            message: format!("Preview task failed: {e}"),
        },
    };
    let _ = update_tx.send(update);
}

async fn handle_generate(
    document: Document,
    cancel: CancelToken,
    fonts: Arc<FontRegistry>,
    update_tx: &mpsc::UnboundedSender<RenderUpdate>,
) {
    let path = document.pdf_path.clone();
    let total_sets = document.total_sets();

    let progress_tx = update_tx.clone();
    let progress = move |progress: GenerationProgress| {
        let update = match progress {
            GenerationProgress::Page { current, total } => RenderUpdate::Progress {
                operation: format!("Rendering page {current}/{total}"),
                current,
                total,
            },
            GenerationProgress::Set { total_id } => RenderUpdate::Progress {
                operation: format!("Drawing set {}", total_id + 1),
                current: total_id + 1,
                total: total_sets,
            },
        };
        let _ = progress_tx.send(update);
    };

    let update = match generate_pdf(document, fonts, cancel, progress).await {
        Ok(GenerationOutcome::Completed) => RenderUpdate::PdfComplete { path },
        Ok(GenerationOutcome::Cancelled) => RenderUpdate::PdfCancelled { path },
        Err(e) => RenderUpdate::Error {
            message: format!("Generation failed: {e}"),
        },
    };
    let _ = update_tx.send(update);
}
