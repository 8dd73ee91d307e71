use std::sync::Arc;

use photoboard_layout::{
    build_document, DocumentSettings, PaperFormat, PaperSize, Photo, SetsPositionSettings,
};
use photoboard_runtime::{
    worker_task, CancelToken, Document, FontRegistry, RenderCommand, RenderUpdate,
};
use tokio::sync::mpsc;

fn tiny_document(pdf_path: &std::path::Path) -> Document {
    let photos = vec![Arc::new(Photo::with_name(
        "p.png",
        "p",
        image::DynamicImage::new_rgba8(16, 16),
    ))];

    let mut settings = DocumentSettings::default();
    settings.paper = PaperFormat::new(
        PaperSize::Custom {
            width_in: 2.0,
            height_in: 3.0,
        },
        50,
    );
    settings.page.positions = SetsPositionSettings::grid(1, 1);

    build_document(&photos, &settings, pdf_path)
}

async fn run_worker(commands: Vec<RenderCommand>) -> Vec<RenderUpdate> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();

    for command in commands {
        command_tx.send(command).unwrap();
    }
    drop(command_tx);

    worker_task(Arc::new(FontRegistry::new()), command_rx, update_tx).await;

    let mut updates = Vec::new();
    while let Ok(update) = update_rx.try_recv() {
        updates.push(update);
    }
    updates
}

#[tokio::test(flavor = "multi_thread")]
async fn test_queued_previews_coalesce_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let commands = (0..4)
        .map(|_| RenderCommand::GeneratePreview {
            document: tiny_document(&dir.path().join("out.pdf")),
            page_index: 0,
            draw_zones: false,
        })
        .collect();

    let updates = run_worker(commands).await;

    let previews = updates
        .iter()
        .filter(|update| matches!(update, RenderUpdate::PreviewReady { .. }))
        .count();
    assert_eq!(previews, 1, "queued previews must collapse into one");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generation_writes_pdf_and_reports_completion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.pdf");

    let updates = run_worker(vec![RenderCommand::GeneratePdf {
        document: tiny_document(&path),
        cancel: CancelToken::new(),
    }])
    .await;

    assert!(updates
        .iter()
        .any(|update| matches!(update, RenderUpdate::PdfComplete { .. })));

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_generation_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.pdf");

    let cancel = CancelToken::new();
    cancel.cancel();

    let updates = run_worker(vec![RenderCommand::GeneratePdf {
        document: tiny_document(&path),
        cancel,
    }])
    .await;

    assert!(updates
        .iter()
        .any(|update| matches!(update, RenderUpdate::PdfCancelled { .. })));
    assert!(!path.exists(), "cancelled generation must not write a file");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generation_between_previews_still_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.pdf");

    let commands = vec![
        RenderCommand::GeneratePreview {
            document: tiny_document(&path),
            page_index: 0,
            draw_zones: false,
        },
        RenderCommand::GeneratePdf {
            document: tiny_document(&path),
            cancel: CancelToken::new(),
        },
        RenderCommand::GeneratePreview {
            document: tiny_document(&path),
            page_index: 0,
            draw_zones: true,
        },
    ];

    let updates = run_worker(commands).await;

    assert!(updates
        .iter()
        .any(|update| matches!(update, RenderUpdate::PdfComplete { .. })));
    let previews = updates
        .iter()
        .filter(|update| matches!(update, RenderUpdate::PreviewReady { .. }))
        .count();
    assert_eq!(previews, 1);
}
