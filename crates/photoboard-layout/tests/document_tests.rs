use std::sync::Arc;

use photoboard_layout::*;

fn test_photos(count: usize) -> Vec<Arc<Photo>> {
    (0..count)
        .map(|i| {
            let image = image::DynamicImage::new_rgba8(8, 8);
            Arc::new(Photo::with_name(
                format!("photo_{i}.png"),
                format!("photo_{i}"),
                image,
            ))
        })
        .collect()
}

fn bare_settings(h: usize, v: usize) -> DocumentSettings {
    let mut settings = DocumentSettings::default();
    settings.page.positions = SetsPositionSettings::grid(h, v);
    settings.page.margins.exterior_enabled = false;
    settings.page.margins.interior_enabled = false;
    settings
}

#[test]
fn test_two_by_two_with_four_photos_is_one_page_of_quadrants() {
    let settings = bare_settings(2, 2);
    let mut doc = build_document(&test_photos(4), &settings, "out.pdf");

    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.page_photos_count(0), 4);

    doc.compute_all_layouts(1000.0, 2000.0);

    let page = &doc.pages[0];
    let quadrants = [
        Rect::new(0.0, 0.0, 500.0, 1000.0),
        Rect::new(500.0, 0.0, 500.0, 1000.0),
        Rect::new(0.0, 1000.0, 500.0, 1000.0),
        Rect::new(500.0, 1000.0, 500.0, 1000.0),
    ];
    for (set, expected) in page.sets.iter().zip(quadrants) {
        assert_eq!(set.rect_on_page, expected);
    }
}

#[test]
fn test_two_by_two_with_five_photos_spills_to_second_page() {
    let settings = bare_settings(2, 2);
    let doc = build_document(&test_photos(5), &settings, "out.pdf");

    assert_eq!(doc.pages.len(), 2);
    let first_ids: Vec<usize> = doc.pages[0].sets.iter().map(|s| s.total_id).collect();
    assert_eq!(first_ids, vec![0, 1, 2, 3]);
    assert_eq!(doc.pages[1].sets.len(), 1);
    assert_eq!(doc.pages[1].sets[0].total_id, 4);
}

#[test]
fn test_layout_scales_consistently_between_preview_and_print() {
    // The same page laid out at preview and print resolution must put
    // every set at the same relative position.
    let mut settings = bare_settings(3, 2);
    settings.page.margins.exterior_enabled = true;
    settings.page.header.enabled = true;
    settings.page.footer.enabled = true;

    let paper = PaperFormat::new(PaperSize::A4, 300);
    let mut doc = build_document(&test_photos(6), &settings, "out.pdf");
    doc.paper = paper;

    let (preview_w, preview_h) = paper.pixel_size(150, PageOrientation::Portrait);
    doc.compute_all_layouts(preview_w as f64, preview_h as f64);
    let preview: Vec<(f64, f64)> = doc.pages[0]
        .sets
        .iter()
        .map(|s| {
            (
                s.rect_on_page.x / preview_w as f64,
                s.rect_on_page.y / preview_h as f64,
            )
        })
        .collect();

    let (print_w, print_h) = paper.pixel_size(300, PageOrientation::Portrait);
    doc.compute_all_layouts(print_w as f64, print_h as f64);
    let print: Vec<(f64, f64)> = doc.pages[0]
        .sets
        .iter()
        .map(|s| {
            (
                s.rect_on_page.x / print_w as f64,
                s.rect_on_page.y / print_h as f64,
            )
        })
        .collect();

    for (a, b) in preview.iter().zip(&print) {
        assert!((a.0 - b.0).abs() < 1e-3, "{a:?} vs {b:?}");
        assert!((a.1 - b.1).abs() < 1e-3, "{a:?} vs {b:?}");
    }
}

#[test]
fn test_shared_header_text_is_shared_across_pages() {
    let mut settings = bare_settings(1, 1);
    settings.page.header.enabled = true;
    settings.page.header.text = shared_text("title");
    settings.header_on_all_pages = true;

    let doc = build_document(&test_photos(3), &settings, "out.pdf");
    *doc.pages[0].header.settings.text.write().unwrap() = "renamed".to_string();
    assert_eq!(read_text(&doc.pages[2].header.settings.text), "renamed");

    // With per-page copies, edits stay local
    let mut settings = settings;
    settings.header_on_all_pages = false;
    let doc = build_document(&test_photos(3), &settings, "out.pdf");
    *doc.pages[0].header.settings.text.write().unwrap() = "renamed".to_string();
    assert_eq!(read_text(&doc.pages[2].header.settings.text), "title");
}
