//! The pagination engine: partitioning the valid photo list into
//! pages of at most `capacity` sets. Every configuration change
//! rebuilds the whole page collection; callers that track a current
//! page clamp their index to the new count.

use std::path::PathBuf;
use std::sync::Arc;

use crate::elements::{Document, Page, PhotoSet};
use crate::photo::Photo;
use crate::settings::DocumentSettings;

/// Build the page/set collection for the given photos.
///
/// Capacity is `H×V` in grid mode, the rectangle count in custom
/// mode. A zero capacity produces zero pages. Every page but the last
/// holds exactly `capacity` sets; `total_id` is the photo's global
/// index and `id` its row-major index within the page.
pub fn paginate(photos: &[Arc<Photo>], settings: &DocumentSettings) -> Vec<Page> {
    let capacity = settings.page.positions.capacity();
    if capacity == 0 || photos.is_empty() {
        return Vec::new();
    }

    let mut nb_pages = photos.len() / capacity;
    let last_page_photos = photos.len() % capacity;
    if last_page_photos != 0 {
        nb_pages += 1;
    }

    let mut pages = Vec::with_capacity(nb_pages);
    let mut current_photo = 0;

    for page_id in 0..nb_pages {
        let photos_on_page = if page_id == nb_pages - 1 && last_page_photos != 0 {
            last_page_photos
        } else {
            capacity
        };

        let mut page = Page::new(page_id, &settings.page, settings.orientation);
        if !settings.header_on_all_pages {
            page.header.settings = settings.page.header.detached();
        }
        if !settings.footer_on_all_pages {
            page.footer.settings = settings.page.footer.detached();
        }
        page.draw_this_page =
            !settings.save_only_current_page || page_id == settings.current_page;

        page.sets.reserve(photos_on_page);
        for set_id in 0..photos_on_page {
            let consign_text = settings
                .individual_consigns
                .get(current_photo)
                .filter(|consign| consign.enabled)
                .map(|consign| consign.text.clone())
                .unwrap_or_else(|| settings.consign_text.clone());

            page.sets.push(PhotoSet::new(
                set_id,
                current_photo,
                photos[current_photo].clone(),
                consign_text,
                settings.set_style,
            ));
            current_photo += 1;
        }

        pages.push(page);
    }

    pages
}

/// Paginate and wrap the result into a [`Document`].
pub fn build_document(
    photos: &[Arc<Photo>],
    settings: &DocumentSettings,
    pdf_path: impl Into<PathBuf>,
) -> Document {
    Document {
        pages: paginate(photos, settings),
        paper: settings.paper,
        grayscale: settings.grayscale,
        pdf_path: pdf_path.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{shared_text, IndividualConsign, SetsPositionSettings};

    fn photos(count: usize) -> Vec<Arc<Photo>> {
        (0..count)
            .map(|i| {
                let image = image::DynamicImage::new_rgba8(2, 2);
                Arc::new(Photo::with_name(format!("{i}.png"), format!("{i}"), image))
            })
            .collect()
    }

    fn grid_settings(h: usize, v: usize) -> DocumentSettings {
        let mut settings = DocumentSettings::default();
        settings.page.positions = SetsPositionSettings::grid(h, v);
        settings
    }

    #[test]
    fn test_exact_multiple_fills_every_page() {
        let pages = paginate(&photos(8), &grid_settings(2, 2));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].sets.len(), 4);
        assert_eq!(pages[1].sets.len(), 4);
    }

    #[test]
    fn test_remainder_goes_to_short_last_page() {
        let pages = paginate(&photos(5), &grid_settings(2, 2));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].sets.len(), 4);
        assert_eq!(pages[1].sets.len(), 1);
        assert_eq!(pages[1].sets[0].total_id, 4);
    }

    #[test]
    fn test_total_ids_cover_every_photo_once() {
        let pages = paginate(&photos(11), &grid_settings(3, 2));

        let mut seen: Vec<usize> = pages
            .iter()
            .flat_map(|page| page.sets.iter().map(|set| set.total_id))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..11).collect::<Vec<_>>());

        for page in &pages {
            for (expected, set) in page.sets.iter().enumerate() {
                assert_eq!(set.id, expected);
            }
        }
    }

    #[test]
    fn test_page_count_is_ceiling() {
        for (n, capacity, expected) in [(1, 4, 1), (4, 4, 1), (5, 4, 2), (12, 4, 3), (13, 4, 4)] {
            let pages = paginate(&photos(n), &grid_settings(capacity, 1));
            assert_eq!(pages.len(), expected, "{} photos / capacity {}", n, capacity);
        }
    }

    #[test]
    fn test_zero_capacity_degrades_to_zero_pages() {
        let pages = paginate(&photos(5), &grid_settings(0, 3));
        assert!(pages.is_empty());

        let mut settings = DocumentSettings::default();
        settings.page.positions = SetsPositionSettings::custom(Vec::new());
        assert!(paginate(&photos(5), &settings).is_empty());
    }

    #[test]
    fn test_custom_mode_capacity_is_rect_count() {
        let mut settings = DocumentSettings::default();
        settings.page.positions = SetsPositionSettings::custom(vec![
            crate::types::Rect::new(0.0, 0.0, 0.5, 0.5),
            crate::types::Rect::new(0.5, 0.0, 0.5, 0.5),
            crate::types::Rect::new(0.0, 0.5, 1.0, 0.5),
        ]);

        let pages = paginate(&photos(7), &settings);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].sets.len(), 1);
    }

    #[test]
    fn test_individual_consign_overrides_global() {
        let mut settings = grid_settings(2, 1);
        settings.consign_text = shared_text("global");
        settings.individual_consigns = vec![
            IndividualConsign::default(),
            IndividualConsign {
                enabled: true,
                text: shared_text("special"),
            },
        ];

        let pages = paginate(&photos(2), &settings);
        let texts: Vec<String> = pages[0]
            .sets
            .iter()
            .map(|set| crate::settings::read_text(&set.consign.text))
            .collect();
        assert_eq!(texts, vec!["global".to_string(), "special".to_string()]);
    }

    #[test]
    fn test_save_only_current_page_flags() {
        let mut settings = grid_settings(2, 1);
        settings.save_only_current_page = true;
        settings.current_page = 1;

        let pages = paginate(&photos(6), &settings);
        let flags: Vec<bool> = pages.iter().map(|page| page.draw_this_page).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_build_document_counts() {
        let doc = build_document(&photos(5), &grid_settings(2, 2), "out.pdf");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.page_photos_count(0), 4);
        assert_eq!(doc.page_photos_count(1), 1);
        assert_eq!(doc.total_sets(), 5);
    }
}
