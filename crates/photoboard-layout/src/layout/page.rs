//! Page-level layout: exterior margins, header/footer bands and the
//! subdivision of the sets area.

use super::{custom_cells, grid_cells};
use crate::elements::Page;
use crate::types::Rect;

impl Page {
    /// Compute every rectangle on this page from the rectangle the
    /// document assigned to it. Idempotent; safe to re-run at a
    /// different resolution.
    pub fn compute_layout(&mut self, upper_rect: Rect) {
        self.rect_on_page = upper_rect;

        // Exterior margins
        let (mut top, mut bottom, mut left, mut right) = (0.0, 0.0, 0.0, 0.0);
        if self.margins.exterior_enabled {
            top = upper_rect.height * self.margins.top.clamp(0.0, 1.0);
            bottom = upper_rect.height * self.margins.bottom.clamp(0.0, 1.0);
            left = upper_rect.width * self.margins.left.clamp(0.0, 1.0);
            right = upper_rect.width * self.margins.right.clamp(0.0, 1.0);
        }

        self.page_minus_margins_rect = Rect::new(
            upper_rect.x + left,
            upper_rect.y + top,
            upper_rect.width - left - right,
            upper_rect.height - top - bottom,
        );
        let usable = self.page_minus_margins_rect;

        // Bands separating header/footer from the sets area
        let (header_margin_height, footer_margin_height) = if self.margins.footer_header_enabled {
            (
                usable.height * self.margins.header.clamp(0.0, 1.0),
                usable.height * self.margins.footer.clamp(0.0, 1.0),
            )
        } else {
            (0.0, 0.0)
        };

        // Header/footer ratios; a combined overflow shrinks both by
        // half the excess so they sum to exactly 1
        let bands_height = usable.height - header_margin_height - footer_margin_height;
        let mut header_ratio = if self.header.settings.enabled && !self.misc.do_not_display_header {
            self.header.settings.ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut footer_ratio = if self.footer.settings.enabled && !self.misc.do_not_display_footer {
            self.footer.settings.ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let sum = header_ratio + footer_ratio;
        if sum > 1.0 {
            header_ratio -= (sum - 1.0) * 0.5;
            footer_ratio -= (sum - 1.0) * 0.5;
        }

        let header_height = header_ratio * bands_height;
        let footer_height = footer_ratio * bands_height;
        let sets_height = bands_height - header_height - footer_height;

        // Stack top to bottom: header, header margin, sets, footer
        // margin, footer
        let header_rect = Rect::new(usable.x, usable.y, usable.width, header_height);
        self.margin_header_rect = Rect::new(
            usable.x,
            header_rect.bottom(),
            usable.width,
            header_margin_height,
        );
        self.sets_rect = Rect::new(
            usable.x,
            self.margin_header_rect.bottom(),
            usable.width,
            sets_height,
        );
        self.margin_footer_rect = Rect::new(
            usable.x,
            self.sets_rect.bottom(),
            usable.width,
            footer_margin_height,
        );
        let footer_rect = Rect::new(
            usable.x,
            self.margin_footer_rect.bottom(),
            usable.width,
            footer_height,
        );

        self.header.rect_on_page = header_rect;
        self.footer.rect_on_page = footer_rect;

        // Subdivide the sets area
        self.inter_margins_rects.clear();
        if self.positions.custom_mode {
            let cells = custom_cells(self.sets_rect, &self.positions.relative_rects);
            for (set, cell) in self.sets.iter_mut().zip(cells) {
                set.compute_layout(cell);
            }
        } else {
            let cells = grid_cells(self.sets_rect, &self.positions, &self.margins);
            self.inter_margins_rects.reserve(self.sets.len());
            for (set, cell) in self.sets.iter_mut().zip(cells) {
                set.compute_layout(cell.rect);
                self.inter_margins_rects.push(cell.inter_rect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::elements::{Page, PhotoSet};
    use crate::photo::Photo;
    use crate::settings::*;
    use crate::types::*;

    fn test_page(sets: usize, settings: &PageSettings) -> Page {
        let mut page = Page::new(0, settings, PageOrientation::Portrait);
        let image = image::DynamicImage::new_rgba8(4, 4);
        let photo = Arc::new(Photo::with_name("test.png", "test", image));
        for id in 0..sets {
            page.sets.push(PhotoSet::new(
                id,
                id,
                photo.clone(),
                shared_text(""),
                SetStyleSettings::default(),
            ));
        }
        page
    }

    fn bare_settings() -> PageSettings {
        PageSettings {
            margins: RatioMargins {
                exterior_enabled: false,
                interior_enabled: false,
                footer_header_enabled: false,
                ..RatioMargins::default()
            },
            ..PageSettings::default()
        }
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut settings = bare_settings();
        settings.margins.exterior_enabled = true;
        settings.margins.interior_enabled = true;
        settings.header.enabled = true;
        settings.footer.enabled = true;

        let mut page = test_page(4, &settings);
        let rect = Rect::new(0.0, 0.0, 2480.0, 3507.0);

        page.compute_layout(rect);
        let first_sets: Vec<Rect> = page.sets.iter().map(|s| s.rect_on_page).collect();
        let first_sets_rect = page.sets_rect;

        page.compute_layout(rect);
        let second_sets: Vec<Rect> = page.sets.iter().map(|s| s.rect_on_page).collect();

        assert_eq!(first_sets, second_sets);
        assert_eq!(first_sets_rect, page.sets_rect);
    }

    #[test]
    fn test_exterior_margins_shrink_usable_area() {
        let mut settings = bare_settings();
        settings.margins.exterior_enabled = true;
        settings.margins.left = 0.1;
        settings.margins.right = 0.1;
        settings.margins.top = 0.05;
        settings.margins.bottom = 0.05;

        let mut page = test_page(1, &settings);
        page.compute_layout(Rect::new(0.0, 0.0, 1000.0, 2000.0));

        assert_eq!(page.page_minus_margins_rect, Rect::new(100.0, 100.0, 800.0, 1800.0));
    }

    #[test]
    fn test_header_footer_overflow_shrinks_to_one() {
        let mut settings = bare_settings();
        settings.header.enabled = true;
        settings.header.ratio = 0.6;
        settings.footer.enabled = true;
        settings.footer.ratio = 0.6;

        let mut page = test_page(1, &settings);
        page.compute_layout(Rect::new(0.0, 0.0, 1000.0, 1000.0));

        // 0.6 + 0.6 corrected to 0.5 + 0.5: the bands split the page
        // and nothing is left for the sets
        assert!((page.header.rect_on_page.height - 500.0).abs() < 1e-9);
        assert!((page.footer.rect_on_page.height - 500.0).abs() < 1e-9);
        assert!(page.sets_rect.height.abs() < 1e-9);
    }

    #[test]
    fn test_bands_partition_usable_height() {
        let mut settings = bare_settings();
        settings.margins.exterior_enabled = true;
        settings.margins.footer_header_enabled = true;
        settings.header.enabled = true;
        settings.header.ratio = 0.15;
        settings.footer.enabled = true;
        settings.footer.ratio = 0.1;

        let mut page = test_page(4, &settings);
        page.compute_layout(Rect::new(0.0, 0.0, 1000.0, 2000.0));

        let total = page.header.rect_on_page.height
            + page.margin_header_rect.height
            + page.sets_rect.height
            + page.margin_footer_rect.height
            + page.footer.rect_on_page.height;
        assert!((total - page.page_minus_margins_rect.height).abs() < 1e-6);

        // Stacking order, top to bottom
        assert!((page.margin_header_rect.y - page.header.rect_on_page.bottom()).abs() < 1e-9);
        assert!((page.sets_rect.y - page.margin_header_rect.bottom()).abs() < 1e-9);
        assert!((page.margin_footer_rect.y - page.sets_rect.bottom()).abs() < 1e-9);
        assert!((page.footer.rect_on_page.y - page.margin_footer_rect.bottom()).abs() < 1e-9);
    }

    #[test]
    fn test_children_stay_inside_parent() {
        let mut settings = PageSettings::default();
        settings.header.enabled = true;
        settings.footer.enabled = true;
        settings.margins.footer_header_enabled = true;

        let mut page = test_page(4, &settings);
        let rect = Rect::new(0.0, 0.0, 2480.0, 3507.0);
        page.compute_layout(rect);

        let tolerance = 1e-6;
        for set in &page.sets {
            assert!(set.rect_on_page.x >= page.sets_rect.x - tolerance);
            assert!(set.rect_on_page.y >= page.sets_rect.y - tolerance);
            assert!(set.rect_on_page.right() <= page.sets_rect.right() + tolerance);
            assert!(set.rect_on_page.bottom() <= page.sets_rect.bottom() + tolerance);

            assert!(set.photo_rect.right() <= set.rect_on_page.right() + tolerance);
            assert!(set.consign.rect_on_page.right() <= set.rect_on_page.right() + tolerance);
        }
    }

    #[test]
    fn test_four_sets_partition_into_quadrants() {
        // Grid 2×2, margins off, four photos: four equal quadrants
        let mut page = test_page(4, &bare_settings());
        page.compute_layout(Rect::new(0.0, 0.0, 800.0, 1200.0));

        assert_eq!(page.sets_rect, Rect::new(0.0, 0.0, 800.0, 1200.0));
        assert_eq!(page.sets[0].rect_on_page, Rect::new(0.0, 0.0, 400.0, 600.0));
        assert_eq!(page.sets[1].rect_on_page, Rect::new(400.0, 0.0, 400.0, 600.0));
        assert_eq!(page.sets[2].rect_on_page, Rect::new(0.0, 600.0, 400.0, 600.0));
        assert_eq!(page.sets[3].rect_on_page, Rect::new(400.0, 600.0, 400.0, 600.0));
    }

    #[test]
    fn test_zero_sets_still_computes_sets_rect() {
        let mut page = test_page(0, &bare_settings());
        page.compute_layout(Rect::new(0.0, 0.0, 800.0, 1200.0));

        assert!(!page.sets_rect.is_empty());
        assert!(page.inter_margins_rects.is_empty());
    }

    #[test]
    fn test_custom_mode_uses_relative_rects() {
        let mut settings = bare_settings();
        settings.positions = SetsPositionSettings::custom(vec![
            Rect::new(0.0, 0.0, 1.0, 0.5),
            Rect::new(0.25, 0.5, 0.5, 0.5),
        ]);

        let mut page = test_page(2, &settings);
        page.compute_layout(Rect::new(0.0, 0.0, 1000.0, 1000.0));

        assert_eq!(page.sets[0].rect_on_page, Rect::new(0.0, 0.0, 1000.0, 500.0));
        assert_eq!(page.sets[1].rect_on_page, Rect::new(250.0, 500.0, 500.0, 500.0));
    }
}
