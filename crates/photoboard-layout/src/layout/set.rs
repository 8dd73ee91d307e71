//! Per-set layout: splitting a set rectangle between photo and
//! consign according to the set's ratio and text position.

use crate::elements::PhotoSet;
use crate::types::{Position, Rect};

impl PhotoSet {
    /// Split the assigned rectangle between photo and consign. The
    /// photo takes `ratio_photo` of the split axis; `Position::On`
    /// gives both the whole rectangle.
    pub fn compute_layout(&mut self, upper_rect: Rect) {
        self.rect_on_page = upper_rect;

        let ratio = self.style.ratio_photo.clamp(0.0, 1.0);

        // Vertical split (text above or below)
        let consign_height_v = upper_rect.height * (1.0 - ratio);
        let photo_height_v = upper_rect.height * ratio;
        // Horizontal split (text beside)
        let consign_width_h = upper_rect.width * (1.0 - ratio);
        let photo_width_h = upper_rect.width * ratio;

        let (consign_rect, photo_rect) = match self.style.text_position {
            Position::Top => (
                Rect::new(upper_rect.x, upper_rect.y, upper_rect.width, consign_height_v),
                Rect::new(
                    upper_rect.x,
                    upper_rect.y + consign_height_v,
                    upper_rect.width,
                    photo_height_v,
                ),
            ),
            Position::Bottom => (
                Rect::new(
                    upper_rect.x,
                    upper_rect.y + photo_height_v,
                    upper_rect.width,
                    consign_height_v,
                ),
                Rect::new(upper_rect.x, upper_rect.y, upper_rect.width, photo_height_v),
            ),
            Position::Left => (
                Rect::new(upper_rect.x, upper_rect.y, consign_width_h, upper_rect.height),
                Rect::new(
                    upper_rect.x + consign_width_h,
                    upper_rect.y,
                    photo_width_h,
                    upper_rect.height,
                ),
            ),
            Position::Right => (
                Rect::new(
                    upper_rect.x + photo_width_h,
                    upper_rect.y,
                    consign_width_h,
                    upper_rect.height,
                ),
                Rect::new(upper_rect.x, upper_rect.y, photo_width_h, upper_rect.height),
            ),
            Position::On => (upper_rect, upper_rect),
        };

        self.consign.rect_on_page = consign_rect;
        self.photo_rect = photo_rect;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::elements::PhotoSet;
    use crate::photo::Photo;
    use crate::settings::{shared_text, SetStyleSettings};
    use crate::types::{Position, Rect};

    fn test_set(ratio: f64, position: Position) -> PhotoSet {
        let image = image::DynamicImage::new_rgba8(4, 4);
        let photo = Arc::new(Photo::with_name("p.png", "p", image));
        PhotoSet::new(
            0,
            0,
            photo,
            shared_text(""),
            SetStyleSettings {
                ratio_photo: ratio,
                text_position: position,
                ..SetStyleSettings::default()
            },
        )
    }

    #[test]
    fn test_text_on_top() {
        let mut set = test_set(0.75, Position::Top);
        set.compute_layout(Rect::new(0.0, 0.0, 400.0, 800.0));

        // Consign takes the top (1 - ratio) band, photo the rest
        assert_eq!(set.consign.rect_on_page, Rect::new(0.0, 0.0, 400.0, 200.0));
        assert_eq!(set.photo_rect, Rect::new(0.0, 200.0, 400.0, 600.0));
    }

    #[test]
    fn test_text_below() {
        let mut set = test_set(0.75, Position::Bottom);
        set.compute_layout(Rect::new(0.0, 0.0, 400.0, 800.0));

        assert_eq!(set.photo_rect, Rect::new(0.0, 0.0, 400.0, 600.0));
        assert_eq!(set.consign.rect_on_page, Rect::new(0.0, 600.0, 400.0, 200.0));
    }

    #[test]
    fn test_text_beside() {
        let mut set = test_set(0.5, Position::Left);
        set.compute_layout(Rect::new(100.0, 0.0, 400.0, 800.0));

        assert_eq!(set.consign.rect_on_page, Rect::new(100.0, 0.0, 200.0, 800.0));
        assert_eq!(set.photo_rect, Rect::new(300.0, 0.0, 200.0, 800.0));

        let mut set = test_set(0.5, Position::Right);
        set.compute_layout(Rect::new(100.0, 0.0, 400.0, 800.0));

        assert_eq!(set.photo_rect, Rect::new(100.0, 0.0, 200.0, 800.0));
        assert_eq!(set.consign.rect_on_page, Rect::new(300.0, 0.0, 200.0, 800.0));
    }

    #[test]
    fn test_overlay_shares_the_rectangle() {
        let mut set = test_set(0.75, Position::On);
        let rect = Rect::new(10.0, 20.0, 400.0, 800.0);
        set.compute_layout(rect);

        assert_eq!(set.photo_rect, rect);
        assert_eq!(set.consign.rect_on_page, rect);
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        let mut set = test_set(1.7, Position::Bottom);
        set.compute_layout(Rect::new(0.0, 0.0, 400.0, 800.0));

        assert_eq!(set.photo_rect.height, 800.0);
        assert_eq!(set.consign.rect_on_page.height, 0.0);
    }
}
