//! Fitting a photo into its layout rectangle: rotation, scaling mode
//! and alignment.

use image::{DynamicImage, GenericImageView, RgbaImage};
use photoboard_layout::{Alignment, HAlign, Photo, PhotoAdjust, Rect, VAlign};

/// The image to paint and the rectangle to paint it into, after
/// applying the photo's rotation, scaling mode and alignment. Returns
/// `None` when nothing would be visible.
pub fn fit_photo(photo: &Photo, target: Rect, adjust: PhotoAdjust, alignment: Alignment) -> Option<(RgbaImage, Rect)> {
    if target.is_empty() {
        return None;
    }

    let rotated = rotate(photo);
    let (src_w, src_h) = rotated.dimensions();
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let scale = match adjust {
        PhotoAdjust::Fit => fit_scale(src_w, src_h, target),
        PhotoAdjust::Extend => cover_scale(src_w, src_h, target),
        PhotoAdjust::Center => 1.0,
        PhotoAdjust::Fill => {
            // Non-uniform stretch: the whole rectangle, no alignment
            return Some((rotated.to_rgba8(), target));
        }
    };

    let dest_w = src_w as f64 * scale;
    let dest_h = src_h as f64 * scale;

    if dest_w <= target.width + 1e-6 && dest_h <= target.height + 1e-6 {
        // Fits entirely: place by alignment
        let dest = Rect::new(
            align_offset(target.x, target.width, dest_w, h_factor(alignment.horizontal)),
            align_offset(target.y, target.height, dest_h, v_factor(alignment.vertical)),
            dest_w,
            dest_h,
        );
        Some((rotated.to_rgba8(), dest))
    } else {
        // Overflows (Extend, or Center with a large photo): crop the
        // source to the visible window and fill the rectangle
        let visible_w = (target.width / scale).min(src_w as f64);
        let visible_h = (target.height / scale).min(src_h as f64);
        let crop_x = (src_w as f64 - visible_w) * h_factor(alignment.horizontal);
        let crop_y = (src_h as f64 - visible_h) * v_factor(alignment.vertical);

        let cropped = rotated
            .crop_imm(
                crop_x as u32,
                crop_y as u32,
                (visible_w as u32).max(1),
                (visible_h as u32).max(1),
            )
            .to_rgba8();
        Some((cropped, target))
    }
}

fn rotate(photo: &Photo) -> DynamicImage {
    let image = photo.image.as_ref();
    match photo.rotation.rem_euclid(360) {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image.clone(),
    }
}

fn fit_scale(src_w: u32, src_h: u32, target: Rect) -> f64 {
    let scale_w = target.width / src_w as f64;
    let scale_h = target.height / src_h as f64;
    scale_w.min(scale_h)
}

fn cover_scale(src_w: u32, src_h: u32, target: Rect) -> f64 {
    let scale_w = target.width / src_w as f64;
    let scale_h = target.height / src_h as f64;
    scale_w.max(scale_h)
}

fn h_factor(align: HAlign) -> f64 {
    match align {
        HAlign::Left => 0.0,
        HAlign::Center => 0.5,
        HAlign::Right => 1.0,
    }
}

fn v_factor(align: VAlign) -> f64 {
    match align {
        VAlign::Top => 0.0,
        VAlign::Center => 0.5,
        VAlign::Bottom => 1.0,
    }
}

fn align_offset(origin: f64, available: f64, used: f64, factor: f64) -> f64 {
    origin + (available - used) * factor
}
