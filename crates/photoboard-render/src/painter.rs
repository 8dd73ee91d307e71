//! The drawing surface abstraction shared by the preview and print
//! paths. The render pass paints through this trait so both backends
//! see the same geometry: pixel coordinates at the output resolution,
//! origin top-left.

use image::RgbaImage;
use photoboard_layout::{Color, Rect};

use crate::fonts::FontFace;
use crate::Result;

/// One horizontal run of text, positioned at its baseline
pub struct TextRun<'a> {
    pub face: &'a FontFace,
    pub text: &'a str,
    pub x: f64,
    pub baseline_y: f64,
    /// Glyph size in pixels at the output resolution
    pub px_size: f64,
    pub color: Color,
}

pub trait Painter {
    /// Page dimensions in pixels
    fn size(&self) -> (f64, f64);

    /// Fill a rectangle. Translucency is honored by the raster
    /// backend only; the PDF backend paints opaquely (the translucent
    /// zone overlay never reaches a PDF).
    fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f64);

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64, dashed: bool);

    /// Draw an image scaled to exactly cover `rect`
    fn draw_image(&mut self, image: &RgbaImage, rect: Rect) -> Result<()>;

    fn draw_text_run(&mut self, run: &TextRun<'_>) -> Result<()>;
}

/// Rec. 601 luma, the grayscale contract for both backends
pub fn luma(color: Color) -> u8 {
    (0.299 * color.r as f64 + 0.587 * color.g as f64 + 0.114 * color.b as f64).round() as u8
}

/// Convert an image to its luminance in place
pub fn grayscale_image(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let gray = luma(Color::rgba(pixel.0[0], pixel.0[1], pixel.0[2], pixel.0[3]));
        pixel.0[0] = gray;
        pixel.0[1] = gray;
        pixel.0[2] = gray;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_formula() {
        // round(0.299×100 + 0.587×150 + 0.114×200) = round(140.75)
        assert_eq!(luma(Color::rgb(100, 150, 200)), 141);
        assert_eq!(luma(Color::WHITE), 255);
        assert_eq!(luma(Color::BLACK), 0);
    }

    #[test]
    fn test_grayscale_image_sets_all_channels() {
        let mut image = RgbaImage::from_pixel(2, 1, image::Rgba([100, 150, 200, 255]));
        grayscale_image(&mut image);

        for pixel in image.pixels() {
            assert_eq!(pixel.0, [141, 141, 141, 255]);
        }
    }
}
