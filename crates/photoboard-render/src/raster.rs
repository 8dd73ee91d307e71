//! The raster backend: paints onto a tiny-skia pixmap, used for the
//! on-screen preview and for rasterizing pattern tiles.

use image::RgbaImage;
use photoboard_layout::{Color, Rect};
use tiny_skia::{
    FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};
use ttf_parser::OutlineBuilder;

use crate::painter::{Painter, TextRun};
use crate::{RenderError, Result};

pub struct RasterPainter {
    pixmap: Pixmap,
}

impl RasterPainter {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::InvalidConfiguration(format!("invalid raster size {width}x{height}"))
        })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 255, 255, 255));
        Ok(Self { pixmap })
    }

    /// Demultiply the finished pixmap into a plain RGBA image
    pub fn into_image(self) -> RgbaImage {
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let mut out = RgbaImage::new(width, height);

        for (src, dst) in self.pixmap.pixels().iter().zip(out.pixels_mut()) {
            let color = src.demultiply();
            dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
        }
        out
    }
}

fn to_sk_color(color: Color, opacity: f64) -> tiny_skia::Color {
    let alpha = (color.a as f64 / 255.0 * opacity.clamp(0.0, 1.0)) as f32;
    tiny_skia::Color::from_rgba(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        alpha,
    )
    .unwrap_or_else(|| tiny_skia::Color::from_rgba8(0, 0, 0, 255))
}

fn to_sk_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

pub(crate) fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (src, dst) in image.pixels().zip(pixmap.pixels_mut()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

impl Painter for RasterPainter {
    fn size(&self) -> (f64, f64) {
        (self.pixmap.width() as f64, self.pixmap.height() as f64)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f64) {
        let Some(sk_rect) = to_sk_rect(rect) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(to_sk_color(color, opacity));
        paint.anti_alias = false;
        self.pixmap
            .fill_rect(sk_rect, &paint, Transform::identity(), None);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64, dashed: bool) {
        let Some(sk_rect) = to_sk_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(sk_rect);

        let mut paint = Paint::default();
        paint.set_color(to_sk_color(color, 1.0));
        paint.anti_alias = true;

        let width = width.max(0.1) as f32;
        let stroke = Stroke {
            width,
            dash: if dashed {
                StrokeDash::new(vec![width * 3.0, width * 2.0], 0.0)
            } else {
                None
            },
            ..Stroke::default()
        };

        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: Rect) -> Result<()> {
        if rect.is_empty() || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let source = pixmap_from_image(image).ok_or_else(|| {
            RenderError::InvalidConfiguration("image too large for raster surface".to_string())
        })?;

        let sx = rect.width as f32 / image.width() as f32;
        let sy = rect.height as f32 / image.height() as f32;
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, rect.x as f32, rect.y as f32);

        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
        Ok(())
    }

    fn draw_text_run(&mut self, run: &TextRun<'_>) -> Result<()> {
        let mut paint = Paint::default();
        paint.set_color(to_sk_color(run.color, 1.0));
        paint.anti_alias = true;

        run.face.with_face(|face| {
            let units_per_em = face.units_per_em().max(1) as f64;
            let scale = run.px_size / units_per_em;
            let mut pen_x = run.x;

            for ch in run.text.chars() {
                let Some(glyph) = face.glyph_index(ch) else {
                    continue;
                };

                let mut builder = GlyphPathBuilder::new(pen_x, run.baseline_y, scale as f32);
                if face.outline_glyph(glyph, &mut builder).is_some() {
                    if let Some(path) = builder.finish() {
                        self.pixmap.fill_path(
                            &path,
                            &paint,
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }

                let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
                pen_x += advance as f64 * scale;
            }
        })
    }
}

/// Converts font-unit outlines (y up) into pixel-space paths (y down)
/// anchored at a baseline origin.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f64, origin_y: f64, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x: origin_x as f32,
            origin_y: origin_y as f32,
            scale,
        }
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }

    fn px(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        )
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x, y) = self.px(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x2, y2) = self.px(x2, y2);
        let (x, y) = self.px(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_covers_exact_rect() {
        let mut painter = RasterPainter::new(10, 10).unwrap();
        painter.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), Color::rgb(255, 0, 0), 1.0);

        let image = painter.into_image();
        assert_eq!(image.get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(7, 7).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut painter = RasterPainter::new(4, 4).unwrap();
        painter.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::BLACK, 0.5);

        let image = painter.into_image();
        let value = image.get_pixel(1, 1).0[0];
        assert!(value > 100 && value < 160, "expected mid gray, got {value}");
    }

    #[test]
    fn test_draw_image_scales_to_rect() {
        let mut painter = RasterPainter::new(8, 8).unwrap();
        let source = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        painter
            .draw_image(&source, Rect::new(0.0, 0.0, 8.0, 4.0))
            .unwrap();

        let image = painter.into_image();
        assert_eq!(image.get_pixel(7, 1).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(7, 6).0, [255, 255, 255, 255]);
    }
}
