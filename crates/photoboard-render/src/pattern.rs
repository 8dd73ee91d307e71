//! Pattern brushes for page backgrounds. A pattern is rasterized once
//! per page at the reference resolution and then drawn like a
//! background photo, so both backends share one code path.

use image::RgbaImage;
use photoboard_layout::{Color, PatternStyle};
use tiny_skia::{Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::{RenderError, Result};

const LINE_SPACING: f32 = 8.0;
const DOT_SPACING: f32 = 6.0;

/// Rasterize a repeating pattern over a transparent surface.
pub fn render_pattern(
    style: PatternStyle,
    color: Color,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let mut pixmap = Pixmap::new(width.max(1), height.max(1)).ok_or_else(|| {
        RenderError::InvalidConfiguration(format!("invalid pattern size {width}x{height}"))
    })?;

    let mut paint = Paint::default();
    paint.set_color(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    paint.anti_alias = true;

    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;

    match style {
        PatternStyle::Horizontal => stroke_lines(&mut pixmap, &paint, horizontal_lines(w, h)),
        PatternStyle::Vertical => stroke_lines(&mut pixmap, &paint, vertical_lines(w, h)),
        PatternStyle::Cross => {
            stroke_lines(&mut pixmap, &paint, horizontal_lines(w, h));
            stroke_lines(&mut pixmap, &paint, vertical_lines(w, h));
        }
        PatternStyle::BDiag => stroke_lines(&mut pixmap, &paint, diagonal_lines(w, h, true)),
        PatternStyle::FDiag => stroke_lines(&mut pixmap, &paint, diagonal_lines(w, h, false)),
        PatternStyle::DiagCross => {
            stroke_lines(&mut pixmap, &paint, diagonal_lines(w, h, true));
            stroke_lines(&mut pixmap, &paint, diagonal_lines(w, h, false));
        }
        PatternStyle::Dense => dots(&mut pixmap, &paint, w, h),
    }

    Ok(demultiplied(pixmap))
}

type Segment = ((f32, f32), (f32, f32));

fn horizontal_lines(w: f32, h: f32) -> Vec<Segment> {
    let mut lines = Vec::new();
    let mut y = LINE_SPACING / 2.0;
    while y < h {
        lines.push(((0.0, y), (w, y)));
        y += LINE_SPACING;
    }
    lines
}

fn vertical_lines(w: f32, h: f32) -> Vec<Segment> {
    let mut lines = Vec::new();
    let mut x = LINE_SPACING / 2.0;
    while x < w {
        lines.push(((x, 0.0), (x, h)));
        x += LINE_SPACING;
    }
    lines
}

fn diagonal_lines(w: f32, h: f32, backward: bool) -> Vec<Segment> {
    let mut lines = Vec::new();
    let span = w + h;
    let mut offset = -span;
    while offset < span {
        if backward {
            // Bottom-left to top-right
            lines.push(((offset, h), (offset + h, 0.0)));
        } else {
            // Top-left to bottom-right
            lines.push(((offset, 0.0), (offset + h, h)));
        }
        offset += LINE_SPACING;
    }
    lines
}

fn stroke_lines(pixmap: &mut Pixmap, paint: &Paint, segments: Vec<Segment>) {
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    for ((x0, y0), (x1, y1)) in segments {
        let mut builder = PathBuilder::new();
        builder.move_to(x0, y0);
        builder.line_to(x1, y1);
        if let Some(path) = builder.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
        }
    }
}

fn dots(pixmap: &mut Pixmap, paint: &Paint, w: f32, h: f32) {
    let mut y = DOT_SPACING / 2.0;
    let mut row = 0;
    while y < h {
        let stagger = if row % 2 == 0 { 0.0 } else { DOT_SPACING / 2.0 };
        let mut x = DOT_SPACING / 2.0 + stagger;
        while x < w {
            if let Some(rect) = tiny_skia::Rect::from_xywh(x, y, 1.5, 1.5) {
                pixmap.fill_rect(rect, paint, Transform::identity(), None);
            }
            x += DOT_SPACING;
        }
        y += DOT_SPACING;
        row += 1;
    }
}

fn demultiplied(pixmap: Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (src, dst) in pixmap.pixels().iter().zip(out.pixels_mut()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
    out
}
