//! The print backend: translates the shared painter calls into
//! printpdf operations. Layout coordinates are pixels with a top-left
//! origin; PDF space is points with a bottom-left origin, so every
//! call converts and flips.

use std::collections::HashMap;

use ::image::RgbaImage;
use photoboard_layout::Rect as LayoutRect;
use printpdf::*;

use crate::fonts::FontFace;
use crate::painter::{grayscale_image, luma, Painter, TextRun};
use crate::{RenderError, Result};

/// Fonts already embedded into the output document, keyed by the
/// registry face they came from
pub type EmbeddedFonts = HashMap<usize, FontId>;

pub struct PdfPainter<'a> {
    doc: &'a mut PdfDocument,
    fonts: &'a mut EmbeddedFonts,
    ops: Vec<Op>,
    width_px: f64,
    height_px: f64,
    /// Points per layout pixel at the output resolution
    px_to_pt: f64,
    grayscale: bool,
}

impl<'a> PdfPainter<'a> {
    pub fn new(
        doc: &'a mut PdfDocument,
        fonts: &'a mut EmbeddedFonts,
        width_px: f64,
        height_px: f64,
        dpi: u32,
        grayscale: bool,
    ) -> Self {
        Self {
            doc,
            fonts,
            ops: Vec::new(),
            width_px,
            height_px,
            px_to_pt: 72.0 / dpi.max(1) as f64,
            grayscale,
        }
    }

    /// The accumulated operation stream for one page
    pub fn finish(self) -> Vec<Op> {
        self.ops
    }

    fn pt_x(&self, x_px: f64) -> Pt {
        Pt((x_px * self.px_to_pt) as f32)
    }

    /// Flip the y axis: layout y grows downward, PDF y upward
    fn pt_y(&self, y_px: f64) -> Pt {
        Pt(((self.height_px - y_px) * self.px_to_pt) as f32)
    }

    fn color(&self, color: photoboard_layout::Color) -> Color {
        let (r, g, b) = if self.grayscale {
            let gray = luma(color) as f32 / 255.0;
            (gray, gray, gray)
        } else {
            (
                color.r as f32 / 255.0,
                color.g as f32 / 255.0,
                color.b as f32 / 255.0,
            )
        };
        Color::Rgb(Rgb::new(r, g, b, None))
    }

    fn rect_ring(&self, rect: LayoutRect) -> PolygonRing {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        PolygonRing {
            points: corners
                .into_iter()
                .map(|(x, y)| LinePoint {
                    p: Point {
                        x: self.pt_x(x),
                        y: self.pt_y(y),
                    },
                    bezier: false,
                })
                .collect(),
        }
    }

    fn font_id(&mut self, face: &FontFace) -> Result<FontId> {
        let key = face as *const FontFace as usize;
        if let Some(id) = self.fonts.get(&key) {
            return Ok(id.clone());
        }

        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(face.data(), face.index() as usize, &mut warnings)
            .ok_or_else(|| {
                RenderError::Pdf(format!("failed to embed font '{}'", face.family))
            })?;
        let id = self.doc.add_font(&parsed);
        self.fonts.insert(key, id.clone());
        Ok(id)
    }
}

impl Painter for PdfPainter<'_> {
    fn size(&self) -> (f64, f64) {
        (self.width_px, self.height_px)
    }

    fn fill_rect(&mut self, rect: LayoutRect, color: photoboard_layout::Color, opacity: f64) {
        if rect.is_empty() || opacity <= 0.0 {
            return;
        }
        let col = self.color(color);
        let polygon = Polygon {
            rings: vec![self.rect_ring(rect)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        };
        self.ops.push(Op::SetFillColor { col });
        self.ops.push(Op::DrawPolygon { polygon });
    }

    fn stroke_rect(&mut self, rect: LayoutRect, color: photoboard_layout::Color, width: f64, dashed: bool) {
        if rect.is_empty() {
            return;
        }
        let col = self.color(color);
        let width_pt = (width * self.px_to_pt) as f32;
        let polygon = Polygon {
            rings: vec![self.rect_ring(rect)],
            mode: PaintMode::Stroke,
            winding_order: WindingOrder::NonZero,
        };

        self.ops.push(Op::SetOutlineColor { col });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(width_pt) });
        if dashed {
            let dash_len = (width_pt * 3.0).ceil().max(1.0) as i64;
            self.ops.push(Op::SetLineDashPattern {
                dash: LineDashPattern {
                    offset: 0,
                    dash_1: Some(dash_len),
                    gap_1: Some(dash_len),
                    ..LineDashPattern::default()
                },
            });
        }
        self.ops.push(Op::DrawPolygon { polygon });
        if dashed {
            self.ops.push(Op::SetLineDashPattern {
                dash: LineDashPattern::default(),
            });
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: LayoutRect) -> Result<()> {
        if rect.is_empty() || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }

        let mut encoded = Vec::new();
        if self.grayscale {
            let mut gray = image.clone();
            grayscale_image(&mut gray);
            gray.write_to(&mut std::io::Cursor::new(&mut encoded), ::image::ImageFormat::Png)?;
        } else {
            image.write_to(&mut std::io::Cursor::new(&mut encoded), ::image::ImageFormat::Png)?;
        }

        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&encoded, &mut warnings)
            .map_err(|e| RenderError::Pdf(format!("failed to embed image: {e}")))?;
        let id = self.doc.add_image(&raw);

        // Pin the image resolution to 72 dpi so one source pixel maps
        // to one point before scaling
        let scale_x = (rect.width * self.px_to_pt) as f32 / image.width() as f32;
        let scale_y = (rect.height * self.px_to_pt) as f32 / image.height() as f32;
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(self.pt_x(rect.x)),
                translate_y: Some(self.pt_y(rect.bottom())),
                rotate: None,
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(72.0),
            },
        });
        Ok(())
    }

    fn draw_text_run(&mut self, run: &TextRun<'_>) -> Result<()> {
        if run.text.is_empty() || run.px_size <= 0.0 {
            return Ok(());
        }
        let font = self.font_id(run.face)?;
        let col = self.color(run.color);
        let size = Pt((run.px_size * self.px_to_pt) as f32);

        self.ops.push(Op::SetFillColor { col });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(self.pt_x(run.x), self.pt_y(run.baseline_y)),
        });
        self.ops.push(Op::SetFontSize {
            size,
            font: font.clone(),
        });
        self.ops.push(Op::WriteText {
            items: vec![TextItem::Text(run.text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
        Ok(())
    }
}
