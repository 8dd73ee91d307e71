//! Rich-text consigns: placeholder substitution, markup parsing and
//! drawing.
//!
//! Consigns are authored as a small XML subset at the reference
//! resolution: `<doc><p align="center"><span
//! style="font-size:12pt; color:#204080">…</span><img src="logo.png"
//! width="32" height="32"/></p></doc>`. Before every draw the markup
//! goes through a textual substitution pass that resolves the `$…$`
//! placeholders and rescales font sizes and image dimensions to the
//! output resolution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::RgbaImage;
use photoboard_layout::{Color, HAlign, Rect};

use crate::fonts::{FontFace, FontRegistry};
use crate::painter::{Painter, TextRun};
use crate::{Result, REFERENCE_DPI};

/// Default font size in points at the reference resolution
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Per-render context consumed by placeholder substitution
#[derive(Debug, Clone, Default)]
pub struct ExtraInfo {
    /// 0-based index of the page being drawn
    pub page_num: usize,
    pub pages_nb: usize,
    /// 0-based global index of the current photo
    pub photo_num: usize,
    pub photo_total: usize,
    pub photo_name: String,
    pub photo_date: Option<DateTime<Local>>,
    pub preview: bool,
}

/// Inline images referenced from markup, loaded once per render
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, Option<Arc<RgbaImage>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, src: &str) -> Option<Arc<RgbaImage>> {
        self.entries
            .entry(src.to_string())
            .or_insert_with(|| match image::open(src) {
                Ok(image) => Some(Arc::new(image.to_rgba8())),
                Err(e) => {
                    log::warn!("Failed to load inline image {src}: {e}");
                    None
                }
            })
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Rewrite markup for one draw: scale every `font-size:Npt` value and
/// every `<img>` width/height attribute by `size_factor`, then
/// resolve the placeholders. Runs once per item per render; the
/// result is page- and photo-specific and is never cached.
pub fn substitute(markup: &str, size_factor: f64, info: &ExtraInfo) -> String {
    let mut out = scale_font_sizes(markup, size_factor);
    out = out.replace("$nom$", "$name$");
    out = out.replace("$name$", &info.photo_name);
    out = out.replace("$date$", &Local::now().format("%d/%m/%Y").to_string());
    out = out.replace(
        "$date_photo$",
        &info
            .photo_date
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
    );
    out = out.replace(
        "$num_page$",
        &format!("{}/{}", info.page_num + 1, info.pages_nb),
    );
    out = out.replace(
        "$num_photo$",
        &format!("{}/{}", info.photo_num + 1, info.photo_total),
    );
    scale_image_attrs(&out, size_factor)
}

fn format_value(value: f64) -> String {
    // Keep round values compact so files round-trip cleanly
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value}")
    }
}

fn scale_font_sizes(markup: &str, factor: f64) -> String {
    const KEY: &str = "font-size:";
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find(KEY) {
        let value_start = pos + KEY.len();
        out.push_str(&rest[..value_start]);
        rest = &rest[value_start..];

        let Some(end) = rest.find("pt") else {
            break;
        };
        match rest[..end].trim().parse::<f64>() {
            Ok(value) => {
                out.push_str(&format_value(value * factor));
                out.push_str("pt");
            }
            Err(_) => out.push_str(&rest[..end + 2]),
        }
        rest = &rest[end + 2..];
    }

    out.push_str(rest);
    out
}

fn scale_image_attrs(markup: &str, factor: f64) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find("<img") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let Some(end) = rest.find("/>") else {
            break;
        };
        let mut tag = rest[..end + 2].to_string();
        for attr in ["width", "height"] {
            tag = scale_attr(tag, attr, factor);
        }
        out.push_str(&tag);
        rest = &rest[end + 2..];
    }

    out.push_str(rest);
    out
}

fn scale_attr(tag: String, name: &str, factor: f64) -> String {
    let key = format!("{name}=\"");
    let Some(pos) = tag.find(&key) else {
        return tag;
    };
    let value_start = pos + key.len();
    let Some(value_len) = tag[value_start..].find('"') else {
        return tag;
    };
    let Ok(value) = tag[value_start..value_start + value_len].parse::<f64>() else {
        return tag;
    };

    let mut out = String::with_capacity(tag.len());
    out.push_str(&tag[..value_start]);
    out.push_str(&format_value(value * factor));
    out.push_str(&tag[value_start + value_len..]);
    out
}

// ---------------------------------------------------------------------------
// Markup model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_pt: f64,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    fn base(size_pt: f64) -> Self {
        Self {
            size_pt,
            color: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, style: TextStyle },
    Image { src: String, width: f64, height: f64 },
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub align: HAlign,
    pub inlines: Vec<Inline>,
}

/// Parse substituted markup. Malformed markup never fails a render:
/// it degrades to one unstyled block holding the raw text.
pub fn parse_markup(markup: &str, default_size_pt: f64) -> Vec<Block> {
    if markup.trim().is_empty() {
        return Vec::new();
    }

    let document = match roxmltree::Document::parse(markup) {
        Ok(document) => document,
        Err(e) => {
            log::debug!("Markup is not well-formed ({e}); drawing as plain text");
            return vec![Block {
                align: HAlign::Left,
                inlines: vec![Inline::Text {
                    text: markup.to_string(),
                    style: TextStyle::base(default_size_pt),
                }],
            }];
        }
    };

    let base = TextStyle::base(default_size_pt);
    let root = document.root_element();
    let mut blocks = Vec::new();
    let mut implicit = Block {
        align: HAlign::Left,
        inlines: Vec::new(),
    };

    for child in root.children() {
        if child.is_element() && child.tag_name().name() == "p" {
            flush_block(&mut blocks, &mut implicit);
            let mut block = Block {
                align: parse_align(child.attribute("align")),
                inlines: Vec::new(),
            };
            let style = parse_style_attr(child.attribute("style"), base);
            for inline in child.children() {
                collect_inlines(inline, style, &mut block.inlines);
            }
            blocks.push(block);
        } else {
            collect_inlines(child, base, &mut implicit.inlines);
        }
    }
    flush_block(&mut blocks, &mut implicit);

    blocks
}

fn flush_block(blocks: &mut Vec<Block>, implicit: &mut Block) {
    if !implicit.inlines.is_empty() {
        blocks.push(std::mem::replace(
            implicit,
            Block {
                align: HAlign::Left,
                inlines: Vec::new(),
            },
        ));
    }
}

fn collect_inlines(node: roxmltree::Node, style: TextStyle, out: &mut Vec<Inline>) {
    if node.is_text() {
        if let Some(text) = node.text() {
            if !text.trim().is_empty() {
                out.push(Inline::Text {
                    text: text.to_string(),
                    style,
                });
            }
        }
        return;
    }
    if !node.is_element() {
        return;
    }

    let mut style = style;
    match node.tag_name().name() {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        "u" => style.underline = true,
        "br" => {
            out.push(Inline::Break);
            return;
        }
        "img" => {
            let src = node.attribute("src").unwrap_or_default().to_string();
            let width = parse_length(node.attribute("width"));
            let height = parse_length(node.attribute("height"));
            out.push(Inline::Image { src, width, height });
            return;
        }
        "span" | "p" => style = parse_style_attr(node.attribute("style"), style),
        other => {
            log::debug!("Ignoring unknown markup element <{other}>");
        }
    }

    for child in node.children() {
        collect_inlines(child, style, out);
    }
}

fn parse_align(value: Option<&str>) -> HAlign {
    match value {
        Some("center") => HAlign::Center,
        Some("right") => HAlign::Right,
        _ => HAlign::Left,
    }
}

fn parse_length(value: Option<&str>) -> f64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

fn parse_style_attr(attr: Option<&str>, base: TextStyle) -> TextStyle {
    let mut style = base;
    let Some(attr) = attr else {
        return style;
    };

    for declaration in attr.split(';') {
        let Some((key, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "font-size" => {
                if let Ok(size) = value.trim_end_matches("pt").trim().parse() {
                    style.size_pt = size;
                }
            }
            "color" => {
                if let Some(color) = parse_hex_color(value) {
                    style.color = color;
                }
            }
            "font-weight" => style.bold = value == "bold" || value.parse::<u32>().is_ok_and(|w| w >= 600),
            "font-style" => style.italic = value == "italic" || value == "oblique",
            "text-decoration" => style.underline = value == "underline",
            _ => {}
        }
    }
    style
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::rgb(r, g, b))
}

// ---------------------------------------------------------------------------
// Layout and drawing
// ---------------------------------------------------------------------------

/// Substitute, parse, wrap and draw markup into `rect`. Lines that
/// would overflow the rectangle's height are clipped away.
pub fn draw_markup(
    painter: &mut dyn Painter,
    fonts: &FontRegistry,
    images: &mut ImageCache,
    markup: &str,
    rect: Rect,
    size_factor: f64,
    info: &ExtraInfo,
) -> Result<()> {
    if markup.trim().is_empty() || rect.is_empty() {
        return Ok(());
    }

    let substituted = substitute(markup, size_factor, info);
    let blocks = parse_markup(&substituted, DEFAULT_FONT_SIZE_PT * size_factor);
    if blocks.is_empty() {
        return Ok(());
    }

    let face = fonts.default_face()?;
    let mut cursor_y = rect.y;

    'blocks: for block in &blocks {
        let lines = wrap_block(block, &face, images, rect.width)?;
        for line in lines {
            if cursor_y + line.height > rect.bottom() + 0.5 {
                break 'blocks;
            }
            draw_line(painter, &face, images, &line, rect, cursor_y, block.align)?;
            cursor_y += line.height;
        }
    }

    Ok(())
}

/// Authored points to output pixels: sizes were already scaled to the
/// output resolution, so only the reference pt→px factor remains.
fn px_size(size_pt: f64) -> f64 {
    size_pt * REFERENCE_DPI / 72.0
}

struct LineItem {
    x: f64,
    width: f64,
    ascent: f64,
    descent: f64,
    kind: ItemKind,
}

enum ItemKind {
    Text { text: String, style: TextStyle },
    Image { src: String, height: f64 },
}

struct Line {
    items: Vec<LineItem>,
    width: f64,
    height: f64,
    ascent: f64,
}

fn wrap_block(
    block: &Block,
    face: &FontFace,
    images: &mut ImageCache,
    max_width: f64,
) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    let mut current: Vec<LineItem> = Vec::new();
    let mut x = 0.0;

    let flush =
        |current: &mut Vec<LineItem>, x: &mut f64, lines: &mut Vec<Line>, face: &FontFace| {
            let ascent = current
                .iter()
                .map(|item| item.ascent)
                .fold(face.ascent(px_size(DEFAULT_FONT_SIZE_PT)), f64::max);
            let descent = current.iter().map(|item| item.descent).fold(0.0, f64::max);
            lines.push(Line {
                width: *x,
                height: ascent + descent,
                ascent,
                items: std::mem::take(current),
            });
            *x = 0.0;
        };

    for inline in &block.inlines {
        match inline {
            Inline::Break => flush(&mut current, &mut x, &mut lines, face),
            Inline::Image { src, width, height } => {
                let (mut width, mut height) = (*width, *height);
                if width <= 0.0 || height <= 0.0 {
                    if let Some(image) = images.get(src) {
                        width = image.width() as f64;
                        height = image.height() as f64;
                    }
                }
                if x > 0.0 && x + width > max_width {
                    flush(&mut current, &mut x, &mut lines, face);
                }
                current.push(LineItem {
                    x,
                    width,
                    ascent: height,
                    descent: 0.0,
                    kind: ItemKind::Image {
                        src: src.clone(),
                        height,
                    },
                });
                x += width;
            }
            Inline::Text { text, style } => {
                let size = px_size(style.size_pt);
                let space_width = face.measure(" ", size)?;
                let ascent = face.ascent(size);
                let descent = -face.descent(size);

                for word in text.split_whitespace() {
                    let word_width = face.measure(word, size)?;
                    let lead = if x > 0.0 { space_width } else { 0.0 };
                    if x > 0.0 && x + lead + word_width > max_width {
                        flush(&mut current, &mut x, &mut lines, face);
                    }
                    let lead = if x > 0.0 { space_width } else { 0.0 };

                    // Extend the previous run when the style matches,
                    // to keep run counts low
                    match current.last_mut() {
                        Some(LineItem {
                            kind: ItemKind::Text { text, style: prev },
                            width,
                            ..
                        }) if *prev == *style && lead > 0.0 => {
                            text.push(' ');
                            text.push_str(word);
                            *width += lead + word_width;
                        }
                        _ => {
                            current.push(LineItem {
                                x: x + lead,
                                width: word_width,
                                ascent,
                                descent,
                                kind: ItemKind::Text {
                                    text: word.to_string(),
                                    style: *style,
                                },
                            });
                        }
                    }
                    x += lead + word_width;
                }
            }
        }
    }

    if !current.is_empty() {
        flush(&mut current, &mut x, &mut lines, face);
    }
    Ok(lines)
}

fn draw_line(
    painter: &mut dyn Painter,
    face: &FontFace,
    images: &mut ImageCache,
    line: &Line,
    rect: Rect,
    y: f64,
    align: HAlign,
) -> Result<()> {
    let offset = match align {
        HAlign::Left => 0.0,
        HAlign::Center => (rect.width - line.width).max(0.0) / 2.0,
        HAlign::Right => (rect.width - line.width).max(0.0),
    };
    let baseline_y = y + line.ascent;

    for item in &line.items {
        let x = rect.x + offset + item.x;
        match &item.kind {
            ItemKind::Text { text, style } => {
                let size = px_size(style.size_pt);
                painter.draw_text_run(&TextRun {
                    face,
                    text,
                    x,
                    baseline_y,
                    px_size: size,
                    color: style.color,
                })?;
                if style.underline {
                    let thickness = (size / 14.0).max(1.0);
                    painter.fill_rect(
                        Rect::new(x, baseline_y + thickness, item.width, thickness),
                        style.color,
                        1.0,
                    );
                }
            }
            ItemKind::Image { src, height } => {
                if let Some(image) = images.get(src) {
                    painter.draw_image(
                        &image,
                        Rect::new(x, baseline_y - height, item.width, *height),
                    )?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ExtraInfo {
        ExtraInfo {
            page_num: 1,
            pages_nb: 3,
            photo_num: 4,
            photo_total: 9,
            photo_name: "holiday".to_string(),
            photo_date: None,
            preview: false,
        }
    }

    #[test]
    fn test_name_placeholder_and_alias() {
        assert_eq!(substitute("Hello $name$", 1.0, &info()), "Hello holiday");
        assert_eq!(substitute("Hello $nom$", 1.0, &info()), "Hello holiday");
    }

    #[test]
    fn test_page_and_photo_counters_are_one_based() {
        assert_eq!(substitute("$num_page$", 1.0, &info()), "2/3");
        assert_eq!(substitute("$num_photo$", 1.0, &info()), "5/9");
    }

    #[test]
    fn test_date_placeholder_uses_day_month_year() {
        let today = Local::now().format("%d/%m/%Y").to_string();
        assert_eq!(substitute("$date$", 1.0, &info()), today);
    }

    #[test]
    fn test_missing_photo_date_becomes_empty() {
        assert_eq!(substitute("at $date_photo$!", 1.0, &info()), "at !");
    }

    #[test]
    fn test_font_sizes_scale_by_factor() {
        let markup = r#"<span style="font-size:12pt; color:#000000">x</span>"#;
        let out = substitute(markup, 2.5, &info());
        assert!(out.contains("font-size:30pt"), "{out}");
        assert!(out.contains("color:#000000"));
    }

    #[test]
    fn test_multiple_font_sizes_all_scale() {
        let markup = "font-size:10pt font-size:8.25pt";
        let out = substitute(markup, 2.0, &info());
        assert_eq!(out, "font-size:20pt font-size:16.5pt");
    }

    #[test]
    fn test_image_dimensions_scale_by_factor() {
        let markup = r#"a<img src="x.png" width="32" height="16"/>b"#;
        let out = substitute(markup, 3.0, &info());
        assert_eq!(out, r#"a<img src="x.png" width="96" height="48"/>b"#);
    }

    #[test]
    fn test_parse_blocks_and_styles() {
        let markup = r#"<doc><p align="center"><span style="font-size:14pt; color:#ff0000">Big</span> small</p><p>next</p></doc>"#;
        let blocks = parse_markup(markup, 12.0);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].align, HAlign::Center);
        match &blocks[0].inlines[0] {
            Inline::Text { text, style } => {
                assert_eq!(text, "Big");
                assert_eq!(style.size_pt, 14.0);
                assert_eq!(style.color, Color::rgb(255, 0, 0));
            }
            other => panic!("unexpected inline {other:?}"),
        }
        match &blocks[0].inlines[1] {
            Inline::Text { style, .. } => assert_eq!(style.size_pt, 12.0),
            other => panic!("unexpected inline {other:?}"),
        }
    }

    #[test]
    fn test_parse_bold_and_break() {
        let markup = "<doc><p><b>bold</b><br/><u>under</u></p></doc>";
        let blocks = parse_markup(markup, 12.0);
        let inlines = &blocks[0].inlines;

        assert!(matches!(&inlines[0], Inline::Text { style, .. } if style.bold));
        assert!(matches!(&inlines[1], Inline::Break));
        assert!(matches!(&inlines[2], Inline::Text { style, .. } if style.underline));
    }

    #[test]
    fn test_malformed_markup_falls_back_to_plain_text() {
        let blocks = parse_markup("just some <unclosed text", 10.0);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(
            &blocks[0].inlines[0],
            Inline::Text { text, .. } if text.contains("just some")
        ));
    }

    #[test]
    fn test_empty_markup_has_no_blocks() {
        assert!(parse_markup("", 12.0).is_empty());
        assert!(parse_markup("   ", 12.0).is_empty());
    }
}
