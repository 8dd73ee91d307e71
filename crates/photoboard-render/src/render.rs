//! The per-page draw pass. One code path paints onto either backend
//! through the [`Painter`] trait; a diagnostic zone overlay replaces
//! the normal backgrounds when requested.

use photoboard_layout::{
    read_text, Alignment, BackgroundSettings, Color, Document, Page, PhotoAdjust, Position, Rect,
};

use crate::fitting::fit_photo;
use crate::fonts::FontRegistry;
use crate::painter::Painter;
use crate::pattern::render_pattern;
use crate::richtext::{draw_markup, ExtraInfo, ImageCache};
use crate::{RenderError, Result, REFERENCE_DPI};

/// Draw one page of the document. `factor_upscale` is the output
/// resolution divided by the reference resolution; it scales border
/// widths and is handed to rich-text substitution. `on_set` is
/// invoked with each set's global id as it is drawn, for progress
/// reporting during full generation.
#[allow(clippy::too_many_arguments)]
pub fn draw_page(
    painter: &mut dyn Painter,
    document: &Document,
    page_index: usize,
    factor_upscale: f64,
    preview: bool,
    draw_zones: bool,
    fonts: &FontRegistry,
    images: &mut ImageCache,
    on_set: &mut dyn FnMut(usize),
) -> Result<()> {
    let page = document.pages.get(page_index).ok_or_else(|| {
        RenderError::InvalidConfiguration(format!("page {page_index} out of range"))
    })?;

    let mut info = ExtraInfo {
        page_num: page_index,
        pages_nb: document.pages.len(),
        photo_num: 0,
        photo_total: document.total_sets(),
        photo_name: String::new(),
        photo_date: None,
        preview,
    };

    if draw_zones {
        zones(painter, page);
    } else {
        backgrounds(painter, document, page)?;
    }

    band_texts(painter, page, &mut info, factor_upscale, fonts, images)?;
    sets(painter, page, &mut info, factor_upscale, fonts, images, on_set)?;

    // Borders close the pass so they sit above every set's content
    if page.borders.display {
        for set in &page.sets {
            painter.stroke_rect(
                set.rect_on_page,
                page.borders.color,
                page.borders.width * factor_upscale,
                page.borders.dashed,
            );
        }
    }

    Ok(())
}

/// Translucent fills over every structural rectangle, for visually
/// verifying the layout. Never part of a generated PDF.
fn zones(painter: &mut dyn Painter, page: &Page) {
    painter.fill_rect(page.rect_on_page, Color::rgb(0, 255, 0), 0.7);
    painter.fill_rect(page.page_minus_margins_rect, Color::WHITE, 1.0);

    painter.fill_rect(page.header.rect_on_page, Color::rgb(255, 127, 39), 76.0 / 255.0);
    painter.fill_rect(page.margin_header_rect, Color::rgb(150, 0, 0), 0.1);
    painter.fill_rect(page.footer.rect_on_page, Color::rgb(255, 127, 39), 76.0 / 255.0);
    painter.fill_rect(page.margin_footer_rect, Color::rgb(150, 0, 0), 0.1);

    for set in &page.sets {
        if let Some(inter_rect) = page.inter_margins_rects.get(set.id) {
            painter.fill_rect(*inter_rect, Color::rgb(200, 0, 0), 0.3);
        }
        painter.fill_rect(set.rect_on_page, Color::WHITE, 1.0);
        painter.fill_rect(set.photo_rect, Color::rgb(255, 255, 0), 0.3);
        painter.fill_rect(set.consign.rect_on_page, Color::rgb(0, 0, 200), 0.3);
    }
}

/// Page, header and footer backgrounds: fill color, optional photo,
/// optional pattern.
fn backgrounds(painter: &mut dyn Painter, document: &Document, page: &Page) -> Result<()> {
    painter.fill_rect(page.rect_on_page, page.background.color, 1.0);
    draw_background_photo(painter, &page.background, page.rect_on_page)?;

    if page.background.display_pattern {
        // Rasterized once at the reference resolution, then stretched
        // like a background photo so both backends share the path
        let (pattern_w, pattern_h) = document
            .paper
            .pixel_size(REFERENCE_DPI as u32, page.orientation);
        let pattern = render_pattern(
            page.background.pattern_style,
            page.background.pattern_color,
            pattern_w.max(1) as u32,
            pattern_h.max(1) as u32,
        )?;
        painter.draw_image(&pattern, page.rect_on_page)?;
    }

    if page.header.settings.enabled && page.header.rect_on_page.height > 0.0 {
        painter.fill_rect(
            page.header.rect_on_page,
            page.header.settings.background.color,
            1.0,
        );
        draw_background_photo(painter, &page.header.settings.background, page.header.rect_on_page)?;
    }

    if page.footer.settings.enabled && page.footer.rect_on_page.height > 0.0 {
        painter.fill_rect(
            page.footer.rect_on_page,
            page.footer.settings.background.color,
            1.0,
        );
        draw_background_photo(painter, &page.footer.settings.background, page.footer.rect_on_page)?;
    }

    Ok(())
}

fn draw_background_photo(
    painter: &mut dyn Painter,
    background: &BackgroundSettings,
    rect: Rect,
) -> Result<()> {
    if !background.display_photo {
        return Ok(());
    }
    let Some(photo) = &background.photo else {
        return Ok(());
    };
    if let Some((image, dest)) = fit_photo(photo, rect, PhotoAdjust::Fill, Alignment::default()) {
        painter.draw_image(&image, dest)?;
    }
    Ok(())
}

/// Header and footer rich text.
fn band_texts(
    painter: &mut dyn Painter,
    page: &Page,
    info: &mut ExtraInfo,
    factor_upscale: f64,
    fonts: &FontRegistry,
    images: &mut ImageCache,
) -> Result<()> {
    if page.header.settings.enabled && page.header.rect_on_page.height > 0.0 {
        info.photo_num = 0;
        let text = read_text(&page.header.settings.text);
        draw_markup(
            painter,
            fonts,
            images,
            &text,
            page.header.rect_on_page,
            factor_upscale,
            info,
        )?;
    }

    if page.footer.settings.enabled && page.footer.rect_on_page.height > 0.0 {
        info.photo_num = 0;
        let text = read_text(&page.footer.settings.text);
        draw_markup(
            painter,
            fonts,
            images,
            &text,
            page.footer.rect_on_page,
            factor_upscale,
            info,
        )?;
    }

    Ok(())
}

fn sets(
    painter: &mut dyn Painter,
    page: &Page,
    info: &mut ExtraInfo,
    factor_upscale: f64,
    fonts: &FontRegistry,
    images: &mut ImageCache,
    on_set: &mut dyn FnMut(usize),
) -> Result<()> {
    for set in &page.sets {
        info.photo_num = set.total_id;
        info.photo_name = set.photo.name.clone();
        info.photo_date = set.photo.modified;

        if !info.preview {
            log::debug!("Drawing set {}", set.total_id);
            on_set(set.total_id);
        }

        let consign_rect = set.consign.rect_on_page;
        let draw_consign = !consign_rect.is_empty();

        // Overlaid consigns draw above the photo; side-by-side ones
        // draw first
        if set.style.text_position != Position::On && draw_consign {
            let text = read_text(&set.consign.text);
            draw_markup(painter, fonts, images, &text, consign_rect, factor_upscale, info)?;
        }

        if !set.photo_rect.is_empty() {
            if let Some((image, dest)) = fit_photo(
                &set.photo,
                set.photo_rect,
                set.style.photo_adjust,
                set.style.photo_alignment,
            ) {
                painter.draw_image(&image, dest)?;
            }
        }

        if set.style.text_position == Position::On && draw_consign {
            let text = read_text(&set.consign.text);
            draw_markup(painter, fonts, images, &text, consign_rect, factor_upscale, info)?;
        }
    }

    Ok(())
}
