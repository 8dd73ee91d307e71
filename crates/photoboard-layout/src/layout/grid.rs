//! Subdivision of the sets area: weighted grid cells with interior
//! gutters, or user-authored relative rectangles in custom mode.

use crate::settings::SetsPositionSettings;
use crate::types::{RatioMargins, Rect};

pub(crate) struct GridCell {
    pub rect: Rect,
    /// The cell rectangle grown by its trailing gutters, used by the
    /// zone overlay
    pub inter_rect: Rect,
}

/// Compute row-major cell rectangles for a weighted grid.
///
/// Each of the `(H-1)` column gaps and `(V-1)` row gaps takes
/// `axis_extent / gap_count × gutter_fraction`; the remaining extent
/// is split by the per-column and per-row weight lists. Gutters only
/// appear between adjacent cells, never before the first or after the
/// last.
pub(crate) fn grid_cells(
    sets_rect: Rect,
    positions: &SetsPositionSettings,
    margins: &RatioMargins,
) -> Vec<GridCell> {
    let nb_h = positions.nb_photos_h;
    let nb_v = positions.nb_photos_v;
    if nb_h == 0 || nb_v == 0 {
        return Vec::new();
    }

    let nb_inter_h = nb_h - 1;
    let nb_inter_v = nb_v - 1;

    let mut width_inter_margin = 0.0;
    let mut height_inter_margin = 0.0;
    if margins.interior_enabled {
        if nb_inter_h > 0 {
            width_inter_margin =
                sets_rect.width / nb_inter_h as f64 * margins.inter_width.clamp(0.0, 1.0);
        }
        if nb_inter_v > 0 {
            height_inter_margin =
                sets_rect.height / nb_inter_v as f64 * margins.inter_height.clamp(0.0, 1.0);
        }
    }

    let usable_width = sets_rect.width - nb_inter_h as f64 * width_inter_margin;
    let usable_height = sets_rect.height - nb_inter_v as f64 * height_inter_margin;

    let mut cells = Vec::with_capacity(nb_h * nb_v);
    let mut offset_v = sets_rect.y;
    for ii in 0..nb_v {
        let cell_height = usable_height * positions.lines_height.get(ii).copied().unwrap_or(0.0);
        let mut offset_h = sets_rect.x;

        for jj in 0..nb_h {
            let cell_width =
                usable_width * positions.columns_width.get(jj).copied().unwrap_or(0.0);

            cells.push(GridCell {
                rect: Rect::new(offset_h, offset_v, cell_width, cell_height),
                inter_rect: Rect::new(
                    offset_h,
                    offset_v,
                    if jj < nb_inter_h {
                        cell_width + width_inter_margin
                    } else {
                        cell_width
                    },
                    if ii < nb_inter_v {
                        cell_height + height_inter_margin
                    } else {
                        cell_height
                    },
                ),
            });

            offset_h += cell_width + width_inter_margin;
        }

        offset_v += cell_height + height_inter_margin;
    }

    cells
}

/// Map custom-mode relative rectangles onto the sets area, in stored
/// order. The rectangles are user-authored and need not tile.
pub(crate) fn custom_cells(sets_rect: Rect, relative_rects: &[Rect]) -> Vec<Rect> {
    relative_rects
        .iter()
        .map(|rel| {
            Rect::new(
                sets_rect.x + rel.x * sets_rect.width,
                sets_rect.y + rel.y * sets_rect.height,
                rel.width * sets_rect.width,
                rel.height * sets_rect.height,
            )
        })
        .collect()
}
