//! Text block measurement.
//!
//! Computes everything the compositor needs to place ink: line spacing,
//! synthetic-bold stroke widths, per-line widths, the overall block box and
//! the padded background rectangle shared by fill and border.

use crate::calendar::CalendarContent;
use crate::fonts::{self, FontHandle};
use crate::params::RenderParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Derived placement data for one render. Never mutated after `measure`.
#[derive(Clone, Debug)]
pub struct Layout {
    pub title_x: i32,
    pub title_width: u32,
    pub title_height: u32,
    pub title_stroke: u32,
    pub grid_stroke: u32,
    pub grid_line_spacing: u32,
    pub grid_width: u32,
    pub grid_total_height: u32,
    pub max_line_width: u32,
    pub total_height: u32,
    pub background: Rect,
}

/// Vertical advance per line at a pixel size.
pub fn line_spacing(px: u32) -> u32 {
    (px as f32 * 1.4).round() as u32
}

/// Stroke width actually applied to grid text: the explicit request, or a
/// synthetic outline simulating boldness when the request is bold with no
/// explicit stroke.
pub fn effective_stroke(bold: bool, stroke_width: u32, px: u32) -> u32 {
    if bold && stroke_width == 0 {
        (px / 40).max(1)
    } else {
        stroke_width
    }
}

/// Font used for grid line `index`: the header is always bold, week rows
/// follow the global bold flag.
pub fn grid_line_font<'a>(
    index: usize,
    bold: bool,
    regular: &'a FontHandle,
    bold_face: &'a FontHandle,
) -> &'a FontHandle {
    if bold || index == 0 {
        bold_face
    } else {
        regular
    }
}

pub fn measure(
    content: &CalendarContent,
    title_font: &FontHandle,
    grid_regular: &FontHandle,
    grid_bold: &FontHandle,
    params: &RenderParams,
    title_px: u32,
) -> Layout {
    let grid_stroke = effective_stroke(params.bold, params.stroke_width, params.font_size);
    // Decorative title fonts never get a synthetic stroke; an explicit
    // request still applies.
    let title_stroke = if params.title_font_id == fonts::SAME_AS_GRID {
        effective_stroke(params.bold, params.stroke_width, title_px)
    } else {
        params.stroke_width
    };

    let title_width = title_font.text_width(&content.title, title_stroke);
    let title_height = line_spacing(title_px);

    let grid_line_spacing = line_spacing(params.font_size);
    let mut grid_width = 0u32;
    for (i, line) in content.grid_lines.iter().enumerate() {
        let font = grid_line_font(i, params.bold, grid_regular, grid_bold);
        grid_width = grid_width.max(font.text_width(line, grid_stroke));
    }
    let grid_total_height = grid_line_spacing * content.grid_lines.len() as u32;

    let max_line_width = title_width.max(grid_width);
    let total_height = title_height + grid_total_height;

    let pad = params.bg_padding as i32;
    let background = Rect {
        x0: params.x - pad,
        y0: params.y - pad,
        x1: params.x + max_line_width as i32 + pad,
        y1: params.y + total_height as i32 + pad,
    };

    // Center the bare month name over the grid when the year is hidden.
    let title_x = if !params.show_year && title_width < max_line_width {
        params.x + ((max_line_width - title_width) / 2) as i32
    } else {
        params.x
    };

    Layout {
        title_x,
        title_width,
        title_height,
        title_stroke,
        grid_stroke,
        grid_line_spacing,
        grid_width,
        grid_total_height,
        max_line_width,
        total_height,
        background,
    }
}
