//! Calendar compositing onto a source image.
//!
//! All calendar ink is accumulated on a transparent overlay sized to the
//! (post-crop) source, then alpha-composited onto the source and flattened
//! to opaque RGB for JPEG output. Draw order matters: background fill,
//! border outline, then per-line shadow / stroke / fill, each occluding
//! what came before it.

use image::{
    codecs::jpeg::JpegEncoder, DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage,
};
use thiserror::Error;
use tracing::debug;

use crate::calendar::format_calendar;
use crate::fonts::{self, FontHandle};
use crate::layout::{self, Rect};
use crate::params::{RenderParams, Rgb};

pub const JPEG_QUALITY: u8 = 95;

const SHADOW_OFFSET: i32 = 2;
/// Shadows never exceed this alpha, however opaque the text is.
const SHADOW_MAX_ALPHA: u8 = 160;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image data: {0}")]
    InvalidImage(String),
    #[error("encode: {0}")]
    Encode(String),
}

/// Attachment file name for a rendered calendar.
pub fn output_filename(year: i32, month: u32) -> String {
    format!("calendar_{year}_{month:02}.jpg")
}

/// Render the calendar described by `params` onto `image_bytes` and return
/// the composited image as a JPEG buffer.
///
/// Undecodable source bytes are the only fatal input error; every font and
/// parameter anomaly has already been degraded to a default upstream.
pub fn render(image_bytes: &[u8], params: &RenderParams) -> Result<Vec<u8>, RenderError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| RenderError::InvalidImage(e.to_string()))?;
    let mut img = decoded.to_rgba8();

    if params.crop_ratio > 0.0 {
        img = center_crop(img, params.crop_ratio);
    }

    let (width, height) = (img.width(), img.height());
    let mut overlay = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

    let (grid_regular, grid_bold) = fonts::resolve_grid_pair(params.font_id, params.font_size);

    let title_px = if params.title_font_size > 0 { params.title_font_size } else { params.font_size };
    let grid_for_title = if params.bold { grid_bold.clone() } else { grid_regular.clone() };
    let title_font = if params.title_font_id == fonts::SAME_AS_GRID {
        if params.title_font_size > 0 {
            let (regular, bold) = fonts::resolve_grid_pair(params.font_id, title_px);
            if params.bold { bold } else { regular }
        } else {
            grid_for_title
        }
    } else {
        fonts::resolve_title_font(params.title_font_id, title_px, grid_for_title)
    };

    let content = format_calendar(params.year, params.month, params.lang, params.show_year);
    let lay = layout::measure(&content, &title_font, &grid_regular, &grid_bold, params, title_px);
    debug!(
        "calendar block {}x{} at ({}, {}) on {}x{} image",
        lay.max_line_width, lay.total_height, params.x, params.y, width, height
    );

    if params.bg_opacity > 0 {
        fill_rounded_rect(&mut overlay, &lay.background, params.bg_radius, rgba(params.bg_color, params.bg_opacity));
    }
    if params.border_width > 0 && params.border_opacity > 0 {
        outline_rounded_rect(
            &mut overlay,
            &lay.background,
            params.bg_radius,
            params.border_width,
            rgba(params.border_color, params.border_opacity),
        );
    }

    let text_color = rgba(params.color, params.opacity);
    let shadow = shadow_color(params.opacity);
    let stroke_fill = if params.shadow { shadow } else { Rgba([0, 0, 0, 0]) };
    let shadow_pass = params.shadow.then_some(shadow);

    let mut cursor_y = params.y;
    draw_line(
        &mut overlay, &title_font, lay.title_x, cursor_y, &content.title,
        text_color, lay.title_stroke, stroke_fill, shadow_pass,
    );
    cursor_y += lay.title_height as i32;

    for (i, line) in content.grid_lines.iter().enumerate() {
        let font = layout::grid_line_font(i, params.bold, &grid_regular, &grid_bold);
        draw_line(
            &mut overlay, font, params.x, cursor_y, line,
            text_color, lay.grid_stroke, stroke_fill, shadow_pass,
        );
        cursor_y += lay.grid_line_spacing as i32;
    }

    composite_and_flatten(&mut img, &overlay);

    let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
    let mut buf = Vec::new();
    let enc = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    enc.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buf)
}

fn rgba(color: Rgb, alpha: u8) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, alpha])
}

/// Black at `min(opacity, 160)` alpha: never darker than the text itself,
/// never above the fixed ceiling.
fn shadow_color(opacity: u8) -> Rgba<u8> {
    Rgba([0, 0, 0, opacity.min(SHADOW_MAX_ALPHA)])
}

/// Center-crop to a target height/width ratio, cover-style: trim the axis
/// that overshoots, never scale.
fn center_crop(mut img: RgbaImage, ratio: f32) -> RgbaImage {
    let (w, h) = (img.width(), img.height());
    let target_h = w as f32 * ratio;
    if target_h <= h as f32 {
        let th = (target_h as u32).max(1);
        let top = (h - th) / 2;
        image::imageops::crop(&mut img, 0, top, w, th).to_image()
    } else {
        let tw = ((h as f32 / ratio) as u32).max(1);
        let left = (w - tw) / 2;
        image::imageops::crop(&mut img, left, 0, tw, h).to_image()
    }
}

/// Shadow first, then the stroke outline, then the fill on top.
#[allow(clippy::too_many_arguments)]
fn draw_line(
    img: &mut RgbaImage,
    font: &FontHandle,
    x: i32,
    y: i32,
    text: &str,
    fill: Rgba<u8>,
    stroke_width: u32,
    stroke_fill: Rgba<u8>,
    shadow: Option<Rgba<u8>>,
) {
    if let Some(color) = shadow {
        font.draw(img, x + SHADOW_OFFSET, y + SHADOW_OFFSET, text, color);
    }
    if stroke_width > 0 && stroke_fill.0[3] > 0 {
        let r = stroke_width as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx == 0 && dy == 0) || dx * dx + dy * dy > r * r {
                    continue;
                }
                font.draw(img, x + dx, y + dy, text, stroke_fill);
            }
        }
    }
    font.draw(img, x, y, text, fill);
}

/// Point-in-rounded-rect test in local coordinates of a w x h box.
fn rounded_rect_contains(x: i32, y: i32, w: i32, h: i32, r: i32) -> bool {
    if x < 0 || y < 0 || x >= w || y >= h {
        return false;
    }
    if x >= r && x < w - r {
        return true;
    }
    if y >= r && y < h - r {
        return true;
    }
    let (cx, cy) = if x < r {
        if y < r { (r - 1, r - 1) } else { (r - 1, h - r) }
    } else if y < r {
        (w - r, r - 1)
    } else {
        (w - r, h - r)
    };
    let dx = x - cx;
    let dy = y - cy;
    dx * dx + dy * dy <= r * r
}

fn fill_rounded_rect(img: &mut RgbaImage, rect: &Rect, radius: u32, color: Rgba<u8>) {
    // Inclusive bounds, like the rectangle primitives this mirrors.
    let w = rect.x1 - rect.x0 + 1;
    let h = rect.y1 - rect.y0 + 1;
    if w <= 0 || h <= 0 {
        return;
    }
    let r = (radius as i32).min(w / 2).min(h / 2);

    let y_from = rect.y0.max(0);
    let y_to = rect.y1.min(img.height() as i32 - 1);
    let x_from = rect.x0.max(0);
    let x_to = rect.x1.min(img.width() as i32 - 1);
    for y in y_from..=y_to {
        for x in x_from..=x_to {
            if rounded_rect_contains(x - rect.x0, y - rect.y0, w, h, r) {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Rounded-rectangle ring of `width` px inside the same bounds the fill
/// uses, so background and border share geometry but not color/opacity.
fn outline_rounded_rect(img: &mut RgbaImage, rect: &Rect, radius: u32, width: u32, color: Rgba<u8>) {
    let w = rect.x1 - rect.x0 + 1;
    let h = rect.y1 - rect.y0 + 1;
    if w <= 0 || h <= 0 {
        return;
    }
    let r = (radius as i32).min(w / 2).min(h / 2);
    let bw = width as i32;
    let inner_r = (r - bw).max(0);

    let y_from = rect.y0.max(0);
    let y_to = rect.y1.min(img.height() as i32 - 1);
    let x_from = rect.x0.max(0);
    let x_to = rect.x1.min(img.width() as i32 - 1);
    for y in y_from..=y_to {
        for x in x_from..=x_to {
            let lx = x - rect.x0;
            let ly = y - rect.y0;
            if !rounded_rect_contains(lx, ly, w, h, r) {
                continue;
            }
            let inside = rounded_rect_contains(lx - bw, ly - bw, w - 2 * bw, h - 2 * bw, inner_r);
            if !inside {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Alpha-composite the overlay onto the source and flatten: every output
/// pixel ends fully opaque, keeping the source's own RGB wherever the
/// overlay is transparent.
fn composite_and_flatten(base: &mut RgbaImage, overlay: &RgbaImage) {
    for (x, y, p) in overlay.enumerate_pixels() {
        let dst = base.get_pixel_mut(x, y);
        let a = p.0[3] as f32 / 255.0;
        if a > 0.0 {
            let inv = 1.0 - a;
            dst.0[0] = (p.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (p.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (p.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
        }
        dst.0[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_alpha_is_capped_by_text_opacity_and_ceiling() {
        for opacity in 0..=255u8 {
            let alpha = shadow_color(opacity).0[3];
            assert!(alpha <= SHADOW_MAX_ALPHA);
            assert!(alpha <= opacity);
            assert_eq!(alpha, opacity.min(SHADOW_MAX_ALPHA));
        }
    }

    #[test]
    fn center_crop_trims_height_evenly() {
        // 400x400 at ratio 0.5 -> 400x200, trimmed 100 px top and bottom.
        let mut src = RgbaImage::from_pixel(400, 400, Rgba([0, 0, 0, 255]));
        for y in 100..300 {
            for x in 0..400 {
                src.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        let out = center_crop(src, 0.5);
        assert_eq!((out.width(), out.height()), (400, 200));
        assert!(out.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn center_crop_trims_width_evenly() {
        // 8x4 at ratio 1.0 -> 4x4 keeping the middle columns.
        let mut src = RgbaImage::from_pixel(8, 4, Rgba([255, 0, 0, 255]));
        for y in 0..4 {
            for x in 2..6 {
                src.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        let out = center_crop(src, 1.0);
        assert_eq!((out.width(), out.height()), (4, 4));
        assert!(out.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn crop_ratio_matches_within_rounding() {
        let src = RgbaImage::from_pixel(321, 200, Rgba([9, 9, 9, 255]));
        let out = center_crop(src, 0.4);
        let got = out.height() as f32 / out.width() as f32;
        assert!((got - 0.4).abs() < 0.01, "{got}");
    }

    #[test]
    fn rounded_rect_radius_zero_is_a_plain_rect() {
        assert!(rounded_rect_contains(0, 0, 10, 10, 0));
        assert!(rounded_rect_contains(9, 9, 10, 10, 0));
        assert!(!rounded_rect_contains(10, 5, 10, 10, 0));
        // A large radius carves the corners.
        assert!(!rounded_rect_contains(0, 0, 20, 20, 8));
        assert!(rounded_rect_contains(10, 0, 20, 20, 8));
    }

    #[test]
    fn fill_and_outline_share_bounds() {
        let rect = Rect { x0: 4, y0: 4, x1: 27, y1: 19 };
        let mut filled = RgbaImage::from_pixel(32, 24, Rgba([0, 0, 0, 0]));
        fill_rounded_rect(&mut filled, &rect, 0, Rgba([10, 20, 30, 128]));
        let mut outlined = RgbaImage::from_pixel(32, 24, Rgba([0, 0, 0, 0]));
        outline_rounded_rect(&mut outlined, &rect, 0, 2, Rgba([200, 0, 0, 255]));

        // Every outlined pixel lies inside the filled area.
        for (x, y, p) in outlined.enumerate_pixels() {
            if p.0[3] > 0 {
                assert!(filled.get_pixel(x, y).0[3] > 0, "({x}, {y})");
            }
        }
        // The ring is hollow: the rect center is untouched.
        assert_eq!(outlined.get_pixel(16, 12).0[3], 0);
        assert!(outlined.get_pixel(4, 12).0[3] > 0);
        // The fill replaces pixels verbatim, alpha included.
        assert_eq!(filled.get_pixel(16, 12).0, [10, 20, 30, 128]);
    }

    #[test]
    fn negative_rect_coordinates_are_clipped() {
        let rect = Rect { x0: -10, y0: -10, x1: 5, y1: 5 };
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        fill_rounded_rect(&mut img, &rect, 0, Rgba([1, 2, 3, 255]));
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [1, 2, 3, 255]);
        assert_eq!(img.get_pixel(6, 6).0[3], 0);
    }

    #[test]
    fn flatten_keeps_source_rgb_under_transparent_overlay() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([40, 50, 60, 0]));
        let overlay = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        composite_and_flatten(&mut base, &overlay);
        assert!(base.pixels().all(|p| p.0 == [40, 50, 60, 255]));
    }

    #[test]
    fn composite_blends_half_opacity() {
        let mut base = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));
        composite_and_flatten(&mut base, &overlay);
        let p = base.get_pixel(0, 0).0;
        assert!(p[0] >= 126 && p[0] <= 129, "{p:?}");
        assert_eq!(p[3], 255);
    }

    #[test]
    fn output_filename_zero_pads_the_month() {
        assert_eq!(output_filename(2024, 2), "calendar_2024_02.jpg");
        assert_eq!(output_filename(1999, 12), "calendar_1999_12.jpg");
    }
}
