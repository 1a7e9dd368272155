//! Render parameter validation.
//!
//! Raw request values are clamped and parsed exactly once here; nothing past
//! this boundary re-checks ranges. Every anomaly (out-of-range number,
//! malformed color, unknown font or language id) degrades to a documented
//! default instead of failing the request.

use chrono::Datelike;
use serde::Deserialize;
use tracing::debug;

use crate::fonts;
use crate::locale::Language;

/// An opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const WHITE: Rgb = Rgb(255, 255, 255);

impl Rgb {
    /// Parse `#RRGGBB` (leading `#` optional). Malformed input yields white.
    pub fn parse_or_white(s: &str) -> Rgb {
        Self::parse(s).unwrap_or(WHITE)
    }

    fn parse(s: &str) -> Option<Rgb> {
        let s = s.trim().trim_start_matches('#');
        if s.len() != 6 {
            return None;
        }
        let b = hex::decode(s).ok()?;
        Some(Rgb(b[0], b[1], b[2]))
    }
}

/// Raw render parameters as supplied by the HTTP layer.
///
/// Field defaults match the original service; year and month default to the
/// current date. Values may be wildly out of range here — validation happens
/// in [`RenderParams::from_request`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub year: i32,
    pub month: i32,
    pub lang: String,
    pub x: i32,
    pub y: i32,
    pub font_size: i32,
    pub color: String,
    pub opacity: i32,
    pub bg_color: String,
    pub bg_opacity: i32,
    pub bg_padding: i32,
    pub bg_radius: i32,
    pub bold: bool,
    pub font_id: String,
    pub stroke_width: i32,
    pub border_color: String,
    pub border_width: i32,
    pub border_opacity: i32,
    pub crop_ratio: f32,
    pub title_font_id: String,
    pub title_font_size: i32,
    pub show_year: bool,
    pub shadow: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month() as i32,
            lang: "en".into(),
            x: 50,
            y: 50,
            font_size: 24,
            color: "#FFFFFF".into(),
            opacity: 255,
            bg_color: "#000000".into(),
            bg_opacity: 128,
            bg_padding: 12,
            bg_radius: 8,
            bold: true,
            font_id: fonts::DEFAULT_GRID_FONT.into(),
            stroke_width: 0,
            border_color: "#FFFFFF".into(),
            border_width: 0,
            border_opacity: 255,
            crop_ratio: 0.0,
            title_font_id: fonts::DEFAULT_TITLE_FONT.into(),
            title_font_size: 0,
            show_year: true,
            shadow: true,
        }
    }
}

/// Validated render parameters. Constructing one is the single clamping
/// point of the whole pipeline.
#[derive(Clone, Debug)]
pub struct RenderParams {
    pub year: i32,
    pub month: u32,
    pub lang: Language,
    pub x: i32,
    pub y: i32,
    pub font_size: u32,
    pub color: Rgb,
    pub opacity: u8,
    pub bg_color: Rgb,
    pub bg_opacity: u8,
    pub bg_padding: u32,
    pub bg_radius: u32,
    pub bold: bool,
    pub font_id: &'static str,
    pub stroke_width: u32,
    pub border_color: Rgb,
    pub border_width: u32,
    pub border_opacity: u8,
    pub crop_ratio: f32,
    pub title_font_id: &'static str,
    pub title_font_size: u32,
    pub show_year: bool,
    pub shadow: bool,
}

impl RenderParams {
    pub fn from_request(req: &RenderRequest) -> Self {
        let font_id = fonts::grid_font_info(&req.font_id).id;
        if font_id != req.font_id {
            debug!("unknown grid font id '{}', using '{font_id}'", req.font_id);
        }
        let title_font_id = fonts::title_font_info(&req.title_font_id)
            .map(|f| f.id)
            .unwrap_or(fonts::DEFAULT_TITLE_FONT);
        if title_font_id != req.title_font_id {
            debug!("unknown title font id '{}', using '{title_font_id}'", req.title_font_id);
        }

        Self {
            year: req.year.clamp(crate::calendar::YEAR_MIN, crate::calendar::YEAR_MAX),
            month: req.month.clamp(1, 12) as u32,
            lang: Language::from_code(&req.lang),
            x: req.x,
            y: req.y,
            font_size: req.font_size.clamp(8, 200) as u32,
            color: Rgb::parse_or_white(&req.color),
            opacity: req.opacity.clamp(0, 255) as u8,
            bg_color: Rgb::parse_or_white(&req.bg_color),
            bg_opacity: req.bg_opacity.clamp(0, 255) as u8,
            bg_padding: req.bg_padding.clamp(0, 200) as u32,
            bg_radius: req.bg_radius.clamp(0, 200) as u32,
            bold: req.bold,
            font_id,
            stroke_width: req.stroke_width.clamp(0, 20) as u32,
            border_color: Rgb::parse_or_white(&req.border_color),
            border_width: req.border_width.clamp(0, 20) as u32,
            border_opacity: req.border_opacity.clamp(0, 255) as u8,
            crop_ratio: req.crop_ratio.clamp(0.0, 10.0),
            title_font_id,
            title_font_size: req.title_font_size.clamp(0, 400) as u32,
            show_year: req.show_year,
            shadow: req.shadow,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::from_request(&RenderRequest::default())
    }
}
