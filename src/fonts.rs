//! Font registries and resolution.
//!
//! Grid fonts are monospace regular/bold pairs; title fonts are decorative
//! single faces with Cyrillic coverage. Every lookup degrades instead of
//! failing: unknown id -> default registry entry, unloadable regular asset
//! -> built-in bitmap face, unloadable bold asset -> the resolved regular
//! handle, unloadable title asset -> the caller-supplied grid fallback.
//!
//! Decoded TrueType faces are cached per file name. The cache is a pure
//! optimization: handles carry no identity guarantees across calls.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusttype::{point, Font, Scale};
use serde::Serialize;
use tracing::warn;

/// Sentinel title-font id meaning "use the grid font".
pub const SAME_AS_GRID: &str = "same";

pub const DEFAULT_GRID_FONT: &str = "dejavu";
pub const DEFAULT_TITLE_FONT: &str = "irpin-type";

#[derive(Debug)]
pub struct GridFontInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub regular: &'static str,
    pub bold: &'static str,
}

#[derive(Debug)]
pub struct TitleFontInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// `None` for the `same` sentinel entry.
    pub file: Option<&'static str>,
}

/// Monospace grid fonts. The default entry is first.
pub const GRID_FONTS: &[GridFontInfo] = &[
    GridFontInfo {
        id: "dejavu",
        name: "DejaVu Sans Mono",
        regular: "DejaVuSansMono.ttf",
        bold: "DejaVuSansMono-Bold.ttf",
    },
    GridFontInfo {
        id: "jetbrains",
        name: "JetBrains Mono",
        regular: "JetBrainsMono-Regular.ttf",
        bold: "JetBrainsMono-Bold.ttf",
    },
    GridFontInfo {
        id: "fira",
        name: "Fira Mono",
        regular: "FiraMono-Regular.ttf",
        bold: "FiraMono-Bold.ttf",
    },
    GridFontInfo {
        id: "ubuntu",
        name: "Ubuntu Mono",
        regular: "UbuntuMono-Regular.ttf",
        bold: "UbuntuMono-Bold.ttf",
    },
    GridFontInfo {
        id: "roboto",
        name: "Roboto Mono",
        regular: "RobotoMono-Regular.ttf",
        bold: "RobotoMono-Bold.ttf",
    },
    GridFontInfo {
        id: "source-code",
        name: "Source Code Pro",
        regular: "SourceCodePro-Regular.ttf",
        bold: "SourceCodePro-Bold.ttf",
    },
];

/// Decorative title fonts.
pub const TITLE_FONTS: &[TitleFontInfo] = &[
    TitleFontInfo { id: "same", name: "Same as grid", file: None },
    TitleFontInfo { id: "lobster", name: "Lobster", file: Some("Lobster-Regular.ttf") },
    TitleFontInfo { id: "comforter", name: "Comforter", file: Some("Comforter-Regular.ttf") },
    TitleFontInfo { id: "kurale", name: "Kurale", file: Some("Kurale-Regular.ttf") },
    TitleFontInfo { id: "caveat", name: "Caveat", file: Some("Caveat-Regular.ttf") },
    TitleFontInfo { id: "irpin-type", name: "Irpin Type", file: Some("IrpinType-Regular.otf") },
    TitleFontInfo { id: "fixel-display", name: "Fixel Display", file: Some("FixelDisplay-SemiBold.ttf") },
    TitleFontInfo { id: "e-ukraine", name: "e-Ukraine Head", file: Some("e-UkraineHead-Regular.otf") },
    TitleFontInfo { id: "arsenal", name: "Arsenal", file: Some("Arsenal-Bold.ttf") },
    TitleFontInfo { id: "unbounded", name: "Unbounded", file: Some("Unbounded-Variable.ttf") },
    TitleFontInfo { id: "shantell-sans", name: "Shantell Sans", file: Some("ShantellSans-Regular.ttf") },
];

/// Grid registry lookup; unknown ids yield the default entry.
pub fn grid_font_info(id: &str) -> &'static GridFontInfo {
    GRID_FONTS.iter().find(|f| f.id == id).unwrap_or(&GRID_FONTS[0])
}

/// Exact title registry lookup.
pub fn title_font_info(id: &str) -> Option<&'static TitleFontInfo> {
    TITLE_FONTS.iter().find(|f| f.id == id)
}

fn fonts_dir() -> PathBuf {
    std::env::var("CALGEN_FONTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts"))
}

static FONT_CACHE: Lazy<Mutex<HashMap<String, Arc<Font<'static>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load and cache a TrueType face by file name. `None` covers both a
/// missing file and undecodable data; the caller picks the fallback.
fn load_face_cached(file: &str) -> Option<Arc<Font<'static>>> {
    if let Some(f) = FONT_CACHE.lock().get(file) {
        return Some(Arc::clone(f));
    }

    let bytes = std::fs::read(fonts_dir().join(file)).ok()?;
    let font = Arc::new(Font::try_from_vec(bytes)?);
    FONT_CACHE.lock().insert(file.to_string(), Arc::clone(&font));
    Some(font)
}

/// A font resolved at a fixed pixel size, ready to measure and draw.
#[derive(Clone)]
pub struct FontHandle {
    px: f32,
    face: Face,
}

#[derive(Clone)]
enum Face {
    Truetype(Arc<Font<'static>>),
    Builtin,
}

impl FontHandle {
    fn truetype(px: f32, face: Arc<Font<'static>>) -> Self {
        Self { px, face: Face::Truetype(face) }
    }

    fn builtin(px: f32) -> Self {
        Self { px, face: Face::Builtin }
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, Face::Builtin)
    }

    /// Rendered width of `text`, including stroke expansion on both sides.
    pub fn text_width(&self, text: &str, stroke_width: u32) -> u32 {
        if text.is_empty() {
            return 0;
        }
        let width = match &self.face {
            Face::Truetype(font) => {
                let scale = Scale::uniform(self.px);
                let v_metrics = font.v_metrics(scale);
                let mut width: f32 = 0.0;
                for g in font.layout(text, scale, point(0.0, v_metrics.ascent)) {
                    if let Some(bb) = g.pixel_bounding_box() {
                        width = width.max(bb.max.x as f32);
                    }
                }
                width.max(0.0).round() as u32
            }
            Face::Builtin => text.chars().count() as u32 * 8 * builtin_scale(self.px),
        };
        width + 2 * stroke_width
    }

    /// Draw one line of text with its top-left corner at (x, y),
    /// alpha-blending onto the target buffer.
    pub fn draw(&self, img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
        if color.0[3] == 0 || text.is_empty() {
            return;
        }
        match &self.face {
            Face::Truetype(font) => draw_truetype(img, font, self.px, x, y, text, color),
            Face::Builtin => draw_builtin(img, self.px, x, y, text, color),
        }
    }
}

fn draw_truetype(
    img: &mut RgbaImage,
    font: &Font<'static>,
    px: f32,
    x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let mut caret_x = x as f32;
    let baseline_y = y as f32 + v_metrics.ascent;

    for ch in text.chars() {
        let glyph = font.glyph(ch).scaled(scale).positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                blend_px(img, gx as i64 + bb.min.x as i64, gy as i64 + bb.min.y as i64, color, v);
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width;
    }
}

/// Integer upscale factor mapping the 8x8 bitmap face to a pixel size.
fn builtin_scale(px: f32) -> u32 {
    ((px / 8.0).round() as i64).max(1) as u32
}

fn draw_builtin(img: &mut RgbaImage, px: f32, x: i32, y: i32, text: &str, color: Rgba<u8>) {
    let s = builtin_scale(px) as i64;
    let mut caret = x as i64;
    for ch in text.chars() {
        if let Some(rows) = builtin_glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..8i64 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    for dy in 0..s {
                        for dx in 0..s {
                            blend_px(
                                img,
                                caret + col * s + dx,
                                y as i64 + row as i64 * s + dy,
                                color,
                                1.0,
                            );
                        }
                    }
                }
            }
        }
        // Unknown glyphs (the face is ASCII-only) still advance the caret
        // so column alignment survives.
        caret += 8 * s;
    }
}

fn builtin_glyph(ch: char) -> Option<[u8; 8]> {
    let idx = ch as usize;
    if idx < 128 {
        Some(font8x8::legacy::BASIC_LEGACY[idx])
    } else {
        None
    }
}

/// Source-over blend of `color` at `coverage` into a pixel of the target.
fn blend_px(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let sa = coverage.clamp(0.0, 1.0) * color.0[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let sc = color.0[c] as f32;
        let dc = dst.0[c] as f32;
        dst.0[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Resolve the regular/bold pair for a grid font id at a pixel size.
pub fn resolve_grid_pair(font_id: &str, px: u32) -> (FontHandle, FontHandle) {
    let info = grid_font_info(font_id);
    let px = px as f32;

    let regular = match load_face_cached(info.regular) {
        Some(face) => FontHandle::truetype(px, face),
        None => {
            warn!("grid font '{}' asset '{}' unavailable, using built-in face", info.id, info.regular);
            FontHandle::builtin(px)
        }
    };
    let bold = match load_face_cached(info.bold) {
        Some(face) => FontHandle::truetype(px, face),
        None => regular.clone(),
    };
    (regular, bold)
}

/// Resolve a decorative title font, or hand back `fallback` for the `same`
/// sentinel, an unknown id, a file-less entry, or a failed load.
pub fn resolve_title_font(title_font_id: &str, px: u32, fallback: FontHandle) -> FontHandle {
    if title_font_id == SAME_AS_GRID {
        return fallback;
    }
    let Some(info) = title_font_info(title_font_id) else {
        return fallback;
    };
    let Some(file) = info.file else {
        return fallback;
    };
    match load_face_cached(file) {
        Some(face) => FontHandle::truetype(px as f32, face),
        None => {
            warn!("title font '{}' asset '{}' unavailable, using grid font", info.id, file);
            fallback
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FontEntry {
    pub id: &'static str,
    pub name: &'static str,
}

/// Static font registries plus defaults, for the font listing interface.
#[derive(Debug, Serialize)]
pub struct FontCatalog {
    pub fonts: Vec<FontEntry>,
    pub default: &'static str,
    pub title_fonts: Vec<FontEntry>,
    pub title_default: &'static str,
}

pub fn font_catalog() -> FontCatalog {
    FontCatalog {
        fonts: GRID_FONTS.iter().map(|f| FontEntry { id: f.id, name: f.name }).collect(),
        default: DEFAULT_GRID_FONT,
        title_fonts: TITLE_FONTS.iter().map(|f| FontEntry { id: f.id, name: f.name }).collect(),
        title_default: DEFAULT_TITLE_FONT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_grid_id_resolves_like_the_default() {
        for px in [8, 24, 200] {
            let (unknown, _) = resolve_grid_pair("no-such-font", px);
            let (default, _) = resolve_grid_pair(DEFAULT_GRID_FONT, px);
            assert_eq!(unknown.is_builtin(), default.is_builtin());
            assert_eq!(unknown.px(), default.px());
        }
        assert_eq!(grid_font_info("no-such-font").id, DEFAULT_GRID_FONT);
    }

    #[test]
    fn same_sentinel_returns_the_fallback() {
        let (regular, _) = resolve_grid_pair(DEFAULT_GRID_FONT, 24);
        let resolved = resolve_title_font(SAME_AS_GRID, 48, regular.clone());
        assert_eq!(resolved.px(), regular.px());
        assert_eq!(resolved.is_builtin(), regular.is_builtin());
    }

    #[test]
    fn unknown_title_id_returns_the_fallback() {
        let (regular, _) = resolve_grid_pair(DEFAULT_GRID_FONT, 24);
        let resolved = resolve_title_font("no-such-font", 48, regular.clone());
        assert_eq!(resolved.px(), regular.px());
    }

    #[test]
    fn builtin_face_measures_monospace() {
        let handle = FontHandle::builtin(24.0);
        // 24px -> 3x upscale of the 8px bitmap.
        assert_eq!(handle.text_width("Mo", 0), 2 * 8 * 3);
        assert_eq!(handle.text_width("Mo", 2), 2 * 8 * 3 + 4);
        assert_eq!(handle.text_width("", 5), 0);
        // Cyrillic is outside the built-in face but still advances.
        assert_eq!(handle.text_width("Пн", 0), handle.text_width("Mo", 0));
    }

    #[test]
    fn builtin_draw_blends_into_the_buffer() {
        let handle = FontHandle::builtin(8.0);
        let mut img = RgbaImage::from_pixel(32, 16, Rgba([0, 0, 0, 0]));
        handle.draw(&mut img, 0, 0, "A", Rgba([255, 0, 0, 255]));
        assert!(img.pixels().any(|p| p.0 == [255, 0, 0, 255]));

        // Zero-alpha draws are no-ops.
        let mut untouched = RgbaImage::from_pixel(32, 16, Rgba([0, 0, 0, 0]));
        handle.draw(&mut untouched, 0, 0, "A", Rgba([255, 0, 0, 0]));
        assert!(untouched.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn catalog_lists_registries_and_defaults() {
        let catalog = font_catalog();
        assert_eq!(catalog.fonts.len(), GRID_FONTS.len());
        assert_eq!(catalog.title_fonts.len(), TITLE_FONTS.len());
        assert_eq!(catalog.default, "dejavu");
        assert_eq!(catalog.title_default, "irpin-type");
        assert!(catalog.title_fonts.iter().any(|f| f.id == "same"));
    }
}
