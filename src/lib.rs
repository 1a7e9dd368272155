//! Calendar image overlay engine.
//!
//! Composites a rendered monthly calendar (weekday grid plus a decorative
//! month title) onto a raster image and returns a JPEG buffer. The HTTP
//! layer in front of this crate owns uploads, routing and response
//! serialization; this crate owns content generation, font resolution,
//! layout and compositing.
//!
//! ```no_run
//! use calgen::{render, RenderParams, RenderRequest};
//!
//! let req = RenderRequest { year: 2024, month: 2, ..RenderRequest::default() };
//! let params = RenderParams::from_request(&req);
//! let photo = std::fs::read("photo.jpg").unwrap();
//! let jpeg = render(&photo, &params).unwrap();
//! ```

pub mod calendar;
pub mod fonts;
pub mod layout;
pub mod locale;
pub mod params;
pub mod render;

pub use calendar::{calendar_preview, format_calendar, CalendarContent};
pub use fonts::{font_catalog, FontCatalog, FontHandle};
pub use locale::Language;
pub use params::{RenderParams, RenderRequest, Rgb};
pub use render::{output_filename, render, RenderError};
