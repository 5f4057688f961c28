//! Synthesized grid images
//!
//! When no grid art exists anywhere, a grid is built from a cover:
//! the cover is cropped to fill 460x215, blurred, darkened, and the title
//! is drawn across the middle. Long titles are left off entirely because
//! they do not fit legibly at this size.

use ab_glyph::{FontVec, PxScale};
use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgba};
use imageproc::drawing::{draw_text_mut, text_size};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ArtworkError, ConfigError};

/// Size of Steam's library grid tile
pub const GRID_WIDTH: u32 = 460;
pub const GRID_HEIGHT: u32 = 215;

/// Titles longer than this are not drawn
pub const MAX_TITLE_CHARS: usize = 15;

const BLUR_SIGMA: f32 = 8.0;
const DARKEN: i32 = -60;
const TITLE_SCALE: f32 = 40.0;
const TITLE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Builds a grid image from cover bytes
pub trait Compositor: Send + Sync {
    /// Returns PNG bytes
    fn compose(&self, cover: &[u8], title: &str) -> Result<Vec<u8>, ArtworkError>;
}

/// Text drawn on a synthesized grid; blank when the title is too long
pub fn overlay_title(title: &str) -> &str {
    if title.chars().count() > MAX_TITLE_CHARS {
        ""
    } else {
        title
    }
}

/// Default compositor; draws text only when a font was loaded
#[derive(Default)]
pub struct GridCompositor {
    font: Option<FontVec>,
}

impl GridCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TrueType/OpenType font for the title overlay
    pub fn with_font_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path).map_err(|e| ConfigError::Invalid {
            name: "GRIDFILL_FONT_PATH",
            message: format!("{}: {e}", path.display()),
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| ConfigError::Invalid {
            name: "GRIDFILL_FONT_PATH",
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

impl Compositor for GridCompositor {
    fn compose(&self, cover: &[u8], title: &str) -> Result<Vec<u8>, ArtworkError> {
        let cover = image::load_from_memory(cover)?;

        // Crop to the tile, then blur and darken so text stays readable
        let background = cover
            .resize_to_fill(GRID_WIDTH, GRID_HEIGHT, FilterType::Lanczos3)
            .blur(BLUR_SIGMA)
            .brighten(DARKEN);
        let mut canvas = background.to_rgba8();

        // Centered title, skipped when too long or no font
        let text = overlay_title(title);
        if let (Some(font), false) = (&self.font, text.is_empty()) {
            let scale = PxScale::from(TITLE_SCALE);
            let (text_width, text_height) = text_size(scale, font, text);
            let x = (GRID_WIDTH as i32 - text_width as i32) / 2;
            let y = (GRID_HEIGHT as i32 - text_height as i32) / 2;
            draw_text_mut(&mut canvas, TITLE_COLOR, x, y, scale, font, text);
        }

        // Encode to PNG in memory
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(canvas).write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn cover_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 200])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn title_of_fifteen_chars_is_drawn() {
        let title = "A".repeat(15);
        assert_eq!(overlay_title(&title), title);
    }

    #[test]
    fn title_of_sixteen_chars_is_suppressed() {
        assert_eq!(overlay_title(&"A".repeat(16)), "");
    }

    #[test]
    fn title_limit_counts_chars_not_bytes() {
        let title = "é".repeat(15);
        assert_eq!(title.len(), 30);
        assert_eq!(overlay_title(&title), title);
    }

    #[test]
    fn composes_grid_sized_png() {
        let png = GridCompositor::new()
            .compose(&cover_png(264, 352), "Celeste")
            .unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let out = image::load_from_memory(&png).unwrap();
        assert_eq!(out.dimensions(), (GRID_WIDTH, GRID_HEIGHT));
    }

    #[test]
    fn darkens_the_cover() {
        let white = {
            let img = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));
            let mut out = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
            out.into_inner()
        };

        let png = GridCompositor::new().compose(&white, "").unwrap();
        let out = image::load_from_memory(&png).unwrap().to_rgba8();
        let center = out.get_pixel(GRID_WIDTH / 2, GRID_HEIGHT / 2);
        assert!(center[0] < 255);
    }

    #[test]
    fn garbage_cover_is_a_compose_error() {
        let result = GridCompositor::new().compose(b"not an image", "X");
        assert!(matches!(result, Err(ArtworkError::Compose(_))));
    }

    #[test]
    fn missing_font_file_is_config_error() {
        let result = GridCompositor::with_font_file(Path::new("/definitely/not/a/font.ttf"));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    fn fixture_font() -> GridCompositor {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/DejaVuSansMono.ttf");
        let compositor = GridCompositor::with_font_file(&path).unwrap();
        assert!(compositor.has_font());
        compositor
    }

    fn pixels(png: &[u8]) -> image::RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn title_within_limit_is_drawn_with_font() {
        let cover = cover_png(264, 352);
        let title = "Fifteen Chars!!";
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);

        let plain = pixels(&GridCompositor::new().compose(&cover, title).unwrap());
        let titled = pixels(&fixture_font().compose(&cover, title).unwrap());

        assert_eq!(titled.dimensions(), (GRID_WIDTH, GRID_HEIGHT));
        assert_ne!(plain, titled);

        let brightest = |img: &image::RgbaImage| img.pixels().map(|p| p[0]).max().unwrap();
        assert!(brightest(&titled) > brightest(&plain));
    }

    #[test]
    fn title_over_limit_is_not_drawn_even_with_font() {
        let cover = cover_png(264, 352);
        let title = "Sixteen Chars!!!";
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS + 1);

        let plain = pixels(&GridCompositor::new().compose(&cover, title).unwrap());
        let with_font = pixels(&fixture_font().compose(&cover, title).unwrap());

        assert_eq!(plain, with_font);
    }
}
