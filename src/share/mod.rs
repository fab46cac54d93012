// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Share outputs: plain text and 1080x1920 quote cards

pub mod layout;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use layout::{layout_card, wrap_text, CardLayout, CardLine, FixedAdvance, FontMeasure, TextMeasure};

use crate::config::ShareConfig;
use crate::db::Quote;
use crate::{Result, UlrimError};

const BACKGROUND: [u8; 3] = [0x12, 0x12, 0x12];
const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
const BLACK: [u8; 3] = [0x00, 0x00, 0x00];

/// Plain-text share payload
pub fn share_text(quote: &Quote) -> String {
    quote.content.clone()
}

/// Load a TrueType/OpenType font from disk
pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| UlrimError::Font(format!("{:?} is not a usable font: {}", path, e)))
}

/// Renders quote cards
#[derive(Clone)]
pub struct ShareCardGenerator {
    config: ShareConfig,
    font: FontArc,
}

impl ShareCardGenerator {
    pub fn new(config: ShareConfig, font: FontArc) -> Self {
        Self { config, font }
    }

    /// Build a generator from the configured font
    pub fn from_config(config: &ShareConfig) -> Result<Self> {
        let font_path = config.font_path.as_deref().ok_or_else(|| {
            UlrimError::Font("no font configured (set share.font_path)".to_string())
        })?;
        let font = load_font(Path::new(font_path))?;
        Ok(Self::new(config.clone(), font))
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Where the quote's lines land on the card
    pub fn layout(&self, text: &str) -> CardLayout {
        let measure = FontMeasure::new(self.font.clone(), self.config.text_size);
        layout_card(text, &measure, &self.config)
    }

    /// Load the configured background image, if any
    pub fn load_background(&self) -> Result<Option<DynamicImage>> {
        match &self.config.background_path {
            Some(path) => Ok(Some(image::open(path)?)),
            None => Ok(None),
        }
    }

    /// Draw a card: background, dark overlay, wrapped quote, watermark
    pub fn generate(&self, text: &str, background: Option<&DynamicImage>) -> RgbaImage {
        let (width, height) = (self.config.width, self.config.height);

        let mut canvas = match background {
            Some(img) => img.resize_to_fill(width, height, FilterType::Triangle).to_rgba8(),
            None => RgbaImage::from_pixel(width, height, Rgba([BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 0xff])),
        };

        let overlay = self.config.overlay_alpha as f32 / 255.0;
        for pixel in canvas.pixels_mut() {
            blend(pixel, BLACK, overlay);
        }

        let layout = self.layout(text);
        for line in &layout.lines {
            self.draw_centered(&mut canvas, &line.text, self.config.text_size, line.baseline, 1.0);
        }

        let watermark_alpha = self.config.watermark_alpha as f32 / 255.0;
        self.draw_centered(
            &mut canvas,
            &self.config.watermark,
            self.config.watermark_size,
            layout.watermark_baseline,
            watermark_alpha,
        );

        debug!("Rendered card with {} lines", layout.lines.len());
        canvas
    }

    /// Render a card with the configured background and write it as PNG
    pub fn render_to_file(&self, text: &str, path: &Path) -> Result<PathBuf> {
        let background = self.load_background()?;
        let card = self.generate(text, background.as_ref());
        save_png(&card, path)?;
        info!("Share card written to {:?}", path);
        Ok(path.to_path_buf())
    }

    /// Render a card with the configured background as PNG bytes
    pub fn render_png(&self, text: &str) -> Result<Vec<u8>> {
        let background = self.load_background()?;
        encode_png(&self.generate(text, background.as_ref()))
    }

    fn draw_centered(&self, canvas: &mut RgbaImage, text: &str, px: f32, baseline: f32, alpha: f32) {
        let scale = PxScale::from(px);
        let scaled = self.font.as_scaled(scale);
        let text_width = FontMeasure::new(self.font.clone(), px).measure(text);
        let (width, height) = canvas.dimensions();

        let mut x = (width as f32 - text_width) / 2.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(x, baseline));
            x += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    blend(canvas.get_pixel_mut(px as u32, py as u32), WHITE, coverage * alpha);
                }
            });
        }
    }
}

/// Source-over blend of an opaque colour at `alpha` onto `pixel`
fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    for (channel, src) in pixel.0.iter_mut().zip(color) {
        *channel = (src as f32 * a + *channel as f32 * (1.0 - a)).round() as u8;
    }
    pixel.0[3] = 0xff;
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Write an image as PNG, creating parent directories
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_png(image)?)?;
    Ok(())
}
