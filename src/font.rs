//! Font loading and text measurement.
//!
//! The compositor only needs three things from a font: the advance width of
//! a run of text, the line height, and the ability to rasterize a run onto a
//! canvas. [`Typeface`] captures exactly that, and [`FontHandle`] implements
//! it on top of [`ab_glyph`]. A loaded handle is passed to the compositor
//! directly; there is no name-keyed font registry.

use std::path::Path;

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::compositor::blend_over;
use crate::error::{Error, Result};

/// Metrics and rasterization interface the compositor requires from a font.
///
/// Widths are expected to grow when text is appended (standard additive
/// advance behavior); the tiling loop relies on that to terminate.
pub trait Typeface {
    /// Advance width of `text` in pixels at `px_size`, including kerning.
    fn line_width(&self, text: &str, px_size: f32) -> f32;

    /// Line height in pixels at `px_size`: ascent + descent + line gap.
    fn line_height(&self, px_size: f32) -> f32;

    /// Draw one run of text with its baseline starting at (`x`, `baseline_y`),
    /// alpha-blending onto `canvas`. Pixels outside the canvas are clipped.
    fn draw_run(
        &self,
        canvas: &mut RgbaImage,
        x: f32,
        baseline_y: f32,
        text: &str,
        px_size: f32,
        color: Rgba<u8>,
    );
}

/// A font loaded from a TrueType/OpenType file.
pub struct FontHandle {
    font: FontVec,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl FontHandle {
    /// Load a font from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontRead`] if the file cannot be read, or
    /// [`Error::FontParse`] if the data is not a valid font.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// Parse a font from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontParse`] if the data is not a valid font.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self { font })
    }
}

impl Typeface for FontHandle {
    fn line_width(&self, text: &str, px_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px_size));

        let mut width = 0.0_f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    fn line_height(&self, px_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px_size));
        // height() is ascent - descent; descent is negative
        scaled.height() + scaled.line_gap()
    }

    fn draw_run(
        &self,
        canvas: &mut RgbaImage,
        x: f32,
        baseline_y: f32,
        text: &str,
        px_size: f32,
        color: Rgba<u8>,
    ) {
        let scale = PxScale::from(px_size);
        let scaled = self.font.as_scaled(scale);

        #[allow(clippy::cast_possible_wrap)]
        let (canvas_w, canvas_h) = (canvas.width() as i32, canvas.height() as i32);

        let mut cursor = x;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }

            let glyph = id.with_scale_and_position(scale, point(cursor, baseline_y));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let px = gx as i32 + bounds.min.x as i32;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let py = gy as i32 + bounds.min.y as i32;

                    if px >= 0 && py >= 0 && px < canvas_w && py < canvas_h {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let alpha = (coverage.clamp(0.0, 1.0) * f32::from(color[3])) as u8;
                        let ink = Rgba([color[0], color[1], color[2], alpha]);

                        #[allow(clippy::cast_sign_loss)]
                        let (px, py) = (px as u32, py as u32);
                        let blended = blend_over(*canvas.get_pixel(px, py), ink);
                        canvas.put_pixel(px, py, blended);
                    }
                });
            }

            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}
