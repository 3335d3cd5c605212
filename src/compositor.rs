//! The watermark compositor.
//!
//! Stamps a repeating text watermark across an image in three steps:
//!
//! 1. Allocate a square Working Surface whose side equals the image diagonal
//!    and blit the source image into its center. Margins are equal on every
//!    side, so a uniform rotation of the text layer could later be applied
//!    without changing any of the sizing math (none is applied today).
//! 2. Tile the text into one row wide enough to span the surface, then draw
//!    that row at a fixed line pitch over a generous vertical sweep.
//! 3. Crop the centered source-sized rectangle back out.
//!
//! Lengths are modeled physically: pixels divided by the style's DPI, so the
//! font's point size means the same thing it would in print.

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::font::Typeface;
use crate::style::WatermarkStyle;

/// Separator appended between repetitions of the watermark text.
const TILE_SEPARATOR: &str = "   ";

/// Vertical sweep, in surface side-lengths, above and below the surface.
/// Rows start this far above the top edge and stop this far below the bottom
/// edge; off-surface rows are clipped.
const SWEEP_DIAGONALS: f32 = 2.0;

/// Composite a tiled text watermark over `image`.
///
/// Produces a new image of identical dimensions with the watermark
/// alpha-blended on top. The source is never modified.
///
/// # Errors
///
/// Returns [`Error::EmptyText`] / [`Error::EmptyImage`] /
/// [`Error::InvalidStyle`] for unusable inputs and
/// [`Error::UnmeasurableText`] when the text has no width under `face`.
pub fn composite<F: Typeface>(
    image: &DynamicImage,
    text: &str,
    style: &WatermarkStyle,
    face: &F,
) -> Result<RgbaImage> {
    if text.is_empty() {
        return Err(Error::EmptyText);
    }
    let source = image.to_rgba8();
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    style.validate()?;

    let px_size = style.px_size();
    let side = surface_side(width, height, style.dpi);

    let mut surface = RgbaImage::new(side, side);
    let (origin_x, origin_y) = centered_origin(side, width, height);
    imageops::replace(
        &mut surface,
        &source,
        i64::from(origin_x),
        i64::from(origin_y),
    );

    #[allow(clippy::cast_precision_loss)]
    let side_f = side as f32;
    let row = tile_row(face, text, px_size, side_f)?;

    let line_height = face.line_height(px_size) * style.pitch;
    if !line_height.is_finite() || line_height <= 0.0 {
        return Err(Error::InvalidStyle("effective line height must be positive"));
    }

    let fill = style.fill();
    let sweep = SWEEP_DIAGONALS * side_f;
    let mut offset = -sweep;
    while offset < sweep {
        face.draw_run(&mut surface, 0.0, offset, &row, px_size, fill);
        offset += line_height;
    }

    Ok(imageops::crop_imm(&surface, origin_x, origin_y, width, height).to_image())
}

/// Side length in pixels of the square Working Surface for a `width` x
/// `height` image at `dpi`: the image diagonal, rounded up.
///
/// Always at least `max(width, height)`, so the centered image fits.
#[must_use]
pub fn surface_side(width: u32, height: u32, dpi: f32) -> u32 {
    let w = f64::from(width) / f64::from(dpi);
    let h = f64::from(height) / f64::from(dpi);
    let diagonal = w.hypot(h);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (diagonal * f64::from(dpi)).ceil() as u32
    }
}

/// Top-left corner of the centered `width` x `height` rectangle on a square
/// surface. Shared by the blit and the crop-back so both address the exact
/// same region.
fn centered_origin(side: u32, width: u32, height: u32) -> (u32, u32) {
    debug_assert!(side >= width && side >= height);
    ((side - width) / 2, (side - height) / 2)
}

/// Build one row of repeated text at least `target_width` pixels wide.
///
/// Appends separator + text and remeasures until the row spans the target.
/// The repetition count comes from actual glyph metrics, not a character
/// count, so any font and text combination fills the surface without gaps.
fn tile_row<F: Typeface>(
    face: &F,
    text: &str,
    px_size: f32,
    target_width: f32,
) -> Result<String> {
    let unit_width = face.line_width(text, px_size);
    if !unit_width.is_finite() || unit_width <= 0.0 {
        return Err(Error::UnmeasurableText {
            text: text.to_string(),
            size: px_size,
        });
    }

    let mut row = text.to_string();
    let mut width = unit_width;
    while width <= target_width {
        row.push_str(TILE_SEPARATOR);
        row.push_str(text);
        width = face.line_width(&row, px_size);
    }
    Ok(row)
}

/// Porter-Duff "over": blend `top` onto `bottom`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_a = f32::from(top[3]) / 255.0;
    let bottom_a = f32::from(bottom[3]) / 255.0;

    let out_a = top_a + bottom_a * (1.0 - top_a);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |t: u8, b: u8| -> u8 {
        let t = f32::from(t) / 255.0;
        let b = f32::from(b) / 255.0;
        let v = (t * top_a + b * bottom_a * (1.0 - top_a)) / out_a;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;

    /// Fixed-metrics face: every char advances `advance` pixels and drawing
    /// paints the one-pixel row at the baseline. Keeps geometry exact without
    /// a real font file.
    struct BlockFace {
        advance: f32,
        line_height: f32,
    }

    impl Typeface for BlockFace {
        fn line_width(&self, text: &str, _px_size: f32) -> f32 {
            text.chars().count() as f32 * self.advance
        }

        fn line_height(&self, _px_size: f32) -> f32 {
            self.line_height
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
            let y = baseline_y.round();
            if !(0.0..canvas.height() as f32).contains(&y) {
                return;
            }
            let y = y as u32;
            let end = (x + self.line_width(text, px_size)).min(canvas.width() as f32);
            let start = x.max(0.0);
            if start >= end {
                return;
            }
            for px in (start as u32)..(end as u32) {
                let blended = blend_over(*canvas.get_pixel(px, y), color);
                canvas.put_pixel(px, y, blended);
            }
        }
    }

    /// Face that paints nothing. Isolates the blit/crop path.
    struct SilentFace;

    impl Typeface for SilentFace {
        fn line_width(&self, text: &str, _px_size: f32) -> f32 {
            text.chars().count() as f32 * 10.0
        }

        fn line_height(&self, _px_size: f32) -> f32 {
            24.0
        }

        fn draw_run(
            &self,
            _canvas: &mut RgbaImage,
            _x: f32,
            _baseline_y: f32,
            _text: &str,
            _px_size: f32,
            _color: Rgba<u8>,
        ) {
        }
    }

    fn solid_image(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for px in img.pixels_mut() {
            *px = color;
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn result_dimensions_equal_source_dimensions() {
        let face = BlockFace {
            advance: 10.0,
            line_height: 24.0,
        };
        let style = WatermarkStyle::default();
        for (w, h) in [(100, 100), (101, 53), (1, 1), (640, 480), (3, 999)] {
            let img = solid_image(w, h, Rgba([9, 9, 9, 255]));
            let out = composite(&img, "mark", &style, &face).unwrap();
            assert_eq!((out.width(), out.height()), (w, h), "for {w}x{h}");
        }
    }

    #[test]
    fn surface_side_covers_image_and_diagonal() {
        for (w, h) in [(100, 100), (1920, 1080), (1, 1), (7, 3000)] {
            let side = surface_side(w, h, 96.0);
            assert!(side >= w.max(h));
            let diagonal = f64::from(w).hypot(f64::from(h));
            assert!(f64::from(side) >= diagonal - 1e-3);
        }
    }

    #[test]
    fn tiled_row_spans_target_and_grows_monotonically() {
        let face = BlockFace {
            advance: 10.0,
            line_height: 24.0,
        };
        let text = "mark";
        let target = 300.0;
        let row = tile_row(&face, text, 14.4, target).unwrap();

        let final_width = face.line_width(&row, 14.4);
        assert!(final_width >= target);

        // Undo the last append: separator + text
        let prev = &row[..row.len() - (TILE_SEPARATOR.len() + text.len())];
        let prev_width = face.line_width(prev, 14.4);
        assert!(prev_width <= target);
        assert!(prev_width < final_width);
    }

    #[test]
    fn tile_row_rejects_zero_advance() {
        let face = BlockFace {
            advance: 0.0,
            line_height: 24.0,
        };
        let result = tile_row(&face, "mark", 14.4, 100.0);
        assert!(matches!(result, Err(Error::UnmeasurableText { .. })));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let face = SilentFace;
        let style = WatermarkStyle::default();

        let img = solid_image(10, 10, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            composite(&img, "", &style, &face),
            Err(Error::EmptyText)
        ));

        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 10));
        assert!(matches!(
            composite(&empty, "mark", &style, &face),
            Err(Error::EmptyImage { width: 0, height: 10 })
        ));
    }

    #[test]
    fn silent_face_round_trips_source_exactly() {
        let face = SilentFace;
        let style = WatermarkStyle::default();
        let mut img = RgbaImage::new(101, 53);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x % 256) as u8, (y % 256) as u8, 77, 255]);
        }
        let source = img.clone();
        let out = composite(&DynamicImage::ImageRgba8(img), "mark", &style, &face).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn watermark_blends_instead_of_replacing() {
        let face = BlockFace {
            advance: 10.0,
            line_height: 7.0,
        };
        let style = WatermarkStyle::default();
        let red = Rgba([255, 0, 0, 255]);
        let out = composite(&solid_image(100, 100, red), "mark", &style, &face).unwrap();

        let mut touched_rows = 0u32;
        let mut untouched_rows = 0u32;
        for y in 0..100 {
            let changed = (0..100).any(|x| *out.get_pixel(x, y) != red);
            if changed {
                touched_rows += 1;
                // White at alpha 80 over opaque red: red channel saturated,
                // green/blue lifted to ~80, alpha stays opaque.
                let px = out.get_pixel(0, y);
                assert_eq!(px[0], 255);
                assert!((75..=85).contains(&px[1]), "green {}", px[1]);
                assert!((75..=85).contains(&px[2]));
                assert_eq!(px[3], 255);
            } else {
                untouched_rows += 1;
                for x in 0..100 {
                    assert_eq!(*out.get_pixel(x, y), red);
                }
            }
        }
        assert!(touched_rows > 0, "no watermark row landed on the image");
        assert!(untouched_rows > 0, "watermark covered every row");
    }

    #[test]
    fn wider_pitch_draws_fewer_rows() {
        let face = BlockFace {
            advance: 10.0,
            line_height: 7.0,
        };
        let red = Rgba([255, 0, 0, 255]);

        let count_rows = |pitch: f32| -> u32 {
            let style = WatermarkStyle {
                pitch,
                ..WatermarkStyle::default()
            };
            let out = composite(&solid_image(100, 100, red), "mark", &style, &face).unwrap();
            (0..100)
                .filter(|&y| (0..100).any(|x| *out.get_pixel(x, y) != red))
                .count() as u32
        };

        assert!(count_rows(2.0) < count_rows(1.0));
    }

    #[test]
    fn blend_over_alpha_math() {
        // Transparent bottom: top wins
        let out = blend_over(Rgba([0, 0, 0, 0]), Rgba([255, 0, 0, 128]));
        assert_eq!(out, Rgba([255, 0, 0, 128]));

        // Transparent top: bottom survives
        let out = blend_over(Rgba([10, 200, 30, 255]), Rgba([255, 255, 255, 0]));
        assert_eq!(out, Rgba([10, 200, 30, 255]));

        // Both fully transparent
        let out = blend_over(Rgba([50, 50, 50, 0]), Rgba([200, 200, 200, 0]));
        assert_eq!(out, Rgba([0, 0, 0, 0]));
    }
}
