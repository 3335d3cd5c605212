//! Watermark style configuration.
//!
//! A [`WatermarkStyle`] bundles everything about the watermark's appearance:
//! font size in points, fill color and alpha, line pitch, and the rendering
//! DPI that maps physical lengths to pixels. Defaults match the classic
//! "faint white diagonal notice" look: 10.8pt text, white fill at alpha 80.

use image::Rgba;

use crate::error::{Error, Result};

/// Style configuration for one compositing call.
#[derive(Debug, Clone)]
pub struct WatermarkStyle {
    /// Font size in typographic points (1/72 inch).
    pub point_size: f32,
    /// Fill color, RGB.
    pub rgb: [u8; 3],
    /// Fill alpha. Low values keep the watermark non-destructive.
    pub alpha: u8,
    /// Line pitch multiplier applied to the font's line height.
    pub pitch: f32,
    /// Rendering DPI used to convert between pixels and physical lengths.
    pub dpi: f32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            // 0.15 inch
            point_size: 10.8,
            rgb: [255, 255, 255],
            alpha: 80,
            pitch: 1.0,
            dpi: 96.0,
        }
    }
}

impl WatermarkStyle {
    /// Fill paint as an RGBA pixel.
    #[must_use]
    pub fn fill(&self) -> Rgba<u8> {
        Rgba([self.rgb[0], self.rgb[1], self.rgb[2], self.alpha])
    }

    /// Font size in pixels at this style's DPI.
    #[must_use]
    pub fn px_size(&self) -> f32 {
        self.point_size * self.dpi / 72.0
    }

    /// Check that all numeric fields are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStyle`] if the point size, pitch, or DPI is
    /// not strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !self.point_size.is_finite() || self.point_size <= 0.0 {
            return Err(Error::InvalidStyle("point size must be positive"));
        }
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return Err(Error::InvalidStyle("line pitch must be positive"));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(Error::InvalidStyle("dpi must be positive"));
        }
        Ok(())
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both `#RGB` and `#RRGGBB` formats.
///
/// # Errors
///
/// Returns [`Error::InvalidStyle`] if the string is not a valid hex color.
pub fn parse_hex_color(hex: &str) -> Result<[u8; 3]> {
    let hex = hex
        .strip_prefix('#')
        .ok_or(Error::InvalidStyle("color must start with '#'"))?;
    if !hex.is_ascii() {
        return Err(Error::InvalidStyle("invalid hex digit in color"));
    }

    let digit = |s: &str| -> Result<u8> {
        u8::from_str_radix(s, 16).map_err(|_| Error::InvalidStyle("invalid hex digit in color"))
    };

    match hex.len() {
        // #RGB: each digit doubled, 0xF -> 0xFF
        3 => Ok([
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        ]),
        6 => Ok([
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        ]),
        _ => Err(Error::InvalidStyle("color must be #RGB or #RRGGBB")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_matches_classic_look() {
        let style = WatermarkStyle::default();
        assert_eq!(style.rgb, [255, 255, 255]);
        assert_eq!(style.alpha, 80);
        assert!((style.point_size - 10.8).abs() < 1e-6);
        assert!((style.pitch - 1.0).abs() < 1e-6);
        assert!((style.dpi - 96.0).abs() < 1e-6);
    }

    #[test]
    fn px_size_converts_points_at_dpi() {
        let style = WatermarkStyle::default();
        // 10.8pt at 96dpi is 14.4px
        assert!((style.px_size() - 14.4).abs() < 1e-4);

        let style = WatermarkStyle {
            point_size: 72.0,
            dpi: 300.0,
            ..WatermarkStyle::default()
        };
        assert!((style.px_size() - 300.0).abs() < 1e-4);
    }

    #[test]
    fn validate_rejects_non_positive_fields() {
        let mut style = WatermarkStyle {
            point_size: 0.0,
            ..WatermarkStyle::default()
        };
        assert!(style.validate().is_err());

        style.point_size = 10.0;
        style.pitch = -1.0;
        assert!(style.validate().is_err());

        style.pitch = 1.0;
        style.dpi = f32::NAN;
        assert!(style.validate().is_err());

        style.dpi = 96.0;
        assert!(style.validate().is_ok());
    }

    #[test]
    fn parse_hex_color_rrggbb() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), [255, 0, 0]);
        assert_eq!(parse_hex_color("#00FF00").unwrap(), [0, 255, 0]);
        assert_eq!(parse_hex_color("#0000FF").unwrap(), [0, 0, 255]);
        assert_eq!(parse_hex_color("#ffffff").unwrap(), [255, 255, 255]);
    }

    #[test]
    fn parse_hex_color_rgb() {
        assert_eq!(parse_hex_color("#FFF").unwrap(), [255, 255, 255]);
        // A=10*17=170, B=11*17=187, C=12*17=204
        assert_eq!(parse_hex_color("#abc").unwrap(), [170, 187, 204]);
    }

    #[test]
    fn parse_hex_color_invalid() {
        assert!(parse_hex_color("FF0000").is_err());
        assert!(parse_hex_color("#FF00").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn fill_combines_rgb_and_alpha() {
        let style = WatermarkStyle {
            rgb: [10, 20, 30],
            alpha: 200,
            ..WatermarkStyle::default()
        };
        assert_eq!(style.fill(), Rgba([10, 20, 30, 200]));
    }
}
