//! Error types for the tilemark crate.

use std::path::PathBuf;

/// Errors that can occur while compositing or writing watermarked images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read a font file from disk.
    #[error("failed to read font {path}: {source}")]
    FontRead {
        /// Path of the font file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The font data could not be parsed.
    #[error("malformed font data: {0}")]
    FontParse(#[from] ab_glyph::InvalidFont),

    /// The watermark text has no measurable width under the resolved font,
    /// so tiling it can never cover the working surface.
    #[error("text {text:?} has no measurable advance at {size}px")]
    UnmeasurableText {
        /// The text that failed to measure.
        text: String,
        /// Font size in pixels at which measurement was attempted.
        size: f32,
    },

    /// The watermark text is empty.
    #[error("watermark text is empty")]
    EmptyText,

    /// The source image has a zero dimension.
    #[error("source image is empty ({width}x{height})")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// A style field is out of range.
    #[error("invalid style: {0}")]
    InvalidStyle(&'static str),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (decode, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Failed to create an output file. Fatal in batch mode.
    #[error("failed to create output file {path}: {source}")]
    OutputCreate {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
