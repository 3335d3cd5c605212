//! Stamping engine: file and directory pipelines around the compositor.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::compositor;
use crate::error::{Error, Result};
use crate::font::{FontHandle, Typeface};
use crate::style::WatermarkStyle;

/// Outcome of processing one file in a batch run.
///
/// Per-file failures are recorded here instead of being swallowed, so a
/// caller can report or count them.
#[derive(Debug)]
pub struct FileOutcome {
    /// Input path of the file.
    pub path: PathBuf,
    /// Output path written on success, or the error that stopped this file.
    pub result: Result<PathBuf>,
}

/// The stamping engine holding a resolved font and a style.
///
/// Create once with [`StampEngine::load`] and reuse for any number of
/// images; every call gets its own working surface, so an engine may be
/// shared across threads.
pub struct StampEngine<F: Typeface = FontHandle> {
    face: F,
    style: WatermarkStyle,
}

impl StampEngine<FontHandle> {
    /// Create an engine from a font file and a style.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontRead`] or [`Error::FontParse`] if the font
    /// cannot be loaded.
    pub fn load(font_path: &Path, style: WatermarkStyle) -> Result<Self> {
        let face = FontHandle::load(font_path)?;
        Ok(Self { face, style })
    }
}

impl<F: Typeface> StampEngine<F> {
    /// Create an engine from an already-resolved typeface.
    pub fn with_typeface(face: F, style: WatermarkStyle) -> Self {
        Self { face, style }
    }

    /// The engine's style configuration.
    #[must_use]
    pub fn style(&self) -> &WatermarkStyle {
        &self.style
    }

    /// Stamp the watermark text over a decoded image.
    ///
    /// Returns a new image of identical dimensions; the source is untouched.
    ///
    /// # Errors
    ///
    /// Propagates any compositing error, see [`compositor::composite`].
    pub fn stamp(&self, image: &DynamicImage, text: &str) -> Result<RgbaImage> {
        compositor::composite(image, text, &self.style, &self.face)
    }

    /// Process a single image file: read, decode, stamp, encode, write.
    ///
    /// The output format is chosen by the output path's extension. Returns
    /// the output path on success.
    ///
    /// # Errors
    ///
    /// Any decode, compositing, or encode failure aborts the file with no
    /// partial output. A failure creating the output file (including its
    /// parent directory) is reported as [`Error::OutputCreate`], which batch
    /// callers treat as fatal.
    pub fn process_file(&self, input: &Path, output: &Path, text: &str) -> Result<PathBuf> {
        let bytes = std::fs::read(input)?;
        let image = decode_image(&bytes)?;
        let marked = self.stamp(&image, text)?;

        let ext = output
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("");
        let encoded = encode_image(&marked, ext)?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::OutputCreate {
                    path: output.to_path_buf(),
                    source,
                })?;
            }
        }
        let mut file = std::fs::File::create(output).map_err(|source| Error::OutputCreate {
            path: output.to_path_buf(),
            source,
        })?;
        file.write_all(&encoded)?;

        Ok(output.to_path_buf())
    }

    /// Process every supported image in a directory.
    ///
    /// Each file is stamped independently and written next to its input as
    /// `{stem}_marked.{ext}`; one file failing does not stop the others.
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    ///
    /// # Errors
    ///
    /// Returns an error only for run-fatal conditions: the directory cannot
    /// be read, or an output file cannot be created
    /// ([`Error::OutputCreate`]). Everything else is recorded per file in
    /// the returned [`FileOutcome`]s.
    pub fn process_directory(&self, input_dir: &Path, text: &str) -> Result<Vec<FileOutcome>>
    where
        F: Sync,
    {
        let entries: Vec<PathBuf> = std::fs::read_dir(input_dir)?
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect();

        #[cfg(feature = "cli")]
        let outcomes: Vec<FileOutcome> = {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|path| self.outcome_for(path, text))
                .collect()
        };

        #[cfg(not(feature = "cli"))]
        let outcomes: Vec<FileOutcome> = entries
            .iter()
            .map(|path| self.outcome_for(path, text))
            .collect();

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                FileOutcome {
                    result: Err(err @ Error::OutputCreate { .. }),
                    ..
                } => return Err(err),
                other => results.push(other),
            }
        }
        Ok(results)
    }

    fn outcome_for(&self, input: &Path, text: &str) -> FileOutcome {
        let output = default_output_path(input);
        let result = self.process_file(input, &output, text);
        FileOutcome {
            path: input.to_path_buf(),
            result,
        }
    }
}

/// Decode raw image bytes into a pixel buffer.
///
/// # Errors
///
/// Returns [`Error::Image`] if the bytes are not a supported, valid image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode a pixel buffer for the given lowercase-matched file extension.
///
/// `jpg`/`jpeg` encodes quality-maximized lossy (alpha flattened to RGB);
/// `png` encodes lossless RGBA. Any other extension is unsupported and
/// yields no output bytes.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for unrecognized extensions and
/// [`Error::Image`] if encoding itself fails.
pub fn encode_image(image: &RgbaImage, ext: &str) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 100);
            encoder.encode_image(&rgb)?;
        }
        "png" => {
            image.write_to(&mut buffer, ImageFormat::Png)?;
        }
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    }
    Ok(buffer.into_inner())
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_marked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_marked.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let v = if (x + y) % 2 == 0 { 200 } else { 40 };
            *px = Rgba([v, v / 2, 255 - v, 255]);
        }
        img
    }

    #[test]
    fn default_output_path_appends_marked_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_marked.jpg"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_marked.png");
    }

    #[test]
    fn is_supported_image_accepts_known_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
    }

    #[test]
    fn is_supported_image_rejects_everything_else() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.webp")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn encode_unsupported_extension_yields_no_bytes() {
        let img = checker(8, 8);
        let result = encode_image(&img, "gif");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn png_round_trip_is_pixel_identical() {
        let img = checker(16, 9);
        let bytes = encode_image(&img, "png").unwrap();
        let decoded = decode_image(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let img = checker(33, 17);
        let bytes = encode_image(&img, "JPG").unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8().dimensions(), (33, 17));
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        let result = decode_image(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(matches!(result, Err(Error::Image(_))));
    }
}
