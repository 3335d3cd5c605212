#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use tilemark::{Error, StampEngine, Typeface, WatermarkStyle};

/// Fixed-advance typeface double: 12px per char, 18px lines, paints the
/// one-pixel baseline row. Lets the whole pipeline run without a font file.
struct RuledFace;

impl Typeface for RuledFace {
    fn line_width(&self, text: &str, _px_size: f32) -> f32 {
        text.chars().count() as f32 * 12.0
    }

    fn line_height(&self, _px_size: f32) -> f32 {
        18.0
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
        let end = (x + self.line_width(text, px_size)).min(canvas.width() as f32);
        let start = x.max(0.0);
        if start >= end {
            return;
        }
        for px in (start as u32)..(end as u32) {
            canvas.put_pixel(px, y as u32, color);
        }
    }
}

fn ruled_engine() -> StampEngine<RuledFace> {
    StampEngine::with_typeface(RuledFace, WatermarkStyle::default())
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]);
    }
    img
}

#[test]
fn engine_load_fails_for_missing_font() {
    let result = StampEngine::load(
        Path::new("/nonexistent/font.ttf"),
        WatermarkStyle::default(),
    );
    assert!(matches!(result, Err(Error::FontRead { .. })));
}

#[test]
fn engine_load_fails_for_corrupt_font() {
    let dir = tempfile::tempdir().unwrap();
    let font_path = dir.path().join("broken.ttf");
    std::fs::write(&font_path, b"this is not a font").unwrap();

    let result = StampEngine::load(&font_path, WatermarkStyle::default());
    assert!(matches!(result, Err(Error::FontParse(_))));
}

#[test]
fn stamp_preserves_dimensions() {
    let engine = ruled_engine();
    for (w, h) in [(100, 100), (640, 360), (75, 201)] {
        let img = DynamicImage::ImageRgba8(gradient(w, h));
        let out = engine.stamp(&img, "CONFIDENTIAL").unwrap();
        assert_eq!((out.width(), out.height()), (w, h));
    }
}

#[test]
fn stamp_rejects_empty_text() {
    let engine = ruled_engine();
    let img = DynamicImage::ImageRgba8(gradient(32, 32));
    assert!(matches!(engine.stamp(&img, ""), Err(Error::EmptyText)));
}

#[test]
fn process_file_writes_marked_copy() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    gradient(60, 40).save(&input).unwrap();

    let engine = ruled_engine();
    let output = dir.path().join("photo_marked.png");
    let written = engine.process_file(&input, &output, "mark").unwrap();

    assert_eq!(written, output);
    let decoded = image::open(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 40));
}

#[test]
fn process_file_unsupported_output_extension_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    gradient(20, 20).save(&input).unwrap();

    let engine = ruled_engine();
    let output = dir.path().join("photo.gif");
    let result = engine.process_file(&input, &output, "mark");

    assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    assert!(!output.exists());
}

#[test]
fn process_file_reports_output_create_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    gradient(20, 20).save(&input).unwrap();

    // A plain file where a parent directory would have to be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let engine = ruled_engine();
    let output = blocker.join("nested").join("out.png");
    let result = engine.process_file(&input, &output, "mark");

    assert!(matches!(result, Err(Error::OutputCreate { .. })));
}

#[test]
fn directory_batch_skips_corrupt_files_and_marks_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png"] {
        gradient(30, 30).save(dir.path().join(name)).unwrap();
    }
    // JPEG input has no alpha channel
    DynamicImage::ImageRgba8(gradient(30, 30))
        .to_rgb8()
        .save(dir.path().join("c.jpg"))
        .unwrap();
    std::fs::write(dir.path().join("bad.png"), b"not an image at all").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let engine = ruled_engine();
    let outcomes = engine.process_directory(dir.path(), "mark").unwrap();

    // The .txt file is never selected
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes.iter().filter(|o| o.result.is_ok()).count(), 3);

    assert!(dir.path().join("a_marked.png").exists());
    assert!(dir.path().join("b_marked.png").exists());
    assert!(dir.path().join("c_marked.jpg").exists());
    assert!(!dir.path().join("bad_marked.png").exists());

    let failed = outcomes
        .iter()
        .find(|o| o.result.is_err())
        .expect("corrupt file outcome");
    assert!(failed.path.ends_with("bad.png"));
}

#[test]
fn directory_batch_aborts_when_output_cannot_be_created() {
    let dir = tempfile::tempdir().unwrap();
    gradient(30, 30).save(dir.path().join("photo.png")).unwrap();
    // Occupy the output path with a directory so File::create fails
    std::fs::create_dir(dir.path().join("photo_marked.png")).unwrap();

    let engine = ruled_engine();
    let result = engine.process_directory(dir.path(), "mark");
    assert!(matches!(result, Err(Error::OutputCreate { .. })));
}

#[test]
fn stamped_png_survives_encode_decode_round_trip() {
    let engine = ruled_engine();
    let img = DynamicImage::ImageRgba8(gradient(48, 48));
    let stamped = engine.stamp(&img, "mark").unwrap();

    let bytes = tilemark::encode_image(&stamped, "png").unwrap();
    let decoded = tilemark::decode_image(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded, stamped);
}
