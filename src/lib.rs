//! Stamp repeating, semi-transparent text watermarks across raster images.
//!
//! The text is tiled over a square working surface sized to the image
//! diagonal, drawn at a fixed line pitch, then cropped back to the original
//! bounds, so coverage stays uniform for any aspect ratio. Output dimensions
//! always equal the input's.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use tilemark::{StampEngine, WatermarkStyle};
//!
//! let engine = StampEngine::load(Path::new("DejaVuSans.ttf"), WatermarkStyle::default())
//!     .expect("failed to load font");
//! let img = image::open("photo.jpg").unwrap();
//! let marked = engine.stamp(&img, "FOR AUTHORIZED USE ONLY").unwrap();
//! marked.save("photo_marked.png").unwrap();
//! ```
//!
//! # Batch Processing
//!
//! Every supported image in a directory is stamped independently; one file
//! failing does not stop the rest, and each file's outcome is returned.
//!
//! ```no_run
//! use std::path::Path;
//! use tilemark::{StampEngine, WatermarkStyle};
//!
//! let engine = StampEngine::load(Path::new("DejaVuSans.ttf"), WatermarkStyle::default())
//!     .expect("failed to load font");
//! for outcome in engine.process_directory(Path::new("photos"), "CONFIDENTIAL").unwrap() {
//!     match &outcome.result {
//!         Ok(out) => println!("{} -> {}", outcome.path.display(), out.display()),
//!         Err(e) => eprintln!("{}: {e}", outcome.path.display()),
//!     }
//! }
//! ```

#![deny(missing_docs)]

pub mod compositor;
mod engine;
pub mod error;
pub mod font;
pub mod style;

pub use compositor::{composite, surface_side};
pub use engine::{
    decode_image, default_output_path, encode_image, is_supported_image, FileOutcome, StampEngine,
};
pub use error::{Error, Result};
pub use font::{FontHandle, Typeface};
pub use style::{parse_hex_color, WatermarkStyle};
