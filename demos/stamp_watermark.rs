//! Stamp a text watermark onto a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example stamp_watermark -- input.jpg output.jpg font.ttf [text]
//! ```

use std::env;
use std::process;

use tilemark::{StampEngine, WatermarkStyle};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <input> <output> <font.ttf> [text]", args[0]);
        process::exit(1);
    }

    let text = args.get(4).map_or("FOR AUTHORIZED USE ONLY", String::as_str);

    let engine = match StampEngine::load(args[3].as_ref(), WatermarkStyle::default()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match engine.process_file(args[1].as_ref(), args[2].as_ref(), text) {
        Ok(out) => println!("Wrote {}", out.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
