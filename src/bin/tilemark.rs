use std::path::PathBuf;
use std::process;

use clap::Parser;

use tilemark::{
    default_output_path, parse_hex_color, Error, FileOutcome, StampEngine, WatermarkStyle,
};

#[derive(Parser)]
#[command(
    name = "tilemark",
    about = "Stamp repeating semi-transparent text watermarks across raster images",
    version,
    after_help = "Simple usage: tilemark -t photo.jpg -f DejaVuSans.ttf\n\n\
                  With a directory target, every jpg/jpeg/png inside is stamped\n\
                  independently to {name}_marked.{ext}; --output is ignored."
)]
struct Cli {
    /// Image file or directory to stamp
    #[arg(short, long)]
    target: PathBuf,

    /// Output file (default: {name}_marked.{ext}; ignored for directories)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a TrueType/OpenType font file
    #[arg(short, long)]
    fonts: PathBuf,

    /// Watermark text
    #[arg(long, default_value = "FOR AUTHORIZED USE ONLY")]
    text: String,

    /// Font size in points
    #[arg(long, default_value_t = 10.8)]
    size: f32,

    /// Fill color (#RGB or #RRGGBB)
    #[arg(long, default_value = "#FFFFFF")]
    color: String,

    /// Fill alpha (0-255)
    #[arg(long, default_value_t = 80)]
    alpha: u8,

    /// Line pitch multiplier
    #[arg(long, default_value_t = 1.0)]
    pitch: f32,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let rgb = match parse_hex_color(&cli.color) {
        Ok(rgb) => rgb,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let style = WatermarkStyle {
        point_size: cli.size,
        rgb,
        alpha: cli.alpha,
        pitch: cli.pitch,
        ..WatermarkStyle::default()
    };
    if let Err(e) = style.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let engine = match StampEngine::load(&cli.fonts, style) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: {e}");
            process::exit(1);
        }
    };

    if !cli.target.exists() {
        eprintln!("Error: Target path does not exist: {}", cli.target.display());
        process::exit(1);
    }

    let outcomes = if cli.target.is_dir() {
        match engine.process_directory(&cli.target, &cli.text) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                eprintln!("Fatal: {e}");
                process::exit(1);
            }
        }
    } else {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&cli.target));
        match engine.process_file(&cli.target, &output, &cli.text) {
            Err(e @ Error::OutputCreate { .. }) => {
                eprintln!("Fatal: {e}");
                process::exit(1);
            }
            result => vec![FileOutcome {
                path: cli.target.clone(),
                result,
            }],
        }
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for outcome in &outcomes {
        print_outcome(outcome, cli.quiet);
        if outcome.result.is_ok() {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if outcomes.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Marked: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", outcomes.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_outcome(outcome: &FileOutcome, quiet: bool) {
    let filename = outcome.path.file_name().map_or_else(
        || outcome.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    match &outcome.result {
        Ok(output) => {
            if !quiet {
                eprintln!("[OK] {filename} -> {}", output.display());
            }
        }
        Err(e) => {
            eprintln!("[FAIL] {filename}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["tilemark", "-t", "photo.jpg", "-f", "font.ttf"]);
        assert_eq!(cli.target, Path::new("photo.jpg"));
        assert_eq!(cli.fonts, Path::new("font.ttf"));
        assert!(cli.output.is_none());
        assert_eq!(cli.text, "FOR AUTHORIZED USE ONLY");
        assert_eq!(cli.alpha, 80);
        assert!((cli.pitch - 1.0).abs() < f32::EPSILON);
    }
}
