//! Recompose a print sheet from four stills on disk.
//!
//! Useful for reprinting a session from its archived `photo_<n>.jpg` files
//! without running the kiosk.

use anyhow::{Context, Result};
use clap::Parser;
use photobooth::{compose_print, PhotoRecord, PrintLayout};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "print_sheet")]
#[command(about = "Recompose a photobooth print sheet from four stills")]
#[command(version)]
struct Args {
    /// The four stills in capture order
    #[arg(num_args = 4, required = true)]
    photos: Vec<PathBuf>,

    /// Output file for the composed sheet
    #[arg(short, long, default_value = "print_sheet.jpg")]
    output: PathBuf,

    /// Printer resolution in dots per inch
    #[arg(long, default_value_t = 300.0)]
    dpi: f32,

    /// Physical print width in inches
    #[arg(long, default_value_t = 6.0)]
    width_inch: f32,

    /// Physical print height in inches
    #[arg(long, default_value_t = 4.0)]
    height_inch: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut records = Vec::new();
    for (index, path) in args.photos.iter().enumerate() {
        let image = image::open(path)
            .with_context(|| format!("cannot read {}", path.display()))?
            .to_rgb8();
        records.push(PhotoRecord::new(index as u8 + 1, image));
    }

    let layout = PrintLayout {
        dpi: args.dpi,
        width_inch: args.width_inch,
        height_inch: args.height_inch,
    };
    let sheet = compose_print(&records, &layout);

    sheet
        .save(&args.output)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!(
        "Wrote {}x{} print sheet to {}",
        sheet.width(),
        sheet.height(),
        args.output.display()
    );
    Ok(())
}
