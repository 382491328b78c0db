//! mosaic - assemble filename-placed image tiles into one large image.
//!
//! Tiles named `x<digits>_y<digits>.ome.tif` are copied into a single
//! output canvas at the encoded pixel offsets, in bounded-memory
//! blocks, so the mosaic can be far larger than available RAM.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mosaic_core::{GridFilenameScheme, DEFAULT_BLOCK_SIZE};
use mosaic_io::{AssembleConfig, Assembler};

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(author, version, about = "Assemble placed image tiles into a single mosaic")]
#[command(long_about = "
Assembles a directory of image tiles into one large output image.
Each tile's destination is encoded in its filename:

  x<digits>_y<digits>.ome.tif  ->  top-left corner at (x, y) pixels

Pixel format and metadata are inherited from a reference tile; the
canvas extent is given explicitly. Pixels are copied in bounded-size
blocks, so output images far larger than RAM are fine.

Examples:
  mosaic tiles/ -o mosaic.ome.tif -r tiles/x0_y0.ome.tif --width 40000 --height 30000
  mosaic tiles/ -o out.ome.tif -r ref.ome.tif --width 2048 --height 2048 --delete-tiles
")]
struct Cli {
    /// Directory containing the input tiles
    tiles: PathBuf,

    /// Path of the output mosaic
    #[arg(short, long)]
    output: PathBuf,

    /// Reference image supplying pixel format and metadata
    #[arg(short, long)]
    reference: PathBuf,

    /// Canvas width in pixels
    #[arg(long)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long)]
    height: u32,

    /// Maximum block edge length during transfer
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    block_size: u32,

    /// Composite suffix tile files must carry
    #[arg(long, default_value = ".ome.tif")]
    suffix: String,

    /// Delete each source tile after it is fully copied (irreversible)
    #[arg(long)]
    delete_tiles: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(
        tiles = %cli.tiles.display(),
        output = %cli.output.display(),
        width = cli.width,
        height = cli.height,
        block_size = cli.block_size,
        "starting assembly"
    );

    let scheme = GridFilenameScheme::new(cli.suffix.clone());
    let config = AssembleConfig {
        block_size: cli.block_size,
        delete_sources: cli.delete_tiles,
    };

    let mut progress = |completed: usize, total: usize| {
        println!("{:.2}% complete...", 100.0 * completed as f64 / total as f64);
    };

    Assembler::new(&scheme)
        .with_config(config)
        .run_with_progress(
            &cli.tiles,
            &cli.reference,
            &cli.output,
            cli.width,
            cli.height,
            &mut progress,
        )
        .with_context(|| format!("failed to assemble {}", cli.output.display()))?;

    println!("Wrote {}", cli.output.display());
    Ok(())
}
