//! The assembly driver.
//!
//! Orchestrates collection, tile reading, and canvas writing: for each
//! tile in collection order, copies all of its pixel data into the
//! canvas in bounded-size blocks, then optionally deletes the source
//! file. Strictly sequential, single canvas writer — this is what
//! makes overlap resolution deterministic (last writer in collection
//! order wins).
//!
//! Any error is fatal to the whole run. There is no skip-and-continue,
//! no retry, and no partial-success output: a failed run leaves either
//! no output file or an unreliable one, and callers must discard it.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use mosaic_core::{block_grid, MosaicError, MosaicResult, PlacementScheme, DEFAULT_BLOCK_SIZE};

use crate::collect::{collect_tiles, CollectedTile};
use crate::tiff::{TiffCanvas, TiffTile};
use crate::traits::{CanvasSink, TileSource};

/// Driver configuration.
#[derive(Debug, Clone, Copy)]
pub struct AssembleConfig {
    /// Maximum block edge length in pixels during transfer.
    pub block_size: u32,
    /// Delete each source tile after its transfer completes.
    ///
    /// Off by default: this is irreversible, and a tile is only ever
    /// removed after every one of its blocks has landed and its handle
    /// is closed. A failure mid-transfer always leaves the file intact.
    pub delete_sources: bool,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            delete_sources: false,
        }
    }
}

/// Called after each tile finishes. Informational only.
pub trait ProgressCallback {
    /// `completed` of `total` tiles are fully transferred.
    fn on_tile(&mut self, completed: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressCallback for F {
    fn on_tile(&mut self, completed: usize, total: usize) {
        self(completed, total);
    }
}

/// Assembles a mosaic from a directory of placed tiles.
///
/// # Example
///
/// ```ignore
/// use mosaic_core::GridFilenameScheme;
/// use mosaic_io::{Assembler, AssembleConfig};
///
/// let scheme = GridFilenameScheme::default();
/// Assembler::new(&scheme)
///     .with_config(AssembleConfig { block_size: 1024, delete_sources: false })
///     .run("tiles/", "tiles/x0_y0.ome.tif", "mosaic.ome.tif", 20000, 20000)?;
/// ```
pub struct Assembler<'a> {
    scheme: &'a dyn PlacementScheme,
    config: AssembleConfig,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler using the given placement scheme.
    pub fn new(scheme: &'a dyn PlacementScheme) -> Self {
        Self {
            scheme,
            config: AssembleConfig::default(),
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: AssembleConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the full assembly.
    ///
    /// `reference` supplies the output's pixel layout and metadata;
    /// `width` and `height` fix the canvas extent.
    pub fn run<P, Q, R>(
        &self,
        tile_dir: P,
        reference: Q,
        output: R,
        width: u32,
        height: u32,
    ) -> MosaicResult<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        self.run_with_progress(tile_dir, reference, output, width, height, &mut |_: usize, _: usize| {})
    }

    /// Runs the full assembly, reporting per-tile progress.
    pub fn run_with_progress<P, Q, R>(
        &self,
        tile_dir: P,
        reference: Q,
        output: R,
        width: u32,
        height: u32,
        progress: &mut dyn ProgressCallback,
    ) -> MosaicResult<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let tile_dir = tile_dir.as_ref();
        let output = output.as_ref();

        // Collection parses every placement, so a bad name or an
        // unlistable directory aborts before any output exists.
        let tiles = collect_tiles(tile_dir, self.scheme)?;
        info!(
            dir = %tile_dir.display(),
            tiles = tiles.len(),
            output = %output.display(),
            "assembling mosaic"
        );

        let mut canvas = TiffCanvas::create(reference.as_ref(), output)?;
        canvas.set_dimensions(width, height)?;

        let total = tiles.len();
        for (index, tile) in tiles.iter().enumerate() {
            info!(
                tile = %tile.path.display(),
                "{:.2}% complete",
                100.0 * index as f64 / total.max(1) as f64
            );

            self.copy_tile(tile, &mut canvas)?;

            if self.config.delete_sources {
                fs::remove_file(&tile.path)?;
                debug!(tile = %tile.path.display(), "deleted source tile");
            }

            progress.on_tile(index + 1, total);
        }

        info!("100% complete");
        canvas.finish()
    }

    /// Copies one tile into the canvas. The tile handle is released
    /// when this returns, success or not.
    fn copy_tile(&self, tile: &CollectedTile, canvas: &mut dyn CanvasSink) -> MosaicResult<()> {
        let mut source = TiffTile::open(&tile.path)?;

        if source.layout() != canvas.layout() {
            return Err(MosaicError::LayoutMismatch {
                tile: source.layout(),
                canvas: canvas.layout(),
            });
        }

        copy_blocks(&mut source, canvas, tile.origin, self.config.block_size)
    }
}

/// Transfers every block of `source` into `canvas` at `origin`.
///
/// The tile's whole placement rectangle is bounds-checked first, so an
/// oversized placement fails before a single block is written. Blocks
/// then move in the canonical row-major order.
fn copy_blocks(
    source: &mut dyn TileSource,
    canvas: &mut dyn CanvasSink,
    origin: (u32, u32),
    block_size: u32,
) -> MosaicResult<()> {
    let (tile_w, tile_h) = source.dimensions();
    let (origin_x, origin_y) = origin;
    let (canvas_w, canvas_h) = canvas.dimensions().ok_or(MosaicError::CanvasUnsized)?;

    let fits = origin_x.checked_add(tile_w).is_some_and(|right| right <= canvas_w)
        && origin_y.checked_add(tile_h).is_some_and(|bottom| bottom <= canvas_h);
    if !fits {
        return Err(MosaicError::OutOfBounds {
            x: origin_x,
            y: origin_y,
            width: tile_w,
            height: tile_h,
            extent_width: canvas_w,
            extent_height: canvas_h,
        });
    }

    for rect in block_grid(tile_w, tile_h, block_size) {
        let block = source.read_block(rect.x, rect.y, rect.width, rect.height)?;
        canvas.write_block(origin_x + rect.x, origin_y + rect.y, &block)?;
    }

    Ok(())
}
