//! Pixel blocks and the block grid.
//!
//! A [`Block`] is an ephemeral rectangular slice of pixel data bounded
//! to [`DEFAULT_BLOCK_SIZE`] (or a configured size) on each edge. The
//! driver moves one block at a time from a tile to the canvas, so peak
//! memory stays O(block_size^2) no matter how large the tile or the
//! canvas is.

use crate::pixel::PixelLayout;

/// Default maximum block edge length in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

/// A rectangular chunk of pixel data read from a tile.
///
/// `data` holds raw native-endian samples, row-major, with no padding
/// between rows. Blocks carry their layout so a sink can verify it
/// matches the canvas.
#[derive(Debug, Clone)]
pub struct Block {
    /// X origin within the source tile.
    pub x: u32,
    /// Y origin within the source tile.
    pub y: u32,
    /// Block width in pixels.
    pub width: u32,
    /// Block height in pixels.
    pub height: u32,
    /// Pixel layout of `data`.
    pub layout: PixelLayout,
    /// Raw sample bytes, `layout.byte_len(width, height)` long.
    pub data: Vec<u8>,
}

impl Block {
    /// Creates a new block from raw sample bytes.
    pub fn new(x: u32, y: u32, width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), layout.byte_len(width, height), "block data size mismatch");
        Self { x, y, width, height, layout, data }
    }

    /// Returns the byte length of one row of this block.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// Returns one row of sample bytes.
    #[inline]
    pub fn row(&self, row: u32) -> &[u8] {
        let stride = self.row_bytes();
        let start = row as usize * stride;
        &self.data[start..start + stride]
    }
}

/// Rectangle produced by [`BlockGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    /// X offset within the tile.
    pub x: u32,
    /// Y offset within the tile.
    pub y: u32,
    /// Rectangle width, clipped at the tile boundary.
    pub width: u32,
    /// Rectangle height, clipped at the tile boundary.
    pub height: u32,
}

/// Partitions a `width` x `height` rectangle into blocks of at most
/// `block_size` on a side.
///
/// Traversal is row-major: all blocks of one Y band are yielded before
/// Y advances. Edge blocks are clipped to the remaining extent, so the
/// grid covers the rectangle exactly with no gaps and no overlap.
pub fn block_grid(
    width: u32,
    height: u32,
    block_size: u32,
) -> impl Iterator<Item = BlockRect> {
    assert!(block_size > 0, "block size must be positive");
    let cols = width.div_ceil(block_size);
    let rows = height.div_ceil(block_size);

    (0..rows).flat_map(move |row| {
        (0..cols).map(move |col| {
            let x = col * block_size;
            let y = row * block_size;
            BlockRect {
                x,
                y,
                width: (width - x).min(block_size),
                height: (height - y).min(block_size),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{PixelLayout, SampleType};

    #[test]
    fn test_grid_with_remainder() {
        // 100x50 tile with 30x30 blocks
        let blocks: Vec<_> = block_grid(100, 50, 30).collect();

        // 4 columns x 2 rows
        assert_eq!(blocks.len(), 8);

        assert_eq!(blocks[0], BlockRect { x: 0, y: 0, width: 30, height: 30 });

        // Last block clipped on both edges
        let last = blocks[7];
        assert_eq!(last.x, 90);
        assert_eq!(last.y, 30);
        assert_eq!(last.width, 10);
        assert_eq!(last.height, 20);
    }

    #[test]
    fn test_grid_exact_fit() {
        let blocks: Vec<_> = block_grid(64, 64, 32).collect();
        assert_eq!(blocks.len(), 4);
        for b in &blocks {
            assert_eq!(b.width, 32);
            assert_eq!(b.height, 32);
        }
    }

    #[test]
    fn test_grid_single_block() {
        let blocks: Vec<_> = block_grid(100, 100, 1024).collect();
        assert_eq!(blocks, vec![BlockRect { x: 0, y: 0, width: 100, height: 100 }]);
    }

    #[test]
    fn test_grid_row_major_and_covering() {
        let width = 37;
        let height = 23;
        let blocks: Vec<_> = block_grid(width, height, 10).collect();

        // Row-major: y never decreases, and within a band x increases.
        let mut prev: Option<BlockRect> = None;
        let mut covered = vec![false; (width * height) as usize];
        for b in blocks {
            if let Some(p) = prev {
                assert!(b.y > p.y || (b.y == p.y && b.x > p.x));
            }
            for y in b.y..b.y + b.height {
                for x in b.x..b.x + b.width {
                    let idx = (y * width + x) as usize;
                    assert!(!covered[idx], "block overlap at ({x},{y})");
                    covered[idx] = true;
                }
            }
            prev = Some(b);
        }
        assert!(covered.iter().all(|&c| c), "grid left gaps");
    }

    #[test]
    fn test_block_rows() {
        let layout = PixelLayout::new(SampleType::U8, 3);
        let data: Vec<u8> = (0..24).collect();
        let block = Block::new(0, 0, 4, 2, layout, data);

        assert_eq!(block.row_bytes(), 12);
        assert_eq!(block.row(1), &(12..24).collect::<Vec<u8>>()[..]);
    }
}
