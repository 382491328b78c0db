//! TIFF tile reader and canvas writer.
//!
//! The reader uses the `tiff` crate's `read_chunk()` API so only the
//! strips or tiles overlapping a requested block are decoded, never
//! the whole image.
//!
//! The writer cannot lean on the encoder the same way: the `tiff`
//! crate writes strips strictly top to bottom, while tiles arrive in
//! placement order and land at arbitrary offsets. Incoming blocks are
//! therefore spilled into a raw row-major scratch file next to the
//! output (`<output>.partial`), and [`TiffCanvas::finish`] re-streams
//! that scratch through the strip encoder. Peak memory stays bounded
//! by one block plus one strip regardless of canvas size.
//!
//! Pixel data is never converted: samples pass through as raw
//! native-endian bytes, and the output carries the reference image's
//! pixel layout and ImageDescription (the tag OME-XML travels in)
//! verbatim.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{ImageEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;

use mosaic_core::{Block, MosaicError, MosaicResult, PixelLayout, SampleType};

use crate::traits::{CanvasSink, TileSource};

/// Target strip payload when re-encoding the canvas, in bytes.
const STRIP_TARGET_BYTES: u64 = 1 << 20;

/// Attaches the offending path to an I/O error.
fn io_at(path: &Path, err: io::Error) -> MosaicError {
    MosaicError::Io(io::Error::new(
        err.kind(),
        format!("{}: {}", path.display(), err),
    ))
}

/// Maps a decoder color type onto the layouts the assembler handles.
fn layout_from_colortype(color_type: tiff::ColorType) -> MosaicResult<PixelLayout> {
    use tiff::ColorType as Ct;
    let (sample_type, channels) = match color_type {
        Ct::Gray(8) => (SampleType::U8, 1),
        Ct::Gray(16) => (SampleType::U16, 1),
        Ct::Gray(32) => (SampleType::F32, 1),
        Ct::RGB(8) => (SampleType::U8, 3),
        Ct::RGB(16) => (SampleType::U16, 3),
        Ct::RGB(32) => (SampleType::F32, 3),
        Ct::RGBA(8) => (SampleType::U8, 4),
        Ct::RGBA(16) => (SampleType::U16, 4),
        Ct::RGBA(32) => (SampleType::F32, 4),
        other => {
            return Err(MosaicError::UnsupportedFormat(format!("{other:?}")));
        }
    };
    Ok(PixelLayout::new(sample_type, channels))
}

/// Names a decoding result variant for error messages.
fn decoding_variant(result: &DecodingResult) -> &'static str {
    match result {
        DecodingResult::U8(_) => "u8",
        DecodingResult::U16(_) => "u16",
        DecodingResult::U32(_) => "u32",
        DecodingResult::U64(_) => "u64",
        DecodingResult::F32(_) => "f32",
        DecodingResult::F64(_) => "f64",
        _ => "signed",
    }
}

/// Converts decoded samples to raw native-endian bytes.
///
/// The sample type must agree with the layout discovered at open; a
/// mismatch means the file lied about its color type.
fn samples_to_bytes(result: DecodingResult, layout: PixelLayout) -> MosaicResult<Vec<u8>> {
    match (result, layout.sample_type) {
        (DecodingResult::U8(samples), SampleType::U8) => Ok(samples),
        (DecodingResult::U16(samples), SampleType::U16) => {
            let mut bytes = Vec::with_capacity(samples.len() * 2);
            for sample in samples {
                bytes.extend_from_slice(&sample.to_ne_bytes());
            }
            Ok(bytes)
        }
        (DecodingResult::F32(samples), SampleType::F32) => {
            let mut bytes = Vec::with_capacity(samples.len() * 4);
            for sample in samples {
                bytes.extend_from_slice(&sample.to_ne_bytes());
            }
            Ok(bytes)
        }
        (other, _) => Err(MosaicError::Decode(format!(
            "chunk decoded as {} but layout is {layout}",
            decoding_variant(&other)
        ))),
    }
}

// =============================================================================
// Tile reader
// =============================================================================

/// One open tile with chunk-based random access.
///
/// Only the TIFF header is read at open; pixel data is decoded on
/// demand per [`read_block`](TileSource::read_block). The file handle
/// is released on drop.
#[derive(Debug)]
pub struct TiffTile {
    /// Path to the tile (for error messages).
    path: PathBuf,
    /// Tile width in pixels.
    width: u32,
    /// Tile height in pixels.
    height: u32,
    /// Chunk dimensions (tile size for tiled TIFFs, strip size otherwise).
    chunk_dims: (u32, u32),
    /// Pixel layout discovered from the color type.
    layout: PixelLayout,
    /// Decoder with cached file handle.
    decoder: Decoder<BufReader<File>>,
}

impl TiffTile {
    /// Opens a tile for reading and discovers its dimensions.
    pub fn open<P: AsRef<Path>>(path: P) -> MosaicResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| io_at(&path, e))?;

        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| MosaicError::Decode(format!("{}: header: {e}", path.display())))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| MosaicError::Decode(format!("{}: dimensions: {e}", path.display())))?;

        let color_type = decoder
            .colortype()
            .map_err(|e| MosaicError::Decode(format!("{}: colortype: {e}", path.display())))?;
        let layout = layout_from_colortype(color_type)?;

        let chunk_dims = decoder.chunk_dimensions();

        Ok(Self {
            path,
            width,
            height,
            chunk_dims,
            layout,
            decoder,
        })
    }

    /// Returns the tile's path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the (chunk_x, chunk_y, pixel_x, pixel_y) of every chunk
    /// overlapping the given rectangle.
    fn chunks_for_block(&self, x: u32, y: u32, w: u32, h: u32) -> Vec<(u32, u32, u32, u32)> {
        let (chunk_w, chunk_h) = self.chunk_dims;

        let start_cx = x / chunk_w;
        let start_cy = y / chunk_h;
        let end_cx = (x + w - 1) / chunk_w;
        let end_cy = (y + h - 1) / chunk_h;

        let mut chunks =
            Vec::with_capacity(((end_cx - start_cx + 1) * (end_cy - start_cy + 1)) as usize);

        for cy in start_cy..=end_cy {
            for cx in start_cx..=end_cx {
                chunks.push((cx, cy, cx * chunk_w, cy * chunk_h));
            }
        }

        chunks
    }

    /// Reads one chunk as raw bytes plus its actual dimensions.
    fn read_chunk_bytes(&mut self, chunk_x: u32, chunk_y: u32) -> MosaicResult<(Vec<u8>, u32, u32)> {
        let chunks_per_row = self.width.div_ceil(self.chunk_dims.0);
        let chunk_index = chunk_y * chunks_per_row + chunk_x;

        let result = self.decoder.read_chunk(chunk_index).map_err(|e| {
            MosaicError::Decode(format!("{}: chunk {chunk_index}: {e}", self.path.display()))
        })?;

        let (actual_w, actual_h) = self.decoder.chunk_data_dimensions(chunk_index);
        let bytes = samples_to_bytes(result, self.layout)?;

        Ok((bytes, actual_w, actual_h))
    }
}

impl TileSource for TiffTile {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn layout(&self) -> PixelLayout {
        self.layout
    }

    fn read_block(&mut self, x: u32, y: u32, width: u32, height: u32) -> MosaicResult<Block> {
        let in_bounds = x.checked_add(width).is_some_and(|right| right <= self.width)
            && y.checked_add(height).is_some_and(|bottom| bottom <= self.height)
            && width > 0
            && height > 0;
        if !in_bounds {
            return Err(MosaicError::OutOfBounds {
                x,
                y,
                width,
                height,
                extent_width: self.width,
                extent_height: self.height,
            });
        }

        let bpp = self.layout.bytes_per_pixel();
        let mut data = vec![0u8; self.layout.byte_len(width, height)];

        for (chunk_x, chunk_y, chunk_px, chunk_py) in self.chunks_for_block(x, y, width, height) {
            let (chunk_bytes, chunk_w, chunk_h) = self.read_chunk_bytes(chunk_x, chunk_y)?;

            // Intersection of the chunk with the requested rectangle.
            let ix0 = x.max(chunk_px);
            let iy0 = y.max(chunk_py);
            let ix1 = (x + width).min(chunk_px + chunk_w);
            let iy1 = (y + height).min(chunk_py + chunk_h);

            let copy_bytes = (ix1 - ix0) as usize * bpp;
            for row in iy0..iy1 {
                let src = ((row - chunk_py) as usize * chunk_w as usize
                    + (ix0 - chunk_px) as usize)
                    * bpp;
                let dst =
                    ((row - y) as usize * width as usize + (ix0 - x) as usize) * bpp;
                data[dst..dst + copy_bytes]
                    .copy_from_slice(&chunk_bytes[src..src + copy_bytes]);
            }
        }

        Ok(Block::new(x, y, width, height, self.layout, data))
    }
}

// =============================================================================
// Canvas writer
// =============================================================================

/// The output mosaic, backed by a row-major scratch file.
///
/// Created from a reference image whose pixel layout and
/// ImageDescription the output inherits. Blocks persist to the scratch
/// file as they arrive; [`finish`](TiffCanvas::finish) encodes the
/// final TIFF strip by strip and removes the scratch. Dropping the
/// canvas without finishing removes the scratch and leaves no output
/// that could be mistaken for a successful run.
#[derive(Debug)]
pub struct TiffCanvas {
    /// Final output path.
    path: PathBuf,
    /// Scratch spill file path (`<output>.partial`).
    scratch_path: PathBuf,
    /// Open scratch handle once sized.
    scratch: Option<File>,
    /// Layout inherited from the reference image.
    layout: PixelLayout,
    /// ImageDescription copied verbatim from the reference.
    description: Option<String>,
    /// Canvas width, valid once `sized`.
    width: u32,
    /// Canvas height, valid once `sized`.
    height: u32,
    /// True after `set_dimensions`.
    sized: bool,
    /// True after the first block write.
    written: bool,
    /// True after `finish` succeeded.
    finished: bool,
}

impl TiffCanvas {
    /// Creates a canvas at `output`, inheriting pixel layout and
    /// metadata from `reference`.
    ///
    /// No file is created yet; the scratch appears at
    /// [`set_dimensions`](CanvasSink::set_dimensions) and the output
    /// itself only at [`finish`](TiffCanvas::finish).
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(reference: P, output: Q) -> MosaicResult<Self> {
        let reference = reference.as_ref();
        let path = output.as_ref().to_path_buf();

        let file = File::open(reference).map_err(|e| io_at(reference, e))?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| {
            MosaicError::Decode(format!("{}: header: {e}", reference.display()))
        })?;

        let color_type = decoder.colortype().map_err(|e| {
            MosaicError::Decode(format!("{}: colortype: {e}", reference.display()))
        })?;
        let layout = layout_from_colortype(color_type)?;

        // OME-XML and friends ride in ImageDescription; copy it or nothing.
        let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();

        let mut scratch_os = path.as_os_str().to_os_string();
        scratch_os.push(".partial");

        Ok(Self {
            path,
            scratch_path: PathBuf::from(scratch_os),
            scratch: None,
            layout,
            description,
            width: 0,
            height: 0,
            sized: false,
            written: false,
            finished: false,
        })
    }

    /// Returns the output path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalizes the canvas: encodes the output TIFF from the scratch
    /// file and removes the scratch. Consumes the canvas.
    pub fn finish(mut self) -> MosaicResult<()> {
        if !self.sized {
            return Err(MosaicError::CanvasUnsized);
        }

        // Drop the write handle before re-opening for the encode pass.
        if let Some(scratch) = self.scratch.take() {
            scratch.sync_all().map_err(|e| io_at(&self.scratch_path, e))?;
        }
        let scratch = File::open(&self.scratch_path).map_err(|e| io_at(&self.scratch_path, e))?;
        let mut scratch = BufReader::new(scratch);

        let out = File::create(&self.path).map_err(|e| io_at(&self.path, e))?;
        let mut encoder = TiffEncoder::new(BufWriter::new(out))
            .map_err(|e| MosaicError::Encode(format!("{}: encoder: {e}", self.path.display())))?;

        let (width, height) = (self.width, self.height);
        let description = self.description.as_deref();

        macro_rules! encode_as {
            ($color:ty) => {{
                let image = encoder.new_image::<$color>(width, height).map_err(|e| {
                    MosaicError::Encode(format!("{}: image: {e}", self.path.display()))
                })?;
                stream_strips::<_, $color, _>(image, &mut scratch, description, width, &self.path)
            }};
        }

        match (self.layout.sample_type, self.layout.channels) {
            (SampleType::U8, 1) => encode_as!(colortype::Gray8)?,
            (SampleType::U16, 1) => encode_as!(colortype::Gray16)?,
            (SampleType::F32, 1) => encode_as!(colortype::Gray32Float)?,
            (SampleType::U8, 3) => encode_as!(colortype::RGB8)?,
            (SampleType::U16, 3) => encode_as!(colortype::RGB16)?,
            (SampleType::F32, 3) => encode_as!(colortype::RGB32Float)?,
            (SampleType::U8, 4) => encode_as!(colortype::RGBA8)?,
            (SampleType::U16, 4) => encode_as!(colortype::RGBA16)?,
            (SampleType::F32, 4) => encode_as!(colortype::RGBA32Float)?,
            _ => {
                return Err(MosaicError::UnsupportedFormat(self.layout.to_string()));
            }
        }

        self.finished = true;
        std::fs::remove_file(&self.scratch_path).map_err(|e| io_at(&self.scratch_path, e))?;
        Ok(())
    }
}

impl CanvasSink for TiffCanvas {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.sized.then_some((self.width, self.height))
    }

    fn layout(&self) -> PixelLayout {
        self.layout
    }

    fn set_dimensions(&mut self, width: u32, height: u32) -> MosaicResult<()> {
        if self.written {
            return Err(MosaicError::CanvasAlreadyWritten);
        }
        if self.sized {
            return Err(MosaicError::CanvasAlreadySized);
        }

        let scratch = File::create(&self.scratch_path).map_err(|e| io_at(&self.scratch_path, e))?;
        let len = width as u64 * height as u64 * self.layout.bytes_per_pixel() as u64;
        // Sparse zero fill: uncovered canvas areas stay black.
        scratch.set_len(len).map_err(|e| io_at(&self.scratch_path, e))?;

        self.scratch = Some(scratch);
        self.width = width;
        self.height = height;
        self.sized = true;
        Ok(())
    }

    fn write_block(&mut self, x: u32, y: u32, block: &Block) -> MosaicResult<()> {
        if !self.sized {
            return Err(MosaicError::CanvasUnsized);
        }
        if block.layout != self.layout {
            return Err(MosaicError::LayoutMismatch {
                tile: block.layout,
                canvas: self.layout,
            });
        }

        let in_bounds = x.checked_add(block.width).is_some_and(|right| right <= self.width)
            && y.checked_add(block.height).is_some_and(|bottom| bottom <= self.height);
        if !in_bounds {
            return Err(MosaicError::OutOfBounds {
                x,
                y,
                width: block.width,
                height: block.height,
                extent_width: self.width,
                extent_height: self.height,
            });
        }

        let bpp = self.layout.bytes_per_pixel() as u64;
        let row_stride = self.width as u64 * bpp;
        let scratch = self.scratch.as_mut().ok_or(MosaicError::CanvasUnsized)?;

        for row in 0..block.height {
            let offset = (y + row) as u64 * row_stride + x as u64 * bpp;
            scratch
                .seek(SeekFrom::Start(offset))
                .map_err(|e| io_at(&self.scratch_path, e))?;
            scratch
                .write_all(block.row(row))
                .map_err(|e| io_at(&self.scratch_path, e))?;
        }

        self.written = true;
        Ok(())
    }

    fn finish(self: Box<Self>) -> MosaicResult<()> {
        (*self).finish()
    }
}

impl Drop for TiffCanvas {
    fn drop(&mut self) {
        // A canvas dropped before finish leaves no scratch behind; the
        // partially-written output (if any) is not valid anyway.
        if !self.finished {
            self.scratch.take();
            let _ = std::fs::remove_file(&self.scratch_path);
        }
    }
}

/// Samples reconstructible from raw native-endian scratch bytes.
trait ScratchSample: Sized + Copy {
    fn from_bytes(bytes: &[u8]) -> Vec<Self>;
}

impl ScratchSample for u8 {
    fn from_bytes(bytes: &[u8]) -> Vec<Self> {
        bytes.to_vec()
    }
}

impl ScratchSample for u16 {
    fn from_bytes(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_ne_bytes([chunk[0], chunk[1]]))
            .collect()
    }
}

impl ScratchSample for f32 {
    fn from_bytes(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

/// Pumps the scratch file through the strip encoder.
fn stream_strips<W, C, K>(
    mut image: ImageEncoder<'_, W, C, K>,
    scratch: &mut BufReader<File>,
    description: Option<&str>,
    width: u32,
    path: &Path,
) -> MosaicResult<()>
where
    W: Write + Seek,
    C: ColorType,
    C::Inner: ScratchSample,
    [C::Inner]: TiffValue,
    K: TiffKind,
{
    let encode_err =
        |stage: &str, e: tiff::TiffError| MosaicError::Encode(format!("{}: {stage}: {e}", path.display()));

    if let Some(description) = description {
        image
            .encoder()
            .write_tag(Tag::ImageDescription, description)
            .map_err(|e| encode_err("description", e))?;
    }

    let bytes_per_sample = size_of::<C::Inner>();
    let row_bytes = width as u64 * C::BITS_PER_SAMPLE.len() as u64 * bytes_per_sample as u64;
    let rows_per_strip = (STRIP_TARGET_BYTES / row_bytes.max(1)).clamp(1, u32::MAX as u64) as u32;
    image
        .rows_per_strip(rows_per_strip)
        .map_err(|e| encode_err("rows_per_strip", e))?;

    loop {
        let samples = image.next_strip_sample_count();
        if samples == 0 {
            break;
        }
        let mut bytes = vec![0u8; samples as usize * bytes_per_sample];
        scratch.read_exact(&mut bytes)?;
        let strip = C::Inner::from_bytes(&bytes);
        image.write_strip(&strip).map_err(|e| encode_err("strip", e))?;
    }

    image.finish().map_err(|e| encode_err("finish", e))
}
