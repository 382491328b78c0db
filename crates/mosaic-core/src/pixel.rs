//! Pixel layout description.
//!
//! The assembler never converts pixel data; tiles are copied into the
//! canvas byte for byte. The layout exists so the reader and writer
//! agree on sample width and channel count, and so tiles that do not
//! match the reference image can be rejected up front.

use std::fmt;

/// Sample data type of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit float per channel.
    F32,
}

impl SampleType {
    /// Returns the size of one sample in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 => 2,
            SampleType::F32 => 4,
        }
    }

    /// Returns the bit depth of one sample.
    #[inline]
    pub fn bits(self) -> u8 {
        (self.bytes() * 8) as u8
    }
}

/// Pixel layout shared by every tile and the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// Sample type of each channel.
    pub sample_type: SampleType,
    /// Channels per pixel (1 = grayscale, 3 = RGB, 4 = RGBA).
    pub channels: u16,
}

impl PixelLayout {
    /// Creates a new layout.
    pub fn new(sample_type: SampleType, channels: u16) -> Self {
        Self { sample_type, channels }
    }

    /// Returns the size of one pixel in bytes.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.sample_type.bytes() * self.channels as usize
    }

    /// Returns the number of samples in a `width` x `height` rectangle.
    #[inline]
    pub fn samples(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.channels as usize
    }

    /// Returns the byte length of a `width` x `height` rectangle.
    #[inline]
    pub fn byte_len(&self, width: u32, height: u32) -> usize {
        self.samples(width, height) * self.sample_type.bytes()
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.sample_type {
            SampleType::U8 => "u8",
            SampleType::U16 => "u16",
            SampleType::F32 => "f32",
        };
        write!(f, "{}ch {}", self.channels, name)
    }
}
