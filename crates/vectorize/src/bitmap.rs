//! Word-packed one-bit-per-pixel bitmaps, the input format of the tracer.
//!
//! Layout: rows of `stride` words, most significant bit first, padding bits
//! at the end of each row always clear. Row `j` of the bitmap holds raster
//! row `height - 1 - j`, so `y` grows upward as the tracer expects. A set bit
//! means the raster pixel was white (non-zero).

use image::GrayImage;

use crate::{
    algorithms::raster::{BLACK, WHITE},
    error::Result,
    types::FrameView,
};

pub type Word = u64;

pub const WORD_BITS: usize = Word::BITS as usize;

const HIGH_BIT: Word = 1 << (WORD_BITS - 1);

#[inline]
fn mask(x: usize) -> Word {
    HIGH_BIT >> (x % WORD_BITS)
}

/// Exclusively owned packed bitmap.
///
/// The word buffer is freed by [`PackedBitmap::release`] or on drop,
/// whichever comes first.
#[derive(Debug, Clone)]
pub struct PackedBitmap {
    width: usize,
    height: usize,
    stride: usize,
    words: Vec<Word>,
    released: bool,
}

impl PackedBitmap {
    /// All-clear bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        let stride = width.div_ceil(WORD_BITS);
        Self {
            width,
            height,
            stride,
            words: vec![0; stride * height],
            released: false,
        }
    }

    /// Pack a binary raster, flipping it vertically.
    pub fn pack(raster: &FrameView<'_>) -> Result<Self> {
        raster.require_single_channel()?;

        let height = raster.height() as usize;
        let mut bitmap = Self::new(raster.width() as usize, height);

        for (y, row) in raster.rows().enumerate() {
            let start = (height - 1 - y) * bitmap.stride;
            let span = &mut bitmap.words[start..start + bitmap.stride];
            for (x, &value) in row.iter().enumerate() {
                if value != BLACK {
                    span[x / WORD_BITS] |= mask(x);
                }
            }
        }

        Ok(bitmap)
    }

    /// Inverse of [`PackedBitmap::pack`]: set bits become white pixels.
    pub fn unpack(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let on = self.get(x as i64, (self.height - 1 - y as usize) as i64);
            image::Luma([if on { WHITE } else { BLACK }])
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Words per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Words of row `y`; empty when out of range or released.
    pub fn row(&self, y: usize) -> &[Word] {
        self.words
            .get(y * self.stride..(y + 1) * self.stride)
            .unwrap_or(&[])
    }

    /// True once the word buffer has been freed.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// True when the buffer holds exactly `stride * height` words.
    pub fn is_consistent(&self) -> bool {
        !self.released && self.words.len() == self.stride * self.height
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Bit at `(x, y)`; anything outside the bitmap (or a released one) reads as clear.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        self.words
            .get(y * self.stride + x / WORD_BITS)
            .is_some_and(|word| word & mask(x) != 0)
    }

    /// Set or clear the bit at `(x, y)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: i64, y: i64, on: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if let Some(word) = self.words.get_mut(y * self.stride + x / WORD_BITS) {
            if on {
                *word |= mask(x);
            } else {
                *word &= !mask(x);
            }
        }
    }

    /// Invert the bits of row `y` in columns `from..to`.
    pub fn toggle_span(&mut self, y: i64, from: i64, to: i64) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        let from = from.max(0) as usize;
        let to = (to.max(0) as usize).min(self.width);
        let start = y as usize * self.stride;
        for x in from..to {
            if let Some(word) = self.words.get_mut(start + x / WORD_BITS) {
                *word ^= mask(x);
            }
        }
    }

    /// Free the word buffer. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.words = Vec::new();
        self.released = true;

        #[cfg(test)]
        crate::testing::record_release("bitmap");

        true
    }
}

impl Drop for PackedBitmap {
    fn drop(&mut self) {
        self.release();
    }
}
