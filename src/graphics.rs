//! This module provides the 64x32 one-bit display buffer. The buffer is only
//! ever mutated by the draw instruction's XOR-blit (which reports collisions)
//! and by the clear-screen instruction.

/// The height of the display buffer in pixels.
pub const HEIGHT: usize = 32;
/// The width of the display buffer in pixels.
pub const WIDTH: usize = 64;
/// The total number of pixels in the display buffer.
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// The [`Buffer`] struct holds the display surface as a flat array of 0/1
/// pixel values, row-major. Sprite rows are drawn a byte (8 pixels) at a time
/// with wrapping coordinates; drawing never clips at the edges.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Clone, Copy)]
pub struct Buffer {
    #[cfg_attr(feature = "persistence", serde(with = "serde_big_array::BigArray"))]
    pixels: [u8; PIXEL_COUNT],
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            pixels: [0; PIXEL_COUNT],
        }
    }
}

impl Buffer {
    /// Creates a new, blank [`Buffer`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// XOR-draws one sprite row (8 pixels, MSB leftmost) at the given
    /// position. Both coordinates wrap around the display edges. Returns
    /// whether any previously-set pixel was turned off.
    pub fn draw_byte(&mut self, x: usize, y: usize, data: u8) -> bool {
        let row = y % HEIGHT;
        let bitmasks: [u8; 8] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01];

        let mut collision = false;

        for (b, &mask) in bitmasks.iter().enumerate() {
            if data & mask == 0 {
                continue;
            }
            let col = (x + b) % WIDTH;
            let pos = row * WIDTH + col;
            if self.pixels[pos] == 1 {
                collision = true;
            }
            self.pixels[pos] ^= 1;
        }
        collision
    }

    /// Returns whether the pixel at the given (unwrapped) coordinates is set.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % HEIGHT) * WIDTH + (x % WIDTH)] == 1
    }

    /// Returns the display surface as a flat row-major array of 0/1 values.
    #[must_use]
    pub fn pixels(&self) -> &[u8; PIXEL_COUNT] {
        &self.pixels
    }

    /// Clears the display buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.pixels = [0; PIXEL_COUNT];
    }
}
