use bitvec::{BitArr, array::BitArray, slice::BitSlice};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// One of the sixteen built-in hexadecimal digit glyphs, 4 pixels wide and 5 rows tall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSprite([u8; 5]);

impl FontSprite {
    pub const ZERO: FontSprite = FontSprite([0xF0, 0x90, 0x90, 0x90, 0xF0]);
    pub const ONE: FontSprite = FontSprite([0x20, 0x60, 0x20, 0x20, 0x70]);
    pub const TWO: FontSprite = FontSprite([0xF0, 0x10, 0xF0, 0x80, 0xF0]);
    pub const THREE: FontSprite = FontSprite([0xF0, 0x10, 0xF0, 0x10, 0xF0]);
    pub const FOUR: FontSprite = FontSprite([0x90, 0x90, 0xF0, 0x10, 0x10]);
    pub const FIVE: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x10, 0xF0]);
    pub const SIX: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x90, 0xF0]);
    pub const SEVEN: FontSprite = FontSprite([0xF0, 0x10, 0x20, 0x40, 0x40]);
    pub const EIGHT: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x90, 0xF0]);
    pub const NINE: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x10, 0xF0]);
    pub const A: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x90, 0x90]);
    pub const B: FontSprite = FontSprite([0xE0, 0x90, 0xE0, 0x90, 0xE0]);
    pub const C: FontSprite = FontSprite([0xF0, 0x80, 0x80, 0x80, 0xF0]);
    pub const D: FontSprite = FontSprite([0xE0, 0x90, 0x90, 0x90, 0xE0]);
    pub const E: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x80, 0xF0]);
    pub const F: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x80, 0x80]);

    /// Glyphs in digit order, as they are laid out at the bottom of memory.
    pub const ALL: [FontSprite; 16] = [
        Self::ZERO,
        Self::ONE,
        Self::TWO,
        Self::THREE,
        Self::FOUR,
        Self::FIVE,
        Self::SIX,
        Self::SEVEN,
        Self::EIGHT,
        Self::NINE,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
    ];
    pub const HEIGHT: usize = 5;

    pub fn get_font_sprite(digit: u8) -> Option<FontSprite> {
        Self::ALL.get(usize::from(digit)).copied()
    }

    pub fn as_bytes(&self) -> &[u8; 5] {
        &self.0
    }
}

/// The 64x32 monochrome frame buffer, stored row-major one bit per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayBuffer {
    pixels: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBuffer {
    pub fn new() -> Self {
        DisplayBuffer {
            pixels: BitArray::ZERO,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    pub fn pixel(&self, row: usize, col: usize) -> bool {
        self.pixels[(row % DISPLAY_HEIGHT) * DISPLAY_WIDTH + col % DISPLAY_WIDTH]
    }

    /// Pixels of one row, left to right.
    pub fn row(&self, row: usize) -> &BitSlice {
        let start = (row % DISPLAY_HEIGHT) * DISPLAY_WIDTH;
        &self.pixels[start..start + DISPLAY_WIDTH]
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.count_ones()
    }

    /// XOR-plots `sprite` with its top-left corner at (`x`, `y`). Every column wraps at the
    /// right edge and every row at the bottom edge independently.
    ///
    /// Returns true if any lit pixel was switched off.
    pub fn draw_sprite<I>(&mut self, x: u8, y: u8, sprite: I) -> bool
    where
        I: IntoIterator<Item = u8>,
    {
        let mut collision = false;

        for (row, byte) in sprite.into_iter().enumerate() {
            let pixel_y = (usize::from(y) + row) % DISPLAY_HEIGHT;
            for bit in 0..8 {
                if (byte >> (7 - bit)) & 1 == 0 {
                    continue;
                }
                let pixel_x = (usize::from(x) + bit) % DISPLAY_WIDTH;
                let index = pixel_y * DISPLAY_WIDTH + pixel_x;
                let current_pixel = self.pixels[index];
                if current_pixel {
                    collision = true;
                }
                self.pixels.set(index, !current_pixel);
            }
        }
        collision
    }
}
