use bitvec::vec::BitVec;

use crate::error::Chip8Result;
use crate::state::{Address, Memory};

/// Sprites are always one byte wide.
pub const SPRITE_WIDTH: usize = 8;

/// Axis-aligned region of the buffer, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// What changed since the last presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Damage {
    /// The screen was cleared; redraw everything.
    pub cleared: bool,
    /// Regions touched by sprite draws.
    pub rects: Vec<Rect>,
    /// Rows touched by any composite, in ascending order.
    pub rows: Vec<usize>,
}

/// Monochrome frame buffer with XOR sprite composition.
pub struct DisplayBuffer {
    pixels: BitVec,
    width: usize,
    height: usize,
    wrap: bool,
    dirty_rows: BitVec,
    rects: Vec<Rect>,
    cleared: bool,
}

impl DisplayBuffer {
    pub fn new(width: usize, height: usize, wrap: bool) -> Self {
        DisplayBuffer {
            pixels: BitVec::repeat(false, width * height),
            width,
            height,
            wrap,
            dirty_rows: BitVec::repeat(false, height),
            rects: Vec::new(),
            cleared: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// Pixels of row `y`, left to right.
    pub fn row(&self, y: usize) -> impl Iterator<Item = bool> + '_ {
        let start = y * self.width;
        self.pixels[start..start + self.width].iter().by_vals()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
        self.dirty_rows.fill(true);
        self.rects.clear();
        self.cleared = true;
    }

    /// XORs one sprite row onto the buffer with its left edge at `(x, y)`.
    ///
    /// Bits past the right edge are dropped and a row below the bottom edge
    /// contributes nothing, unless the buffer wraps. Returns whether any set
    /// pixel was turned off.
    pub fn composite(&mut self, x: usize, y: usize, sprite_byte: u8) -> bool {
        let y = if self.wrap { y % self.height } else { y };
        if y >= self.height {
            return false;
        }

        let mut collision = false;
        for bit in 0..SPRITE_WIDTH {
            if (sprite_byte >> (7 - bit)) & 1 == 0 {
                continue;
            }

            let mut pixel_x = x + bit;
            if self.wrap {
                pixel_x %= self.width;
            } else if pixel_x >= self.width {
                continue;
            }

            let index = y * self.width + pixel_x;
            let current_pixel = self.pixels[index];
            if current_pixel {
                collision = true;
            }
            self.pixels.set(index, !current_pixel);
        }

        self.dirty_rows.set(y, true);
        collision
    }

    /// Draws an `n`-row sprite read from memory at `index`.
    ///
    /// The anchor wraps onto the screen; the body clips (or wraps, if
    /// configured). Returns whether any row collided.
    pub fn draw_sprite(
        &mut self,
        vx: u8,
        vy: u8,
        n: u8,
        memory: &Memory,
        index: Address,
    ) -> Chip8Result<bool> {
        let sprite = memory.slice(index, usize::from(n))?;
        let x = usize::from(vx) % self.width;
        let y = usize::from(vy) % self.height;

        let mut collision = false;
        for (row, &byte) in sprite.iter().enumerate() {
            collision |= self.composite(x, y + row, byte);
        }

        if !sprite.is_empty() {
            self.record_rects(x, y, sprite.len());
        }
        Ok(collision)
    }

    /// Splits the drawn area at the screen edges into visible rectangles.
    fn record_rects(&mut self, x: usize, y: usize, rows: usize) {
        let columns = spans(x, SPRITE_WIDTH, self.width, self.wrap);
        let lines = spans(y, rows, self.height, self.wrap);
        for &(col, width) in &columns {
            for &(line, height) in &lines {
                self.rects.push(Rect {
                    x: col,
                    y: line,
                    width,
                    height,
                });
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.cleared || self.dirty_rows.any()
    }

    /// Hands out the damage accumulated since the last call and resets it.
    pub fn take_damage(&mut self) -> Damage {
        let damage = Damage {
            cleared: self.cleared,
            rects: std::mem::take(&mut self.rects),
            rows: self.dirty_rows.iter_ones().collect(),
        };
        self.dirty_rows.fill(false);
        self.cleared = false;
        damage
    }
}

/// Visible `(start, length)` runs of `[start, start + len)` on an axis of
/// `size` pixels.
fn spans(start: usize, len: usize, size: usize, wrap: bool) -> Vec<(usize, usize)> {
    let visible = len.min(size - start);
    let mut runs = vec![(start, visible)];
    if wrap && visible < len {
        runs.push((0, (len - visible).min(start)));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(sprite: &[u8]) -> Memory {
        let mut memory = Memory::new();
        memory.load_rom(sprite).unwrap();
        memory
    }

    fn lit(display: &DisplayBuffer) -> usize {
        (0..display.height())
            .map(|y| display.row(y).filter(|&p| p).count())
            .sum()
    }

    #[test]
    fn test_composite_sets_and_collides() {
        let mut display = DisplayBuffer::new(64, 32, false);
        assert!(!display.composite(0, 0, 0b1010_0000));
        assert!(display.pixel(0, 0));
        assert!(!display.pixel(1, 0));
        assert!(display.pixel(2, 0));

        assert!(display.composite(0, 0, 0b1000_0000));
        assert!(!display.pixel(0, 0));
        assert!(display.pixel(2, 0));
    }

    #[test]
    fn test_composite_clips_horizontally() {
        let mut display = DisplayBuffer::new(64, 32, false);
        display.composite(60, 3, 0xFF);
        assert_eq!(display.row(3).filter(|&p| p).count(), 4);
        assert!(!display.pixel(0, 3));
    }

    #[test]
    fn test_composite_below_screen_is_noop() {
        let mut display = DisplayBuffer::new(64, 32, false);
        assert!(!display.composite(0, 32, 0xFF));
        assert!(!display.is_dirty());
        assert_eq!(lit(&display), 0);
    }

    #[test]
    fn test_draw_twice_restores_buffer() {
        let memory = memory_with(&[0xF0, 0x90, 0xF0]);
        let mut display = DisplayBuffer::new(64, 32, false);

        assert!(!display.draw_sprite(10, 10, 3, &memory, 0x200).unwrap());
        assert_eq!(lit(&display), 10);

        assert!(display.draw_sprite(10, 10, 3, &memory, 0x200).unwrap());
        assert_eq!(lit(&display), 0);
    }

    #[test]
    fn test_anchor_wraps_body_clips() {
        let memory = memory_with(&[0xFF, 0xFF]);
        let mut display = DisplayBuffer::new(64, 32, false);

        // Anchor (64 + 60, 32 + 31) wraps to (60, 31).
        display.draw_sprite(124, 63, 2, &memory, 0x200).unwrap();
        assert_eq!(lit(&display), 4);
        assert!(display.pixel(63, 31));
        assert!(!display.pixel(60, 0));

        let damage = display.take_damage();
        assert_eq!(
            damage.rects,
            vec![Rect {
                x: 60,
                y: 31,
                width: 4,
                height: 1
            }]
        );
        assert_eq!(damage.rows, vec![31]);
    }

    #[test]
    fn test_wrapping_sprites() {
        let memory = memory_with(&[0xFF, 0xFF]);
        let mut display = DisplayBuffer::new(64, 32, true);

        display.draw_sprite(60, 31, 2, &memory, 0x200).unwrap();
        assert_eq!(lit(&display), 16);
        assert!(display.pixel(3, 0));
        assert!(display.pixel(60, 31));

        let damage = display.take_damage();
        assert_eq!(damage.rects.len(), 4);
        assert_eq!(damage.rows, vec![0, 31]);
    }

    #[test]
    fn test_sprite_out_of_memory() {
        let memory = Memory::new();
        let mut display = DisplayBuffer::new(64, 32, false);
        assert!(display.draw_sprite(0, 0, 5, &memory, 0xFFE).is_err());
    }

    #[test]
    fn test_clear_marks_everything_dirty() {
        let mut display = DisplayBuffer::new(64, 32, false);
        display.composite(0, 0, 0xFF);
        display.take_damage();
        assert!(!display.is_dirty());

        display.clear();
        assert_eq!(lit(&display), 0);
        let damage = display.take_damage();
        assert!(damage.cleared);
        assert_eq!(damage.rows.len(), 32);
        assert!(!display.is_dirty());
    }
}
