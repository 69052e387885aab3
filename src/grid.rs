//! Packed module storage for symbols under construction and finished symbols.

use crate::bit_buffer::get_bit;

/// A square grid of modules (false = light, true = dark), packed bitwise into bytes
/// in row-major order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct ModuleGrid {
    size: u8,
    bits: Vec<u8>,
}

impl ModuleGrid {
    /// An all-light grid of `size` x `size` modules.
    pub fn new(size: u8) -> Self {
        let count = usize::from(size) * usize::from(size);
        Self {
            size,
            bits: vec![0u8; count.div_ceil(8)],
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn get(&self, x: u8, y: u8) -> bool {
        let (byteindex, bitindex) = self.index(x, y);
        get_bit(self.bits[byteindex].into(), bitindex)
    }

    pub fn set(&mut self, x: u8, y: u8, isdark: bool) {
        let (byteindex, bitindex) = self.index(x, y);
        if isdark {
            self.bits[byteindex] |= 1u8 << bitindex;
        } else {
            self.bits[byteindex] &= !(1u8 << bitindex);
        }
    }

    /// Flips the module at (x, y).
    pub fn toggle(&mut self, x: u8, y: u8) {
        let (byteindex, bitindex) = self.index(x, y);
        self.bits[byteindex] ^= 1u8 << bitindex;
    }

    /// Number of dark modules. Padding bits past the last module are always 0.
    pub fn dark_count(&self) -> u32 {
        self.bits.iter().map(|x| x.count_ones()).sum()
    }

    fn index(&self, x: u8, y: u8) -> (usize, u8) {
        let range = 0..self.size;
        assert!(range.contains(&x) && range.contains(&y), "Module coordinates out of range");
        let index = usize::from(y) * usize::from(self.size) + usize::from(x);
        (index >> 3, (index & 7) as u8)
    }
}
