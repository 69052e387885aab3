//! Bit-level buffer used to assemble segment data and the final codewords.

/// An appendable sequence of bits, packed big-endian into bytes.
///
/// Bit `i` lives in byte `i / 8` at position `7 - i % 8`, so the packed bytes
/// are exactly the codewords a QR code expects.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for at least `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(bits.div_ceil(8)),
            length: 0,
        }
    }

    /// Number of bits in the buffer.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if no bits have been appended.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.length, "Bit index out of range");
        get_bit(self.data[index >> 3].into(), 7 - (index & 7) as u8)
    }

    /// Appends the `len` low-order bits of `val`, most significant first.
    ///
    /// Requires `len <= 31` and `val < 2^len`.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0, "Value out of range");
        for i in (0..len).rev() {
            self.push(((val >> i) & 1) != 0);
        }
    }

    /// Appends every bit of `other`.
    pub fn append_buffer(&mut self, other: &BitBuffer) {
        if self.length % 8 == 0 {
            self.data.truncate(self.length / 8);
            self.data.extend_from_slice(&other.data);
            self.length += other.length;
            return;
        }
        for i in 0..other.length {
            self.push(other.get(i));
        }
    }

    /// Copies `len` bits starting at `start` into a new buffer.
    ///
    /// # Panics
    ///
    /// Panics if the range reaches past the end of the buffer.
    pub fn extract(&self, start: usize, len: usize) -> BitBuffer {
        assert!(len <= self.length && start <= self.length - len, "Bit range out of bounds");
        let mut result = BitBuffer::with_capacity(len);
        for i in start..start + len {
            result.push(self.get(i));
        }
        result
    }

    /// The packed bytes; a trailing partial byte is zero-padded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn push(&mut self, bit: bool) {
        let shift = 7 - (self.length & 7) as u8;
        if shift == 7 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << shift;
        }
        self.length += 1;
    }
}

pub(crate) fn get_bit(x: u32, i: u8) -> bool {
    ((x >> i) & 1) != 0
}
