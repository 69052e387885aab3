//! Reed-Solomon error correction over GF(2^8).
//!
//! The field uses the reducing polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D) and
//! the generator polynomial is the product of (x - 2^i) for i in 0..degree.

/// Low byte of the reducing polynomial 0x11D.
const GF_REDUCTION: u8 = 0x1d;

/// Maximum number of ECC codewords per block in any QR code version.
pub const MAX_DEGREE: usize = 30;

/// Computes Reed-Solomon ECC remainders for data blocks of one QR code.
pub struct ReedSolomonGenerator {
    divisor: [u8; MAX_DEGREE],
    degree: usize,
}

impl ReedSolomonGenerator {
    /// Builds the generator polynomial of the given degree.
    ///
    /// # Panics
    ///
    /// Panics if `degree` is outside `1..=30`.
    pub fn new(degree: usize) -> Self {
        assert!((1..=MAX_DEGREE).contains(&degree), "Degree out of range");
        let mut result = Self {
            divisor: [0u8; MAX_DEGREE],
            degree,
        };
        // Coefficients are stored highest to lowest power, excluding the leading term which is always 1.
        let divisor: &mut [u8] = &mut result.divisor[..degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = multiply(root, 0x02);
        }
        result
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The generator coefficients, highest power first, without the leading 1.
    pub fn divisor(&self) -> &[u8] {
        &self.divisor[..self.degree]
    }

    /// Writes `data(x) * x^degree mod generator(x)` into `result`.
    pub fn compute_remainder(&self, data: &[u8], result: &mut [u8]) {
        assert_eq!(result.len(), self.degree);
        result.fill(0);
        for b in data {
            let factor: u8 = b ^ result[0];
            result.copy_within(1.., 0);
            result[self.degree - 1] = 0;
            for (x, &y) in result.iter_mut().zip(self.divisor()) {
                *x ^= multiply(y, factor);
            }
        }
    }

    /// Returns the ECC remainder of `data` as a new vector.
    pub fn get_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree];
        self.compute_remainder(data, &mut result);
        result
    }
}

/// Multiplies two field elements with shift-and-add, reducing by 0x11D.
pub fn multiply(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * GF_REDUCTION);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_identities() {
        for x in 0..=255u8 {
            assert_eq!(multiply(x, 0), 0);
            assert_eq!(multiply(x, 1), x);
            assert_eq!(multiply(x, 2), multiply(2, x));
        }
        assert_eq!(multiply(0x80, 0x02), 0x1d);
        assert_eq!(multiply(0x53, 0xca), 0x8f);
    }

    #[test]
    fn test_generator_degree_2() {
        // (x - 1)(x - 2) = x^2 + 3x + 2
        let rs = ReedSolomonGenerator::new(2);
        assert_eq!(rs.divisor(), &[3, 2]);
    }

    #[test]
    fn test_generator_degree_7() {
        // Generator for version 1-L, published in ISO/IEC 18004 Annex A as exponents
        // 87, 229, 146, 149, 238, 102, 21.
        let rs = ReedSolomonGenerator::new(7);
        assert_eq!(rs.divisor(), &[127, 122, 154, 164, 11, 68, 117]);
    }

    #[test]
    fn test_remainder_of_zero_data() {
        let rs = ReedSolomonGenerator::new(10);
        assert_eq!(rs.get_remainder(&[0u8; 16]), vec![0u8; 10]);
    }

    #[test]
    fn test_remainder_known_answer() {
        // "01234567" at version 1-M, from ISO/IEC 18004 Annex I.
        let rs = ReedSolomonGenerator::new(10);
        let data = [
            0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11,
        ];
        assert_eq!(
            rs.get_remainder(&data),
            vec![0xa5, 0x24, 0xd4, 0xc1, 0xed, 0x36, 0xc7, 0x87, 0x2c, 0x55]
        );
    }

    #[test]
    fn test_codeword_vanishes_at_generator_roots() {
        let rs = ReedSolomonGenerator::new(10);
        let data = [0x40, 0xd2, 0x75, 0x47, 0x76, 0x17, 0x32, 0x06, 0x27, 0x26, 0x96, 0xc6];
        let mut codeword = data.to_vec();
        codeword.extend_from_slice(&rs.get_remainder(&data));
        let mut root = 1u8;
        for _ in 0..10 {
            let acc = codeword.iter().fold(0u8, |acc, &c| multiply(acc, root) ^ c);
            assert_eq!(acc, 0);
            root = multiply(root, 2);
        }
    }

    #[test]
    #[should_panic(expected = "Degree out of range")]
    fn test_degree_zero_rejected() {
        let _ = ReedSolomonGenerator::new(0);
    }
}
