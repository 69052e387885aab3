//! Data segments and their character modes.

use crate::bit_buffer::BitBuffer;
use crate::error::QrError;
use crate::qrcode::Version;

/// The 45 characters encodable in alphanumeric mode, in code value order.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// A segment of data in a QR code.
///
/// Supports numeric, alphanumeric, byte, Kanji, ECI and structured append modes.
/// Segments are immutable and created using factory functions like [`QrSegment::make_numeric`],
/// [`QrSegment::make_alphanumeric`] or [`QrSegment::make_bytes`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: BitBuffer,
}

impl QrSegment {
    /// Creates a segment for binary data in byte mode.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer::with_capacity(data.len() * 8);
        for &b in data {
            bb.append_bits(b.into(), 8);
        }
        QrSegment::new(QrSegmentMode::Byte, data.len(), bb)
    }

    /// Creates a segment for a string of decimal digits in numeric mode.
    ///
    /// Three digits pack into 10 bits; a trailing group of one or two digits
    /// takes 4 or 7 bits.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if `text` contains a non-digit.
    pub fn make_numeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer::with_capacity(text.len() * 10 / 3 + 7);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            if !b.is_ascii_digit() {
                return Err(QrError::invalid("String contains non-numeric characters"));
            }
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Ok(QrSegment::new(QrSegmentMode::Numeric, text.len(), bb))
    }

    /// Creates a segment for alphanumeric text.
    ///
    /// Allowed characters: 0–9, A–Z (uppercase), space, `$`, `%`, `*`, `+`, `-`, `.`, `/`, `:`.
    /// Pairs pack into 11 bits as `first * 45 + second`; an odd trailing character takes 6 bits.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if `text` contains any other character.
    pub fn make_alphanumeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer::with_capacity(text.len() * 11 / 2 + 6);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        let mut numchars: usize = 0;
        for c in text.chars() {
            let i = alphanumeric_value(c).ok_or_else(|| {
                QrError::invalid("String contains unencodable characters in alphanumeric mode")
            })?;
            accumdata = accumdata * 45 + i;
            accumcount += 1;
            numchars += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        Ok(QrSegment::new(QrSegmentMode::Alphanumeric, numchars, bb))
    }

    /// Creates a Kanji mode segment from Shift JIS encoded text.
    ///
    /// Every character is a double byte in 0x8140–0x9FFC or 0xE040–0xEBBF. After
    /// subtracting 0x8140 or 0xC140 respectively, the high byte times 0xC0 plus
    /// the low byte is stored in 13 bits.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] for an odd byte count or a double byte
    /// outside the Kanji ranges.
    pub fn make_kanji(sjis: &[u8]) -> Result<Self, QrError> {
        if sjis.len() % 2 != 0 {
            return Err(QrError::invalid("Shift JIS data has an odd number of bytes"));
        }
        let mut bb = BitBuffer::with_capacity(sjis.len() / 2 * 13);
        for pair in sjis.chunks_exact(2) {
            let code = u16::from_be_bytes([pair[0], pair[1]]);
            let offset = match code {
                0x8140..=0x9ffc => 0x8140,
                0xe040..=0xebbf => 0xc140,
                _ => return Err(QrError::invalid(format!("Character 0x{code:04X} is not encodable in Kanji mode"))),
            };
            if !(0x40..=0xfc).contains(&pair[1]) || pair[1] == 0x7f {
                return Err(QrError::invalid(format!("Character 0x{code:04X} is not encodable in Kanji mode")));
            }
            let c = code - offset;
            bb.append_bits(u32::from(c >> 8) * 0xc0 + u32::from(c & 0xff), 13);
        }
        Ok(QrSegment::new(QrSegmentMode::Kanji, sjis.len() / 2, bb))
    }

    /// Creates a segment representing an Extended Channel Interpretation
    /// (ECI) designator with the given assignment value.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if `assignval` is 1,000,000 or more.
    pub fn make_eci(assignval: u32) -> Result<Self, QrError> {
        let mut bb = BitBuffer::with_capacity(24);
        if assignval < 1 << 7 {
            bb.append_bits(assignval, 8);
        } else if assignval < 1 << 14 {
            bb.append_bits(0b10, 2);
            bb.append_bits(assignval, 14);
        } else if assignval < 1_000_000 {
            bb.append_bits(0b110, 3);
            bb.append_bits(assignval, 21);
        } else {
            return Err(QrError::invalid("ECI assignment value out of range"));
        }
        Ok(QrSegment::new(QrSegmentMode::Eci, 0, bb))
    }

    /// Creates the structured append header placed in front of the data of
    /// symbol `index` out of `count`.
    ///
    /// `parity` is the XOR of every byte of the complete, unsplit payload.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] unless `1 <= count <= 16` and `index < count`.
    pub fn make_structured_append_header(index: usize, count: usize, parity: u8) -> Result<Self, QrError> {
        if !(1..=MAX_STRUCTURED_APPEND_SYMBOLS).contains(&count) {
            return Err(QrError::invalid(format!("Symbol count {count} out of range")));
        }
        if index >= count {
            return Err(QrError::invalid(format!("Symbol index {index} out of range")));
        }
        let mut bb = BitBuffer::with_capacity(16);
        bb.append_bits(index as u32, 4);
        bb.append_bits((count - 1) as u32, 4);
        bb.append_bits(parity.into(), 8);
        Ok(QrSegment::new(QrSegmentMode::StructuredAppend, 0, bb))
    }

    /// Returns a list of zero or one segments for the given text.
    ///
    /// The whole text goes into the most compact single mode it fits:
    /// numeric, then alphanumeric, then byte (UTF-8).
    pub fn make_segments(text: &str) -> Vec<Self> {
        if text.is_empty() {
            return Vec::new();
        }
        if let Ok(seg) = QrSegment::make_numeric(text) {
            vec![seg]
        } else if let Ok(seg) = QrSegment::make_alphanumeric(text) {
            vec![seg]
        } else {
            vec![QrSegment::make_bytes(text.as_bytes())]
        }
    }

    /// Creates a segment from raw parts.
    ///
    /// `numchars` counts characters (bytes, digits, Kanji pairs) rather than bits;
    /// `data` holds the encoded payload without the mode and count header.
    pub fn new(mode: QrSegmentMode, numchars: usize, data: BitBuffer) -> Self {
        Self { mode, numchars, data }
    }

    /// Returns the mode of this segment.
    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    /// Returns the character count written into the count field.
    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Returns the encoded payload bits.
    pub fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Number of bits needed to encode the segments at the given version, headers included.
    ///
    /// Returns `None` if a character count overflows its count field, or the sum overflows.
    pub fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if let Some(limit) = 1usize.checked_shl(ccbits.into()) {
                if seg.numchars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    /// Tests whether `text` can be encoded in numeric mode (ASCII digits only).
    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    /// Tests whether `text` can be encoded in alphanumeric mode: digits, uppercase
    /// letters, space and `$%*+-./:`.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

/// Protocol limit on the number of symbols in one structured append sequence.
pub const MAX_STRUCTURED_APPEND_SYMBOLS: usize = 16;

pub(crate) fn alphanumeric_value(c: char) -> Option<u32> {
    ALPHANUMERIC_CHARSET.find(c).map(|i| i as u32)
}

/// Describes how a segment's data bits are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
    StructuredAppend,
}

impl QrSegmentMode {
    /// The 4-bit mode indicator.
    pub fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            StructuredAppend => 0x3,
            Byte => 0x4,
            Eci => 0x7,
            Kanji => 0x8,
        }
    }

    /// Width of the character count field for versions 1–9, 10–26 and 27–40.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
            Eci | StructuredAppend => [0, 0, 0],
        })[usize::from((ver.value() + 7) / 17)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_is_numeric() {
        assert!(QrSegment::is_numeric("1234567890"));
        assert!(QrSegment::is_numeric(""));
        assert!(!QrSegment::is_numeric("1234abc"));
        assert!(!QrSegment::is_numeric("123\n345"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(QrSegment::is_alphanumeric("HELLO WORLD"));
        assert!(QrSegment::is_alphanumeric("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./"));
        assert!(!QrSegment::is_alphanumeric("Hello World"));
        for bad in [",", "^", "(", "a"] {
            assert!(!QrSegment::is_alphanumeric(bad));
        }
    }

    #[test]
    fn test_numeric_packing() {
        let seg = QrSegment::make_numeric("83930").unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Numeric);
        assert_eq!(seg.num_chars(), 5);
        assert_eq!(seg.data().len(), 17);
        assert_eq!(seg.data().as_bytes(), &[0xd1, 0xcf, 0x00]);
    }

    #[test]
    fn test_numeric_remainders() {
        assert_eq!(QrSegment::make_numeric("1").unwrap().data().len(), 4);
        assert_eq!(QrSegment::make_numeric("12").unwrap().data().len(), 7);
        assert_eq!(QrSegment::make_numeric("123").unwrap().data().len(), 10);
        assert_eq!(QrSegment::make_numeric("").unwrap().data().len(), 0);
    }

    #[test]
    fn test_numeric_rejects_letters() {
        assert!(matches!(QrSegment::make_numeric("abc"), Err(QrError::InvalidArgument(_))));
    }

    #[test]
    fn test_alphanumeric_rejects_lowercase() {
        assert!(matches!(QrSegment::make_alphanumeric("abc,def"), Err(QrError::InvalidArgument(_))));
    }

    #[test]
    fn test_alphanumeric_pair_value() {
        // "AC" = 10 * 45 + 12 = 462; "-" = 41
        let seg = QrSegment::make_alphanumeric("AC-").unwrap();
        assert_eq!(seg.data().len(), 17);
        assert_eq!(seg.data().extract(0, 11).as_bytes(), &[(462u32 >> 3) as u8, ((462u32 & 7) << 5) as u8]);
        assert_eq!(seg.data().extract(11, 6).as_bytes(), &[41 << 2]);
    }

    #[test]
    fn test_bytes_verbatim() {
        let seg = QrSegment::make_bytes("😐ö€".as_bytes());
        assert_eq!(seg.mode(), QrSegmentMode::Byte);
        assert_eq!(seg.num_chars(), 9);
        assert_eq!(seg.data().len(), 72);
        assert_eq!(seg.data().as_bytes(), "😐ö€".as_bytes());
    }

    #[test]
    fn test_make_segments_picks_compact_mode() {
        assert!(QrSegment::make_segments("").is_empty());
        let segs = QrSegment::make_segments("83930");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mode(), QrSegmentMode::Numeric);
        let segs = QrSegment::make_segments("HELLO WORLD");
        assert_eq!(segs[0].mode(), QrSegmentMode::Alphanumeric);
        let segs = QrSegment::make_segments("Hello, world!");
        assert_eq!(segs[0].mode(), QrSegmentMode::Byte);
        assert_eq!(segs[0].num_chars(), 13);
    }

    #[test]
    fn test_kanji_packing() {
        // 0x935F -> 0x121F -> 0x12 * 0xC0 + 0x1F = 0xD9F
        // 0xE4AA -> 0x236A -> 0x23 * 0xC0 + 0x6A = 0x1AAA
        let seg = QrSegment::make_kanji(&[0x93, 0x5f, 0xe4, 0xaa]).unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Kanji);
        assert_eq!(seg.num_chars(), 2);
        assert_eq!(seg.data().len(), 26);
        let mut expected = BitBuffer::new();
        expected.append_bits(0x0d9f, 13);
        expected.append_bits(0x1aaa, 13);
        assert_eq!(seg.data(), &expected);
    }

    #[test]
    fn test_kanji_rejects_unmappable() {
        assert!(matches!(QrSegment::make_kanji(&[0x41, 0x42]), Err(QrError::InvalidArgument(_))));
        assert!(matches!(QrSegment::make_kanji(&[0xa0, 0x40]), Err(QrError::InvalidArgument(_))));
        assert!(matches!(QrSegment::make_kanji(&[0x93, 0x7f]), Err(QrError::InvalidArgument(_))));
        assert!(matches!(QrSegment::make_kanji(&[0x93]), Err(QrError::InvalidArgument(_))));
    }

    #[test]
    fn test_eci_designator_widths() {
        assert_eq!(QrSegment::make_eci(26).unwrap().data().len(), 8);
        assert_eq!(QrSegment::make_eci(1000).unwrap().data().len(), 16);
        assert_eq!(QrSegment::make_eci(999_999).unwrap().data().len(), 24);
        assert!(QrSegment::make_eci(1_000_000).is_err());
    }

    #[test]
    fn test_structured_append_header() {
        let seg = QrSegment::make_structured_append_header(2, 5, 0xa7).unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::StructuredAppend);
        assert_eq!(seg.num_chars(), 0);
        assert_eq!(seg.data().as_bytes(), &[0x24, 0xa7]);
        assert!(QrSegment::make_structured_append_header(0, 17, 0).is_err());
        assert!(QrSegment::make_structured_append_header(3, 3, 0).is_err());
        assert!(QrSegment::make_structured_append_header(0, 0, 0).is_err());
    }

    #[test]
    fn test_count_bits_by_version_tier() {
        let mode = QrSegmentMode::Byte;
        assert_eq!(mode.num_char_count_bits(v(9)), 8);
        assert_eq!(mode.num_char_count_bits(v(10)), 16);
        assert_eq!(QrSegmentMode::Numeric.num_char_count_bits(v(26)), 12);
        assert_eq!(QrSegmentMode::Numeric.num_char_count_bits(v(27)), 14);
        assert_eq!(QrSegmentMode::Kanji.num_char_count_bits(v(40)), 12);
    }

    #[test]
    fn test_total_bits() {
        let segs = vec![
            QrSegment::make_numeric("83930").unwrap(),
            QrSegment::make_structured_append_header(0, 2, 0).unwrap(),
        ];
        assert_eq!(QrSegment::get_total_bits(&segs, v(1)), Some(4 + 10 + 17 + 4 + 16));
        assert_eq!(QrSegment::get_total_bits(&[], v(1)), Some(0));
    }

    #[test]
    fn test_total_bits_count_overflow() {
        let segs = [QrSegment::make_bytes(&[0u8; 256])];
        assert_eq!(QrSegment::get_total_bits(&segs, v(9)), None);
        assert_eq!(QrSegment::get_total_bits(&segs, v(10)), Some(4 + 16 + 2048));
    }
}
