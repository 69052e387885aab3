//! QR code symbol construction.
//!
//! This module holds the QR Code Model 2 encoder proper: version and error
//! correction selection, bitstream assembly, Reed-Solomon interleaving,
//! function pattern drawing, zigzag data placement and masking.

use log::{debug, trace};

use crate::bit_buffer::{get_bit, BitBuffer};
use crate::error::{DataTooLong, QrError};
use crate::grid::ModuleGrid;
use crate::penalty::penalty_score;
use crate::planner;
use crate::reed_solomon::ReedSolomonGenerator;
use crate::segment::QrSegment;

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// Instances are immutable after creation and own their module grid.
///
/// # Creation
///
/// - High-level: [`QrCode::encode_text`] or [`QrCode::encode_binary`].
/// - Mid-level: [`QrCode::encode_segments`], [`QrCode::encode_segments_with`] or
///   [`QrCode::encode_segments_to_codewords`] followed by [`QrCode::encode_codewords`].
/// - Multiple symbols: [`QrCode::encode_text_in_multiple_symbols`].
///
/// # Example
///
/// ```rust
/// use qrsmith::{QrCode, QrCodeEcc};
///
/// let qr = QrCode::encode_text("Hello, World!", QrCodeEcc::Low).unwrap();
/// println!("Version: {}", qr.version().value());
/// assert_eq!(qr.size(), 21);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,
    modules: ModuleGrid,
}

impl QrCode {
    /// Encodes a Unicode text string at the given minimum error correction level.
    ///
    /// The text goes into a single segment of the most compact mode it fits.
    /// The smallest version is chosen, the mask is automatic and the error
    /// correction level may be boosted if that does not increase the version.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::DataTooLong`] if the text does not fit version 40.
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self, QrError> {
        let segs = QrSegment::make_segments(text);
        QrCode::encode_segments(&segs, ecl, Version::MIN, Version::MAX, None, true)
    }

    /// Encodes binary data in byte mode at the given minimum error correction level.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::DataTooLong`] if the data does not fit version 40.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self, QrError> {
        let segs = [QrSegment::make_bytes(data)];
        QrCode::encode_segments(&segs, ecl, Version::MIN, Version::MAX, None, true)
    }

    /// Encodes the given segments with full control over the encoding parameters.
    ///
    /// The smallest version within `minversion..=maxversion` that can hold the data
    /// is chosen. If `boostecl` is `true`, the ECC level may be higher than `ecl`
    /// if that can be done without increasing the version. `mask` is `None` for
    /// automatic selection or a value from 0 to 7.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if `minversion > maxversion` and
    /// [`QrError::DataTooLong`] if the segments do not fit any version in range.
    pub fn encode_segments(
        segs: &[QrSegment],
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool,
    ) -> Result<Self, QrError> {
        let (datacodewords, ecl, version) =
            QrCode::encode_segments_to_codewords(segs, ecl, minversion, maxversion, boostecl)?;
        Ok(QrCode::encode_codewords(version, ecl, &datacodewords, mask))
    }

    /// Same as [`QrCode::encode_segments`], with the parameters taken from `options`.
    pub fn encode_segments_with(segs: &[QrSegment], options: &EncodeOptions) -> Result<Self, QrError> {
        QrCode::encode_segments(
            segs,
            options.ecl,
            options.min_version,
            options.max_version,
            options.mask,
            options.boost_ecl,
        )
    }

    /// Assembles the data codewords for the given segments.
    ///
    /// Returns the data codewords (exactly the capacity of the chosen version and
    /// level), the possibly boosted level and the chosen version.
    pub fn encode_segments_to_codewords(
        segs: &[QrSegment],
        mut ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        boostecl: bool,
    ) -> Result<(Vec<u8>, QrCodeEcc, Version), QrError> {
        if minversion > maxversion {
            return Err(QrError::invalid(format!(
                "Minimum version {} is greater than maximum version {}",
                minversion.value(),
                maxversion.value()
            )));
        }

        // Find the minimal version number to use
        let mut version: Version = minversion;
        let datausedbits: usize = loop {
            let datacapacitybits: usize = QrCode::get_num_data_codewords(version, ecl) * 8;
            let dataused: Option<usize> = QrSegment::get_total_bits(segs, version);
            match dataused {
                Some(n) if n <= datacapacitybits => break n,
                _ if version >= maxversion => {
                    return Err(match dataused {
                        None => DataTooLong::SegmentTooLong,
                        Some(n) => DataTooLong::DataOverCapacity(n, datacapacitybits),
                    }
                    .into());
                }
                _ => version = Version(version.value() + 1),
            }
        };

        // Increase the error correction level while the data still fits
        if boostecl {
            for newecl in [QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
                if datausedbits <= QrCode::get_num_data_codewords(version, newecl) * 8 {
                    ecl = newecl;
                }
            }
        }
        debug!(
            "Selected version {} with error correction {:?} for {} data bits",
            version.value(),
            ecl,
            datausedbits
        );

        // Concatenate all segments to create the data bit string
        let datacapacitybits: usize = QrCode::get_num_data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer::with_capacity(datacapacitybits);
        for seg in segs {
            bb.append_bits(seg.mode().mode_bits(), 4);
            bb.append_bits(seg.num_chars() as u32, seg.mode().num_char_count_bits(version));
            bb.append_buffer(seg.data());
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Add terminator and pad up to a byte if applicable
        let numzerobits: usize = (datacapacitybits - bb.len()).min(4);
        bb.append_bits(0, numzerobits as u8);
        let numzerobits: usize = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        // Pad with alternating bytes until data capacity is reached
        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }
        Ok((bb.into_bytes(), ecl, version))
    }

    /// Creates a new QR Code with the given version number, error correction
    /// level, data codeword bytes and mask.
    ///
    /// This is a low-level API that most users should not use directly.
    ///
    /// # Panics
    ///
    /// Panics if `datacodewords` is not exactly the data capacity of `version` at `ecl`.
    pub fn encode_codewords(version: Version, ecl: QrCodeEcc, datacodewords: &[u8], mask: Option<Mask>) -> Self {
        let allcodewords = QrCode::add_ecc_and_interleave(datacodewords, version, ecl);

        let mut builder = SymbolBuilder::new(version);
        builder.draw_codewords(&allcodewords);

        let mask: Mask = match mask {
            Some(m) => m,
            None => builder.choose_mask(ecl),
        };
        debug!("Applying mask {} to version {} symbol", mask.value(), version.value());
        builder.apply_mask(mask);
        builder.draw_format_bits(ecl, mask);
        builder.finish(ecl, mask)
    }

    /// Encodes text as a structured append sequence of up to 16 symbols.
    ///
    /// With `version` set to `None`, a single symbol is returned if the text fits
    /// any version; otherwise the text is split across version 40 symbols. With a
    /// fixed version, every symbol has exactly that version. Chunk boundaries never
    /// split a UTF-8 code point.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::DataTooLong`] if more than 16 symbols would be needed.
    pub fn encode_text_in_multiple_symbols(
        text: &str,
        ecl: QrCodeEcc,
        version: Option<Version>,
        boostecl: bool,
    ) -> Result<Vec<Self>, QrError> {
        let segs = QrSegment::make_segments(text);
        QrCode::encode_in_multiple_symbols(&segs, text.as_bytes(), ecl, version, true, boostecl)
    }

    /// Encodes binary data as a structured append sequence of up to 16 symbols.
    ///
    /// Same as [`QrCode::encode_text_in_multiple_symbols`], except that chunk
    /// boundaries only respect UTF-8 code points if `consider_utf8_boundaries` is set.
    pub fn encode_binary_in_multiple_symbols(
        data: &[u8],
        ecl: QrCodeEcc,
        version: Option<Version>,
        consider_utf8_boundaries: bool,
        boostecl: bool,
    ) -> Result<Vec<Self>, QrError> {
        let segs = [QrSegment::make_bytes(data)];
        QrCode::encode_in_multiple_symbols(&segs, data, ecl, version, consider_utf8_boundaries, boostecl)
    }

    fn encode_in_multiple_symbols(
        segs: &[QrSegment],
        data: &[u8],
        ecl: QrCodeEcc,
        version: Option<Version>,
        consider_utf8_boundaries: bool,
        boostecl: bool,
    ) -> Result<Vec<Self>, QrError> {
        let (minversion, maxversion) = match version {
            Some(v) => (v, v),
            None => (Version::MIN, Version::MAX),
        };
        match QrCode::encode_segments(segs, ecl, minversion, maxversion, None, boostecl) {
            Ok(qr) => return Ok(vec![qr]),
            Err(QrError::DataTooLong(_)) => {}
            Err(e) => return Err(e),
        }

        let version = version.unwrap_or(Version::MAX);
        let chunks = planner::split_for_version(data, ecl, version, consider_utf8_boundaries)?;
        chunks
            .iter()
            .map(|segs| QrCode::encode_segments(segs, ecl, version, version, None, boostecl))
            .collect()
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> i32 {
        i32::from(self.modules.size())
    }

    /// Returns the error correction level actually used, after any boosting.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns the mask actually applied, also when it was chosen automatically.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the QR
    /// code's bounds return `false`.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size();
        range.contains(&x) && range.contains(&y) && self.modules.get(x as u8, y as u8)
    }

    fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
        assert_eq!(
            data.len(),
            QrCode::get_num_data_codewords(ver, ecl),
            "Data codeword count does not match capacity"
        );
        let numblocks: usize = QrCode::table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
        let blockecclen: usize = QrCode::table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
        let rawcodewords: usize = QrCode::get_num_raw_data_modules(ver) / 8;
        let numshortblocks: usize = numblocks - (rawcodewords % numblocks);
        let shortblockdatalen: usize = rawcodewords / numblocks - blockecclen;

        let mut result = vec![0u8; rawcodewords];
        let rs = ReedSolomonGenerator::new(blockecclen);
        let mut ecc = vec![0u8; blockecclen];
        let mut dat: &[u8] = data;
        for i in 0..numblocks {
            let datlen: usize = shortblockdatalen + usize::from(i >= numshortblocks);
            rs.compute_remainder(&dat[..datlen], &mut ecc);
            // Short blocks have no byte in the last data column
            let mut k: usize = i;
            for (j, &b) in dat[..datlen].iter().enumerate() {
                if j == shortblockdatalen {
                    k -= numshortblocks;
                }
                result[k] = b;
                k += numblocks;
            }
            let mut k: usize = data.len() + i;
            for &b in &ecc {
                result[k] = b;
                k += numblocks;
            }
            dat = &dat[datlen..];
        }
        debug_assert!(dat.is_empty());
        result
    }

    /// Number of data bits that fit a symbol of the given version, after all
    /// function modules are excluded. Includes remainder bits, so it might not be
    /// a multiple of 8. The result is in the range [208, 29648].
    pub fn get_num_raw_data_modules(ver: Version) -> usize {
        let ver = usize::from(ver.value());
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    /// Number of 8-bit data codewords (excluding error correction) in a symbol
    /// of the given version and level.
    pub fn get_num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
        QrCode::get_num_raw_data_modules(ver) / 8
            - QrCode::table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl)
                * QrCode::table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
    }

    fn table_get(table: &'static [[u8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
        usize::from(table[ecl.ordinal()][usize::from(ver.value())])
    }
}

/// Owns the module grid and the function-module marker grid while a symbol is drawn.
/// Only the module grid survives into the finished [`QrCode`].
struct SymbolBuilder {
    version: Version,
    size: u8,
    modules: ModuleGrid,
    isfunction: ModuleGrid,
}

impl SymbolBuilder {
    fn new(version: Version) -> Self {
        let size: u8 = version.size();
        let mut result = Self {
            version,
            size,
            modules: ModuleGrid::new(size),
            isfunction: ModuleGrid::new(size),
        };
        result.draw_function_patterns();
        result
    }

    fn finish(self, ecl: QrCodeEcc, mask: Mask) -> QrCode {
        QrCode {
            version: self.version,
            ecl,
            mask,
            modules: self.modules,
        }
    }

    fn set_function_module(&mut self, x: u8, y: u8, isdark: bool) {
        self.modules.set(x, y, isdark);
        self.isfunction.set(x, y, true);
    }

    fn set_function_module_unbounded(&mut self, x: i32, y: i32, isdark: bool) {
        let range = 0..i32::from(self.size);
        if range.contains(&x) && range.contains(&y) {
            self.set_function_module(x as u8, y as u8, isdark);
        }
    }

    fn draw_function_patterns(&mut self) {
        let size: u8 = self.size;
        // Timing patterns
        for i in 0..size {
            self.set_function_module(6, i, i % 2 == 0);
            self.set_function_module(i, 6, i % 2 == 0);
        }

        // Finder patterns with separators; overwrites some timing modules
        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(i32::from(size) - 4, 3);
        self.draw_finder_pattern(3, i32::from(size) - 4);

        let alignpatpos: Vec<u8> = alignment_pattern_positions(self.version);
        let numalign: usize = alignpatpos.len();
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                // Don't draw on the three finder corners
                if !((i == 0 && j == 0) || (i == 0 && j == numalign - 1) || (i == numalign - 1 && j == 0)) {
                    self.draw_alignment_pattern(pos0, pos1);
                }
            }
        }

        // Reserve the format areas with a placeholder; rewritten once the mask is known
        self.draw_format_bits_with(QrCodeEcc::Low, Mask(0), true);
        self.draw_version();
    }

    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let dist: i32 = dx.abs().max(dy.abs());
                self.set_function_module_unbounded(x + dx, y + dy, dist != 2 && dist != 4);
            }
        }
    }

    fn draw_alignment_pattern(&mut self, x: u8, y: u8) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let dist: i32 = dx.abs().max(dy.abs());
                self.set_function_module((i32::from(x) + dx) as u8, (i32::from(y) + dy) as u8, dist != 1);
            }
        }
    }

    fn draw_version(&mut self) {
        let ver = u32::from(self.version.value());
        if ver < 7 {
            return;
        }
        let bits: u32 = version_info_bits(ver);
        for i in 0u8..18 {
            let bit: bool = get_bit(bits, i);
            let a: u8 = self.size - 11 + (i % 3);
            let b: u8 = i / 3;
            self.set_function_module(a, b, bit);
            self.set_function_module(b, a, bit);
        }
    }

    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        self.draw_format_bits_with(ecl, mask, false);
    }

    fn draw_format_bits_with(&mut self, ecl: QrCodeEcc, mask: Mask, reserve: bool) {
        let size = self.size;
        let (modules, isfunction) = (&mut self.modules, &mut self.isfunction);
        draw_format_bits(size, ecl, mask, |x, y, isdark| {
            modules.set(x, y, isdark);
            if reserve {
                isfunction.set(x, y, true);
            }
        });
    }

    fn draw_codewords(&mut self, data: &[u8]) {
        assert_eq!(
            data.len(),
            QrCode::get_num_raw_data_modules(self.version) / 8,
            "Codeword count does not match module capacity"
        );
        let size = i32::from(self.size);
        let mut i: usize = 0; // Bit index into the data
        let mut right: i32 = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x = (right - j) as u8;
                    let upward: bool = ((right + 1) & 2) == 0;
                    let y = (if upward { size - 1 - vert } else { vert }) as u8;
                    if !self.isfunction.get(x, y) && i < data.len() * 8 {
                        self.modules.set(x, y, get_bit(data[i >> 3].into(), 7 - ((i as u8) & 7)));
                        i += 1;
                    }
                    // Remainder modules past the last codeword stay light
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, data.len() * 8);
    }

    fn apply_mask(&mut self, mask: Mask) {
        apply_mask(&mut self.modules, &self.isfunction, mask);
    }

    /// Scores all 8 masks and returns the best; ties go to the lowest index.
    fn choose_mask(&mut self, ecl: QrCodeEcc) -> Mask {
        #[cfg(feature = "parallel")]
        let scores = self.mask_scores_parallel(ecl);
        #[cfg(not(feature = "parallel"))]
        let scores = self.mask_scores_sequential(ecl);
        lowest_penalty(&scores)
    }

    /// `(penalty, mask)` for every mask, applying and undoing each in place.
    #[cfg_attr(all(feature = "parallel", not(test)), allow(dead_code))]
    fn mask_scores_sequential(&mut self, ecl: QrCodeEcc) -> Vec<(i32, u8)> {
        let mut scores = Vec::with_capacity(8);
        for i in 0u8..8 {
            let mask = Mask(i);
            self.apply_mask(mask);
            self.draw_format_bits(ecl, mask);
            scores.push((penalty_score(&self.modules), i));
            self.apply_mask(mask); // Undoes the mask due to XOR
        }
        scores
    }

    /// `(penalty, mask)` for every mask, each scored on a private copy of the grid.
    #[cfg(feature = "parallel")]
    fn mask_scores_parallel(&self, ecl: QrCodeEcc) -> Vec<(i32, u8)> {
        use rayon::prelude::*;

        let size = self.size;
        (0u8..8)
            .into_par_iter()
            .map(|i| {
                let mask = Mask(i);
                let mut candidate: ModuleGrid = self.modules.clone();
                apply_mask(&mut candidate, &self.isfunction, mask);
                draw_format_bits(size, ecl, mask, |x, y, isdark| candidate.set(x, y, isdark));
                (penalty_score(&candidate), i)
            })
            .collect()
    }
}

/// Picks the mask with the smallest penalty, the lower mask index on a tie.
fn lowest_penalty(scores: &[(i32, u8)]) -> Mask {
    for &(penalty, i) in scores {
        trace!("Mask {} penalty {}", i, penalty);
    }
    scores.iter().min().map_or(Mask(0), |&(_, i)| Mask(i))
}

/// XORs every non-function module with the mask predicate. Applying the same
/// mask twice restores the grid.
fn apply_mask(modules: &mut ModuleGrid, isfunction: &ModuleGrid, mask: Mask) {
    let size = modules.size();
    for y in 0..size {
        for x in 0..size {
            if !isfunction.get(x, y) && mask.inverts(i32::from(x), i32::from(y)) {
                modules.toggle(x, y);
            }
        }
    }
}

/// Writes both copies of the 15-bit format information, plus the always-dark module.
fn draw_format_bits(size: u8, ecl: QrCodeEcc, mask: Mask, mut set: impl FnMut(u8, u8, bool)) {
    let bits: u32 = format_info_bits(ecl, mask);

    // First copy, around the top left finder
    for i in 0..6 {
        set(8, i, get_bit(bits, i));
    }
    set(8, 7, get_bit(bits, 6));
    set(8, 8, get_bit(bits, 7));
    set(7, 8, get_bit(bits, 8));
    for i in 9..15 {
        set(14 - i, 8, get_bit(bits, i));
    }

    // Second copy, split between the other two finders
    for i in 0..8 {
        set(size - 1 - i, 8, get_bit(bits, i));
    }
    for i in 8..15 {
        set(8, size - 15 + i, get_bit(bits, i));
    }
    set(8, size - 8, true);
}

/// The 15-bit BCH-protected format word for the given level and mask.
fn format_info_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// The 18-bit BCH-protected version word, for versions 7 and up.
fn version_info_bits(ver: u32) -> u32 {
    let mut rem: u32 = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
    }
    (ver << 12) | rem
}

/// Ascending center coordinates of alignment patterns, used on both axes.
/// Empty for version 1.
fn alignment_pattern_positions(version: Version) -> Vec<u8> {
    let ver: u8 = version.value();
    if ver == 1 {
        return Vec::new();
    }
    let numalign: u8 = ver / 7 + 2;
    let step: u8 = if ver == 32 {
        26
    } else {
        ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
    };
    let size: u8 = version.size();
    let mut result: Vec<u8> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

static ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    // Version: (index 0 is unused)
    //  0, 1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30, 30, 26, 28, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28, 28, 28, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30, 30, 30, 28, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30, 30, 30, 30, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18,
        19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31,
        33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29, 34, 34, 35, 38, 40,
        43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35, 37, 40, 42, 45, 48,
        51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// All levels, weakest first.
    pub const ALL: [QrCodeEcc; 4] = [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High];

    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns the 2-bit code stored in the format information.
    pub fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if the number is outside the range [1, 40].
    pub fn new(ver: u8) -> Result<Self, QrError> {
        if (Version::MIN.value()..=Version::MAX.value()).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(QrError::invalid(format!("Version number {ver} out of range")))
        }
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules, `4 * version + 17`.
    pub const fn size(self) -> u8 {
        self.0 * 4 + 17
    }
}

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if the number is outside the range [0, 7].
    pub fn new(mask: u8) -> Result<Self, QrError> {
        if mask <= 7 {
            Ok(Self(mask))
        } else {
            Err(QrError::invalid(format!("Mask value {mask} out of range")))
        }
    }

    /// Converts the integer form used on command lines: -1 means automatic
    /// selection, 0 to 7 a fixed mask.
    pub fn from_index(index: i32) -> Result<Option<Self>, QrError> {
        match index {
            -1 => Ok(None),
            0..=7 => Ok(Some(Self(index as u8))),
            _ => Err(QrError::invalid(format!("Mask value {index} out of range"))),
        }
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }

    fn inverts(self, x: i32, y: i32) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => x * y % 2 + x * y % 3 == 0,
            6 => (x * y % 2 + x * y % 3) % 2 == 0,
            7 => ((x + y) % 2 + x * y % 3) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

/// Parameters for [`QrCode::encode_segments_with`].
///
/// ```rust
/// use qrsmith::{EncodeOptions, QrCodeEcc, Version};
///
/// let options = EncodeOptions::new()
///     .ecl(QrCodeEcc::Quartile)
///     .version_range(Version::new(5).unwrap(), Version::new(10).unwrap())
///     .unwrap()
///     .boost_ecl(false);
/// assert_eq!(options.min_version().value(), 5);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EncodeOptions {
    ecl: QrCodeEcc,
    min_version: Version,
    max_version: Version,
    mask: Option<Mask>,
    boost_ecl: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ecl: QrCodeEcc::Low,
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            boost_ecl: true,
        }
    }
}

impl EncodeOptions {
    /// Level Low, versions 1 to 40, automatic mask, boosting on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum error correction level.
    pub fn ecl(mut self, ecl: QrCodeEcc) -> Self {
        self.ecl = ecl;
        self
    }

    /// Smallest version the search starts at.
    pub fn min_version(&self) -> Version {
        self.min_version
    }

    /// Largest version the search may reach.
    pub fn max_version(&self) -> Version {
        self.max_version
    }

    /// Restricts the version search to `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if `min > max`.
    pub fn version_range(mut self, min: Version, max: Version) -> Result<Self, QrError> {
        if min > max {
            return Err(QrError::invalid(format!(
                "Minimum version {} is greater than maximum version {}",
                min.value(),
                max.value()
            )));
        }
        self.min_version = min;
        self.max_version = max;
        Ok(self)
    }

    /// Fixed mask, or `None` for automatic selection.
    pub fn mask(mut self, mask: Option<Mask>) -> Self {
        self.mask = mask;
        self
    }

    /// Whether the error correction level may be raised when the version allows it.
    pub fn boost_ecl(mut self, boost: bool) -> Self {
        self.boost_ecl = boost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_version_bounds() {
        assert!(Version::new(0).is_err());
        assert!(Version::new(41).is_err());
        assert_eq!(v(40).size(), 177);
        assert_eq!(v(1).size(), 21);
    }

    #[test]
    fn test_mask_from_index() {
        assert_eq!(Mask::from_index(-1).unwrap(), None);
        assert_eq!(Mask::from_index(7).unwrap(), Some(Mask(7)));
        assert!(Mask::from_index(8).is_err());
        assert!(Mask::from_index(-2).is_err());
        assert!(Mask::new(8).is_err());
    }

    #[test]
    fn test_raw_data_modules() {
        assert_eq!(QrCode::get_num_raw_data_modules(v(1)), 208);
        assert_eq!(QrCode::get_num_raw_data_modules(v(7)), 1568);
        assert_eq!(QrCode::get_num_raw_data_modules(v(40)), 29648);
    }

    #[test]
    fn test_data_codewords() {
        assert_eq!(QrCode::get_num_data_codewords(v(1), QrCodeEcc::Low), 19);
        assert_eq!(QrCode::get_num_data_codewords(v(1), QrCodeEcc::High), 9);
        assert_eq!(QrCode::get_num_data_codewords(v(29), QrCodeEcc::Medium), 1267);
        assert_eq!(QrCode::get_num_data_codewords(v(40), QrCodeEcc::Low), 2956);
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(v(1)).is_empty());
        assert_eq!(alignment_pattern_positions(v(2)), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(v(7)), vec![6, 22, 38]);
        assert_eq!(alignment_pattern_positions(v(32)), vec![6, 34, 60, 86, 112, 138]);
        assert_eq!(alignment_pattern_positions(v(40)), vec![6, 30, 58, 86, 114, 142, 170]);
    }

    #[test]
    fn test_format_and_version_words() {
        // Level M, mask 5: data 0b00101
        assert_eq!(format_info_bits(QrCodeEcc::Medium, Mask(5)), 0x40ce);
        assert_eq!(version_info_bits(7), 0x07c94);
        assert_eq!(version_info_bits(40), 0x28c69);
    }

    #[test]
    fn test_codeword_assembly_pads_to_capacity() {
        let segs = [QrSegment::make_numeric("01234567").unwrap()];
        let (data, ecl, version) =
            QrCode::encode_segments_to_codewords(&segs, QrCodeEcc::Medium, v(1), v(1), false).unwrap();
        assert_eq!(ecl, QrCodeEcc::Medium);
        assert_eq!(version, v(1));
        assert_eq!(
            data,
            vec![0x10, 0x20, 0x0c, 0x56, 0x61, 0x80, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11, 0xec, 0x11]
        );
    }

    #[test]
    fn test_inverted_version_range() {
        let err = QrCode::encode_segments(&[], QrCodeEcc::Low, v(5), v(4), None, true).unwrap_err();
        assert!(matches!(err, QrError::InvalidArgument(_)));
        assert!(EncodeOptions::new().version_range(v(5), v(4)).is_err());
    }

    #[test]
    fn test_boost_raises_level_only() {
        let segs = QrSegment::make_segments("HELLO");
        let boosted = QrCode::encode_segments(&segs, QrCodeEcc::Low, v(1), v(40), Some(Mask(0)), true).unwrap();
        let plain = QrCode::encode_segments(&segs, QrCodeEcc::Low, v(1), v(40), Some(Mask(0)), false).unwrap();
        assert_eq!(boosted.version(), plain.version());
        assert_eq!(boosted.error_correction_level(), QrCodeEcc::High);
        assert_eq!(plain.error_correction_level(), QrCodeEcc::Low);
    }

    #[test]
    #[should_panic(expected = "Data codeword count does not match capacity")]
    fn test_wrong_codeword_count_panics() {
        let _ = QrCode::encode_codewords(v(1), QrCodeEcc::Low, &[0u8; 18], Some(Mask(0)));
    }

    #[test]
    fn test_mask_involution_on_builder() {
        let mut builder = SymbolBuilder::new(v(3));
        let data: Vec<u8> = (0..QrCode::get_num_raw_data_modules(v(3)) / 8).map(|i| (i * 37) as u8).collect();
        builder.draw_codewords(&data);
        let before = builder.modules.clone();
        for i in 0..8 {
            builder.apply_mask(Mask(i));
            if i == 0 {
                assert_ne!(builder.modules, before);
            }
            builder.apply_mask(Mask(i));
            assert_eq!(builder.modules, before);
        }
    }

    #[test]
    fn test_lowest_penalty_breaks_ties_by_index() {
        assert_eq!(lowest_penalty(&[(10, 5), (10, 2), (12, 0)]), Mask(2));
        assert_eq!(lowest_penalty(&[(7, 7), (7, 6), (7, 0), (7, 3)]), Mask(0));
        assert_eq!(lowest_penalty(&[(400, 0), (399, 7)]), Mask(7));
        assert_eq!(lowest_penalty(&[]), Mask(0));
    }

    #[test]
    fn test_sequential_scan_restores_grid() {
        let segs = QrSegment::make_segments("https://example.com/item/0?q=0");
        let (data, ecl, version) =
            QrCode::encode_segments_to_codewords(&segs, QrCodeEcc::High, v(1), v(40), true).unwrap();
        let mut builder = SymbolBuilder::new(version);
        builder.draw_codewords(&QrCode::add_ecc_and_interleave(&data, version, ecl));
        let scores = builder.mask_scores_sequential(ecl);
        assert_eq!(scores.iter().map(|&(_, i)| i).collect::<Vec<u8>>(), (0..8).collect::<Vec<u8>>());
        assert_eq!(lowest_penalty(&scores), Mask(2));
        // The data modules are back to unmasked, so a second scan scores the same
        assert_eq!(builder.mask_scores_sequential(ecl), scores);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_and_sequential_scans_agree() {
        let texts = [
            "Hello, world!",
            "HELLO WORLD",
            "314159265358979323846264338327950288419716939937510",
            "https://www.nayuki.io/",
            "https://example.com/item/0?q=0",
            "THE SQUARE ROOT OF 2 IS 1.41421356237309504880168872420969807856967187537694807317667973799",
        ];
        for text in texts {
            for ecl in QrCodeEcc::ALL {
                let segs = QrSegment::make_segments(text);
                let (data, ecl, version) =
                    QrCode::encode_segments_to_codewords(&segs, ecl, v(1), v(40), true).unwrap();
                let mut builder = SymbolBuilder::new(version);
                builder.draw_codewords(&QrCode::add_ecc_and_interleave(&data, version, ecl));
                let parallel = builder.mask_scores_parallel(ecl);
                let sequential = builder.mask_scores_sequential(ecl);
                assert_eq!(parallel, sequential, "{text} {ecl:?}");
                assert_eq!(lowest_penalty(&parallel), lowest_penalty(&sequential));
            }
        }
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(40))]

        /// Property: applying a mask twice restores the grid bit for bit
        #[test]
        fn prop_mask_is_an_involution(
            seed in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..64),
            ver in 1u8..=40,
            mask in 0u8..8,
        ) {
            let version = v(ver);
            let mut builder = SymbolBuilder::new(version);
            let numcodewords = QrCode::get_num_raw_data_modules(version) / 8;
            let data: Vec<u8> = seed.iter().copied().cycle().take(numcodewords).collect();
            builder.draw_codewords(&data);
            let before = builder.modules.clone();
            builder.apply_mask(Mask(mask));
            builder.apply_mask(Mask(mask));
            proptest::prop_assert_eq!(&builder.modules, &before);
        }
    }

    #[test]
    fn test_format_bits_read_back() {
        let qr = QrCode::encode_text("HELLO WORLD", QrCodeEcc::Quartile).unwrap();
        let expected = format_info_bits(qr.error_correction_level(), qr.mask());
        for i in 0..6 {
            assert_eq!(qr.get_module(8, i), get_bit(expected, i as u8));
        }
        let size = qr.size();
        for i in 0..8 {
            assert_eq!(qr.get_module(size - 1 - i, 8), get_bit(expected, i as u8));
        }
        assert!(qr.get_module(8, size - 8));
    }

    #[test]
    fn test_version_info_drawn_in_both_corners() {
        let qr = QrCode::encode_segments(&[], QrCodeEcc::Low, v(7), v(7), Some(Mask(1)), false).unwrap();
        let size = qr.size();
        let bits = version_info_bits(7);
        for i in 0..18 {
            let a = size - 11 + (i % 3);
            let b = i / 3;
            assert_eq!(qr.get_module(a, b), get_bit(bits, i as u8));
            assert_eq!(qr.get_module(b, a), get_bit(bits, i as u8));
        }
    }

    #[test]
    fn test_get_module_out_of_range() {
        let qr = QrCode::encode_text("x", QrCodeEcc::Low).unwrap();
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, qr.size()));
        assert!(qr.get_module(0, 0));
    }
}
