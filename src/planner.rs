//! Segment planning: bit-optimal mode switching and structured append splitting.

use log::debug;

use crate::error::{DataTooLong, QrError};
use crate::qrcode::{QrCode, QrCodeEcc, Version};
use crate::segment::{alphanumeric_value, QrSegment, QrSegmentMode, MAX_STRUCTURED_APPEND_SYMBOLS};

/// Modes considered by the optimizer, in tie-break order.
const MODE_TYPES: [QrSegmentMode; 3] = [QrSegmentMode::Byte, QrSegmentMode::Alphanumeric, QrSegmentMode::Numeric];

/// Splits text into segments that minimize the total bit length.
///
/// Every code point is assigned the mode that gives the shortest encoding
/// overall, taking the cost of segment headers into account; consecutive
/// code points in the same mode become one segment. The smallest version in
/// `minversion..=maxversion` that holds the result is used to size the count
/// fields, so the segmentation may differ between version tiers.
///
/// # Errors
///
/// Returns [`QrError::InvalidArgument`] if `minversion > maxversion` and
/// [`QrError::DataTooLong`] if the text does not fit any version in range.
pub fn make_segments_optimally(
    text: &str,
    ecl: QrCodeEcc,
    minversion: Version,
    maxversion: Version,
) -> Result<Vec<QrSegment>, QrError> {
    if minversion > maxversion {
        return Err(QrError::invalid(format!(
            "Minimum version {} is greater than maximum version {}",
            minversion.value(),
            maxversion.value()
        )));
    }
    let codepoints: Vec<char> = text.chars().collect();
    if codepoints.is_empty() {
        return Ok(Vec::new());
    }

    let mut segs: Vec<QrSegment> = Vec::new();
    let mut version = minversion;
    loop {
        // The count field widths only change at versions 10 and 27
        if version == minversion || version.value() == 10 || version.value() == 27 {
            let charmodes = compute_character_modes(&codepoints, version);
            segs = split_into_segments(&codepoints, &charmodes)?;
        }
        let datacapacitybits: usize = QrCode::get_num_data_codewords(version, ecl) * 8;
        let dataused: Option<usize> = QrSegment::get_total_bits(&segs, version);
        match dataused {
            Some(n) if n <= datacapacitybits => {
                debug!("Optimal segmentation: {} segments, {} bits at version {}", segs.len(), n, version.value());
                return Ok(segs);
            }
            _ if version >= maxversion => {
                return Err(match dataused {
                    None => DataTooLong::SegmentTooLong,
                    Some(n) => DataTooLong::DataOverCapacity(n, datacapacitybits),
                }
                .into());
            }
            _ => version = Version::new(version.value() + 1)?,
        }
    }
}

/// Returns the mode of every code point in a bit-minimal encoding, computed
/// by dynamic programming over costs in units of 1/6 bit.
fn compute_character_modes(codepoints: &[char], version: Version) -> Vec<QrSegmentMode> {
    let nummodes = MODE_TYPES.len();
    let headcosts: Vec<usize> =
        MODE_TYPES.iter().map(|m| (4 + usize::from(m.num_char_count_bits(version))) * 6).collect();

    // charmodes[i][j] is the mode of code point i on the cheapest path that is in mode j after it
    let mut charmodes: Vec<[Option<usize>; 3]> = vec![[None; 3]; codepoints.len()];
    let mut prevcosts: Vec<usize> = headcosts.clone();

    for (i, &c) in codepoints.iter().enumerate() {
        let mut curcosts: Vec<usize> = vec![0; nummodes];
        let modes = &mut charmodes[i];

        // Byte mode can always extend its segment
        curcosts[0] = prevcosts[0] + c.len_utf8() * 8 * 6;
        modes[0] = Some(0);
        if alphanumeric_value(c).is_some() {
            curcosts[1] = prevcosts[1] + 33; // 5.5 bits per character
            modes[1] = Some(1);
        }
        if c.is_ascii_digit() {
            curcosts[2] = prevcosts[2] + 20; // 3.33 bits per digit
            modes[2] = Some(2);
        }

        // Start a new segment after this code point to switch modes
        for j in 0..nummodes {
            for k in 0..nummodes {
                let newcost: usize = curcosts[k].div_ceil(6) * 6 + headcosts[j];
                if modes[k].is_some() && (modes[j].is_none() || newcost < curcosts[j]) {
                    curcosts[j] = newcost;
                    modes[j] = Some(k);
                }
            }
        }
        prevcosts = curcosts;
    }

    // Cheapest final state, first mode wins ties
    let last = &charmodes[codepoints.len() - 1];
    let mut curmode: usize = 0;
    let mut mincost: Option<usize> = None;
    for (j, &cost) in prevcosts.iter().enumerate() {
        if last[j].is_some() && mincost.map_or(true, |m| cost < m) {
            mincost = Some(cost);
            curmode = j;
        }
    }

    // Trace back through the states
    let mut result = vec![QrSegmentMode::Byte; codepoints.len()];
    for i in (0..codepoints.len()).rev() {
        curmode = charmodes[i][curmode].unwrap_or(0);
        result[i] = MODE_TYPES[curmode];
    }
    result
}

/// Groups consecutive code points sharing a mode into segments.
fn split_into_segments(codepoints: &[char], charmodes: &[QrSegmentMode]) -> Result<Vec<QrSegment>, QrError> {
    let mut result = Vec::new();
    let mut start: usize = 0;
    while start < codepoints.len() {
        let mode = charmodes[start];
        let end = (start..codepoints.len()).find(|&i| charmodes[i] != mode).unwrap_or(codepoints.len());
        let run: String = codepoints[start..end].iter().collect();
        result.push(match mode {
            QrSegmentMode::Numeric => QrSegment::make_numeric(&run)?,
            QrSegmentMode::Alphanumeric => QrSegment::make_alphanumeric(&run)?,
            _ => QrSegment::make_bytes(run.as_bytes()),
        });
        start = end;
    }
    Ok(result)
}

/// Splits `data` into `number_of_codes` chunks of near-equal length for a
/// structured append sequence.
///
/// Each returned list is `[header, bytes]` and can be passed to
/// [`QrCode::encode_segments`]. The chunk boundary before symbol `i` starts at
/// `len * i / number_of_codes`; with `consider_utf8_boundaries` it moves back to
/// the start of a UTF-8 code point.
///
/// # Errors
///
/// Returns [`QrError::InvalidArgument`] unless `1 <= number_of_codes <= 16`.
pub fn make_structured_append_segments(
    data: &[u8],
    number_of_codes: usize,
    consider_utf8_boundaries: bool,
) -> Result<Vec<Vec<QrSegment>>, QrError> {
    if !(1..=MAX_STRUCTURED_APPEND_SYMBOLS).contains(&number_of_codes) {
        return Err(QrError::invalid(format!(
            "Number of codes must be between 1 and {MAX_STRUCTURED_APPEND_SYMBOLS}, got {number_of_codes}"
        )));
    }
    let mut boundaries: Vec<usize> = Vec::with_capacity(number_of_codes + 1);
    boundaries.push(0);
    for i in 1..number_of_codes {
        let prev = boundaries[i - 1];
        let mut boundary = data.len() * i / number_of_codes;
        if consider_utf8_boundaries {
            boundary = code_point_start(data, boundary, prev);
        }
        boundaries.push(boundary);
    }
    boundaries.push(data.len());
    let chunks: Vec<&[u8]> = boundaries.windows(2).map(|w| &data[w[0]..w[1]]).collect();
    with_headers(data, &chunks)
}

/// Splits `data` into the fewest chunks that each fill one symbol of the given
/// version and level, header included.
pub fn split_for_version(
    data: &[u8],
    ecl: QrCodeEcc,
    version: Version,
    consider_utf8_boundaries: bool,
) -> Result<Vec<Vec<QrSegment>>, QrError> {
    let capacitybits: usize = QrCode::get_num_data_codewords(version, ecl) * 8;
    let ccbits: u8 = QrSegmentMode::Byte.num_char_count_bits(version);
    // Structured append header (4 + 16 bits) plus the byte segment header
    let overhead: usize = 20 + 4 + usize::from(ccbits);
    let maxchunk: usize = ((capacitybits - overhead) / 8).min((1usize << ccbits) - 1);

    let mut chunks: Vec<&[u8]> = Vec::new();
    let mut start: usize = 0;
    while start < data.len() {
        let mut end = (start + maxchunk).min(data.len());
        if consider_utf8_boundaries && end < data.len() {
            let moved = code_point_start(data, end, start);
            if moved > start {
                end = moved;
            }
        }
        chunks.push(&data[start..end]);
        start = end;
    }
    if chunks.len() > MAX_STRUCTURED_APPEND_SYMBOLS {
        return Err(DataTooLong::TooManySymbols {
            required: chunks.len(),
            max: MAX_STRUCTURED_APPEND_SYMBOLS,
        }
        .into());
    }
    debug!(
        "Split {} bytes into {} symbols of version {} (max {} bytes each)",
        data.len(),
        chunks.len(),
        version.value(),
        maxchunk
    );
    with_headers(data, &chunks)
}

fn with_headers(data: &[u8], chunks: &[&[u8]]) -> Result<Vec<Vec<QrSegment>>, QrError> {
    let parity: u8 = data.iter().fold(0, |acc, &b| acc ^ b);
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            Ok(vec![
                QrSegment::make_structured_append_header(i, chunks.len(), parity)?,
                QrSegment::make_bytes(chunk),
            ])
        })
        .collect()
}

/// Moves `index` backward, but not below `floor`, until it is not inside a UTF-8 sequence.
fn code_point_start(data: &[u8], mut index: usize, floor: usize) -> usize {
    while index > floor && index < data.len() && (data[index] & 0xc0) == 0x80 {
        index -= 1;
    }
    index
}
