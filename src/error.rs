//! Error types for QR code encoding.

use thiserror::Error;

/// Errors returned by the encoder and the renderers.
#[derive(Debug, Error)]
pub enum QrError {
    /// An argument is out of range, or a character cannot be encoded
    /// in the requested segment mode.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The payload does not fit the requested version range, ECC level or symbol count.
    #[error(transparent)]
    DataTooLong(#[from] DataTooLong),

    /// Writing a raster image failed.
    #[error("Image output failed: {0}")]
    Image(#[from] image::ImageError),
}

impl QrError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        QrError::InvalidArgument(msg.into())
    }
}

/// Error type for when data exceeds QR code capacity.
///
/// Ways to handle this exception include:
///
/// - Decrease the error correction level if it was greater than `QrCodeEcc::Low`.
/// - Increase the maxversion argument if it was less than `Version::MAX`.
/// - Split the text data into better or optimal segments to reduce the number of bits required.
/// - Change the text or binary data to be shorter.
/// - Change the text to fit the character set of a particular segment mode (e.g. alphanumeric).
/// - Propagate the error upward to the caller/user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataTooLong {
    /// A segment's character count does not fit its count field.
    #[error("Segment too long")]
    SegmentTooLong,

    /// Data length exceeds capacity, both in bits.
    #[error("Data length = {0} bits, Max capacity = {1} bits")]
    DataOverCapacity(usize, usize),

    /// Structured append would need more symbols than the protocol allows.
    #[error("Data requires {required} symbols, Max symbols = {max}")]
    TooManySymbols { required: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_reports_bits() {
        let err = QrError::from(DataTooLong::DataOverCapacity(1200, 1088));
        assert_eq!(err.to_string(), "Data length = 1200 bits, Max capacity = 1088 bits");
    }

    #[test]
    fn test_symbol_count_message() {
        let err = DataTooLong::TooManySymbols { required: 17, max: 16 };
        assert_eq!(err.to_string(), "Data requires 17 symbols, Max symbols = 16");
    }
}
