//! Text encoding detection for subtitle files
//!
//! Subtitles in the wild are UTF-8, UTF-16 with a BOM, or some legacy
//! single/multi-byte code page. Detection looks at a bounded sample only.

use encoding_rs::{Encoding, UTF_8};

/// Number of leading bytes inspected by [`detect`]
pub const SAMPLE_SIZE: usize = 8 * 1024;

/// Label returned when nothing better can be determined
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Guess the encoding of `bytes`, returning an `encoding_rs` label.
///
/// Checks byte-order marks first, then strict UTF-8 validity, then falls
/// back to statistical detection. Never fails: the worst case is UTF-8.
pub fn detect(bytes: &[u8]) -> &'static str {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return DEFAULT_ENCODING;
    }

    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding.name();
    }

    if is_utf8_prefix(sample, sample.len() < bytes.len()) {
        return DEFAULT_ENCODING;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    let guess = detector.guess(None, true);
    tracing::trace!(encoding = guess.name(), "statistical encoding guess");
    guess.name()
}

/// Decode `bytes` with the encoding named by `label`.
///
/// Malformed sequences become U+FFFD rather than failing. A BOM, if
/// present, wins over the label and is stripped. Unknown labels decode as
/// UTF-8.
pub fn decode(bytes: &[u8], label: &str) -> String {
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8);
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            label,
            actual = actual.name(),
            "replaced malformed byte sequences while decoding"
        );
    }
    text.into_owned()
}

/// Strict UTF-8 check that tolerates a sequence cut off by sampling
fn is_utf8_prefix(sample: &[u8], truncated: bool) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        // error_len() is None when the input ends mid-sequence
        Err(e) => truncated && e.error_len().is_none(),
    }
}
