//! Character encoding detection for template and plain-text input files.

use chardetng::EncodingDetector;

/// Detect the encoding of `bytes` and decode them to a string.
///
/// Returns `None` when the detected encoding cannot decode the content
/// cleanly. Template files authored on legacy systems are frequently
/// windows-1250/1252 rather than UTF-8, so the content is sniffed instead
/// of assumed.
pub fn detect_and_decode(bytes: &[u8]) -> Option<String> {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return None;
    }
    Some(text.into_owned())
}
