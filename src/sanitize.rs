//! Text sanitization for extracted content.
//!
//! Extracted text (native PDF text layers and OCR output alike) can carry
//! control characters and malformed byte sequences that word-processor
//! documents must not contain. [`sanitize`] strips them and re-encodes the
//! result; it is idempotent and never fails.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Control characters stripped from extracted text.
///
/// NUL, 0x01-0x08, 0x0B-0x1F and DEL. Newline (0x0A) is preserved because
/// paragraph splitting depends on it; tab (0x09) is outside the ranges.
const CONTROL_PATTERN: &str = "[\\x00-\\x08\\x0B-\\x1F\\x7F]";

fn control_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CONTROL_PATTERN).expect("static pattern"))
}

/// Normalize raw extracted text into a safe character sequence.
///
/// Strips the control ranges above and the Unicode replacement character,
/// then re-encodes as NFC. Worst case the result is an empty string.
///
/// Idempotent: `sanitize(sanitize(s)) == sanitize(s)` for all `s`.
pub fn sanitize(text: &str) -> String {
    let stripped = control_regex().replace_all(text, "");
    let stripped = stripped.replace('\u{FFFD}', "");
    stripped.nfc().collect()
}

/// Sanitize raw bytes that may not be valid UTF-8.
///
/// Byte sequences that cannot be represented are discarded rather than
/// reported as an error.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    sanitize(&String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_control_characters() {
        let text = "He\u{0001}llo\u{0000} wor\u{001F}ld\u{007F}";
        assert_eq!(sanitize(text), "Hello world");
    }

    #[test]
    fn test_preserves_newline_and_tab() {
        let text = "line one\nline\ttwo";
        assert_eq!(sanitize(text), "line one\nline\ttwo");
    }

    #[test]
    fn test_strips_carriage_return_and_form_feed() {
        // 0x0D and 0x0C are inside the stripped ranges.
        assert_eq!(sanitize("a\r\nb\u{000C}c"), "a\nbc");
    }

    #[test]
    fn test_strips_replacement_char() {
        assert_eq!(sanitize("Hello\u{FFFD}World"), "HelloWorld");
    }

    #[test]
    fn test_nfc_normalization() {
        // "e" + combining acute accent composes to a single code point.
        let text = "cafe\u{0301}";
        assert_eq!(sanitize(text), "café");
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "plain text",
            "with\ncontrol\u{0002}chars\u{000B}",
            "cafe\u{0301} and \u{FFFD} junk",
            "\u{0000}\u{0007}",
            "",
            "tabs\tand\nnewlines survive",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_no_surviving_control_chars() {
        let all_controls: String = (0u8..0x20)
            .chain(std::iter::once(0x7F))
            .map(|b| b as char)
            .collect();
        let result = sanitize(&all_controls);
        assert_eq!(result, "\t\n");
    }

    #[test]
    fn test_worst_case_empty() {
        assert_eq!(sanitize("\u{0000}\u{0001}\u{FFFD}"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_bytes_invalid_utf8() {
        // Invalid sequence in the middle is discarded, not fatal.
        let bytes = [b'o', b'k', 0xFF, 0xFE, b'a', b'y'];
        assert_eq!(sanitize_bytes(&bytes), "okay");
    }
}
