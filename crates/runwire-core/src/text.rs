//! UTF-8 safe truncation for log previews.
//!
//! Record payloads can be arbitrarily large and are not guaranteed to be valid
//! UTF-8 when they fail to decode, so anything that lands in a log field goes
//! through [`preview`] first.

use std::borrow::Cow;

/// Marker appended to a preview that was cut short.
pub const ELLIPSIS: &str = "…";

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char boundary.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Render raw payload bytes for a log field.
///
/// Invalid UTF-8 is replaced lossily. When the text exceeds `max_bytes`, it is
/// cut on a char boundary and [`ELLIPSIS`] is appended, so the result may be
/// up to `max_bytes + 3` bytes long.
pub fn preview(data: &[u8], max_bytes: usize) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(data);
    if text.len() <= max_bytes {
        return text;
    }
    let cut = truncate_str(&text, max_bytes);
    Cow::Owned(format!("{cut}{ELLIPSIS}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_str("data", 10), "data");
        assert_eq!(truncate_str("data", 4), "data");
    }

    #[test]
    fn cut_snaps_back_inside_multibyte_char() {
        // 'é' occupies bytes 3..5
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("café", 5), "café");
        // crab is 4 bytes at 2..6
        assert_eq!(truncate_str("hi🦀!", 5), "hi");
    }

    #[test]
    fn zero_budget() {
        assert_eq!(truncate_str("abc", 0), "");
    }

    #[test]
    fn preview_borrows_when_it_fits() {
        let p = preview(br#"{"id":"run_1"}"#, 100);
        assert!(matches!(p, Cow::Borrowed(_)));
        assert_eq!(p, r#"{"id":"run_1"}"#);
    }

    #[test]
    fn preview_appends_ellipsis() {
        assert_eq!(preview(b"rate_limit_exceeded", 4), "rate…");
    }

    #[test]
    fn preview_tolerates_invalid_utf8() {
        let p = preview(&[b'o', b'k', 0xFF, 0xFE], 100);
        assert!(p.starts_with("ok"));
        assert!(p.contains('\u{FFFD}'));
    }

    proptest! {
        #[test]
        fn truncation_is_a_char_boundary_prefix(s in ".{0,40}", max in 0usize..64) {
            let cut = truncate_str(&s, max);
            prop_assert!(cut.len() <= max);
            prop_assert!(s.starts_with(cut));
        }
    }
}
