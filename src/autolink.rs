//! Strict autolink grammar: `<scheme:destination>` and `<user@host>` inside
//! angle brackets (spec §4.9). This deliberately does not implement the
//! teacher's `www.`/bare-URL/`@` extension matching (`examples/kivikakk-comrak/src/autolink.rs`,
//! which scans arbitrary surrounding text for GFM extended autolinks) —
//! that scans *unbracketed* text and is out of scope here. `scanners::scheme`
//! supplies the scheme grammar both share.

use crate::ctype::isalnum;
use crate::scanners;

/// Recognize a `<scheme:...>` autolink starting right after the opening
/// `<`. `text` is everything up to (not including) the matching `>`.
/// Content must contain no ASCII control characters, spaces, `<`, or `>`.
pub fn is_uri_autolink(text: &[u8]) -> bool {
    let Some(colon_end) = scanners::scheme(text) else {
        return false;
    };
    text[colon_end..]
        .iter()
        .all(|&c| c >= 0x20 && c != 0x7f && c != b'<' && c != b'>')
}

/// Recognize a `<user@host>` email autolink per the CommonMark grammar:
/// `[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@` followed by one or more
/// dot-separated labels of `[a-zA-Z0-9]` optionally hyphenated, each at
/// most 63 characters.
pub fn is_email_autolink(text: &[u8]) -> bool {
    let Some(at) = text.iter().position(|&c| c == b'@') else {
        return false;
    };
    if at == 0 {
        return false;
    }
    if !text[..at].iter().all(is_email_local_char) {
        return false;
    }

    let domain = &text[at + 1..];
    if domain.is_empty() {
        return false;
    }
    domain.split(|&c| c == b'.').all(is_valid_label) && domain.contains(&b'.')
        || (domain.split(|&c| c == b'.').count() == 1 && is_valid_label(domain))
}

fn is_email_local_char(&c: &u8) -> bool {
    isalnum(c) || matches!(c, b'.' | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'/' | b'=' | b'?' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~' | b'-')
}

fn is_valid_label(label: &[u8]) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label[0] == b'-' || label[label.len() - 1] == b'-' {
        return false;
    }
    label.iter().all(|&c| isalnum(c) || c == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_uri_autolink() {
        assert!(is_uri_autolink(b"https://example.com/path"));
        assert!(is_uri_autolink(b"mailto:foo@example.com"));
        assert!(!is_uri_autolink(b"not a scheme"));
        assert!(!is_uri_autolink(b"http://a b"));
    }

    #[test]
    fn recognizes_email_autolink() {
        assert!(is_email_autolink(b"foo@bar.com"));
        assert!(is_email_autolink(b"foo.bar+baz@sub.example.com"));
        assert!(!is_email_autolink(b"@bar.com"));
        assert!(!is_email_autolink(b"foo@"));
        assert!(!is_email_autolink(b"foo@-bar.com"));
    }
}
