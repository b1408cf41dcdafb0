//! HTML entity decoding: named entities (via the generated table in
//! `entitydata.rs`, built from the `entities` crate), decimal `&#...;`, and
//! hex `&#x...;` references (spec §4.9).

use crate::ctype::isdigit;
use std::char;
use std::cmp::min;

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

pub const ENTITY_MIN_LENGTH: usize = 2;
pub const ENTITY_MAX_LENGTH: usize = 31;

fn isxdigit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

/// Attempt to decode one entity reference at the start of `text` (the bytes
/// immediately following the `&`). Returns the decoded UTF-8 bytes and the
/// number of input bytes consumed (including the trailing `;`), or `None`.
pub fn unescape(text: &[u8]) -> Option<(Vec<u8>, usize)> {
    if text.len() >= 3 && text[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i;

        let num_digits = if text.len() > 1 && isdigit(text[1]) {
            i = 1;
            while i < text.len() && isdigit(text[i]) {
                codepoint = codepoint.saturating_mul(10).saturating_add((text[i] - b'0') as u32);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if text.len() > 1 && (text[1] == b'x' || text[1] == b'X') {
            i = 2;
            while i < text.len() && isxdigit(text[i]) {
                let digit = (text[i] as char).to_digit(16).unwrap();
                codepoint = codepoint.saturating_mul(16).saturating_add(digit);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if num_digits >= 1 && num_digits <= 8 && i < text.len() && text[i] == b';' {
            if codepoint == 0 || (0xD800..=0xDFFF).contains(&codepoint) || codepoint >= 0x110000 {
                codepoint = 0xFFFD;
            }
            return Some((
                char::from_u32(codepoint)
                    .unwrap_or('\u{FFFD}')
                    .to_string()
                    .into_bytes(),
                i + 1,
            ));
        }
    }

    let size = min(text.len(), ENTITY_MAX_LENGTH);
    for (i, &b) in text.iter().enumerate().take(size) {
        if b == b' ' {
            return None;
        }
        if b == b';' {
            if i + 1 < ENTITY_MIN_LENGTH {
                return None;
            }
            return lookup(&text[..i]).map(|e| (e.to_vec(), i + 1));
        }
    }

    None
}

fn lookup(name: &[u8]) -> Option<&'static [u8]> {
    let name = std::str::from_utf8(name).ok()?;
    let idx = TRANSLATED_ENTITIES
        .binary_search_by(|&(k, _)| k.cmp(name))
        .ok()?;
    Some(TRANSLATED_ENTITIES[idx].1.as_bytes())
}

/// Decode every entity reference in `src`, leaving non-entity `&` bytes and
/// all other content untouched.
pub fn unescape_html(src: &[u8]) -> Vec<u8> {
    let size = src.len();
    let mut i = 0;
    let mut v = Vec::with_capacity(size);

    while i < size {
        let org = i;
        while i < size && src[i] != b'&' {
            i += 1;
        }

        if i > org {
            if org == 0 && i >= size {
                return src.to_vec();
            }
            v.extend_from_slice(&src[org..i]);
        }

        if i >= size {
            return v;
        }

        i += 1;
        match unescape(&src[i..]) {
            Some((chs, consumed)) => {
                v.extend_from_slice(&chs);
                i += consumed;
            }
            None => v.push(b'&'),
        }
    }

    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entity() {
        assert_eq!(unescape_html(b"&amp;"), b"&");
        assert_eq!(unescape_html(b"&nbsp;"), "\u{a0}".as_bytes());
    }

    #[test]
    fn decodes_decimal_and_hex() {
        assert_eq!(unescape_html(b"&#65;"), b"A");
        assert_eq!(unescape_html(b"&#x41;"), b"A");
    }

    #[test]
    fn substitutes_replacement_character_for_invalid_codepoints() {
        assert_eq!(unescape_html(b"&#0;"), "\u{fffd}".as_bytes());
        assert_eq!(unescape_html(b"&#xD800;"), "\u{fffd}".as_bytes());
        assert_eq!(unescape_html(b"&#x10FFFF;"), "\u{10ffff}".as_bytes());
    }

    #[test]
    fn leaves_unmatched_ampersand_literal() {
        assert_eq!(unescape_html(b"&#;"), b"&#;");
        assert_eq!(unescape_html(b"&notanentity;"), b"&notanentity;");
    }
}
