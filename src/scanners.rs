//! Byte-level recognizers for block-starting constructs and a handful of
//! inline/URL grammars (spec §4.3/§4.7/§4.9).
//!
//! The retrieved snapshot of the teacher's own `scanners.rs` is generated
//! from a `re2c`/`pest` grammar file that isn't present anywhere in this
//! crate's dependency tree (the teacher's `Cargo.toml` carries neither
//! `pest` nor `twoway`), so rather than reproduce an unbuildable grammar
//! file, these are hand-written byte scanners following the same line-start
//! matching style as `cssg_ctype.c`/the block-opening rules implied by
//! `original_source/src/cssg.h`'s node kinds. Each function takes a line
//! (or line suffix) and returns the byte length of the match, if any.

use crate::ctype::{isalpha, isdigit, isspace};

/// A line consisting only of up to three leading spaces, then three or more
/// of the same `*`, `-`, or `_`, optionally interspersed with spaces/tabs,
/// and nothing else.
pub fn thematic_break(line: &[u8]) -> bool {
    let mut i = 0;
    let mut spaces = 0;
    while i < line.len() && line[i] == b' ' && spaces < 3 {
        i += 1;
        spaces += 1;
    }
    if i >= line.len() {
        return false;
    }
    let marker = line[i];
    if marker != b'*' && marker != b'-' && marker != b'_' {
        return false;
    }

    let mut count = 0;
    while i < line.len() {
        match line[i] {
            c if c == marker => count += 1,
            b' ' | b'\t' => (),
            b'\r' | b'\n' => break,
            _ => return false,
        }
        i += 1;
    }
    count >= 3
}

/// `#`{1,6} followed by a space/tab or end of line; returns the heading
/// level and the byte offset where the content begins.
pub fn atx_heading_start(line: &[u8]) -> Option<(u32, usize)> {
    let mut i = 0;
    while i < line.len() && line[i] == b'#' {
        i += 1;
    }
    if i == 0 || i > 6 {
        return None;
    }
    if i < line.len() && !isspace(line[i]) && line[i] != b'\r' && line[i] != b'\n' {
        return None;
    }
    Some((i as u32, i))
}

/// `=`+ or `-`+ (only one marker type per line) followed by optional
/// trailing whitespace: a setext heading underline. Returns the level (1
/// for `=`, 2 for `-`).
pub fn setext_heading_line(line: &[u8]) -> Option<u32> {
    if line.is_empty() {
        return None;
    }
    let marker = line[0];
    let level = match marker {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let mut i = 0;
    while i < line.len() && line[i] == marker {
        i += 1;
    }
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    if i < line.len() && line[i] != b'\r' && line[i] != b'\n' {
        return None;
    }
    Some(level)
}

/// An opening code fence: three or more backtick or tilde characters.
/// Returns `(fence_char, length)`.
pub fn open_code_fence(line: &[u8]) -> Option<(u8, usize)> {
    if line.is_empty() {
        return None;
    }
    let marker = line[0];
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let mut i = 0;
    while i < line.len() && line[i] == marker {
        i += 1;
    }
    if i < 3 {
        return None;
    }
    if marker == b'`' && line[i..].contains(&b'`') {
        return None;
    }
    Some((marker, i))
}

/// A closing code fence: at least as many of the same fence character as
/// `fence_char`/`fence_length`, with only spaces/tabs before and after.
pub fn close_code_fence(line: &[u8], fence_char: u8, fence_length: usize) -> bool {
    let mut i = 0;
    while i < line.len() && line[i] == b' ' && i < 3 {
        i += 1;
    }
    let start = i;
    while i < line.len() && line[i] == fence_char {
        i += 1;
    }
    if i - start < fence_length {
        return false;
    }
    while i < line.len() {
        match line[i] {
            b' ' | b'\t' => i += 1,
            b'\r' | b'\n' => break,
            _ => return false,
        }
    }
    true
}

/// A valid autolink/fence scheme: `[a-zA-Z][a-zA-Z0-9+.-]{1,31}` followed
/// by `:`. Returns the byte length including the trailing colon.
pub fn scheme(text: &[u8]) -> Option<usize> {
    if text.is_empty() || !isalpha(text[0]) {
        return None;
    }
    let mut i = 1;
    while i < text.len() && i < 32 && (isalpha(text[i]) || isdigit(text[i]) || matches!(text[i], b'+' | b'.' | b'-')) {
        i += 1;
    }
    if i < 2 || i >= text.len() || text[i] != b':' {
        return None;
    }
    Some(i + 1)
}

const DANGEROUS_SCHEMES: [&[u8]; 3] = [b"javascript:", b"vbscript:", b"file:"];
const DATA_IMAGE_SAFE: [&[u8]; 4] = [b"data:image/png", b"data:image/gif", b"data:image/jpeg", b"data:image/webp"];

/// Whether `url` is a link destination this renderer refuses to emit
/// unescaped under the default safe mode: `javascript:`, `vbscript:`,
/// `file:` unconditionally, and `data:` except for a handful of image MIME
/// types (`data:image/png`, `data:image/gif`, `data:image/jpeg`,
/// `data:image/webp`, with or without a `;base64` or other parameter before
/// the payload's leading comma).
pub fn dangerous_url(url: &[u8]) -> bool {
    let lower: Vec<u8> = url.iter().map(|b| b.to_ascii_lowercase()).collect();

    for scheme in DANGEROUS_SCHEMES {
        if lower.starts_with(scheme) {
            return true;
        }
    }

    if lower.starts_with(b"data:") {
        return !DATA_IMAGE_SAFE.iter().any(|safe| lower.starts_with(safe));
    }

    false
}

/// The seven HTML-block start conditions (CommonMark's "type 1" through
/// "type 7"); returns the 1-based condition number that matched.
pub fn html_block_start(line: &[u8]) -> Option<u8> {
    if line.first() != Some(&b'<') {
        return None;
    }
    let rest = &line[1..];
    let lower = || String::from_utf8_lossy(rest).to_lowercase();

    for tag in ["script", "pre", "style", "textarea"] {
        if starts_with_tag(rest, tag) {
            return Some(1);
        }
    }
    if rest.starts_with(b"!--") {
        return Some(2);
    }
    if rest.first() == Some(&b'?') {
        return Some(3);
    }
    if rest.first() == Some(&b'!') && rest.get(1).map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        return Some(4);
    }
    if rest.starts_with(b"![CDATA[") {
        return Some(5);
    }

    const BLOCK_TAGS: [&str; 45] = [
        "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption",
        "center", "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt",
        "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2",
        "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link",
        "main", "menu", "menuitem", "nav", "noframes", "ol",
    ];
    let lc = lower();
    let mut i = 1;
    if lc.as_bytes().first() == Some(&b'/') {
        i = 2;
    }
    let after_slash = &lc[i - 1..];
    for tag in BLOCK_TAGS {
        if after_slash.starts_with(tag) {
            let j = tag.len();
            let boundary = after_slash.as_bytes().get(j).copied();
            if boundary.is_none()
                || boundary.map(|c| isspace(c) || c == b'>').unwrap_or(false)
                || (boundary == Some(b'/') && after_slash.as_bytes().get(j + 1) == Some(&b'>'))
            {
                return Some(6);
            }
        }
    }

    // Type 7: a complete open or closing tag (with nothing else on the
    // line), for any tag name not matched above.
    if is_html_tag_line(rest) {
        return Some(7);
    }

    None
}

fn starts_with_tag(rest: &[u8], tag: &str) -> bool {
    if rest.len() < tag.len() {
        return false;
    }
    if !rest[..tag.len()].eq_ignore_ascii_case(tag.as_bytes()) {
        return false;
    }
    match rest.get(tag.len()) {
        None => true,
        Some(&c) => isspace(c) || c == b'>' || c == b'\t',
    }
}

fn is_html_tag_line(rest: &[u8]) -> bool {
    let mut i = 0;
    let closing = rest.first() == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < rest.len() && (isalpha(rest[i]) || isdigit(rest[i]) || rest[i] == b'-') {
        i += 1;
    }
    if i == name_start {
        return false;
    }
    if !closing {
        loop {
            while i < rest.len() && isspace(rest[i]) {
                i += 1;
            }
            if rest.get(i) == Some(&b'/') {
                i += 1;
                break;
            }
            if i >= rest.len() || !isalpha(rest[i]) {
                break;
            }
            while i < rest.len() && (isalpha(rest[i]) || isdigit(rest[i]) || rest[i] == b'-') {
                i += 1;
            }
            if rest.get(i) == Some(&b'=') {
                i += 1;
                match rest.get(i) {
                    Some(b'"') => {
                        i += 1;
                        while i < rest.len() && rest[i] != b'"' {
                            i += 1;
                        }
                        i += 1;
                    }
                    Some(b'\'') => {
                        i += 1;
                        while i < rest.len() && rest[i] != b'\'' {
                            i += 1;
                        }
                        i += 1;
                    }
                    _ => {
                        while i < rest.len() && !isspace(rest[i]) && rest[i] != b'>' {
                            i += 1;
                        }
                    }
                }
            }
        }
    }
    while i < rest.len() && isspace(rest[i]) {
        i += 1;
    }
    rest.get(i) == Some(&b'>') && matches!(rest.get(i + 1), None | Some(b'\r') | Some(b'\n'))
}

/// The HTML-block end condition corresponding to a start `condition`
/// (CommonMark only distinguishes these for conditions 1-5; 6 and 7 end at
/// the first blank line, handled by the block parser directly).
pub fn html_block_end(condition: u8, line: &[u8]) -> bool {
    let lower = String::from_utf8_lossy(line).to_lowercase();
    match condition {
        1 => lower.contains("</script>") || lower.contains("</pre>") || lower.contains("</style>") || lower.contains("</textarea>"),
        2 => lower.contains("-->"),
        3 => lower.contains("?>"),
        4 => line.contains(&b'>'),
        5 => lower.contains("]]>"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thematic_break_accepts_mixed_spacing() {
        assert!(thematic_break(b"***"));
        assert!(thematic_break(b"- - -"));
        assert!(thematic_break(b"___"));
        assert!(!thematic_break(b"--"));
        assert!(!thematic_break(b"** *a"));
    }

    #[test]
    fn atx_heading_start_requires_space_or_eol_after_hashes() {
        assert_eq!(atx_heading_start(b"## hi"), Some((2, 2)));
        assert_eq!(atx_heading_start(b"###"), Some((3, 3)));
        assert_eq!(atx_heading_start(b"####### too many"), None);
        assert_eq!(atx_heading_start(b"#hi"), None);
    }

    #[test]
    fn setext_heading_line_distinguishes_level() {
        assert_eq!(setext_heading_line(b"==="), Some(1));
        assert_eq!(setext_heading_line(b"---"), Some(2));
        assert_eq!(setext_heading_line(b"=-="), None);
    }

    #[test]
    fn code_fence_open_and_close_roundtrip() {
        let (ch, len) = open_code_fence(b"```rust").unwrap();
        assert_eq!((ch, len), (b'`', 3));
        assert!(close_code_fence(b"```", ch, len));
        assert!(close_code_fence(b"````", ch, len));
        assert!(!close_code_fence(b"``", ch, len));
    }

    #[test]
    fn scheme_matches_known_form() {
        assert_eq!(scheme(b"https:"), Some(6));
        assert_eq!(scheme(b"a:"), None);
    }

    #[test]
    fn dangerous_url_flags_script_and_unsafe_data() {
        assert!(dangerous_url(b"javascript:alert(1)"));
        assert!(dangerous_url(b"data:text/html,bad"));
        assert!(!dangerous_url(b"data:image/png,ok"));
        assert!(!dangerous_url(b"https://example.com"));
    }

    #[test]
    fn dangerous_url_allows_base64_encoded_data_images() {
        assert!(!dangerous_url(b"data:image/png;base64,iVBORw0KGgoAAAANSU="));
        assert!(!dangerous_url(b"data:image/webp;base64,UklGRg=="));
        assert!(dangerous_url(b"data:image/svg+xml;base64,PHN2Zz4="));
    }

    #[test]
    fn html_block_start_detects_script_and_comment() {
        assert_eq!(html_block_start(b"<script>"), Some(1));
        assert_eq!(html_block_start(b"<!-- c -->"), Some(2));
        assert_eq!(html_block_start(b"<div>"), Some(6));
    }
}
