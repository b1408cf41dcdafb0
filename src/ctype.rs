//! Locale-independent byte character classes.
//!
//! A 256-entry table classifies every byte as whitespace, ASCII punctuation,
//! digit, alpha, or other, matching CommonMark's definition of each class
//! rather than the current C locale.

#[rustfmt::skip]
const CTYPE_CLASS: [u8; 256] = [
    /*      0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f */
    /* 0 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0,
    /* 1 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* 2 */ 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    /* 3 */ 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2,
    /* 4 */ 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    /* 5 */ 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 2, 2, 2, 2, 2,
    /* 6 */ 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    /* 7 */ 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 2, 2, 2, 2, 0,
    /* 8 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* 9 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* a */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* b */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* c */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* d */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* e */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* f */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

pub fn isspace(ch: u8) -> bool {
    CTYPE_CLASS[ch as usize] == 1
}

pub fn ispunct(ch: u8) -> bool {
    CTYPE_CLASS[ch as usize] == 2
}

pub fn isdigit(ch: u8) -> bool {
    CTYPE_CLASS[ch as usize] == 3
}

pub fn isalpha(ch: u8) -> bool {
    CTYPE_CLASS[ch as usize] == 4
}

pub fn isalnum(ch: u8) -> bool {
    let c = CTYPE_CLASS[ch as usize];
    c == 3 || c == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_whitespace() {
        for &b in b" \t\n\x0b\x0c\r" {
            assert!(isspace(b), "{b:?} should be whitespace");
        }
        assert!(!isspace(b'a'));
    }

    #[test]
    fn classifies_punctuation() {
        assert!(ispunct(b'!'));
        assert!(ispunct(b'~'));
        assert!(!ispunct(b'a'));
        assert!(!ispunct(b'5'));
    }

    #[test]
    fn classifies_digits_and_alpha() {
        assert!(isdigit(b'0') && isdigit(b'9'));
        assert!(isalpha(b'a') && isalpha(b'Z'));
        assert!(isalnum(b'5') && isalnum(b'q'));
        assert!(!isalnum(b'!'));
    }
}
