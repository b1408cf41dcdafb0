//! Shared rendering engine underlying all four output formats (spec §4.10).
//!
//! Grounded on `original_source/src/render.c` (`S_cr`/`S_blankline`/`S_out`/
//! `cssg_render`) for the escape-aware, line-wrapping output primitives, and
//! on the teacher's `src/cm.rs` (`CommonMarkFormatter`) for how those
//! primitives are exposed to a Rust formatter as methods on a struct
//! implementing `io::Write`. Each per-format renderer (`html.rs`, `xml.rs`,
//! `man.rs`, `cm.rs`) owns an `Engine` and implements `NodeFormatter` rather
//! than reimplementing `cr`/`blankline`/wrapping from scratch, the way the
//! teacher currently does once per format.

use crate::nodes::AstNode;
use std::cmp::max;
use std::io::{self, Write};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Escaping {
    Literal,
    Normal,
    Url,
    Title,
}

/// The mutable rendering state threaded through a single document render:
/// output buffer, line prefix (for blockquote/list indentation), column
/// tracking for width-wrapping, and the deferred-newline counter.
pub struct Engine {
    pub buf: Vec<u8>,
    pub prefix: Vec<u8>,
    pub column: usize,
    pub width: usize,
    need_cr: u8,
    last_breakable: usize,
    pub begin_line: bool,
    pub begin_content: bool,
    pub no_linebreaks: bool,
    pub in_tight_list_item: bool,
    /// Per-node escape override, consulted before the normal escaping table
    /// (used by the CommonMark renderer's table-cell `|` escaping).
    pub custom_escape: Option<fn(u8) -> bool>,
}

impl Engine {
    pub fn new(width: usize) -> Self {
        Engine {
            buf: Vec::new(),
            prefix: Vec::new(),
            column: 0,
            width,
            need_cr: 0,
            last_breakable: 0,
            begin_line: true,
            begin_content: true,
            no_linebreaks: false,
            in_tight_list_item: false,
            custom_escape: None,
        }
    }

    /// Request a single line break before the next output, unless one is
    /// already pending.
    pub fn cr(&mut self) {
        self.need_cr = max(self.need_cr, 1);
    }

    /// Request a blank line before the next output.
    pub fn blankline(&mut self) {
        self.need_cr = max(self.need_cr, 2);
    }

    fn flush_need_cr(&mut self) {
        if self.in_tight_list_item && self.need_cr > 1 {
            self.need_cr = 1;
        }

        let mut k = self.buf.len() as isize - 1;
        while self.need_cr > 0 {
            if k < 0 || self.buf[k as usize] == b'\n' {
                k -= 1;
            } else {
                self.buf.push(b'\n');
                if self.need_cr > 1 {
                    let prefix = self.prefix.clone();
                    self.buf.extend_from_slice(&prefix);
                }
            }
            self.column = 0;
            self.last_breakable = 0;
            self.begin_line = true;
            self.begin_content = true;
            self.need_cr -= 1;
        }
    }

    /// Write `buf`, applying deferred line breaks, optional greedy
    /// word-wrap at `width`, and the escaping rules for `escaping`. This is
    /// the Rust shape of `S_out`/`cssg_render`'s per-character loop.
    pub fn output(&mut self, buf: &[u8], wrap: bool, escaping: Escaping) {
        let wrap = wrap && !self.no_linebreaks;
        self.flush_need_cr();

        let mut i = 0;
        while i < buf.len() {
            if self.begin_line {
                let prefix = self.prefix.clone();
                self.buf.extend_from_slice(&prefix);
                self.column = self.prefix.len();
            }

            let c = buf[i];
            let nextc = buf.get(i + 1).copied();

            if c == b' ' && wrap {
                if !self.begin_line {
                    let last_nonspace = self.buf.len();
                    self.buf.push(b' ');
                    self.column += 1;
                    self.begin_line = false;
                    self.begin_content = false;
                    while buf.get(i + 1) == Some(&b' ') {
                        i += 1;
                    }
                    if !buf.get(i + 1).map(|&c| c.is_ascii_digit()).unwrap_or(false) {
                        self.last_breakable = last_nonspace;
                    }
                }
            } else if escaping == Escaping::Literal {
                if c == b'\n' {
                    self.buf.push(b'\n');
                    self.column = 0;
                    self.begin_line = true;
                    self.begin_content = true;
                    self.last_breakable = 0;
                } else {
                    self.buf.push(c);
                    self.column += 1;
                    self.begin_line = false;
                    self.begin_content = self.begin_content && c.is_ascii_digit();
                }
            } else {
                self.outc(c, escaping, nextc);
                self.begin_line = false;
                self.begin_content = self.begin_content && c.is_ascii_digit();
            }

            if self.width > 0 && self.column > self.width && !self.begin_line && self.last_breakable > 0 {
                let remainder = self.buf[self.last_breakable + 1..].to_vec();
                self.buf.truncate(self.last_breakable);
                self.buf.push(b'\n');
                let prefix = self.prefix.clone();
                self.buf.extend_from_slice(&prefix);
                self.buf.extend_from_slice(&remainder);
                self.column = self.prefix.len() + remainder.len();
                self.last_breakable = 0;
                self.begin_line = false;
                self.begin_content = false;
            }

            i += 1;
        }
    }

    /// Emit one already-escape-checked byte, applying the CommonMark
    /// round-trip escaping table (used by `Escaping::Normal`/`Url`/`Title`).
    fn outc(&mut self, c: u8, escaping: Escaping, nextc: Option<u8>) {
        let follows_digit = self.buf.last().map(|&b| b.is_ascii_digit()).unwrap_or(false);
        let nextc = nextc.unwrap_or(0);

        let custom_hit = self.custom_escape.map(|f| f(c)).unwrap_or(false);

        let needs_escaping = c < 0x80
            && escaping != Escaping::Literal
            && (custom_hit
                || (escaping == Escaping::Normal
                    && (c < 0x20
                        || c == b'*'
                        || c == b'_'
                        || c == b'['
                        || c == b']'
                        || c == b'#'
                        || c == b'<'
                        || c == b'>'
                        || c == b'\\'
                        || c == b'`'
                        || c == b'!'
                        || (c == b'&' && nextc.is_ascii_alphabetic())
                        || (c == b'!' && nextc == b'[')
                        || (self.begin_content && matches!(c, b'-' | b'+' | b'=') && !follows_digit)
                        || (self.begin_content
                            && matches!(c, b'.' | b')')
                            && follows_digit
                            && (nextc == 0 || nextc.is_ascii_whitespace()))))
                || (escaping == Escaping::Url
                    && (c == b'`' || c == b'<' || c == b'>' || c.is_ascii_whitespace() || c == b'\\' || c == b')' || c == b'('))
                || (escaping == Escaping::Title
                    && (c == b'`' || c == b'<' || c == b'>' || c == b'"' || c == b'\\')));

        if needs_escaping {
            if escaping == Escaping::Url && c.is_ascii_whitespace() {
                write!(self.buf, "%{:02X}", c).unwrap();
                self.column += 3;
            } else if c.is_ascii_punctuation() {
                self.buf.push(b'\\');
                self.buf.push(c);
                self.column += 2;
            } else {
                let s = format!("&#{};", c);
                self.buf.extend_from_slice(s.as_bytes());
                self.column += s.len();
            }
        } else {
            self.buf.push(c);
            self.column += 1;
        }
    }

    /// Append raw ASCII text without touching the column tracker's
    /// newline-awareness (caller guarantees no embedded `\n`).
    pub fn ascii(&mut self, s: &str) {
        let before = self.buf.len();
        self.buf.extend_from_slice(s.as_bytes());
        self.column += self.buf.len() - before;
    }

    /// Guarantee the buffer ends with exactly one trailing newline, then
    /// hand back the finished bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.buf.last() != Some(&b'\n') {
            self.buf.push(b'\n');
        }
        std::mem::take(&mut self.buf)
    }
}

impl Write for Engine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output(buf, false, Escaping::Literal);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Implemented by each per-format renderer. `format_node` is called once on
/// enter and, if it returned `true`, again on exit after the node's
/// children have been visited — mirroring `cssg_render`'s `render_node`
/// return value, which the C renderer uses to skip a node's subtree (e.g.
/// an autolink's single text child) by resetting the iterator straight to
/// EXIT.
pub trait NodeFormatter<'a> {
    fn engine(&mut self) -> &mut Engine;

    /// Called with `entering = true`, then (unless this returns `false`)
    /// with `entering = false` after descending into children.
    fn format_node(&mut self, node: &'a AstNode<'a>, entering: bool) -> bool;

    /// Depth-first render driven by an explicit enter/exit stack (rather
    /// than `crate::iter::NodeIter`, since skip-children here is a local
    /// decision per call rather than a property of the node kind).
    fn format(&mut self, root: &'a AstNode<'a>) {
        enum Phase {
            Pre,
            Post,
        }
        let mut stack = vec![(root, Phase::Pre)];

        while let Some((node, phase)) = stack.pop() {
            match phase {
                Phase::Pre => {
                    if self.format_node(node, true) {
                        stack.push((node, Phase::Post));
                        for ch in node.reverse_children() {
                            stack.push((ch, Phase::Pre));
                        }
                    }
                }
                Phase::Post => {
                    self.format_node(node, false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cr_then_output_inserts_exactly_one_newline() {
        let mut e = Engine::new(0);
        e.output(b"foo", false, Escaping::Literal);
        e.cr();
        e.output(b"bar", false, Escaping::Literal);
        assert_eq!(e.buf, b"foo\nbar");
    }

    #[test]
    fn blankline_forces_two_newlines() {
        let mut e = Engine::new(0);
        e.output(b"foo", false, Escaping::Literal);
        e.blankline();
        e.output(b"bar", false, Escaping::Literal);
        assert_eq!(e.buf, b"foo\n\nbar");
    }

    #[test]
    fn finish_adds_trailing_newline_once() {
        let mut e = Engine::new(0);
        e.output(b"foo", false, Escaping::Literal);
        assert_eq!(e.finish(), b"foo\n");

        let mut e2 = Engine::new(0);
        e2.output(b"foo\n", false, Escaping::Literal);
        assert_eq!(e2.finish(), b"foo\n");
    }

    #[test]
    fn normal_escaping_backslash_escapes_punctuation() {
        let mut e = Engine::new(0);
        e.output(b"a*b", false, Escaping::Normal);
        assert_eq!(e.buf, b"a\\*b");
    }

    #[test]
    fn wrap_breaks_at_last_space_before_width() {
        let mut e = Engine::new(5);
        e.output(b"abc def ghi", true, Escaping::Literal);
        assert!(e.buf.contains(&b'\n'));
    }
}
