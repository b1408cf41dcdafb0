//! The inline parser: a single left-to-right token pass building a flat
//! child list plus a delimiter/bracket stack. Matched brackets are spliced
//! into `Link`/`Image` wrappers as soon as they close; matched delimiter runs
//! are spliced into `Emph`/`Strong` wrappers by `process_emphasis`, which runs
//! once per closed bracket (bounded to the delimiters opened since that
//! bracket, via `Bracket::previous_delimiter`) and once more over the whole
//! stack after the paragraph/heading's token pass finishes, so emphasis can
//! never pair across a link/image boundary that's already been resolved
//! (spec §4.6, §4.7, §4.8, §4.9).
//!
//! Grounded on `examples/kivikakk-comrak/src/inlines.rs`'s `Subject`
//! (`scan_delims`, `push_bracket`, `handle_close_bracket`), reworked against
//! [`crate::remstack::RemStack`] instead of the teacher's arena + `Cell`
//! doubly-linked delimiter list, and against this crate's `Vec<u8>`-based
//! `ReferenceMap` instead of `Cow`/`FxHashMap`. The teacher's GFM extensions
//! reachable from this file (footnote references, the broken-link-callback
//! hook, autolink-without-brackets, strikethrough) are not ported.

use super::options::Options;
use crate::arena_tree::Node;
use crate::autolink;
use crate::character_set::character_set;
use crate::ctype;
use crate::entity;
use crate::nodes::{make_block, AstNode, NodeLink, NodeValue};
use crate::reference::{ReferenceMap, MAX_LINK_LABEL_LENGTH};
use crate::remstack::RemStack;
use crate::strings;
use std::cell::RefCell;
use typed_arena::Arena;
use unicode_categories::UnicodeCategories;

const SPECIAL_BYTES: [bool; 256] = character_set!(b"\n\r\\`&<*_[]!'\"");

struct Delim<'a> {
    inl: &'a AstNode<'a>,
    delim_char: u8,
    can_open: bool,
    can_close: bool,
    length: usize,
}

struct Bracket<'a> {
    inl_text: &'a AstNode<'a>,
    position: usize,
    image: bool,
    active: bool,
    bracket_after: bool,
    /// Index of the topmost delimiter already on the stack when this
    /// bracket was opened, or `-1` if the stack was empty. Bounds the
    /// emphasis pass run when this bracket resolves, so emphasis can't
    /// pair across the bracket's own boundary.
    previous_delimiter: isize,
}

struct Subject<'a, 'i, 'r> {
    arena: &'a Arena<AstNode<'a>>,
    input: &'i [u8],
    pos: usize,
    line: u32,
    delimiters: RemStack<Delim<'a>>,
    brackets: Vec<Bracket<'a>>,
    refmap: &'r mut ReferenceMap,
    options: &'r Options,
}

/// Parse `content` (a paragraph's or heading's raw, unescaped text) into
/// inline children appended to `node`.
pub fn parse_inlines<'a>(
    arena: &'a Arena<AstNode<'a>>,
    node: &'a AstNode<'a>,
    content: &[u8],
    start_line: u32,
    _start_column: u32,
    refmap: &mut ReferenceMap,
    options: &Options,
) {
    let mut subject = Subject {
        arena,
        input: content,
        pos: 0,
        line: start_line,
        delimiters: RemStack::new(),
        brackets: Vec::new(),
        refmap,
        options,
    };

    while subject.pos < subject.input.len() {
        subject.parse_inline(node);
    }

    subject.process_emphasis(-1);
    crate::iter::consolidate_text_nodes(node);
}

impl<'a, 'i, 'r> Subject<'a, 'i, 'r> {
    fn make_inline(&mut self, value: NodeValue) -> &'a AstNode<'a> {
        self.arena.alloc(Node::new(RefCell::new(make_block(value, self.line, 0))))
    }

    fn append_literal_byte(&mut self, node: &'a AstNode<'a>, c: u8) {
        let n = self.make_inline(NodeValue::Text(vec![c]));
        node.append(n);
        self.pos += 1;
    }

    fn parse_inline(&mut self, node: &'a AstNode<'a>) {
        let c = self.input[self.pos];
        match c {
            b'\n' | b'\r' => self.handle_newline(node),
            b'\\' => self.handle_backslash(node),
            b'`' => self.handle_backticks(node),
            b'&' => self.handle_entity(node),
            b'<' => self.handle_pointy_brace(node),
            b'*' | b'_' => self.handle_delim(node, c),
            b'\'' | b'"' => {
                if self.options.parse.smart {
                    self.handle_delim(node, c);
                } else {
                    self.append_literal_byte(node, c);
                }
            }
            b'!' => {
                if self.input.get(self.pos + 1) == Some(&b'[') {
                    self.pos += 1;
                    self.handle_open_bracket(node, true);
                } else {
                    self.append_literal_byte(node, b'!');
                }
            }
            b'[' => self.handle_open_bracket(node, false),
            b']' => self.handle_close_bracket(node),
            _ => self.handle_text_run(node),
        }
    }

    fn consume_line_ending(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\r' {
                self.pos += 1;
                if self.input.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
            } else if self.input[self.pos] == b'\n' {
                self.pos += 1;
            }
        }
        while self.pos < self.input.len() && matches!(self.input[self.pos], b' ' | b'\t') {
            self.pos += 1;
        }
        self.line += 1;
    }

    fn handle_newline(&mut self, node: &'a AstNode<'a>) {
        let mut hard = false;
        if let Some(last) = node.last_child() {
            if let NodeValue::Text(ref mut t) = last.data.borrow_mut().value {
                let trailing_spaces = t.iter().rev().take_while(|&&b| b == b' ').count();
                if trailing_spaces >= 2 {
                    hard = true;
                }
                let new_len = t.len() - trailing_spaces;
                t.truncate(new_len);
            }
        }
        let value = if hard { NodeValue::LineBreak } else { NodeValue::SoftBreak };
        let n = self.make_inline(value);
        node.append(n);
        self.consume_line_ending();
    }

    fn handle_backslash(&mut self, node: &'a AstNode<'a>) {
        self.pos += 1;
        if self.pos < self.input.len() && matches!(self.input[self.pos], b'\n' | b'\r') {
            let n = self.make_inline(NodeValue::LineBreak);
            node.append(n);
            self.consume_line_ending();
            return;
        }
        if self.pos < self.input.len() && ctype::ispunct(self.input[self.pos]) {
            let n = self.make_inline(NodeValue::Text(vec![self.input[self.pos]]));
            node.append(n);
            self.pos += 1;
        } else {
            let n = self.make_inline(NodeValue::Text(b"\\".to_vec()));
            node.append(n);
        }
    }

    fn handle_backticks(&mut self, node: &'a AstNode<'a>) {
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos] == b'`' {
            self.pos += 1;
        }
        let opener_len = self.pos - start;

        let mut search = self.pos;
        loop {
            if search >= self.input.len() {
                let n = self.make_inline(NodeValue::Text(self.input[start..self.pos].to_vec()));
                node.append(n);
                return;
            }
            if self.input[search] != b'`' {
                search += 1;
                continue;
            }
            let run_start = search;
            while search < self.input.len() && self.input[search] == b'`' {
                search += 1;
            }
            if search - run_start != opener_len {
                continue;
            }

            let mut content = self.input[self.pos..run_start].to_vec();
            for b in content.iter_mut() {
                if *b == b'\n' || *b == b'\r' {
                    *b = b' ';
                }
            }
            if content.len() >= 2
                && content[0] == b' '
                && content[content.len() - 1] == b' '
                && content.iter().any(|&b| b != b' ')
            {
                content = content[1..content.len() - 1].to_vec();
            }
            let n = self.make_inline(NodeValue::Code(content));
            node.append(n);
            self.pos = search;
            return;
        }
    }

    fn handle_entity(&mut self, node: &'a AstNode<'a>) {
        self.pos += 1;
        if let Some((decoded, consumed)) = entity::unescape(&self.input[self.pos..]) {
            let n = self.make_inline(NodeValue::Text(decoded));
            node.append(n);
            self.pos += consumed;
        } else {
            let n = self.make_inline(NodeValue::Text(b"&".to_vec()));
            node.append(n);
        }
    }

    fn handle_pointy_brace(&mut self, node: &'a AstNode<'a>) {
        let rest = &self.input[self.pos + 1..];
        if let Some(end) = rest.iter().position(|&c| c == b'>') {
            let candidate = &rest[..end];
            if autolink::is_uri_autolink(candidate) {
                let link = self.make_inline(NodeValue::Link(NodeLink { url: candidate.to_vec(), title: Vec::new() }));
                let text = self.make_inline(NodeValue::Text(candidate.to_vec()));
                link.append(text);
                node.append(link);
                self.pos += 1 + end + 1;
                return;
            }
            if autolink::is_email_autolink(candidate) {
                let mut url = b"mailto:".to_vec();
                url.extend_from_slice(candidate);
                let link = self.make_inline(NodeValue::Link(NodeLink { url, title: Vec::new() }));
                let text = self.make_inline(NodeValue::Text(candidate.to_vec()));
                link.append(text);
                node.append(link);
                self.pos += 1 + end + 1;
                return;
            }
        }

        if let Some(len) = scan_inline_html_tag(&self.input[self.pos..]) {
            let n = self.make_inline(NodeValue::HtmlInline(self.input[self.pos..self.pos + len].to_vec()));
            node.append(n);
            self.pos += len;
            return;
        }

        self.append_literal_byte(node, b'<');
    }

    fn scan_delims(&mut self, c: u8) -> (bool, bool, usize) {
        let before = if self.pos == 0 { None } else { char_before(self.input, self.pos) };
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos] == c {
            self.pos += 1;
        }
        let length = self.pos - start;
        let after = char_at(self.input, self.pos);

        let after_is_ws = after.map(|ch| ch.is_whitespace()).unwrap_or(true);
        let after_is_punct = after.map(is_cmark_punctuation).unwrap_or(false);
        let before_is_ws = before.map(|ch| ch.is_whitespace()).unwrap_or(true);
        let before_is_punct = before.map(is_cmark_punctuation).unwrap_or(false);

        let left_flanking = !after_is_ws && !(after_is_punct && !before_is_ws && !before_is_punct);
        let right_flanking = !before_is_ws && !(before_is_punct && !after_is_ws && !after_is_punct);

        let (can_open, can_close) = if c == b'_' {
            (
                left_flanking && (!right_flanking || before_is_punct),
                right_flanking && (!left_flanking || after_is_punct),
            )
        } else {
            (left_flanking, right_flanking)
        };

        (can_open, can_close, length)
    }

    fn handle_delim(&mut self, node: &'a AstNode<'a>, c: u8) {
        let start = self.pos;
        let (can_open, can_close, length) = self.scan_delims(c);
        let text = self.input[start..self.pos].to_vec();
        let n = self.make_inline(NodeValue::Text(text));
        node.append(n);

        if can_open || can_close {
            self.delimiters.push(Delim { inl: n, delim_char: c, can_open, can_close, length });
        }
    }

    fn handle_text_run(&mut self, node: &'a AstNode<'a>) {
        let start = self.pos;
        while self.pos < self.input.len() && !SPECIAL_BYTES[self.input[self.pos] as usize] {
            self.pos += 1;
        }
        if self.pos == start {
            self.append_literal_byte(node, self.input[start]);
            return;
        }
        let mut text = self.input[start..self.pos].to_vec();
        if self.options.parse.smart {
            text = apply_smart_punctuation(&text);
        }
        let n = self.make_inline(NodeValue::Text(text));
        node.append(n);
    }

    fn handle_open_bracket(&mut self, node: &'a AstNode<'a>, image: bool) {
        self.pos += 1;
        let literal: &[u8] = if image { b"![" } else { b"[" };
        let n = self.make_inline(NodeValue::Text(literal.to_vec()));
        node.append(n);

        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        let previous_delimiter = self.delimiters.len() as isize - 1;
        self.brackets.push(Bracket {
            inl_text: n,
            position: self.pos,
            image,
            active: true,
            bracket_after: false,
            previous_delimiter,
        });
    }

    fn handle_close_bracket(&mut self, node: &'a AstNode<'a>) {
        self.pos += 1;
        let initial_pos = self.pos;

        let Some(last) = self.brackets.last() else {
            self.append_literal_byte_at(node, b']');
            return;
        };

        let is_image = last.image;
        let bracket_position = last.position;
        let bracket_after = last.bracket_after;
        let active = last.active;

        if !active {
            self.brackets.pop();
            self.append_literal_byte_at(node, b']');
            return;
        }

        if self.input.get(self.pos) == Some(&b'(') {
            if let Some((url, title, consumed)) = self.scan_inline_link_tail(self.pos + 1) {
                self.pos = consumed;
                self.close_bracket_match(is_image, url, title);
                return;
            }
            self.pos = initial_pos;
        }

        let saved_pos = self.pos;
        let label = match self.scan_link_label() {
            Some(lab) => lab,
            None => {
                self.pos = saved_pos;
                Vec::new()
            }
        };
        let label = if label.is_empty() && !bracket_after {
            self.input[bracket_position..initial_pos - 1].to_vec()
        } else {
            label
        };

        if let Some((url, title)) = self.refmap.lookup(&label) {
            self.close_bracket_match(is_image, url, title);
            return;
        }

        self.brackets.pop();
        self.pos = initial_pos;
        self.append_literal_byte_at(node, b']');
    }

    fn append_literal_byte_at(&mut self, node: &'a AstNode<'a>, c: u8) {
        let n = self.make_inline(NodeValue::Text(vec![c]));
        node.append(n);
    }

    fn close_bracket_match(&mut self, is_image: bool, url: Vec<u8>, title: Vec<u8>) {
        let bracket = self.brackets.pop().unwrap();
        let inl_text = bracket.inl_text;

        // Resolve emphasis restricted to delimiters opened since this
        // bracket, before the link/image text is spliced into its wrapper.
        // Otherwise a delimiter outside the bracket (already resolved or
        // not) could pair with one that's about to end up nested inside it.
        self.process_emphasis(bracket.previous_delimiter);

        let value = if is_image { NodeValue::Image(NodeLink { url, title }) } else { NodeValue::Link(NodeLink { url, title }) };
        let wrapper = self.arena.alloc(Node::new(RefCell::new(make_block(value, self.line, 0))));

        inl_text.insert_after(wrapper);
        let mut to_move = Vec::new();
        let mut cur = wrapper.next_sibling();
        while let Some(n) = cur {
            to_move.push(n);
            cur = n.next_sibling();
        }
        for n in to_move {
            wrapper.append(n);
        }
        inl_text.detach();

        if !is_image {
            for b in self.brackets.iter_mut() {
                if !b.image {
                    b.active = false;
                }
            }
        }
    }

    fn scan_inline_link_tail(&self, mut pos: usize) -> Option<(Vec<u8>, Vec<u8>, usize)> {
        pos = super::skip_spaces_and_up_to_one_newline(self.input, pos);

        let (raw_url, mut pos2) = super::scan_link_destination(self.input, pos)?;

        let pos_before_ws = pos2;
        pos2 = super::skip_spaces_and_up_to_one_newline(self.input, pos2);

        let (raw_title, pos3) = if pos2 > pos_before_ws {
            match super::scan_link_title(self.input, pos2) {
                Some((t, p)) => (Some(t), p),
                None => (None, pos_before_ws),
            }
        } else {
            (None, pos_before_ws)
        };

        let pos4 = super::skip_spaces_and_up_to_one_newline(self.input, pos3);
        if self.input.get(pos4) != Some(&b')') {
            return None;
        }

        let url = strings::clean_url(&raw_url);
        let title = raw_title.map(|t| strings::clean_title(&t)).unwrap_or_default();
        Some((url, title, pos4 + 1))
    }

    fn scan_link_label(&mut self) -> Option<Vec<u8>> {
        if self.input.get(self.pos) != Some(&b'[') {
            return None;
        }
        let start = self.pos + 1;
        let mut i = start;
        while i < self.input.len() && i - start < MAX_LINK_LABEL_LENGTH {
            match self.input[i] {
                b']' => {
                    self.pos = i + 1;
                    return Some(self.input[start..i].to_vec());
                }
                b'\\' if i + 1 < self.input.len() => i += 2,
                b'[' => return None,
                _ => i += 1,
            }
        }
        None
    }

    /// Resolve emphasis/strong pairings among delimiters above index
    /// `stack_bottom` (`-1` means the whole stack). Called with the bracket's
    /// `previous_delimiter` on every successful link/image resolution, and
    /// once more with `-1` after the whole paragraph/heading has been
    /// tokenized, so a closing bracket can never let emphasis pair across
    /// its own boundary.
    fn process_emphasis(&mut self, stack_bottom: isize) {
        let mut closer_idx = (stack_bottom + 1).max(0) as usize;

        while closer_idx < self.delimiters.len() {
            let Some(closer) = self.delimiters.get(closer_idx) else {
                closer_idx += 1;
                continue;
            };
            if !closer.can_close {
                closer_idx += 1;
                continue;
            }
            let delim_char = closer.delim_char;
            let is_quote = matches!(delim_char, b'\'' | b'"');

            let mut opener_idx = None;
            let mut scan = closer_idx;
            while scan as isize > stack_bottom + 1 {
                scan -= 1;
                let Some(opener) = self.delimiters.get(scan) else { continue };
                if opener.delim_char != delim_char || !opener.can_open {
                    continue;
                }
                if is_quote {
                    opener_idx = Some(scan);
                    break;
                }
                let closer_len = self.delimiters.get(closer_idx).unwrap().length;
                let odd_match = (opener.can_close || closer.can_open)
                    && (opener.length + closer_len) % 3 == 0
                    && !(opener.length % 3 == 0 && closer_len % 3 == 0);
                if odd_match {
                    continue;
                }
                opener_idx = Some(scan);
                break;
            }

            let Some(opener_idx) = opener_idx else {
                if is_quote {
                    self.replace_quote(closer_idx, false);
                    self.delimiters.remove(closer_idx);
                } else if !self.delimiters.get(closer_idx).unwrap().can_open {
                    self.delimiters.remove(closer_idx);
                }
                closer_idx += 1;
                continue;
            };

            if is_quote {
                self.replace_quote(opener_idx, true);
                self.replace_quote(closer_idx, false);
                self.delimiters.remove(opener_idx);
                self.delimiters.remove(closer_idx);
                closer_idx += 1;
                continue;
            }

            let opener_len = self.delimiters.get(opener_idx).unwrap().length;
            let closer_len = self.delimiters.get(closer_idx).unwrap().length;
            let strength = if opener_len >= 2 && closer_len >= 2 { 2 } else { 1 };

            self.wrap_emphasis(opener_idx, closer_idx, strength);

            let opener_exhausted = self.delimiters.get(opener_idx).unwrap().length == 0;
            let closer_exhausted = self.delimiters.get(closer_idx).unwrap().length == 0;
            if opener_exhausted {
                self.delimiters.remove(opener_idx);
            }
            if closer_exhausted {
                self.delimiters.remove(closer_idx);
                closer_idx += 1;
            }
        }

        // Finalize everything left above `stack_bottom`: convert any
        // remaining quote delimiter to its default glyph, then drop it. A
        // range, once scanned, must not be revisited by a later, wider
        // pass — that's what would let emphasis pair across an
        // already-resolved link/image boundary.
        while self.delimiters.len() as isize > stack_bottom + 1 {
            let idx = self.delimiters.len() - 1;
            if let Some(d) = self.delimiters.get(idx) {
                if matches!(d.delim_char, b'\'' | b'"') {
                    let open_default = d.can_open && !d.can_close;
                    self.replace_quote(idx, open_default);
                }
            }
            self.delimiters.remove(idx);
        }
    }

    fn wrap_emphasis(&mut self, opener_idx: usize, closer_idx: usize, strength: usize) {
        let opener_inl = self.delimiters.get(opener_idx).unwrap().inl;
        let closer_inl = self.delimiters.get(closer_idx).unwrap().inl;

        if let NodeValue::Text(ref mut t) = opener_inl.data.borrow_mut().value {
            let new_len = t.len() - strength;
            t.truncate(new_len);
        }
        if let NodeValue::Text(ref mut t) = closer_inl.data.borrow_mut().value {
            t.drain(0..strength);
        }

        let value = if strength == 2 { NodeValue::Strong } else { NodeValue::Emph };
        let wrapper = self.arena.alloc(Node::new(RefCell::new(make_block(value, self.line, 0))));

        opener_inl.insert_after(wrapper);
        let mut to_move = Vec::new();
        let mut cur = wrapper.next_sibling();
        while let Some(n) = cur {
            if n.same_node(closer_inl) {
                break;
            }
            to_move.push(n);
            cur = n.next_sibling();
        }
        for n in to_move {
            wrapper.append(n);
        }

        let opener_empty = matches!(&opener_inl.data.borrow().value, NodeValue::Text(t) if t.is_empty());
        if opener_empty {
            opener_inl.detach();
        }
        let closer_empty = matches!(&closer_inl.data.borrow().value, NodeValue::Text(t) if t.is_empty());
        if closer_empty {
            closer_inl.detach();
        }

        self.delimiters.get_mut(opener_idx).unwrap().length -= strength;
        self.delimiters.get_mut(closer_idx).unwrap().length -= strength;
    }

    fn replace_quote(&mut self, idx: usize, is_opener: bool) {
        let Some(d) = self.delimiters.get(idx) else { return };
        let inl = d.inl;
        let replacement: &[u8] = match (d.delim_char, is_opener) {
            (b'\'', true) => "\u{2018}".as_bytes(),
            (b'\'', false) => "\u{2019}".as_bytes(),
            (b'"', true) => "\u{201c}".as_bytes(),
            (b'"', false) => "\u{201d}".as_bytes(),
            _ => return,
        };
        if let NodeValue::Text(ref mut t) = inl.data.borrow_mut().value {
            *t = replacement.to_vec();
        }
    }
}

fn char_at(input: &[u8], pos: usize) -> Option<char> {
    std::str::from_utf8(input.get(pos..)?).ok()?.chars().next()
}

fn char_before(input: &[u8], pos: usize) -> Option<char> {
    std::str::from_utf8(input.get(..pos)?).ok()?.chars().next_back()
}

fn is_cmark_punctuation(c: char) -> bool {
    c.is_punctuation() || c.is_symbol()
}

fn apply_smart_punctuation(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i..].starts_with(b"...") {
            out.extend_from_slice("\u{2026}".as_bytes());
            i += 3;
        } else if s[i..].starts_with(b"---") {
            out.extend_from_slice("\u{2014}".as_bytes());
            i += 3;
        } else if s[i..].starts_with(b"--") {
            out.extend_from_slice("\u{2013}".as_bytes());
            i += 2;
        } else {
            out.push(s[i]);
            i += 1;
        }
    }
    out
}

fn find_subslice(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Scan one inline HTML construct (`<tag ...>`, `</tag>`, comment, PI,
/// declaration, or CDATA section) starting at `rest[0] == '<'`. Returns its
/// byte length including both angle brackets.
fn scan_inline_html_tag(rest: &[u8]) -> Option<usize> {
    if rest.first() != Some(&b'<') {
        return None;
    }
    let body = &rest[1..];

    if body.starts_with(b"!--") {
        let end = find_subslice(&body[3..], b"--")?;
        return Some(1 + 3 + end + 2 + 1);
    }
    if body.first() == Some(&b'?') {
        let end = find_subslice(&body[1..], b"?>")?;
        return Some(1 + 1 + end + 2);
    }
    if body.starts_with(b"![CDATA[") {
        let end = find_subslice(&body[8..], b"]]>")?;
        return Some(1 + 8 + end + 3);
    }
    if body.first() == Some(&b'!') && body.get(1).map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        let end = body.iter().position(|&c| c == b'>')?;
        return Some(1 + end + 1);
    }

    let mut i = 0;
    let closing = body.first() == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < body.len() && (body[i].is_ascii_alphanumeric() || body[i] == b'-') {
        i += 1;
    }
    if i == name_start {
        return None;
    }

    if !closing {
        loop {
            while i < body.len() && ctype::isspace(body[i]) {
                i += 1;
            }
            if body.get(i) == Some(&b'/') {
                i += 1;
                break;
            }
            if i >= body.len() || !(body[i].is_ascii_alphabetic() || body[i] == b'_' || body[i] == b':') {
                break;
            }
            while i < body.len() && (body[i].is_ascii_alphanumeric() || matches!(body[i], b'_' | b':' | b'.' | b'-')) {
                i += 1;
            }
            while i < body.len() && ctype::isspace(body[i]) {
                i += 1;
            }
            if body.get(i) == Some(&b'=') {
                i += 1;
                while i < body.len() && ctype::isspace(body[i]) {
                    i += 1;
                }
                match body.get(i) {
                    Some(b'"') => {
                        i += 1;
                        while i < body.len() && body[i] != b'"' {
                            i += 1;
                        }
                        i += 1;
                    }
                    Some(b'\'') => {
                        i += 1;
                        while i < body.len() && body[i] != b'\'' {
                            i += 1;
                        }
                        i += 1;
                    }
                    _ => {
                        while i < body.len() && !ctype::isspace(body[i]) && body[i] != b'>' {
                            i += 1;
                        }
                    }
                }
            }
        }
    } else {
        while i < body.len() && ctype::isspace(body[i]) {
            i += 1;
        }
    }

    if body.get(i) == Some(&b'>') {
        Some(1 + i + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_tree::Node;
    use crate::nodes::{make_block, NodeValue};
    use crate::reference::ReferenceMap;

    fn run<'a>(arena: &'a Arena<AstNode<'a>>, text: &str, options: &Options) -> &'a AstNode<'a> {
        let root = arena.alloc(Node::new(RefCell::new(make_block(NodeValue::Paragraph, 1, 1))));
        let mut refmap = ReferenceMap::new(0);
        parse_inlines(arena, root, text.as_bytes(), 1, 1, &mut refmap, options);
        root
    }

    #[test]
    fn emphasis_and_strong_wrap_correctly() {
        let arena = Arena::new();
        let root = run(&arena, "a *b* c **d** e", &Options::default());
        let kinds: Vec<_> = root.children().map(|n| format!("{:?}", n.data.borrow().value)).collect();
        assert!(kinds.iter().any(|k| k.starts_with("Emph")));
        assert!(kinds.iter().any(|k| k.starts_with("Strong")));
    }

    #[test]
    fn code_span_collapses_newlines_to_spaces() {
        let arena = Arena::new();
        let root = run(&arena, "`a\nb`", &Options::default());
        let code = root.first_child().unwrap();
        match &code.data.borrow().value {
            NodeValue::Code(c) => assert_eq!(c, b"a b"),
            _ => panic!("expected code span"),
        }
    }

    #[test]
    fn inline_link_parses_destination_and_title() {
        let arena = Arena::new();
        let root = run(&arena, "[x](/u \"t\")", &Options::default());
        let link = root.first_child().unwrap();
        match &link.data.borrow().value {
            NodeValue::Link(l) => {
                assert_eq!(l.url, b"/u");
                assert_eq!(l.title, b"t");
            }
            _ => panic!("expected link"),
        }
    }

    #[test]
    fn reference_link_resolves_from_refmap() {
        let arena = Arena::new();
        let mut refmap = ReferenceMap::new(0);
        refmap.create(b"foo", b"/url", b"");
        let root2 = arena.alloc(Node::new(RefCell::new(make_block(NodeValue::Paragraph, 1, 1))));
        let options = Options::default();
        parse_inlines(&arena, root2, b"[foo]", 1, 1, &mut refmap, &options);
        let link = root2.first_child().unwrap();
        assert!(matches!(link.data.borrow().value, NodeValue::Link(..)));
    }

    #[test]
    fn unmatched_bracket_is_literal() {
        let arena = Arena::new();
        let root = run(&arena, "[oops", &Options::default());
        let text = root.first_child().unwrap();
        match &text.data.borrow().value {
            NodeValue::Text(t) => assert_eq!(t, b"[oops"),
            _ => panic!("expected literal text"),
        }
    }

    #[test]
    fn smart_punctuation_converts_dashes_and_quotes() {
        let arena = Arena::new();
        let mut options = Options::default();
        options.parse.smart = true;
        let root = run(&arena, "\"a\" -- b", &options);
        let kinds: Vec<_> = root.children().map(|n| match &n.data.borrow().value {
            NodeValue::Text(t) => String::from_utf8_lossy(t).into_owned(),
            _ => String::new(),
        }).collect();
        assert!(kinds.iter().any(|k| k.contains('\u{2013}')));
    }

    #[test]
    fn emphasis_does_not_pair_across_a_resolved_link_boundary() {
        let arena = Arena::new();
        let root = run(&arena, "*foo [bar*](/url)", &Options::default());
        let kinds: Vec<_> = root.children().map(|n| format!("{:?}", n.data.borrow().value)).collect();
        assert!(!kinds.iter().any(|k| k.starts_with("Emph") || k.starts_with("Strong")));

        let text = root.first_child().unwrap();
        match &text.data.borrow().value {
            NodeValue::Text(t) => assert_eq!(t, b"*foo "),
            other => panic!("expected leading literal asterisk, got {:?}", other),
        }

        let link = text.next_sibling().unwrap();
        match &link.data.borrow().value {
            NodeValue::Link(l) => assert_eq!(l.url, b"/url"),
            other => panic!("expected link, got {:?}", other),
        }
        let link_text = link.first_child().unwrap();
        match &link_text.data.borrow().value {
            NodeValue::Text(t) => assert_eq!(t, b"bar*"),
            other => panic!("expected literal asterisk inside link text, got {:?}", other),
        }
    }

    #[test]
    fn autolink_sets_mailto_scheme() {
        let arena = Arena::new();
        let root = run(&arena, "<foo@bar.com>", &Options::default());
        let link = root.first_child().unwrap();
        match &link.data.borrow().value {
            NodeValue::Link(l) => assert_eq!(l.url, b"mailto:foo@bar.com"),
            _ => panic!("expected autolink"),
        }
    }
}
