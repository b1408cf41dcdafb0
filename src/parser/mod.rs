//! The block parser: a line-oriented incremental state machine (spec §4.5).
//!
//! Each fed line walks the chain of currently open blocks from the document
//! root down (`check_open_blocks`), closing whichever suffix of that chain
//! the line no longer continues, then tries to open new container blocks at
//! the point continuation stopped (`open_new_blocks`), and finally appends
//! whatever text remains to the innermost block (`add_text_to_container`).
//! Grounded on `examples/kivikakk-comrak/src/main.rs`'s `Parser`
//! (`advance_offset`, `parse_list_marker`, the three-phase per-line
//! algorithm), trimmed of every GFM extension (tables, footnotes, tasklist,
//! alerts, multiline block quotes, math, description lists, wikilinks) and
//! cross-checked against `examples/original_source/src/cssg.h`/`node.h` for
//! field semantics (`marker_offset`, `padding`).

pub mod inlines;
pub mod options;

use crate::arena_tree::Node;
use crate::entity;
use crate::error::CmarkError;
use crate::nodes::{
    self, make_block, AstNode, ListDelimType, ListType, NodeCodeBlock, NodeHeading,
    NodeHtmlBlock, NodeList, NodeValue,
};
use crate::reference::{ReferenceMap, MAX_LINK_LABEL_LENGTH};
use crate::scanners;
use crate::strings;
use options::Options;
use std::cell::RefCell;
use typed_arena::Arena;

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

/// Parse a complete document buffer in one call.
pub fn parse_document<'a>(
    arena: &'a Arena<AstNode<'a>>,
    buffer: &[u8],
    options: &Options,
) -> Result<&'a AstNode<'a>, CmarkError> {
    let mut parser = Parser::new(arena, options);
    parser.feed(buffer)?;
    Ok(parser.finish())
}

/// Read and parse a file from disk.
pub fn parse_file<'a>(
    arena: &'a Arena<AstNode<'a>>,
    path: &std::path::Path,
    options: &Options,
) -> Result<&'a AstNode<'a>, CmarkError> {
    let buffer = std::fs::read(path)?;
    parse_document(arena, &buffer, options)
}

/// The incremental parser backing `parser_new`/`parser_feed`/`parser_finish`
/// (spec §6): construct with [`Parser::new`], call [`Parser::feed`] as many
/// times as input arrives, then [`Parser::finish`] to obtain the root.
pub struct Parser<'a> {
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    current: &'a AstNode<'a>,
    line_number: u32,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    last_line_length: usize,
    last_buffer_ended_with_cr: bool,
    refmap: ReferenceMap,
    options: Options,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Arena<AstNode<'a>>, options: &Options) -> Self {
        let root = arena.alloc(Node::new(RefCell::new(make_block(NodeValue::Document, 1, 1))));
        let max_ref_size = options.parse.max_ref_size.unwrap_or(0);
        Parser {
            arena,
            root,
            current: root,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            last_line_length: 0,
            last_buffer_ended_with_cr: false,
            refmap: ReferenceMap::new(max_ref_size),
            options: options.clone(),
        }
    }

    pub fn feed(&mut self, buffer: &[u8]) -> Result<(), CmarkError> {
        if buffer.len() > strings::MAX_BUFFER_SIZE {
            return Err(CmarkError::BufferTooLarge { requested: buffer.len() });
        }
        let mut buffer = preprocess(buffer, self.options.parse.validate_utf8);
        if self.last_buffer_ended_with_cr && buffer.first() == Some(&b'\n') {
            buffer.remove(0);
        }
        self.last_buffer_ended_with_cr = false;

        let len = buffer.len();
        let mut pos = 0;
        while pos < len {
            let mut i = pos;
            while i < len && buffer[i] != b'\n' && buffer[i] != b'\r' {
                i += 1;
            }
            let mut next = i;
            if i < len {
                if buffer[i] == b'\r' {
                    next = i + 1;
                    if next < len && buffer[next] == b'\n' {
                        next += 1;
                    } else if next == len {
                        self.last_buffer_ended_with_cr = true;
                    }
                } else {
                    next = i + 1;
                }
            }
            self.process_line(&buffer[pos..next]);
            pos = next;
        }
        Ok(())
    }

    pub fn finish(mut self) -> &'a AstNode<'a> {
        let mut node = self.current;
        loop {
            let parent = node.parent();
            self.finalize(node);
            match parent {
                Some(p) => node = p,
                None => break,
            }
        }
        self.process_inlines();
        self.root
    }

    fn process_line(&mut self, raw_line: &[u8]) {
        self.line_number += 1;
        self.offset = 0;
        self.column = 0;
        self.partially_consumed_tab = false;

        let line = strip_line_ending(raw_line);
        self.last_line_length = line.len();

        let container = self.check_open_blocks(line);

        if !container.same_node(self.current) {
            let mut node = self.current;
            while !node.same_node(container) {
                let parent = node.parent().expect("open block chain reaches container");
                self.finalize(node);
                node = parent;
            }
        }

        self.find_first_nonspace(line);
        let verbatim = matches!(
            container.data.borrow().value,
            NodeValue::CodeBlock(..) | NodeValue::HtmlBlock(..)
        );

        let container = if verbatim {
            container
        } else {
            self.open_new_blocks(container, line)
        };

        let blank = self.blank;
        let container = self.add_text_to_container(container, line);

        let is_blockquote = matches!(container.data.borrow().value, NodeValue::BlockQuote);
        container.data.borrow_mut().last_line_blank = blank && !is_blockquote;

        self.current = container;
    }

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut i = self.offset;
        let mut cols = self.column;
        while i < line.len() {
            match line[i] {
                b' ' => {
                    cols += 1;
                    i += 1;
                }
                b'\t' => {
                    cols += TAB_STOP - (cols % TAB_STOP);
                    i += 1;
                }
                _ => break,
            }
        }
        self.first_nonspace = i;
        self.first_nonspace_column = cols;
        self.indent = cols - self.column;
        self.blank = i >= line.len();
    }

    /// Advance `offset`/`column` by `count` columns (`columns = true`,
    /// expanding tabs to the next stop) or by `count` raw bytes.
    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 && self.offset < line.len() {
            match line[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let advance = chars_to_tab.min(count);
                        self.column += advance;
                        count -= advance;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        }
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    fn check_open_blocks(&mut self, line: &[u8]) -> &'a AstNode<'a> {
        let mut container = self.root;
        loop {
            let last_child = match container.last_child() {
                Some(c) if c.data.borrow().open => c,
                _ => break,
            };
            self.find_first_nonspace(line);
            let value = last_child.data.borrow().value.clone();
            if !self.container_continues(&value, line) {
                break;
            }
            container = last_child;
        }
        container
    }

    fn container_continues(&mut self, value: &NodeValue, line: &[u8]) -> bool {
        match *value {
            NodeValue::BlockQuote => {
                if self.indent <= 3 && self.first_nonspace < line.len() && line[self.first_nonspace] == b'>' {
                    self.advance_offset(line, self.indent + 1, true);
                    if self.offset < line.len() && strings::is_space_or_tab(line[self.offset]) {
                        self.advance_offset(line, 1, true);
                    }
                    true
                } else {
                    false
                }
            }
            NodeValue::Item(nl) => {
                if self.blank {
                    true
                } else if self.indent >= nl.marker_offset + nl.padding {
                    self.advance_offset(line, nl.marker_offset + nl.padding, true);
                    true
                } else {
                    false
                }
            }
            NodeValue::List(..) => true,
            NodeValue::CodeBlock(ref cb) => {
                if cb.fenced || self.blank {
                    true
                } else if self.indent >= CODE_INDENT {
                    self.advance_offset(line, CODE_INDENT, true);
                    true
                } else {
                    false
                }
            }
            NodeValue::HtmlBlock(ref hb) => !(self.blank && hb.block_type >= 6),
            NodeValue::Paragraph => !self.blank,
            _ => false,
        }
    }

    fn open_new_blocks(&mut self, mut container: &'a AstNode<'a>, line: &[u8]) -> &'a AstNode<'a> {
        loop {
            self.find_first_nonspace(line);

            if self.indent >= CODE_INDENT {
                let in_paragraph = matches!(container.data.borrow().value, NodeValue::Paragraph);
                if !in_paragraph && !self.blank {
                    self.advance_offset(line, CODE_INDENT, true);
                    container =
                        self.add_child(container, NodeValue::CodeBlock(NodeCodeBlock::default()), self.first_nonspace + 1);
                }
                break;
            }

            if self.blank {
                break;
            }

            let rest = &line[self.first_nonspace..];

            if rest[0] == b'>' {
                self.advance_offset(line, self.indent + 1, true);
                if self.offset < line.len() && strings::is_space_or_tab(line[self.offset]) {
                    self.advance_offset(line, 1, true);
                }
                container = self.add_child(container, NodeValue::BlockQuote, self.first_nonspace + 1);
                continue;
            }

            if let Some((level, hashes)) = scanners::atx_heading_start(rest) {
                self.advance_offset(line, self.indent + hashes, true);
                while self.offset < line.len() && strings::is_space_or_tab(line[self.offset]) {
                    self.advance_offset(line, 1, true);
                }
                let heading =
                    self.add_child(container, NodeValue::Heading(NodeHeading { level, setext: false }), self.first_nonspace + 1);
                let raw = strip_atx_closing(&line[self.offset..]);
                heading.data.borrow_mut().content = raw;
                container = self.finalize(heading);
                break;
            }

            if let Some((fence_char, fence_length)) = scanners::open_code_fence(rest) {
                let fence_offset = self.indent;
                self.advance_offset(line, self.indent + fence_length, true);
                let mut info = strings::trim_slice(&line[self.offset..]).to_vec();
                strings::unescape(&mut info);
                let info = entity::unescape_html(&info);
                container = self.add_child(
                    container,
                    NodeValue::CodeBlock(NodeCodeBlock {
                        fenced: true,
                        fence_char,
                        fence_length,
                        fence_offset,
                        info,
                        literal: Vec::new(),
                    }),
                    self.first_nonspace + 1,
                );
                break;
            }

            if let Some(html_cond) = scanners::html_block_start(rest) {
                let in_paragraph = matches!(container.data.borrow().value, NodeValue::Paragraph);
                if html_cond != 7 || !in_paragraph {
                    container = self.add_child(
                        container,
                        NodeValue::HtmlBlock(NodeHtmlBlock { block_type: html_cond, literal: Vec::new() }),
                        self.first_nonspace + 1,
                    );
                    break;
                }
            }

            if let Some(level) = scanners::setext_heading_line(rest) {
                if let Some(last) = container.last_child() {
                    let is_open_para =
                        last.data.borrow().open && matches!(last.data.borrow().value, NodeValue::Paragraph);
                    if is_open_para {
                        self.advance_offset(line, line.len() - self.offset, false);
                        let raw = std::mem::take(&mut last.data.borrow_mut().content);
                        let raw = strings::trim_slice(&raw).to_vec();
                        last.data.borrow_mut().value = NodeValue::Heading(NodeHeading { level, setext: true });
                        last.data.borrow_mut().content = raw;
                        container = self.finalize(last);
                        break;
                    }
                }
            }

            if scanners::thematic_break(rest) {
                self.advance_offset(line, line.len() - self.offset, false);
                let tb = self.add_child(container, NodeValue::ThematicBreak, self.first_nonspace + 1);
                container = self.finalize(tb);
                break;
            }

            let interrupts_paragraph = matches!(container.data.borrow().value, NodeValue::Paragraph);
            if let Some((mut list_data, consumed)) = parse_list_marker(rest, interrupts_paragraph) {
                list_data.marker_offset = self.indent;
                self.advance_offset(line, self.indent + consumed, true);

                let needs_new_list = match container.data.borrow().value {
                    NodeValue::List(existing) => !lists_match(&existing, &list_data),
                    _ => true,
                };
                if needs_new_list {
                    container = self.add_child(container, NodeValue::List(list_data), self.first_nonspace + 1);
                }
                container = self.add_child(container, NodeValue::Item(list_data), self.first_nonspace + 1);
                continue;
            }

            break;
        }

        self.find_first_nonspace(line);
        if nodes::can_contain_type(container, &NodeValue::Paragraph) {
            if let Some(last) = container.last_child() {
                if last.data.borrow().open && matches!(last.data.borrow().value, NodeValue::Paragraph) {
                    return last;
                }
            }
            if !self.blank {
                return self.add_child(container, NodeValue::Paragraph, self.first_nonspace + 1);
            }
        }

        container
    }

    fn add_text_to_container(&mut self, container: &'a AstNode<'a>, line: &[u8]) -> &'a AstNode<'a> {
        self.find_first_nonspace(line);

        if let NodeValue::CodeBlock(ref cb) = container.data.borrow().value {
            let (fenced, fence_char, fence_length, fence_offset) = (cb.fenced, cb.fence_char, cb.fence_length, cb.fence_offset);
            if fenced {
                if !self.blank
                    && self.indent < CODE_INDENT
                    && scanners::close_code_fence(&line[self.first_nonspace..], fence_char, fence_length)
                {
                    return self.finalize(container);
                }
                let skip = fence_offset.min(line.len().saturating_sub(self.offset));
                self.advance_offset(line, skip, true);
                self.append_content(container, &line[self.offset..]);
                self.append_content(container, b"\n");
                return container;
            }

            if self.blank {
                self.append_content(container, b"\n");
            } else {
                self.append_content(container, &line[self.offset..]);
                self.append_content(container, b"\n");
            }
            return container;
        }

        if let NodeValue::HtmlBlock(ref hb) = container.data.borrow().value {
            let block_type = hb.block_type;
            self.append_content(container, &line[self.offset..]);
            self.append_content(container, b"\n");
            if (1..=5).contains(&block_type) && scanners::html_block_end(block_type, &line[self.first_nonspace..]) {
                return self.finalize(container);
            }
            return container;
        }

        if matches!(container.data.borrow().value, NodeValue::Paragraph) {
            if self.blank {
                return container;
            }
            self.append_content(container, &line[self.offset..]);
            self.append_content(container, b"\n");
        }

        container
    }

    fn append_content(&mut self, node: &'a AstNode<'a>, bytes: &[u8]) {
        node.data.borrow_mut().content.extend_from_slice(bytes);
    }

    fn add_child(&mut self, mut parent: &'a AstNode<'a>, value: NodeValue, start_column: usize) -> &'a AstNode<'a> {
        while !nodes::can_contain_type(parent, &value) {
            parent = self.finalize(parent);
        }
        let child = self.arena.alloc(Node::new(RefCell::new(make_block(
            value,
            self.line_number,
            start_column as u32,
        ))));
        parent.append(child);
        child
    }

    fn finalize(&mut self, node: &'a AstNode<'a>) -> &'a AstNode<'a> {
        {
            let mut ast = node.data.borrow_mut();
            ast.open = false;
            ast.end_line = self.line_number.max(ast.start_line);
            ast.end_column = self.last_line_length.max(1) as u32;
        }

        if matches!(node.data.borrow().value, NodeValue::Paragraph) {
            let content = std::mem::take(&mut node.data.borrow_mut().content);
            let trimmed = strings::trim_slice(&content).to_vec();
            let remaining = self.strip_reference_definitions(&trimmed);
            if remaining.is_empty() {
                let parent = node.parent().unwrap_or(self.root);
                node.detach();
                return parent;
            }
            node.data.borrow_mut().content = remaining;
            return node.parent().unwrap_or(self.root);
        }

        let value_snapshot = node.data.borrow().value.clone();
        match value_snapshot {
            NodeValue::CodeBlock(cb) => {
                let mut content = std::mem::take(&mut node.data.borrow_mut().content);
                if !cb.fenced {
                    trim_trailing_blank_lines(&mut content);
                }
                if let NodeValue::CodeBlock(ref mut cb) = node.data.borrow_mut().value {
                    cb.literal = content;
                }
            }
            NodeValue::HtmlBlock(_) => {
                let content = std::mem::take(&mut node.data.borrow_mut().content);
                if let NodeValue::HtmlBlock(ref mut hb) = node.data.borrow_mut().value {
                    hb.literal = content;
                }
            }
            NodeValue::List(_) => {
                let tight = self.compute_list_tightness(node);
                if let NodeValue::List(ref mut nl) = node.data.borrow_mut().value {
                    nl.tight = tight;
                }
            }
            _ => {}
        }

        node.parent().unwrap_or(self.root)
    }

    fn compute_list_tightness(&self, list: &'a AstNode<'a>) -> bool {
        let mut item = list.first_child();
        while let Some(it) = item {
            if nodes::ends_with_blank_line(it) && it.next_sibling().is_some() {
                return false;
            }
            let mut child = it.first_child();
            let mut saw_first = false;
            while let Some(c) = child {
                if saw_first && nodes::ends_with_blank_line(c) {
                    return false;
                }
                saw_first = true;
                child = c.next_sibling();
            }
            item = it.next_sibling();
        }
        true
    }

    /// Strip any leading run of reference-link definitions from `content`,
    /// recording each in the reference map, returning what's left.
    fn strip_reference_definitions(&mut self, content: &[u8]) -> Vec<u8> {
        let mut rest = content.to_vec();
        loop {
            strings::ltrim(&mut rest);
            if rest.is_empty() {
                break;
            }
            match scan_reference_definition(&rest) {
                Some((label, url, title, consumed)) => {
                    self.refmap.create(&label, &url, &title);
                    rest.drain(0..consumed);
                }
                None => break,
            }
        }
        rest
    }

    fn process_inlines(&mut self) {
        let mut iter = crate::iter::NodeIter::new(self.root);
        while let Some((ev, node)) = iter.next() {
            if ev != crate::iter::EventType::Enter {
                continue;
            }
            let is_text_container =
                matches!(node.data.borrow().value, NodeValue::Paragraph | NodeValue::Heading(..));
            if !is_text_container {
                continue;
            }
            let content = std::mem::take(&mut node.data.borrow_mut().content);
            let start_line = node.data.borrow().start_line;
            let start_column = node.data.borrow().start_column;
            inlines::parse_inlines(
                self.arena,
                node,
                &content,
                start_line,
                start_column,
                &mut self.refmap,
                &self.options,
            );
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

fn preprocess(buffer: &[u8], validate_utf8: bool) -> Vec<u8> {
    let bytes: Vec<u8> = if validate_utf8 {
        String::from_utf8_lossy(buffer).into_owned().into_bytes()
    } else {
        buffer.to_vec()
    };
    let mut out = Vec::with_capacity(bytes.len());
    for b in bytes {
        if b == 0 {
            out.extend_from_slice("\u{fffd}".as_bytes());
        } else {
            out.push(b);
        }
    }
    out
}

fn trim_trailing_blank_lines(content: &mut Vec<u8>) {
    loop {
        let Some(last_nl) = content.iter().rposition(|&b| b == b'\n') else {
            break;
        };
        let line_start = content[..last_nl].iter().rposition(|&b| b == b'\n').map(|p| p + 1).unwrap_or(0);
        if strings::is_blank(&content[line_start..last_nl]) {
            content.truncate(line_start);
        } else {
            break;
        }
    }
}

/// Strip the optional ` ###` closing sequence from an ATX heading's raw
/// content (spec §4.5's ATX heading rule).
fn strip_atx_closing(raw: &[u8]) -> Vec<u8> {
    let mut s = strings::trim_slice(raw).to_vec();
    let hashes = s.iter().rev().take_while(|&&c| c == b'#').count();
    if hashes > 0 {
        let before = s.len() - hashes;
        if before == 0 || strings::is_space_or_tab(s[before - 1]) {
            s.truncate(before);
            strings::rtrim(&mut s);
        }
    }
    s
}

fn lists_match(a: &NodeList, b: &NodeList) -> bool {
    a.list_type == b.list_type && a.delimiter == b.delimiter && a.bullet_char == b.bullet_char
}

/// Recognize a bullet (`-`/`+`/`*`) or ordered (`\d{1,9}[.)]`) list marker at
/// the start of `rest`. `interrupts_paragraph` applies CommonMark's
/// restriction that a list can't interrupt a paragraph with a blank first
/// item, or an ordered list not starting at 1. Returns the marker's metadata
/// and the byte count (marker plus padding) to advance past.
fn parse_list_marker(rest: &[u8], interrupts_paragraph: bool) -> Option<(NodeList, usize)> {
    if rest.is_empty() {
        return None;
    }

    let (list_type, delimiter, bullet_char, marker_len, start) = match rest[0] {
        b'-' | b'+' | b'*' => (ListType::Bullet, ListDelimType::Period, rest[0], 1, 0),
        c if c.is_ascii_digit() => {
            let mut j = 0;
            while j < rest.len() && j < 9 && rest[j].is_ascii_digit() {
                j += 1;
            }
            let delim = match rest.get(j) {
                Some(b'.') => ListDelimType::Period,
                Some(b')') => ListDelimType::Paren,
                _ => return None,
            };
            let start = std::str::from_utf8(&rest[..j]).ok()?.parse().ok()?;
            (ListType::Ordered, delim, 0u8, j + 1, start)
        }
        _ => return None,
    };

    let after_marker = rest.get(marker_len).copied();
    if let Some(c) = after_marker {
        if !strings::is_space_or_tab(c) && !strings::is_line_end_char(c) {
            return None;
        }
    }

    let blank_item = after_marker.is_none() || rest[marker_len..].iter().all(|&c| c == b' ' || c == b'\t');

    if interrupts_paragraph && (blank_item || (list_type == ListType::Ordered && start != 1)) {
        return None;
    }

    let ws = rest[marker_len..].iter().take_while(|&&c| c == b' ' || c == b'\t').count();
    let padding = if blank_item {
        marker_len + 1
    } else if ws > 4 {
        marker_len + 1
    } else {
        marker_len + ws
    };

    Some((
        NodeList {
            list_type,
            marker_offset: 0,
            padding,
            start,
            delimiter,
            bullet_char,
        },
        padding,
    ))
}

pub(super) fn skip_spaces_and_up_to_one_newline(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() && matches!(input[pos], b' ' | b'\t') {
        pos += 1;
    }
    if pos < input.len() && input[pos] == b'\n' {
        pos += 1;
        while pos < input.len() && matches!(input[pos], b' ' | b'\t') {
            pos += 1;
        }
    }
    pos
}

/// Scan a link destination at `pos`: either an angle-bracketed form or a
/// bare, paren-balanced token. Returns the raw (unescaped) bytes and the
/// position just past it.
pub(super) fn scan_link_destination(input: &[u8], pos: usize) -> Option<(Vec<u8>, usize)> {
    if input.get(pos) == Some(&b'<') {
        let mut i = pos + 1;
        while i < input.len() {
            match input[i] {
                b'>' => return Some((input[pos..=i].to_vec(), i + 1)),
                b'\\' if i + 1 < input.len() => i += 2,
                b'<' | b'\n' => return None,
                _ => i += 1,
            }
        }
        None
    } else {
        let mut i = pos;
        let mut depth = 0i32;
        while i < input.len() {
            match input[i] {
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    i += 1;
                }
                b'\\' if i + 1 < input.len() => i += 2,
                c if strings::is_space_or_tab(c) || strings::is_line_end_char(c) || c < 0x20 => break,
                _ => i += 1,
            }
        }
        if i == pos || depth != 0 {
            return None;
        }
        Some((input[pos..i].to_vec(), i))
    }
}

/// Scan a link title at `pos`: `"..."`, `'...'`, or `(...)`. Returns the raw
/// (including delimiters) bytes and the position just past it.
pub(super) fn scan_link_title(input: &[u8], pos: usize) -> Option<(Vec<u8>, usize)> {
    let open = *input.get(pos)?;
    let close = match open {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = pos + 1;
    while i < input.len() {
        match input[i] {
            c if c == close => return Some((input[pos..=i].to_vec(), i + 1)),
            b'\\' if i + 1 < input.len() => i += 2,
            b'(' if open == b'(' => return None,
            _ => i += 1,
        }
    }
    None
}

/// Scan one `[label]: destination "title"` reference definition at the
/// start of `buf`, returning `(label, url, title, bytes consumed)`.
fn scan_reference_definition(buf: &[u8]) -> Option<(Vec<u8>, Vec<u8>, Vec<u8>, usize)> {
    if buf.first() != Some(&b'[') {
        return None;
    }
    let label_start = 1;
    let mut i = label_start;
    while i < buf.len() && i - label_start < MAX_LINK_LABEL_LENGTH {
        match buf[i] {
            b']' => break,
            b'\\' if i + 1 < buf.len() => i += 2,
            b'[' => return None,
            _ => i += 1,
        }
    }
    if buf.get(i) != Some(&b']') {
        return None;
    }
    let label = buf[label_start..i].to_vec();
    i += 1;
    if buf.get(i) != Some(&b':') {
        return None;
    }
    i += 1;

    i = skip_spaces_and_up_to_one_newline(buf, i);
    let (url, mut i2) = scan_link_destination(buf, i)?;
    if url.is_empty() {
        return None;
    }

    let pos_before_ws = i2;
    i2 = skip_spaces_and_up_to_one_newline(buf, i2);

    let mut title = Vec::new();
    let mut after = pos_before_ws;
    let mut title_found = false;
    if i2 > pos_before_ws {
        if let Some((t, p)) = scan_link_title(buf, i2) {
            let mut q = p;
            while q < buf.len() && matches!(buf[q], b' ' | b'\t') {
                q += 1;
            }
            if q >= buf.len() || matches!(buf[q], b'\n' | b'\r') {
                title = t;
                title_found = true;
                after = if q < buf.len() { q + 1 } else { q };
            }
        }
    }

    if !title_found {
        let mut q = pos_before_ws;
        while q < buf.len() && matches!(buf[q], b' ' | b'\t') {
            q += 1;
        }
        if q < buf.len() && !matches!(buf[q], b'\n' | b'\r') {
            return None;
        }
        after = if q < buf.len() { q + 1 } else { q };
    }

    Some((label, url, title, after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeValue;
    use typed_arena::Arena;

    fn doc<'a>(arena: &'a Arena<AstNode<'a>>, md: &str) -> &'a AstNode<'a> {
        parse_document(arena, md.as_bytes(), &Options::default()).unwrap()
    }

    fn kinds<'a>(node: &'a AstNode<'a>) -> Vec<String> {
        node.children().map(|c| format!("{:?}", c.data.borrow().value)).collect()
    }

    #[test]
    fn parses_paragraph_with_emphasis_children() {
        let arena = Arena::new();
        let root = doc(&arena, "hello *world*\n");
        let para = root.first_child().unwrap();
        assert!(matches!(para.data.borrow().value, NodeValue::Paragraph));
        assert_eq!(para.children().count(), 2);
    }

    #[test]
    fn atx_heading_strips_closing_hashes() {
        let arena = Arena::new();
        let root = doc(&arena, "## Title ##\n");
        let heading = root.first_child().unwrap();
        match heading.data.borrow().value {
            NodeValue::Heading(h) => assert_eq!(h.level, 2),
            _ => panic!("expected heading"),
        }
        let text = heading.first_child().unwrap();
        match &text.data.borrow().value {
            NodeValue::Text(t) => assert_eq!(t, b"Title"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn blockquote_nests_a_paragraph() {
        let arena = Arena::new();
        let root = doc(&arena, "> hi\n");
        let bq = root.first_child().unwrap();
        assert!(matches!(bq.data.borrow().value, NodeValue::BlockQuote));
        assert!(matches!(bq.first_child().unwrap().data.borrow().value, NodeValue::Paragraph));
    }

    #[test]
    fn fenced_code_block_captures_literal_and_info() {
        let arena = Arena::new();
        let root = doc(&arena, "```rust\nfn main() {}\n```\n");
        let cb = root.first_child().unwrap();
        match &cb.data.borrow().value {
            NodeValue::CodeBlock(c) => {
                assert_eq!(c.info, b"rust");
                assert_eq!(c.literal, b"fn main() {}\n");
            }
            _ => panic!("expected code block"),
        }
    }

    #[test]
    fn reference_definition_paragraph_is_removed_and_resolves() {
        let arena = Arena::new();
        let root = doc(&arena, "[foo]: /url \"t\"\n\n[foo]\n");
        assert_eq!(kinds(root).len(), 1);
        let para = root.first_child().unwrap();
        let link = para.first_child().unwrap();
        match &link.data.borrow().value {
            NodeValue::Link(l) => assert_eq!(l.url, b"/url"),
            _ => panic!("expected link"),
        }
    }

    #[test]
    fn tight_list_has_no_blank_between_items() {
        let arena = Arena::new();
        let root = doc(&arena, "- a\n- b\n");
        let list = root.first_child().unwrap();
        match list.data.borrow().value {
            NodeValue::List(l) => assert!(l.tight),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn loose_list_has_blank_between_items() {
        let arena = Arena::new();
        let root = doc(&arena, "- a\n\n- b\n");
        let list = root.first_child().unwrap();
        match list.data.borrow().value {
            NodeValue::List(l) => assert!(!l.tight),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn setext_heading_converts_paragraph() {
        let arena = Arena::new();
        let root = doc(&arena, "Title\n=====\n");
        let heading = root.first_child().unwrap();
        match heading.data.borrow().value {
            NodeValue::Heading(h) => {
                assert_eq!(h.level, 1);
                assert!(h.setext);
            }
            _ => panic!("expected heading"),
        }
    }

    #[test]
    fn thematic_break_is_a_leaf() {
        let arena = Arena::new();
        let root = doc(&arena, "a\n\n---\n");
        assert!(root.children().any(|n| matches!(n.data.borrow().value, NodeValue::ThematicBreak)));
    }
}
