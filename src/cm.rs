//! CommonMark (round-trip Markdown) rendering (spec §4.10).
//!
//! Grounded on `examples/kivikakk-comrak/src/cm.rs`'s `CommonMarkFormatter`,
//! re-plumbed onto the shared `render::Engine`/`NodeFormatter` skeleton
//! instead of carrying its own standalone `output`/`outc` pair, and trimmed
//! of every GFM-only node case (tables, footnotes, tasklists,
//! strikethrough, superscript, shortcodes, front matter).

use crate::ctype::isspace;
use crate::nodes::{self, AstNode, ListDelimType, ListType, NodeHeading, NodeLink, NodeValue};
use crate::parser::options::Options;
use crate::render::{Engine, Escaping, NodeFormatter};
use crate::scanners;
use crate::strings::trim_start_match;
use std::cmp::max;

/// Render `root` back into CommonMark source text.
pub fn format_document<'a>(root: &'a AstNode<'a>, options: &Options) -> Vec<u8> {
    let mut f = CmFormatter {
        engine: Engine::new(options.render.width),
        options,
        _marker: std::marker::PhantomData,
    };
    f.format(root);
    f.engine.finish()
}

struct CmFormatter<'a, 'o> {
    engine: Engine,
    options: &'o Options,
    #[allow(dead_code)]
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a, 'o> CmFormatter<'a, 'o> {
    fn get_in_tight_list_item(&self, node: &'a AstNode<'a>) -> bool {
        let containing = match nodes::containing_block(node) {
            Some(c) => c,
            None => return false,
        };

        let check = |n: &'a AstNode<'a>| -> Option<bool> {
            if let NodeValue::Item(..) = n.data.borrow().value {
                if let NodeValue::List(ref nl) = n.parent()?.data.borrow().value {
                    return Some(nl.tight);
                }
            }
            None
        };

        check(containing)
            .or_else(|| containing.parent().and_then(check))
            .unwrap_or(false)
    }

    fn format_item(&mut self, node: &'a AstNode<'a>, entering: bool) {
        let parent = match node.parent().unwrap().data.borrow().value {
            NodeValue::List(ref nl) => *nl,
            _ => unreachable!(),
        };

        let mut listmarker = Vec::new();

        let marker_width = if parent.list_type == ListType::Bullet {
            2
        } else {
            let mut list_number = parent.start;
            let mut tmpch = node;
            while let Some(tmp) = tmpch.previous_sibling() {
                tmpch = tmp;
                list_number += 1;
            }
            let delim = if parent.delimiter == ListDelimType::Paren { ")" } else { "." };
            let pad = if list_number < 10 { "  " } else { " " };
            listmarker.extend_from_slice(format!("{}{}{}", list_number, delim, pad).as_bytes());
            listmarker.len()
        };

        if entering {
            if parent.list_type == ListType::Bullet {
                let bullet = char::from(parent.bullet_char);
                self.engine.ascii(&format!("{} ", bullet));
            } else {
                self.engine.buf.extend_from_slice(&listmarker);
                self.engine.column += listmarker.len();
            }
            self.engine.begin_content = true;
            for _ in 0..marker_width {
                self.engine.prefix.push(b' ');
            }
        } else {
            let new_len = self.engine.prefix.len() - marker_width;
            self.engine.prefix.truncate(new_len);
            self.engine.cr();
        }
    }
}

impl<'a, 'o> NodeFormatter<'a> for CmFormatter<'a, 'o> {
    fn engine(&mut self) -> &mut Engine {
        &mut self.engine
    }

    fn format_node(&mut self, node: &'a AstNode<'a>, entering: bool) -> bool {
        let allow_wrap = self.options.render.width > 0 && !self.options.render.hardbreaks;
        self.engine.in_tight_list_item = self.get_in_tight_list_item(node);

        match node.data.borrow().value.clone() {
            NodeValue::Document => (),

            NodeValue::BlockQuote => {
                if entering {
                    self.engine.output(b"> ", false, Escaping::Literal);
                    self.engine.begin_content = true;
                    self.engine.prefix.extend_from_slice(b"> ");
                } else {
                    let new_len = self.engine.prefix.len() - 2;
                    self.engine.prefix.truncate(new_len);
                    self.engine.blankline();
                }
            }

            NodeValue::List(..) => {
                if !entering
                    && matches!(
                        node.next_sibling().map(|n| n.data.borrow().value.clone()),
                        Some(NodeValue::CodeBlock(..)) | Some(NodeValue::List(..))
                    )
                {
                    self.engine.cr();
                    self.engine.output(b"<!-- end list -->", false, Escaping::Literal);
                    self.engine.blankline();
                }
            }

            NodeValue::Item(..) => self.format_item(node, entering),

            NodeValue::Heading(NodeHeading { level, .. }) => {
                if entering {
                    for _ in 0..level {
                        self.engine.output(b"#", false, Escaping::Literal);
                    }
                    self.engine.output(b" ", false, Escaping::Literal);
                    self.engine.begin_content = true;
                    self.engine.no_linebreaks = true;
                } else {
                    self.engine.no_linebreaks = false;
                    self.engine.blankline();
                }
            }

            NodeValue::CodeBlock(ref ncb) => {
                if entering {
                    let first_in_list_item = node.previous_sibling().is_none()
                        && matches!(
                            node.parent().map(|p| p.data.borrow().value.clone()),
                            Some(NodeValue::Item(..))
                        );

                    if !first_in_list_item {
                        self.engine.blankline();
                    }

                    let info = &ncb.info;
                    let literal = &ncb.literal;

                    let plain_indent = info.is_empty()
                        && literal.len() > 2
                        && !isspace(literal[0])
                        && !(isspace(literal[literal.len() - 1]) && isspace(literal[literal.len() - 2]))
                        && !first_in_list_item;

                    if plain_indent {
                        self.engine.output(b"    ", false, Escaping::Literal);
                        self.engine.prefix.extend_from_slice(b"    ");
                        self.engine.output(literal, false, Escaping::Literal);
                        let new_len = self.engine.prefix.len() - 4;
                        self.engine.prefix.truncate(new_len);
                    } else {
                        let fence_char = if info.contains(&b'`') { b'~' } else { b'`' };
                        let numticks = max(3, longest_char_sequence(literal, fence_char) + 1);
                        let fence: Vec<u8> = std::iter::repeat(fence_char).take(numticks).collect();
                        self.engine.output(&fence, false, Escaping::Literal);
                        if !info.is_empty() {
                            self.engine.output(b" ", false, Escaping::Literal);
                            self.engine.output(info, false, Escaping::Literal);
                        }
                        self.engine.cr();
                        self.engine.output(literal, false, Escaping::Literal);
                        self.engine.cr();
                        self.engine.output(&fence, false, Escaping::Literal);
                    }
                    self.engine.blankline();
                }
            }

            NodeValue::HtmlBlock(ref nhb) => {
                if entering {
                    self.engine.blankline();
                    self.engine.output(&nhb.literal, false, Escaping::Literal);
                    self.engine.blankline();
                }
            }

            NodeValue::CustomBlock(ref custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.engine.output(text, false, Escaping::Literal);
            }

            NodeValue::ThematicBreak => {
                if entering {
                    self.engine.blankline();
                    self.engine.output(b"-----", false, Escaping::Literal);
                    self.engine.blankline();
                }
            }

            NodeValue::Paragraph => {
                if !entering {
                    self.engine.blankline();
                }
            }

            NodeValue::Text(ref literal) => {
                if entering {
                    self.engine.output(literal, allow_wrap, Escaping::Normal);
                }
            }

            NodeValue::LineBreak => {
                if entering {
                    if !self.options.render.hardbreaks {
                        self.engine.output(b"\\", false, Escaping::Literal);
                    }
                    self.engine.cr();
                }
            }

            NodeValue::SoftBreak => {
                if entering {
                    if !self.engine.no_linebreaks && self.options.render.width == 0 && !self.options.render.hardbreaks {
                        self.engine.cr();
                    } else {
                        self.engine.output(b" ", allow_wrap, Escaping::Literal);
                    }
                }
            }

            NodeValue::Code(ref literal) => {
                if entering {
                    let numticks = shortest_unused_sequence(literal, b'`');
                    let ticks: Vec<u8> = std::iter::repeat(b'`').take(numticks).collect();
                    self.engine.output(&ticks, false, Escaping::Literal);

                    let all_space = literal.iter().all(|&c| c == b' ' || c == b'\r' || c == b'\n');
                    let has_edge_space =
                        literal.first() == Some(&b' ') || literal.last() == Some(&b' ');
                    let has_edge_backtick =
                        literal.first() == Some(&b'`') || literal.last() == Some(&b'`');
                    let pad = literal.is_empty() || has_edge_backtick || (!all_space && has_edge_space);

                    if pad {
                        self.engine.output(b" ", false, Escaping::Literal);
                    }
                    self.engine.output(literal, allow_wrap, Escaping::Literal);
                    if pad {
                        self.engine.output(b" ", false, Escaping::Literal);
                    }
                    self.engine.output(&ticks, false, Escaping::Literal);
                }
            }

            NodeValue::HtmlInline(ref literal) => {
                if entering {
                    self.engine.output(literal, false, Escaping::Literal);
                }
            }

            NodeValue::CustomInline(ref custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.engine.output(text, false, Escaping::Literal);
            }

            NodeValue::Strong => {
                self.engine.output(b"**", false, Escaping::Literal);
            }

            NodeValue::Emph => {
                let emph_delim = if node
                    .parent()
                    .map(|p| matches!(p.data.borrow().value, NodeValue::Emph))
                    .unwrap_or(false)
                    && node.next_sibling().is_none()
                    && node.previous_sibling().is_none()
                {
                    b'_'
                } else {
                    b'*'
                };
                self.engine.output(&[emph_delim], false, Escaping::Literal);
            }

            NodeValue::Link(ref nl) => {
                if is_autolink(node, nl) {
                    if entering {
                        self.engine.output(b"<", false, Escaping::Literal);
                        self.engine
                            .output(trim_start_match(&nl.url, "mailto:"), false, Escaping::Literal);
                        self.engine.output(b">", false, Escaping::Literal);
                        return false;
                    }
                } else if entering {
                    self.engine.output(b"[", false, Escaping::Literal);
                } else {
                    self.engine.output(b"](", false, Escaping::Literal);
                    self.engine.output(&nl.url, false, Escaping::Url);
                    if !nl.title.is_empty() {
                        self.engine.output(b" \"", false, Escaping::Literal);
                        self.engine.output(&nl.title, false, Escaping::Title);
                        self.engine.output(b"\"", false, Escaping::Literal);
                    }
                    self.engine.output(b")", false, Escaping::Literal);
                }
            }

            NodeValue::Image(ref nl) => {
                if entering {
                    self.engine.output(b"![", false, Escaping::Literal);
                } else {
                    self.engine.output(b"](", false, Escaping::Literal);
                    self.engine.output(&nl.url, false, Escaping::Url);
                    if !nl.title.is_empty() {
                        self.engine.output(b" \"", allow_wrap, Escaping::Literal);
                        self.engine.output(&nl.title, false, Escaping::Title);
                        self.engine.output(b"\"", false, Escaping::Literal);
                    }
                    self.engine.output(b")", false, Escaping::Literal);
                }
            }
        }

        true
    }
}

fn longest_char_sequence(literal: &[u8], ch: u8) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &c in literal {
        if c == ch {
            current += 1;
        } else {
            longest = longest.max(current);
            current = 0;
        }
    }
    longest.max(current)
}

fn shortest_unused_sequence(literal: &[u8], f: u8) -> usize {
    let mut used: u64 = 1;
    let mut current = 0;
    for &c in literal {
        if c == f {
            current += 1;
        } else {
            if current > 0 {
                used |= 1 << current;
            }
            current = 0;
        }
    }
    if current > 0 {
        used |= 1 << current;
    }

    let mut i = 0;
    while used & 1 != 0 {
        used >>= 1;
        i += 1;
    }
    i
}

fn is_autolink<'a>(node: &'a AstNode<'a>, nl: &NodeLink) -> bool {
    if nl.url.is_empty() || scanners::scheme(&nl.url).is_none() || !nl.title.is_empty() {
        return false;
    }

    let link_text = match node.first_child() {
        Some(child) => match child.data.borrow().value {
            NodeValue::Text(ref t) => t.clone(),
            _ => return false,
        },
        None => return false,
    };

    trim_start_match(&nl.url, "mailto:") == link_text.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use typed_arena::Arena;

    fn render(md: &str) -> String {
        let arena = Arena::new();
        let options = Options::default();
        let root = parse_document(&arena, md.as_bytes(), &options).unwrap();
        String::from_utf8(format_document(root, &options)).unwrap()
    }

    #[test]
    fn round_trips_emphasis_and_strong() {
        let out = render("hello *world* and **strong**\n");
        assert!(out.contains("*world*"));
        assert!(out.contains("**strong**"));
    }

    #[test]
    fn fenced_code_block_keeps_info_string() {
        let out = render("```rust\nfn f() {}\n```\n");
        assert!(out.contains("```rust"));
        assert!(out.contains("fn f() {}"));
    }

    #[test]
    fn link_round_trips_destination_and_title() {
        let out = render("[x](/url \"t\")\n");
        assert!(out.contains("[x](/url \"t\")"));
    }

    #[test]
    fn autolink_renders_with_angle_brackets() {
        let out = render("<https://example.com>\n");
        assert!(out.contains("<https://example.com>"));
    }
}
