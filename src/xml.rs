//! XML rendering (spec §4.10): a literal, lossless serialization of the AST
//! used mainly for testing/tooling rather than human consumption.
//!
//! Grounded on `examples/kivikakk-comrak/src/xml.rs` (DOCTYPE/namespace
//! emission, the indent-depth cap, and the `character_set!`-driven escape
//! table), trimmed of every GFM-only node case (tables, footnotes,
//! tasklists, math, alerts, wikilinks) that has no counterpart here.

use crate::character_set::character_set;
use crate::nodes::{AstNode, ListDelimType, ListType, NodeHeading, NodeValue};
use crate::parser::options::Options;
use crate::render::{Engine, NodeFormatter};
use std::cmp;

const MAX_INDENT: u32 = 40;

/// Render `root` as a standalone CommonMark XML document (DOCTYPE + root
/// `<document>` element).
pub fn format_document<'a>(root: &'a AstNode<'a>, options: &Options) -> Vec<u8> {
    let mut f = XmlFormatter {
        engine: Engine::new(0),
        options,
        indent: 0,
        plain: None,
    };
    f.engine
        .buf
        .extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    f.engine
        .buf
        .extend_from_slice(b"<!DOCTYPE document SYSTEM \"CommonMark.dtd\">\n");
    f.format(root);
    f.engine.buf
}

fn xml_node_name(value: &NodeValue) -> &'static str {
    match value {
        NodeValue::Document => "document",
        NodeValue::BlockQuote => "block_quote",
        NodeValue::List(..) => "list",
        NodeValue::Item(..) => "item",
        NodeValue::CodeBlock(..) => "code_block",
        NodeValue::HtmlBlock(..) => "html_block",
        NodeValue::CustomBlock(..) => "custom_block",
        NodeValue::Paragraph => "paragraph",
        NodeValue::Heading(..) => "heading",
        NodeValue::ThematicBreak => "thematic_break",
        NodeValue::Text(..) => "text",
        NodeValue::SoftBreak => "softbreak",
        NodeValue::LineBreak => "linebreak",
        NodeValue::Code(..) => "code",
        NodeValue::HtmlInline(..) => "html_inline",
        NodeValue::CustomInline(..) => "custom_inline",
        NodeValue::Emph => "emph",
        NodeValue::Strong => "strong",
        NodeValue::Link(..) => "link",
        NodeValue::Image(..) => "image",
    }
}

struct XmlFormatter<'a, 'o> {
    engine: Engine,
    options: &'o Options,
    indent: u32,
    plain: Option<&'a AstNode<'a>>,
}

impl<'a, 'o> XmlFormatter<'a, 'o> {
    fn escape(&mut self, buf: &[u8]) {
        const XML_UNSAFE: [bool; 256] = character_set!(b"&<>\"");

        let mut offset = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if XML_UNSAFE[byte as usize] {
                let esc: &[u8] = match byte {
                    b'"' => b"&quot;",
                    b'&' => b"&amp;",
                    b'<' => b"&lt;",
                    b'>' => b"&gt;",
                    _ => unreachable!(),
                };
                self.engine.buf.extend_from_slice(&buf[offset..i]);
                self.engine.buf.extend_from_slice(esc);
                offset = i + 1;
            }
        }
        self.engine.buf.extend_from_slice(&buf[offset..]);
    }

    fn literal(&mut self, s: &[u8]) {
        self.engine.buf.extend_from_slice(s);
    }

    fn indent_line(&mut self) {
        for _ in 0..cmp::min(self.indent, MAX_INDENT) {
            self.literal(b" ");
        }
    }

    fn sourcepos(&mut self, node: &'a AstNode<'a>) {
        if self.options.render.sourcepos {
            let ast = node.data.borrow();
            let s = format!(
                " sourcepos=\"{}:{}-{}:{}\"",
                ast.start_line, ast.start_column, ast.end_line, ast.end_column
            );
            self.literal(s.as_bytes());
        }
    }
}

impl<'a, 'o> NodeFormatter<'a> for XmlFormatter<'a, 'o> {
    fn engine(&mut self) -> &mut Engine {
        &mut self.engine
    }

    fn format_node(&mut self, node: &'a AstNode<'a>, entering: bool) -> bool {
        if let Some(plain_node) = self.plain {
            if plain_node.same_node(node) {
                self.plain = None;
            }
        }

        if self.plain.is_some() {
            if entering {
                match node.data.borrow().value {
                    NodeValue::Text(ref t) | NodeValue::Code(ref t) | NodeValue::HtmlInline(ref t) => {
                        self.escape(t)
                    }
                    NodeValue::LineBreak | NodeValue::SoftBreak => self.literal(b" "),
                    _ => (),
                }
            }
            return true;
        }

        if entering {
            self.indent_line();
            let value = node.data.borrow().value.clone();
            let name = xml_node_name(&value);
            self.literal(format!("<{}", name).as_bytes());
            self.sourcepos(node);

            let mut was_literal = false;

            match value {
                NodeValue::Document => self.literal(b" xmlns=\"http://commonmark.org/xml/1.0\""),

                NodeValue::Text(ref literal) | NodeValue::Code(ref literal) | NodeValue::HtmlInline(ref literal) => {
                    self.literal(b" xml:space=\"preserve\">");
                    self.escape(literal);
                    self.literal(format!("</{}", name).as_bytes());
                    was_literal = true;
                }

                NodeValue::HtmlBlock(ref nhb) => {
                    self.literal(b" xml:space=\"preserve\">");
                    self.escape(&nhb.literal);
                    self.literal(format!("</{}", name).as_bytes());
                    was_literal = true;
                }

                NodeValue::List(ref nl) => {
                    match nl.list_type {
                        ListType::Bullet => self.literal(b" type=\"bullet\""),
                        ListType::Ordered => {
                            let delim = match nl.delimiter {
                                ListDelimType::Period => "period",
                                ListDelimType::Paren => "paren",
                            };
                            self.literal(
                                format!(" type=\"ordered\" start=\"{}\" delim=\"{}\"", nl.start, delim)
                                    .as_bytes(),
                            );
                        }
                    }
                    self.literal(format!(" tight=\"{}\"", nl.tight).as_bytes());
                }

                NodeValue::Heading(NodeHeading { level, .. }) => {
                    self.literal(format!(" level=\"{}\"", level).as_bytes());
                }

                NodeValue::CodeBlock(ref ncb) => {
                    if !ncb.info.is_empty() {
                        self.literal(b" info=\"");
                        self.escape(&ncb.info);
                        self.literal(b"\"");
                    }
                    self.literal(b" xml:space=\"preserve\">");
                    self.escape(&ncb.literal);
                    self.literal(format!("</{}", name).as_bytes());
                    was_literal = true;
                }

                NodeValue::Link(ref nl) | NodeValue::Image(ref nl) => {
                    self.literal(b" destination=\"");
                    self.escape(&nl.url);
                    self.literal(b"\" title=\"");
                    self.escape(&nl.title);
                    self.literal(b"\"");
                }

                NodeValue::CustomBlock(ref custom) | NodeValue::CustomInline(ref custom) => {
                    self.literal(b" on_enter=\"");
                    self.escape(&custom.on_enter);
                    self.literal(b"\" on_exit=\"");
                    self.escape(&custom.on_exit);
                    self.literal(b"\"");
                }

                NodeValue::BlockQuote
                | NodeValue::Item(..)
                | NodeValue::Paragraph
                | NodeValue::ThematicBreak
                | NodeValue::LineBreak
                | NodeValue::SoftBreak
                | NodeValue::Strong
                | NodeValue::Emph => (),
            }

            if node.first_child().is_some() {
                self.indent += 2;
            } else if !was_literal {
                self.literal(b" /");
            }
            self.literal(b">\n");

            if let NodeValue::Image(_) = node.data.borrow().value {
                self.plain = Some(node);
            }
        } else if node.first_child().is_some() {
            self.indent -= 2;
            self.indent_line();
            let name = xml_node_name(&node.data.borrow().value);
            self.literal(format!("</{}>\n", name).as_bytes());
        }

        true
    }
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
    fn emits_doctype_and_namespace() {
        let out = render("hi\n");
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(out.contains("xmlns=\"http://commonmark.org/xml/1.0\""));
    }

    #[test]
    fn text_node_is_self_closed_with_preserve_space() {
        let out = render("hi\n");
        assert!(out.contains("<text xml:space=\"preserve\">hi</text>"));
    }

    #[test]
    fn heading_reports_level_attribute() {
        let out = render("# hi\n");
        assert!(out.contains("<heading level=\"1\">"));
    }

    #[test]
    fn empty_elements_self_close() {
        let out = render("---\n");
        assert!(out.contains("<thematic_break"));
        assert!(out.contains("/>"));
    }
}
