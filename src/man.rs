//! groff `man` rendering (spec §4.10's groff escaping rules).
//!
//! Neither the teacher nor the original C implementation ships a man
//! backend (the teacher has none at all; `original_source/src/latex.c`
//! fills this renderer slot in the original with LaTeX instead). This is
//! grounded on the *shape* of `latex.c`'s non-HTML renderer (a per-byte
//! escaping function feeding the same emitter primitives as every other
//! format) and on `render.rs`'s shared `Engine`/`NodeFormatter` skeleton,
//! reused rather than reimplemented. Since no corpus file specifies man's
//! exact list/heading conventions, this follows common `groff`/`man(7)`
//! practice: `.SH`/`.SS` for headings, `.IP` for list items, `.RS`/`.RE`
//! for block quotes, `.nf`/`.fi` for preformatted code.

use crate::nodes::{AstNode, ListType, NodeHeading, NodeValue};
use crate::parser::options::Options;
use crate::render::{Engine, Escaping, NodeFormatter};

/// Render `root` as a groff `man` document fragment (no `.TH` title line;
/// the AST carries no document-title metadata to populate one).
pub fn format_document<'a>(root: &'a AstNode<'a>, options: &Options) -> Vec<u8> {
    let mut f = ManFormatter {
        engine: Engine::new(options.render.width),
        options,
        plain: None,
    };
    f.format(root);
    f.engine.finish()
}

struct ManFormatter<'a, 'o> {
    engine: Engine,
    options: &'o Options,
    plain: Option<&'a AstNode<'a>>,
}

impl<'a, 'o> ManFormatter<'a, 'o> {
    fn literal(&mut self, s: &[u8]) {
        self.engine.buf.extend_from_slice(s);
    }

    /// Quote `\`, `-`, `'`, and non-ASCII per spec's groff escaping rule,
    /// then hand the result to the engine for wrap/cr-aware emission.
    fn text(&mut self, buf: &[u8], wrap: bool) {
        let escaped = escape_groff(buf);
        if self.engine.begin_line && matches!(escaped.first(), Some(b'.') | Some(b'\'')) {
            self.engine.output(b"\\&", false, Escaping::Literal);
        }
        self.engine.output(&escaped, wrap, Escaping::Literal);
    }

    /// Like `text`, but guards the start of every embedded line (used for
    /// preformatted code blocks, which may legitimately contain newlines).
    fn block_text(&mut self, buf: &[u8]) {
        let mut first = true;
        for line in buf.split(|&b| b == b'\n') {
            if !first {
                self.engine.output(b"\n", false, Escaping::Literal);
            }
            first = false;
            self.text(line, false);
        }
    }

    fn is_tight_item_paragraph(&self, node: &'a AstNode<'a>) -> bool {
        node.parent()
            .and_then(|p| p.parent())
            .map(|gp| matches!(gp.data.borrow().value, NodeValue::List(ref l) if l.tight))
            .unwrap_or(false)
    }
}

/// Escape `\`, `-`, `'` and encode non-ASCII characters via groff's
/// `\[uXXXX]` Unicode escape (spec §4.10).
fn escape_groff(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    for c in String::from_utf8_lossy(buf).chars() {
        match c {
            '\\' => out.extend_from_slice(b"\\e"),
            '-' => out.extend_from_slice(b"\\-"),
            '\'' => out.extend_from_slice(b"\\(aq"),
            '\n' => out.push(b'\n'),
            c if c.is_ascii() => out.push(c as u8),
            c => out.extend_from_slice(format!("\\[u{:04X}]", c as u32).as_bytes()),
        }
    }
    out
}

impl<'a, 'o> NodeFormatter<'a> for ManFormatter<'a, 'o> {
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
                    NodeValue::Text(ref t) | NodeValue::Code(ref t) => {
                        let t = t.clone();
                        self.text(&t, false);
                    }
                    NodeValue::LineBreak | NodeValue::SoftBreak => self.literal(b" "),
                    _ => (),
                }
            }
            return true;
        }

        let allow_wrap = self.options.render.width > 0 && !self.options.render.hardbreaks;

        match node.data.borrow().value.clone() {
            NodeValue::Document => (),

            NodeValue::BlockQuote => {
                if entering {
                    self.engine.blankline();
                    self.literal(b".RS 4\n");
                } else {
                    self.engine.blankline();
                    self.literal(b".RE\n");
                }
            }

            NodeValue::List(..) => (),

            NodeValue::Item(..) => {
                if entering {
                    self.engine.cr();
                    let parent = match node.parent().unwrap().data.borrow().value {
                        NodeValue::List(ref nl) => *nl,
                        _ => unreachable!(),
                    };
                    if parent.list_type == ListType::Bullet {
                        self.literal(b".IP \\(bu 4\n");
                    } else {
                        let mut n = parent.start;
                        let mut prev = node;
                        while let Some(p) = prev.previous_sibling() {
                            prev = p;
                            n += 1;
                        }
                        self.literal(format!(".IP \"{}.\" 4\n", n).as_bytes());
                    }
                }
            }

            NodeValue::Heading(NodeHeading { level, .. }) => {
                if entering {
                    self.engine.blankline();
                    let macro_name = if level <= 1 { ".SH" } else { ".SS" };
                    self.literal(format!("{} \"", macro_name).as_bytes());
                    self.engine.begin_content = true;
                    self.engine.no_linebreaks = true;
                } else {
                    self.engine.no_linebreaks = false;
                    self.literal(b"\"\n");
                    self.engine.blankline();
                }
            }

            NodeValue::CodeBlock(ref ncb) => {
                if entering {
                    self.engine.blankline();
                    self.literal(b".nf\n");
                    self.block_text(&ncb.literal);
                    self.engine.cr();
                    self.literal(b".fi\n");
                    self.engine.blankline();
                }
            }

            NodeValue::HtmlBlock(..) => {
                // groff has no useful rendering of raw HTML; the block is
                // dropped regardless of `unsafe_` (that flag governs the
                // HTML renderer's own XSS-safety tradeoff, not this one).
            }

            NodeValue::CustomBlock(ref custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.literal(text);
            }

            NodeValue::ThematicBreak => {
                if entering {
                    self.engine.blankline();
                    self.literal(b".ce\n\\l'2i'\n.ce 0\n");
                    self.engine.blankline();
                }
            }

            NodeValue::Paragraph => {
                let tight = self.is_tight_item_paragraph(node);
                if entering {
                    if !tight {
                        self.engine.cr();
                        self.literal(b".PP\n");
                    }
                } else {
                    self.engine.blankline();
                }
            }

            NodeValue::Text(ref t) => {
                if entering {
                    self.text(t, allow_wrap);
                }
            }

            NodeValue::LineBreak => {
                if entering {
                    self.engine.cr();
                    self.literal(b".br\n");
                }
            }

            NodeValue::SoftBreak => {
                if entering {
                    if self.options.render.hardbreaks {
                        self.engine.cr();
                        self.literal(b".br\n");
                    } else {
                        self.text(b" ", allow_wrap);
                    }
                }
            }

            NodeValue::Code(ref t) => {
                if entering {
                    self.literal(b"\\f(CR");
                    self.text(t, allow_wrap);
                    self.literal(b"\\fP");
                }
            }

            NodeValue::HtmlInline(..) => (),

            NodeValue::CustomInline(ref custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.literal(text);
            }

            NodeValue::Strong => {
                self.literal(if entering { b"\\fB" } else { b"\\fP" });
            }

            NodeValue::Emph => {
                self.literal(if entering { b"\\fI" } else { b"\\fP" });
            }

            NodeValue::Link(ref nl) => {
                if entering {
                    self.literal(b"\\fI");
                } else {
                    self.literal(b"\\fP");
                    if !nl.url.is_empty() {
                        self.literal(b" (");
                        self.text(&nl.url, false);
                        self.literal(b")");
                    }
                }
            }

            NodeValue::Image(ref nl) => {
                if entering {
                    self.literal(b"[IMAGE: ");
                    self.plain = Some(node);
                } else {
                    self.literal(b"]");
                    if !nl.url.is_empty() {
                        self.literal(b" (");
                        self.text(&nl.url, false);
                        self.literal(b")");
                    }
                }
            }
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
    fn heading_emits_sh_macro() {
        let out = render("# Title\n");
        assert!(out.contains(".SH \"Title\""));
    }

    #[test]
    fn paragraph_gets_pp_macro() {
        let out = render("hello world\n");
        assert!(out.contains(".PP\n"));
    }

    #[test]
    fn hyphen_is_escaped() {
        let out = render("a-b\n");
        assert!(out.contains("a\\-b"));
    }

    #[test]
    fn bullet_list_item_uses_ip_bu() {
        let out = render("- one\n- two\n");
        assert!(out.contains(".IP \\(bu 4"));
    }

    #[test]
    fn code_block_wrapped_in_nf_fi() {
        let out = render("```\nfn f() {}\n```\n");
        assert!(out.contains(".nf\n"));
        assert!(out.contains(".fi\n"));
    }
}
