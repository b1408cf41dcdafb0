//! HTML rendering (spec §4.10).
//!
//! Node-to-tag mapping and the safe-mode defaults are grounded on
//! `original_source/src/html.c`'s `S_render_node`/`cssg_render_html`; the
//! escaping helpers (`escape`, `escape_href`, `dangerous_url`) are ported
//! from the teacher's `src/html.rs`, which already separates text escaping
//! from URL-attribute escaping. The teacher's `tagfilter` pass is a GitHub
//! Flavored Markdown extension with no counterpart in spec.md/`original_source`
//! and is not ported here.

use crate::ctype::isspace;
use crate::nodes;
use crate::nodes::{AstNode, NodeHeading, NodeValue};
use crate::parser::options::Options;
use crate::render::{Engine, NodeFormatter};
use crate::scanners;

/// `"`, `&`, `<`, `>` entity-escaped, appropriate for free text and
/// attribute values other than URLs.
pub fn escape(out: &mut Vec<u8>, buf: &[u8]) {
    for &b in buf {
        match b {
            b'"' => out.extend_from_slice(b"&quot;"),
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            _ => out.push(b),
        }
    }
}

const HREF_SAFE: [bool; 256] = crate::character_set::character_set!(
    b"-_.+!*(),%#@?=;:/,+$~",
    b"abcdefghijklmnopqrstuvwxyz",
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
);

/// Percent-encodes everything outside a conservative URL-safe set,
/// preserving `%`-encoded sequences a user already wrote (spec §4.10's href
/// escaping rule).
pub fn escape_href(out: &mut Vec<u8>, buf: &[u8]) {
    let mut i = 0;
    while i < buf.len() {
        let org = i;
        while i < buf.len() && HREF_SAFE[buf[i] as usize] {
            i += 1;
        }
        out.extend_from_slice(&buf[org..i]);
        if i >= buf.len() {
            break;
        }
        match buf[i] {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'\'' => out.extend_from_slice(b"&#x27;"),
            c => out.extend_from_slice(format!("%{:02X}", c).as_bytes()),
        }
        i += 1;
    }
}

pub fn dangerous_url(url: &[u8]) -> bool {
    scanners::dangerous_url(url)
}

struct HtmlFormatter<'a, 'o> {
    engine: Engine,
    options: &'o Options,
    plain: Option<&'a AstNode<'a>>,
}

/// Render `root` as an HTML fragment. The caller is responsible for any
/// surrounding document shell.
pub fn format_document<'a>(root: &'a AstNode<'a>, options: &Options) -> Vec<u8> {
    let mut f = HtmlFormatter {
        engine: Engine::new(0),
        options,
        plain: None,
    };
    f.format(root);
    f.engine.finish()
}

impl<'a, 'o> HtmlFormatter<'a, 'o> {
    fn cr(&mut self) {
        self.engine.cr();
    }

    fn literal(&mut self, s: &[u8]) {
        self.engine.buf.extend_from_slice(s);
    }

    fn escaped(&mut self, s: &[u8]) {
        let mut out = Vec::with_capacity(s.len());
        escape(&mut out, s);
        self.engine.buf.extend_from_slice(&out);
    }

    fn sourcepos(&mut self, node: &'a AstNode<'a>) {
        if self.options.render.sourcepos {
            let ast = node.data.borrow();
            let s = format!(
                " data-sourcepos=\"{}:{}-{}:{}\"",
                ast.start_line, ast.start_column, ast.end_line, ast.end_column
            );
            self.literal(s.as_bytes());
        }
    }

    fn render_href_attr(&mut self, url: &[u8]) {
        if !url.is_empty() && (self.options.render.unsafe_ || !dangerous_url(url)) {
            let mut out = Vec::with_capacity(url.len());
            escape_href(&mut out, url);
            self.literal(&out);
        }
    }
}

impl<'a, 'o> NodeFormatter<'a> for HtmlFormatter<'a, 'o> {
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
            match node.data.borrow().value {
                NodeValue::Text(ref t) | NodeValue::Code(ref t) | NodeValue::HtmlInline(ref t) => {
                    self.escaped(t)
                }
                NodeValue::LineBreak | NodeValue::SoftBreak => self.literal(b" "),
                _ => (),
            }
            return true;
        }

        match node.data.borrow().value.clone() {
            NodeValue::Document => (),

            NodeValue::BlockQuote => {
                self.cr();
                if entering {
                    self.literal(b"<blockquote");
                    self.sourcepos(node);
                    self.literal(b">\n");
                } else {
                    self.cr();
                    self.literal(b"</blockquote>\n");
                }
            }

            NodeValue::List(nl) => {
                self.cr();
                if entering {
                    if nl.list_type == nodes::ListType::Bullet {
                        self.literal(b"<ul");
                        self.sourcepos(node);
                        self.literal(b">\n");
                    } else if nl.start == 1 {
                        self.literal(b"<ol");
                        self.sourcepos(node);
                        self.literal(b">\n");
                    } else {
                        self.literal(format!("<ol start=\"{}\"", nl.start).as_bytes());
                        self.sourcepos(node);
                        self.literal(b">\n");
                    }
                } else {
                    self.literal(if nl.list_type == nodes::ListType::Bullet {
                        b"</ul>\n"
                    } else {
                        b"</ol>\n"
                    });
                }
            }

            NodeValue::Item(..) => {
                if entering {
                    self.cr();
                    self.literal(b"<li");
                    self.sourcepos(node);
                    self.literal(b">");
                } else {
                    self.literal(b"</li>\n");
                }
            }

            NodeValue::Heading(NodeHeading { level, .. }) => {
                if entering {
                    self.cr();
                    self.literal(format!("<h{}", level).as_bytes());
                    self.sourcepos(node);
                    self.literal(b">");
                } else {
                    self.literal(format!("</h{}>\n", level).as_bytes());
                }
            }

            NodeValue::CodeBlock(ncb) => {
                self.cr();
                if ncb.info.is_empty() {
                    self.literal(b"<pre");
                    self.sourcepos(node);
                    self.literal(b"><code>");
                } else {
                    let first_tag_end = ncb.info.iter().position(|&c| isspace(c)).unwrap_or(ncb.info.len());
                    self.literal(b"<pre");
                    self.sourcepos(node);
                    self.literal(b"><code class=\"");
                    if !ncb.info.starts_with(b"language-") {
                        self.literal(b"language-");
                    }
                    self.escaped(&ncb.info[..first_tag_end]);
                    self.literal(b"\">");
                }
                self.escaped(&ncb.literal);
                self.literal(b"</code></pre>\n");
            }

            NodeValue::HtmlBlock(nhb) => {
                self.cr();
                if !self.options.render.unsafe_ {
                    self.literal(b"<!-- raw HTML omitted -->");
                } else {
                    self.literal(&nhb.literal);
                }
                self.cr();
            }

            NodeValue::CustomBlock(custom) => {
                self.cr();
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.literal(text);
                self.cr();
            }

            NodeValue::ThematicBreak => {
                self.cr();
                self.literal(b"<hr");
                self.sourcepos(node);
                self.literal(b" />\n");
            }

            NodeValue::Paragraph => {
                let tight = node
                    .parent()
                    .and_then(|p| p.parent())
                    .map(|gp| matches!(gp.data.borrow().value, NodeValue::List(ref l) if l.tight))
                    .unwrap_or(false);
                if !tight {
                    if entering {
                        self.cr();
                        self.literal(b"<p");
                        self.sourcepos(node);
                        self.literal(b">");
                    } else {
                        self.literal(b"</p>\n");
                    }
                }
            }

            NodeValue::Text(t) => {
                if entering {
                    self.escaped(&t);
                }
            }

            NodeValue::LineBreak => {
                if entering {
                    self.literal(b"<br />\n");
                }
            }

            NodeValue::SoftBreak => {
                if entering {
                    if self.options.render.hardbreaks {
                        self.literal(b"<br />\n");
                    } else if self.options.render.nobreaks {
                        self.literal(b" ");
                    } else {
                        self.literal(b"\n");
                    }
                }
            }

            NodeValue::Code(code) => {
                if entering {
                    self.literal(b"<code>");
                    self.escaped(&code);
                    self.literal(b"</code>");
                }
            }

            NodeValue::HtmlInline(literal) => {
                if entering {
                    if !self.options.render.unsafe_ {
                        self.literal(b"<!-- raw HTML omitted -->");
                    } else {
                        self.literal(&literal);
                    }
                }
            }

            NodeValue::CustomInline(custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                self.literal(text);
            }

            NodeValue::Strong => {
                self.literal(if entering { b"<strong>" } else { b"</strong>" });
            }

            NodeValue::Emph => {
                self.literal(if entering { b"<em>" } else { b"</em>" });
            }

            NodeValue::Link(nl) => {
                if entering {
                    self.literal(b"<a href=\"");
                    self.render_href_attr(&nl.url);
                    if !nl.title.is_empty() {
                        self.literal(b"\" title=\"");
                        self.escaped(&nl.title);
                    }
                    self.literal(b"\">");
                } else {
                    self.literal(b"</a>");
                }
            }

            NodeValue::Image(nl) => {
                if entering {
                    self.literal(b"<img src=\"");
                    self.render_href_attr(&nl.url);
                    self.literal(b"\" alt=\"");
                    self.plain = Some(node);
                } else {
                    if !nl.title.is_empty() {
                        self.literal(b"\" title=\"");
                        self.escaped(&nl.title);
                    }
                    self.literal(b"\" />");
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

    fn render(md: &str, options: &Options) -> String {
        let arena = Arena::new();
        let root = parse_document(&arena, md.as_bytes(), options).unwrap();
        String::from_utf8(format_document(root, options)).unwrap()
    }

    #[test]
    fn renders_paragraph_and_emphasis() {
        let out = render("hello *world*\n", &Options::default());
        assert_eq!(out, "<p>hello <em>world</em></p>\n");
    }

    #[test]
    fn escapes_text_content() {
        let out = render("a < b & c\n", &Options::default());
        assert!(out.contains("&lt;"));
        assert!(out.contains("&amp;"));
    }

    #[test]
    fn dangerous_url_is_blanked_by_default() {
        let out = render("[x](javascript:alert(1))\n", &Options::default());
        assert_eq!(out, "<p><a href=\"\">x</a></p>\n");
    }

    #[test]
    fn raw_html_is_commented_out_unless_unsafe() {
        let out = render("<div>hi</div>\n", &Options::default());
        assert!(out.contains("<!-- raw HTML omitted -->"));

        let mut opts = Options::default();
        opts.render.unsafe_ = true;
        let out = render("<div>hi</div>\n", &opts);
        assert!(out.contains("<div>hi</div>"));
    }

    #[test]
    fn raw_inline_html_passes_through_unescaped_under_unsafe() {
        let mut opts = Options::default();
        opts.render.unsafe_ = true;
        let out = render("hi <script>bad</script> there\n", &opts);
        assert!(out.contains("<script>bad</script>"));
    }
}
