//! HTML-renderer-focused integration tests (safe-mode defaults, escaping).

use crate::markdown_to_html;
use crate::parser::options::{Options, RenderOptions};

fn render(md: &str) -> String {
    markdown_to_html(md, &Options::default()).unwrap()
}

#[test]
fn raw_html_is_replaced_by_a_comment_placeholder_by_default() {
    let out = render("<script>alert(1)</script>\n\nhi\n");
    assert!(!out.contains("<script>alert(1)</script>"));
    assert!(out.contains("<!-- raw HTML omitted -->"));
}

#[test]
fn unsafe_mode_passes_raw_html_through() {
    let options = Options {
        render: RenderOptions { unsafe_: true, ..RenderOptions::default() },
        ..Options::default()
    };
    let arena = typed_arena::Arena::new();
    let root = crate::parse_document(&arena, b"<em>hi</em>\n", &options).unwrap();
    let out = String::from_utf8(crate::html::format_document(root, &options)).unwrap();
    assert!(out.contains("<em>hi</em>"));
}

#[test]
fn javascript_link_is_neutralized_by_default() {
    let out = render("[x](javascript:alert(1))\n");
    assert!(!out.contains("javascript:"));
}

#[test]
fn ampersand_and_angle_brackets_are_entity_escaped() {
    let out = render("A & B < C\n");
    assert!(out.contains("A &amp; B &lt; C"));
}
