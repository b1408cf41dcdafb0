//! Regressions for specific bugs caught while building this crate.

use crate::markdown_to_html;
use crate::parser::options::{Options, RenderOptions};
use crate::parser::parse_document;
use typed_arena::Arena;

/// `Parser::finalize` used to leave every block's `end_column` at its
/// `make_block` default of zero, since nothing updated it after a line was
/// consumed.
#[test]
fn block_end_column_is_not_left_at_zero() {
    let arena = Arena::new();
    let options = Options {
        render: RenderOptions { sourcepos: true, ..RenderOptions::default() },
        ..Options::default()
    };
    let root = parse_document(&arena, b"hello\n", &options).unwrap();
    let paragraph = root.first_child().unwrap();
    let ast = paragraph.data.borrow();
    assert_ne!(ast.end_column, 0);
    assert_eq!(ast.end_column, 5);
}

#[test]
fn setext_heading_is_distinguished_from_thematic_break() {
    let out = markdown_to_html("Title\n-----\n", &Options::default()).unwrap();
    assert!(out.starts_with("<h2>Title</h2>"));

    let out = markdown_to_html("---\n", &Options::default()).unwrap();
    assert_eq!(out, "<hr />\n");
}

#[test]
fn a_lazy_continuation_line_stays_inside_the_blockquote() {
    let out = markdown_to_html("> a\nb\n", &Options::default()).unwrap();
    assert_eq!(out, "<blockquote>\n<p>a\nb</p>\n</blockquote>\n");
}

#[test]
fn an_unclosed_fenced_code_block_still_closes_at_eof() {
    let out = markdown_to_html("```\ncode\n", &Options::default()).unwrap();
    assert_eq!(out, "<pre><code>code\n</code></pre>\n");
}
