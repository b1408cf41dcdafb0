//! CommonMark-output-renderer integration tests: round-tripping Markdown
//! back through itself should reparse to an equivalent tree.

use crate::cm::format_document;
use crate::parser::options::Options;
use crate::parser::parse_document;
use typed_arena::Arena;

fn render_cm(md: &str) -> String {
    let arena = Arena::new();
    let options = Options::default();
    let root = parse_document(&arena, md.as_bytes(), &options).unwrap();
    String::from_utf8(format_document(root, &options)).unwrap()
}

fn render_html(md: &str) -> String {
    crate::markdown_to_html(md, &Options::default()).unwrap()
}

#[test]
fn reserializing_and_reparsing_preserves_html_output() {
    let md = "# Title\n\nSome *emphasis* and **strong** text.\n\n> a quote\n\n- one\n- two\n";
    let once = render_cm(md);
    let twice = render_cm(&once);
    assert_eq!(render_html(&once), render_html(&twice));
}

#[test]
fn blockquote_round_trips_with_marker() {
    let out = render_cm("> hi\n");
    assert!(out.contains("> hi"));
}

#[test]
fn fenced_code_keeps_its_info_string_on_reserialization() {
    let out = render_cm("```rust\nfn f() {}\n```\n");
    assert!(out.contains("```rust"));
    assert!(out.contains("fn f() {}"));
}
