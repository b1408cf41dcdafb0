//! XML-renderer integration tests (structural shape, not covered by the
//! renderer's own inline unit tests).

use crate::parser::options::Options;
use crate::parser::parse_document;
use crate::xml::format_document;
use typed_arena::Arena;

fn render(md: &str) -> String {
    let arena = Arena::new();
    let options = Options::default();
    let root = parse_document(&arena, md.as_bytes(), &options).unwrap();
    String::from_utf8(format_document(root, &options)).unwrap()
}

#[test]
fn document_is_the_outermost_element() {
    let out = render("hi\n");
    assert!(out.contains("<document xmlns="));
    assert!(out.trim_end().ends_with("</document>"));
}

#[test]
fn nested_block_quote_indents_its_paragraph() {
    let out = render("> hi\n");
    assert!(out.contains("<block_quote"));
    let bq_line = out.lines().find(|l| l.trim_start().starts_with("<paragraph")).unwrap();
    assert!(bq_line.starts_with("  "));
}

#[test]
fn list_reports_tight_attribute() {
    let out = render("- a\n- b\n");
    assert!(out.contains("tight=\"true\""));
}
