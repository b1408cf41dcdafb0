//! `sourcepos` flag integration tests (spec §4.5/§6: block elements record
//! their source line/column span).

use crate::markdown_to_html;
use crate::parser::options::{Options, RenderOptions};
use crate::parser::parse_document;
use crate::xml::format_document;
use typed_arena::Arena;

fn sourcepos_options() -> Options {
    Options {
        render: RenderOptions { sourcepos: true, ..RenderOptions::default() },
        ..Options::default()
    }
}

#[test]
fn html_paragraph_carries_a_data_sourcepos_attribute() {
    let out = markdown_to_html("hello\n", &sourcepos_options()).unwrap();
    assert!(out.contains("data-sourcepos=\"1:1-1:5\""));
}

#[test]
fn xml_heading_reports_its_own_line() {
    let arena = Arena::new();
    let options = sourcepos_options();
    let root = parse_document(&arena, b"para\n\n# Title\n", &options).unwrap();
    let out = String::from_utf8(format_document(root, &options)).unwrap();
    assert!(out.contains("sourcepos=\"3:1-3:7\""));
}

#[test]
fn without_the_flag_no_sourcepos_attribute_is_emitted() {
    let out = markdown_to_html("hello\n", &Options::default()).unwrap();
    assert!(!out.contains("sourcepos"));
}
