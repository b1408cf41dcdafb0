//! Incremental-parser API tests (spec §6's `parser_new`/`feed`/`finish`
//! surface, grounded on `examples/original_source/src/cssg.h`'s streaming
//! example).

use crate::parser::options::Options;
use crate::{html, parse_document, Parser};
use typed_arena::Arena;

#[test]
fn feeding_in_chunks_matches_a_single_parse() {
    let arena = Arena::new();
    let options = Options::default();

    let mut parser = Parser::new(&arena, &options);
    parser.feed(b"# Hello\n\nSome ").unwrap();
    parser.feed(b"*text*.\n").unwrap();
    let streamed = parser.finish();

    let arena2 = Arena::new();
    let whole = parse_document(&arena2, b"# Hello\n\nSome *text*.\n", &options).unwrap();

    assert_eq!(
        html::format_document(streamed, &options),
        html::format_document(whole, &options)
    );
}

#[test]
fn feed_splitting_mid_line_still_joins_the_line() {
    let arena = Arena::new();
    let options = Options::default();
    let mut parser = Parser::new(&arena, &options);
    parser.feed(b"he").unwrap();
    parser.feed(b"llo\n").unwrap();
    let root = parser.finish();
    let out = String::from_utf8(html::format_document(root, &options)).unwrap();
    assert_eq!(out, "<p>hello</p>\n");
}

#[test]
fn a_bare_cr_at_a_feed_boundary_does_not_split_the_line() {
    let arena = Arena::new();
    let options = Options::default();
    let mut parser = Parser::new(&arena, &options);
    parser.feed(b"line1\r").unwrap();
    parser.feed(b"\nline2\r\n").unwrap();
    let root = parser.finish();
    let out = String::from_utf8(html::format_document(root, &options)).unwrap();
    assert_eq!(out, "<p>line1\nline2</p>\n");
    assert_eq!(root.children().count(), 1);
}

#[test]
fn parse_document_is_a_convenience_wrapper_over_the_incremental_api() {
    let arena = Arena::new();
    let options = Options::default();
    let via_helper = parse_document(&arena, b"hi\n", &options).unwrap();

    let arena2 = Arena::new();
    let mut parser = Parser::new(&arena2, &options);
    parser.feed(b"hi\n").unwrap();
    let via_parser = parser.finish();

    assert_eq!(
        html::format_document(via_helper, &options),
        html::format_document(via_parser, &options)
    );
}
