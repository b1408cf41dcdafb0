//! End-to-end smoke test, ported from the teacher's `tests.rs::it_works`.

use crate::markdown_to_html;
use crate::nodes::consistency_check;
use crate::parser::options::Options;
use crate::parser::parse_document;
use typed_arena::Arena;

#[test]
fn it_works() {
    let out = markdown_to_html(
        "My **document**.\n\nIt's mine.\n\n> Yes.\n\n## Hi!\n\nOkay.",
        &Options::default(),
    )
    .unwrap();
    assert_eq!(
        out,
        concat!(
            "<p>My <strong>document</strong>.</p>\n",
            "<p>It's mine.</p>\n",
            "<blockquote>\n",
            "<p>Yes.</p>\n",
            "</blockquote>\n",
            "<h2>Hi!</h2>\n",
            "<p>Okay.</p>\n"
        )
    );
}

#[test]
fn empty_input_renders_nothing() {
    let out = markdown_to_html("", &Options::default()).unwrap();
    assert_eq!(out, "");
}

#[test]
fn nested_lists_round_trip_structure() {
    let out = markdown_to_html("- a\n  - b\n  - c\n- d\n", &Options::default()).unwrap();
    assert!(out.starts_with("<ul>\n<li>a"));
    assert_eq!(out.matches("<ul>").count(), 2);
    assert_eq!(out.matches("</ul>").count(), 2);
    assert!(out.contains("<li>b</li>"));
    assert!(out.contains("<li>c</li>"));
    assert!(out.ends_with("<li>d</li>\n</ul>\n"));
}

#[test]
fn consistency_check_reports_zero_repairs_on_any_parsed_tree() {
    let arena = Arena::new();
    let options = Options::default();
    let root = parse_document(
        &arena,
        b"# Title\n\n- a\n  - nested\n- b\n\n> quote\n\n```\ncode\n```\n",
        &options,
    )
    .unwrap();
    assert_eq!(consistency_check(root, |_| ()), 0);
}
