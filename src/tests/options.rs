//! `Options` flag-by-flag integration tests (spec §6).

use crate::markdown_to_html;
use crate::parser::options::{Options, ParseOptions, RenderOptions};

fn render_with(md: &str, options: Options) -> String {
    markdown_to_html(md, &options).unwrap()
}

#[test]
fn hardbreaks_turns_softbreaks_into_br_tags() {
    let options = Options {
        render: RenderOptions { hardbreaks: true, ..RenderOptions::default() },
        ..Options::default()
    };
    let out = render_with("a\nb\n", options);
    assert!(out.contains("<br />"));
}

#[test]
fn nobreaks_turns_softbreaks_into_a_space() {
    let options = Options {
        render: RenderOptions { nobreaks: true, ..RenderOptions::default() },
        ..Options::default()
    };
    let out = render_with("a\nb\n", options);
    assert_eq!(out, "<p>a b</p>\n");
}

#[test]
fn smart_converts_straight_quotes_to_curly() {
    let options = Options {
        parse: ParseOptions { smart: true, ..ParseOptions::default() },
        ..Options::default()
    };
    let out = render_with("\"hi\" and 'bye'\n", options);
    assert!(out.contains('\u{201c}'));
    assert!(out.contains('\u{201d}'));
}

#[test]
fn smart_converts_triple_hyphen_to_em_dash() {
    let options = Options {
        parse: ParseOptions { smart: true, ..ParseOptions::default() },
        ..Options::default()
    };
    let out = render_with("a --- b\n", options);
    assert!(out.contains('\u{2014}'));
}

#[test]
fn default_options_match_commonmark_safe_defaults() {
    let options = Options::default();
    assert!(!options.render.unsafe_);
    assert!(!options.render.sourcepos);
    assert_eq!(options.render.width, 0);
}
