//! `cmark-rs`: a CommonMark-compatible Markdown parser and multi-format
//! renderer (spec §1–§2).
//!
//! Parse a document into an arena-allocated AST with [`parse_document`] or
//! [`Parser`]'s incremental `new`/`feed`/`finish` (spec §6, grounded on
//! `examples/original_source/src/cssg.h`'s `cssg_parser_new`/`_feed`/
//! `_finish` trio), then hand the root to one of the `format_document`
//! functions in [`html`], [`xml`], [`man`], or [`cm`]. [`markdown_to_html`]
//! bundles both steps for the common case.
//!
//! Module layout follows `examples/kivikakk-comrak`'s flat `src/` (this
//! crate additionally nests the block/inline parser under `parser/`, since
//! that pairing — one incremental state machine, one options module — reads
//! more clearly as a submodule than as three top-level files).

pub mod arena_tree;
pub mod autolink;
pub mod character_set;
pub mod cm;
pub mod ctype;
pub mod entity;
pub mod error;
pub mod html;
pub mod iter;
pub mod man;
pub mod nodes;
pub mod parser;
pub mod reference;
pub mod remstack;
pub mod render;
pub mod scanners;
pub mod strings;
pub mod xml;

#[cfg(test)]
mod tests;

pub use error::CmarkError;
pub use nodes::{AstNode, NodeValue};
pub use parser::options::{Options, ParseOptions, RenderOptions};
pub use parser::{parse_document, parse_file, Parser};

use typed_arena::Arena;

/// The output format a [`format_document`]-style function targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Xml,
    Man,
    CommonMark,
}

/// Dispatch to the `format_document` function for `format`.
pub fn render_document<'a>(root: &'a AstNode<'a>, options: &Options, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Html => html::format_document(root, options),
        OutputFormat::Xml => xml::format_document(root, options),
        OutputFormat::Man => man::format_document(root, options),
        OutputFormat::CommonMark => cm::format_document(root, options),
    }
}

/// Parse `buffer` and render it to HTML in one call, the library's most
/// common entry point.
pub fn markdown_to_html(buffer: &str, options: &Options) -> Result<String, CmarkError> {
    let arena = Arena::new();
    let root = parse_document(&arena, buffer.as_bytes(), options)?;
    let out = html::format_document(root, options);
    Ok(String::from_utf8(out).expect("renderer output is valid UTF-8 for UTF-8 input"))
}

/// The crate version as `(major, minor, patch)`, read from `Cargo.toml` at
/// compile time. Mirrors `cssg_version`'s integer encoding without the
/// bit-packing, which Rust's semver-aware tooling makes unnecessary.
pub const VERSION: (u16, u16, u16) = (
    pkg_version_major(),
    pkg_version_minor(),
    pkg_version_patch(),
);

/// The crate version string, e.g. `"0.1.0"`. Mirrors `cssg_version_string`.
pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

const fn pkg_version_major() -> u16 {
    parse_u16(env!("CARGO_PKG_VERSION_MAJOR").as_bytes())
}

const fn pkg_version_minor() -> u16 {
    parse_u16(env!("CARGO_PKG_VERSION_MINOR").as_bytes())
}

const fn pkg_version_patch() -> u16 {
    parse_u16(env!("CARGO_PKG_VERSION_PATCH").as_bytes())
}

const fn parse_u16(digits: &[u8]) -> u16 {
    let mut n = 0u16;
    let mut i = 0;
    while i < digits.len() {
        n = n * 10 + (digits[i] - b'0') as u16;
        i += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_to_html_renders_a_paragraph() {
        let out = markdown_to_html("hello *world*\n", &Options::default()).unwrap();
        assert_eq!(out, "<p>hello <em>world</em></p>\n");
    }

    #[test]
    fn render_document_dispatches_by_format() {
        let arena = Arena::new();
        let options = Options::default();
        let root = parse_document(&arena, b"# hi\n", &options).unwrap();
        let html = render_document(root, &options, OutputFormat::Html);
        assert!(String::from_utf8(html).unwrap().contains("<h1>"));
        let xml = render_document(root, &options, OutputFormat::Xml);
        assert!(String::from_utf8(xml).unwrap().contains("<heading"));
    }

    #[test]
    fn version_string_matches_cargo_metadata() {
        assert_eq!(VERSION_STRING, env!("CARGO_PKG_VERSION"));
    }
}
