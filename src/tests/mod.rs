//! Integration tests against the public API, one file per concern, mirroring
//! `examples/kivikakk-comrak/src/tests.rs`'s single end-to-end smoke test
//! (`it_works`) split out by concern the way mature comrak-style crates lay
//! out their test suite.

mod api;
mod commonmark;
mod core;
mod html;
mod options;
mod regressions;
mod sourcepos;
mod xml;
