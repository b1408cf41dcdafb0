//! Parse-time and render-time knobs (spec §6).
//!
//! The reference implementation packs these into one bit-flag integer
//! (`CSSG_OPT_SOURCEPOS`, `CSSG_OPT_HARDBREAKS`, ...). This splits them into
//! a `ParseOptions`/`RenderOptions` pair grouped by which phase consults
//! them, following the well-known `comrak::parser::Options` convention
//! (this teacher snapshot's own `src/` is flat and predates that split).
//! `normalize` and `safe` are legacy no-ops per spec.md §6 and are
//! intentionally not represented — "safe" is simply the default behavior
//! of `RenderOptions::unsafe_ == false`.

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Smart-punctuation substitutions during inline parsing (`--` to en
    /// dash, straight quotes to curly, etc).
    pub smart: bool,
    /// Replace invalid UTF-8 and embedded NUL bytes with U+FFFD before
    /// parsing, rather than leaving them for the caller to have guaranteed
    /// away.
    pub validate_utf8: bool,
    /// Info string assumed for a fenced code block that declares none.
    pub default_info_string: Option<String>,
    /// Upper bound, in bytes of `url`+`title`, on how much reference
    /// definition content a single parse may resolve through lookups. `None`
    /// means unbounded.
    pub max_ref_size: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            smart: false,
            validate_utf8: false,
            default_info_string: None,
            max_ref_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit `data-sourcepos`/sourcepos attributes per block.
    pub sourcepos: bool,
    /// Render softbreaks as hard line breaks.
    pub hardbreaks: bool,
    /// Render softbreaks as a single space rather than a newline.
    pub nobreaks: bool,
    /// Emit raw HTML and dangerous URL schemes verbatim. Default off (the
    /// "safe" behavior spec.md §6 says is the default either way).
    pub unsafe_: bool,
    /// Wrap width for the man and CommonMark renderers; 0 disables wrapping.
    pub width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            sourcepos: false,
            hardbreaks: false,
            nobreaks: false,
            unsafe_: false,
            width: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub parse: ParseOptions,
    pub render: RenderOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let opts = Options::default();
        assert!(!opts.render.unsafe_);
        assert!(!opts.parse.smart);
        assert_eq!(opts.parse.max_ref_size, None);
    }
}
