//! Thin CLI wrapper (spec §4.0.3): reads a file or stdin, builds [`Options`]
//! from flags mirroring spec.md §6, renders with the requested format, and
//! writes to stdout. All parsing/rendering logic lives in the library.

use clap::Parser as ClapParser;
use cmark_rs::{parse_document, render_document, Options, OutputFormat, ParseOptions, RenderOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use typed_arena::Arena;

#[derive(ClapParser)]
#[command(name = "cmarkrs", about = "Convert CommonMark Markdown to another format")]
struct Cli {
    /// Input file; reads stdin if omitted
    path: Option<PathBuf>,

    /// Output format
    #[arg(short = 't', long = "to", default_value = "html")]
    to: Format,

    /// Wrap width for commonmark/man output (0 disables wrapping)
    #[arg(long, default_value_t = 0)]
    width: usize,

    /// Include a sourcepos attribute on block elements
    #[arg(long)]
    sourcepos: bool,

    /// Render softbreaks as hard line breaks
    #[arg(long)]
    hardbreaks: bool,

    /// Render softbreaks as spaces
    #[arg(long)]
    nobreaks: bool,

    /// Render raw HTML and unsafe links instead of replacing them
    #[arg(long = "unsafe")]
    unsafe_: bool,

    /// Validate UTF-8 in the input, replacing illegal sequences with U+FFFD
    #[arg(long = "validate-utf8")]
    validate_utf8: bool,

    /// Convert straight quotes to curly, `--`/`---` to en/em dashes
    #[arg(long)]
    smart: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Html,
    Xml,
    Man,
    Commonmark,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Html => OutputFormat::Html,
            Format::Xml => OutputFormat::Xml,
            Format::Man => OutputFormat::Man,
            Format::Commonmark => OutputFormat::CommonMark,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let buffer = match &cli.path {
        Some(path) => match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("cmarkrs: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = Vec::new();
            if let Err(e) = std::io::stdin().read_to_end(&mut buf) {
                eprintln!("cmarkrs: reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let options = Options {
        parse: ParseOptions {
            smart: cli.smart,
            validate_utf8: cli.validate_utf8,
            default_info_string: None,
            max_ref_size: None,
        },
        render: RenderOptions {
            sourcepos: cli.sourcepos,
            hardbreaks: cli.hardbreaks,
            nobreaks: cli.nobreaks,
            unsafe_: cli.unsafe_,
            width: cli.width,
        },
    };

    let arena = Arena::new();
    let root = match parse_document(&arena, &buffer, &options) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("cmarkrs: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let out = render_document(root, &options, cli.to.into());
    if let Err(e) = std::io::stdout().write_all(&out) {
        eprintln!("cmarkrs: writing output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
