//! `diffex-parse`: extract placeholder values from rendered text.
//!
//! Usage:
//!   diffex-parse <template-file> [--open <delim>] [--close <delim>]
//!
//! The rendered text is read from stdin. The values are printed as a JSON
//! object keyed by placeholder name.

use std::io::{self, Read};

use clap::Parser;
use diffex::cli::{init_tracing, read_text, ParseArgs};
use diffex::{Error, Result, Template};

fn run(args: ParseArgs) -> Result<String> {
    let source = read_text(&args.template)?;
    let template = Template::new(source, args.options())?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| Error::Io(format!("stdin: {e}")))?;

    Ok(serde_json::to_string_pretty(&template.parse(&input))?)
}

fn main() {
    let args = ParseArgs::parse();
    init_tracing();
    match run(args) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
