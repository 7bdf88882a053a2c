//! `text-patch`: make and apply plain-text patches.
//!
//! Usage:
//!   text-patch make <old-file> <new-file> [--config <json-file>]
//!   text-patch apply <patch-file> <text-file> [--config <json-file>]
//!
//! `make` prints patch text. `apply` prints the patched text. Hunks that
//! could not be placed are reported on stderr by position (counted after
//! oversized hunks are split) and the exit code is 2.

use clap::Parser;
use diffex::cli::{init_tracing, read_text, resolve_config, PatchCli, PatchCommand};
use diffex::Result;
use diffex_core::{patch, PatchInput};

fn run(cli: PatchCli) -> Result<i32> {
    let cfg = resolve_config(cli.config.as_deref())?;
    match cli.command {
        PatchCommand::Make { old, new } => {
            let old = read_text(&old)?;
            let new = read_text(&new)?;
            let patches = patch::make(PatchInput::Texts(&old, &new), &cfg);
            print!("{}", patch::to_text(&patches));
            Ok(0)
        }
        PatchCommand::Apply { patch: patch_file, text } => {
            let patches = patch::from_text(&read_text(&patch_file)?)?;
            let text = read_text(&text)?;
            let (patched, applied) = patch::apply(&patches, &text, &cfg);
            print!("{patched}");
            let mut code = 0;
            for (index, ok) in applied.iter().enumerate() {
                tracing::info!(hunk = index, applied = ok, "hunk result");
                if !ok {
                    eprintln!("hunk {} failed", index + 1);
                    code = 2;
                }
            }
            Ok(code)
        }
    }
}

fn main() {
    let cli = PatchCli::parse();
    init_tracing();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
