//! Argument parsing and setup shared by the command-line tools.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use diffex_core::Config;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::template::Options;

/// Extract placeholder values from rendered text read on stdin
#[derive(Debug, Parser)]
#[command(name = "diffex-parse", version, about, long_about = None)]
pub struct ParseArgs {
    /// Template file containing placeholders
    pub template: PathBuf,

    /// Opening placeholder delimiter
    #[arg(long, default_value = "{{")]
    pub open: String,

    /// Closing placeholder delimiter
    #[arg(long, default_value = "}}")]
    pub close: String,
}

impl ParseArgs {
    pub fn options(&self) -> Options {
        Options {
            open: self.open.clone(),
            close: self.close.clone(),
        }
    }
}

/// Make and apply plain-text patches
#[derive(Debug, Parser)]
#[command(name = "text-patch", version, about, long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Error occurred
    2  One or more hunks could not be applied")]
pub struct PatchCli {
    /// JSON file overriding engine settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: PatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum PatchCommand {
    /// Print patch text turning OLD into NEW
    Make { old: PathBuf, new: PathBuf },
    /// Print TEXT with the patches from PATCH applied
    Apply { patch: PathBuf, text: PathBuf },
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// The engine configuration named by `--config`, or the defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

/// Read an engine configuration from a JSON file. Missing fields keep their
/// defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = read_text(path)?;
    let cfg = parse_config(&raw)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

fn parse_config(raw: &str) -> Result<Config> {
    let cfg: Config = serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Io(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_default_to_double_braces() {
        let args = ParseArgs::try_parse_from(["diffex-parse", "tpl.txt"]).unwrap();
        assert_eq!(args.template, PathBuf::from("tpl.txt"));
        assert_eq!(args.options(), Options::default());

        let args =
            ParseArgs::try_parse_from(["diffex-parse", "tpl.txt", "--open", "<%", "--close", "%>"])
                .unwrap();
        assert_eq!(args.options().open, "<%");
        assert_eq!(args.options().close, "%>");
    }

    #[test]
    fn flag_without_value_is_rejected() {
        assert!(ParseArgs::try_parse_from(["diffex-parse", "tpl.txt", "--open"]).is_err());
        assert!(ParseArgs::try_parse_from(["diffex-parse"]).is_err());
    }

    #[test]
    fn patch_subcommands() {
        let cli =
            PatchCli::try_parse_from(["text-patch", "make", "a.txt", "b.txt", "--config", "c.json"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(
            cli.command,
            PatchCommand::Make { ref old, ref new }
                if old == Path::new("a.txt") && new == Path::new("b.txt")
        ));

        let cli = PatchCli::try_parse_from(["text-patch", "apply", "p.diff", "t.txt"]).unwrap();
        assert_eq!(cli.config, None);
        assert!(matches!(cli.command, PatchCommand::Apply { .. }));

        assert!(PatchCli::try_parse_from(["text-patch", "merge", "a", "b"]).is_err());
        assert!(PatchCli::try_parse_from(["text-patch", "make", "a"]).is_err());
        assert!(PatchCli::try_parse_from(["text-patch", "make", "a", "b", "--config"]).is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = parse_config(r#"{"patch_margin": 2}"#).unwrap();
        assert_eq!(cfg.patch_margin, 2);
        assert_eq!(cfg.match_max_bits, Config::default().match_max_bits);
        assert_eq!(resolve_config(None).unwrap(), Config::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            parse_config(r#"{"match_threshold": 2.0}"#),
            Err(Error::Core(diffex_core::Error::InvalidConfig(_)))
        ));
        assert!(matches!(parse_config("{"), Err(Error::Config(_))));
        assert!(matches!(
            parse_config(r#"{"patch_margin": 16}"#),
            Err(Error::Core(diffex_core::Error::InvalidConfig(_)))
        ));
    }
}
