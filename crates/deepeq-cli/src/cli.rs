use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "deepeq",
    about = "Structural comparison of JSON and TOML documents",
    version
)]
pub struct Cli {
    /// Left-hand document (.json or .toml)
    pub left: PathBuf,

    /// Right-hand document (.json or .toml)
    pub right: PathBuf,

    /// Render every compared node, not only the failing path
    #[arg(long)]
    pub verbose: bool,

    /// Skip a field, given as Type::field (JSON objects are named Object)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Session settings in TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Colour the report with ANSI escapes
    #[arg(long)]
    pub color: bool,

    /// Compare object keys in sorted order
    #[arg(long)]
    pub sort_keys: bool,

    /// Increase log output on stderr (-v debug, -vv trace)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub log_level: u8,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.log_level {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "deepeq",
            "a.json",
            "b.toml",
            "--verbose",
            "--exclude",
            "Object::id",
            "--exclude",
            "Object::updated",
            "--sort-keys",
            "-vv",
        ]);
        assert_eq!(cli.left, PathBuf::from("a.json"));
        assert_eq!(cli.exclude, ["Object::id", "Object::updated"]);
        assert!(cli.verbose && cli.sort_keys && !cli.color);
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn requires_two_documents() {
        assert!(Cli::try_parse_from(["deepeq", "a.json"]).is_err());
    }
}
