//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Stanza incremental static site builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the site configuration file
    #[arg(default_value = "site.yaml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["stanza"]);
        assert_eq!(cli.config, PathBuf::from("site.yaml"));
    }

    #[test]
    fn test_positional_config_path() {
        let cli = Cli::parse_from(["stanza", "sites/blog.yaml"]);
        assert_eq!(cli.config, PathBuf::from("sites/blog.yaml"));
    }
}
