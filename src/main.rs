//! Stanza - an incremental static site builder.
//!
//! Converts a tree of YAML page descriptors plus templates into rendered
//! HTML, regenerating only outputs whose inputs changed since the last
//! build.

mod build;
mod cli;
mod compiler;
mod config;
mod logger;
mod timestamp;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // An unreadable configuration aborts before any build work, exit 1.
    let config = SiteConfig::from_path(&cli.config)?;

    build_site(&config)?;
    Ok(())
}
