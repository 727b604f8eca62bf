//! Prints an RSS feed as JSON.
//!
//! Usage: `rss2json <feed.xml> [config.toml]`

use std::path::Path;

use anyhow::{bail, Context};
use tracing::info;
use tree_projector::logging::init_logging_with_config;
use tree_projector::{presets, AppConfig, Document};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (feed, config) = match args.as_slice() {
        [feed] => (feed, AppConfig::default()),
        [feed, config] => (feed, AppConfig::from_file(Path::new(config))?),
        _ => bail!("usage: rss2json <feed.xml> [config.toml]"),
    };

    init_logging_with_config(&config.logging)?;

    let raw = std::fs::read_to_string(feed).with_context(|| format!("Failed to read {feed}"))?;
    let document = Document::parse_xml(&raw).with_context(|| format!("Failed to parse {feed}"))?;
    info!("Transforming {}", feed);

    let scope = presets::rss_with_config(config.rules).transform(&document)?;
    println!("{}", serde_json::to_string_pretty(&scope.to_plain())?);
    Ok(())
}
