//! CLI `feed` command: print the public RSS feed to stdout.

use anyhow::{Context, Result};

use jotter::config::JotterConfig;
use jotter::feed;

pub fn feed(config: &JotterConfig, creator: Option<i64>, base_url: Option<&str>) -> Result<()> {
    let store = super::open_store(config)?;
    let base_url = base_url.unwrap_or(&config.feed.base_url);

    let xml = feed::public_feed(&store, base_url, creator).context("failed to build feed")?;
    println!("{xml}");
    Ok(())
}
