use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dltree::{storage, Config, Tree};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report malformed lines in a domain list")]
pub struct Check {
    /// The domain list file
    file: PathBuf,
}

impl Check {
    /// Malformed lines are always reported, even if the configuration skips
    /// them when loading.
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let listing = storage::read(&self.file, config)
            .with_context(|| format!("Failed to read domain list {}", self.file.display()))?;

        for entry in &listing.malformed {
            println!("{}", entry.to_string().warning());
            println!("    {}", entry.text.dim());
        }

        let total = listing.entries.len();
        let tree: Tree<()> = listing
            .entries
            .into_iter()
            .map(|entry| (entry.key, ()))
            .collect();
        let duplicates = total - tree.len();

        let summary = format!("{} distinct domains", tree.len());
        if duplicates > 0 {
            println!("{summary} {}", format!("({duplicates} duplicate lines)").dim());
        } else {
            println!("{summary}");
        }

        if listing.malformed.is_empty() {
            println!("{}", "✓ No malformed lines".success());
            Ok(())
        } else {
            anyhow::bail!("{} malformed lines", listing.malformed.len())
        }
    }
}
