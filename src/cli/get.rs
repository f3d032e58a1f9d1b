use std::path::PathBuf;

use clap::Parser;
use dltree::{Config, DomainKey};
use tracing::instrument;

use super::{load_tree, parse_domain};

#[derive(Debug, Parser)]
#[command(about = "Print the value stored for a domain")]
pub struct Get {
    /// The domain list file
    file: PathBuf,

    /// The domain to look up (case-insensitive)
    #[arg(value_parser = parse_domain)]
    domain: DomainKey,
}

impl Get {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let tree = load_tree(&self.file, config)?;

        match tree.get_key(&self.domain) {
            Some(value) => {
                println!("{value}");
                Ok(())
            }
            None => anyhow::bail!("{} not found", self.domain),
        }
    }
}
