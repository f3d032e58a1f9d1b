use std::path::PathBuf;

use clap::Parser;
use dltree::Config;
use tracing::instrument;

use super::load_tree;

#[derive(Debug, Parser)]
#[command(about = "Print the tree structure in Graphviz DOT format")]
pub struct Dot {
    /// The domain list file
    file: PathBuf,
}

impl Dot {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let tree = load_tree(&self.file, config)?;
        print!("{}", tree.to_dot());
        Ok(())
    }
}
