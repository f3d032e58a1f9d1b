use std::path::{Path, PathBuf};

mod check;
mod dot;
mod get;
mod list;
mod terminal;

use anyhow::Context;
use check::Check;
use clap::ArgAction;
use dltree::{Config, DomainKey, Tree};
use dot::Dot;
use get::Get;
use list::List;

/// Parse a domain given on the command line into its canonical key.
fn parse_domain(s: &str) -> Result<DomainKey, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Load a domain list, attaching the path to any error.
fn load_tree(file: &Path, config: &Config) -> anyhow::Result<Tree<String>> {
    dltree::load(file, config)
        .with_context(|| format!("Failed to load domain list {}", file.display()))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load(path)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // Logs go to stderr so that `dot` and `list` output can be piped.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Print the value stored for a domain
    Get(Get),

    /// List entries in ascending domain order
    ///
    /// A domain is always followed by its subdomains.
    List(List),

    /// Print the tree structure in Graphviz DOT format
    Dot(Dot),

    /// Report malformed lines in a domain list
    Check(Check),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Get(command) => command.run(config)?,
            Self::List(command) => command.run(config)?,
            Self::Dot(command) => command.run(config)?,
            Self::Check(command) => command.run(config)?,
        }
        Ok(())
    }
}
