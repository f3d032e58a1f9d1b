use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dltree::{Config, DomainKey};
use serde::Serialize;
use tracing::instrument;

use super::{load_tree, parse_domain, terminal::Colorize};

/// Command arguments for `dlt list`.
#[derive(Debug, Parser)]
#[command(about = "List entries in ascending domain order")]
pub struct List {
    /// The domain list file
    file: PathBuf,

    /// Only list this domain and its subdomains.
    #[arg(long, value_name = "DOMAIN", value_parser = parse_domain)]
    under: Option<DomainKey>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress the summary line.
    #[arg(long)]
    quiet: bool,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Row<'a> {
    domain: String,
    value: &'a str,
}

impl<'a> Row<'a> {
    fn new((key, value): (&DomainKey, &'a String)) -> Self {
        Self {
            domain: key.to_string(),
            value,
        }
    }
}

impl List {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let tree = load_tree(&self.file, config)?;

        let rows: Vec<Row<'_>> = match &self.under {
            Some(ancestor) => tree.subdomains(ancestor).map(Row::new).collect(),
            None => tree.iter().map(Row::new).collect(),
        };

        match self.output {
            OutputFormat::Table => render_table(&rows, self.quiet),
            OutputFormat::Json => render_json(&rows)?,
        }
        Ok(())
    }
}

fn render_table(rows: &[Row<'_>], quiet: bool) {
    let width = rows.iter().map(|row| row.domain.len()).max().unwrap_or(0);

    for row in rows {
        if row.value.is_empty() {
            println!("{}", row.domain.info());
        } else {
            let domain = format!("{:<width$}", row.domain);
            println!("{}  {}", domain.info(), row.value);
        }
    }

    if !quiet {
        let noun = if rows.len() == 1 { "entry" } else { "entries" };
        println!("{}", format!("{} {noun}", rows.len()).dim());
    }
}

fn render_json(rows: &[Row<'_>]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(std::io::stdout(), rows).context("Failed to write JSON output")?;
    println!();
    Ok(())
}
