//! CLI module for alto-geonames.
//!
//! Subcommands:
//! - `enrich`: Add GeoNames URIs to the location tags of ALTO documents
//! - `resolve`: Resolve a single label, for checking an account or endpoint

mod enrich;
mod resolve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

pub use enrich::EnrichArgs;
pub use resolve::ResolveArgs;

/// alto-geonames - GeoNames enrichment for ALTO OCR documents
#[derive(Parser)]
#[command(name = "alto-geonames")]
#[command(about = "Enrich ALTO location tags with GeoNames identifiers")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra config file, layered above the project config
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Enrich an ALTO file, or every ALTO file in a folder
    Enrich(EnrichArgs),

    /// Resolve one label and print its GeoNames identifier
    Resolve(ResolveArgs),
}

/// Overrides for the `[geonames]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct LookupArgs {
    /// GeoNames account name
    #[arg(long)]
    pub account: Option<String>,

    /// GeoNames web service base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "N")]
    pub timeout_secs: Option<u64>,
}

impl LookupArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(account) = &self.account {
            config.geonames.account = account.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.geonames.api_url = api_url.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.geonames.timeout_secs = timeout_secs;
        }
    }
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match &self.command {
            Command::Enrich(args) => self.run_enrich(args).await,
            Command::Resolve(args) => self.run_resolve(args).await,
        }
    }

    /// Load layered config, then apply command-line overrides.
    fn load_config(&self, overrides: &LookupArgs) -> color_eyre::Result<Config> {
        let mut config = Config::extract_with(self.config.as_deref())?;
        overrides.apply(&mut config);
        config.validate()?;
        tracing::debug!(
            account = %config.geonames.account,
            api_url = %config.geonames.api_url,
            timeout_secs = config.geonames.timeout_secs,
            "Loaded configuration"
        );
        Ok(config)
    }
}
