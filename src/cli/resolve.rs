//! Resolve command handler.

use clap::Args;
use color_eyre::Result;

use crate::geonames::{GeocodeResolver, GeonamesClient};
use crate::models::Resolution;

use super::{App, LookupArgs};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Place name to look up
    pub label: String,

    #[command(flatten)]
    pub lookup: LookupArgs,
}

impl App {
    /// Resolve a single label with the same fallback as an enrichment run.
    pub async fn run_resolve(&self, args: &ResolveArgs) -> Result<()> {
        let config = self.load_config(&args.lookup)?;
        let client = GeonamesClient::new(&config.geonames)?;
        tracing::info!(url = %client.search_url(), label = %args.label, "Resolving label");

        let mut resolver = GeocodeResolver::new(client);
        match resolver.resolve(&args.label).await? {
            Resolution::Resolved(id) => println!("{}\t{}", id, id.uri()),
            Resolution::Unresolved => println!("unresolved"),
        }

        Ok(())
    }
}
