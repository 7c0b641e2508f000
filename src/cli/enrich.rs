//! Enrich command handler.

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use crate::services::GeonamesStep;

use super::{App, LookupArgs};

#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// ALTO file, or folder of ALTO files
    pub path: PathBuf,

    /// Resolve and report without rewriting any document
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub lookup: LookupArgs,
}

impl App {
    /// Run the enrich command over a file or folder.
    pub async fn run_enrich(&self, args: &EnrichArgs) -> Result<()> {
        let config = self.load_config(&args.lookup)?;
        let step = GeonamesStep::initialize(config).with_dry_run(args.dry_run);

        let report = step.run_report(&args.path).await.map_err(|e| {
            tracing::error!(error = %e, code = e.code(), "GeoNames enrichment failed");
            e
        })?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "{} document(s): {} location tag(s), {} resolved, {} unresolved, {} skipped",
                report.documents,
                report.locations,
                report.resolved,
                report.unresolved,
                report.skipped
            );
            println!(
                "{} lookup(s), {} cache hit(s){}",
                report.lookups,
                report.cache_hits,
                if report.written { "" } else { ", nothing written" }
            );
        }

        Ok(())
    }
}
