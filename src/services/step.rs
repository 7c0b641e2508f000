//! Workflow step facade.
//!
//! A hosting workflow engine initializes the step once with its
//! configuration, then runs it over the OCR ALTO folder of a process and only
//! looks at a finish-or-error outcome.

use std::path::Path;

use crate::config::Config;
use crate::error::AppError;
use crate::geonames::GeonamesClient;
use crate::models::RunReport;

use super::EnrichmentService;

/// Outcome reported back to the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Finish,
    Error,
}

/// GeoNames enrichment as a workflow step.
#[derive(Debug, Clone)]
pub struct GeonamesStep {
    config: Config,
    dry_run: bool,
}

impl GeonamesStep {
    pub fn initialize(config: Config) -> Self {
        tracing::info!(
            api_url = %config.geonames.api_url,
            account = %config.geonames.account,
            allow_task_finish_buttons = config.step.allow_task_finish_buttons,
            "Initialized GeoNames step"
        );
        Self {
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn allow_task_finish_buttons(&self) -> bool {
        self.config.step.allow_task_finish_buttons
    }

    /// Run the enrichment and return its report.
    ///
    /// Each call builds a fresh client, so the lookup cache never outlives
    /// one run.
    pub async fn run_report(&self, location: &Path) -> Result<RunReport, AppError> {
        let client = GeonamesClient::new(&self.config.geonames)?;
        let mut service = EnrichmentService::new(client).dry_run(self.dry_run);
        service.run(location).await
    }

    /// Run the enrichment, logging any failure once.
    pub async fn run(&self, location: &Path) -> StepOutcome {
        match self.run_report(location).await {
            Ok(_) => StepOutcome::Finish,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    code = e.code(),
                    location = %location.display(),
                    "GeoNames enrichment failed"
                );
                StepOutcome::Error
            }
        }
    }

    /// `true` unless the run ended in an error.
    pub async fn execute(&self, location: &Path) -> bool {
        self.run(location).await != StepOutcome::Error
    }
}
