//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, SummaryFormat};
use crate::config::PipelineConfig;
use crate::engine::{IngestionDriver, RunSummary};
use crate::error::Result;
use crate::store;
use serde_json::json;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command.unwrap_or(Commands::Run) {
            Commands::Run => self.ingest().await.map(|_| ()),
            Commands::Check => self.check().await,
            Commands::Config => self.print_config(),
        }
    }

    /// Load configuration
    ///
    /// Inline JSON wins over a config file; `MINIO_*` environment variables
    /// override either.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let config = if let Some(json_str) = &self.cli.config_json {
            PipelineConfig::from_json_str(json_str)?
        } else if let Some(path) = &self.cli.config {
            PipelineConfig::from_file(path)?
        } else {
            PipelineConfig::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Run the pipeline and print its summary
    pub async fn ingest(&self) -> Result<RunSummary> {
        let config = self.load_config()?;
        config.validate()?;

        info!(endpoint = %config.store.endpoint, "Connecting to object store");
        let store = store::connect(&config.store)?;
        info!(backend = store.backend(), "Connected to object store");

        let driver = IngestionDriver::new(store, config)?;
        let summary = driver.run().await?;
        self.report(&summary)?;
        Ok(summary)
    }

    /// Check that the store answers and report bucket presence
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        let store = store::connect(&config.store)?;
        let source_exists = store.bucket_exists(&config.source_bucket).await?;
        let destination_exists = store.bucket_exists(&config.destination_bucket).await?;
        let source_objects = if source_exists {
            Some(store.list_objects(&config.source_bucket).await?.len())
        } else {
            None
        };

        let status = json!({
            "endpoint": config.store.endpoint,
            "backend": store.backend(),
            "source_bucket": {
                "name": config.source_bucket,
                "exists": source_exists,
                "objects": source_objects,
            },
            "destination_bucket": {
                "name": config.destination_bucket,
                "exists": destination_exists,
            },
        });

        match self.cli.summary {
            SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
            SummaryFormat::Text => {
                println!("Connected to {} ({})", config.store.endpoint, store.backend());
                match source_objects {
                    Some(count) => {
                        println!("Source bucket {}: {count} objects", config.source_bucket);
                    }
                    None => println!("Source bucket {}: missing", config.source_bucket),
                }
                println!(
                    "Destination bucket {}: {}",
                    config.destination_bucket,
                    if destination_exists {
                        "exists"
                    } else {
                        "will be created"
                    }
                );
            }
        }
        Ok(())
    }

    /// Print the effective configuration
    fn print_config(&self) -> Result<()> {
        let mut config = self.load_config()?;
        if config.store.secret_key.is_some() {
            config.store.secret_key = Some("********".to_string());
        }
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }

    /// Print the run summary
    fn report(&self, summary: &RunSummary) -> Result<()> {
        match self.cli.summary {
            SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
            SummaryFormat::Text => {
                for line in summary_lines(summary) {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}

/// Human-readable summary
pub(crate) fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let stats = &summary.stats;
    let mut lines = Vec::new();

    if summary.no_objects_found {
        lines.push(format!(
            "No objects found in the bucket {}.",
            summary.source_bucket
        ));
    }

    lines.push(format!(
        "{} objects listed in {}, {} selected ({} decoded, {} skipped)",
        stats.objects_listed,
        summary.source_bucket,
        stats.objects_selected,
        stats.objects_decoded,
        stats.objects_skipped
    ));
    lines.push(format!(
        "{} rows: {} uploaded to {} ({} verified, {} unverified), {} skipped in {}ms",
        stats.rows_seen,
        stats.rows_uploaded,
        summary.destination_bucket,
        stats.rows_verified,
        stats.rows_unverified,
        stats.rows_skipped,
        stats.duration_ms
    ));

    for (object, row, reason) in summary.skipped() {
        match row {
            Some(row) => lines.push(format!("  skipped {object} row {row}: {reason}")),
            None => lines.push(format!("  skipped {object}: {reason}")),
        }
    }

    lines
}
