//! Run command implementation

use crate::config::Config;
use crate::output::{CsvWriter, HtmlWriter, SeriesWriter, SvgWriter};
use crate::pipeline::{CancelFlag, MarketRunStatus, Pipeline, RunSummary};
use crate::transport::HttpTransport;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Search query for markets (matched against title and slug)
    #[arg(short, long)]
    pub search: String,

    /// Resample interval in seconds
    #[arg(short, long)]
    pub interval: Option<i64>,

    /// Output directory for artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Market API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Markets listing endpoint path
    #[arg(long)]
    pub markets_path: Option<String>,

    /// History endpoint template (use {market_id})
    #[arg(long)]
    pub history_template: Option<String>,

    /// Page size for listing and history requests
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Max listing pages to fetch (0 = all)
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Include markets that are still open
    #[arg(long)]
    pub include_open: bool,

    /// Delay between markets in milliseconds
    #[arg(long)]
    pub sleep_ms: Option<u64>,

    /// Disable CSV output
    #[arg(long)]
    pub no_csv: bool,

    /// Disable SVG chart output
    #[arg(long)]
    pub no_svg: bool,

    /// Disable HTML chart output with hover tooltips
    #[arg(long)]
    pub no_html: bool,
}

impl RunArgs {
    /// Overlay CLI flags onto the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(interval) = self.interval {
            config.resample.interval_seconds = interval;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(path) = &self.markets_path {
            config.api.markets_path = path.clone();
        }
        if let Some(template) = &self.history_template {
            config.api.history_path_template = template.clone();
        }
        if let Some(page_size) = self.page_size {
            config.api.page_size = page_size;
        }
        if let Some(max_pages) = self.max_pages {
            config.api.listing_max_pages = max_pages;
        }
        if self.include_open {
            config.api.resolved_only = false;
        }
        if let Some(sleep_ms) = self.sleep_ms {
            config.api.request_delay_ms = sleep_ms;
        }
        if self.no_csv {
            config.output.csv = false;
        }
        if self.no_svg {
            config.output.svg = false;
        }
        if self.no_html {
            config.output.html = false;
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config);
        config.validate()?;

        let transport = Arc::new(HttpTransport::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )?);

        let mut writers: Vec<Box<dyn SeriesWriter>> = Vec::new();
        if config.output.csv {
            writers.push(Box::new(CsvWriter));
        }
        if config.output.svg {
            writers.push(Box::new(SvgWriter));
        }
        if config.output.html {
            writers.push(Box::new(HtmlWriter));
        }

        let cancel = CancelFlag::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing current step then stopping");
                watcher.cancel();
            }
        });

        let pipeline = Pipeline::new(&config, transport, writers, cancel);
        let summary = pipeline.run(&self.search).await?;
        print_summary(&self.search, &summary);
        Ok(())
    }
}

fn print_summary(search: &str, summary: &RunSummary) {
    if summary.matched == 0 {
        println!("No markets matched \"{search}\". Try another search term or endpoint settings.");
        return;
    }

    println!("Run summary for \"{search}\":");
    for outcome in &summary.outcomes {
        let market = &outcome.market;
        match &outcome.status {
            MarketRunStatus::Succeeded { points } => {
                println!("  OK      {} ({}) - {} points", market.title, market.id, points);
                for path in &outcome.artifacts {
                    println!("          wrote {}", path.display());
                }
            }
            MarketRunStatus::Failed { error } => {
                println!("  FAILED  {} ({}) - {}", market.title, market.id, error);
            }
            MarketRunStatus::Skipped => {
                println!("  SKIPPED {} ({}) - not attempted", market.title, market.id);
            }
        }
        for warning in &outcome.warnings {
            println!("          warning: {warning}");
        }
        if outcome.out_of_range > 0 {
            println!(
                "          warning: {} observations outside [0,1]",
                outcome.out_of_range
            );
        }
        for failure in &outcome.writer_failures {
            println!("          writer failure: {failure}");
        }
    }
    println!(
        "  {} matched, {} attempted, {} succeeded, {} failed, {} skipped",
        summary.matched,
        summary.attempted(),
        summary.succeeded(),
        summary.failed(),
        summary.skipped()
    );
}
