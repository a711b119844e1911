//! Pipeline orchestrator
//!
//! Composes resolver, fetcher, resampler, and writers for each matched
//! market. One bad market never hides the results of the others: per-market
//! failures are recorded in the run summary and the run continues.

use crate::config::Config;
use crate::market::{
    FetchError, HistoryFetcher, HistoryFetcherConfig, MarketDescriptor, MarketResolver,
    MarketResolverConfig, ResolveError,
};
use crate::output::SeriesWriter;
use crate::resample::{self, Observation, ResampledSeries};
use crate::transport::Transport;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag, checked between markets and between pages
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one market's trip through the pipeline
#[derive(Debug)]
pub enum MarketRunStatus {
    Succeeded { points: usize },
    Failed { error: String },
    Skipped,
}

/// Per-market record in the run summary
#[derive(Debug)]
pub struct MarketOutcome {
    pub market: MarketDescriptor,
    pub status: MarketRunStatus,
    /// Paths written by the output writers
    pub artifacts: Vec<PathBuf>,
    /// Writer failures, recorded but never fatal
    pub writer_failures: Vec<String>,
    /// Observations outside [0,1], passed through unmodified
    pub out_of_range: usize,
    /// Non-fatal conditions worth surfacing (e.g. pagination breaker)
    pub warnings: Vec<String>,
}

/// End-of-run report across all matched markets
#[derive(Debug, Default)]
pub struct RunSummary {
    pub matched: usize,
    pub outcomes: Vec<MarketOutcome>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, MarketRunStatus::Skipped))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, MarketRunStatus::Succeeded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, MarketRunStatus::Failed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, MarketRunStatus::Skipped))
            .count()
    }
}

/// Sequential market-by-market pipeline: resolve, fetch, resample, write
pub struct Pipeline {
    resolver: MarketResolver,
    fetcher: HistoryFetcher,
    writers: Vec<Box<dyn SeriesWriter>>,
    output_dir: PathBuf,
    interval_seconds: i64,
    request_delay: Duration,
    cancel: CancelFlag,
}

impl Pipeline {
    /// Wire the pipeline from configuration and an injected transport
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        writers: Vec<Box<dyn SeriesWriter>>,
        cancel: CancelFlag,
    ) -> Self {
        let retry = config.retry.policy();
        let resolver = MarketResolver::new(
            Arc::clone(&transport),
            retry.clone(),
            MarketResolverConfig {
                markets_path: config.api.markets_path.clone(),
                page_size: config.api.page_size,
                max_pages: config.api.listing_max_pages,
                resolved_only: config.api.resolved_only,
            },
        );
        let fetcher = HistoryFetcher::new(
            transport,
            retry,
            HistoryFetcherConfig {
                history_path_template: config.api.history_path_template.clone(),
                page_size: config.api.page_size,
                max_pages: config.api.history_max_pages,
            },
        );
        Self {
            resolver,
            fetcher,
            writers,
            output_dir: config.output.dir.clone(),
            interval_seconds: config.resample.interval_seconds,
            request_delay: Duration::from_millis(config.api.request_delay_ms),
            cancel,
        }
    }

    /// Run the full pipeline for one search term.
    ///
    /// Only total resolution failure propagates as an error; everything
    /// downstream is isolated per market and reported in the summary.
    pub async fn run(&self, search_term: &str) -> Result<RunSummary, ResolveError> {
        let markets = self.resolver.resolve(search_term).await?;
        let mut summary = RunSummary {
            matched: markets.len(),
            outcomes: Vec::with_capacity(markets.len()),
        };
        if markets.is_empty() {
            tracing::warn!(search = search_term, "no markets matched");
            return Ok(summary);
        }

        let last = markets.len() - 1;
        for (i, market) in markets.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(market_id = %market.id, "cancelled, market not attempted");
                summary.outcomes.push(MarketOutcome {
                    market,
                    status: MarketRunStatus::Skipped,
                    artifacts: Vec::new(),
                    writer_failures: Vec::new(),
                    out_of_range: 0,
                    warnings: Vec::new(),
                });
                continue;
            }

            let outcome = self.process_market(market).await;
            summary.outcomes.push(outcome);

            // API politeness between markets
            if i < last && !self.request_delay.is_zero() && !self.cancel.is_cancelled() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(summary)
    }

    async fn process_market(&self, market: MarketDescriptor) -> MarketOutcome {
        tracing::info!(market_id = %market.id, title = %market.title, "processing market");
        let mut warnings = Vec::new();

        let observations: Vec<Observation> = match self.fetcher.fetch(&market, &self.cancel).await
        {
            Ok(observations) => observations,
            Err(FetchError::Cancelled { .. }) => {
                tracing::warn!(market_id = %market.id, "fetch cancelled mid-market");
                return MarketOutcome {
                    market,
                    status: MarketRunStatus::Skipped,
                    artifacts: Vec::new(),
                    writer_failures: Vec::new(),
                    out_of_range: 0,
                    warnings,
                };
            }
            Err(error @ FetchError::PaginationLimitExceeded { .. }) => {
                // Circuit breaker: keep the partial history, flag the market
                tracing::warn!(market_id = %market.id, error = %error, "pagination breaker tripped, keeping partial history");
                warnings.push(error.to_string());
                error.into_partial()
            }
            Err(error) => {
                tracing::error!(
                    market_id = %market.id,
                    error = %error,
                    partial = error.partial().len(),
                    "history fetch failed"
                );
                return MarketOutcome {
                    market,
                    status: MarketRunStatus::Failed {
                        error: error.to_string(),
                    },
                    artifacts: Vec::new(),
                    writer_failures: Vec::new(),
                    out_of_range: 0,
                    warnings,
                };
            }
        };

        let out_of_range = resample::out_of_range_count(&observations);
        if out_of_range > 0 {
            tracing::warn!(
                market_id = %market.id,
                count = out_of_range,
                "observations outside [0,1] passed through unmodified"
            );
        }

        let series = match ResampledSeries::from_observations(
            market.id.clone(),
            &observations,
            self.interval_seconds,
        ) {
                Ok(series) => series,
                Err(error) => {
                    // Interval is validated before the run; unreachable in practice
                    return MarketOutcome {
                        market,
                        status: MarketRunStatus::Failed {
                            error: error.to_string(),
                        },
                        artifacts: Vec::new(),
                        writer_failures: Vec::new(),
                        out_of_range,
                        warnings,
                    };
                }
            };

        let mut artifacts = Vec::new();
        let mut writer_failures = Vec::new();
        for writer in &self.writers {
            match writer.write(&market, &series, &self.output_dir) {
                Ok(Some(path)) => {
                    tracing::info!(market_id = %market.id, writer = writer.name(), path = %path.display(), "wrote artifact");
                    artifacts.push(path);
                }
                Ok(None) => {
                    tracing::debug!(market_id = %market.id, writer = writer.name(), "nothing to write");
                }
                Err(error) => {
                    tracing::error!(market_id = %market.id, writer = writer.name(), error = %error, "writer failed");
                    writer_failures.push(format!("{}: {}", writer.name(), error));
                }
            }
        }

        MarketOutcome {
            market,
            status: MarketRunStatus::Succeeded {
                points: series.points.len(),
            },
            artifacts,
            writer_failures,
            out_of_range,
            warnings,
        }
    }
}
