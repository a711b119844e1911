//! Market discovery and history retrieval
//!
//! Resolves a free-text search term to concrete market descriptors via the
//! listing endpoint and pulls the full trade/price history for each market,
//! page by page, through the transport boundary.

mod history;
mod resolver;

pub use history::{HistoryFetcher, HistoryFetcherConfig};
pub use resolver::{MarketResolver, MarketResolverConfig};

use crate::resample::Observation;
use crate::transport::TransportError;
use serde::Deserialize;
use thiserror::Error;

/// Lifecycle state of a market, parsed leniently from API strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    Closed,
    Resolved,
    Unknown,
}

impl MarketStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" | "active" | "trading" => Self::Open,
            "closed" | "inactive" => Self::Closed,
            "resolved" | "finalized" | "settled" => Self::Resolved,
            _ => Self::Unknown,
        }
    }
}

/// One tradable contract identified by the listing endpoint
#[derive(Debug, Clone)]
pub struct MarketDescriptor {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub status: MarketStatus,
}

impl MarketDescriptor {
    /// Case-insensitive substring match against title or slug
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self.slug.to_lowercase().contains(needle_lowercase)
    }
}

/// Search-term resolution failure; fatal to the run since no markets could
/// be identified at all
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("market listing request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed listing response: {0}")]
    Schema(String),
}

/// Per-market history retrieval failure.
///
/// Every variant carries the observations collected before the failure so
/// the orchestrator can decide whether partial data is acceptable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("history request failed: {source}")]
    Http {
        source: TransportError,
        partial: Vec<Observation>,
    },
    #[error("malformed history page: {detail}")]
    Schema {
        detail: String,
        partial: Vec<Observation>,
    },
    #[error("history pagination exceeded {limit} pages")]
    PaginationLimitExceeded {
        limit: u32,
        partial: Vec<Observation>,
    },
    #[error("fetch cancelled")]
    Cancelled { partial: Vec<Observation> },
}

impl FetchError {
    /// Observations collected before the failure, in chronological order
    pub fn partial(&self) -> &[Observation] {
        match self {
            Self::Http { partial, .. }
            | Self::Schema { partial, .. }
            | Self::PaginationLimitExceeded { partial, .. }
            | Self::Cancelled { partial } => partial,
        }
    }

    pub fn into_partial(self) -> Vec<Observation> {
        match self {
            Self::Http { partial, .. }
            | Self::Schema { partial, .. }
            | Self::PaginationLimitExceeded { partial, .. }
            | Self::Cancelled { partial } => partial,
        }
    }
}

/// A paginated API payload: either `{data: [...], nextCursor: ...}` or a
/// bare array (the endpoint is inconsistent between deployments)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Page<T> {
    Wrapped {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(rename = "nextCursor", alias = "next_cursor", default)]
        next_cursor: Option<String>,
    },
    Bare(Vec<T>),
}

impl<T> Page<T> {
    /// Split into items and the cursor for the next page, if any
    pub(crate) fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            Self::Wrapped { data, next_cursor } => {
                let cursor = next_cursor.filter(|c| !c.is_empty());
                (data, cursor)
            }
            Self::Bare(data) => (data, None),
        }
    }
}
