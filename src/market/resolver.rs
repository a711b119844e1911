//! Market resolver: free-text search over the paginated listing endpoint

use super::{MarketDescriptor, MarketStatus, Page, ResolveError};
use crate::transport::{with_retry, RetryPolicy, Transport};
use serde::Deserialize;
use std::sync::Arc;

/// Listing-endpoint configuration
#[derive(Debug, Clone)]
pub struct MarketResolverConfig {
    /// Listing endpoint path, e.g. "/markets"
    pub markets_path: String,
    /// Page size requested from the API
    pub page_size: u32,
    /// Maximum listing pages to walk (0 = no limit)
    pub max_pages: u32,
    /// Restrict the listing to resolved/closed markets
    pub resolved_only: bool,
}

impl Default for MarketResolverConfig {
    fn default() -> Self {
        Self {
            markets_path: "/markets".to_string(),
            page_size: 100,
            max_pages: 0,
            resolved_only: true,
        }
    }
}

/// Resolves a search term to market descriptors via the listing endpoint
pub struct MarketResolver {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    config: MarketResolverConfig,
}

impl MarketResolver {
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        config: MarketResolverConfig,
    ) -> Self {
        Self {
            transport,
            retry,
            config,
        }
    }

    /// Accumulate all markets whose title or slug contains `search_term`,
    /// case-insensitively, walking listing pages until the API signals
    /// exhaustion. An empty match set is not an error.
    pub async fn resolve(&self, search_term: &str) -> Result<Vec<MarketDescriptor>, ResolveError> {
        let needle = search_term.to_lowercase();
        let mut markets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut query = vec![
                ("limit".to_string(), self.config.page_size.to_string()),
                ("search".to_string(), search_term.to_string()),
            ];
            if self.config.resolved_only {
                query.push(("closed".to_string(), "true".to_string()));
            }
            if let Some(c) = &cursor {
                query.push(("cursor".to_string(), c.clone()));
            }

            // The closure re-issues the same cursor on retry; the cursor
            // only advances after a page parses successfully.
            let transport = Arc::clone(&self.transport);
            let path = self.config.markets_path.clone();
            let payload = with_retry(&self.retry, "market listing", || {
                let transport = Arc::clone(&transport);
                let path = path.clone();
                let query = query.clone();
                async move { transport.get_json(&path, &query).await }
            })
            .await?;

            let page: Page<ListingMarket> = serde_json::from_value(payload)
                .map_err(|e| ResolveError::Schema(e.to_string()))?;
            let (items, next_cursor) = page.into_parts();
            if items.is_empty() {
                break;
            }

            for item in items {
                if let Some(descriptor) = item.into_descriptor() {
                    if descriptor.matches(&needle) {
                        markets.push(descriptor);
                    }
                }
            }

            pages += 1;
            if self.config.max_pages > 0 && pages >= self.config.max_pages {
                tracing::debug!(pages, "listing page limit reached, stopping");
                break;
            }
            match next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        tracing::info!(
            search = search_term,
            matched = markets.len(),
            pages,
            "resolved markets"
        );
        Ok(markets)
    }
}

/// Market ids arrive as strings or bare numbers depending on the endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(i64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One market object from the listing endpoint, tolerant of the field-name
/// variants seen across API versions
#[derive(Debug, Deserialize)]
struct ListingMarket {
    #[serde(default, alias = "market_id", alias = "conditionId")]
    id: Option<IdValue>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default, alias = "question")]
    title: Option<String>,
    #[serde(default, alias = "state")]
    status: Option<String>,
    #[serde(default)]
    resolved: Option<bool>,
    #[serde(default)]
    closed: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
}

impl ListingMarket {
    /// Markets lacking an id or title are unusable and dropped
    fn into_descriptor(self) -> Option<MarketDescriptor> {
        let id = self.id?.into_string();
        let title = self.title?;
        if id.is_empty() || title.is_empty() {
            return None;
        }
        let status = match &self.status {
            Some(s) if !s.is_empty() => MarketStatus::parse(s),
            _ => {
                if self.resolved == Some(true) {
                    MarketStatus::Resolved
                } else if self.closed == Some(true) {
                    MarketStatus::Closed
                } else if self.active == Some(true) {
                    MarketStatus::Open
                } else {
                    MarketStatus::Unknown
                }
            }
        };
        Some(MarketDescriptor {
            id,
            slug: self.slug.unwrap_or_default(),
            title,
            status,
        })
    }
}
