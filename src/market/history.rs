//! History fetcher: paginated trade/price retrieval for one market

use super::{FetchError, MarketDescriptor, Page};
use crate::pipeline::CancelFlag;
use crate::resample::Observation;
use crate::transport::{with_retry, RetryPolicy, Transport};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// History-endpoint configuration
#[derive(Debug, Clone)]
pub struct HistoryFetcherConfig {
    /// History path template with a `{market_id}` placeholder
    pub history_path_template: String,
    /// Page size requested from the API
    pub page_size: u32,
    /// Circuit breaker against a looping/malformed API; always positive
    pub max_pages: u32,
}

impl Default for HistoryFetcherConfig {
    fn default() -> Self {
        Self {
            history_path_template: "/markets/{market_id}/history".to_string(),
            page_size: 500,
            max_pages: 1000,
        }
    }
}

/// Fetches the complete trade/price history for a resolved market
pub struct HistoryFetcher {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    config: HistoryFetcherConfig,
}

impl HistoryFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        config: HistoryFetcherConfig,
    ) -> Self {
        Self {
            transport,
            retry,
            config,
        }
    }

    /// Walk history pages until the API signals exhaustion (empty page or
    /// missing cursor), concatenating observations. The result is sorted
    /// chronologically; pages are not assumed to arrive in order.
    ///
    /// Cancellation is checked between pages. All failure variants carry
    /// whatever was collected before the failure, already sorted.
    pub async fn fetch(
        &self,
        market: &MarketDescriptor,
        cancel: &CancelFlag,
    ) -> Result<Vec<Observation>, FetchError> {
        let path = self
            .config
            .history_path_template
            .replace("{market_id}", &market.id);
        let mut observations: Vec<Observation> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    partial: sorted(observations),
                });
            }
            if pages >= self.config.max_pages {
                return Err(FetchError::PaginationLimitExceeded {
                    limit: self.config.max_pages,
                    partial: sorted(observations),
                });
            }

            let mut query = vec![("limit".to_string(), self.config.page_size.to_string())];
            if let Some(c) = &cursor {
                query.push(("cursor".to_string(), c.clone()));
            }

            // Same cursor on retry; only a successful page advances it.
            let transport = Arc::clone(&self.transport);
            let page_path = path.clone();
            let result = with_retry(&self.retry, "market history", || {
                let transport = Arc::clone(&transport);
                let path = page_path.clone();
                let query = query.clone();
                async move { transport.get_json(&path, &query).await }
            })
            .await;

            let payload = match result {
                Ok(payload) => payload,
                Err(source) => {
                    return Err(FetchError::Http {
                        source,
                        partial: sorted(observations),
                    });
                }
            };

            let page = match serde_json::from_value::<Page<HistoryRow>>(payload) {
                Ok(page) => page,
                Err(e) => {
                    return Err(FetchError::Schema {
                        detail: e.to_string(),
                        partial: sorted(observations),
                    });
                }
            };

            let (rows, next_cursor) = page.into_parts();
            if rows.is_empty() {
                break;
            }

            let mut skipped = 0usize;
            for row in rows {
                match row.into_observation() {
                    Some(obs) => observations.push(obs),
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                tracing::debug!(
                    market_id = %market.id,
                    skipped,
                    "dropped history rows without a usable timestamp/price"
                );
            }

            pages += 1;
            match next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        tracing::info!(
            market_id = %market.id,
            observations = observations.len(),
            pages,
            "fetched history"
        );
        Ok(sorted(observations))
    }
}

fn sorted(mut observations: Vec<Observation>) -> Vec<Observation> {
    // Stable: equal timestamps keep arrival order for last-wins downstream
    observations.sort_by_key(|obs| obs.timestamp);
    observations
}

/// Epoch seconds (possibly fractional) or a textual timestamp
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimestampValue {
    Seconds(f64),
    Text(String),
}

impl TimestampValue {
    fn into_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Seconds(secs) => from_epoch(secs),
            Self::Text(text) => {
                // Numeric strings first, then the formats the API emits
                if let Ok(secs) = text.parse::<f64>() {
                    return from_epoch(secs);
                }
                if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
                    return Some(parsed.with_timezone(&Utc));
                }
                NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| naive.and_utc())
            }
        }
    }
}

fn from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// A price as a JSON number or numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn into_f64(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

/// One trade/price row, tolerant of the field-name variants the endpoint
/// uses for timestamps and prices
#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(
        default,
        alias = "time",
        alias = "createdAt",
        alias = "blockTimestamp"
    )]
    timestamp: Option<TimestampValue>,
    #[serde(default, alias = "probability", alias = "p", alias = "value")]
    price: Option<PriceValue>,
}

impl HistoryRow {
    /// Rows missing either field are skipped rather than failing the page
    fn into_observation(self) -> Option<Observation> {
        let timestamp = self.timestamp?.into_datetime()?;
        let probability = self.price?.into_f64()?;
        Some(Observation {
            timestamp,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Option<Observation> {
        serde_json::from_value::<HistoryRow>(value)
            .unwrap()
            .into_observation()
    }

    #[test]
    fn row_with_epoch_timestamp_and_numeric_price() {
        let obs = row(json!({"timestamp": 1700000000, "price": 0.62})).unwrap();
        assert_eq!(obs.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(obs.probability, 0.62);
    }

    #[test]
    fn row_with_aliased_fields() {
        let obs = row(json!({"time": "1700000000.5", "p": "0.4"})).unwrap();
        assert_eq!(obs.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(obs.timestamp.timestamp_subsec_millis(), 500);
        assert_eq!(obs.probability, 0.4);
    }

    #[test]
    fn row_with_rfc3339_timestamp() {
        let obs = row(json!({"createdAt": "2024-01-15T10:00:00Z", "value": 0.55})).unwrap();
        assert_eq!(obs.timestamp.to_rfc3339(), "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn row_with_space_separated_timestamp() {
        let obs = row(json!({"timestamp": "2024-01-15 10:00:00", "price": 0.5})).unwrap();
        assert_eq!(obs.timestamp.timestamp(), 1_705_312_800);
    }

    #[test]
    fn unusable_rows_are_skipped() {
        assert!(row(json!({"price": 0.5})).is_none());
        assert!(row(json!({"timestamp": 1700000000})).is_none());
        assert!(row(json!({"timestamp": "not a time", "price": 0.5})).is_none());
        assert!(row(json!({"timestamp": 1700000000, "price": "not a number"})).is_none());
    }
}
