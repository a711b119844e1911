//! Fixed-interval resampling of irregular probability observations
//!
//! Converts sparse, irregularly-timed price prints into a gap-free series on
//! deterministic bucket boundaries (multiples of the interval from the Unix
//! epoch). Pure data transformation, no I/O.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Resampling errors
#[derive(Debug, Error)]
pub enum ResampleError {
    /// Interval must be a positive number of seconds
    #[error("resample interval must be positive, got {0} seconds")]
    InvalidInterval(i64),
}

/// One timestamped probability print for a market
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    /// Implied win probability; expected in [0,1] but not enforced here
    pub probability: f64,
}

/// One bucket of the resampled series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Bucket start time, aligned to a multiple of the interval
    pub timestamp: DateTime<Utc>,
    pub probability: f64,
}

/// Gap-free fixed-interval probability series for one market
#[derive(Debug, Clone)]
pub struct ResampledSeries {
    pub market_id: String,
    pub interval_seconds: i64,
    pub points: Vec<SeriesPoint>,
}

impl ResampledSeries {
    /// Resample raw observations into a series labeled with the market id
    pub fn from_observations(
        market_id: impl Into<String>,
        observations: &[Observation],
        interval_seconds: i64,
    ) -> Result<Self, ResampleError> {
        Ok(Self {
            market_id: market_id.into(),
            interval_seconds,
            points: resample(observations, interval_seconds)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Resample observations into gap-free fixed-interval points.
///
/// Observations need not be sorted or deduplicated. Within a bucket the last
/// observation wins (last print reflects current odds); at identical
/// timestamps the later arrival wins. Buckets between the first and last
/// occupied bucket with no observation are forward-filled from the most
/// recent known value. Empty input yields an empty series.
pub fn resample(
    observations: &[Observation],
    interval_seconds: i64,
) -> Result<Vec<SeriesPoint>, ResampleError> {
    if interval_seconds <= 0 {
        return Err(ResampleError::InvalidInterval(interval_seconds));
    }
    if observations.is_empty() {
        return Ok(Vec::new());
    }

    // Stable sort keeps arrival order for equal timestamps, so inserting in
    // sorted order makes the last arrival win.
    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by_key(|obs| obs.timestamp);

    let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
    for obs in &sorted {
        let index = obs.timestamp.timestamp().div_euclid(interval_seconds);
        buckets.insert(index, obs.probability);
    }

    // Bucket start of the earliest observation, with sub-second part dropped.
    let earliest = sorted[0].timestamp;
    let offset_secs = earliest.timestamp().rem_euclid(interval_seconds);
    let start = earliest
        - Duration::seconds(offset_secs)
        - Duration::nanoseconds(i64::from(earliest.timestamp_subsec_nanos()));

    let first = *buckets.keys().next().unwrap_or(&0);
    let last = *buckets.keys().next_back().unwrap_or(&0);
    let step = Duration::seconds(interval_seconds);

    let mut points = Vec::with_capacity((last - first + 1) as usize);
    let mut timestamp = start;
    let mut current = sorted[0].probability;
    for index in first..=last {
        if let Some(&probability) = buckets.get(&index) {
            current = probability;
        }
        points.push(SeriesPoint {
            timestamp,
            probability: current,
        });
        timestamp = timestamp + step;
    }

    Ok(points)
}

/// Count observations whose probability falls outside [0,1].
///
/// Out-of-range values are a source-data defect; they are passed through
/// unmodified and the caller decides how to report them.
pub fn out_of_range_count(observations: &[Observation]) -> usize {
    observations
        .iter()
        .filter(|obs| !(0.0..=1.0).contains(&obs.probability))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(secs: i64, probability: f64) -> Observation {
        Observation {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            probability,
        }
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let points = resample(&[], 10).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = resample(&[obs(0, 0.5)], 0);
        assert!(matches!(result, Err(ResampleError::InvalidInterval(0))));
    }

    #[test]
    fn negative_interval_is_rejected() {
        let result = resample(&[obs(0, 0.5)], -5);
        assert!(matches!(result, Err(ResampleError::InvalidInterval(-5))));
    }

    #[test]
    fn single_observation_yields_one_point() {
        let points = resample(&[obs(17, 0.42)], 10).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp.timestamp(), 10);
        assert_eq!(points[0].probability, 0.42);
    }

    #[test]
    fn forward_fill_carries_last_known_value() {
        let points = resample(&[obs(0, 0.4), obs(35, 0.6)], 10).unwrap();
        let got: Vec<(i64, f64)> = points
            .iter()
            .map(|p| (p.timestamp.timestamp(), p.probability))
            .collect();
        assert_eq!(got, vec![(0, 0.4), (10, 0.4), (20, 0.4), (30, 0.6)]);
    }

    #[test]
    fn same_bucket_collapses_to_latest() {
        let points = resample(&[obs(1, 0.3), obs(2, 0.9)], 10).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp.timestamp(), 0);
        assert_eq!(points[0].probability, 0.9);
    }

    #[test]
    fn equal_timestamps_last_arrival_wins() {
        let points = resample(&[obs(5, 0.2), obs(5, 0.8)], 10).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].probability, 0.8);
    }

    #[test]
    fn unsorted_input_is_deterministic() {
        let shuffled = vec![obs(35, 0.6), obs(0, 0.4), obs(12, 0.5)];
        let ordered = vec![obs(0, 0.4), obs(12, 0.5), obs(35, 0.6)];
        let a = resample(&shuffled, 10).unwrap();
        let b = resample(&ordered, 10).unwrap();
        let c = resample(&shuffled, 10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn buckets_align_to_epoch_multiples() {
        let points = resample(&[obs(1_699_999_995, 0.7)], 10).unwrap();
        assert_eq!(points[0].timestamp.timestamp() % 10, 0);
        assert_eq!(points[0].timestamp.timestamp(), 1_699_999_990);
    }

    #[test]
    fn negative_timestamps_bucket_downward() {
        let points = resample(&[obs(-5, 0.5)], 10).unwrap();
        assert_eq!(points[0].timestamp.timestamp(), -10);
    }

    #[test]
    fn subsecond_timestamps_truncate_to_bucket_start() {
        let timestamp = Utc.timestamp_opt(25, 500_000_000).unwrap();
        let points = resample(
            &[Observation {
                timestamp,
                probability: 0.5,
            }],
            10,
        )
        .unwrap();
        assert_eq!(points[0].timestamp.timestamp(), 20);
        assert_eq!(points[0].timestamp.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn consecutive_points_differ_by_exactly_one_interval() {
        let points = resample(&[obs(3, 0.1), obs(97, 0.9)], 10).unwrap();
        assert_eq!(points.len(), 10);
        for pair in points.windows(2) {
            assert_eq!(
                pair[1].timestamp.timestamp() - pair[0].timestamp.timestamp(),
                10
            );
        }
    }

    #[test]
    fn out_of_range_values_pass_through_but_are_counted() {
        let observations = vec![obs(0, 1.2), obs(10, -0.1), obs(20, 0.5)];
        assert_eq!(out_of_range_count(&observations), 2);
        let points = resample(&observations, 10).unwrap();
        assert_eq!(points[0].probability, 1.2);
        assert_eq!(points[1].probability, -0.1);
    }
}
