//! poly-odds: win-probability history capture for prediction markets
//!
//! This library provides the core components for:
//! - Market discovery via a paginated listing endpoint
//! - Full trade/price history retrieval with bounded retries
//! - Fixed-interval resampling with forward-fill
//! - CSV, SVG, and interactive HTML artifact output
//! - Per-market failure isolation and an end-of-run summary

pub mod cli;
pub mod config;
pub mod market;
pub mod output;
pub mod pipeline;
pub mod resample;
pub mod telemetry;
pub mod transport;
