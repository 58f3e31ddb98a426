//! Integration tests for the REDAP telemetry pipeline
//!
//! This test suite validates:
//! - Bounded FIFO retention across the public store API
//! - Torn-read freedom under concurrent writers and readers
//! - Decoder -> driver -> store -> query facade flow

pub mod test_utils;

#[cfg(test)]
mod store_concurrency_tests;

#[cfg(test)]
mod ingest_pipeline_tests;
