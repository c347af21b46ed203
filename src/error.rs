//! Error type for the traffic core.
//!
//! Aggregation and filtering are total over well-typed input; the only value
//! the core can reject is a time selector outside the slider's range.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrafficError {
    #[error("time filter must be -1 (any time) or a minute in 0..=1439, got {0}")]
    InvalidTimeFilter(i32),
}
