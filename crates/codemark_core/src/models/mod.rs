//! Data models for highlights and the text ranges they cover.

/// Persisted highlight records.
pub mod highlight;
/// Line/character positions and half-open ranges.
pub mod range;


pub use highlight::Highlight;
pub use range::{ParseRangeError, Position, Range};
