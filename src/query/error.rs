//! Query state-specific error types.

/// Errors that can occur while mutating list state.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Page size outside the supported set
    #[error("Unsupported page size {size} (expected one of {allowed:?})")]
    UnsupportedPageSize { size: u32, allowed: &'static [u32] },

    /// Filter name not known to the screen
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Column name not known to the screen
    #[error("Unknown sort column: {0}")]
    UnknownColumn(String),
}
