//! Error types for the dashboard pipeline.
//!
//! Failures fall under one of two policies. A failed fetch aborts the page:
//! nothing downstream of the data source is rendered. A chart that cannot be
//! drawn is replaced by an inline placeholder and the rest of the page still
//! renders. Rows without usable coordinates are not errors at all; the
//! geometry filter drops them.

use thiserror::Error;

/// How a failure affects the page being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Skip every dependent stage and show a single error banner.
    AbortPage,
    /// Replace only the affected widget with an error placeholder.
    InlinePlaceholder,
}

/// Errors produced while acquiring the source data.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch data from API. Status code: {0}")]
    Status(u16),

    #[error("Failed to reach data API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode GeoJSON response: {0}")]
    Decode(#[from] geojson::Error),

    #[error("GeoJSON response must be a FeatureCollection")]
    NotFeatureCollection,
}

impl FetchError {
    pub fn policy(&self) -> FailurePolicy {
        FailurePolicy::AbortPage
    }
}

/// Errors produced when a chart cannot be computed for the selected column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("No data available for {column}")]
    MissingColumn { column: String },

    #[error("No data available for {column}")]
    EmptyCollection { column: String },
}

impl ChartError {
    pub fn policy(&self) -> FailurePolicy {
        FailurePolicy::InlinePlaceholder
    }

    pub fn column(&self) -> &str {
        match self {
            ChartError::MissingColumn { column } | ChartError::EmptyCollection { column } => column,
        }
    }
}

/// Errors produced while resolving dashboard control values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("unknown basemap: {0}")]
    UnknownBasemap(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_names_the_code() {
        let err = FetchError::Status(503);
        assert_eq!(err.to_string(), "Failed to fetch data from API. Status code: 503");
        assert_eq!(err.policy(), FailurePolicy::AbortPage);
    }

    #[test]
    fn chart_errors_are_inline() {
        let err = ChartError::MissingColumn { column: "agency".into() };
        assert_eq!(err.to_string(), "No data available for agency");
        assert_eq!(err.policy(), FailurePolicy::InlinePlaceholder);
        assert_eq!(err.column(), "agency");
    }
}
