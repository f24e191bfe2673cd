use thiserror::Error;

/// Reasons a remote record is rejected at the boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field was absent or blank.
    #[error("{record} record is missing required field `{field}`")]
    MissingField {
        /// Record kind, e.g. `campaign`.
        record: &'static str,
        /// Missing field name.
        field: &'static str,
    },
    /// A monetary field could not be represented in minor units.
    #[error("{record} record has an invalid `{field}`: {value}")]
    InvalidAmount {
        /// Record kind.
        record: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value as received.
        value: String,
    },
    /// A timestamp was neither unix seconds nor an RFC 3339 string.
    #[error("{record} record has an invalid `{field}`: {value}")]
    InvalidTimestamp {
        /// Record kind.
        record: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value as received.
        value: String,
    },
    /// The record did not have the expected JSON shape.
    #[error("{record} record is malformed: {message}")]
    Malformed {
        /// Record kind.
        record: &'static str,
        /// Decoder message.
        message: String,
    },
}
