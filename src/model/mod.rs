//! Typed records exchanged with the ads platform and the analysis backend.
//!
//! Remote JSON is decoded into the `Raw*` shapes first and converted with `TryFrom`, so the
//! dashboard core only ever sees fully-shaped records.

mod campaign;
mod errors;
mod interest;

use serde::{Deserialize, Serialize};

pub use campaign::{CampaignStatus, RawCampaign, TrackableItem};
pub use errors::RecordError;
pub use interest::{
    AnalysisResult, AnalysisSummary, AnalyzedInterest, RawAnalysisResult, RawInterest,
    RawSubScores, RawSummary, SubScores,
};

/// Identifier of an ad account; the key for campaign list caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a campaign; the key for analysis caching and the selection sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Wrap an identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CampaignId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement returned by track/stop-track calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Clamp a remote score into `[0, 100]`; non-finite values count as missing.
pub(crate) fn normalize_score(value: Option<f64>) -> Option<f64> {
    value
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 100.0))
}

/// Trim a required string field, treating blanks as missing.
pub(crate) fn required(
    value: Option<String>,
    record: &'static str,
    field: &'static str,
) -> Result<String, RecordError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RecordError::MissingField { record, field }),
    }
}
