//! Collaborators the dashboard core calls: the ads platform and the analysis backend.
//!
//! The core only sees the `AdsRemote` trait. Calls are blocking and run on worker threads
//! spawned by the dashboard job runner.

mod api;
mod token_store;

pub use api::HttpAdsRemote;
pub use token_store::{TokenStore, TokenStoreError};

use crate::model::{AccountId, Ack, AnalysisResult, CampaignId, TrackableItem};

/// Errors reported by remote collaborators.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Token missing, invalid or expired.
    #[error("Not authorized; sign in again")]
    Unauthorized,
    /// The platform throttled the request.
    #[error("Rate limited; try again later")]
    RateLimited,
    /// Non-success HTTP status with the (truncated) response body.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    /// Connection-level failure.
    #[error("HTTP error: {0}")]
    Transport(String),
    /// Response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
    /// No remote endpoint is configured.
    #[error("Remote not configured: {0}")]
    NotConfigured(String),
}

impl RemoteError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited => true,
            Self::Status { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

/// Operations provided by the ads platform and analysis backend.
pub trait AdsRemote: Send + Sync {
    fn fetch_campaigns(&self, account: &AccountId) -> Result<Vec<TrackableItem>, RemoteError>;

    fn fetch_analysis(&self, campaign: &CampaignId) -> Result<AnalysisResult, RemoteError>;

    fn track_campaigns(
        &self,
        campaigns: &[CampaignId],
        account: &AccountId,
    ) -> Result<Ack, RemoteError>;

    /// Stop tracking one campaign or a batch of them.
    fn stop_tracking(&self, campaigns: &[CampaignId]) -> Result<Ack, RemoteError>;
}
