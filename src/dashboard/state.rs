//! Operation bookkeeping and the events the controller reports to its embedder.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{AccountId, CampaignId};

/// Asynchronous operations that carry their own in-flight flag and error slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Loading the campaign list of an account.
    Fetching,
    /// Loading the interest analysis of a campaign.
    Analyzing,
    Tracking,
    Stopping,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fetching => "fetching campaigns",
            Self::Analyzing => "analyzing interests",
            Self::Tracking => "tracking",
            Self::Stopping => "stopping tracking",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// In-flight flags for the user-triggered actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ActionFlags {
    pub(crate) tracking: bool,
    pub(crate) stopping: bool,
}

impl ActionFlags {
    pub(crate) fn get(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Tracking => self.tracking,
            OperationKind::Stopping => self.stopping,
            OperationKind::Fetching | OperationKind::Analyzing => false,
        }
    }

    pub(crate) fn set(&mut self, kind: OperationKind, value: bool) {
        match kind {
            OperationKind::Tracking => self.tracking = value,
            OperationKind::Stopping => self.stopping = value,
            OperationKind::Fetching | OperationKind::Analyzing => {}
        }
    }
}

/// Last failure per operation kind, kept until the next attempt of that kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationErrors {
    entries: HashMap<OperationKind, String>,
}

impl OperationErrors {
    pub fn record(&mut self, kind: OperationKind, message: impl Into<String>) {
        self.entries.insert(kind, message.into());
    }

    pub fn clear(&mut self, kind: OperationKind) {
        self.entries.remove(&kind);
    }

    pub fn get(&self, kind: OperationKind) -> Option<&str> {
        self.entries.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Something the controller did while processing timers and job results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardEvent {
    /// A fetch left for the remote.
    FetchIssued { kind: OperationKind, target: String },
    /// A fresh campaign list for the current account is displayed.
    CampaignsUpdated { account: AccountId, count: usize },
    /// A fresh analysis for the current campaign is displayed.
    AnalysisUpdated { campaign: CampaignId, interests: usize },
    /// A response arrived for a target that is no longer current and was dropped.
    ResponseDiscarded { kind: OperationKind, target: String },
    /// An operation failed; earlier data stays visible.
    OperationFailed { kind: OperationKind, message: String },
    Tracked { campaigns: Vec<CampaignId> },
    TrackingStopped { campaigns: Vec<CampaignId> },
}

/// Reasons a user action was refused before anything was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Already {0}; wait for it to finish")]
    AlreadyInFlight(OperationKind),
    #[error("No campaigns selected")]
    NothingSelected,
    #[error("Select an ad account first")]
    NoAccount,
    #[error("No campaign selected")]
    NoCampaign,
}
