use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::{
    MIN_STALENESS_HORIZON_SECS, clamp_at_least_one, clamp_debounce_ms,
    default_campaign_buckets, default_campaigns_page_size, default_debounce_ms,
    default_interest_buckets, default_interests_page_size, default_max_attempts,
    default_no_data, default_retry_base_delay_ms, default_staleness_horizon_secs,
    default_tracking_capacity,
};
use super::errors::ConfigError;
use crate::dashboard::{BucketRule, BucketScheme, PageResetPolicy, SchemeError, SyncSettings};

/// Everything stored in `config.toml`.
///
/// Every section is optional in the file; missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub sync: SyncOptions,
    pub selection: SelectionOptions,
    pub pages: PageOptions,
    pub classification: ClassificationOptions,
    pub remote: RemoteOptions,
    /// Account reopened on the next launch.
    pub last_visited_account: Option<String>,
}

impl DashboardSettings {
    /// Clamp values into their supported ranges.
    pub fn normalized(mut self) -> Self {
        self.sync.debounce_ms = clamp_debounce_ms(self.sync.debounce_ms);
        self.sync.analysis_debounce_ms = clamp_debounce_ms(self.sync.analysis_debounce_ms);
        self.sync.staleness_horizon_secs = self
            .sync
            .staleness_horizon_secs
            .max(MIN_STALENESS_HORIZON_SECS);
        self.selection.tracking_capacity = clamp_at_least_one(self.selection.tracking_capacity);
        self.selection.stop_capacity = self.selection.stop_capacity.map(clamp_at_least_one);
        self.pages.campaigns_page_size = clamp_at_least_one(self.pages.campaigns_page_size);
        self.pages.interests_page_size = clamp_at_least_one(self.pages.interests_page_size);
        self.remote.max_attempts = clamp_at_least_one(self.remote.max_attempts);
        self.last_visited_account = self
            .last_visited_account
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        self
    }

    /// Check that both classification sections build valid schemes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interest_scheme()?;
        self.campaign_scheme()?;
        Ok(())
    }

    pub fn interest_scheme(&self) -> Result<BucketScheme, ConfigError> {
        self.classification
            .interests
            .to_scheme()
            .map_err(|source| ConfigError::Scheme {
                section: "interests",
                source,
            })
    }

    pub fn campaign_scheme(&self) -> Result<BucketScheme, ConfigError> {
        self.classification
            .campaigns
            .to_scheme()
            .map_err(|source| ConfigError::Scheme {
                section: "campaigns",
                source,
            })
    }
}

/// Config keys: `staleness_horizon_secs`, `debounce_ms`, `analysis_debounce_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Age after which cached campaigns or analyses are refetched.
    pub staleness_horizon_secs: u64,
    /// Quiet period before an account selection triggers a fetch.
    pub debounce_ms: u64,
    /// Quiet period before a campaign selection triggers an analysis fetch.
    pub analysis_debounce_ms: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            staleness_horizon_secs: default_staleness_horizon_secs(),
            debounce_ms: default_debounce_ms(),
            analysis_debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncOptions {
    pub fn account_sync(&self) -> SyncSettings {
        SyncSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            horizon: self.horizon(),
        }
    }

    pub fn analysis_sync(&self) -> SyncSettings {
        SyncSettings {
            debounce: Duration::from_millis(self.analysis_debounce_ms),
            horizon: self.horizon(),
        }
    }

    pub fn horizon(&self) -> Duration {
        Duration::from_secs(self.staleness_horizon_secs)
    }
}

/// Config keys: `tracking_capacity`, `stop_capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    pub tracking_capacity: usize,
    /// Unbounded when absent.
    pub stop_capacity: Option<usize>,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            tracking_capacity: default_tracking_capacity(),
            stop_capacity: None,
        }
    }
}

/// Config keys: `campaigns_page_size`, `interests_page_size`, `on_change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    pub campaigns_page_size: usize,
    pub interests_page_size: usize,
    /// `"clamp"` keeps the page number inside the new range, `"first"` goes back to page 1.
    pub on_change: PageResetPolicy,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            campaigns_page_size: default_campaigns_page_size(),
            interests_page_size: default_interests_page_size(),
            on_change: PageResetPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationOptions {
    pub interests: SchemeConfig,
    pub campaigns: SchemeConfig,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            interests: SchemeConfig {
                buckets: default_interest_buckets(),
                no_data: default_no_data(),
            },
            campaigns: SchemeConfig {
                buckets: default_campaign_buckets(),
                no_data: default_no_data(),
            },
        }
    }
}

/// Bucket thresholds as written in the config file, highest first.
///
/// An empty `no_data` sends unscored records to the lowest bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub buckets: Vec<BucketRule>,
    #[serde(default = "default_no_data")]
    pub no_data: Option<String>,
}

impl SchemeConfig {
    pub fn to_scheme(&self) -> Result<BucketScheme, SchemeError> {
        let no_data = self
            .no_data
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        BucketScheme::new(self.buckets.clone(), no_data)
    }
}

/// Config keys: `base_url`, `max_attempts`, `retry_base_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteOptions {
    /// Backend root, e.g. `https://dashboard.example.com/api`.
    pub base_url: Option<String>,
    /// Attempts per read request, including the first.
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}
