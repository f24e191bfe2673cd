use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{CampaignId, RecordError, required};

/// Delivery status reported by the ads platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    Active,
    Paused,
    Archived,
    Unknown,
}

impl CampaignStatus {
    /// Parse the platform's status string; anything unrecognized maps to `Unknown`.
    pub fn from_remote(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "paused" => Self::Paused,
            "archived" => Self::Archived,
            _ => Self::Unknown,
        }
    }

    /// Lowercase label used for display and status filtering.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Campaign eligible for tracking.
///
/// `tracking_enabled` only changes through successful track/stop-track calls; everything
/// else is replaced wholesale when the campaign list is re-fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackableItem {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    /// Free-form objective tag, e.g. `OUTCOME_TRAFFIC`.
    pub objective: String,
    /// Daily budget in minor currency units.
    pub daily_budget: Option<i64>,
    pub tracking_enabled: bool,
    /// Unix seconds of the last backend sync.
    pub last_synced_at: Option<i64>,
}

/// Campaign as decoded from JSON, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCampaign {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub daily_budget: Option<serde_json::Value>,
    #[serde(default, alias = "is_tracked")]
    pub tracking_enabled: Option<bool>,
    /// Unix seconds or an RFC 3339 string.
    #[serde(default)]
    pub last_synced_at: Option<serde_json::Value>,
}

impl TrackableItem {
    /// Decode and validate one campaign from a list response.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        let raw: RawCampaign =
            serde_json::from_value(value).map_err(|err| RecordError::Malformed {
                record: "campaign",
                message: err.to_string(),
            })?;
        Self::try_from(raw)
    }
}

impl TryFrom<RawCampaign> for TrackableItem {
    type Error = RecordError;

    fn try_from(raw: RawCampaign) -> Result<Self, Self::Error> {
        let id = required(raw.id, "campaign", "id")?;
        let name = required(raw.name, "campaign", "name")?;
        let daily_budget = raw.daily_budget.map(parse_minor_units).transpose()?.flatten();
        let last_synced_at = raw.last_synced_at.map(parse_timestamp).transpose()?.flatten();
        Ok(Self {
            id: CampaignId::from_string(id),
            name,
            status: raw
                .status
                .as_deref()
                .map(CampaignStatus::from_remote)
                .unwrap_or(CampaignStatus::Unknown),
            objective: raw.objective.unwrap_or_default().trim().to_string(),
            daily_budget,
            tracking_enabled: raw.tracking_enabled.unwrap_or(false),
            last_synced_at,
        })
    }
}

/// Budgets arrive as integers or as numeric strings depending on the endpoint.
fn parse_minor_units(value: serde_json::Value) -> Result<Option<i64>, RecordError> {
    let invalid = |value: &serde_json::Value| RecordError::InvalidAmount {
        record: "campaign",
        field: "daily_budget",
        value: value.to_string(),
    };
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => {
            number.as_i64().map(Some).ok_or_else(|| invalid(&value))
        }
        serde_json::Value::String(text) if text.trim().is_empty() => Ok(None),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(&value)),
        _ => Err(invalid(&value)),
    }
}

fn parse_timestamp(value: serde_json::Value) -> Result<Option<i64>, RecordError> {
    let invalid = |value: &serde_json::Value| RecordError::InvalidTimestamp {
        record: "campaign",
        field: "last_synced_at",
        value: value.to_string(),
    };
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => {
            number.as_i64().map(Some).ok_or_else(|| invalid(&value))
        }
        serde_json::Value::String(text) if text.trim().is_empty() => Ok(None),
        serde_json::Value::String(text) => OffsetDateTime::parse(text.trim(), &Rfc3339)
            .map(|stamp| Some(stamp.unix_timestamp()))
            .map_err(|_| invalid(&value)),
        _ => Err(invalid(&value)),
    }
}
