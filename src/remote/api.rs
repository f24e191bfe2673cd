//! HTTP+JSON implementation of `AdsRemote`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AdsRemote, RemoteError};
use crate::config::RemoteOptions;
use crate::http_client::{self, RetryConfig};
use crate::model::{
    AccountId, Ack, AnalysisResult, CampaignId, RawAnalysisResult, TrackableItem,
};

const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_ERROR_BYTES: usize = 64 * 1024;

/// Talks to the dashboard backend, which fronts both the ads platform and the analysis
/// service.
#[derive(Clone, Debug)]
pub struct HttpAdsRemote {
    base: Url,
    token: Option<String>,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct TrackRequest<'a> {
    account_id: &'a AccountId,
    campaign_ids: &'a [CampaignId],
}

#[derive(Debug, Serialize)]
struct StopRequest<'a> {
    campaign_ids: &'a [CampaignId],
}

/// List endpoints answer either with a bare array or with `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(items) => items,
        }
    }
}

impl HttpAdsRemote {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        options: &RemoteOptions,
    ) -> Result<Self, RemoteError> {
        let mut base = Url::parse(base_url.trim()).map_err(|err| {
            RemoteError::NotConfigured(format!("invalid base url `{base_url}`: {err}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::NotConfigured(format!(
                "base url `{base_url}` cannot carry a path"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            token: token.filter(|token| !token.trim().is_empty()),
            retry: RetryConfig {
                max_attempts: options.max_attempts.max(1),
                base_delay: Duration::from_millis(options.retry_base_delay_ms),
                max_delay: Duration::from_secs(5),
            },
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        let request = request.set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token.trim())),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, RemoteError> {
        http_client::retry_with_backoff(
            self.retry,
            || {
                let request = self.authorize(http_client::agent().get(url.as_str()));
                match request.call() {
                    Ok(response) => decode(response),
                    Err(err) => Err(map_error(err)),
                }
            },
            RemoteError::is_transient,
        )
    }

    fn post_json<B: Serialize>(&self, url: &Url, body: &B) -> Result<Ack, RemoteError> {
        let request = self.authorize(http_client::agent().post(url.as_str()));
        let response = request.send_json(body).map_err(map_error)?;
        let bytes = http_client::read_response_bytes(response, MAX_ERROR_BYTES)
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Ack::default());
        }
        serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

impl AdsRemote for HttpAdsRemote {
    fn fetch_campaigns(&self, account: &AccountId) -> Result<Vec<TrackableItem>, RemoteError> {
        let url = self.endpoint(&["accounts", account.as_str(), "campaigns"]);
        let envelope: ListEnvelope<serde_json::Value> = self.get_json(&url)?;
        let mut campaigns = Vec::new();
        for raw in envelope.into_items() {
            match TrackableItem::from_json(raw) {
                Ok(item) => campaigns.push(item),
                Err(err) => tracing::warn!("Skipping campaign for account {account}: {err}"),
            }
        }
        Ok(campaigns)
    }

    fn fetch_analysis(&self, campaign: &CampaignId) -> Result<AnalysisResult, RemoteError> {
        let url = self.endpoint(&["campaigns", campaign.as_str(), "analysis"]);
        let raw: RawAnalysisResult = self.get_json(&url)?;
        Ok(raw.into_result(campaign.clone()))
    }

    fn track_campaigns(
        &self,
        campaigns: &[CampaignId],
        account: &AccountId,
    ) -> Result<Ack, RemoteError> {
        let url = self.endpoint(&["tracking"]);
        self.post_json(
            &url,
            &TrackRequest {
                account_id: account,
                campaign_ids: campaigns,
            },
        )
    }

    fn stop_tracking(&self, campaigns: &[CampaignId]) -> Result<Ack, RemoteError> {
        let url = self.endpoint(&["tracking", "stop"]);
        self.post_json(
            &url,
            &StopRequest {
                campaign_ids: campaigns,
            },
        )
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, RemoteError> {
    let bytes = http_client::read_response_bytes(response, MAX_RESPONSE_BYTES)
        .map_err(|err| RemoteError::Decode(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))
}

fn map_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(401 | 403, _) => RemoteError::Unauthorized,
        ureq::Error::Status(429, _) => RemoteError::RateLimited,
        ureq::Error::Status(code, response) => RemoteError::Status {
            code,
            body: http_client::error_snippet(response, MAX_ERROR_BYTES),
        },
        ureq::Error::Transport(err) => RemoteError::Transport(err.to_string()),
    }
}
