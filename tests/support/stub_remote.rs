use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use adscope::model::{
    AccountId, Ack, AnalysisResult, AnalysisSummary, CampaignId, CampaignStatus, TrackableItem,
};
use adscope::remote::{AdsRemote, RemoteError};

#[derive(Default)]
struct Gate {
    released: Mutex<bool>,
    signal: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut released = self.released.lock().unwrap();
        while !*released {
            released = self.signal.wait(released).unwrap();
        }
    }

    fn open(&self) {
        *self.released.lock().unwrap() = true;
        self.signal.notify_all();
    }
}

/// In-memory `AdsRemote` whose campaign fetches can be held per account and released later.
#[derive(Default)]
pub struct GatedRemote {
    campaigns: Mutex<HashMap<String, Result<Vec<TrackableItem>, RemoteError>>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    calls: Mutex<Vec<String>>,
}

impl GatedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_campaigns(&self, account: &str, items: Vec<TrackableItem>) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(account.to_string(), Ok(items));
    }

    pub fn set_failure(&self, account: &str, error: RemoteError) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(account.to_string(), Err(error));
    }

    /// Block campaign fetches for `account` until `release` is called.
    pub fn hold(&self, account: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(account.to_string(), Arc::new(Gate::default()));
    }

    pub fn release(&self, account: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(account) {
            gate.open();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AdsRemote for GatedRemote {
    fn fetch_campaigns(&self, account: &AccountId) -> Result<Vec<TrackableItem>, RemoteError> {
        self.record(format!("campaigns:{account}"));
        let gate = self.gates.lock().unwrap().get(account.as_str()).cloned();
        if let Some(gate) = gate {
            gate.wait();
        }
        self.campaigns
            .lock()
            .unwrap()
            .get(account.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn fetch_analysis(&self, campaign: &CampaignId) -> Result<AnalysisResult, RemoteError> {
        self.record(format!("analysis:{campaign}"));
        Ok(AnalysisResult {
            campaign_id: campaign.clone(),
            interests: Vec::new(),
            summary: AnalysisSummary::default(),
        })
    }

    fn track_campaigns(
        &self,
        campaigns: &[CampaignId],
        account: &AccountId,
    ) -> Result<Ack, RemoteError> {
        self.record(format!("track:{}@{account}", join(campaigns)));
        Ok(Ack {
            message: Some("tracking started".into()),
        })
    }

    fn stop_tracking(&self, campaigns: &[CampaignId]) -> Result<Ack, RemoteError> {
        self.record(format!("stop:{}", join(campaigns)));
        Ok(Ack::default())
    }
}

fn join(campaigns: &[CampaignId]) -> String {
    campaigns
        .iter()
        .map(CampaignId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn campaign(id: &str, name: &str, tracked: bool) -> TrackableItem {
    TrackableItem {
        id: CampaignId::from(id),
        name: name.to_string(),
        status: CampaignStatus::Active,
        objective: "traffic".into(),
        daily_budget: None,
        tracking_enabled: tracked,
        last_synced_at: Some(1_700_000_000),
    }
}
