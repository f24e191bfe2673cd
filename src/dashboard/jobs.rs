//! Worker threads that run remote calls off the caller's thread.
//!
//! Each call runs on its own thread and reports back through one channel; the controller
//! drains it from `tick`.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use super::sync::FetchTicket;
use crate::model::{AccountId, Ack, AnalysisResult, CampaignId, TrackableItem};
use crate::remote::{AdsRemote, RemoteError};

pub(crate) enum JobMessage {
    CampaignsFetched(FetchResult<AccountId, Vec<TrackableItem>>),
    AnalysisFetched(FetchResult<CampaignId, AnalysisResult>),
    Tracked(ActionResult),
    Stopped(ActionResult),
}

pub(crate) struct FetchResult<K, P> {
    pub(crate) ticket: FetchTicket<K>,
    pub(crate) result: Result<P, RemoteError>,
    pub(crate) elapsed: Duration,
}

pub(crate) struct ActionResult {
    /// Account whose cached campaign list reflects the change.
    pub(crate) account: Option<AccountId>,
    pub(crate) campaigns: Vec<CampaignId>,
    pub(crate) result: Result<Ack, RemoteError>,
}

pub(crate) struct DashboardJobs {
    remote: Arc<dyn AdsRemote>,
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
}

impl DashboardJobs {
    pub(crate) fn new(remote: Arc<dyn AdsRemote>) -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel();
        Self {
            remote,
            message_tx,
            message_rx,
        }
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    /// Block until a job reports back or `timeout` elapses.
    pub(crate) fn recv_message_timeout(&self, timeout: Duration) -> Option<JobMessage> {
        match self.message_rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub(crate) fn begin_campaign_fetch(&self, ticket: FetchTicket<AccountId>) {
        let remote = Arc::clone(&self.remote);
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let result = remote.fetch_campaigns(&ticket.target);
            let _ = tx.send(JobMessage::CampaignsFetched(FetchResult {
                ticket,
                result,
                elapsed: started.elapsed(),
            }));
        });
    }

    pub(crate) fn begin_analysis_fetch(&self, ticket: FetchTicket<CampaignId>) {
        let remote = Arc::clone(&self.remote);
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let result = remote.fetch_analysis(&ticket.target);
            let _ = tx.send(JobMessage::AnalysisFetched(FetchResult {
                ticket,
                result,
                elapsed: started.elapsed(),
            }));
        });
    }

    pub(crate) fn begin_track(&self, account: AccountId, campaigns: Vec<CampaignId>) {
        let remote = Arc::clone(&self.remote);
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let result = remote.track_campaigns(&campaigns, &account);
            let _ = tx.send(JobMessage::Tracked(ActionResult {
                account: Some(account),
                campaigns,
                result,
            }));
        });
    }

    pub(crate) fn begin_stop(&self, account: Option<AccountId>, campaigns: Vec<CampaignId>) {
        let remote = Arc::clone(&self.remote);
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let result = remote.stop_tracking(&campaigns);
            let _ = tx.send(JobMessage::Stopped(ActionResult {
                account,
                campaigns,
                result,
            }));
        });
    }
}
