use std::sync::Arc;
use std::sync::mpsc::TryRecvError;
use std::time::Instant;

use super::jobs::{ActionResult, FetchResult, JobMessage};
use super::*;

impl DashboardController {
    pub(super) fn poll_background_jobs(&mut self, now: Instant, events: &mut Vec<DashboardEvent>) {
        loop {
            let message = match self.jobs.try_recv_message() {
                Ok(message) => message,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            self.apply_job_message(message, now, events);
        }
    }

    pub(super) fn apply_job_message(
        &mut self,
        message: JobMessage,
        now: Instant,
        events: &mut Vec<DashboardEvent>,
    ) {
        match message {
            JobMessage::CampaignsFetched(message) => self.apply_campaigns(message, now, events),
            JobMessage::AnalysisFetched(message) => self.apply_analysis(message, now, events),
            JobMessage::Tracked(message) => self.apply_track_result(message, events),
            JobMessage::Stopped(message) => self.apply_stop_result(message, events),
        }
    }

    fn apply_campaigns(
        &mut self,
        message: FetchResult<AccountId, Vec<TrackableItem>>,
        now: Instant,
        events: &mut Vec<DashboardEvent>,
    ) {
        let FetchResult {
            ticket,
            result,
            elapsed,
        } = message;
        let count = result.as_ref().map_or(0, Vec::len);
        match self
            .accounts
            .complete(ticket.request, result.map(Arc::new), now)
        {
            SyncOutcome::Applied { target } => {
                tracing::info!("Loaded {count} campaigns for account {target} in {elapsed:?}");
                self.rebuild_campaign_view();
                events.push(DashboardEvent::CampaignsUpdated {
                    account: target,
                    count,
                });
            }
            SyncOutcome::Failed { target, message } => {
                tracing::warn!("Fetching campaigns for account {target} failed: {message}");
                events.push(DashboardEvent::OperationFailed {
                    kind: OperationKind::Fetching,
                    message,
                });
            }
            SyncOutcome::Discarded { target } => {
                events.push(DashboardEvent::ResponseDiscarded {
                    kind: OperationKind::Fetching,
                    target: target.to_string(),
                });
            }
            SyncOutcome::Unknown => {
                tracing::debug!(
                    "Ignoring campaign response for unknown request {}",
                    ticket.request
                );
            }
        }
    }

    fn apply_analysis(
        &mut self,
        message: FetchResult<CampaignId, AnalysisResult>,
        now: Instant,
        events: &mut Vec<DashboardEvent>,
    ) {
        let FetchResult {
            ticket,
            result,
            elapsed,
        } = message;
        let interests = result.as_ref().map_or(0, |analysis| analysis.interests.len());
        match self.analyses.complete(ticket.request, result, now) {
            SyncOutcome::Applied { target } => {
                tracing::info!(
                    "Loaded analysis for campaign {target} ({interests} interests) in {elapsed:?}"
                );
                self.rebuild_interest_view();
                events.push(DashboardEvent::AnalysisUpdated {
                    campaign: target,
                    interests,
                });
            }
            SyncOutcome::Failed { target, message } => {
                tracing::warn!("Analysis for campaign {target} failed: {message}");
                events.push(DashboardEvent::OperationFailed {
                    kind: OperationKind::Analyzing,
                    message,
                });
            }
            SyncOutcome::Discarded { target } => {
                events.push(DashboardEvent::ResponseDiscarded {
                    kind: OperationKind::Analyzing,
                    target: target.to_string(),
                });
            }
            SyncOutcome::Unknown => {
                tracing::debug!(
                    "Ignoring analysis response for unknown request {}",
                    ticket.request
                );
            }
        }
    }

    fn apply_track_result(&mut self, message: ActionResult, events: &mut Vec<DashboardEvent>) {
        self.flags.tracking = false;
        let ActionResult {
            account,
            campaigns,
            result,
        } = message;
        match result {
            Ok(ack) => {
                tracing::info!(
                    "Tracking started for {} campaigns{}",
                    campaigns.len(),
                    ack_suffix(ack.message.as_deref())
                );
                self.errors.clear(OperationKind::Tracking);
                self.set_tracking_flag(account.as_ref(), &campaigns, true);
                self.track_selection.remove_all(&campaigns);
                events.push(DashboardEvent::Tracked { campaigns });
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!("Tracking {} campaigns failed: {message}", campaigns.len());
                self.errors.record(OperationKind::Tracking, message.clone());
                events.push(DashboardEvent::OperationFailed {
                    kind: OperationKind::Tracking,
                    message,
                });
            }
        }
    }

    fn apply_stop_result(&mut self, message: ActionResult, events: &mut Vec<DashboardEvent>) {
        self.flags.stopping = false;
        let ActionResult {
            account,
            campaigns,
            result,
        } = message;
        match result {
            Ok(ack) => {
                tracing::info!(
                    "Tracking stopped for {} campaigns{}",
                    campaigns.len(),
                    ack_suffix(ack.message.as_deref())
                );
                self.errors.clear(OperationKind::Stopping);
                self.set_tracking_flag(account.as_ref(), &campaigns, false);
                self.stop_selection.remove_all(&campaigns);
                events.push(DashboardEvent::TrackingStopped { campaigns });
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!("Stopping {} campaigns failed: {message}", campaigns.len());
                self.errors.record(OperationKind::Stopping, message.clone());
                events.push(DashboardEvent::OperationFailed {
                    kind: OperationKind::Stopping,
                    message,
                });
            }
        }
    }

    /// Flip `tracking_enabled` on cached campaigns without touching the cache age.
    fn set_tracking_flag(&mut self, account: Option<&AccountId>, ids: &[CampaignId], value: bool) {
        let Some(account) = account else {
            return;
        };
        let updated = self.accounts.update_cached(account, |list| {
            for item in Arc::make_mut(list).iter_mut() {
                if ids.contains(&item.id) {
                    item.tracking_enabled = value;
                }
            }
        });
        if updated && self.accounts.current_target() == Some(account) {
            self.rebuild_campaign_view();
        }
    }
}

fn ack_suffix(message: Option<&str>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => format!(": {}", message.trim()),
        _ => String::new(),
    }
}
