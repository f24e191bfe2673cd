//! Dashboard core: caching, debounced synchronization, classification and paging of
//! campaign and interest data, coordinated by `DashboardController`.
//!
//! The controller is the only owner of mutable dashboard state. It is driven by the embedding
//! UI: user events call its methods, and the event loop calls `tick` regularly (or
//! `wait_for_activity` when it has nothing else to do). Remote calls run on worker threads and
//! are applied during `tick`.

mod actions;
mod background_jobs;
pub mod cache;
pub mod cells;
pub mod classify;
pub mod filter;
mod jobs;
pub mod page;
mod selections;
pub mod state;
pub mod sync;
mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use cache::{CacheEntry, StalenessCache};
pub use cells::{ModalKind, Theme, UiCell, UiCells};
pub use classify::{Bucket, BucketMap, BucketRule, BucketScheme, Classified, SchemeError, Scored};
pub use filter::{FilterState, Filterable, SearchMode};
pub use page::{FilteredPage, PageResetPolicy, PageState};
pub use state::{ActionError, DashboardEvent, OperationErrors, OperationKind};
pub use sync::{DebouncedSynchronizer, FetchTicket, SyncOutcome, SyncPhase, SyncSettings};
pub use views::CampaignSummary;

use crate::config::{ConfigError, DashboardSettings};
use crate::model::{AccountId, AnalysisResult, AnalyzedInterest, CampaignId, TrackableItem};
use crate::remote::AdsRemote;
use crate::selection::BoundedSelectionSet;
use jobs::DashboardJobs;
use state::ActionFlags;

/// Campaign lists are shared with the campaign page without copying.
type CampaignList = Arc<Vec<TrackableItem>>;

pub struct DashboardController {
    settings: DashboardSettings,
    cells: UiCells,
    jobs: DashboardJobs,
    accounts: DebouncedSynchronizer<AccountId, CampaignList>,
    analyses: DebouncedSynchronizer<CampaignId, AnalysisResult>,
    track_selection: BoundedSelectionSet<CampaignId>,
    stop_selection: BoundedSelectionSet<CampaignId>,
    campaign_page: FilteredPage<TrackableItem>,
    interest_page: FilteredPage<Classified<AnalyzedInterest>>,
    interest_scheme: BucketScheme,
    campaign_scheme: BucketScheme,
    flags: ActionFlags,
    errors: OperationErrors,
}

impl DashboardController {
    /// Build a controller from loaded settings.
    ///
    /// Fails when the configured bucket thresholds do not form a valid scheme.
    pub fn new(
        settings: DashboardSettings,
        remote: Arc<dyn AdsRemote>,
        cells: UiCells,
    ) -> Result<Self, ConfigError> {
        let settings = settings.normalized();
        let interest_scheme = settings.interest_scheme()?;
        let campaign_scheme = settings.campaign_scheme()?;
        let policy = settings.pages.on_change;
        Ok(Self {
            accounts: DebouncedSynchronizer::new(settings.sync.account_sync()),
            analyses: DebouncedSynchronizer::new(settings.sync.analysis_sync()),
            track_selection: BoundedSelectionSet::bounded(settings.selection.tracking_capacity),
            stop_selection: BoundedSelectionSet::with_capacity_limit(
                settings.selection.stop_capacity,
            ),
            campaign_page: FilteredPage::new(settings.pages.campaigns_page_size, policy),
            interest_page: FilteredPage::new(settings.pages.interests_page_size, policy),
            interest_scheme,
            campaign_scheme,
            jobs: DashboardJobs::new(remote),
            flags: ActionFlags::default(),
            errors: OperationErrors::default(),
            settings,
            cells,
        })
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn cells(&self) -> &UiCells {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut UiCells {
        &mut self.cells
    }

    /// Account remembered from the previous session, if any.
    pub fn initial_account(&self) -> Option<AccountId> {
        self.settings
            .last_visited_account
            .as_deref()
            .map(AccountId::from)
    }

    /// Switch to `account`. Cached campaigns for it, fresh or stale, show immediately; a
    /// fetch follows once selections have been quiet for the debounce period.
    pub fn select_account(&mut self, account: AccountId, now: Instant) {
        self.accounts.select(account, now);
        self.settings.last_visited_account =
            self.accounts.current_target().map(|id| id.to_string());
        self.rebuild_campaign_view();
    }

    /// Switch the analysis view to `campaign`, debounced like account switches.
    pub fn select_campaign(&mut self, campaign: CampaignId, now: Instant) {
        self.analyses.select(campaign, now);
        self.rebuild_interest_view();
    }

    /// Refetch the current account's campaigns now, ignoring freshness.
    pub fn refresh_account(&mut self, now: Instant) -> Result<(), ActionError> {
        if self.accounts.current_target().is_none() {
            return Err(ActionError::NoAccount);
        }
        let ticket = self
            .accounts
            .refresh(now)
            .ok_or(ActionError::AlreadyInFlight(OperationKind::Fetching))?;
        tracing::info!("Refreshing campaigns for account {}", ticket.target);
        self.jobs.begin_campaign_fetch(ticket);
        Ok(())
    }

    /// Refetch the current campaign's analysis now, ignoring freshness.
    pub fn refresh_analysis(&mut self, now: Instant) -> Result<(), ActionError> {
        if self.analyses.current_target().is_none() {
            return Err(ActionError::NoCampaign);
        }
        let ticket = self
            .analyses
            .refresh(now)
            .ok_or(ActionError::AlreadyInFlight(OperationKind::Analyzing))?;
        tracing::info!("Refreshing analysis for campaign {}", ticket.target);
        self.jobs.begin_analysis_fetch(ticket);
        Ok(())
    }

    /// Fire due debounce timers, then apply every job result that has arrived.
    pub fn tick(&mut self, now: Instant) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        if let Some(ticket) = self.accounts.poll(now) {
            events.push(DashboardEvent::FetchIssued {
                kind: OperationKind::Fetching,
                target: ticket.target.to_string(),
            });
            self.jobs.begin_campaign_fetch(ticket);
        }
        if let Some(ticket) = self.analyses.poll(now) {
            events.push(DashboardEvent::FetchIssued {
                kind: OperationKind::Analyzing,
                target: ticket.target.to_string(),
            });
            self.jobs.begin_analysis_fetch(ticket);
        }
        self.poll_background_jobs(now, &mut events);
        events
    }

    /// Sleep until a job reports back, the next debounce deadline passes, or `timeout`
    /// elapses, then `tick`.
    pub fn wait_for_activity(&mut self, timeout: Duration) -> Vec<DashboardEvent> {
        let now = Instant::now();
        let budget = self
            .next_deadline()
            .map_or(timeout, |deadline| {
                deadline.saturating_duration_since(now).min(timeout)
            });
        let mut events = Vec::new();
        if let Some(message) = self.jobs.recv_message_timeout(budget) {
            self.apply_job_message(message, Instant::now(), &mut events);
        }
        events.extend(self.tick(Instant::now()));
        events
    }

    /// Earliest pending debounce deadline across both target streams.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.accounts.next_deadline(), self.analyses.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_in_flight(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Fetching => self.accounts.is_fetching(),
            OperationKind::Analyzing => self.analyses.is_fetching(),
            OperationKind::Tracking | OperationKind::Stopping => self.flags.get(kind),
        }
    }

    /// Whether any fetch or action is still outstanding, including superseded fetches.
    pub fn has_pending_work(&self) -> bool {
        self.accounts.in_flight_len() > 0
            || self.analyses.in_flight_len() > 0
            || self.flags.tracking
            || self.flags.stopping
            || self.next_deadline().is_some()
    }

    pub fn current_account(&self) -> Option<&AccountId> {
        self.accounts.current_target()
    }

    pub fn current_campaign(&self) -> Option<&CampaignId> {
        self.analyses.current_target()
    }

    pub fn is_account_fresh(&self, now: Instant) -> bool {
        self.accounts.is_current_fresh(now)
    }

    pub fn is_analysis_fresh(&self, now: Instant) -> bool {
        self.analyses.is_current_fresh(now)
    }

    /// Cached campaign list of the current account, fresh or stale.
    pub fn current_campaigns(&self) -> Option<&[TrackableItem]> {
        self.accounts.current_payload().map(|list| list.as_slice())
    }

    pub fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.analyses.current_payload()
    }

    /// Failure of the last campaign fetch for the current account.
    pub fn account_error(&self) -> Option<&str> {
        self.accounts.current_failure()
    }

    /// Failure of the last analysis fetch for the current campaign.
    pub fn analysis_error(&self) -> Option<&str> {
        self.analyses.current_failure()
    }

    pub fn operation_error(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Fetching => self.account_error(),
            OperationKind::Analyzing => self.analysis_error(),
            OperationKind::Tracking | OperationKind::Stopping => self.errors.get(kind),
        }
    }
}
