use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::config::DashboardSettings;
use crate::model::{Ack, AnalysisSummary, CampaignStatus, SubScores};
use crate::remote::RemoteError;

#[derive(Default)]
struct StubRemote {
    campaigns: Mutex<HashMap<String, Result<Vec<TrackableItem>, RemoteError>>>,
    analyses: Mutex<HashMap<String, AnalysisResult>>,
    action_error: Mutex<Option<RemoteError>>,
    calls: Mutex<Vec<String>>,
}

impl StubRemote {
    fn with_account(self, account: &str, items: Vec<TrackableItem>) -> Self {
        self.set_account(account, Ok(items));
        self
    }

    fn set_account(&self, account: &str, result: Result<Vec<TrackableItem>, RemoteError>) {
        self.campaigns
            .lock()
            .unwrap()
            .insert(account.to_string(), result);
    }

    fn with_analysis(self, campaign: &str, scores: &[Option<f64>], overall: Option<f64>) -> Self {
        let interests = scores
            .iter()
            .enumerate()
            .map(|(idx, score)| interest(&format!("{campaign}-i{idx}"), *score))
            .collect();
        self.analyses.lock().unwrap().insert(
            campaign.to_string(),
            AnalysisResult {
                campaign_id: CampaignId::from(campaign),
                interests,
                summary: AnalysisSummary {
                    overall_score: overall,
                    analyzed_interests: scores.len(),
                    generated_at: None,
                },
            },
        );
        self
    }

    fn fail_actions(&self, error: Option<RemoteError>) {
        *self.action_error.lock().unwrap() = error;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn action_result(&self) -> Result<Ack, RemoteError> {
        match self.action_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(Ack::default()),
        }
    }
}

impl AdsRemote for StubRemote {
    fn fetch_campaigns(&self, account: &AccountId) -> Result<Vec<TrackableItem>, RemoteError> {
        self.record(format!("campaigns:{account}"));
        self.campaigns
            .lock()
            .unwrap()
            .get(account.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn fetch_analysis(&self, campaign: &CampaignId) -> Result<AnalysisResult, RemoteError> {
        self.record(format!("analysis:{campaign}"));
        self.analyses
            .lock()
            .unwrap()
            .get(campaign.as_str())
            .cloned()
            .ok_or(RemoteError::Status {
                code: 404,
                body: "no analysis".into(),
            })
    }

    fn track_campaigns(
        &self,
        campaigns: &[CampaignId],
        account: &AccountId,
    ) -> Result<Ack, RemoteError> {
        let ids: Vec<&str> = campaigns.iter().map(CampaignId::as_str).collect();
        self.record(format!("track:{}@{account}", ids.join(",")));
        self.action_result()
    }

    fn stop_tracking(&self, campaigns: &[CampaignId]) -> Result<Ack, RemoteError> {
        let ids: Vec<&str> = campaigns.iter().map(CampaignId::as_str).collect();
        self.record(format!("stop:{}", ids.join(",")));
        self.action_result()
    }
}

fn item(id: &str, tracked: bool) -> TrackableItem {
    TrackableItem {
        id: CampaignId::from(id),
        name: format!("Campaign {id}"),
        status: CampaignStatus::Active,
        objective: "conversions".into(),
        daily_budget: Some(5_000),
        tracking_enabled: tracked,
        last_synced_at: None,
    }
}

fn interest(id: &str, score: Option<f64>) -> AnalyzedInterest {
    AnalyzedInterest {
        interest_id: id.to_string(),
        interest_name: format!("Interest {id}"),
        adset_id: "adset-1".into(),
        performance_score: score,
        sub_scores: SubScores::default(),
        prediction_confidence: 70.0,
        cross_adset_appearances: 1,
        recommendations: Vec::new(),
    }
}

fn controller(remote: &Arc<StubRemote>) -> DashboardController {
    let remote: Arc<dyn AdsRemote> = remote.clone();
    DashboardController::new(DashboardSettings::default(), remote, UiCells::default()).unwrap()
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Tick at `now` until `done` accepts the collected events.
fn pump(
    controller: &mut DashboardController,
    now: Instant,
    done: impl Fn(&[DashboardEvent]) -> bool,
) -> Vec<DashboardEvent> {
    let give_up = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    loop {
        events.extend(controller.tick(now));
        if done(&events) {
            return events;
        }
        assert!(Instant::now() < give_up, "timed out; events so far: {events:?}");
        thread::sleep(ms(2));
    }
}

fn has_campaigns_update(events: &[DashboardEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, DashboardEvent::CampaignsUpdated { .. }))
}

fn loaded(remote: &Arc<StubRemote>, account: &str, t0: Instant) -> DashboardController {
    let mut controller = controller(remote);
    controller.select_account(AccountId::from(account), t0);
    pump(&mut controller, t0 + ms(300), has_campaigns_update);
    controller
}

fn tracking_flags(controller: &DashboardController) -> Vec<(String, bool)> {
    controller
        .current_campaigns()
        .unwrap_or_default()
        .iter()
        .map(|item| (item.id.to_string(), item.tracking_enabled))
        .collect()
}

#[test]
fn account_selection_is_debounced_then_displayed() {
    let remote = Arc::new(StubRemote::default().with_account(
        "acct1",
        vec![item("c1", false), item("c2", false), item("c3", true)],
    ));
    let mut controller = controller(&remote);
    let t0 = Instant::now();
    controller.select_account(AccountId::from("acct1"), t0);
    assert_eq!(controller.current_account(), Some(&AccountId::from("acct1")));
    assert!(controller.tick(t0 + ms(100)).is_empty());
    assert_eq!(controller.next_deadline(), Some(t0 + ms(300)));

    let events = pump(&mut controller, t0 + ms(300), has_campaigns_update);
    assert!(events.contains(&DashboardEvent::FetchIssued {
        kind: OperationKind::Fetching,
        target: "acct1".into()
    }));
    assert_eq!(controller.campaign_page().total_items(), 3);
    assert!(controller.is_account_fresh(t0 + ms(1_000)));
    assert!(!controller.is_in_flight(OperationKind::Fetching));
    assert_eq!(remote.calls(), vec!["campaigns:acct1"]);
}

#[test]
fn revisiting_fresh_account_shows_cache_without_fetch() {
    let remote = Arc::new(
        StubRemote::default()
            .with_account("acct1", vec![item("c1", false), item("c2", false)])
            .with_account("acct2", vec![item("c9", false)]),
    );
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);

    controller.select_account(AccountId::from("acct2"), t0 + ms(1_000));
    assert_eq!(controller.campaign_page().total_items(), 0);
    controller.select_account(AccountId::from("acct1"), t0 + ms(1_100));
    assert_eq!(controller.campaign_page().total_items(), 2);

    let events = controller.tick(t0 + ms(1_400));
    assert!(events.is_empty());
    assert_eq!(remote.calls(), vec!["campaigns:acct1"]);
}

#[test]
fn failed_refresh_keeps_stale_campaigns_visible() {
    let remote = Arc::new(
        StubRemote::default().with_account("acct1", vec![item("c1", false), item("c2", false)]),
    );
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    remote.set_account("acct1", Err(RemoteError::Transport("connection reset".into())));

    controller.refresh_account(t0 + ms(500)).unwrap();
    assert_eq!(
        controller.refresh_account(t0 + ms(510)),
        Err(ActionError::AlreadyInFlight(OperationKind::Fetching))
    );
    let events = pump(&mut controller, t0 + ms(600), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::OperationFailed { .. }))
    });
    assert!(matches!(
        &events[0],
        DashboardEvent::OperationFailed {
            kind: OperationKind::Fetching,
            ..
        }
    ));
    assert_eq!(
        controller.account_error(),
        Some("HTTP error: connection reset")
    );
    assert_eq!(controller.campaign_page().total_items(), 2);
}

#[test]
fn tracking_updates_cache_in_place_and_consumes_selection() {
    let remote = Arc::new(StubRemote::default().with_account(
        "acct1",
        vec![item("c1", false), item("c2", false), item("c3", true)],
    ));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    let fetched_at = controller
        .accounts
        .cache()
        .entry(&AccountId::from("acct1"))
        .unwrap()
        .fetched_at;

    controller.toggle_track_selection(CampaignId::from("c1"));
    controller.toggle_track_selection(CampaignId::from("c2"));
    controller.track_selected().unwrap();
    assert!(controller.is_in_flight(OperationKind::Tracking));
    assert_eq!(
        controller.track_selected(),
        Err(ActionError::AlreadyInFlight(OperationKind::Tracking))
    );

    pump(&mut controller, t0 + ms(400), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::Tracked { .. }))
    });
    assert!(!controller.is_in_flight(OperationKind::Tracking));
    assert!(controller.track_selection().is_empty());
    assert_eq!(
        tracking_flags(&controller),
        vec![
            ("c1".to_string(), true),
            ("c2".to_string(), true),
            ("c3".to_string(), true)
        ]
    );
    let entry = controller
        .accounts
        .cache()
        .entry(&AccountId::from("acct1"))
        .unwrap();
    assert_eq!(entry.fetched_at, fetched_at);
    assert_eq!(remote.calls().last().unwrap(), "track:c1,c2@acct1");
}

#[test]
fn failed_tracking_leaves_selection_and_cache_alone() {
    let remote =
        Arc::new(StubRemote::default().with_account("acct1", vec![item("c1", false)]));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    remote.fail_actions(Some(RemoteError::RateLimited));

    controller.toggle_track_selection(CampaignId::from("c1"));
    controller.track_selected().unwrap();
    pump(&mut controller, t0 + ms(400), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::OperationFailed { .. }))
    });
    assert_eq!(controller.track_selection().len(), 1);
    assert_eq!(tracking_flags(&controller), vec![("c1".to_string(), false)]);
    assert_eq!(
        controller.operation_error(OperationKind::Tracking),
        Some("Rate limited; try again later")
    );
    assert_eq!(controller.operation_error(OperationKind::Stopping), None);
}

#[test]
fn bulk_stop_goes_through_confirmation_modal() {
    let remote = Arc::new(StubRemote::default().with_account(
        "acct1",
        vec![item("c1", true), item("c2", false), item("c3", true)],
    ));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);

    assert_eq!(
        controller.request_bulk_stop(),
        Err(ActionError::NothingSelected)
    );
    assert_eq!(controller.select_all_stop_candidates(), 2);
    controller.request_bulk_stop().unwrap();
    assert_eq!(
        controller.cells().modal.get(),
        &Some(ModalKind::ConfirmStopTracking { count: 2 })
    );

    controller.confirm_modal().unwrap();
    assert_eq!(controller.cells().modal.get(), &None);
    pump(&mut controller, t0 + ms(400), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::TrackingStopped { .. }))
    });
    assert!(controller.stop_selection().is_empty());
    assert_eq!(
        tracking_flags(&controller),
        vec![
            ("c1".to_string(), false),
            ("c2".to_string(), false),
            ("c3".to_string(), false)
        ]
    );
    assert_eq!(remote.calls().last().unwrap(), "stop:c1,c3");
}

#[test]
fn dismissing_modal_sends_nothing() {
    let remote = Arc::new(StubRemote::default().with_account("acct1", vec![item("c1", true)]));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    controller.toggle_stop_selection(CampaignId::from("c1"));
    controller.request_bulk_stop().unwrap();
    controller.dismiss_modal();
    assert_eq!(controller.cells().modal.get(), &None);
    assert_eq!(controller.cells().modal.version(), 2);
    assert_eq!(controller.stop_selection().len(), 1);
    assert!(!controller.is_in_flight(OperationKind::Stopping));
    assert_eq!(remote.calls(), vec!["campaigns:acct1"]);
}

#[test]
fn refused_confirmation_keeps_modal_open() {
    let remote = Arc::new(
        StubRemote::default().with_account("acct1", vec![item("c1", true), item("c2", true)]),
    );
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    controller.toggle_stop_selection(CampaignId::from("c1"));
    controller.request_bulk_stop().unwrap();
    controller.stop_tracking(CampaignId::from("c2")).unwrap();

    assert_eq!(
        controller.confirm_modal(),
        Err(ActionError::AlreadyInFlight(OperationKind::Stopping))
    );
    assert_eq!(
        controller.cells().modal.get(),
        &Some(ModalKind::ConfirmStopTracking { count: 1 })
    );
    assert_eq!(controller.stop_selection().len(), 1);

    pump(&mut controller, t0 + ms(400), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::TrackingStopped { .. }))
    });
    controller.confirm_modal().unwrap();
    assert_eq!(controller.cells().modal.get(), &None);
}

#[test]
fn select_all_respects_capacity_and_view_order() {
    let items = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|id| item(id, false))
        .collect();
    let remote = Arc::new(StubRemote::default().with_account("acct1", items));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);

    assert_eq!(controller.select_all_track_candidates(), 3);
    let selected: Vec<&str> = controller
        .track_selection()
        .iter()
        .map(CampaignId::as_str)
        .collect();
    assert_eq!(selected, vec!["a", "b", "c"]);
    assert!(controller.track_selection().is_full());
    assert!(!controller.toggle_track_selection(CampaignId::from("d")));

    controller.clear_track_selection();
    controller.set_campaign_search("Campaign e");
    assert_eq!(controller.select_all_track_candidates(), 1);
    assert!(controller.track_selection().contains(&CampaignId::from("e")));
}

#[test]
fn toggles_only_admit_eligible_campaigns() {
    let remote = Arc::new(StubRemote::default().with_account(
        "acct1",
        vec![item("a", true), item("b", false), item("c", false), item("d", false)],
    ));
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);

    assert!(!controller.toggle_track_selection(CampaignId::from("a")));
    assert!(!controller.toggle_track_selection(CampaignId::from("zzz")));
    assert!(controller.track_selection().is_empty());
    assert_eq!(controller.track_selection().remaining(), Some(3));
    assert_eq!(controller.select_all_track_candidates(), 3);
    assert!(!controller.track_selection().contains(&CampaignId::from("a")));

    assert!(!controller.toggle_stop_selection(CampaignId::from("b")));
    assert!(controller.toggle_stop_selection(CampaignId::from("a")));
    assert!(controller.toggle_track_selection(CampaignId::from("b")));
    assert!(!controller.track_selection().contains(&CampaignId::from("b")));
    assert!(controller.stop_selection().contains(&CampaignId::from("a")));
}

#[test]
fn vanished_campaigns_are_pruned_from_selections() {
    let remote = Arc::new(
        StubRemote::default().with_account("acct1", vec![item("c1", false), item("c2", true)]),
    );
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    controller.toggle_track_selection(CampaignId::from("c1"));
    controller.toggle_stop_selection(CampaignId::from("c2"));

    remote.set_account("acct1", Ok(vec![item("c2", true)]));
    controller.refresh_account(t0 + ms(500)).unwrap();
    pump(&mut controller, t0 + ms(600), has_campaigns_update);

    assert!(controller.track_selection().is_empty());
    assert_eq!(controller.stop_selection().len(), 1);
}

#[test]
fn analysis_is_classified_into_interest_buckets() {
    let remote = Arc::new(StubRemote::default().with_analysis(
        "c1",
        &[Some(91.0), Some(65.0), Some(64.0), Some(10.0), None],
        Some(78.0),
    ));
    let mut controller = controller(&remote);
    let t0 = Instant::now();
    controller.select_campaign(CampaignId::from("c1"), t0);
    pump(&mut controller, t0 + ms(300), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::AnalysisUpdated { .. }))
    });

    let buckets = controller.interest_buckets();
    assert_eq!(
        buckets.counts(),
        vec![
            ("Excellent", 1),
            ("Good", 2),
            ("Average", 0),
            ("Poor", 1),
            ("NoData", 1)
        ]
    );
    assert_eq!(buckets.total(), 5);

    assert!(controller.set_interest_bucket("Good"));
    let visible: Vec<&str> = controller
        .interest_page()
        .visible()
        .map(|row| row.record.interest_id.as_str())
        .collect();
    assert_eq!(visible, vec!["c1-i1", "c1-i2"]);
    assert!(controller.set_interest_bucket("all"));
    assert_eq!(controller.interest_page().total_items(), 5);
}

#[test]
fn campaign_buckets_use_cached_overall_scores() {
    let remote = Arc::new(
        StubRemote::default()
            .with_account(
                "acct1",
                vec![item("c1", true), item("c2", true), item("c3", false)],
            )
            .with_analysis("c1", &[Some(90.0)], Some(92.0)),
    );
    let t0 = Instant::now();
    let mut controller = loaded(&remote, "acct1", t0);
    controller.select_campaign(CampaignId::from("c1"), t0 + ms(400));
    pump(&mut controller, t0 + ms(700), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::AnalysisUpdated { .. }))
    });

    let buckets = controller.campaign_buckets();
    assert_eq!(buckets.count("Top"), 1);
    assert_eq!(buckets.count("NoData"), 1);
    assert_eq!(buckets.count("Underperforming"), 0);
    assert_eq!(buckets.total(), 2);
    assert_eq!(buckets.names().count(), 6);
}

#[test]
fn analysis_failure_is_scoped_to_the_campaign() {
    let remote = Arc::new(StubRemote::default().with_analysis("c1", &[Some(50.0)], None));
    let mut controller = controller(&remote);
    let t0 = Instant::now();
    controller.select_campaign(CampaignId::from("c2"), t0);
    pump(&mut controller, t0 + ms(300), |events| {
        events
            .iter()
            .any(|event| matches!(event, DashboardEvent::OperationFailed { .. }))
    });
    assert_eq!(controller.analysis_error(), Some("HTTP 404: no analysis"));
    assert_eq!(controller.account_error(), None);

    controller.select_campaign(CampaignId::from("c1"), t0 + ms(400));
    assert_eq!(controller.analysis_error(), None);
    assert_eq!(controller.interest_page().total_items(), 0);
}

#[test]
fn actions_need_an_account_and_a_selection() {
    let remote = Arc::new(StubRemote::default());
    let mut controller = controller(&remote);
    assert_eq!(controller.track_selected(), Err(ActionError::NoAccount));
    assert_eq!(
        controller.refresh_account(Instant::now()),
        Err(ActionError::NoAccount)
    );
    assert_eq!(
        controller.refresh_analysis(Instant::now()),
        Err(ActionError::NoCampaign)
    );
    controller.select_account(AccountId::from("acct1"), Instant::now());
    assert_eq!(controller.track_selected(), Err(ActionError::NothingSelected));
    assert_eq!(controller.stop_selected(), Err(ActionError::NothingSelected));
}

#[test]
fn invalid_thresholds_are_rejected_at_construction() {
    let mut settings = DashboardSettings::default();
    settings.classification.interests.buckets.clear();
    let remote: Arc<dyn AdsRemote> = Arc::new(StubRemote::default());
    let result = DashboardController::new(settings, remote, UiCells::default());
    assert!(matches!(
        result,
        Err(crate::config::ConfigError::Scheme {
            section: "interests",
            source: SchemeError::Empty
        })
    ));
}

#[test]
fn last_visited_account_seeds_and_follows_selection() {
    let mut settings = DashboardSettings::default();
    settings.last_visited_account = Some("act_9".into());
    let remote: Arc<dyn AdsRemote> = Arc::new(StubRemote::default());
    let mut controller = DashboardController::new(settings, remote, UiCells::default()).unwrap();
    assert_eq!(controller.initial_account(), Some(AccountId::from("act_9")));
    controller.select_account(AccountId::from("act_10"), Instant::now());
    assert_eq!(
        controller.settings().last_visited_account.as_deref(),
        Some("act_10")
    );
}
