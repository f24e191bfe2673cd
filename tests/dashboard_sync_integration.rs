mod support;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use adscope::config::{self, DashboardSettings};
use adscope::dashboard::{
    DashboardController, DashboardEvent, FilterState, OperationKind, PageResetPolicy, UiCells,
};
use adscope::model::{AccountId, CampaignId};
use adscope::remote::{AdsRemote, RemoteError, TokenStore};
use support::env::AdscopeEnvGuard;
use support::stub_remote::{GatedRemote, campaign};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn controller_with(remote: &Arc<GatedRemote>, settings: DashboardSettings) -> DashboardController {
    let remote: Arc<dyn AdsRemote> = remote.clone();
    DashboardController::new(settings, remote, UiCells::default()).expect("valid settings")
}

fn pump(
    controller: &mut DashboardController,
    now: Instant,
    done: impl Fn(&DashboardEvent) -> bool,
) -> Vec<DashboardEvent> {
    let give_up = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    loop {
        events.extend(controller.tick(now));
        if events.iter().any(&done) {
            return events;
        }
        assert!(Instant::now() < give_up, "timed out; events so far: {events:?}");
        thread::sleep(ms(2));
    }
}

fn campaigns_for(account: &str) -> impl Fn(&DashboardEvent) -> bool + '_ {
    move |event| {
        matches!(event, DashboardEvent::CampaignsUpdated { account: applied, .. }
            if applied.as_str() == account)
    }
}

fn visible_ids(controller: &DashboardController) -> Vec<String> {
    controller
        .campaign_page()
        .visible()
        .map(|item| item.id.to_string())
        .collect()
}

#[test]
fn late_response_for_superseded_account_is_discarded() {
    let remote = GatedRemote::new();
    remote.set_campaigns("acct1", vec![campaign("old", "From acct1", false)]);
    remote.set_campaigns("acct3", vec![campaign("c3", "From acct3", false)]);
    remote.hold("acct1");
    let mut controller = controller_with(&remote, DashboardSettings::default());
    let t0 = Instant::now();

    controller.select_account(AccountId::from("acct1"), t0);
    let issued = controller.tick(t0 + ms(300));
    assert_eq!(
        issued,
        vec![DashboardEvent::FetchIssued {
            kind: OperationKind::Fetching,
            target: "acct1".into()
        }]
    );

    controller.select_account(AccountId::from("acct2"), t0 + ms(400));
    controller.select_account(AccountId::from("acct3"), t0 + ms(550));
    assert!(controller.tick(t0 + ms(700)).is_empty());
    pump(&mut controller, t0 + ms(850), campaigns_for("acct3"));
    assert_eq!(visible_ids(&controller), vec!["c3"]);

    remote.release("acct1");
    let events = pump(&mut controller, t0 + ms(900), |event| {
        matches!(event, DashboardEvent::ResponseDiscarded { .. })
    });
    assert!(events.contains(&DashboardEvent::ResponseDiscarded {
        kind: OperationKind::Fetching,
        target: "acct1".into()
    }));
    assert_eq!(visible_ids(&controller), vec!["c3"]);
    assert!(controller.is_account_fresh(t0 + ms(1_000)));
    assert_eq!(remote.calls(), vec!["campaigns:acct1", "campaigns:acct3"]);

    // Nothing was cached for acct1, so switching back shows the empty state until it loads.
    controller.select_account(AccountId::from("acct1"), t0 + ms(1_000));
    assert_eq!(controller.campaign_page().total_items(), 0);
    assert!(!controller.is_account_fresh(t0 + ms(1_000)));
}

#[test]
fn returning_to_an_in_flight_account_reuses_its_fetch() {
    let remote = GatedRemote::new();
    remote.set_campaigns("acct1", vec![campaign("a1", "Alpha", false)]);
    remote.set_campaigns("acct2", vec![campaign("b1", "Beta", false)]);
    remote.hold("acct1");
    let mut controller = controller_with(&remote, DashboardSettings::default());
    let t0 = Instant::now();

    controller.select_account(AccountId::from("acct1"), t0);
    controller.tick(t0 + ms(300));
    controller.select_account(AccountId::from("acct2"), t0 + ms(400));
    pump(&mut controller, t0 + ms(700), campaigns_for("acct2"));

    controller.select_account(AccountId::from("acct1"), t0 + ms(800));
    assert!(controller.tick(t0 + ms(1_100)).is_empty());
    assert!(controller.is_in_flight(OperationKind::Fetching));

    remote.release("acct1");
    pump(&mut controller, t0 + ms(1_200), campaigns_for("acct1"));
    assert_eq!(visible_ids(&controller), vec!["a1"]);
    assert_eq!(remote.calls(), vec!["campaigns:acct1", "campaigns:acct2"]);
}

#[test]
fn stale_account_is_refetched_after_the_horizon() {
    let remote = GatedRemote::new();
    remote.set_campaigns("acct1", vec![campaign("a1", "Alpha", false)]);
    let mut controller = controller_with(&remote, DashboardSettings::default());
    let t0 = Instant::now();

    controller.select_account(AccountId::from("acct1"), t0);
    pump(&mut controller, t0 + ms(300), campaigns_for("acct1"));
    assert!(controller.is_account_fresh(t0 + Duration::from_secs(240)));
    assert!(!controller.is_account_fresh(t0 + Duration::from_secs(360)));

    let later = t0 + Duration::from_secs(400);
    remote.set_failure("acct1", RemoteError::Status {
        code: 503,
        body: "maintenance".into(),
    });
    controller.select_account(AccountId::from("acct1"), later);
    let events = pump(&mut controller, later + ms(300), |event| {
        matches!(event, DashboardEvent::OperationFailed { .. })
    });
    assert!(events.contains(&DashboardEvent::FetchIssued {
        kind: OperationKind::Fetching,
        target: "acct1".into()
    }));
    assert_eq!(controller.account_error(), Some("HTTP 503: maintenance"));
    assert_eq!(visible_ids(&controller), vec!["a1"]);
}

#[test]
fn track_and_stop_round_trip() {
    let remote = GatedRemote::new();
    remote.set_campaigns(
        "acct1",
        vec![
            campaign("c1", "Spring sale", false),
            campaign("c2", "Summer sale", false),
            campaign("c3", "Evergreen", true),
        ],
    );
    let mut controller = controller_with(&remote, DashboardSettings::default());
    let t0 = Instant::now();
    controller.select_account(AccountId::from("acct1"), t0);
    pump(&mut controller, t0 + ms(300), campaigns_for("acct1"));

    controller.set_campaign_search("sale");
    assert_eq!(controller.select_all_track_candidates(), 2);
    controller.track_selected().expect("tracking starts");
    pump(&mut controller, t0 + ms(400), |event| {
        matches!(event, DashboardEvent::Tracked { .. })
    });
    assert_eq!(controller.campaign_buckets().count("NoData"), 3);

    controller.stop_tracking(CampaignId::from("c3")).expect("stop starts");
    let events = pump(&mut controller, t0 + ms(500), |event| {
        matches!(event, DashboardEvent::TrackingStopped { .. })
    });
    assert!(events.contains(&DashboardEvent::TrackingStopped {
        campaigns: vec![CampaignId::from("c3")]
    }));
    assert_eq!(controller.campaign_buckets().total(), 2);
    assert_eq!(
        remote.calls(),
        vec!["campaigns:acct1", "track:c1,c2@acct1", "stop:c3"]
    );
}

#[test]
fn filter_changes_keep_the_page_in_range() {
    let remote = GatedRemote::new();
    let items = (0..50)
        .map(|idx| {
            let name = if idx % 4 == 0 {
                format!("Promo {idx}")
            } else {
                format!("Brand {idx}")
            };
            campaign(&format!("c{idx}"), &name, false)
        })
        .collect();
    remote.set_campaigns("acct1", items);
    let mut settings = DashboardSettings::default();
    settings.pages.campaigns_page_size = 8;
    let mut controller = controller_with(&remote, settings);
    let t0 = Instant::now();
    controller.select_account(AccountId::from("acct1"), t0);
    pump(&mut controller, t0 + ms(300), campaigns_for("acct1"));

    assert_eq!(controller.campaign_page().total_pages(), 7);
    assert_eq!(controller.campaign_page_mut().go_to_page(5), 5);
    controller.set_campaign_filter(FilterState::default().with_search("promo"));
    assert_eq!(controller.campaign_page().total_items(), 13);
    assert_eq!(controller.campaign_page().total_pages(), 2);
    assert_eq!(controller.campaign_page().current_page(), 2);
    assert_eq!(visible_ids(&controller).len(), 5);
}

#[test]
fn config_and_token_live_under_config_home() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let _env = AdscopeEnvGuard::set_config_home(temp.path().to_path_buf());
    let root = temp.path().join(".adscope");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(
        root.join("config.toml"),
        "last_visited_account = \"act_5\"\n\n[pages]\ncampaigns_page_size = 4\non_change = \"first\"\n",
    )
    .unwrap();

    let settings = config::load_or_default().expect("load config");
    assert_eq!(settings.pages.on_change, PageResetPolicy::ResetToFirst);
    let remote = GatedRemote::new();
    let controller = controller_with(&remote, settings);
    assert_eq!(controller.initial_account(), Some(AccountId::from("act_5")));
    assert_eq!(controller.campaign_page().page_size(), 4);

    let tokens = TokenStore::new().expect("token store");
    tokens.set("  secret-token  ").unwrap();
    assert_eq!(tokens.get().unwrap().as_deref(), Some("secret-token"));
    assert!(root.join("secrets").is_dir());
    tokens.delete();
    assert_eq!(tokens.get().unwrap(), None);
}
