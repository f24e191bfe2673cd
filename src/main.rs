#![deny(missing_docs)]

//! Headless entry point: loads one account's campaigns and prints the dashboard views.
use std::sync::Arc;
use std::time::{Duration, Instant};

use adscope::config::{self, DashboardSettings};
use adscope::dashboard::{DashboardController, DashboardEvent, UiCells};
use adscope::logging::{self, LogOptions};
use adscope::model::{AccountId, CampaignId};
use adscope::remote::{AdsRemote, HttpAdsRemote, TokenStore};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init(LogOptions { stdout: false }) {
        eprintln!("Logging disabled: {err}");
    }

    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    let tokens = TokenStore::new().map_err(|err| err.to_string())?;
    if let Some(token) = &options.set_token {
        tokens.set(token).map_err(|err| err.to_string())?;
        println!("Token saved.");
    }
    let base_url = settings
        .remote
        .base_url
        .clone()
        .ok_or_else(|| "Set [remote] base_url in the config file first".to_string())?;
    let token = tokens.get().map_err(|err| err.to_string())?;
    let remote: Arc<dyn AdsRemote> = Arc::new(
        HttpAdsRemote::new(&base_url, token, &settings.remote).map_err(|err| err.to_string())?,
    );

    let mut controller = DashboardController::new(settings, remote, UiCells::default())
        .map_err(|err| err.to_string())?;
    let account = options
        .account
        .clone()
        .map(AccountId::from_string)
        .or_else(|| controller.initial_account())
        .ok_or_else(|| "No account given and none remembered; pass --account".to_string())?;

    let now = Instant::now();
    controller.select_account(account, now);
    if let Some(campaign) = &options.campaign {
        controller.select_campaign(CampaignId::from(campaign.as_str()), now);
    }
    if let Some(term) = &options.search {
        controller.set_campaign_search(term);
    }
    settle(&mut controller)?;
    if let Some(page) = options.page {
        controller.campaign_page_mut().go_to_page(page);
    }

    print_campaigns(&controller);
    if options.campaign.is_some() {
        print_interests(&controller);
    }
    save_last_account(controller.settings())
}

/// Drive the controller until no debounce timer or fetch is outstanding.
fn settle(controller: &mut DashboardController) -> Result<(), String> {
    let give_up = Instant::now() + SETTLE_TIMEOUT;
    while controller.has_pending_work() {
        if Instant::now() >= give_up {
            return Err("Timed out waiting for the dashboard backend".to_string());
        }
        for event in controller.wait_for_activity(Duration::from_millis(250)) {
            if let DashboardEvent::OperationFailed { kind, message } = event {
                eprintln!("Failed while {kind}: {message}");
            }
        }
    }
    Ok(())
}

fn print_campaigns(controller: &DashboardController) {
    let page = controller.campaign_page();
    println!(
        "Campaigns (page {}/{}, {} of {} shown):",
        page.current_page(),
        page.total_pages(),
        page.total_items(),
        page.source_len()
    );
    for item in page.visible() {
        println!(
            "  {:<20} {:<32} {:<9} {:<16} {}",
            item.id,
            item.name,
            item.status,
            item.objective,
            if item.tracking_enabled { "tracked" } else { "" }
        );
    }
    print_counts("Tracked campaigns", controller.campaign_buckets().counts());
}

fn print_interests(controller: &DashboardController) {
    let page = controller.interest_page();
    println!("Interests ({} total):", page.total_items());
    for row in page.visible() {
        let score = row
            .record
            .performance_score
            .map_or_else(|| "-".to_string(), |score| format!("{score:.1}"));
        println!(
            "  {:<32} {:>6} {}",
            row.record.interest_name, score, row.bucket
        );
    }
    print_counts("Interest buckets", controller.interest_buckets().counts());
}

fn print_counts(title: &str, counts: Vec<(&str, usize)>) {
    let line = counts
        .iter()
        .map(|(name, count)| format!("{name}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("{title}: {line}");
}

fn save_last_account(settings: &DashboardSettings) -> Result<(), String> {
    let mut stored = config::load_or_default().map_err(|err| err.to_string())?;
    if stored.last_visited_account == settings.last_visited_account {
        return Ok(());
    }
    stored.last_visited_account = settings.last_visited_account.clone();
    config::save(&stored).map_err(|err| err.to_string())
}

#[derive(Default)]
struct Options {
    account: Option<String>,
    campaign: Option<String>,
    search: Option<String>,
    page: Option<usize>,
    set_token: Option<String>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--account" | "--campaign" | "--search" | "--page" | "--set-token" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| format!("{flag} requires a value"))?
                    .to_string();
                match flag {
                    "--account" => options.account = Some(value),
                    "--campaign" => options.campaign = Some(value),
                    "--search" => options.search = Some(value),
                    "--page" => {
                        let page = value
                            .parse::<usize>()
                            .map_err(|_| format!("--page expects a number, got `{value}`"))?;
                        options.page = Some(page);
                    }
                    _ => options.set_token = Some(value),
                }
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> &'static str {
    "Usage: adscope [--account ID] [--campaign ID] [--search TERM] [--page N] [--set-token TOKEN]

Loads the campaigns of an ad account and prints the current page and bucket counts.

  --account ID       Ad account to open (defaults to the last visited one)
  --campaign ID      Also load and classify this campaign's interest analysis
  --search TERM      Filter campaigns by name, id or objective
  --page N           Campaign page to print (clamped into range)
  --set-token TOKEN  Store the platform token before loading"
}
