use crate::dashboard::{BucketRule, BucketScheme};

pub(super) const MAX_DEBOUNCE_MS: u64 = 10_000;
pub(super) const MIN_STALENESS_HORIZON_SECS: u64 = 1;

pub(super) fn default_staleness_horizon_secs() -> u64 {
    300
}

pub(super) fn default_debounce_ms() -> u64 {
    300
}

pub(super) fn default_tracking_capacity() -> usize {
    3
}

pub(super) fn default_campaigns_page_size() -> usize {
    10
}

pub(super) fn default_interests_page_size() -> usize {
    8
}

pub(super) fn default_max_attempts() -> usize {
    3
}

pub(super) fn default_retry_base_delay_ms() -> u64 {
    250
}

pub(super) fn default_no_data() -> Option<String> {
    Some("NoData".to_string())
}

pub(super) fn default_interest_buckets() -> Vec<BucketRule> {
    BucketScheme::interest_default().rules().to_vec()
}

pub(super) fn default_campaign_buckets() -> Vec<BucketRule> {
    BucketScheme::campaign_default().rules().to_vec()
}

pub(super) fn clamp_debounce_ms(value: u64) -> u64 {
    value.min(MAX_DEBOUNCE_MS)
}

pub(super) fn clamp_at_least_one(value: usize) -> usize {
    value.max(1)
}
