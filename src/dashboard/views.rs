use std::sync::Arc;

use super::*;

/// A tracked campaign with the overall score of its cached analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSummary {
    pub campaign: TrackableItem,
    pub overall_score: Option<f64>,
}

impl Scored for CampaignSummary {
    fn score(&self) -> Option<f64> {
        self.overall_score
    }
}

impl DashboardController {
    pub fn campaign_page(&self) -> &FilteredPage<TrackableItem> {
        &self.campaign_page
    }

    pub fn campaign_page_mut(&mut self) -> &mut FilteredPage<TrackableItem> {
        &mut self.campaign_page
    }

    pub fn interest_page(&self) -> &FilteredPage<Classified<AnalyzedInterest>> {
        &self.interest_page
    }

    pub fn interest_page_mut(&mut self) -> &mut FilteredPage<Classified<AnalyzedInterest>> {
        &mut self.interest_page
    }

    pub fn interest_scheme(&self) -> &BucketScheme {
        &self.interest_scheme
    }

    pub fn campaign_scheme(&self) -> &BucketScheme {
        &self.campaign_scheme
    }

    /// Interests of the current analysis grouped by performance bucket.
    pub fn interest_buckets(&self) -> BucketMap<AnalyzedInterest> {
        match self.analyses.current_payload() {
            Some(analysis) => self
                .interest_scheme
                .partition(analysis.interests.iter().cloned()),
            None => self.interest_scheme.empty_map(),
        }
    }

    /// Tracked campaigns of the current account grouped by their analysis overall score.
    ///
    /// Campaigns whose analysis was never loaded land in the no-data bucket.
    pub fn campaign_buckets(&self) -> BucketMap<CampaignSummary> {
        let Some(campaigns) = self.accounts.current_payload() else {
            return self.campaign_scheme.empty_map();
        };
        let summaries = campaigns
            .iter()
            .filter(|campaign| campaign.tracking_enabled)
            .map(|campaign| CampaignSummary {
                overall_score: self
                    .analyses
                    .cached(&campaign.id)
                    .and_then(|analysis| analysis.summary.overall_score),
                campaign: campaign.clone(),
            });
        self.campaign_scheme.partition(summaries)
    }

    pub fn set_campaign_filter(&mut self, filter: FilterState) -> bool {
        self.campaign_page.set_filter(filter)
    }

    pub fn set_interest_filter(&mut self, filter: FilterState) -> bool {
        self.interest_page.set_filter(filter)
    }

    pub fn set_campaign_search(&mut self, term: &str) -> bool {
        self.campaign_page
            .update_filter(|filter| filter.search_term = term.to_string())
    }

    pub fn set_campaign_status(&mut self, status: &str) -> bool {
        self.campaign_page
            .update_filter(|filter| filter.set_status(status))
    }

    pub fn set_campaign_objective(&mut self, objective: &str) -> bool {
        self.campaign_page
            .update_filter(|filter| filter.set_objective(objective))
    }

    pub fn set_interest_search(&mut self, term: &str) -> bool {
        self.interest_page
            .update_filter(|filter| filter.search_term = term.to_string())
    }

    /// Show only interests in `bucket`; `""` or `"all"` shows every bucket.
    pub fn set_interest_bucket(&mut self, bucket: &str) -> bool {
        self.interest_page
            .update_filter(|filter| filter.set_status(bucket))
    }

    /// Point the campaign page at the current account's cached list and drop selected ids
    /// that are no longer listed.
    pub(super) fn rebuild_campaign_view(&mut self) {
        let source = self
            .accounts
            .current_payload()
            .cloned()
            .unwrap_or_default();
        if !self.campaign_page.set_source(Arc::clone(&source)) {
            return;
        }
        let listed = |id: &CampaignId| source.iter().any(|item| &item.id == id);
        self.track_selection.retain(|id| listed(id));
        self.stop_selection.retain(|id| listed(id));
    }

    pub(super) fn rebuild_interest_view(&mut self) {
        let labeled = match self.analyses.current_payload() {
            Some(analysis) => self
                .interest_scheme
                .label_all(analysis.interests.iter().cloned()),
            None => Vec::new(),
        };
        self.interest_page.set_source(Arc::new(labeled));
    }
}
