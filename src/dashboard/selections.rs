use super::*;

impl DashboardController {
    pub fn track_selection(&self) -> &BoundedSelectionSet<CampaignId> {
        &self.track_selection
    }

    pub fn stop_selection(&self) -> &BoundedSelectionSet<CampaignId> {
        &self.stop_selection
    }

    /// Toggle a campaign in the "start tracking" selection. Only listed, untracked campaigns
    /// can be added; a no-op when full.
    pub fn toggle_track_selection(&mut self, id: CampaignId) -> bool {
        if !self.track_selection.contains(&id) && !self.is_candidate(&id, false) {
            return false;
        }
        self.track_selection.toggle(id)
    }

    pub fn clear_track_selection(&mut self) {
        self.track_selection.clear();
    }

    /// Add untracked campaigns of the filtered view, in view order, until the selection is
    /// full. Returns how many were added.
    pub fn select_all_track_candidates(&mut self) -> usize {
        let candidates = self.candidates(false);
        self.track_selection.select_all_up_to(candidates)
    }

    /// Toggle a campaign in the "stop tracking" selection. Only listed, tracked campaigns can
    /// be added.
    pub fn toggle_stop_selection(&mut self, id: CampaignId) -> bool {
        if !self.stop_selection.contains(&id) && !self.is_candidate(&id, true) {
            return false;
        }
        self.stop_selection.toggle(id)
    }

    pub fn clear_stop_selection(&mut self) {
        self.stop_selection.clear();
    }

    /// Add tracked campaigns of the filtered view, in view order.
    pub fn select_all_stop_candidates(&mut self) -> usize {
        let candidates = self.candidates(true);
        self.stop_selection.select_all_up_to(candidates)
    }

    fn is_candidate(&self, id: &CampaignId, tracked: bool) -> bool {
        self.campaign_page
            .source()
            .iter()
            .any(|item| &item.id == id && item.tracking_enabled == tracked)
    }

    fn candidates(&self, tracked: bool) -> Vec<CampaignId> {
        self.campaign_page
            .filtered()
            .filter(|item| item.tracking_enabled == tracked)
            .map(|item| item.id.clone())
            .collect()
    }
}
