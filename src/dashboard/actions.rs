use super::*;

impl DashboardController {
    /// Start tracking the selected campaigns for the current account.
    pub fn track_selected(&mut self) -> Result<(), ActionError> {
        self.ensure_idle(OperationKind::Tracking)?;
        let account = self
            .accounts
            .current_target()
            .cloned()
            .ok_or(ActionError::NoAccount)?;
        if self.track_selection.is_empty() {
            return Err(ActionError::NothingSelected);
        }
        let campaigns = self.track_selection.as_slice().to_vec();
        tracing::info!(
            "Tracking {} campaigns for account {account}",
            campaigns.len()
        );
        self.begin_action(OperationKind::Tracking);
        self.jobs.begin_track(account, campaigns);
        Ok(())
    }

    /// Stop tracking a single campaign.
    pub fn stop_tracking(&mut self, id: CampaignId) -> Result<(), ActionError> {
        self.begin_stop(vec![id])
    }

    /// Stop tracking every campaign in the stop selection.
    pub fn stop_selected(&mut self) -> Result<(), ActionError> {
        if self.stop_selection.is_empty() {
            return Err(ActionError::NothingSelected);
        }
        self.begin_stop(self.stop_selection.as_slice().to_vec())
    }

    /// Ask for confirmation before stopping the selected campaigns.
    pub fn request_bulk_stop(&mut self) -> Result<(), ActionError> {
        self.ensure_idle(OperationKind::Stopping)?;
        if self.stop_selection.is_empty() {
            return Err(ActionError::NothingSelected);
        }
        self.cells.modal.set(Some(ModalKind::ConfirmStopTracking {
            count: self.stop_selection.len(),
        }));
        Ok(())
    }

    /// Accept the open modal and run the action it was guarding.
    ///
    /// The modal stays open when the action is refused.
    pub fn confirm_modal(&mut self) -> Result<(), ActionError> {
        let Some(modal) = self.cells.modal.get().clone() else {
            return Ok(());
        };
        match modal {
            ModalKind::ConfirmStopTracking { .. } => self.stop_selected()?,
        }
        self.cells.modal.set(None);
        Ok(())
    }

    pub fn dismiss_modal(&mut self) {
        self.cells.modal.set(None);
    }

    fn begin_stop(&mut self, campaigns: Vec<CampaignId>) -> Result<(), ActionError> {
        self.ensure_idle(OperationKind::Stopping)?;
        tracing::info!("Stopping tracking for {} campaigns", campaigns.len());
        self.begin_action(OperationKind::Stopping);
        self.jobs
            .begin_stop(self.accounts.current_target().cloned(), campaigns);
        Ok(())
    }

    fn ensure_idle(&self, kind: OperationKind) -> Result<(), ActionError> {
        if self.is_in_flight(kind) {
            return Err(ActionError::AlreadyInFlight(kind));
        }
        Ok(())
    }

    fn begin_action(&mut self, kind: OperationKind) {
        self.flags.set(kind, true);
        self.errors.clear(kind);
    }
}
