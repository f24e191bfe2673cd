//! Narrow observable cells for app-wide UI flags (theme, sidebar, modal).
//!
//! The embedding UI creates the cells and hands them to the controller; nothing reads these
//! flags from globals. Each cell carries a version that only moves when the value changes, so
//! views can cheaply tell whether they need to redraw.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiCell<T> {
    value: T,
    version: u64,
}

impl<T: PartialEq> UiCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            version: 0,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Store `value`, bumping the version only when it differs. Returns whether it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.version += 1;
        true
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: PartialEq + Default> Default for UiCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Modal dialogs the dashboard core can raise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalKind {
    /// Confirm stopping tracking for the given number of selected campaigns.
    ConfirmStopTracking { count: usize },
}

/// The UI flags injected into the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiCells {
    pub theme: UiCell<Theme>,
    pub sidebar_open: UiCell<bool>,
    pub modal: UiCell<Option<ModalKind>>,
}

impl Default for UiCells {
    fn default() -> Self {
        Self {
            theme: UiCell::default(),
            sidebar_open: UiCell::new(true),
            modal: UiCell::new(None),
        }
    }
}
