//! Filter state and the record predicate built from it.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};
use time::Date;

use super::classify::Classified;
use crate::model::{AnalyzedInterest, TrackableItem};

/// How the free-text search term is matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Case-insensitive substring match.
    #[default]
    Substring,
    /// Skim-style fuzzy match, used by the miner search page.
    Fuzzy,
}

/// Active filters of a table view. Every field defaults to "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub status: Option<String>,
    pub objective: Option<String>,
    /// Inclusive first day.
    pub date_start: Option<Date>,
    /// Inclusive last day.
    pub date_end: Option<Date>,
    pub search_mode: SearchMode,
}

impl FilterState {
    pub fn is_unconstrained(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.status.is_none()
            && self.objective.is_none()
            && self.date_start.is_none()
            && self.date_end.is_none()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_status(mut self, value: &str) -> Self {
        self.set_status(value);
        self
    }

    pub fn with_objective(mut self, value: &str) -> Self {
        self.set_objective(value);
        self
    }

    pub fn with_date_range(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Set the status filter; `""` and `"all"` clear it.
    pub fn set_status(&mut self, value: &str) {
        self.status = constraint(value);
    }

    /// Set the objective filter; `""` and `"all"` clear it.
    pub fn set_objective(&mut self, value: &str) {
        self.objective = constraint(value);
    }

    /// Compile the filters for repeated matching.
    pub fn predicate<'a>(&'a self, matcher: &'a SkimMatcherV2) -> FilterPredicate<'a> {
        let start = self.date_start.map(day_start);
        let end = self.date_end.and_then(|end| end.next_day()).map(day_start);
        let empty_range = matches!((self.date_start, self.date_end), (Some(s), Some(e)) if s > e);
        FilterPredicate {
            term: self.search_term.trim().to_lowercase(),
            mode: self.search_mode,
            matcher,
            status: self.status.as_deref(),
            objective: self.objective.as_deref(),
            date_active: self.date_start.is_some() || self.date_end.is_some(),
            start,
            end,
            empty_range,
        }
    }
}

/// Normalize a categorical filter value: blank and `"all"` mean no constraint.
pub fn constraint(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value.to_string())
    }
}

fn day_start(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp()
}

/// Fields a record exposes to the filter bar.
pub trait Filterable {
    /// Text fields searched by the free-text term.
    fn search_fields(&self) -> impl Iterator<Item = &str>;
    /// Value compared against the status filter.
    fn status_key(&self) -> Option<&str>;
    /// Value compared against the objective filter.
    fn objective_key(&self) -> Option<&str>;
    /// Unix seconds compared against the date range.
    fn timestamp(&self) -> Option<i64>;
}

impl Filterable for TrackableItem {
    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [self.name.as_str(), self.id.as_str(), self.objective.as_str()].into_iter()
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.label())
    }

    fn objective_key(&self) -> Option<&str> {
        Some(self.objective.as_str())
    }

    fn timestamp(&self) -> Option<i64> {
        self.last_synced_at
    }
}

impl Filterable for AnalyzedInterest {
    fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.interest_name.as_str(),
            self.interest_id.as_str(),
            self.adset_id.as_str(),
        ]
        .into_iter()
    }

    fn status_key(&self) -> Option<&str> {
        None
    }

    fn objective_key(&self) -> Option<&str> {
        None
    }

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Classified records filter their status by bucket name.
impl<T: Filterable> Filterable for Classified<T> {
    fn search_fields(&self) -> impl Iterator<Item = &str> {
        self.record.search_fields()
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.bucket.as_str())
    }

    fn objective_key(&self) -> Option<&str> {
        self.record.objective_key()
    }

    fn timestamp(&self) -> Option<i64> {
        self.record.timestamp()
    }
}

/// Compiled AND of all active filters.
pub struct FilterPredicate<'a> {
    term: String,
    mode: SearchMode,
    matcher: &'a SkimMatcherV2,
    status: Option<&'a str>,
    objective: Option<&'a str>,
    date_active: bool,
    start: Option<i64>,
    end: Option<i64>,
    empty_range: bool,
}

impl FilterPredicate<'_> {
    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        self.matches_search(record)
            && matches_category(self.status, record.status_key())
            && matches_category(self.objective, record.objective_key())
            && self.matches_date(record)
    }

    fn matches_search<T: Filterable>(&self, record: &T) -> bool {
        if self.term.is_empty() {
            return true;
        }
        match self.mode {
            SearchMode::Substring => record
                .search_fields()
                .any(|field| field.to_lowercase().contains(&self.term)),
            SearchMode::Fuzzy => record
                .search_fields()
                .any(|field| self.matcher.fuzzy_match(field, &self.term).is_some()),
        }
    }

    fn matches_date<T: Filterable>(&self, record: &T) -> bool {
        if !self.date_active {
            return true;
        }
        if self.empty_range {
            return false;
        }
        let Some(ts) = record.timestamp() else {
            return false;
        };
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts < end)
    }
}

fn matches_category(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual.is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
    }
}
