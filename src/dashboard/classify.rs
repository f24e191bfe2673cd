//! Threshold-based classification of scored records into named buckets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AnalyzedInterest;

/// Records that carry a 0-100 score used for bucketing.
pub trait Scored {
    /// `None` when the record has no usable score.
    fn score(&self) -> Option<f64>;
}

impl Scored for AnalyzedInterest {
    fn score(&self) -> Option<f64> {
        self.performance_score
    }
}

/// A bucket and the lowest score it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRule {
    pub name: String,
    pub min_score: f64,
}

impl BucketRule {
    pub fn new(name: impl Into<String>, min_score: f64) -> Self {
        Self {
            name: name.into(),
            min_score,
        }
    }
}

/// Errors raised while building a `BucketScheme` from configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemeError {
    /// No score buckets were configured.
    #[error("Classification scheme needs at least one bucket")]
    Empty,
    /// Two buckets share a name.
    #[error("Bucket name `{0}` is used more than once")]
    DuplicateName(String),
    /// A threshold is NaN or infinite.
    #[error("Bucket `{0}` has a non-finite threshold")]
    InvalidThreshold(String),
    /// Thresholds must strictly decrease in listing order.
    #[error("Bucket `{name}` threshold {min_score} must be below the previous threshold {previous}")]
    NonMonotonic {
        name: String,
        min_score: f64,
        previous: f64,
    },
}

/// Ordered threshold rules mapping a score to exactly one bucket name.
///
/// Rules are listed from the highest threshold down. A score lands in the first bucket whose
/// threshold it reaches; scores under every threshold land in the last bucket. Records
/// without a score go to the `no_data` bucket when one is configured, else the last bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketScheme {
    rules: Vec<BucketRule>,
    no_data: Option<String>,
}

impl BucketScheme {
    pub fn new(rules: Vec<BucketRule>, no_data: Option<String>) -> Result<Self, SchemeError> {
        if rules.is_empty() {
            return Err(SchemeError::Empty);
        }
        let mut previous: Option<f64> = None;
        for (index, rule) in rules.iter().enumerate() {
            if !rule.min_score.is_finite() {
                return Err(SchemeError::InvalidThreshold(rule.name.clone()));
            }
            let duplicate = rules[..index].iter().any(|other| other.name == rule.name)
                || no_data.as_deref() == Some(rule.name.as_str());
            if duplicate {
                return Err(SchemeError::DuplicateName(rule.name.clone()));
            }
            if let Some(previous) = previous
                && rule.min_score >= previous
            {
                return Err(SchemeError::NonMonotonic {
                    name: rule.name.clone(),
                    min_score: rule.min_score,
                    previous,
                });
            }
            previous = Some(rule.min_score);
        }
        Ok(Self { rules, no_data })
    }

    /// Excellent / Good / Average / Poor plus NoData, used for interests.
    pub fn interest_default() -> Self {
        Self {
            rules: vec![
                BucketRule::new("Excellent", 80.0),
                BucketRule::new("Good", 60.0),
                BucketRule::new("Average", 40.0),
                BucketRule::new("Poor", 0.0),
            ],
            no_data: Some("NoData".to_string()),
        }
    }

    /// Top / Excellent / Stable / Moderate / Underperforming plus NoData, used for campaigns.
    pub fn campaign_default() -> Self {
        Self {
            rules: vec![
                BucketRule::new("Top", 90.0),
                BucketRule::new("Excellent", 75.0),
                BucketRule::new("Stable", 60.0),
                BucketRule::new("Moderate", 40.0),
                BucketRule::new("Underperforming", 0.0),
            ],
            no_data: Some("NoData".to_string()),
        }
    }

    pub fn rules(&self) -> &[BucketRule] {
        &self.rules
    }

    pub fn no_data(&self) -> Option<&str> {
        self.no_data.as_deref()
    }

    /// Bucket names in display order, the no-data bucket last.
    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.name.as_str())
            .chain(self.no_data.as_deref())
    }

    pub fn classify_score(&self, score: Option<f64>) -> &str {
        let lowest = self.lowest();
        let Some(score) = score.filter(|score| !score.is_nan()) else {
            return self.no_data.as_deref().unwrap_or(lowest);
        };
        self.rules
            .iter()
            .find(|rule| score >= rule.min_score)
            .map(|rule| rule.name.as_str())
            .unwrap_or(lowest)
    }

    pub fn classify<T: Scored>(&self, record: &T) -> &str {
        self.classify_score(record.score())
    }

    /// Split `records` into every bucket of the scheme, keeping input order within a bucket.
    pub fn partition<T: Scored>(&self, records: impl IntoIterator<Item = T>) -> BucketMap<T> {
        let mut map = self.empty_map();
        for record in records {
            let name = self.classify(&record);
            if let Some(bucket) = map.buckets.iter_mut().find(|bucket| bucket.name == name) {
                bucket.records.push(record);
            }
        }
        map
    }

    /// Pair each record with its bucket name, preserving order.
    pub fn label_all<T: Scored>(&self, records: impl IntoIterator<Item = T>) -> Vec<Classified<T>> {
        records
            .into_iter()
            .map(|record| Classified {
                bucket: self.classify(&record).to_string(),
                record,
            })
            .collect()
    }

    /// A map with every bucket present and empty.
    pub fn empty_map<T>(&self) -> BucketMap<T> {
        BucketMap {
            buckets: self
                .bucket_names()
                .map(|name| Bucket {
                    name: name.to_string(),
                    records: Vec::new(),
                })
                .collect(),
        }
    }

    fn lowest(&self) -> &str {
        self.rules
            .last()
            .map(|rule| rule.name.as_str())
            .unwrap_or_default()
    }
}

/// A record tagged with the bucket it was classified into.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified<T> {
    pub record: T,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<T> {
    pub name: String,
    pub records: Vec<T>,
}

/// Buckets in scheme order; empty buckets are kept so their zero counts still render.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketMap<T> {
    buckets: Vec<Bucket<T>>,
}

impl<T> Default for BucketMap<T> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }
}

impl<T> BucketMap<T> {
    pub fn get(&self, name: &str) -> Option<&[T]> {
        self.buckets
            .iter()
            .find(|bucket| bucket.name == name)
            .map(|bucket| bucket.records.as_slice())
    }

    pub fn count(&self, name: &str) -> usize {
        self.get(name).map_or(0, <[T]>::len)
    }

    /// `(bucket, count)` pairs in display order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.name.as_str(), bucket.records.len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.records.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket<T>> {
        self.buckets.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|bucket| bucket.name.as_str())
    }
}
