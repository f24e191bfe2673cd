use serde::{Deserialize, Serialize};

use super::{CampaignId, RecordError, normalize_score, required};

/// Component scores feeding the overall performance score, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub historical: f64,
    pub correlation: f64,
    pub audience_size: f64,
    pub category: f64,
}

/// Scored interest belonging to a tracked campaign.
///
/// Immutable once received; a re-fetch replaces the whole analysis result. The bucket it
/// falls into is derived from `performance_score` by a `BucketScheme`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedInterest {
    pub interest_id: String,
    pub interest_name: String,
    pub adset_id: String,
    /// `None` when the backend had no data to score this interest.
    pub performance_score: Option<f64>,
    pub sub_scores: SubScores,
    pub prediction_confidence: f64,
    pub cross_adset_appearances: u32,
    pub recommendations: Vec<String>,
}

/// Campaign-level figures delivered alongside the interests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub overall_score: Option<f64>,
    pub analyzed_interests: usize,
    /// Unix seconds when the backend produced the analysis.
    pub generated_at: Option<i64>,
}

/// Payload of `fetch_analysis` for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub campaign_id: CampaignId,
    pub interests: Vec<AnalyzedInterest>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubScores {
    #[serde(default)]
    pub historical: Option<f64>,
    #[serde(default)]
    pub correlation: Option<f64>,
    #[serde(default)]
    pub audience_size: Option<f64>,
    #[serde(default)]
    pub category: Option<f64>,
}

/// Interest as decoded from JSON, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInterest {
    #[serde(default)]
    pub interest_id: Option<String>,
    #[serde(default)]
    pub interest_name: Option<String>,
    #[serde(default)]
    pub adset_id: Option<String>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub sub_scores: RawSubScores,
    #[serde(default)]
    pub prediction_confidence: Option<f64>,
    #[serde(default)]
    pub cross_adset_appearances: Option<u32>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl TryFrom<RawInterest> for AnalyzedInterest {
    type Error = RecordError;

    fn try_from(raw: RawInterest) -> Result<Self, Self::Error> {
        let score = |value: Option<f64>| normalize_score(value).unwrap_or(0.0);
        Ok(Self {
            interest_id: required(raw.interest_id, "interest", "interest_id")?,
            interest_name: required(raw.interest_name, "interest", "interest_name")?,
            adset_id: required(raw.adset_id, "interest", "adset_id")?,
            performance_score: normalize_score(raw.performance_score),
            sub_scores: SubScores {
                historical: score(raw.sub_scores.historical),
                correlation: score(raw.sub_scores.correlation),
                audience_size: score(raw.sub_scores.audience_size),
                category: score(raw.sub_scores.category),
            },
            prediction_confidence: score(raw.prediction_confidence),
            cross_adset_appearances: raw.cross_adset_appearances.unwrap_or(0),
            recommendations: raw
                .recommendations
                .into_iter()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect(),
        })
    }
}

impl AnalyzedInterest {
    /// Decode and validate one interest of an analysis response.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        let raw: RawInterest =
            serde_json::from_value(value).map_err(|err| RecordError::Malformed {
                record: "interest",
                message: err.to_string(),
            })?;
        Self::try_from(raw)
    }
}

/// Analysis payload as decoded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysisResult {
    /// Kept undecoded so one malformed interest does not reject the whole analysis.
    #[serde(default)]
    pub interests: Vec<serde_json::Value>,
    #[serde(default)]
    pub summary: Option<RawSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSummary {
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub generated_at: Option<i64>,
}

impl RawAnalysisResult {
    /// Validate every interest, dropping malformed ones with a warning.
    pub fn into_result(self, campaign_id: CampaignId) -> AnalysisResult {
        let mut interests = Vec::with_capacity(self.interests.len());
        for raw in self.interests {
            match AnalyzedInterest::from_json(raw) {
                Ok(interest) => interests.push(interest),
                Err(err) => {
                    tracing::warn!("Skipping interest for campaign {campaign_id}: {err}");
                }
            }
        }
        let summary = self.summary.unwrap_or_default();
        AnalysisResult {
            campaign_id,
            summary: AnalysisSummary {
                overall_score: normalize_score(summary.overall_score),
                analyzed_interests: interests.len(),
                generated_at: summary.generated_at,
            },
            interests,
        }
    }
}
