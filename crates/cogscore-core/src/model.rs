//! Core data model types for cogscore.
//!
//! These are the plain values exchanged between the scoring pipeline, the
//! analytics pipeline and the (external) storage and reporting layers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::ScoringRule;

/// Label used for the synthetic overall-score metric in variation output.
pub const TOTAL_LABEL: &str = "Total";

/// A cognitive domain (e.g. fluency, attention) grouping several items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Unique identifier within a template.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Sum of the maximum attainable points of every item in this domain.
    /// Supplied by the template author; normalization divides by it.
    pub max_points: f64,
}

/// A single question or exercise, bound to one domain and one scoring rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub domain_id: String,
    pub rule: ScoringRule,
}

/// The learner's raw answer to one item. Unanswered items have no response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: String,
    pub raw_value: String,
}

impl Response {
    pub fn new(item_id: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            raw_value: raw_value.into(),
        }
    }
}

/// Summed and normalized points for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain_id: String,
    /// Sum of the points awarded to answered items in this domain.
    pub raw_total: f64,
    /// The domain's configured maximum.
    pub max_points: f64,
    /// `raw_total / max_points * 10`, clamped to `[0, 10]`.
    pub normalized: f64,
}

/// The scores of one assessment instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentScore {
    pub domain_scores: Vec<DomainScore>,
    /// Unweighted mean of every domain's normalized score.
    pub total: f64,
}

impl AssessmentScore {
    /// Look up a domain's score by id.
    pub fn domain(&self, domain_id: &str) -> Option<&DomainScore> {
        self.domain_scores.iter().find(|d| d.domain_id == domain_id)
    }
}

/// One historical assessment, tagged with its period (e.g. "03/2025").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub period: String,
    pub score: AssessmentScore,
}

/// Coarse direction of a change between two points in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    /// Classify a delta against a symmetric threshold. Deltas exactly on the
    /// threshold are stable.
    pub fn classify(delta: f64, threshold: f64) -> Self {
        if delta > threshold {
            Trend::Improving
        } else if delta < -threshold {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// Signed change of one metric between a reference point and the latest point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Domain id, or [`TOTAL_LABEL`] for the overall score.
    pub domain_label: String,
    pub delta: f64,
    pub trend: Trend,
    /// Set only on the synthetic overall-score metric. A domain may itself
    /// be called `Total`, so the label is not enough to tell them apart.
    #[serde(default)]
    pub overall: bool,
}

impl Variation {
    /// Whether this variation describes the synthetic overall-score metric.
    pub fn is_total(&self) -> bool {
        self.overall
    }
}

/// A suggestion for one of the learner's weakest domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub domain_label: String,
    pub text: String,
}
