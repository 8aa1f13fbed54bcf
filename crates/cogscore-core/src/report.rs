//! Learner report composition with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{analyze_variation_with, classify_trend_with, TrendSummary};
use crate::config::EngineConfig;
use crate::model::{EvolutionPoint, Recommendation, Trend, Variation};
use crate::narrative::generate_summary;
use crate::recommend::{domain_profile, select_recommendations};

/// Everything the engine has to say about one learner's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub generated_at: DateTime<Utc>,
    /// Period label of the latest snapshot, if any.
    pub latest_period: Option<String>,
    /// Length of the summarized period in months.
    pub period_months: u32,
    pub variations: Vec<Variation>,
    pub trend: TrendSummary,
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
}

impl LearnerReport {
    /// Run the analytics pipeline over a chronological history.
    ///
    /// Recommendations target the weakest domains of the latest snapshot.
    pub fn build<R: Rng + ?Sized>(
        series: &[EvolutionPoint],
        attendance_rates: &[f64],
        periods_back: usize,
        period_months: u32,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Self {
        let variations = analyze_variation_with(series, periods_back, config.variation_threshold);
        let totals: Vec<f64> = series.iter().map(|p| p.score.total).collect();
        let trend = classify_trend_with(&totals, config.trend_threshold, &config.copy.trend);
        let summary = generate_summary(
            series,
            &variations,
            attendance_rates,
            period_months,
            &config.copy,
        );

        let recommendations = match series.last() {
            Some(latest) => select_recommendations(
                &domain_profile(&latest.score),
                config.recommendation_count,
                &config.copy.recommendations,
                rng,
            ),
            None => Vec::new(),
        };

        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            latest_period: series.last().map(|p| p.period.clone()),
            period_months,
            variations,
            trend,
            summary,
            recommendations,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: LearnerReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        match &self.latest_period {
            Some(period) => md.push_str(&format!("## Evolução até {period}\n\n")),
            None => md.push_str("## Evolução\n\n"),
        }
        md.push_str(&format!("{}\n\n", self.summary));

        if !self.variations.is_empty() {
            md.push_str("| Domínio | Variação | Tendência |\n");
            md.push_str("|---------|----------|-----------|\n");
            for v in &self.variations {
                md.push_str(&format!(
                    "| {} | {:+.1} | {} |\n",
                    v.domain_label,
                    v.delta,
                    trend_arrow(v.trend)
                ));
            }
            md.push('\n');
        }

        md.push_str(&format!("**Tendência geral:** {}\n", self.trend.message));

        if !self.recommendations.is_empty() {
            md.push_str("\n### Recomendações\n\n");
            for r in &self.recommendations {
                md.push_str(&format!("- **{}**: {}\n", r.domain_label, r.text));
            }
        }

        md
    }
}

fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "▲",
        Trend::Stable => "=",
        Trend::Declining => "▼",
    }
}

/// Load a history series from a JSON array of evolution points.
///
/// The series is returned in file order. Out-of-order `MM/YYYY` labels are
/// reported but not fixed.
pub fn load_history(path: &Path) -> Result<Vec<EvolutionPoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history from {}", path.display()))?;
    let series: Vec<EvolutionPoint> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse history JSON: {}", path.display()))?;
    warn_if_unordered(&series);
    Ok(series)
}

/// Parse an `MM/YYYY` period label.
pub fn parse_period(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01/{}", label.trim()), "%d/%m/%Y").ok()
}

fn warn_if_unordered(series: &[EvolutionPoint]) {
    let dated: Vec<(&str, NaiveDate)> = series
        .iter()
        .filter_map(|p| parse_period(&p.period).map(|d| (p.period.as_str(), d)))
        .collect();
    for pair in dated.windows(2) {
        if pair[1].1 < pair[0].1 {
            tracing::warn!(
                "history is not chronological: {} comes after {}",
                pair[1].0,
                pair[0].0
            );
        }
    }
}
