//! Longitudinal analytics over a learner's score history.
//!
//! Two different questions are answered here:
//! - variation: how each metric moved between the latest snapshot and the
//!   snapshot `periods_back` periods earlier (±1.0 threshold);
//! - trend: how the latest overall score compares with the very first one
//!   (±0.5 threshold).

use serde::{Deserialize, Serialize};

use crate::config::TrendCopy;
use crate::model::{EvolutionPoint, Trend, Variation, TOTAL_LABEL};

/// Period-over-period threshold on the 0–10 scale.
pub const VARIATION_THRESHOLD: f64 = 1.0;

/// First-versus-last threshold on the 0–10 scale.
pub const TREND_THRESHOLD: f64 = 0.5;

/// Index of the reference snapshot: `max(0, len - periods_back - 1)`.
pub fn reference_index(len: usize, periods_back: usize) -> usize {
    len.saturating_sub(periods_back.saturating_add(1))
}

/// Compare the latest snapshot with the one `periods_back` periods earlier.
pub fn analyze_variation(series: &[EvolutionPoint], periods_back: usize) -> Vec<Variation> {
    analyze_variation_with(series, periods_back, VARIATION_THRESHOLD)
}

/// [`analyze_variation`] with an explicit classification threshold.
///
/// Returns one variation per domain in the latest snapshot (in its order),
/// followed by the overall total. Fewer than two points yield nothing.
/// Domains absent from the reference snapshot are skipped.
pub fn analyze_variation_with(
    series: &[EvolutionPoint],
    periods_back: usize,
    threshold: f64,
) -> Vec<Variation> {
    if series.len() < 2 {
        return Vec::new();
    }
    let (Some(latest), Some(first)) = (series.last(), series.first()) else {
        return Vec::new();
    };
    let reference = series
        .get(reference_index(series.len(), periods_back))
        .unwrap_or(first);

    let mut variations = Vec::with_capacity(latest.score.domain_scores.len() + 1);

    for current in &latest.score.domain_scores {
        let Some(previous) = reference.score.domain(&current.domain_id) else {
            tracing::debug!(
                domain = %current.domain_id,
                reference = %reference.period,
                "domain missing from reference snapshot, skipping"
            );
            continue;
        };
        let delta = current.normalized - previous.normalized;
        variations.push(Variation {
            domain_label: current.domain_id.clone(),
            delta,
            trend: Trend::classify(delta, threshold),
            overall: false,
        });
    }

    let delta = latest.score.total - reference.score.total;
    variations.push(Variation {
        domain_label: TOTAL_LABEL.to_string(),
        delta,
        trend: Trend::classify(delta, threshold),
        overall: true,
    });

    variations
}

/// Coarse first-versus-last trajectory of a learner's overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: Trend,
    /// Absolute change between the first and the last total.
    pub magnitude: f64,
    pub message: String,
    /// False when fewer than two points were available.
    pub enough_data: bool,
}

/// Classify the trajectory of a series of overall totals.
pub fn classify_trend(totals: &[f64], copy: &TrendCopy) -> TrendSummary {
    classify_trend_with(totals, TREND_THRESHOLD, copy)
}

/// [`classify_trend`] with an explicit threshold.
pub fn classify_trend_with(totals: &[f64], threshold: f64, copy: &TrendCopy) -> TrendSummary {
    let (Some(first), Some(last)) = (totals.first(), totals.last()) else {
        return insufficient(copy);
    };
    if totals.len() < 2 {
        return insufficient(copy);
    }

    let delta = last - first;
    let direction = Trend::classify(delta, threshold);
    let message = match direction {
        Trend::Improving => copy.improving.clone(),
        Trend::Stable => copy.stable.clone(),
        Trend::Declining => copy.declining.clone(),
    };

    TrendSummary {
        direction,
        magnitude: delta.abs(),
        message,
        enough_data: true,
    }
}

/// Convenience wrapper taking the overall totals out of a history series.
pub fn classify_series(series: &[EvolutionPoint], copy: &TrendCopy) -> TrendSummary {
    let totals: Vec<f64> = series.iter().map(|p| p.score.total).collect();
    classify_trend(&totals, copy)
}

fn insufficient(copy: &TrendCopy) -> TrendSummary {
    TrendSummary {
        direction: Trend::Stable,
        magnitude: 0.0,
        message: copy.insufficient_data.clone(),
        enough_data: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssessmentScore, DomainScore};

    fn point(period: &str, domains: &[(&str, f64)], total: f64) -> EvolutionPoint {
        EvolutionPoint {
            period: period.into(),
            score: AssessmentScore {
                domain_scores: domains
                    .iter()
                    .map(|(id, normalized)| DomainScore {
                        domain_id: (*id).into(),
                        raw_total: *normalized,
                        max_points: 10.0,
                        normalized: *normalized,
                    })
                    .collect(),
                total,
            },
        }
    }

    fn totals_series(totals: &[f64]) -> Vec<EvolutionPoint> {
        totals
            .iter()
            .enumerate()
            .map(|(i, &t)| point(&format!("{:02}/2025", i + 1), &[], t))
            .collect()
    }

    #[test]
    fn reference_index_formula() {
        assert_eq!(reference_index(4, 2), 1);
        assert_eq!(reference_index(4, 3), 0);
        assert_eq!(reference_index(4, 10), 0);
        assert_eq!(reference_index(4, 0), 3);
        assert_eq!(reference_index(4, usize::MAX), 0);
    }

    #[test]
    fn variation_uses_periods_back_reference() {
        let series = totals_series(&[5.0, 6.0, 7.0, 9.0]);
        let variations = analyze_variation(&series, 2);
        assert_eq!(variations.len(), 1);
        let total = &variations[0];
        assert!(total.is_total());
        assert!((total.delta - 3.0).abs() < 1e-9);
        assert_eq!(total.trend, Trend::Improving);
    }

    #[test]
    fn variation_needs_two_points() {
        assert!(analyze_variation(&[], 1).is_empty());
        assert!(analyze_variation(&totals_series(&[5.0]), 1).is_empty());
    }

    #[test]
    fn variation_classifies_each_domain() {
        let series = vec![
            point("01/2025", &[("fluencia", 4.0), ("atencao", 8.0), ("cultura", 5.0)], 5.7),
            point("02/2025", &[("fluencia", 6.5), ("atencao", 6.0), ("cultura", 5.5)], 6.0),
        ];
        let variations = analyze_variation(&series, 1);
        let trends: Vec<(&str, Trend)> = variations
            .iter()
            .map(|v| (v.domain_label.as_str(), v.trend))
            .collect();
        assert_eq!(
            trends,
            vec![
                ("fluencia", Trend::Improving),
                ("atencao", Trend::Declining),
                ("cultura", Trend::Stable),
                (TOTAL_LABEL, Trend::Stable),
            ]
        );
    }

    #[test]
    fn variation_threshold_is_exclusive() {
        let series = totals_series(&[5.0, 6.0]);
        assert_eq!(analyze_variation(&series, 1)[0].trend, Trend::Stable);
        let series = totals_series(&[6.0, 5.0]);
        assert_eq!(analyze_variation(&series, 1)[0].trend, Trend::Stable);
    }

    #[test]
    fn variation_skips_domains_missing_from_reference() {
        let series = vec![
            point("01/2025", &[("fluencia", 4.0)], 4.0),
            point("02/2025", &[("fluencia", 4.0), ("novo", 9.0)], 6.5),
        ];
        let variations = analyze_variation(&series, 1);
        assert!(variations.iter().all(|v| v.domain_label != "novo"));
        assert_eq!(variations.len(), 2);
    }

    #[test]
    fn domain_named_total_is_not_the_overall_metric() {
        let series = vec![
            point("01/2025", &[("Total", 2.0)], 2.0),
            point("02/2025", &[("Total", 6.0)], 6.0),
        ];
        let variations = analyze_variation(&series, 1);
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].domain_label, "Total");
        assert!(!variations[0].is_total());
        assert!(variations[1].is_total());
        assert_eq!(variations.iter().filter(|v| v.is_total()).count(), 1);
    }

    #[test]
    fn trend_flat_series_is_stable() {
        let summary = classify_trend(&[4.0, 4.0, 4.0], &TrendCopy::default());
        assert_eq!(summary.direction, Trend::Stable);
        assert_eq!(summary.magnitude, 0.0);
        assert!(summary.enough_data);
        assert_eq!(summary.message, TrendCopy::default().stable);
    }

    #[test]
    fn trend_compares_endpoints_only() {
        let copy = TrendCopy::default();
        let summary = classify_trend(&[4.0, 9.0, 1.0, 4.6], &copy);
        assert_eq!(summary.direction, Trend::Improving);
        assert!((summary.magnitude - 0.6).abs() < 1e-9);
        assert_eq!(summary.message, copy.improving);

        let summary = classify_trend(&[6.0, 5.4], &copy);
        assert_eq!(summary.direction, Trend::Declining);
        assert_eq!(summary.message, copy.declining);

        let summary = classify_trend(&[6.0, 5.5], &copy);
        assert_eq!(summary.direction, Trend::Stable);
    }

    #[test]
    fn trend_without_history_reports_insufficient_data() {
        let copy = TrendCopy::default();
        for totals in [&[][..], &[7.0][..]] {
            let summary = classify_trend(totals, &copy);
            assert_eq!(summary.direction, Trend::Stable);
            assert_eq!(summary.magnitude, 0.0);
            assert!(!summary.enough_data);
            assert_eq!(summary.message, copy.insufficient_data);
        }
    }

    #[test]
    fn classify_series_reads_totals() {
        let summary = classify_series(&totals_series(&[3.0, 8.0]), &TrendCopy::default());
        assert_eq!(summary.direction, Trend::Improving);
        assert_eq!(summary.magnitude, 5.0);
    }
}
