//! Period summary prose built from variation results and attendance.

use crate::config::{NarrativeCopy, ReportCopy};
use crate::model::{EvolutionPoint, Trend, Variation};

/// Mean attendance below which a decline is attributed to absences.
const ATTENDANCE_DECLINE_LIMIT: f64 = 70.0;
/// Mean attendance at or above which engagement is praised.
const ATTENDANCE_HIGH: f64 = 85.0;
/// Mean attendance below which attendance is flagged on its own.
const ATTENDANCE_LOW: f64 = 60.0;

/// Describe a learner's period in prose.
///
/// Clauses come in a fixed order: improving domains, stable domains, declining
/// domains, then at most one attendance observation. The synthetic total is
/// never named. With no clause at all the neutral sentence is returned.
/// `attendance_rates` are percentages (0–100), one per period. The mean is
/// rendered truncated to a whole percent.
pub fn generate_summary(
    series: &[EvolutionPoint],
    variations: &[Variation],
    attendance_rates: &[f64],
    period_months: u32,
    copy: &ReportCopy,
) -> String {
    let text = &copy.narrative;
    let mut improving = Vec::new();
    let mut stable = Vec::new();
    let mut declining = Vec::new();

    if series.len() >= 2 {
        for variation in variations.iter().filter(|v| !v.is_total()) {
            let name = copy.domain_name(&variation.domain_label);
            match variation.trend {
                Trend::Improving => improving.push(name),
                Trend::Stable => stable.push(name),
                Trend::Declining => declining.push(name),
            }
        }
    }

    let mut clauses = Vec::new();

    if !improving.is_empty() {
        clauses.push(fill(&text.improving, &improving, period_months, text));
    }
    if !stable.is_empty() {
        let template = if improving.is_empty() {
            &text.stable_alone
        } else {
            &text.stable_after_improving
        };
        clauses.push(fill(template, &stable, period_months, text));
    }
    if !declining.is_empty() {
        clauses.push(fill(&text.declining, &declining, period_months, text));
    }

    if let Some(rate) = mean_attendance(attendance_rates) {
        let observation = if rate < ATTENDANCE_DECLINE_LIMIT && !declining.is_empty() {
            Some(&text.attendance_with_decline)
        } else if rate >= ATTENDANCE_HIGH {
            Some(&text.attendance_high)
        } else if rate < ATTENDANCE_LOW {
            Some(&text.attendance_low)
        } else {
            None
        };
        if let Some(template) = observation {
            clauses.push(template.replace("{rate}", &format!("{:.0}", rate.floor())));
        }
    }

    if clauses.is_empty() {
        return terminate(&text.neutral);
    }

    let joined = clauses
        .iter()
        .map(|c| c.trim().trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(". ");
    terminate(&joined)
}

/// Mean of the finite attendance percentages, if any.
pub fn mean_attendance(rates: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = rates.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

fn fill(template: &str, names: &[&str], months: u32, text: &NarrativeCopy) -> String {
    template
        .replace("{domains}", &join_names(names, &text.conjunction))
        .replace("{months}", &months.to_string())
}

/// "a", "a e b", "a, b e c".
fn join_names(names: &[&str], conjunction: &str) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} {conjunction} {last}", init.join(", ")),
    }
}

fn terminate(sentence: &str) -> String {
    format!("{}.", sentence.trim().trim_end_matches('.'))
}
