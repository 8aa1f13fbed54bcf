//! Domain aggregation and total score calculation.
//!
//! Item points are summed per domain and rescaled to a common 0–10 range;
//! the overall score is the unweighted mean of those normalized values.

use std::collections::HashMap;

use crate::model::{AssessmentScore, Domain, DomainScore, Item, Response};
use crate::rules::evaluate;
use crate::template::ResolvedTemplate;

/// Upper end of the normalized scale.
pub const NORMALIZED_MAX: f64 = 10.0;

/// Rescale a raw domain total to `[0, 10]`.
///
/// Zero or negative totals and non-positive maxima normalize to `0`.
pub fn normalize(raw_total: f64, max_points: f64) -> f64 {
    if raw_total > 0.0 && max_points > 0.0 {
        (raw_total / max_points * NORMALIZED_MAX).clamp(0.0, NORMALIZED_MAX)
    } else {
        0.0
    }
}

/// Sum item points per domain and normalize each domain.
///
/// Returns one score per domain, in the order given. Responses whose item
/// points at a domain not in `domains` contribute nothing.
pub fn aggregate(responses: &[(&Response, &Item)], domains: &[Domain]) -> Vec<DomainScore> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, domain) in domains.iter().enumerate() {
        index.entry(domain.id.as_str()).or_insert(i);
    }

    let mut raw_totals = vec![0.0f64; domains.len()];
    for (response, item) in responses {
        match index.get(item.domain_id.as_str()) {
            Some(&i) => raw_totals[i] += evaluate(&response.raw_value, &item.rule),
            None => {
                tracing::debug!(
                    item = %item.id,
                    domain = %item.domain_id,
                    "ignoring response for unknown domain"
                );
            }
        }
    }

    domains
        .iter()
        .zip(raw_totals)
        .map(|(domain, raw_total)| DomainScore {
            domain_id: domain.id.clone(),
            raw_total,
            max_points: domain.max_points,
            normalized: normalize(raw_total, domain.max_points),
        })
        .collect()
}

/// Unweighted mean of the normalized domain scores; `0` for no domains.
pub fn total_score(domain_scores: &[DomainScore]) -> f64 {
    if domain_scores.is_empty() {
        return 0.0;
    }
    domain_scores.iter().map(|d| d.normalized).sum::<f64>() / domain_scores.len() as f64
}

/// Aggregate and total in one step.
pub fn score(responses: &[(&Response, &Item)], domains: &[Domain]) -> AssessmentScore {
    let domain_scores = aggregate(responses, domains);
    let total = total_score(&domain_scores);
    AssessmentScore {
        domain_scores,
        total,
    }
}

/// Score a learner's submission against a resolved template.
///
/// Responses are paired with the template's items by id. Responses for items
/// whose rule was rejected at load time score zero; responses for items the
/// template does not know are ignored. When an item is answered twice the
/// last response wins.
pub fn score_submission(template: &ResolvedTemplate, responses: &[Response]) -> AssessmentScore {
    let mut by_item: HashMap<&str, &Response> = HashMap::new();
    for response in responses {
        if by_item.insert(response.item_id.as_str(), response).is_some() {
            tracing::debug!(item = %response.item_id, "duplicate response, keeping the last one");
        }
    }

    for item_id in by_item.keys() {
        if template.is_rejected(item_id) {
            tracing::warn!(item = %item_id, "item rule could not be resolved, scoring 0");
        } else if template.item(item_id).is_none() {
            tracing::debug!(item = %item_id, "ignoring response for item not in template");
        }
    }

    let pairs: Vec<(&Response, &Item)> = template
        .items
        .iter()
        .filter_map(|item| by_item.get(item.id.as_str()).map(|r| (*r, item)))
        .collect();

    score(&pairs, &template.domains)
}
