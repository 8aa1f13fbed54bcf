//! Recommendation selection for a learner's weakest domains.
//!
//! Which domains are chosen is deterministic (weakest first). Which wording
//! is used is a uniform draw from the domain's pool, taken from the caller's
//! random source so tests can seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::RecommendationCopy;
use crate::model::{AssessmentScore, Recommendation};

/// One domain's current standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainProfileEntry {
    pub domain: String,
    pub score: f64,
}

/// Normalized score per domain, in the assessment's domain order.
pub fn domain_profile(score: &AssessmentScore) -> Vec<DomainProfileEntry> {
    score
        .domain_scores
        .iter()
        .map(|d| DomainProfileEntry {
            domain: d.domain_id.clone(),
            score: d.normalized,
        })
        .collect()
}

/// Pick one suggestion for each of the `count` weakest domains.
///
/// Equal scores keep their profile order. Domains with neither a pool of
/// their own nor a fallback pool are skipped.
pub fn select_recommendations<R: Rng + ?Sized>(
    profile: &[DomainProfileEntry],
    count: usize,
    copy: &RecommendationCopy,
    rng: &mut R,
) -> Vec<Recommendation> {
    let mut ranked: Vec<&DomainProfileEntry> = profile.iter().collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut recommendations = Vec::with_capacity(count.min(ranked.len()));
    for entry in ranked.into_iter().take(count) {
        let pool = copy.pool_for(&entry.domain);
        if pool.is_empty() {
            tracing::debug!(domain = %entry.domain, "no recommendation text available");
            continue;
        }
        recommendations.push(Recommendation {
            domain_label: entry.domain.clone(),
            text: pool[rng.random_range(0..pool.len())].clone(),
        });
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DomainScore;
    use indexmap::IndexMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn profile(entries: &[(&str, f64)]) -> Vec<DomainProfileEntry> {
        entries
            .iter()
            .map(|(domain, score)| DomainProfileEntry {
                domain: (*domain).into(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn picks_weakest_domains_first() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[
            ("atencao", 7.0),
            ("memoria", 3.5),
            ("fluencia", 9.0),
            ("cultura", 2.0),
            ("raciocinio", 6.0),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_recommendations(&profile, 2, &copy, &mut rng);

        let domains: Vec<&str> = picked.iter().map(|r| r.domain_label.as_str()).collect();
        assert_eq!(domains, vec!["cultura", "memoria"]);
        for rec in &picked {
            assert!(copy.pool_for(&rec.domain_label).contains(&rec.text));
        }
    }

    #[test]
    fn domain_choice_does_not_depend_on_seed() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[("atencao", 4.0), ("memoria", 1.0), ("cultura", 8.0)]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_recommendations(&profile, 2, &copy, &mut rng);
            assert_eq!(picked[0].domain_label, "memoria");
            assert_eq!(picked[1].domain_label, "atencao");
        }
    }

    #[test]
    fn same_seed_same_wording() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[("atencao", 4.0), ("memoria", 1.0)]);
        let first = select_recommendations(&profile, 2, &copy, &mut StdRng::seed_from_u64(42));
        let second = select_recommendations(&profile, 2, &copy, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn ties_keep_profile_order() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[("cultura", 5.0), ("atencao", 5.0), ("memoria", 5.0)]);
        let picked = select_recommendations(&profile, 2, &copy, &mut StdRng::seed_from_u64(1));
        assert_eq!(picked[0].domain_label, "cultura");
        assert_eq!(picked[1].domain_label, "atencao");
    }

    #[test]
    fn count_larger_than_profile_returns_everything() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[("atencao", 4.0)]);
        let picked = select_recommendations(&profile, 10, &copy, &mut StdRng::seed_from_u64(3));
        assert_eq!(picked.len(), 1);
        let none = select_recommendations(&profile, 0, &copy, &mut StdRng::seed_from_u64(3));
        assert!(none.is_empty());
    }

    #[test]
    fn unknown_domain_uses_fallback_or_is_skipped() {
        let copy = RecommendationCopy::default();
        let profile = profile(&[("musica", 1.0)]);
        let picked = select_recommendations(&profile, 1, &copy, &mut StdRng::seed_from_u64(5));
        assert!(copy.fallback.contains(&picked[0].text));

        let bare = RecommendationCopy {
            pools: IndexMap::new(),
            fallback: vec![],
        };
        let picked = select_recommendations(&profile, 1, &bare, &mut StdRng::seed_from_u64(5));
        assert!(picked.is_empty());
    }

    #[test]
    fn profile_follows_domain_order() {
        let score = AssessmentScore {
            domain_scores: vec![
                DomainScore {
                    domain_id: "b".into(),
                    raw_total: 1.0,
                    max_points: 2.0,
                    normalized: 5.0,
                },
                DomainScore {
                    domain_id: "a".into(),
                    raw_total: 0.0,
                    max_points: 2.0,
                    normalized: 0.0,
                },
            ],
            total: 2.5,
        };
        let entries = domain_profile(&score);
        assert_eq!(entries[0].domain, "b");
        assert_eq!(entries[1].score, 0.0);
    }
}
