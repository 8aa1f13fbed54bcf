//! The `cogscore recommend` command.

use std::path::PathBuf;

use anyhow::Result;

use cogscore_core::config::load_config_from;
use cogscore_core::recommend::{domain_profile, select_recommendations};
use cogscore_core::report::load_history;

use super::make_rng;

pub fn execute(
    history_path: PathBuf,
    count: Option<usize>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let series = load_history(&history_path)?;

    let Some(latest) = series.last() else {
        println!("History is empty, nothing to recommend.");
        return Ok(());
    };

    let count = count.unwrap_or(config.recommendation_count);
    let mut rng = make_rng(seed);
    let recommendations = select_recommendations(
        &domain_profile(&latest.score),
        count,
        &config.copy.recommendations,
        &mut rng,
    );

    println!("Recommendations for {}:", latest.period);
    for r in &recommendations {
        println!("  {}: {}", config.copy.domain_name(&r.domain_label), r.text);
    }

    Ok(())
}
