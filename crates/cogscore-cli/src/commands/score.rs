//! The `cogscore score` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde_json::Value;

use cogscore_core::model::{AssessmentScore, Response};
use cogscore_core::scoring::score_submission;
use cogscore_core::template::{parse_template, ResolvedTemplate};

pub fn execute(template_path: PathBuf, responses_path: PathBuf, format: String) -> Result<()> {
    let template = parse_template(&template_path)?.resolve();
    let responses = load_responses(&responses_path)?;

    let score = score_submission(&template, &responses);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&score)?),
        _ => print_table(&template, &score),
    }

    Ok(())
}

/// Read a JSON object of `item id -> answer`. Non-string answers are taken
/// verbatim as their JSON text; `null` means unanswered.
fn load_responses(path: &Path) -> Result<Vec<Response>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read responses from {}", path.display()))?;
    let answers: serde_json::Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse responses JSON: {}", path.display()))?;

    Ok(answers
        .into_iter()
        .filter_map(|(item_id, value)| match value {
            Value::Null => None,
            Value::String(raw) => Some(Response::new(item_id, raw)),
            other => Some(Response::new(item_id, other.to_string())),
        })
        .collect())
}

fn print_table(template: &ResolvedTemplate, score: &AssessmentScore) {
    println!("Template: {} ({})", template.name, template.id);

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Raw", "Max", "Score"]);

    for ds in &score.domain_scores {
        let name = template
            .domain(&ds.domain_id)
            .map(|d| d.name.as_str())
            .unwrap_or(ds.domain_id.as_str());
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{}", ds.raw_total)),
            Cell::new(format!("{}", ds.max_points)),
            Cell::new(format!("{:.2}", ds.normalized)),
        ]);
    }

    println!("{table}");
    println!("Total: {:.2}", score.total);

    for rejected in &template.rejected {
        println!(
            "  [{}] WARNING: scored 0, rule rejected: {}",
            rejected.item_id, rejected.error
        );
    }
}
