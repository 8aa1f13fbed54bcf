//! The `cogscore evolution` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use cogscore_core::config::{load_config_from, ReportCopy};
use cogscore_core::report::{load_history, LearnerReport};

use super::make_rng;

pub fn execute(
    history_path: PathBuf,
    periods_back: Option<usize>,
    attendance: Option<String>,
    months: u32,
    format: String,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let series = load_history(&history_path)?;
    let attendance = attendance
        .as_deref()
        .map(parse_attendance)
        .transpose()?
        .unwrap_or_default();

    let periods_back = periods_back.unwrap_or(config.periods_back);
    let mut rng = make_rng(seed);
    let report = LearnerReport::build(&series, &attendance, periods_back, months, &config, &mut rng);

    match format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report, &config.copy),
    }

    Ok(())
}

/// Parse "90,80.5" into percentages.
fn parse_attendance(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid attendance value: {s}"))
        })
        .collect()
}

fn print_text(report: &LearnerReport, copy: &ReportCopy) {
    if let Some(period) = &report.latest_period {
        println!("Latest period: {period}");
    }

    if report.variations.is_empty() {
        println!("Not enough history for variation analysis.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Domain", "Delta", "Trend"]);
        for v in &report.variations {
            table.add_row(vec![
                Cell::new(copy.domain_name(&v.domain_label)),
                Cell::new(format!("{:+.2}", v.delta)),
                Cell::new(v.trend.to_string()),
            ]);
        }
        println!("{table}");
    }

    println!(
        "\nTrend: {} ({:.2})\n{}",
        report.trend.direction, report.trend.magnitude, report.trend.message
    );
    println!("\n{}", report.summary);

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for r in &report.recommendations {
            println!("  {}: {}", copy.domain_name(&r.domain_label), r.text);
        }
    }
}
