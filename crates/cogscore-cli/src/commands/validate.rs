//! The `cogscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cogscore_core::template::{load_template_directory, parse_template, validate_template};

pub fn execute(template_path: PathBuf) -> Result<()> {
    let templates = if template_path.is_dir() {
        load_template_directory(&template_path)?
    } else {
        vec![parse_template(&template_path)?]
    };

    let mut total_warnings = 0;

    for template in &templates {
        println!(
            "Template: {} ({} domains, {} items)",
            template.name,
            template.domains.len(),
            template.items.len()
        );

        let warnings = validate_template(template);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if templates.is_empty() {
        println!("No templates found.");
    } else if total_warnings == 0 {
        println!("All templates valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
