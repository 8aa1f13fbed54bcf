//! The `cogscore init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("cogscore.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("templates").context("failed to create templates directory")?;
    write_if_missing(Path::new("templates/example.toml"), EXAMPLE_TEMPLATE)?;

    println!("\nNext steps:");
    println!("  1. Adjust thresholds and copy in cogscore.toml");
    println!("  2. Run: cogscore validate --template templates/example.toml");
    println!("  3. Run: cogscore score --template templates/example.toml --responses respostas.json");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cogscore configuration

# Period-over-period change (0-10 scale) needed to count as improving/declining.
variation_threshold = 1.0
# First-versus-last change needed for the overall trend.
trend_threshold = 0.5
periods_back = 3
recommendation_count = 2

[copy.domain_names]
atencao = "Atenção"
memoria = "Memória"
fluencia = "Fluência"
cultura = "Cultura"
raciocinio = "Raciocínio"

# Every message can be overridden, e.g.:
# [copy.trend]
# improving = "Excelente evolução!"
#
# [copy.recommendations.pools]
# atencao = ["Pratique caça-palavras cronometrados."]
"#;

const EXAMPLE_TEMPLATE: &str = include_str!("../../../../templates/example.toml");
