//! Engine configuration: analytics thresholds and user-facing copy.
//!
//! All prose the engine emits comes from [`ReportCopy`]; the analytics only
//! decide which bucket applies. Defaults are the academy's Portuguese copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analytics::{TREND_THRESHOLD, VARIATION_THRESHOLD};

/// Top-level cogscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period-over-period variation threshold (0–10 scale).
    pub variation_threshold: f64,
    /// First-versus-last trend threshold (0–10 scale).
    pub trend_threshold: f64,
    /// Default number of periods to look back for variation.
    pub periods_back: usize,
    /// Default number of recommendations to produce.
    pub recommendation_count: usize,
    pub copy: ReportCopy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variation_threshold: VARIATION_THRESHOLD,
            trend_threshold: TREND_THRESHOLD,
            periods_back: 3,
            recommendation_count: 2,
            copy: ReportCopy::default(),
        }
    }
}

/// Every user-facing string the engine can produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportCopy {
    /// Display names for domain ids; unknown ids are shown as-is.
    pub domain_names: HashMap<String, String>,
    pub trend: TrendCopy,
    pub narrative: NarrativeCopy,
    pub recommendations: RecommendationCopy,
}

impl ReportCopy {
    /// Display name for a domain id.
    pub fn domain_name<'a>(&'a self, domain_id: &'a str) -> &'a str {
        self.domain_names
            .get(domain_id)
            .map(String::as_str)
            .unwrap_or(domain_id)
    }
}

/// Encouragement messages, one per trend bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendCopy {
    pub improving: String,
    pub stable: String,
    pub declining: String,
    pub insufficient_data: String,
}

impl Default for TrendCopy {
    fn default() -> Self {
        Self {
            improving: "Excelente! O desempenho geral melhorou desde a primeira avaliação. Continue assim!".into(),
            stable: "O desempenho geral está estável desde a primeira avaliação. A constância é o caminho para novos avanços.".into(),
            declining: "O desempenho geral caiu desde a primeira avaliação. Vamos juntos retomar o ritmo!".into(),
            insufficient_data: "Ainda não há avaliações suficientes para identificar uma tendência.".into(),
        }
    }
}

/// Sentence templates for the period summary.
///
/// Placeholders: `{domains}` (joined domain names), `{months}` (period
/// length), `{rate}` (mean attendance, rounded).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeCopy {
    pub improving: String,
    pub stable_after_improving: String,
    pub stable_alone: String,
    pub declining: String,
    pub attendance_with_decline: String,
    pub attendance_high: String,
    pub attendance_low: String,
    pub neutral: String,
    /// Word joining the last two names of a list ("a, b e c").
    pub conjunction: String,
}

impl Default for NarrativeCopy {
    fn default() -> Self {
        Self {
            improving: "Nos últimos {months} meses, o aluno evoluiu em {domains}".into(),
            stable_after_improving: "Manteve-se estável em {domains}".into(),
            stable_alone: "Nos últimos {months} meses, o desempenho manteve-se estável em {domains}".into(),
            declining: "Houve queda em {domains}".into(),
            attendance_with_decline: "A queda coincide com a redução da frequência ({rate}%)".into(),
            attendance_high: "A frequência de {rate}% demonstra ótimo engajamento".into(),
            attendance_low: "A frequência de {rate}% pode estar contribuindo para o desempenho".into(),
            neutral: "Não há variações a relatar no período.".into(),
            conjunction: "e".into(),
        }
    }
}

/// Suggestion pools keyed by domain id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationCopy {
    pub pools: IndexMap<String, Vec<String>>,
    /// Used for domains without a pool of their own.
    pub fallback: Vec<String>,
}

impl RecommendationCopy {
    /// Candidate texts for a domain, falling back to the generic pool.
    pub fn pool_for(&self, domain_id: &str) -> &[String] {
        match self.pools.get(domain_id) {
            Some(pool) if !pool.is_empty() => pool,
            _ => &self.fallback,
        }
    }
}

impl Default for RecommendationCopy {
    fn default() -> Self {
        let mut pools = IndexMap::new();
        pools.insert(
            "atencao".to_string(),
            vec![
                "Pratique exercícios de atenção sustentada, como caça-palavras cronometrados.".to_string(),
                "Reserve sessões curtas e sem distrações para atividades de concentração.".to_string(),
                "Jogos de diferenças entre imagens ajudam a treinar a atenção aos detalhes.".to_string(),
            ],
        );
        pools.insert(
            "memoria".to_string(),
            vec![
                "Use sequências de cartas para exercitar a memória de trabalho.".to_string(),
                "Peça ao aluno que reconte histórias curtas com o máximo de detalhes.".to_string(),
                "Listas de palavras com evocação tardia fortalecem a memória.".to_string(),
            ],
        );
        pools.insert(
            "fluencia".to_string(),
            vec![
                "Leitura em voz alta diária melhora a fluência verbal.".to_string(),
                "Desafios de nomear palavras por categoria em um minuto estimulam a fluência.".to_string(),
                "Conversas guiadas sobre temas do cotidiano ampliam o vocabulário ativo.".to_string(),
            ],
        );
        pools.insert(
            "cultura".to_string(),
            vec![
                "Explore documentários curtos seguidos de conversa sobre o tema.".to_string(),
                "Quizzes de conhecimentos gerais tornam o estudo de cultura mais leve.".to_string(),
                "Visitas a museus virtuais ampliam o repertório cultural.".to_string(),
            ],
        );
        pools.insert(
            "raciocinio".to_string(),
            vec![
                "Quebra-cabeças lógicos e sudoku desenvolvem o raciocínio.".to_string(),
                "Problemas de sequência numérica estimulam o pensamento lógico.".to_string(),
                "Jogos de estratégia, como xadrez, exercitam o planejamento.".to_string(),
            ],
        );

        Self {
            pools,
            fallback: vec![
                "Reforce este domínio com atividades curtas e frequentes.".to_string(),
                "Inclua exercícios deste domínio no início de cada aula.".to_string(),
            ],
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `cogscore.toml` in the current directory
/// 2. `~/.config/cogscore/config.toml`
///
/// Environment variable overrides: `COGSCORE_PERIODS_BACK`, `COGSCORE_RECOMMENDATIONS`.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cogscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(value) = env_usize("COGSCORE_PERIODS_BACK") {
        config.periods_back = value;
    }
    if let Some(value) = env_usize("COGSCORE_RECOMMENDATIONS") {
        config.recommendation_count = value;
    }

    Ok(config)
}

/// Parse configuration text and check the thresholds are usable.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    anyhow::ensure!(
        config.variation_threshold.is_finite() && config.variation_threshold >= 0.0,
        "variation_threshold must be a non-negative number"
    );
    anyhow::ensure!(
        config.trend_threshold.is_finite() && config.trend_threshold >= 0.0,
        "trend_threshold must be a non-negative number"
    );
    Ok(config)
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring {name}={raw}: not a non-negative integer");
            None
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cogscore"))
}
