//! Assessment template loading, rule resolution and validation.
//!
//! Templates are authored as TOML (or JSON with the same shape). Each item
//! carries its stored rule document under `regra`; documents are resolved
//! into [`ScoringRule`]s once, here, and never re-parsed while scoring.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{RuleConfigurationError, TemplateError};
use crate::model::{Domain, Item};
use crate::rules::ScoringRule;

/// On-disk template layout.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    template: TemplateHeader,
    #[serde(default)]
    domains: Vec<Domain>,
    #[serde(default)]
    items: Vec<ItemDefinition>,
}

#[derive(Debug, Deserialize)]
struct TemplateHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// An item as stored, with its rule still in document form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub domain_id: String,
    #[serde(rename = "regra")]
    pub rule: serde_json::Value,
}

/// A published assessment template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub domains: Vec<Domain>,
    pub items: Vec<ItemDefinition>,
}

/// An item whose stored rule could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedItem {
    pub item_id: String,
    pub domain_id: String,
    pub error: RuleConfigurationError,
}

/// A template with every rule resolved, ready for scoring.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub id: String,
    pub name: String,
    pub domains: Vec<Domain>,
    pub items: Vec<Item>,
    /// Items left out of `items` because their rule is unusable.
    pub rejected: Vec<RejectedItem>,
}

impl AssessmentTemplate {
    /// Resolve every stored rule. Unusable rules are logged and collected in
    /// `rejected`; they never fail the template as a whole.
    pub fn resolve(&self) -> ResolvedTemplate {
        let mut items = Vec::with_capacity(self.items.len());
        let mut rejected = Vec::new();

        for def in &self.items {
            match ScoringRule::from_value(def.rule.clone()) {
                Ok(rule) => items.push(Item {
                    id: def.id.clone(),
                    domain_id: def.domain_id.clone(),
                    rule,
                }),
                Err(error) => {
                    tracing::warn!(
                        template = %self.id,
                        item = %def.id,
                        "rejecting item rule: {error}"
                    );
                    rejected.push(RejectedItem {
                        item_id: def.id.clone(),
                        domain_id: def.domain_id.clone(),
                        error,
                    });
                }
            }
        }

        ResolvedTemplate {
            id: self.id.clone(),
            name: self.name.clone(),
            domains: self.domains.clone(),
            items,
            rejected,
        }
    }
}

impl ResolvedTemplate {
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn domain(&self, domain_id: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id == domain_id)
    }

    pub fn is_rejected(&self, item_id: &str) -> bool {
        self.rejected.iter().any(|r| r.item_id == item_id)
    }
}

/// Parse a template file; the format follows the extension (`.toml` or `.json`).
pub fn parse_template(path: &Path) -> Result<AssessmentTemplate> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template file: {}", path.display()))?;

    parse_template_str(&content, path)
}

/// Parse template text (useful for testing). `source_path` selects the format.
pub fn parse_template_str(content: &str, source_path: &Path) -> Result<AssessmentTemplate> {
    let extension = source_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let parsed: TemplateFile = match extension.as_str() {
        "toml" => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
        "json" => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
        other => return Err(TemplateError::UnsupportedFormat(other.to_string()).into()),
    };

    if parsed.domains.is_empty() {
        return Err(TemplateError::NoDomains(parsed.template.id).into());
    }

    Ok(AssessmentTemplate {
        id: parsed.template.id,
        name: parsed.template.name,
        description: parsed.template.description,
        domains: parsed.domains,
        items: parsed.items,
    })
}

/// Recursively load every `.toml` and `.json` template in a directory.
pub fn load_template_directory(dir: &Path) -> Result<Vec<AssessmentTemplate>> {
    let mut templates = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            templates.extend(load_template_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_template(&path) {
                Ok(template) => templates.push(template),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(templates)
}

/// A warning from template validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a template for authoring problems.
pub fn validate_template(template: &AssessmentTemplate) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let resolved = template.resolve();

    let mut seen_domains = HashSet::new();
    for domain in &template.domains {
        if !seen_domains.insert(domain.id.as_str()) {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("duplicate domain ID: {}", domain.id),
            });
        }
        if domain.max_points <= 0.0 {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!(
                    "domain '{}' has max_points {} and will always normalize to 0",
                    domain.id, domain.max_points
                ),
            });
        }
    }

    let mut seen_items = HashSet::new();
    for item in &template.items {
        if !seen_items.insert(item.id.as_str()) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
        if !seen_domains.contains(item.domain_id.as_str()) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("unknown domain '{}'", item.domain_id),
            });
        }
    }

    for rejected in &resolved.rejected {
        warnings.push(ValidationWarning {
            item_id: Some(rejected.item_id.clone()),
            message: format!("rule rejected: {}", rejected.error),
        });
    }

    for domain in &template.domains {
        let domain_items: Vec<&Item> = resolved
            .items
            .iter()
            .filter(|i| i.domain_id == domain.id)
            .collect();
        let has_rejected = resolved.rejected.iter().any(|r| r.domain_id == domain.id);

        if domain_items.is_empty() && !has_rejected {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("domain '{}' has no items", domain.id),
            });
            continue;
        }

        if has_rejected {
            continue;
        }

        let attainable: f64 = domain_items.iter().map(|i| i.rule.max_points()).sum();
        if (attainable - domain.max_points).abs() > 1e-9 {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!(
                    "domain '{}' declares max_points {} but its items can award at most {}",
                    domain.id, domain.max_points, attainable
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[template]
id = "triagem"
name = "Triagem cognitiva"
description = "Avaliação de entrada"

[[domains]]
id = "atencao"
name = "Atenção"
max_points = 3

[[domains]]
id = "memoria"
name = "Memória"
max_points = 2

[[items]]
id = "a1"
domain_id = "atencao"
regra = { tipo = "faixas", faixas = [{ ate = 5, pontos = 1 }, { acima = 5, pontos = 2 }] }

[[items]]
id = "a2"
domain_id = "atencao"
regra = { tipo = "sim_nao", pontos_sim = 1, pontos_nao = 0 }

[[items]]
id = "m1"
domain_id = "memoria"
regra = { tipo = "alternativa_correta", correta = "b", pontos_correta = 2, pontos_errada = 0 }
"#;

    #[test]
    fn parse_valid_toml() {
        let template = parse_template_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        assert_eq!(template.id, "triagem");
        assert_eq!(template.domains.len(), 2);
        assert_eq!(template.domains[0].max_points, 3.0);
        assert_eq!(template.items.len(), 3);

        let resolved = template.resolve();
        assert!(resolved.rejected.is_empty());
        assert_eq!(resolved.item("m1").unwrap().rule.kind(), "alternativa_correta");
        assert!(validate_template(&template).is_empty());
    }

    #[test]
    fn parse_json_template() {
        let json = r#"{
            "template": {"id": "j", "name": "JSON"},
            "domains": [{"id": "d", "name": "D", "max_points": 1}],
            "items": [{"id": "i", "domain_id": "d", "regra": {"tipo": "sim_nao", "pontos_sim": 1, "pontos_nao": 0}}]
        }"#;
        let template = parse_template_str(json, &PathBuf::from("t.json")).unwrap();
        assert_eq!(template.resolve().items.len(), 1);
    }

    #[test]
    fn authored_rule_document_is_kept_verbatim() {
        let rule = r#"{"pontos_nao":0,"tipo":"sim_nao","pontos_sim":1}"#;
        let json = format!(
            r#"{{"template":{{"id":"j","name":"JSON"}},"domains":[{{"id":"d","name":"D","max_points":1}}],"items":[{{"id":"i","domain_id":"d","regra":{rule}}}]}}"#
        );
        let template = parse_template_str(&json, &PathBuf::from("t.json")).unwrap();
        assert_eq!(serde_json::to_string(&template.items[0].rule).unwrap(), rule);
        assert!(template.resolve().rejected.is_empty());
    }

    #[test]
    fn rule_with_unknown_field_is_rejected() {
        let json = r#"{
            "template": {"id": "j", "name": "JSON"},
            "domains": [{"id": "d", "name": "D", "max_points": 1}],
            "items": [{"id": "i", "domain_id": "d", "regra": {"tipo": "sim_nao", "pontos_sim": 1, "pontos_nao": 0, "descricao": "x"}}]
        }"#;
        let template = parse_template_str(json, &PathBuf::from("t.json")).unwrap();
        let resolved = template.resolve();
        assert!(resolved.items.is_empty());
        assert_eq!(resolved.rejected.len(), 1);
    }

    #[test]
    fn bad_rule_is_rejected_not_fatal() {
        let toml = r#"
[template]
id = "quebrado"
name = "Quebrado"

[[domains]]
id = "d"
name = "D"
max_points = 1

[[items]]
id = "ok"
domain_id = "d"
regra = { tipo = "sim_nao", pontos_sim = 1, pontos_nao = 0 }

[[items]]
id = "bad"
domain_id = "d"
regra = { tipo = "escala", minimo = 0 }
"#;
        let template = parse_template_str(toml, &PathBuf::from("t.toml")).unwrap();
        let resolved = template.resolve();
        assert_eq!(resolved.items.len(), 1);
        assert!(resolved.is_rejected("bad"));
        assert_eq!(
            resolved.rejected[0].error,
            RuleConfigurationError::UnknownType("escala".into())
        );

        let warnings = validate_template(&template);
        assert!(warnings.iter().any(|w| w.message.contains("rule rejected")));
    }

    #[test]
    fn template_without_domains_is_an_error() {
        let toml = r#"
[template]
id = "vazio"
name = "Vazio"
"#;
        let err = parse_template_str(toml, &PathBuf::from("t.toml")).unwrap_err();
        assert!(err.to_string().contains("defines no domains"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = parse_template_str(VALID_TOML, &PathBuf::from("t.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported template format"));
    }

    #[test]
    fn validate_reports_authoring_problems() {
        let toml = r#"
[template]
id = "problemas"
name = "Problemas"

[[domains]]
id = "d"
name = "D"
max_points = 5

[[domains]]
id = "sem_itens"
name = "Sem itens"
max_points = 0

[[items]]
id = "i1"
domain_id = "d"
regra = { tipo = "sim_nao", pontos_sim = 1, pontos_nao = 0 }

[[items]]
id = "i1"
domain_id = "fantasma"
regra = { tipo = "sim_nao", pontos_sim = 1, pontos_nao = 0 }
"#;
        let template = parse_template_str(toml, &PathBuf::from("t.toml")).unwrap();
        let messages: Vec<String> = validate_template(&template)
            .into_iter()
            .map(|w| w.message)
            .collect();

        assert!(messages.iter().any(|m| m.contains("duplicate item ID")));
        assert!(messages.iter().any(|m| m.contains("unknown domain 'fantasma'")));
        assert!(messages.iter().any(|m| m.contains("'sem_itens' has no items")));
        assert!(messages.iter().any(|m| m.contains("always normalize to 0")));
        assert!(messages.iter().any(|m| m.contains("can award at most 1")));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let result = parse_template_str("this is not [valid toml }{", &PathBuf::from("t.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("triagem.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[template\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let templates = load_template_directory(dir.path()).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, "triagem");
    }
}
