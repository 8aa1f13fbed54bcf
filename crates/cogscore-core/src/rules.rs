//! Scoring rules and the rule evaluator.
//!
//! A rule is stored as a JSON document discriminated by its `tipo` field:
//!
//! ```json
//! {"tipo":"faixas","faixas":[{"ate":5,"pontos":1},{"acima":5,"pontos":2}]}
//! {"tipo":"sim_nao","pontos_sim":1,"pontos_nao":0}
//! {"tipo":"mapa","mapa":{"A":2,"B":1}}
//! {"tipo":"alternativa_correta","correta":"b","pontos_correta":1,"pontos_errada":0}
//! ```
//!
//! Documents are resolved into [`ScoringRule`] once, at template load time,
//! and validated on the way in. Evaluating a resolved rule cannot fail.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RuleConfigurationError;

const KNOWN_TYPES: [&str; 4] = ["faixas", "sim_nao", "mapa", "alternativa_correta"];

/// Raw values a boolean rule accepts as "yes" (after trimming and lowercasing).
const TRUTHY: [&str; 4] = ["sim", "s", "true", "1"];

/// How a single item response is turned into points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum ScoringRule {
    /// Numeric answer matched against ordered bands; first match wins.
    #[serde(rename = "faixas")]
    Range {
        #[serde(rename = "faixas")]
        bands: Vec<RangeBand>,
    },

    /// Yes/no answer.
    #[serde(rename = "sim_nao")]
    Boolean {
        #[serde(rename = "pontos_sim", serialize_with = "serialize_points")]
        points_if_true: f64,
        #[serde(rename = "pontos_nao", serialize_with = "serialize_points")]
        points_if_false: f64,
    },

    /// Exact answer string looked up in a table.
    #[serde(rename = "mapa")]
    Lookup {
        #[serde(rename = "mapa", serialize_with = "serialize_points_map")]
        points_by_answer: IndexMap<String, f64>,
    },

    /// Multiple choice with one correct alternative.
    #[serde(rename = "alternativa_correta")]
    ExactMatch {
        #[serde(rename = "correta")]
        correct_answer: String,
        #[serde(rename = "pontos_correta", serialize_with = "serialize_points")]
        points_if_correct: f64,
        #[serde(rename = "pontos_errada", serialize_with = "serialize_points")]
        points_if_incorrect: f64,
    },
}

/// One band of a range rule.
///
/// A band matches a value `v` when `v <= upper_bound` or `v > lower_bound_exclusive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    #[serde(
        rename = "ate",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_points"
    )]
    pub upper_bound: Option<f64>,
    #[serde(
        rename = "acima",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_points"
    )]
    pub lower_bound_exclusive: Option<f64>,
    #[serde(rename = "pontos", serialize_with = "serialize_points")]
    pub points: f64,
}

impl RangeBand {
    pub fn up_to(upper_bound: f64, points: f64) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            lower_bound_exclusive: None,
            points,
        }
    }

    pub fn above(lower_bound_exclusive: f64, points: f64) -> Self {
        Self {
            upper_bound: None,
            lower_bound_exclusive: Some(lower_bound_exclusive),
            points,
        }
    }

    fn matches(&self, value: f64) -> bool {
        self.upper_bound.is_some_and(|upper| value <= upper)
            || self.lower_bound_exclusive.is_some_and(|lower| value > lower)
    }
}

impl ScoringRule {
    /// Parse and validate a stored rule document.
    pub fn from_json(document: &str) -> Result<Self, RuleConfigurationError> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| RuleConfigurationError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Resolve an already-decoded rule document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RuleConfigurationError> {
        let tipo = value
            .get("tipo")
            .ok_or_else(|| RuleConfigurationError::Malformed("missing 'tipo' field".into()))?
            .as_str()
            .ok_or_else(|| RuleConfigurationError::Malformed("'tipo' must be a string".into()))?;

        if !KNOWN_TYPES.contains(&tipo) {
            return Err(RuleConfigurationError::UnknownType(tipo.to_string()));
        }
        reject_unknown_fields(&value, tipo)?;

        let rule: ScoringRule = serde_json::from_value(value)
            .map_err(|e| RuleConfigurationError::Malformed(e.to_string()))?;
        rule.validate()?;
        Ok(rule)
    }

    /// Serialize in the canonical stored layout: `tipo` first, then the
    /// variant's fields in declaration order. Templates keep the authored
    /// document verbatim in `ItemDefinition::rule`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Stored discriminator for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringRule::Range { .. } => "faixas",
            ScoringRule::Boolean { .. } => "sim_nao",
            ScoringRule::Lookup { .. } => "mapa",
            ScoringRule::ExactMatch { .. } => "alternativa_correta",
        }
    }

    /// Reject configurations whose outcome would depend on authoring accidents.
    pub fn validate(&self) -> Result<(), RuleConfigurationError> {
        match self {
            ScoringRule::Range { bands } => validate_bands(bands),
            ScoringRule::Boolean {
                points_if_true,
                points_if_false,
            } => {
                ensure_finite(*points_if_true, "pontos_sim")?;
                ensure_finite(*points_if_false, "pontos_nao")
            }
            ScoringRule::Lookup { points_by_answer } => points_by_answer
                .values()
                .try_for_each(|points| ensure_finite(*points, "mapa")),
            ScoringRule::ExactMatch {
                points_if_correct,
                points_if_incorrect,
                ..
            } => {
                ensure_finite(*points_if_correct, "pontos_correta")?;
                ensure_finite(*points_if_incorrect, "pontos_errada")
            }
        }
    }

    /// Highest number of points any answer can earn under this rule.
    pub fn max_points(&self) -> f64 {
        match self {
            ScoringRule::Range { bands } => {
                let best = bands
                    .iter()
                    .map(|b| b.points)
                    .fold(f64::NEG_INFINITY, f64::max);
                // Values matched by no band score zero.
                if covers_every_value(bands) {
                    best
                } else {
                    best.max(0.0)
                }
            }
            ScoringRule::Boolean {
                points_if_true,
                points_if_false,
            } => points_if_true.max(*points_if_false),
            ScoringRule::Lookup { points_by_answer } => {
                points_by_answer.values().copied().fold(0.0, f64::max)
            }
            ScoringRule::ExactMatch {
                points_if_correct,
                points_if_incorrect,
                ..
            } => points_if_correct.max(*points_if_incorrect),
        }
    }
}

/// Score one raw response against a resolved rule.
pub fn evaluate(raw_value: &str, rule: &ScoringRule) -> f64 {
    match rule {
        ScoringRule::Range { bands } => {
            let Some(value) = parse_number(raw_value) else {
                return 0.0;
            };
            bands
                .iter()
                .find(|band| band.matches(value))
                .map(|band| band.points)
                .unwrap_or(0.0)
        }
        ScoringRule::Boolean {
            points_if_true,
            points_if_false,
        } => {
            let answer = raw_value.trim().to_lowercase();
            if TRUTHY.contains(&answer.as_str()) {
                *points_if_true
            } else {
                *points_if_false
            }
        }
        ScoringRule::Lookup { points_by_answer } => {
            points_by_answer.get(raw_value).copied().unwrap_or(0.0)
        }
        ScoringRule::ExactMatch {
            correct_answer,
            points_if_correct,
            points_if_incorrect,
        } => {
            if raw_value.trim().to_lowercase() == correct_answer.trim().to_lowercase() {
                *points_if_correct
            } else {
                *points_if_incorrect
            }
        }
    }
}

/// Parse a numeric answer. Accepts a decimal comma ("7,5"); rejects NaN and infinities.
fn parse_number(raw_value: &str) -> Option<f64> {
    let trimmed = raw_value.trim();
    let parsed = match trimmed.parse::<f64>() {
        Ok(v) => v,
        Err(_) => trimmed.replacen(',', ".", 1).parse::<f64>().ok()?,
    };
    parsed.is_finite().then_some(parsed)
}

/// Fields a stored document may carry, per `tipo`.
fn allowed_fields(tipo: &str) -> &'static [&'static str] {
    match tipo {
        "faixas" => &["tipo", "faixas"],
        "sim_nao" => &["tipo", "pontos_sim", "pontos_nao"],
        "mapa" => &["tipo", "mapa"],
        _ => &["tipo", "correta", "pontos_correta", "pontos_errada"],
    }
}

const BAND_FIELDS: [&str; 3] = ["ate", "acima", "pontos"];

/// Fields the engine does not understand would be lost on re-serialization,
/// so they make the document malformed.
fn reject_unknown_fields(
    value: &serde_json::Value,
    tipo: &str,
) -> Result<(), RuleConfigurationError> {
    ensure_known_keys(value, allowed_fields(tipo), tipo)?;
    if let Some(bands) = value.get("faixas").and_then(serde_json::Value::as_array) {
        for (index, band) in bands.iter().enumerate() {
            ensure_known_keys(band, &BAND_FIELDS, &format!("band {index}"))?;
        }
    }
    Ok(())
}

fn ensure_known_keys(
    value: &serde_json::Value,
    allowed: &[&str],
    context: &str,
) -> Result<(), RuleConfigurationError> {
    // Shape errors are reported by deserialization.
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(RuleConfigurationError::Malformed(format!(
            "unknown field '{key}' in {context}"
        ))),
        None => Ok(()),
    }
}

fn ensure_finite(value: f64, field: &'static str) -> Result<(), RuleConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RuleConfigurationError::NonFinite(field))
    }
}

fn validate_bands(bands: &[RangeBand]) -> Result<(), RuleConfigurationError> {
    if bands.is_empty() {
        return Err(RuleConfigurationError::EmptyBands);
    }

    // Earlier bands match (-inf, covered_up_to] and (covered_above, +inf).
    let mut covered_up_to = f64::NEG_INFINITY;
    let mut covered_above = f64::INFINITY;

    for (index, band) in bands.iter().enumerate() {
        ensure_finite(band.points, "pontos")?;
        if let Some(upper) = band.upper_bound {
            ensure_finite(upper, "ate")?;
        }
        if let Some(lower) = band.lower_bound_exclusive {
            ensure_finite(lower, "acima")?;
        }

        if band.upper_bound.is_none() && band.lower_bound_exclusive.is_none() {
            return Err(RuleConfigurationError::UnboundedBand { index });
        }

        // (-inf, u] adds values iff (covered_up_to, min(u, covered_above)] is non-empty.
        let upper_reachable = band
            .upper_bound
            .is_some_and(|u| u.min(covered_above) > covered_up_to);
        // (l, +inf) adds values iff (max(l, covered_up_to), covered_above] is non-empty.
        let lower_reachable = band
            .lower_bound_exclusive
            .is_some_and(|l| covered_above > l.max(covered_up_to));

        if !upper_reachable && !lower_reachable {
            return Err(RuleConfigurationError::UnreachableBand { index });
        }

        if let Some(u) = band.upper_bound {
            covered_up_to = covered_up_to.max(u);
        }
        if let Some(l) = band.lower_bound_exclusive {
            covered_above = covered_above.min(l);
        }
    }

    Ok(())
}

fn covers_every_value(bands: &[RangeBand]) -> bool {
    let up_to = bands
        .iter()
        .filter_map(|b| b.upper_bound)
        .fold(f64::NEG_INFINITY, f64::max);
    let above = bands
        .iter()
        .filter_map(|b| b.lower_bound_exclusive)
        .fold(f64::INFINITY, f64::min);
    up_to >= above
}

// ---------------------------------------------------------------------------
// Stored number format: integral values are written without a fraction.
// ---------------------------------------------------------------------------

struct Points(f64);

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

fn serialize_points<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    Points(*value).serialize(serializer)
}

fn serialize_optional_points<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => Points(*v).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

fn serialize_points_map<S: Serializer>(
    value: &IndexMap<String, f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(value.iter().map(|(answer, points)| (answer, Points(*points))))
}
