//! Error types for rule resolution and template loading.
//!
//! None of these abort a scoring run: callers record them, log them and
//! score the affected item as zero.

use thiserror::Error;

/// A stored scoring rule that cannot be turned into a usable `ScoringRule`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleConfigurationError {
    /// The rule document is not valid JSON or does not match any variant.
    #[error("malformed rule document: {0}")]
    Malformed(String),

    /// The `tipo` discriminator names a variant this engine does not know.
    #[error("unknown rule type: {0}")]
    UnknownType(String),

    /// A range rule without any band.
    #[error("range rule has no bands")]
    EmptyBands,

    /// A band with neither an inclusive upper bound nor an exclusive lower bound.
    #[error("band {index} has no bound")]
    UnboundedBand { index: usize },

    /// A band that can never match because earlier bands already cover it.
    #[error("band {index} is unreachable: earlier bands already match every value it covers")]
    UnreachableBand { index: usize },

    /// NaN or infinite number in a bound or a points value.
    #[error("non-finite number in field '{0}'")]
    NonFinite(&'static str),
}

/// Problems with an assessment template as a whole.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template has no domains, so nothing can be scored.
    #[error("template '{0}' defines no domains")]
    NoDomains(String),

    /// The template file extension is neither `.toml` nor `.json`.
    #[error("unsupported template format: {0}")]
    UnsupportedFormat(String),
}
