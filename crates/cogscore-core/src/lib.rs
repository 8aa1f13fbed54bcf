//! cogscore-core: assessment scoring and longitudinal analytics.
//!
//! Turns raw item responses into normalized domain scores and an overall
//! score, and derives variation, trend, narrative and recommendation output
//! from a time series of previously computed scores. Scoring and analytics
//! are pure functions; only the loaders in `template`, `config` and `report`
//! touch the filesystem.

pub mod analytics;
pub mod config;
pub mod error;
pub mod model;
pub mod narrative;
pub mod recommend;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod template;
