//! CLI command implementations.
//!
//! Available commands:
//! - **score**: Score a batch of vehicle contexts and write the report
//! - **catalog**: Validate a cohort catalog and summarize it
//! - **init**: Write a default `.stressmap.toml`

pub mod catalog;
pub mod init;
pub mod score;

pub use catalog::{describe_catalog, CatalogCommandConfig};
pub use init::{init_config, init_config_in};
pub use score::{fill_observation_defaults, score_contexts, ScoreConfig};
