// Export modules for library usage
pub mod bayes;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod confidence;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod io;
pub mod matching;
pub mod severity;
pub mod stressors;

// Re-export commonly used types
pub use crate::catalog::{
    BuiltinSource, CatalogHandle, CatalogSource, CohortCatalogSnapshot, CohortDefinition,
    JsonFileSource, LikelihoodRatio, Powertrain, Prior, Region, StaticSource, StressorKind,
    VehicleClass,
};

pub use crate::config::{load_config, StressmapConfig};

pub use crate::context::{
    ContextProvider, InMemoryContextProvider, JsonContextProvider, VehicleContext,
};

pub use crate::engine::{
    BatchFailure, BatchReport, BatchSummary, RiskScoreResult, RiskScorer, ScoreMetadata,
};

pub use crate::errors::{Error, ErrorKind, Result, ResultExt};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::matching::{CohortMatchResult, CohortMatcher, MatchCriterion, RelaxationLevel};

pub use crate::severity::{SeverityLadder, SeverityTier};

pub use crate::stressors::{StressorEvaluation, StressorOrigin, StressorValidator};
