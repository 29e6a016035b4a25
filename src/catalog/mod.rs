//! Cohort catalog: definitions, validated snapshots, sources and the
//! hot-reloadable handle scoring reads through.
//!
//! ```rust
//! use stressmap::catalog::{BuiltinSource, CatalogHandle};
//!
//! let handle = CatalogHandle::load(BuiltinSource).unwrap();
//! let snapshot = handle.snapshot().unwrap();
//! assert!(snapshot.get(&snapshot.default_cohort().id).is_some());
//! ```

pub mod handle;
pub mod model;
pub mod snapshot;
pub mod source;

pub use handle::CatalogHandle;
pub use model::{
    normalize_name, AxisMatch, CohortDefinition, LikelihoodRatio, Powertrain, Prior, Region,
    StressorKind, VehicleClass,
};
pub use snapshot::{
    CatalogDocument, CatalogMetadata, CohortCatalogSnapshot, LIKELIHOOD_RATIO_RANGE, PRIOR_RANGE,
};
pub use source::{
    builtin_catalog, BuiltinSource, CatalogSource, JsonFileSource, StaticSource,
    BUILTIN_CATALOG_JSON,
};
