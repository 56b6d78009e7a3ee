//! `skuflow-recon` - catalog export / ticket reconciliation engine.
//!
//! Pure engine crate: receives loaded tables and a region configuration,
//! returns reports and output sheets. No CLI or IO dependencies.

pub mod engine;
pub mod error;
pub mod evidence;
pub mod family;
pub mod identity;
pub mod model;
pub mod predicate;
pub mod reconcile;
pub mod region;
pub mod rules;
pub mod schema;
pub mod table;

pub use engine::{filter_records, primary_child, retire, review, visibility, FilterMode, RetirementNote};
pub use error::{ConfigError, ReconError, TableError, TableRole};
pub use model::{MaintenanceResult, OutputSheet, ReviewResult};
pub use region::{Region, RegionConfig};
pub use table::{Cell, Table};
