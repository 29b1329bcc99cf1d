//! schemaprobe verification engine.
//!
//! The harness issues a fixed battery of natural-language queries against a
//! recipe-generation capability and characterizes how consistent the
//! returned schema is across independent generations. The pipeline:
//!
//! 1. [`adapter`] — one boundary over the two invocation strategies
//!    (in-process capability vs. HTTP endpoint); the only component aware
//!    of the transport distinction.
//! 2. [`census`] — per-field presence and shape statistics over successful
//!    payloads.
//! 3. [`classify`] — tallies of failures by category.
//! 4. [`report`] — the immutable run report: counts, coverage, critical
//!    fields, sample, and the full envelope list.
//! 5. [`driver`] — strictly sequential orchestration of the above.
//!
//! The engine performs no printing or persistence; callers render and store
//! the report.

pub mod adapter;
pub mod census;
pub mod classify;
pub mod driver;
pub mod report;

pub use adapter::{DirectAdapter, GenerationAdapter, GenerationFault, RecipeGenerator, RemoteAdapter};
pub use census::{FieldCensus, RESERVED_FIELDS};
pub use classify::ErrorClassifier;
pub use driver::{DriverState, RunDriver};
pub use report::{CriticalField, CriticalStatus, RunReport};
