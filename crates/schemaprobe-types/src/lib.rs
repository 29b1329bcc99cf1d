//! Core data model for the schemaprobe consistency harness.
//!
//! Leaf crate: payload values, result envelopes, and the failure taxonomy.
//! No I/O lives here; everything is plain data with serde derives so that
//! run artifacts serialize deterministically.

pub mod envelope;
pub mod value;

pub use envelope::{ErrorCategory, ProbeEnvelope, ProbeOutcome};
pub use value::{FieldShape, FieldValue, Payload, payload_from_object};
