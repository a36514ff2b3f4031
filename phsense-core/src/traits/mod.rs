//! Collaborator traits
//!
//! These traits define the interface between the engine and the
//! hardware / output side of the host application.

pub mod report;
pub mod sampler;

pub use report::ReportSink;
pub use sampler::{PinId, SamplerError, VoltageSampler};
