//! Object fetching built on top of the Face.
//!
//! [`segment::fetch`] discovers the latest version and walks segments one
//! at a time; [`pipeline::fetch`] keeps a congestion-controlled window of
//! Interests in flight for throughput.

pub mod pipeline;
pub mod segment;

pub use pipeline::{PipelineAction, PipelineState};
