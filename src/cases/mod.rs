//! Case suites
//!
//! The case model and the streaming source that decodes a suite file into
//! cases while they are being executed.

mod model;
mod source;

pub use model::*;
pub use source::{CaseSource, DEFAULT_QUEUE_CAPACITY};
