//! Per-client configuration: connection options and the service descriptor.

pub mod descriptor;
pub mod options;

pub use descriptor::*;
pub use options::*;
