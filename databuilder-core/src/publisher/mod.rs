//! Publishers shipped with the core crate.

pub mod cypher;
pub mod noop;

pub use cypher::{CypherScriptPublisher, CypherScriptPublisherConfig};
pub use noop::NoopPublisher;
