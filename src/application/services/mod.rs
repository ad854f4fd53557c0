//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, DocumentStore)
//! but are themselves concrete structs, not traits.

mod frameworks;

pub use frameworks::{FrameworkCatalog, RejectedFramework};
