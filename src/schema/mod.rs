//! Schema metadata: entity descriptors and the registry that serves them
//! to the generic record operations.

pub mod descriptor;
pub mod registry;

pub use descriptor::{EntityDescriptor, EntityKind, ForeignKeySpec};
pub use registry::{schema_registry, SchemaRegistry, OBJECTS, OUTCOMES, USERS};
