pub mod coordinator;
pub mod draft;
pub mod joins;

pub use coordinator::MappingCoordinator;
pub use draft::{validate_mapping, MappingDraft, MappingStage, SchemaSnapshot};
pub use joins::derive_on_condition;
