// CDC control plane library
// Drives the pipeline backend: connections, mappings, bulk transfers and sync status

pub mod api;
pub mod core;
pub mod models;
pub mod utils;

// Re-export commonly used types for convenience
pub use api::{CdcBackend, HttpBackend};
pub use crate::core::{
    bulk_transfer::BulkTransferCoordinator,
    connections::{ConnectionConfigBuilder, ConnectionService, TypedConnectionConfig},
    datasources::DataSourceRegistry,
    mappings::{MappingCoordinator, MappingDraft},
    sync::{SyncRuleService, SyncStatusPoller},
};

pub use utils::{CdcError, CdcResult, Config, ValidationError};
