pub mod bulk_transfer;
pub mod connections;
pub mod datasources;
pub mod mappings;
pub mod polling;
pub mod sync;
