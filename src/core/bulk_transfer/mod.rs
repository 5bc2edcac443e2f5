pub mod coordinator;

pub use coordinator::{BulkTransferCoordinator, TransferPhase, PROGRESS_POLL_INTERVAL};
