pub mod poller;
pub mod rules;

pub use poller::{SyncDashboard, SyncStatusPoller};
pub use rules::SyncRuleService;
