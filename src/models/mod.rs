pub mod bulk_transfer;
pub mod connection;
pub mod data_source;
pub mod mapping;
pub mod sync;
pub mod table;
pub mod timestamp;

pub use bulk_transfer::*;
pub use connection::*;
pub use data_source::*;
pub use mapping::*;
pub use sync::*;
pub use table::*;
