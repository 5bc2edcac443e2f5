pub mod registry;

pub use registry::DataSourceRegistry;
