// Adapters layer: concrete data sources behind the `DataSource` port.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileSource;
pub use memory::InMemorySource;
