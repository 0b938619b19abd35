pub mod datastore;
pub mod memory_datastore;
pub mod postgres_datastore;
