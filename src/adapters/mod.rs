pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_adapter;
pub mod sqlite_adapter;
pub mod web;
