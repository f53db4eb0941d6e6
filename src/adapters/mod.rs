//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod decision_file;
pub mod file_config_adapter;
pub mod system_clock;
