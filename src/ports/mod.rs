//! Port traits for the collaborators the core consumes.

pub mod account_port;
pub mod clock_port;
pub mod config_port;
pub mod data_port;
pub mod decision_port;
