//! Port traits for the external collaborators of the return calculator.

pub mod config_port;
pub mod price_port;
pub mod report_port;
pub mod store_port;
