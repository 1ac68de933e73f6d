//! Core domain types and the pure return calculator.

pub mod price;
pub mod position;
pub mod returns;
pub mod closeout;
pub mod dashboard;
pub mod config_validation;
pub mod error;
