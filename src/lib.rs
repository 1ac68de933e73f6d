//! rectrack: recommended-stock return tracker.
//!
//! Hexagonal architecture: the pure return calculator and its types live in
//! [`domain`], collaborator traits in [`ports`], concrete stores and report
//! writers in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
