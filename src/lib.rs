//! peer-attr-check - BGP peer-group attribute inheritance checker
//!
//! This library provides the attribute catalog, the scenario engine and an
//! in-process BGP configuration model to run it against.

pub mod backend;
pub mod bgp;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{CaseReport, TestState};
