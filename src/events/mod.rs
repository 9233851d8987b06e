//! Event handling module.
//!
//! This module contains handlers for different types of events:
//! - Network events: option fetches, deployments and queries against the CRM
//! - Terminal events: User input and terminal interactions

pub mod network;
pub mod terminal;
