//! Terminal administration console for CRM custom fields.
//!
//! Field rows are authored against an attribute catalog, validated by a pure
//! reducer and turned into Tooling API payloads. Query results load into a
//! sortable, filterable grid.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod expression;
pub mod fields;
pub mod grid;
pub mod logger;
pub mod salesforce;
pub mod state;
pub mod ui;
