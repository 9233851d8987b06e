//! Application state management module.
//!
//! This module contains the core state management for the application, including:
//! - Main `State` struct wrapping the field row store and the query grid
//! - Navigation types (View, Focus, prompts and notifications)
//! - `Draft` snapshots used for unsaved-change tracking
//! - State error handling

mod draft;
mod error;
mod navigation;
mod state_impl;

pub use draft::Draft;
pub use error::StateError;
pub use navigation::{
    EditBuffer, Focus, InputTarget, Notification, NotificationLevel, OptionPicker, View,
};
pub use state_impl::State;
