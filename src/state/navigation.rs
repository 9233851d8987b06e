//! Navigation-related state types.
//!
//! This module contains enums and types related to views, focus, and the
//! transient prompts that sit on top of them.

use crate::fields::{Attribute, RowKey, SelectOption};

/// Specifying the different views.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum View {
    Wizard,
    Payload,
    Query,
}

impl View {
    /// Return the view after this one when cycling with Tab.
    ///
    pub fn next(&self) -> View {
        match self {
            View::Wizard => View::Payload,
            View::Payload => View::Query,
            View::Query => View::Wizard,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Wizard => "Fields",
            View::Payload => "Payload",
            View::Query => "Query",
        }
    }
}

/// Specifying the different foci within the wizard.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Focus {
    Rows,
    Attributes,
}

/// What a text prompt is collecting.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InputTarget {
    Attribute(Attribute),
    ImportPath,
    ExportPath,
    Soql,
    GridFilter,
    GridCell,
}

/// Text being typed by the user.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EditBuffer {
    pub target: InputTarget,
    pub text: String,
    /// Enter inserts a newline instead of submitting.
    pub multiline: bool,
}

/// An open option list for a picklist or radio attribute.
///
/// The token identifies this particular opening; options fetched for an
/// older token are dropped.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OptionPicker {
    pub token: u64,
    pub row_key: RowKey,
    pub attribute: Attribute,
    pub options: Option<Vec<SelectOption>>,
    pub index: usize,
}

/// Severity of a notification.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A dismissible message shown above the footer.
///
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}
