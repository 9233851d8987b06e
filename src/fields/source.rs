//! Asynchronous option sources for picklist attributes.
//!
//! A [`ValueSource`] is the capability the catalog calls when an attribute's
//! options live on the remote platform. The shipped implementations sit on
//! top of [`Salesforce`]; tests inject fixed lists instead.

use super::Attribute;
use super::RowKey;
use crate::salesforce::{SObjectSummary, Salesforce};
use futures::future::{BoxFuture, FutureExt};
use log::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One selectable option.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Identifies the control asking for options.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceContext {
    pub row_key: RowKey,
    pub attribute: Attribute,
}

impl SourceContext {
    pub fn new(row_key: RowKey, attribute: Attribute) -> Self {
        SourceContext { row_key, attribute }
    }
}

/// Produces options for a remote-backed attribute.
///
pub trait ValueSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        ctx: &'a SourceContext,
    ) -> BoxFuture<'a, anyhow::Result<Vec<SelectOption>>>;
}

/// Suffixes of system association objects that cannot be lookup targets.
const EXCLUDED_SUFFIXES: [&str; 5] = ["Share", "History", "Feed", "ChangeEvent", "Tag"];

/// Keep objects a custom relationship can point at.
///
pub fn referenceable(objects: Vec<SObjectSummary>) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = objects
        .into_iter()
        .filter(|o| o.queryable && o.triggerable)
        .filter(|o| !EXCLUDED_SUFFIXES.iter().any(|s| o.name.ends_with(s)))
        .map(|o| SelectOption::new(o.name, o.label))
        .collect();
    options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    options
}

/// Lists objects that relationship fields may reference.
///
pub struct ReferenceObjectsSource {
    salesforce: Arc<Salesforce>,
}

impl ReferenceObjectsSource {
    pub fn new(salesforce: Arc<Salesforce>) -> Self {
        ReferenceObjectsSource { salesforce }
    }
}

impl ValueSource for ReferenceObjectsSource {
    fn fetch<'a>(
        &'a self,
        ctx: &'a SourceContext,
    ) -> BoxFuture<'a, anyhow::Result<Vec<SelectOption>>> {
        async move {
            debug!("Loading reference objects for row {}...", ctx.row_key);
            let objects = self.salesforce.describe_objects().await?;
            Ok(referenceable(objects))
        }
        .boxed()
    }
}

/// Lists the org's global picklist value sets.
///
pub struct GlobalValueSetSource {
    salesforce: Arc<Salesforce>,
}

impl GlobalValueSetSource {
    pub fn new(salesforce: Arc<Salesforce>) -> Self {
        GlobalValueSetSource { salesforce }
    }
}

impl ValueSource for GlobalValueSetSource {
    fn fetch<'a>(
        &'a self,
        ctx: &'a SourceContext,
    ) -> BoxFuture<'a, anyhow::Result<Vec<SelectOption>>> {
        async move {
            debug!("Loading global value sets for row {}...", ctx.row_key);
            let sets = self.salesforce.global_value_sets().await?;
            Ok(sets
                .into_iter()
                .map(|s| SelectOption::new(s.developer_name, s.master_label))
                .collect())
        }
        .boxed()
    }
}
