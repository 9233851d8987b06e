//! A single custom-field specification under construction.

use super::{AttrValue, Attribute, AttributeState, Catalog, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Process-local row identity, unique within a [`RowStore`](super::RowStore).
pub type RowKey = u64;

static NULL_VALUE: AttrValue = AttrValue::Null;

/// One authored custom-field row.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldRow {
    #[serde(rename = "_key")]
    pub key: RowKey,
    pub attributes: BTreeMap<Attribute, AttributeState>,
    #[serde(rename = "_allValid")]
    pub all_valid: bool,
    #[serde(rename = "_picklistGlobalValueSet")]
    pub picklist_global_value_set: bool,
    /// Last `fullName` produced from the label, if any.
    #[serde(skip)]
    pub(crate) derived_full_name: Option<String>,
}

impl FieldRow {
    /// Return a row holding the catalog default for every attribute.
    ///
    pub fn new(catalog: &Catalog, key: RowKey) -> Self {
        let attributes = Attribute::ALL
            .iter()
            .map(|a| (*a, AttributeState::new(catalog.definition(*a).default.clone())))
            .collect();
        FieldRow {
            key,
            attributes,
            all_valid: false,
            picklist_global_value_set: false,
            derived_full_name: None,
        }
    }

    /// Return the state of an attribute, if the row carries it.
    ///
    pub fn state(&self, attribute: Attribute) -> Option<&AttributeState> {
        self.attributes.get(&attribute)
    }

    /// Return a mutable state, inserting an empty one when missing.
    ///
    pub fn state_mut(&mut self, attribute: Attribute) -> &mut AttributeState {
        self.attributes
            .entry(attribute)
            .or_insert_with(|| AttributeState::new(AttrValue::Null))
    }

    pub fn value(&self, attribute: Attribute) -> &AttrValue {
        self.state(attribute).map(|s| &s.value).unwrap_or(&NULL_VALUE)
    }

    pub fn text(&self, attribute: Attribute) -> &str {
        self.value(attribute).as_str().unwrap_or("")
    }

    /// Set a value without touching it.
    ///
    pub fn set_value(&mut self, attribute: Attribute, value: impl Into<AttrValue>) {
        self.state_mut(attribute).value = value.into();
    }

    pub fn touch(&mut self, attribute: Attribute) {
        self.state_mut(attribute).touched = true;
    }

    pub fn touch_all(&mut self) {
        for state in self.attributes.values_mut() {
            state.touched = true;
        }
    }

    /// Return the parsed field type, or `None` when the `type` value is not
    /// a known type.
    ///
    pub fn field_type(&self) -> Option<FieldType> {
        match self.value(Attribute::Type) {
            AttrValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Whether the picklist source is the global value set.
    ///
    pub fn uses_global_value_set(&self) -> bool {
        self.picklist_global_value_set
    }

    /// Return the applicable attributes currently failing validation.
    ///
    /// Attributes left over from a previous field type keep their state but
    /// are not reported.
    ///
    pub fn errors(&self, catalog: &Catalog) -> Vec<(Attribute, &str)> {
        self.attributes
            .iter()
            .filter(|(a, s)| !s.is_valid && catalog.is_applicable(self, **a))
            .map(|(a, s)| (*a, s.error_message.as_deref().unwrap_or("")))
            .collect()
    }
}
