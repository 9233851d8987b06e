//! Row mutation reducer.
//!
//! Every transition consumes the current [`RowStore`] snapshot and returns
//! its replacement, running the validity reducer on the way out. The key
//! counter lives in the store itself so separate stores never share state.

use super::naming::api_name_from_label;
use super::validity::validate;
use super::{AttrValue, Attribute, Catalog, FieldRow, FieldsError, RowKey};
use log::*;
use serde::{Deserialize, Serialize};

/// Names accepted by [`Action::from_json`].
pub const ACTION_NAMES: [&str; 8] = [
    "ADD",
    "IMPORT",
    "CLONE",
    "CHANGE",
    "TOUCH",
    "DELETE",
    "PICKLIST_OPTION_CHANGED",
    "RESET",
];

/// A row mutation.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Add,
    Import {
        rows: Vec<FieldRow>,
    },
    #[serde(rename = "CLONE")]
    CloneRow {
        key: RowKey,
    },
    Change {
        key: RowKey,
        attribute: Attribute,
        value: AttrValue,
    },
    Touch {
        key: RowKey,
        attribute: Attribute,
    },
    Delete {
        key: RowKey,
    },
    PicklistOptionChanged {
        key: RowKey,
        global: bool,
    },
    Reset,
}

impl Action {
    /// Return the wire name of the action.
    ///
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add => "ADD",
            Action::Import { .. } => "IMPORT",
            Action::CloneRow { .. } => "CLONE",
            Action::Change { .. } => "CHANGE",
            Action::Touch { .. } => "TOUCH",
            Action::Delete { .. } => "DELETE",
            Action::PicklistOptionChanged { .. } => "PICKLIST_OPTION_CHANGED",
            Action::Reset => "RESET",
        }
    }

    /// Decode an action addressed by name, e.g.
    /// `{"type": "DELETE", "key": 3}`. An unrecognized name is a programming
    /// error and is reported as [`FieldsError::UnknownAction`].
    ///
    pub fn from_json(value: serde_json::Value) -> Result<Action, FieldsError> {
        let name = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();
        if !ACTION_NAMES.contains(&name.as_str()) {
            return Err(FieldsError::UnknownAction(name));
        }
        serde_json::from_value(value).map_err(|e| FieldsError::InvalidPayload {
            action: name,
            message: e.to_string(),
        })
    }
}

/// The authored rows and the key counter.
///
#[derive(Clone, Debug, PartialEq)]
pub struct RowStore {
    pub current_key: RowKey,
    pub rows: Vec<FieldRow>,
    pub all_valid: bool,
}

impl RowStore {
    /// Return a store holding one validated default row with key 0.
    ///
    pub fn new(catalog: &Catalog) -> Self {
        let validation = validate(catalog, vec![FieldRow::new(catalog, 0)]);
        RowStore {
            current_key: 0,
            rows: validation.rows,
            all_valid: validation.all_valid,
        }
    }

    pub fn row(&self, key: RowKey) -> Option<&FieldRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.key == key)
    }

    /// Apply an action and revalidate.
    ///
    pub fn reduce(self, catalog: &Catalog, action: Action) -> RowStore {
        trace!("Reducing field row action {}...", action.name());
        let RowStore {
            mut current_key,
            mut rows,
            ..
        } = self;

        match action {
            Action::Add => {
                current_key += 1;
                rows.push(FieldRow::new(catalog, current_key));
            }
            Action::Import { rows: imported } => {
                let mut next = current_key + 1;
                for mut row in imported {
                    row.key = next;
                    next += 1;
                    rows.push(row);
                }
                current_key = rows.iter().map(|r| r.key).max().unwrap_or(current_key) + 1;
            }
            Action::CloneRow { key } => match rows.iter().position(|r| r.key == key) {
                Some(index) => {
                    current_key += 1;
                    let copy = clone_row(&rows[index], current_key);
                    rows.insert(index + 1, copy);
                }
                None => warn!("Cannot clone missing field row {}", key),
            },
            Action::Change {
                key,
                attribute,
                value,
            } => match rows.iter_mut().find(|r| r.key == key) {
                Some(row) => {
                    row.set_value(attribute, value);
                    row.touch(attribute);
                    if attribute == Attribute::GlobalValueSet {
                        row.set_value(Attribute::Restricted, true);
                        row.set_value(Attribute::FirstAsDefault, false);
                    }
                }
                None => warn!("Cannot change {} on missing field row {}", attribute, key),
            },
            Action::Touch { key, attribute } => match rows.iter_mut().find(|r| r.key == key) {
                Some(row) => {
                    row.touch(attribute);
                    if attribute == Attribute::Label {
                        derive_full_name(row);
                    }
                }
                None => warn!("Cannot touch {} on missing field row {}", attribute, key),
            },
            Action::Delete { key } => {
                let before = rows.len();
                rows.retain(|r| r.key != key);
                if rows.len() == before {
                    warn!("Cannot delete missing field row {}", key);
                }
                if rows.is_empty() {
                    current_key += 1;
                    rows.push(FieldRow::new(catalog, current_key));
                }
            }
            Action::PicklistOptionChanged { key, global } => {
                match rows.iter_mut().find(|r| r.key == key) {
                    Some(row) => row.picklist_global_value_set = global,
                    None => warn!("Cannot switch picklist source on missing field row {}", key),
                }
            }
            Action::Reset => {
                current_key += 1;
                rows = vec![FieldRow::new(catalog, current_key)];
            }
        }

        let validation = validate(catalog, rows);
        RowStore {
            current_key,
            rows: validation.rows,
            all_valid: validation.all_valid,
        }
    }
}

fn clone_row(source: &FieldRow, key: RowKey) -> FieldRow {
    let mut copy = source.clone();
    copy.key = key;
    let label = copy.text(Attribute::Label).to_string();
    if !label.is_empty() {
        let label = format!("{} copy", label);
        let full_name = api_name_from_label(&label);
        copy.set_value(Attribute::Label, label);
        copy.set_value(
            Attribute::FullName,
            full_name.clone().unwrap_or_default(),
        );
        copy.derived_full_name = full_name;
    }
    copy.touch_all();
    copy
}

/// Write `fullName` from the label unless the user typed their own.
fn derive_full_name(row: &mut FieldRow) {
    let current = row.text(Attribute::FullName);
    let diverged = !current.is_empty() && row.derived_full_name.as_deref() != Some(current);
    if diverged {
        return;
    }
    if let Some(name) = api_name_from_label(row.text(Attribute::Label)) {
        row.set_value(Attribute::FullName, name.clone());
        row.touch(Attribute::FullName);
        row.derived_full_name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldType;
    use std::collections::HashSet;

    fn change(key: RowKey, attribute: Attribute, value: impl Into<AttrValue>) -> Action {
        Action::Change {
            key,
            attribute,
            value: value.into(),
        }
    }

    fn keys(store: &RowStore) -> Vec<RowKey> {
        store.rows.iter().map(|r| r.key).collect()
    }

    #[test]
    fn test_add_twice_gives_three_distinct_rows() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, Action::Add)
            .reduce(&catalog, Action::Add);
        assert_eq!(keys(&store), vec![0, 1, 2]);
        assert_eq!(store.current_key, 2);
        assert!(!store.all_valid);
    }

    #[test]
    fn test_touch_label_derives_full_name() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, change(0, Attribute::Label, "My Field"))
            .reduce(
                &catalog,
                Action::Touch {
                    key: 0,
                    attribute: Attribute::Label,
                },
            );
        let row = store.row(0).unwrap();
        assert_eq!(row.text(Attribute::FullName), "My_Field");
        assert!(row.state(Attribute::FullName).unwrap().touched);
        assert!(store.all_valid);
        assert_eq!(
            crate::fields::naming::qualified_field_name("Account", row.text(Attribute::FullName)),
            "Account.My_Field__c"
        );
    }

    #[test]
    fn test_touch_without_derivation_leaves_full_name_untouched() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog).reduce(
            &catalog,
            Action::Touch {
                key: 0,
                attribute: Attribute::Label,
            },
        );
        let row = store.row(0).unwrap();
        assert!(row.state(Attribute::Label).unwrap().touched);
        assert!(!row.state(Attribute::FullName).unwrap().touched);
        assert_eq!(row.text(Attribute::FullName), "");
    }

    #[test]
    fn test_touch_label_follows_label_until_diverged() {
        let catalog = Catalog::new();
        let touch = Action::Touch {
            key: 0,
            attribute: Attribute::Label,
        };
        let store = RowStore::new(&catalog)
            .reduce(&catalog, change(0, Attribute::Label, "Region"))
            .reduce(&catalog, touch.clone())
            .reduce(&catalog, change(0, Attribute::Label, "Sales Region"))
            .reduce(&catalog, touch.clone());
        assert_eq!(store.row(0).unwrap().text(Attribute::FullName), "Sales_Region");

        let store = store
            .reduce(&catalog, change(0, Attribute::FullName, "Territory"))
            .reduce(&catalog, change(0, Attribute::Label, "Area"))
            .reduce(&catalog, touch);
        assert_eq!(store.row(0).unwrap().text(Attribute::FullName), "Territory");
    }

    #[test]
    fn test_clone_appends_copy_and_touches_all() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, change(0, Attribute::Label, "Test"))
            .reduce(&catalog, Action::Add)
            .reduce(&catalog, Action::CloneRow { key: 0 });
        assert_eq!(keys(&store), vec![0, 2, 1]);
        let copy = store.row(2).unwrap();
        assert_eq!(copy.text(Attribute::Label), "Test copy");
        assert_eq!(copy.text(Attribute::FullName), "Test_copy");
        assert!(copy.attributes.values().all(|s| s.touched));
        assert_eq!(store.row(0).unwrap().text(Attribute::Label), "Test");
    }

    #[test]
    fn test_clone_unlabelled_row_keeps_empty_label() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog).reduce(&catalog, Action::CloneRow { key: 0 });
        let copy = store.row(1).unwrap();
        assert_eq!(copy.text(Attribute::Label), "");
        assert!(copy.attributes.values().all(|s| s.touched));
    }

    #[test]
    fn test_clone_missing_key_is_noop() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog);
        let after = store.clone().reduce(&catalog, Action::CloneRow { key: 99 });
        assert_eq!(after, store);
    }

    #[test]
    fn test_change_global_value_set_couples_flags() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, change(0, Attribute::Type, FieldType::Picklist.api_name()))
            .reduce(&catalog, change(0, Attribute::Restricted, false))
            .reduce(&catalog, change(0, Attribute::FirstAsDefault, true))
            .reduce(&catalog, change(0, Attribute::GlobalValueSet, "Regions"));
        let row = store.row(0).unwrap();
        assert_eq!(row.value(Attribute::Restricted), &AttrValue::Bool(true));
        assert_eq!(row.value(Attribute::FirstAsDefault), &AttrValue::Bool(false));
        assert!(row.state(Attribute::GlobalValueSet).unwrap().touched);
    }

    #[test]
    fn test_delete_only_row_resets_to_fresh_default() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, change(0, Attribute::Label, "Gone"))
            .reduce(&catalog, Action::Delete { key: 0 });
        assert_eq!(store.rows.len(), 1);
        let row = &store.rows[0];
        assert_ne!(row.key, 0);
        assert!(!row.all_valid);
        assert_eq!(row.text(Attribute::Label), "");
        assert!(row.attributes.values().all(|s| !s.touched));
    }

    #[test]
    fn test_import_rekeys_after_existing_rows() {
        let catalog = Catalog::new();
        let imported = vec![FieldRow::new(&catalog, 0), FieldRow::new(&catalog, 0)];
        let store = RowStore::new(&catalog).reduce(&catalog, Action::Import { rows: imported });
        assert_eq!(keys(&store), vec![0, 1, 2]);
        assert_eq!(store.current_key, 3);

        let store = store.reduce(&catalog, Action::Add);
        let unique: HashSet<RowKey> = keys(&store).into_iter().collect();
        assert_eq!(unique.len(), store.rows.len());
    }

    #[test]
    fn test_picklist_option_changed() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog).reduce(
            &catalog,
            Action::PicklistOptionChanged { key: 0, global: true },
        );
        assert!(store.row(0).unwrap().picklist_global_value_set);
    }

    #[test]
    fn test_reset_replaces_everything() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog)
            .reduce(&catalog, Action::Add)
            .reduce(&catalog, Action::Add)
            .reduce(&catalog, Action::Reset);
        assert_eq!(store.rows.len(), 1);
        assert_eq!(store.rows[0].key, 3);
    }

    #[test]
    fn test_rows_never_empty_and_keys_unique() {
        let catalog = Catalog::new();
        let mut store = RowStore::new(&catalog);
        let mut seed: u64 = 0x2545_f491;
        for _ in 0..300 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pick = (seed >> 33) as usize;
            let target = store.rows[pick % store.rows.len()].key;
            let action = match pick % 4 {
                0 => Action::Add,
                1 => Action::Delete { key: target },
                2 => Action::CloneRow { key: target },
                _ => Action::Import {
                    rows: vec![FieldRow::new(&catalog, 0)],
                },
            };
            store = store.reduce(&catalog, action);
            assert!(!store.rows.is_empty());
            let unique: HashSet<RowKey> = keys(&store).into_iter().collect();
            assert_eq!(unique.len(), store.rows.len());
        }
    }

    #[test]
    fn test_action_from_json() {
        let action = Action::from_json(serde_json::json!({ "type": "DELETE", "key": 4 })).unwrap();
        assert_eq!(action, Action::Delete { key: 4 });

        let action = Action::from_json(serde_json::json!({
            "type": "CHANGE",
            "key": 1,
            "attribute": "fullName",
            "value": "Region"
        }))
        .unwrap();
        assert_eq!(action, change(1, Attribute::FullName, "Region"));

        let action = Action::from_json(serde_json::json!({ "type": "CLONE", "key": 2 })).unwrap();
        assert_eq!(action.name(), "CLONE");
    }

    #[test]
    fn test_action_from_json_unknown_name_fails_fast() {
        let err = Action::from_json(serde_json::json!({ "type": "EXPLODE" })).unwrap_err();
        assert!(matches!(err, FieldsError::UnknownAction(name) if name == "EXPLODE"));

        let err = Action::from_json(serde_json::json!({ "type": "DELETE" })).unwrap_err();
        assert!(matches!(err, FieldsError::InvalidPayload { .. }));
    }
}
