//! Deployment payloads for the Tooling API `CustomField` resource.

use super::naming::qualified_field_name;
use super::{AttrValue, Attribute, Catalog, FieldRow, InputKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Body of a Tooling API `CustomField` create request.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "Metadata")]
    pub metadata: Map<String, Value>,
}

/// Attributes folded into the `valueSet` structure instead of being sent
/// on their own.
const VALUE_SET_ATTRIBUTES: [Attribute; 5] = [
    Attribute::ValueSet,
    Attribute::GlobalValueSet,
    Attribute::Restricted,
    Attribute::Sorted,
    Attribute::FirstAsDefault,
];

fn json_value(catalog: &Catalog, attribute: Attribute, value: &AttrValue) -> Option<Value> {
    let definition = catalog.definition(attribute);
    match value {
        AttrValue::Null => None,
        AttrValue::Text(s) if s.is_empty() => None,
        AttrValue::Bool(b) => Some(Value::Bool(*b)),
        AttrValue::Number(n) => Some(json!(n)),
        AttrValue::Text(s) if definition.numeric => Some(
            value
                .as_i64()
                .map(|n| json!(n))
                .unwrap_or_else(|| Value::String(s.clone())),
        ),
        AttrValue::Text(s) if definition.input == InputKind::Checkbox => {
            Some(Value::Bool(s.eq_ignore_ascii_case("true")))
        }
        AttrValue::Text(s) => Some(Value::String(s.clone())),
    }
}

fn value_set(row: &FieldRow) -> Value {
    if row.picklist_global_value_set {
        return json!({
            "restricted": true,
            "valueSetName": row.text(Attribute::GlobalValueSet),
        });
    }
    let first_as_default = row.value(Attribute::FirstAsDefault).as_bool();
    let values: Vec<Value> = row
        .text(Attribute::ValueSet)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, v)| {
            json!({
                "fullName": v,
                "label": v,
                "default": first_as_default && i == 0,
            })
        })
        .collect();
    json!({
        "restricted": row.value(Attribute::Restricted).as_bool(),
        "valueSetDefinition": {
            "sorted": row.value(Attribute::Sorted).as_bool(),
            "value": values,
        },
    })
}

/// Build the metadata of one row deployed to one object.
///
pub fn field_metadata(catalog: &Catalog, sobject: &str, row: &FieldRow) -> FieldMetadata {
    let picklist = row.field_type().map(|t| t.is_picklist()).unwrap_or(false);
    let mut metadata = Map::new();
    for attribute in catalog.applicable(row) {
        if attribute == Attribute::FullName || VALUE_SET_ATTRIBUTES.contains(&attribute) {
            continue;
        }
        if let Some(value) = json_value(catalog, attribute, row.value(attribute)) {
            metadata.insert(attribute.name().to_string(), value);
        }
    }
    if picklist {
        metadata.insert("valueSet".to_string(), value_set(row));
    }
    FieldMetadata {
        full_name: qualified_field_name(sobject, row.text(Attribute::FullName)),
        metadata,
    }
}

/// Cross every target object with every row. The outer vector follows
/// `sobjects`, the inner one `rows`.
///
pub fn prepare_payload(
    catalog: &Catalog,
    sobjects: &[String],
    rows: &[FieldRow],
) -> Vec<Vec<FieldMetadata>> {
    sobjects
        .iter()
        .map(|sobject| {
            rows.iter()
                .map(|row| field_metadata(catalog, sobject, row))
                .collect()
        })
        .collect()
}
