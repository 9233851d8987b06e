use fake::Dummy;
use serde::{Deserialize, Serialize};

/// Entry of the global object describe.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SObjectSummary {
    pub name: String,
    pub label: String,
    pub queryable: bool,
    pub triggerable: bool,
    pub custom: bool,
}

/// Defines a global picklist value set.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalValueSet {
    pub id: String,
    pub developer_name: String,
    pub master_label: String,
}

/// Defines a page layout of an object.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageLayout {
    pub id: String,
    pub name: String,
    pub table_enum_or_id: String,
}

/// Column metadata of one object field.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String, // string, double, boolean, date, datetime, reference, ...
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub reference_to: Vec<String>,
}

/// Outcome of saving one edited record.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub id: String,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Outcome of deploying one custom field.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    pub full_name: String,
    pub id: Option<String>,
    pub success: bool,
    pub errors: Vec<String>,
}
