//! Validity reducer: annotates every row with per-attribute and per-row
//! validity.

use super::{Attribute, Catalog, FieldRow};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid format";

/// Result of a validation pass.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    pub rows: Vec<FieldRow>,
    pub all_valid: bool,
}

/// Recompute validity for all rows.
///
/// Attributes outside a row's applicable set keep whatever state they had.
///
pub fn validate(catalog: &Catalog, rows: Vec<FieldRow>) -> Validation {
    let rows: Vec<FieldRow> = rows.into_iter().map(|r| validate_row(catalog, r)).collect();
    let all_valid = rows.iter().all(|r| r.all_valid);
    Validation { rows, all_valid }
}

/// Recompute validity for a single row.
///
pub fn validate_row(catalog: &Catalog, mut row: FieldRow) -> FieldRow {
    let picklist = row.field_type().map(|t| t.is_picklist()).unwrap_or(false);
    let mut all_valid = true;

    for attribute in catalog.applicable(&row) {
        if picklist && matches!(attribute, Attribute::ValueSet | Attribute::GlobalValueSet) {
            continue;
        }
        all_valid &= check_attribute(catalog, &mut row, attribute);
    }

    if picklist {
        all_valid &= check_picklist_source(catalog, &mut row);
    }

    row.all_valid = all_valid;
    row
}

fn check_attribute(catalog: &Catalog, row: &mut FieldRow, attribute: Attribute) -> bool {
    let definition = catalog.definition(attribute);
    let value = row.value(attribute).clone();
    let outcome = if value.is_empty() {
        if definition.required {
            Some(REQUIRED_MESSAGE)
        } else {
            None
        }
    } else if !definition.validates(&value, row) {
        Some(INVALID_FORMAT_MESSAGE)
    } else {
        None
    };

    let state = row.state_mut(attribute);
    match outcome {
        Some(message) => {
            state.mark_invalid(message);
            false
        }
        None => {
            state.mark_valid();
            true
        }
    }
}

/// Exactly one of the literal and the global value set is authoritative; the
/// other one is forced valid. The literal list is cleared while the global
/// set is in use.
fn check_picklist_source(catalog: &Catalog, row: &mut FieldRow) -> bool {
    if row.picklist_global_value_set {
        let literal = row.state_mut(Attribute::ValueSet);
        literal.value = super::AttrValue::text("");
        literal.mark_valid();
        let global = row.value(Attribute::GlobalValueSet).clone();
        let state = row.state_mut(Attribute::GlobalValueSet);
        if global.is_empty() {
            state.mark_invalid(REQUIRED_MESSAGE);
            false
        } else {
            state.mark_valid();
            true
        }
    } else {
        row.state_mut(Attribute::GlobalValueSet).mark_valid();
        let literal = row.value(Attribute::ValueSet).clone();
        let outcome = if literal.is_empty() {
            Some(REQUIRED_MESSAGE)
        } else if !catalog
            .definition(Attribute::ValueSet)
            .validates(&literal, row)
        {
            Some(INVALID_FORMAT_MESSAGE)
        } else {
            None
        };
        let state = row.state_mut(Attribute::ValueSet);
        match outcome {
            Some(message) => {
                state.mark_invalid(message);
                false
            }
            None => {
                state.mark_valid();
                true
            }
        }
    }
}
