//! Conversion between field rows and flat tabular records, plus CSV I/O.

use super::{AttrValue, Attribute, Catalog, FieldRow, FieldType, FieldsError, InputKind};
use log::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One spreadsheet row keyed by column header.
pub type TabularRecord = BTreeMap<String, String>;

const TRUTHY: [&str; 7] = ["true", "1", "yes", "y", "x", "on", "checked"];

/// Parse a spreadsheet checkbox cell.
///
pub fn parse_boolish(cell: &str) -> bool {
    let cell = cell.trim().to_lowercase();
    TRUTHY.contains(&cell.as_str())
}

/// Attributes a row exports: applicable ones, with exactly one of the two
/// picklist sources.
fn exported_attributes(catalog: &Catalog, row: &FieldRow) -> Vec<Attribute> {
    let picklist = row.field_type().map(|t| t.is_picklist()).unwrap_or(false);
    catalog
        .applicable(row)
        .into_iter()
        .filter(|a| match (picklist, a) {
            (true, Attribute::ValueSet) => !row.picklist_global_value_set,
            (true, Attribute::GlobalValueSet) => row.picklist_global_value_set,
            _ => true,
        })
        .collect()
}

/// Flatten rows into tabular records.
///
pub fn export_rows(catalog: &Catalog, rows: &[FieldRow]) -> Vec<TabularRecord> {
    rows.iter()
        .map(|row| {
            exported_attributes(catalog, row)
                .into_iter()
                .map(|a| (a.name().to_string(), row.value(a).to_string()))
                .collect()
        })
        .collect()
}

fn coerce(catalog: &Catalog, attribute: Attribute, cell: &str) -> AttrValue {
    let definition = catalog.definition(attribute);
    if definition.input == InputKind::Checkbox {
        return AttrValue::Bool(parse_boolish(cell));
    }
    if definition.numeric {
        return match cell.trim() {
            "" => AttrValue::Null,
            trimmed => trimmed
                .parse::<i64>()
                .map(AttrValue::Number)
                .unwrap_or_else(|_| AttrValue::text(trimmed)),
        };
    }
    if attribute == Attribute::Type {
        return match cell.trim().parse::<FieldType>() {
            Ok(field_type) => AttrValue::text(field_type.api_name()),
            Err(_) => AttrValue::text(cell.trim()),
        };
    }
    AttrValue::text(cell)
}

/// Build rows from tabular records.
///
/// Every known column is coerced according to its input kind and marked
/// touched. Rows come back with key 0; the IMPORT action assigns real keys.
/// Fails with [`FieldsError::MissingHeader`] when no column names an
/// attribute.
///
pub fn import_records(
    catalog: &Catalog,
    records: &[TabularRecord],
) -> Result<Vec<FieldRow>, FieldsError> {
    let mut known = BTreeSet::new();
    let mut unknown = BTreeSet::new();
    for column in records.iter().flat_map(|r| r.keys()) {
        match column.trim().parse::<Attribute>() {
            Ok(attribute) => {
                known.insert(attribute);
            }
            Err(_) => {
                unknown.insert(column.as_str());
            }
        }
    }
    for column in &unknown {
        warn!("Ignoring unknown column '{}'", column);
    }
    if !records.is_empty() && known.is_empty() {
        return Err(FieldsError::MissingHeader);
    }

    let rows = records
        .iter()
        .map(|record| {
            let mut row = FieldRow::new(catalog, 0);
            for (column, cell) in record {
                if let Ok(attribute) = column.trim().parse::<Attribute>() {
                    row.set_value(attribute, coerce(catalog, attribute, cell));
                }
            }
            row.picklist_global_value_set = !row.value(Attribute::GlobalValueSet).is_empty();
            row.touch_all();
            row
        })
        .collect();
    Ok(rows)
}

/// Read CSV data with a header row.
///
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<TabularRecord>, FieldsError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(FieldsError::MissingHeader);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: TabularRecord = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        if row.values().any(|v| !v.trim().is_empty()) {
            records.push(row);
        }
    }
    debug!("Read {} records from CSV", records.len());
    Ok(records)
}

/// Write records as CSV. Columns follow catalog order; cells a record lacks
/// are written empty.
///
pub fn write_csv<W: Write>(writer: W, records: &[TabularRecord]) -> Result<(), FieldsError> {
    let columns: Vec<&str> = Attribute::ALL
        .iter()
        .map(|a| a.name())
        .filter(|name| records.iter().any(|r| r.contains_key(*name)))
        .collect();

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| record.get(*c).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv_file(path: &Path) -> Result<Vec<TabularRecord>, FieldsError> {
    info!("Reading field rows from {}", path.display());
    read_csv(File::open(path)?)
}

pub fn write_csv_file(path: &Path, records: &[TabularRecord]) -> Result<(), FieldsError> {
    info!("Writing {} field rows to {}", records.len(), path.display());
    write_csv(File::create(path)?, records)
}
