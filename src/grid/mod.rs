//! Spreadsheet-like view over query results.
//!
//! Columns and their kinds come from field describe metadata when it is
//! available and are inferred from the values otherwise. Sorting and
//! filtering happen client-side; edits are tracked per record against the
//! loaded snapshot.

mod error;

pub use error::GridError;

use crate::salesforce::FieldDescribe;
use crate::state::Draft;
use chrono::{DateTime, NaiveDate};
use log::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One query result row, flattened so that relationship fields appear as
/// `Owner.Name`.
pub type Record = Map<String, Value>;

const ID_COLUMN: &str = "Id";

/// Value type of a column.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Reference,
}

impl ColumnKind {
    /// Map a describe `type` to a column kind.
    ///
    pub fn from_describe(field_type: &str) -> Self {
        match field_type {
            "int" | "double" | "currency" | "percent" | "long" => ColumnKind::Number,
            "boolean" => ColumnKind::Boolean,
            "date" => ColumnKind::Date,
            "datetime" => ColumnKind::DateTime,
            "id" | "reference" => ColumnKind::Reference,
            _ => ColumnKind::Text,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub label: String,
    pub kind: ColumnKind,
    pub editable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Pending edits of one record.
///
#[derive(Clone, Debug, PartialEq)]
pub struct RecordChange {
    pub id: String,
    pub fields: Record,
}

#[derive(Clone, Debug, PartialEq)]
struct Filter {
    column: Option<usize>,
    needle: String,
}

/// Query results with sort, filter and edit state.
///
#[derive(Clone, Debug)]
pub struct DataGrid {
    columns: Vec<Column>,
    records: Vec<Draft<Record>>,
    sort: Option<(usize, Direction)>,
    filter: Option<Filter>,
}

fn flatten(record: Record) -> Record {
    let mut flat = Record::new();
    for (name, value) in record {
        if name == "attributes" {
            continue;
        }
        match value {
            Value::Object(nested) => {
                for (child, value) in nested {
                    if child != "attributes" {
                        flat.insert(format!("{}.{}", name, child), value);
                    }
                }
            }
            value => {
                flat.insert(name, value);
            }
        }
    }
    flat
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

lazy_static! {
    static ref RECORD_ID: Regex = Regex::new(r"^[a-zA-Z0-9]{15}([a-zA-Z0-9]{3})?$").unwrap();
}

fn looks_like_id(value: &str) -> bool {
    RECORD_ID.is_match(value)
}

fn infer_kind(name: &str, records: &[Record]) -> ColumnKind {
    let values: Vec<&Value> = records
        .iter()
        .filter_map(|r| r.get(name))
        .filter(|v| !v.is_null())
        .collect();
    if values.is_empty() {
        return ColumnKind::Text;
    }
    let all = |predicate: &dyn Fn(&Value) -> bool| values.iter().all(|v| predicate(v));
    if all(&|v| v.is_number()) {
        ColumnKind::Number
    } else if all(&|v| v.is_boolean()) {
        ColumnKind::Boolean
    } else if all(&|v| v.as_str().map(is_date).unwrap_or(false)) {
        ColumnKind::Date
    } else if all(&|v| v.as_str().and_then(parse_datetime).is_some()) {
        ColumnKind::DateTime
    } else if (name == ID_COLUMN || name.ends_with("Id"))
        && all(&|v| v.as_str().map(looks_like_id).unwrap_or(false))
    {
        ColumnKind::Reference
    } else {
        ColumnKind::Text
    }
}

/// Render a cell for display and filtering.
///
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compare two non-null cells of a column.
fn compare(kind: ColumnKind, a: &Value, b: &Value) -> Ordering {
    let by_text = || display(a).to_lowercase().cmp(&display(b).to_lowercase());
    match kind {
        ColumnKind::Number => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => by_text(),
        },
        ColumnKind::Boolean => match (a.as_bool(), b.as_bool()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => by_text(),
        },
        ColumnKind::DateTime => match (
            a.as_str().and_then(parse_datetime),
            b.as_str().and_then(parse_datetime),
        ) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => by_text(),
        },
        ColumnKind::Date | ColumnKind::Reference | ColumnKind::Text => by_text(),
    }
}

impl DataGrid {
    /// Build a grid from query records and optional describe metadata.
    ///
    pub fn from_records(records: Vec<Record>, describe: Option<&[FieldDescribe]>) -> Self {
        let records: Vec<Record> = records.into_iter().map(flatten).collect();

        let mut names: Vec<String> = Vec::new();
        for record in &records {
            for name in record.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names.sort_by(|a, b| match (a == ID_COLUMN, b == ID_COLUMN) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.cmp(b),
        });

        let columns: Vec<Column> = names
            .into_iter()
            .map(|name| {
                let described = describe.and_then(|fields| fields.iter().find(|f| f.name == name));
                match described {
                    Some(field) => Column {
                        label: field.label.clone(),
                        kind: ColumnKind::from_describe(&field.field_type),
                        editable: field.updateable,
                        name,
                    },
                    None => Column {
                        label: name.clone(),
                        kind: infer_kind(&name, &records),
                        editable: name != ID_COLUMN && !name.contains('.'),
                        name,
                    },
                }
            })
            .collect();

        debug!(
            "Loaded grid with {} columns and {} records",
            columns.len(),
            records.len()
        );
        DataGrid {
            columns,
            records: records.into_iter().map(Draft::new).collect(),
            sort: None,
            filter: None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn column_index(&self, column: &str) -> Result<usize, GridError> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| GridError::UnknownColumn(column.to_string()))
    }

    /// Sort by a column. Empty cells sort last in both directions.
    ///
    pub fn sort_by(&mut self, column: &str, direction: Direction) -> Result<(), GridError> {
        self.sort = Some((self.column_index(column)?, direction));
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// Keep records whose cell in `column` (or any cell when `None`)
    /// contains `text`, ignoring case. Empty text clears the filter.
    ///
    pub fn set_filter(&mut self, column: Option<&str>, text: &str) -> Result<(), GridError> {
        let column = column.map(|c| self.column_index(c)).transpose()?;
        self.filter = if text.is_empty() {
            None
        } else {
            Some(Filter {
                column,
                needle: text.to_lowercase(),
            })
        };
        Ok(())
    }

    fn matches(&self, record: &Record) -> bool {
        let filter = match &self.filter {
            Some(filter) => filter,
            None => return true,
        };
        let hit = |column: &Column| {
            record
                .get(&column.name)
                .map(|v| display(v).to_lowercase().contains(&filter.needle))
                .unwrap_or(false)
        };
        match filter.column {
            Some(index) => hit(&self.columns[index]),
            None => self.columns.iter().any(hit),
        }
    }

    /// Return record indexes in display order.
    ///
    pub fn visible_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = (0..self.records.len())
            .filter(|i| self.matches(self.records[*i].current()))
            .collect();

        if let Some((column, direction)) = self.sort {
            let column = &self.columns[column];
            indexes.sort_by(|a, b| {
                let x = self.records[*a].current().get(&column.name).filter(|v| !v.is_null());
                let y = self.records[*b].current().get(&column.name).filter(|v| !v.is_null());
                match (x, y) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(x), Some(y)) => match direction {
                        Direction::Ascending => compare(column.kind, x, y),
                        Direction::Descending => compare(column.kind, y, x),
                    },
                }
            });
        }
        indexes
    }

    /// Return current record values in display order.
    ///
    pub fn visible_rows(&self) -> Vec<&Record> {
        self.visible_indexes()
            .into_iter()
            .map(|i| self.records[i].current())
            .collect()
    }

    /// Edit one cell of the record at `index` (an index into the loaded
    /// records, as returned by [`DataGrid::visible_indexes`]).
    ///
    pub fn set_cell(&mut self, index: usize, column: &str, value: Value) -> Result<(), GridError> {
        let column = &self.columns[self.column_index(column)?];
        if !column.editable {
            return Err(GridError::ReadOnlyColumn(column.name.clone()));
        }
        let name = column.name.clone();
        let record = self
            .records
            .get_mut(index)
            .ok_or(GridError::RecordNotFound(index))?;
        record.current_mut().insert(name, value);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.records.iter().any(|r| r.is_dirty())
    }

    /// Return changed fields per record id, compared by value against the
    /// loaded snapshot.
    ///
    pub fn changes(&self) -> Vec<RecordChange> {
        self.records
            .iter()
            .filter(|r| r.is_dirty())
            .map(|r| {
                let fields: Record = r
                    .current()
                    .iter()
                    .filter(|(name, value)| r.original().get(*name) != Some(*value))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                RecordChange {
                    id: r
                        .current()
                        .get(ID_COLUMN)
                        .map(display)
                        .unwrap_or_default(),
                    fields,
                }
            })
            .collect()
    }

    /// Accept all edits as saved.
    ///
    pub fn commit(&mut self) {
        self.records.iter_mut().for_each(Draft::commit);
    }

    /// Accept the edits of the records with these ids, leaving the rest
    /// pending.
    ///
    pub fn commit_records(&mut self, ids: &[String]) {
        for record in self.records.iter_mut() {
            let id = record.current().get(ID_COLUMN).map(display);
            if id.map(|id| ids.contains(&id)).unwrap_or(false) {
                record.commit();
            }
        }
    }

    /// Discard all edits.
    ///
    pub fn revert(&mut self) {
        self.records.iter_mut().for_each(Draft::revert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Record> {
        let rows = json!([
            {
                "attributes": { "type": "Opportunity" },
                "Id": "006000000000001AAA",
                "Name": "beta deal",
                "Amount": 5000,
                "IsWon": false,
                "CloseDate": "2024-03-01",
                "Owner": { "attributes": { "type": "User" }, "Name": "Ada" }
            },
            {
                "attributes": { "type": "Opportunity" },
                "Id": "006000000000002AAA",
                "Name": "Alpha deal",
                "Amount": null,
                "IsWon": true,
                "CloseDate": "2023-11-15",
                "Owner": { "attributes": { "type": "User" }, "Name": "Grace" }
            },
            {
                "attributes": { "type": "Opportunity" },
                "Id": "006000000000003AAA",
                "Name": "Gamma",
                "Amount": 120.5,
                "IsWon": false,
                "CloseDate": null,
                "Owner": { "attributes": { "type": "User" }, "Name": "Linus" }
            }
        ]);
        rows.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn names(grid: &DataGrid) -> Vec<String> {
        grid.visible_rows().iter().map(|r| display(&r["Name"])).collect()
    }

    #[test]
    fn test_columns_are_inferred_and_flattened() {
        let grid = DataGrid::from_records(records(), None);
        let columns: Vec<(&str, ColumnKind)> = grid
            .columns()
            .iter()
            .map(|c| (c.name.as_str(), c.kind))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("Id", ColumnKind::Reference),
                ("Amount", ColumnKind::Number),
                ("CloseDate", ColumnKind::Date),
                ("IsWon", ColumnKind::Boolean),
                ("Name", ColumnKind::Text),
                ("Owner.Name", ColumnKind::Text),
            ]
        );
        assert!(!grid.columns()[0].editable);
        assert!(!grid.columns()[5].editable);
    }

    #[test]
    fn test_describe_metadata_wins_over_inference() {
        let describe = vec![FieldDescribe {
            name: "Amount".to_string(),
            label: "Amount".to_string(),
            field_type: "currency".to_string(),
            updateable: false,
            reference_to: vec![],
        }];
        let grid = DataGrid::from_records(records(), Some(&describe));
        let amount = grid.columns().iter().find(|c| c.name == "Amount").unwrap();
        assert_eq!(amount.kind, ColumnKind::Number);
        assert!(!amount.editable);
    }

    #[test]
    fn test_sort_numbers_with_nulls_last() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.sort_by("Amount", Direction::Ascending).unwrap();
        assert_eq!(names(&grid), vec!["Gamma", "beta deal", "Alpha deal"]);
        grid.sort_by("Amount", Direction::Descending).unwrap();
        assert_eq!(names(&grid), vec!["beta deal", "Gamma", "Alpha deal"]);
    }

    #[test]
    fn test_sort_text_ignores_case() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.sort_by("Name", Direction::Ascending).unwrap();
        assert_eq!(names(&grid), vec!["Alpha deal", "beta deal", "Gamma"]);
        grid.sort_by("CloseDate", Direction::Descending).unwrap();
        assert_eq!(names(&grid), vec!["beta deal", "Alpha deal", "Gamma"]);
    }

    #[test]
    fn test_filter_by_column_and_anywhere() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.set_filter(Some("Name"), "DEAL").unwrap();
        assert_eq!(names(&grid).len(), 2);
        grid.set_filter(None, "grace").unwrap();
        assert_eq!(names(&grid), vec!["Alpha deal"]);
        grid.set_filter(None, "").unwrap();
        assert_eq!(grid.visible_rows().len(), 3);
        assert_eq!(
            grid.set_filter(Some("Missing"), "x"),
            Err(GridError::UnknownColumn("Missing".to_string()))
        );
    }

    #[test]
    fn test_edits_are_tracked_by_value() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.set_cell(2, "Name", json!("Gamma 2")).unwrap();
        grid.set_cell(0, "Amount", json!(5000)).unwrap();
        let changes = grid.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, "006000000000003AAA");
        assert_eq!(changes[0].fields.len(), 1);
        assert_eq!(changes[0].fields["Name"], json!("Gamma 2"));

        grid.set_cell(2, "Name", json!("Gamma")).unwrap();
        assert!(!grid.is_dirty());
    }

    #[test]
    fn test_read_only_and_missing_cells() {
        let mut grid = DataGrid::from_records(records(), None);
        assert_eq!(
            grid.set_cell(0, "Id", json!("x")),
            Err(GridError::ReadOnlyColumn("Id".to_string()))
        );
        assert_eq!(
            grid.set_cell(9, "Name", json!("x")),
            Err(GridError::RecordNotFound(9))
        );
    }

    #[test]
    fn test_commit_and_revert() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.set_cell(1, "Name", json!("Renamed")).unwrap();
        grid.revert();
        assert!(!grid.is_dirty());
        grid.set_cell(1, "Name", json!("Renamed")).unwrap();
        grid.commit();
        assert!(grid.changes().is_empty());
        assert_eq!(display(&grid.visible_rows()[1]["Name"]), "Renamed");
    }

    #[test]
    fn test_commit_records_keeps_unsaved_edits() {
        let mut grid = DataGrid::from_records(records(), None);
        grid.set_cell(0, "Name", json!("First")).unwrap();
        grid.set_cell(1, "Name", json!("Second")).unwrap();
        let changes = grid.changes();
        assert_eq!(changes.len(), 2);

        grid.commit_records(&[changes[0].id.clone()]);
        let pending = grid.changes();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, changes[1].id);
        assert_eq!(pending[0].fields.get("Name"), Some(&json!("Second")));
    }
}
