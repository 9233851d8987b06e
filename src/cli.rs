//! Headless subcommands.
//!
//! These back the `validate`, `payload`, `deploy` and `query` subcommands,
//! running the same row reducer and grid as the terminal interface without
//! drawing anything.

use crate::expression::{mask_nested, Expression};
use crate::fields::{
    import_records, prepare_payload, read_csv_file, Action, Attribute, Catalog, FieldMetadata,
    FieldsError, RowStore,
};
use crate::grid::{display, DataGrid, Direction};
use anyhow::{anyhow, Result};
use log::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref WHERE_KEYWORD: Regex = Regex::new(r"(?i)\bWHERE\b").unwrap();
}

/// Validation failures of one imported row.
///
#[derive(Clone, Debug, PartialEq)]
pub struct RowIssue {
    /// 1-based position in the file, excluding the header.
    pub line: usize,
    pub label: String,
    pub errors: Vec<(Attribute, String)>,
}

/// Read a CSV file into a store holding only the imported rows.
///
pub fn load_rows(catalog: &Catalog, path: &Path) -> Result<RowStore, FieldsError> {
    let records = read_csv_file(path)?;
    let rows = import_records(catalog, &records)?;
    if rows.is_empty() {
        return Err(FieldsError::NoRows);
    }
    info!("Read {} field row(s) from {}", rows.len(), path.display());
    let store = RowStore::new(catalog);
    let seed = store.rows[0].key;
    Ok(store
        .reduce(catalog, Action::Import { rows })
        .reduce(catalog, Action::Delete { key: seed }))
}

/// Return the rows failing validation.
///
pub fn row_issues(catalog: &Catalog, store: &RowStore) -> Vec<RowIssue> {
    store
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.all_valid)
        .map(|(index, row)| RowIssue {
            line: index + 1,
            label: row.text(Attribute::Label).to_string(),
            errors: row
                .errors(catalog)
                .into_iter()
                .map(|(attribute, message)| (attribute, message.to_string()))
                .collect(),
        })
        .collect()
}

/// Render issues one per line, e.g. `row 2 (Region): length: Invalid format`.
///
pub fn format_issues(issues: &[RowIssue]) -> String {
    issues
        .iter()
        .flat_map(|issue| {
            issue.errors.iter().map(move |(attribute, message)| {
                format!(
                    "row {} ({}): {}: {}",
                    issue.line, issue.label, attribute, message
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a comma-separated object list.
///
pub fn parse_objects(objects: &str) -> Vec<String> {
    objects
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the flattened payload, refusing rows that fail validation.
///
pub fn checked_payload(
    catalog: &Catalog,
    store: &RowStore,
    objects: &[String],
) -> Result<Vec<FieldMetadata>> {
    if objects.is_empty() {
        return Err(anyhow!("No target objects given"));
    }
    let issues = row_issues(catalog, store);
    if !issues.is_empty() {
        return Err(anyhow!(
            "{} field row(s) have validation errors:\n{}",
            issues.len(),
            format_issues(&issues)
        ));
    }
    Ok(prepare_payload(catalog, objects, &store.rows)
        .into_iter()
        .flatten()
        .collect())
}

/// Parse `COLUMN` or `COLUMN:desc` / `COLUMN:asc`.
///
pub fn parse_sort(arg: &str) -> Result<(String, Direction)> {
    let (column, direction) = match arg.rsplit_once(':') {
        Some((column, direction)) => (column, direction),
        None => (arg, "asc"),
    };
    let direction = match direction.to_lowercase().as_str() {
        "asc" => Direction::Ascending,
        "desc" => Direction::Descending,
        other => return Err(anyhow!("Unknown sort direction '{}'", other)),
    };
    if column.trim().is_empty() {
        return Err(anyhow!("Sort column is empty"));
    }
    Ok((column.trim().to_string(), direction))
}

/// Add the rendered expression to a query, joining an existing WHERE clause
/// with AND.
///
pub fn apply_where(soql: &str, expression: &Expression) -> String {
    let clause = expression.to_soql();
    if clause.is_empty() {
        return soql.to_string();
    }
    if WHERE_KEYWORD.is_match(&mask_nested(soql)) {
        format!("{} AND ({})", soql, clause)
    } else {
        format!("{} WHERE {}", soql, clause)
    }
}

/// Read an expression saved as JSON.
///
pub fn read_expression(path: &Path) -> Result<Expression> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write the visible grid rows as CSV with column names as the header.
///
pub fn grid_to_csv(grid: &DataGrid) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let names: Vec<&str> = grid.columns().iter().map(|c| c.name.as_str()).collect();
    writer.write_record(&names)?;
    for record in grid.visible_rows() {
        writer.write_record(
            names
                .iter()
                .map(|name| record.get(*name).map(display).unwrap_or_default()),
        )?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow!(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Operator;
    use crate::fields::{write_csv_file, FieldType, TabularRecord};
    use fake::uuid::UUIDv4;
    use fake::Fake;
    use serde_json::json;
    use uuid::Uuid;

    fn sheet(rows: &[&[(&str, &str)]]) -> std::path::PathBuf {
        let id: Uuid = UUIDv4.fake();
        let path = std::env::temp_dir().join(format!("sfadmin-cli-{}.csv", id));
        let records: Vec<TabularRecord> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .collect();
        write_csv_file(&path, &records).unwrap();
        path
    }

    #[test]
    fn test_load_rows_drops_seed_row() {
        let catalog = Catalog::new();
        let path = sheet(&[
            &[
                ("type", "Text"),
                ("label", "Region"),
                ("fullName", "Region"),
                ("length", "40"),
            ],
            &[("type", "Checkbox"), ("label", "Active"), ("fullName", "Active")],
        ]);
        let store = load_rows(&catalog, &path).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(store.rows.len(), 2);
        assert_eq!(store.rows[1].field_type(), Some(FieldType::Checkbox));
        assert!(row_issues(&catalog, &store).is_empty(), "{:?}", row_issues(&catalog, &store));
    }

    #[test]
    fn test_load_rows_rejects_header_only_file() {
        let id: Uuid = UUIDv4.fake();
        let path = std::env::temp_dir().join(format!("sfadmin-cli-{}.csv", id));
        std::fs::write(&path, "type,label,fullName,length\n").unwrap();
        let result = load_rows(&Catalog::new(), &path);
        std::fs::remove_file(path).unwrap();

        assert!(matches!(result, Err(FieldsError::NoRows)));
    }

    #[test]
    fn test_issues_name_row_and_attribute() {
        let catalog = Catalog::new();
        let path = sheet(&[
            &[
                ("type", "Text"),
                ("label", "Region"),
                ("fullName", "Region"),
                ("length", "40"),
            ],
            &[
                ("type", "Text"),
                ("label", ""),
                ("fullName", "Unnamed"),
                ("length", "40"),
            ],
        ]);
        let store = load_rows(&catalog, &path).unwrap();
        std::fs::remove_file(path).unwrap();

        let issues = row_issues(&catalog, &store);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        let report = format_issues(&issues);
        assert!(report.contains("row 2"));
        assert!(report.contains("label"));

        let objects = vec!["Account".to_string()];
        assert!(checked_payload(&catalog, &store, &objects).is_err());
    }

    #[test]
    fn test_checked_payload_requires_objects() {
        let catalog = Catalog::new();
        let store = RowStore::new(&catalog);
        assert!(checked_payload(&catalog, &store, &[]).is_err());
    }

    #[test]
    fn test_parse_objects() {
        assert_eq!(
            parse_objects("Account, Contact,,"),
            vec!["Account".to_string(), "Contact".to_string()]
        );
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_sort("Name").unwrap(),
            ("Name".to_string(), Direction::Ascending)
        );
        assert_eq!(
            parse_sort("Owner.Name:DESC").unwrap(),
            ("Owner.Name".to_string(), Direction::Descending)
        );
        assert!(parse_sort("Name:sideways").is_err());
        assert!(parse_sort(":desc").is_err());
    }

    #[test]
    fn test_apply_where() {
        let mut expression = Expression::new();
        assert_eq!(
            apply_where("SELECT Id FROM Account", &expression),
            "SELECT Id FROM Account"
        );

        let key = expression.add_condition(None).unwrap();
        expression
            .update_condition(key, "Industry", Operator::Equals, "Energy")
            .unwrap();
        assert_eq!(
            apply_where("SELECT Id FROM Account", &expression),
            "SELECT Id FROM Account WHERE Industry = 'Energy'"
        );
        assert_eq!(
            apply_where("SELECT Id FROM Account where Name != null", &expression),
            "SELECT Id FROM Account where Name != null AND (Industry = 'Energy')"
        );
        assert_eq!(
            apply_where(
                "SELECT Id, (SELECT Id FROM Contacts WHERE Email != null) FROM Account",
                &expression
            ),
            "SELECT Id, (SELECT Id FROM Contacts WHERE Email != null) FROM Account \
             WHERE Industry = 'Energy'"
        );
    }

    #[test]
    fn test_grid_to_csv_follows_filter() {
        let records = vec![
            json!({"Id": "001A", "Name": "Acme, Inc."}),
            json!({"Id": "001B", "Name": "Globex"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let mut grid = DataGrid::from_records(records, None);
        grid.set_filter(Some("Name"), "acme").unwrap();
        let csv = grid_to_csv(&grid).unwrap();
        assert_eq!(csv, "Id,Name\n001A,\"Acme, Inc.\"\n");
    }
}
