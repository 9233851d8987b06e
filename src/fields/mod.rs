//! Custom-field authoring: the attribute catalog, field rows, and the
//! reducers that mutate and validate them.

mod attribute;
mod catalog;
mod error;
pub mod naming;
mod payload;
mod reducer;
mod row;
mod source;
mod transfer;
mod validity;
mod value;

pub use attribute::{Attribute, FieldType};
pub use catalog::{
    dependencies, Catalog, FieldDefinition, InputKind, OptionSource, SourceKind, BASE_ATTRIBUTES,
};
pub use error::FieldsError;
pub use payload::{field_metadata, prepare_payload, FieldMetadata};
pub use reducer::{Action, RowStore, ACTION_NAMES};
pub use row::{FieldRow, RowKey};
pub use source::{
    referenceable, GlobalValueSetSource, ReferenceObjectsSource, SelectOption, SourceContext,
    ValueSource,
};
pub use transfer::{
    export_rows, import_records, parse_boolish, read_csv, read_csv_file, write_csv,
    write_csv_file, TabularRecord,
};
pub use validity::{validate, validate_row, Validation, INVALID_FORMAT_MESSAGE, REQUIRED_MESSAGE};
pub use value::{AttrValue, AttributeState};
