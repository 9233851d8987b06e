//! Static field definition catalog and the type dependency table.
//!
//! The catalog is pure data: one [`FieldDefinition`] per [`Attribute`] and a
//! fixed table of the attributes each [`FieldType`] needs on top of the base
//! set. The only side-effecting piece, remote option lookup, is injected as a
//! [`ValueSource`] per [`SourceKind`].

use super::source::{SelectOption, SourceContext, ValueSource};
use super::{AttrValue, Attribute, FieldRow, FieldType};
use futures::future::{self, BoxFuture, FutureExt};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
    static ref DISPLAY_FORMAT_NUMBER: Regex = Regex::new(r"\{0+\}").unwrap();
}

/// Checks a non-empty value in the context of its row.
pub type Validator = fn(&AttrValue, &FieldRow) -> bool;

/// Returns true when the attribute should not be editable for the row.
pub type DisabledPredicate = fn(&FieldRow) -> bool;

/// Attributes every row carries regardless of type.
pub const BASE_ATTRIBUTES: [Attribute; 5] = [
    Attribute::Type,
    Attribute::Label,
    Attribute::FullName,
    Attribute::Description,
    Attribute::InlineHelpText,
];

/// How an attribute is edited.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Picklist,
    Text,
    Textarea,
    Radio,
    Checkbox,
}

/// Remote option lists that need a live connection.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ReferenceObjects,
    GlobalValueSets,
}

/// Where the options of a picklist or radio attribute come from.
///
#[derive(Clone, Copy, Debug)]
pub enum OptionSource {
    None,
    Static(&'static [(&'static str, &'static str)]),
    Remote(SourceKind),
}

/// Static description of one attribute.
///
#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
    /// Imported values are parsed as integers.
    pub numeric: bool,
    pub default: AttrValue,
    pub options: OptionSource,
    pub validator: Option<Validator>,
    pub disabled: Option<DisabledPredicate>,
}

impl FieldDefinition {
    fn new(label: &'static str, input: InputKind) -> Self {
        let default = match input {
            InputKind::Checkbox => AttrValue::Bool(false),
            _ => AttrValue::text(""),
        };
        FieldDefinition {
            label,
            input,
            required: false,
            numeric: false,
            default,
            options: OptionSource::None,
            validator: None,
            disabled: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn numeric(mut self, default: i64) -> Self {
        self.numeric = true;
        self.default = AttrValue::Number(default);
        self
    }

    fn default_value(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = value.into();
        self
    }

    fn options(mut self, options: OptionSource) -> Self {
        self.options = options;
        self
    }

    fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn disabled(mut self, predicate: DisabledPredicate) -> Self {
        self.disabled = Some(predicate);
        self
    }

    /// Whether the attribute is locked for the given row.
    ///
    pub fn is_disabled(&self, row: &FieldRow) -> bool {
        self.disabled.map(|p| p(row)).unwrap_or(false)
    }

    /// Run the validator, treating a missing validator as a pass.
    ///
    pub fn validates(&self, value: &AttrValue, row: &FieldRow) -> bool {
        self.validator.map(|v| v(value, row)).unwrap_or(true)
    }
}

static FIELD_TYPE_OPTIONS: [(&str, &str); 19] = [
    ("AutoNumber", "Auto Number"),
    ("Checkbox", "Checkbox"),
    ("Currency", "Currency"),
    ("Date", "Date"),
    ("DateTime", "Date/Time"),
    ("Email", "Email"),
    ("EncryptedText", "Text (Encrypted)"),
    ("Html", "Text Area (Rich)"),
    ("LongTextArea", "Text Area (Long)"),
    ("Lookup", "Lookup Relationship"),
    ("MasterDetail", "Master-Detail Relationship"),
    ("MultiselectPicklist", "Picklist (Multi-Select)"),
    ("Number", "Number"),
    ("Percent", "Percent"),
    ("Phone", "Phone"),
    ("Picklist", "Picklist"),
    ("Text", "Text"),
    ("TextArea", "Text Area"),
    ("Url", "URL"),
];

static DELETE_CONSTRAINT_OPTIONS: [(&str, &str); 3] = [
    ("SetNull", "Clear the value of this field"),
    ("Restrict", "Don't allow deletion of the lookup record"),
    ("Cascade", "Delete this record also"),
];

static MASK_TYPE_OPTIONS: [(&str, &str); 6] = [
    ("all", "Mask All Characters"),
    ("lastFour", "Last Four Characters Clear"),
    ("creditCard", "Credit Card Number"),
    ("nino", "National Insurance Number"),
    ("ssn", "Social Security Number"),
    ("sin", "Social Insurance Number"),
];

static MASK_CHAR_OPTIONS: [(&str, &str); 2] = [("asterisk", "*"), ("X", "X")];

/// Return the extra attributes a field type needs beyond the base set.
///
pub fn dependencies(field_type: FieldType) -> &'static [Attribute] {
    use Attribute::*;
    match field_type {
        FieldType::AutoNumber => &[DisplayFormat, StartingNumber, ExternalId],
        FieldType::Checkbox => &[DefaultCheckboxValue, TrackHistory],
        FieldType::Currency | FieldType::Percent => {
            &[Precision, Scale, Required, DefaultValue, TrackHistory]
        }
        FieldType::Date | FieldType::DateTime | FieldType::Phone | FieldType::Url => {
            &[Required, DefaultValue, TrackHistory]
        }
        FieldType::TextArea => &[Required, DefaultValue, TrackHistory],
        FieldType::Email => &[Required, Unique, ExternalId, DefaultValue, TrackHistory],
        FieldType::EncryptedText => &[Length, Required, MaskType, MaskChar, TrackHistory],
        FieldType::Html => &[Length, VisibleLines, TrackHistory],
        FieldType::LongTextArea => &[Length, VisibleLines, Required, DefaultValue, TrackHistory],
        FieldType::Lookup => &[
            ReferenceTo,
            RelationshipName,
            RelationshipLabel,
            DeleteConstraint,
            Required,
            TrackHistory,
        ],
        FieldType::MasterDetail => &[
            ReferenceTo,
            RelationshipName,
            RelationshipLabel,
            ReparentableMasterDetail,
            WriteRequiresMasterRead,
            TrackHistory,
        ],
        FieldType::MultiselectPicklist => &[
            ValueSet,
            GlobalValueSet,
            Restricted,
            Sorted,
            FirstAsDefault,
            VisibleLines,
            Required,
            TrackHistory,
        ],
        FieldType::Number => &[
            Precision,
            Scale,
            Required,
            Unique,
            ExternalId,
            DefaultValue,
            TrackHistory,
        ],
        FieldType::Picklist => &[
            ValueSet,
            GlobalValueSet,
            Restricted,
            Sorted,
            FirstAsDefault,
            Required,
            TrackHistory,
        ],
        FieldType::Text => &[
            Length,
            Required,
            Unique,
            CaseSensitive,
            ExternalId,
            DefaultValue,
            TrackHistory,
        ],
    }
}

fn is_api_name(value: &str) -> bool {
    let name = value.strip_suffix("__c").unwrap_or(value);
    IDENTIFIER.is_match(name)
        && !name.contains("__")
        && !name.ends_with('_')
        && name.len() <= super::naming::MAX_API_NAME_LENGTH
}

fn int_in(value: &AttrValue, min: i64, max: i64) -> bool {
    value.as_i64().map(|n| n >= min && n <= max).unwrap_or(false)
}

fn text_max(value: &AttrValue, max: usize) -> bool {
    value.to_string().chars().count() <= max
}

fn validate_type(value: &AttrValue, _row: &FieldRow) -> bool {
    value
        .as_str()
        .map(|s| s.parse::<FieldType>().is_ok())
        .unwrap_or(false)
}

fn validate_label(value: &AttrValue, _row: &FieldRow) -> bool {
    text_max(value, 40)
}

fn validate_api_name(value: &AttrValue, _row: &FieldRow) -> bool {
    value.as_str().map(is_api_name).unwrap_or(false)
}

fn validate_object_name(value: &AttrValue, _row: &FieldRow) -> bool {
    value.as_str().map(|s| IDENTIFIER.is_match(s)).unwrap_or(false)
}

fn validate_description(value: &AttrValue, _row: &FieldRow) -> bool {
    text_max(value, 1000)
}

fn validate_help_text(value: &AttrValue, _row: &FieldRow) -> bool {
    text_max(value, 510)
}

fn validate_length(value: &AttrValue, row: &FieldRow) -> bool {
    match row.field_type() {
        Some(FieldType::EncryptedText) => int_in(value, 1, 175),
        Some(FieldType::LongTextArea) | Some(FieldType::Html) => int_in(value, 256, 131_072),
        _ => int_in(value, 1, 255),
    }
}

fn validate_precision(value: &AttrValue, _row: &FieldRow) -> bool {
    int_in(value, 1, 18)
}

fn validate_scale(value: &AttrValue, row: &FieldRow) -> bool {
    let precision = row.value(Attribute::Precision).as_i64().unwrap_or(18);
    int_in(value, 0, precision.min(17))
}

fn validate_visible_lines(value: &AttrValue, row: &FieldRow) -> bool {
    match row.field_type() {
        Some(FieldType::MultiselectPicklist) => int_in(value, 3, 10),
        Some(FieldType::LongTextArea) | Some(FieldType::Html) => int_in(value, 2, 50),
        _ => int_in(value, 1, 50),
    }
}

fn validate_starting_number(value: &AttrValue, _row: &FieldRow) -> bool {
    int_in(value, 0, 999_999_999)
}

fn validate_display_format(value: &AttrValue, _row: &FieldRow) -> bool {
    value
        .as_str()
        .map(|s| DISPLAY_FORMAT_NUMBER.is_match(s))
        .unwrap_or(false)
}

/// Literal value sets are one value per line, distinct, non-empty and at
/// most 255 characters each.
fn validate_value_set(value: &AttrValue, _row: &FieldRow) -> bool {
    let text = match value.as_str() {
        Some(text) => text,
        None => return false,
    };
    let mut seen = std::collections::HashSet::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.chars().count() > 255 || !seen.insert(line.to_lowercase()) {
            return false;
        }
    }
    !seen.is_empty()
}

fn unless_unique(row: &FieldRow) -> bool {
    !row.value(Attribute::Unique).as_bool()
}

fn when_global_value_set(row: &FieldRow) -> bool {
    row.picklist_global_value_set
}

fn unless_global_value_set(row: &FieldRow) -> bool {
    !row.picklist_global_value_set
}

fn define(attribute: Attribute) -> FieldDefinition {
    use InputKind::*;
    match attribute {
        Attribute::Type => FieldDefinition::new("Field Type", Picklist)
            .required()
            .default_value(FieldType::default().api_name())
            .options(OptionSource::Static(&FIELD_TYPE_OPTIONS))
            .validator(validate_type),
        Attribute::Label => FieldDefinition::new("Field Label", Text)
            .required()
            .validator(validate_label),
        Attribute::FullName => FieldDefinition::new("Field Name", Text)
            .required()
            .validator(validate_api_name),
        Attribute::Description => {
            FieldDefinition::new("Description", Textarea).validator(validate_description)
        }
        Attribute::InlineHelpText => {
            FieldDefinition::new("Help Text", Textarea).validator(validate_help_text)
        }
        Attribute::Required => FieldDefinition::new("Required", Checkbox),
        Attribute::Unique => FieldDefinition::new("Unique", Checkbox),
        Attribute::ExternalId => FieldDefinition::new("External ID", Checkbox),
        Attribute::CaseSensitive => {
            FieldDefinition::new("Case Sensitive", Checkbox).disabled(unless_unique)
        }
        Attribute::DefaultValue => FieldDefinition::new("Default Value", Text),
        Attribute::DefaultCheckboxValue => FieldDefinition::new("Checked by Default", Checkbox),
        Attribute::Length => FieldDefinition::new("Length", Text)
            .required()
            .numeric(255)
            .validator(validate_length),
        Attribute::Precision => FieldDefinition::new("Length (Digits)", Text)
            .required()
            .numeric(18)
            .validator(validate_precision),
        Attribute::Scale => FieldDefinition::new("Decimal Places", Text)
            .required()
            .numeric(0)
            .validator(validate_scale),
        Attribute::VisibleLines => FieldDefinition::new("Visible Lines", Text)
            .required()
            .numeric(3)
            .validator(validate_visible_lines),
        Attribute::ReferenceTo => FieldDefinition::new("Related To", Picklist)
            .required()
            .options(OptionSource::Remote(SourceKind::ReferenceObjects))
            .validator(validate_object_name),
        Attribute::RelationshipName => FieldDefinition::new("Child Relationship Name", Text)
            .required()
            .validator(validate_api_name),
        Attribute::RelationshipLabel => FieldDefinition::new("Related List Label", Text)
            .validator(validate_label),
        Attribute::DeleteConstraint => FieldDefinition::new("On Delete", Radio)
            .required()
            .default_value("SetNull")
            .options(OptionSource::Static(&DELETE_CONSTRAINT_OPTIONS)),
        Attribute::ReparentableMasterDetail => {
            FieldDefinition::new("Allow Reparenting", Checkbox)
        }
        Attribute::WriteRequiresMasterRead => {
            FieldDefinition::new("Write Requires Master Read", Checkbox)
        }
        Attribute::ValueSet => FieldDefinition::new("Values (one per line)", Textarea)
            .validator(validate_value_set)
            .disabled(when_global_value_set),
        Attribute::GlobalValueSet => FieldDefinition::new("Global Value Set", Picklist)
            .options(OptionSource::Remote(SourceKind::GlobalValueSets))
            .disabled(unless_global_value_set),
        Attribute::Restricted => FieldDefinition::new("Restrict to Value Set", Checkbox)
            .default_value(true)
            .disabled(when_global_value_set),
        Attribute::FirstAsDefault => FieldDefinition::new("First Value as Default", Checkbox)
            .disabled(when_global_value_set),
        Attribute::Sorted => FieldDefinition::new("Sort Alphabetically", Checkbox)
            .disabled(when_global_value_set),
        Attribute::DisplayFormat => FieldDefinition::new("Display Format", Text)
            .required()
            .default_value("A-{0000}")
            .validator(validate_display_format),
        Attribute::StartingNumber => FieldDefinition::new("Starting Number", Text)
            .required()
            .numeric(0)
            .validator(validate_starting_number),
        Attribute::MaskType => FieldDefinition::new("Mask Type", Picklist)
            .required()
            .default_value("all")
            .options(OptionSource::Static(&MASK_TYPE_OPTIONS)),
        Attribute::MaskChar => FieldDefinition::new("Mask Character", Radio)
            .required()
            .default_value("asterisk")
            .options(OptionSource::Static(&MASK_CHAR_OPTIONS)),
        Attribute::TrackHistory => FieldDefinition::new("Track Field History", Checkbox),
    }
}

/// Attribute metadata plus injected option sources.
///
pub struct Catalog {
    definitions: Vec<FieldDefinition>,
    sources: HashMap<SourceKind, Arc<dyn ValueSource>>,
}

impl Catalog {
    /// Return a catalog without remote option sources.
    ///
    pub fn new() -> Self {
        Catalog {
            definitions: Attribute::ALL.iter().map(|a| define(*a)).collect(),
            sources: HashMap::new(),
        }
    }

    /// Register the source used for a remote option list.
    ///
    pub fn with_source(mut self, kind: SourceKind, source: Arc<dyn ValueSource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    /// Return the definition of an attribute.
    ///
    pub fn definition(&self, attribute: Attribute) -> &FieldDefinition {
        // Attribute::ALL is in declaration order, so the discriminant indexes it.
        &self.definitions[attribute as usize]
    }

    /// Return the extra attributes for a type.
    ///
    pub fn dependencies(&self, field_type: FieldType) -> &'static [Attribute] {
        dependencies(field_type)
    }

    /// Return the attributes that apply to a row in catalog order: the base
    /// set plus the dependencies of the row's type.
    ///
    pub fn applicable(&self, row: &FieldRow) -> Vec<Attribute> {
        let mut attributes = BASE_ATTRIBUTES.to_vec();
        if let Some(field_type) = row.field_type() {
            attributes.extend_from_slice(dependencies(field_type));
        }
        attributes.sort();
        attributes.dedup();
        attributes
    }

    pub fn is_applicable(&self, row: &FieldRow, attribute: Attribute) -> bool {
        BASE_ATTRIBUTES.contains(&attribute)
            || row
                .field_type()
                .map(|t| dependencies(t).contains(&attribute))
                .unwrap_or(false)
    }

    /// Return options known without a connection.
    ///
    pub fn static_options(&self, attribute: Attribute) -> Option<Vec<SelectOption>> {
        match self.definition(attribute).options {
            OptionSource::Static(options) => Some(
                options
                    .iter()
                    .map(|(value, label)| SelectOption::new(*value, *label))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Resolve the options of an attribute. Remote lists are fetched on
    /// every call; callers keep the result for as long as the control that
    /// asked for it stays open.
    ///
    pub fn options(
        &self,
        attribute: Attribute,
        ctx: SourceContext,
    ) -> BoxFuture<'static, anyhow::Result<Vec<SelectOption>>> {
        match self.definition(attribute).options {
            OptionSource::None => future::ready(Ok(vec![])).boxed(),
            OptionSource::Static(_) => {
                future::ready(Ok(self.static_options(attribute).unwrap_or_default())).boxed()
            }
            OptionSource::Remote(kind) => match self.sources.get(&kind) {
                Some(source) => {
                    let source = Arc::clone(source);
                    async move { source.fetch(&ctx).await }.boxed()
                }
                None => future::ready(Err(anyhow::anyhow!(
                    "No option source registered for {:?}",
                    kind
                )))
                .boxed(),
            },
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}
