//! Closed enumerations of field attributes and field types.
//!
//! Attribute names serialize as the camelCase metadata names used by the
//! platform (`fullName`, `inlineHelpText`, ...) so that CSV headers and JSON
//! payloads line up with what administrators already know.

use super::FieldsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One authorable property of a custom field.
///
/// Declaration order is the column order used for exports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Type,
    Label,
    FullName,
    Description,
    InlineHelpText,
    Required,
    Unique,
    ExternalId,
    CaseSensitive,
    DefaultValue,
    DefaultCheckboxValue,
    Length,
    Precision,
    Scale,
    VisibleLines,
    ReferenceTo,
    RelationshipName,
    RelationshipLabel,
    DeleteConstraint,
    ReparentableMasterDetail,
    WriteRequiresMasterRead,
    ValueSet,
    GlobalValueSet,
    Restricted,
    FirstAsDefault,
    Sorted,
    DisplayFormat,
    StartingNumber,
    MaskType,
    MaskChar,
    TrackHistory,
}

impl Attribute {
    pub const ALL: [Attribute; 31] = [
        Attribute::Type,
        Attribute::Label,
        Attribute::FullName,
        Attribute::Description,
        Attribute::InlineHelpText,
        Attribute::Required,
        Attribute::Unique,
        Attribute::ExternalId,
        Attribute::CaseSensitive,
        Attribute::DefaultValue,
        Attribute::DefaultCheckboxValue,
        Attribute::Length,
        Attribute::Precision,
        Attribute::Scale,
        Attribute::VisibleLines,
        Attribute::ReferenceTo,
        Attribute::RelationshipName,
        Attribute::RelationshipLabel,
        Attribute::DeleteConstraint,
        Attribute::ReparentableMasterDetail,
        Attribute::WriteRequiresMasterRead,
        Attribute::ValueSet,
        Attribute::GlobalValueSet,
        Attribute::Restricted,
        Attribute::FirstAsDefault,
        Attribute::Sorted,
        Attribute::DisplayFormat,
        Attribute::StartingNumber,
        Attribute::MaskType,
        Attribute::MaskChar,
        Attribute::TrackHistory,
    ];

    /// Return the metadata name of the attribute.
    ///
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Type => "type",
            Attribute::Label => "label",
            Attribute::FullName => "fullName",
            Attribute::Description => "description",
            Attribute::InlineHelpText => "inlineHelpText",
            Attribute::Required => "required",
            Attribute::Unique => "unique",
            Attribute::ExternalId => "externalId",
            Attribute::CaseSensitive => "caseSensitive",
            Attribute::DefaultValue => "defaultValue",
            Attribute::DefaultCheckboxValue => "defaultCheckboxValue",
            Attribute::Length => "length",
            Attribute::Precision => "precision",
            Attribute::Scale => "scale",
            Attribute::VisibleLines => "visibleLines",
            Attribute::ReferenceTo => "referenceTo",
            Attribute::RelationshipName => "relationshipName",
            Attribute::RelationshipLabel => "relationshipLabel",
            Attribute::DeleteConstraint => "deleteConstraint",
            Attribute::ReparentableMasterDetail => "reparentableMasterDetail",
            Attribute::WriteRequiresMasterRead => "writeRequiresMasterRead",
            Attribute::ValueSet => "valueSet",
            Attribute::GlobalValueSet => "globalValueSet",
            Attribute::Restricted => "restricted",
            Attribute::FirstAsDefault => "firstAsDefault",
            Attribute::Sorted => "sorted",
            Attribute::DisplayFormat => "displayFormat",
            Attribute::StartingNumber => "startingNumber",
            Attribute::MaskType => "maskType",
            Attribute::MaskChar => "maskChar",
            Attribute::TrackHistory => "trackHistory",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = FieldsError;

    /// Header cells coming from spreadsheets are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Attribute::ALL
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| FieldsError::UnknownAttribute(s.to_string()))
    }
}

/// Data type of a custom field.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    AutoNumber,
    Checkbox,
    Currency,
    Date,
    DateTime,
    Email,
    EncryptedText,
    Html,
    LongTextArea,
    Lookup,
    MasterDetail,
    MultiselectPicklist,
    Number,
    Percent,
    Phone,
    Picklist,
    Text,
    TextArea,
    Url,
}

impl FieldType {
    pub const ALL: [FieldType; 19] = [
        FieldType::AutoNumber,
        FieldType::Checkbox,
        FieldType::Currency,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Email,
        FieldType::EncryptedText,
        FieldType::Html,
        FieldType::LongTextArea,
        FieldType::Lookup,
        FieldType::MasterDetail,
        FieldType::MultiselectPicklist,
        FieldType::Number,
        FieldType::Percent,
        FieldType::Phone,
        FieldType::Picklist,
        FieldType::Text,
        FieldType::TextArea,
        FieldType::Url,
    ];

    /// Return the metadata API name of the type.
    ///
    pub fn api_name(&self) -> &'static str {
        match self {
            FieldType::AutoNumber => "AutoNumber",
            FieldType::Checkbox => "Checkbox",
            FieldType::Currency => "Currency",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Email => "Email",
            FieldType::EncryptedText => "EncryptedText",
            FieldType::Html => "Html",
            FieldType::LongTextArea => "LongTextArea",
            FieldType::Lookup => "Lookup",
            FieldType::MasterDetail => "MasterDetail",
            FieldType::MultiselectPicklist => "MultiselectPicklist",
            FieldType::Number => "Number",
            FieldType::Percent => "Percent",
            FieldType::Phone => "Phone",
            FieldType::Picklist => "Picklist",
            FieldType::Text => "Text",
            FieldType::TextArea => "TextArea",
            FieldType::Url => "Url",
        }
    }

    /// Return the label shown to administrators.
    ///
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::AutoNumber => "Auto Number",
            FieldType::Checkbox => "Checkbox",
            FieldType::Currency => "Currency",
            FieldType::Date => "Date",
            FieldType::DateTime => "Date/Time",
            FieldType::Email => "Email",
            FieldType::EncryptedText => "Text (Encrypted)",
            FieldType::Html => "Text Area (Rich)",
            FieldType::LongTextArea => "Text Area (Long)",
            FieldType::Lookup => "Lookup Relationship",
            FieldType::MasterDetail => "Master-Detail Relationship",
            FieldType::MultiselectPicklist => "Picklist (Multi-Select)",
            FieldType::Number => "Number",
            FieldType::Percent => "Percent",
            FieldType::Phone => "Phone",
            FieldType::Picklist => "Picklist",
            FieldType::Text => "Text",
            FieldType::TextArea => "Text Area",
            FieldType::Url => "URL",
        }
    }

    /// Whether values come from a picklist value set.
    ///
    pub fn is_picklist(&self) -> bool {
        matches!(self, FieldType::Picklist | FieldType::MultiselectPicklist)
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Text
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for FieldType {
    type Err = FieldsError;

    /// Accepts API names or labels, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FieldType::ALL
            .iter()
            .find(|t| {
                t.api_name().eq_ignore_ascii_case(wanted) || t.label().eq_ignore_ascii_case(wanted)
            })
            .copied()
            .ok_or_else(|| FieldsError::UnknownFieldType(s.to_string()))
    }
}
