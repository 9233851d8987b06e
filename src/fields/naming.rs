//! Derivation of API-safe identifiers from human labels.

/// Maximum length of a custom field API name, without the `__c` suffix.
pub const MAX_API_NAME_LENGTH: usize = 40;

/// Suffix the platform appends to custom field API names.
pub const CUSTOM_SUFFIX: &str = "__c";

/// Derive an API name from a label.
///
/// Whitespace becomes `_`, every other character outside `[A-Za-z0-9_]` is
/// dropped, runs of `_` collapse, leading and trailing `_` are stripped, a
/// leading digit gets an `X` prefix and the result is cut to 40 characters.
/// Returns `None` when nothing usable is left.
///
pub fn api_name_from_label(label: &str) -> Option<String> {
    let mut name = String::with_capacity(label.len());
    for c in label.chars() {
        let c = if c.is_whitespace() { '_' } else { c };
        if !(c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }

    let mut name = name.trim_matches('_').to_string();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'X');
    }
    name.truncate(MAX_API_NAME_LENGTH);
    let name = name.trim_end_matches('_');

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Return the qualified identifier of a custom field on an object, e.g.
/// `Account.My_Field__c`.
///
pub fn qualified_field_name(sobject: &str, api_name: &str) -> String {
    if api_name.ends_with(CUSTOM_SUFFIX) {
        format!("{}.{}", sobject, api_name)
    } else {
        format!("{}.{}{}", sobject, api_name, CUSTOM_SUFFIX)
    }
}
