// crates/pmc-rs-export/src/names.rs
//! Identifier spelling shared by the exporters.

use pmc_rs::Lookup;
use uuid::Uuid;

/// Replaces everything that can't appear in a C identifier with `_`.
pub fn c_identifier(text: &str) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// `interface.h` -> `INTERFACE_H`.
pub fn include_guard(file_name: &str) -> String {
    c_identifier(file_name).to_ascii_uppercase()
}

/// Name of the interface item variable generated for a parameter-like node:
/// `interfaceItem_` followed by its path in the parameter tree.
pub fn interface_item(lookup: &Lookup, parameter: Uuid) -> String {
    let path = lookup
        .parameters()
        .map(|tree| tree.name_path(parameter))
        .unwrap_or_default();
    format!("interfaceItem_{}", c_identifier(&path.join("_")))
}

/// C type suffix of an interface item: the parameter's type name, `int16`
/// when unset.
pub fn item_type(lookup: &Lookup, parameter: Uuid) -> String {
    lookup
        .parameter_str(parameter, "type_name")
        .filter(|t| !t.is_empty())
        .map(|t| c_identifier(&t))
        .unwrap_or_else(|| "int16".to_string())
}

/// Whether the node stands for a parameter with an interface item. Legacy
/// parameters are reached through getter/setter functions instead.
pub fn uses_interface_item(lookup: &Lookup, parameter: Uuid) -> bool {
    lookup
        .parameter_attribute(parameter, "uses_interface_item")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}
