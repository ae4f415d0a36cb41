//! Declarative field schema for generic CRUD pages.
//!
//! A page is described by a list of [`FieldDescriptor`]s. The same list
//! drives the table columns, the filter panel and the create/edit form;
//! [`coerce_form`] turns a flat `name → string` form submission into the
//! JSON payload the API expects.

use std::collections::BTreeMap;

use fleetdesk_client::Resource;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::number;

/// Flat form submission: field name → raw input string.
pub type FormData = BTreeMap<String, String>;

/// Foreign-key target of a select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Resource whose records populate the option list.
    pub resource: Resource,
    /// Dotted path used to display the related record in table cells
    /// (e.g. `category.name` for a `categoryId` field).
    pub display_path: Option<String>,
    /// Page where new related records can be created.
    pub create_link: Option<String>,
}

/// Input kind. Only `Select` carries a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Select(Relation),
}

/// How a raw form string becomes a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Keep,
    Number,
    Id,
}

impl FieldKind {
    /// Coercion table, keyed by input kind.
    pub fn coercion(&self) -> Coercion {
        match self {
            FieldKind::Text | FieldKind::Email => Coercion::Keep,
            FieldKind::Number => Coercion::Number,
            FieldKind::Select(_) => Coercion::Id,
        }
    }

    /// HTML-style input type name.
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Number => "number",
            FieldKind::Select(_) => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(String),

    #[error("{label} must be a number (got \"{value}\")")]
    InvalidNumber { label: String, value: String },

    #[error("Select {0}")]
    MissingSelection(String),

    #[error("{label}: invalid id \"{value}\"")]
    InvalidId { label: String, value: String },
}

/// One editable attribute of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn select(name: &str, label: &str, resource: Resource) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select(Relation {
                resource,
                display_path: None,
                create_link: None,
            }),
        )
    }

    /// Display related records through `path`. No-op on non-select fields.
    pub fn display(mut self, path: &str) -> Self {
        if let FieldKind::Select(rel) = &mut self.kind {
            rel.display_path = Some(path.to_string());
        }
        self
    }

    /// Link to the related resource's page. No-op on non-select fields.
    pub fn create_link(mut self, link: &str) -> Self {
        if let FieldKind::Select(rel) = &mut self.kind {
            rel.create_link = Some(link.to_string());
        }
        self
    }

    pub fn relation(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Select(rel) => Some(rel),
            _ => None,
        }
    }

    /// Path shown in table cells: the relation's display path, else the field name.
    pub fn display_path(&self) -> &str {
        self.relation()
            .and_then(|r| r.display_path.as_deref())
            .unwrap_or(&self.name)
    }

    /// Coerce one raw input string.
    pub fn coerce(&self, raw: &str) -> Result<Value, FormError> {
        let trimmed = raw.trim();
        match self.kind.coercion() {
            Coercion::Keep => {
                if trimmed.is_empty() {
                    return Err(FormError::Required(self.label.clone()));
                }
                Ok(Value::String(raw.to_string()))
            }
            Coercion::Number => {
                if trimmed.is_empty() {
                    return Err(FormError::Required(self.label.clone()));
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(number::compact(n)),
                    _ => Err(FormError::InvalidNumber {
                        label: self.label.clone(),
                        value: raw.to_string(),
                    }),
                }
            }
            Coercion::Id => {
                if trimmed.is_empty() {
                    return Err(FormError::MissingSelection(self.label.clone()));
                }
                trimmed
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| FormError::InvalidId {
                        label: self.label.clone(),
                        value: raw.to_string(),
                    })
            }
        }
    }
}

/// Build the JSON payload for a form submission.
///
/// Only schema fields are read; a field absent from `form` counts as empty.
/// The first failing field, in schema order, is reported.
pub fn coerce_form(fields: &[FieldDescriptor], form: &FormData) -> Result<Map<String, Value>, FormError> {
    let mut payload = Map::new();
    for field in fields {
        let raw = form.get(&field.name).map(String::as_str).unwrap_or("");
        payload.insert(field.name.clone(), field.coerce(raw)?);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn material_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::number("weight", "Weight"),
            FieldDescriptor::select("categoryId", "Category", Resource::MaterialCategories)
                .display("category.name"),
        ]
    }

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn coercion_table_by_kind() {
        assert_eq!(FieldKind::Text.coercion(), Coercion::Keep);
        assert_eq!(FieldKind::Email.coercion(), Coercion::Keep);
        assert_eq!(FieldKind::Number.coercion(), Coercion::Number);
        let sel = FieldDescriptor::select("x", "X", Resource::Edges);
        assert_eq!(sel.kind.coercion(), Coercion::Id);
    }

    #[test]
    fn form_is_coerced_per_field() {
        let payload = coerce_form(
            &material_fields(),
            &form(&[("name", "Sand"), ("weight", " 12 "), ("categoryId", "2"), ("extra", "x")]),
        )
        .unwrap();
        assert_eq!(Value::Object(payload), json!({"name": "Sand", "weight": 12, "categoryId": 2}));
    }

    #[test]
    fn fractional_numbers_survive() {
        let f = FieldDescriptor::number("weight", "Weight");
        assert_eq!(f.coerce("2.5").unwrap(), json!(2.5));
    }

    #[test]
    fn first_failing_field_is_reported() {
        let err = coerce_form(&material_fields(), &form(&[("name", "  "), ("weight", "abc")])).unwrap_err();
        assert_eq!(err, FormError::Required("Name".into()));

        let err = coerce_form(&material_fields(), &form(&[("name", "Sand"), ("weight", "abc")])).unwrap_err();
        assert!(matches!(err, FormError::InvalidNumber { .. }));

        let err = coerce_form(&material_fields(), &form(&[("name", "Sand"), ("weight", "1")])).unwrap_err();
        assert_eq!(err.to_string(), "Select Category");
    }

    #[test]
    fn display_path_falls_back_to_name() {
        let fields = material_fields();
        assert_eq!(fields[0].display_path(), "name");
        assert_eq!(fields[2].display_path(), "category.name");
        // Relation builders are ignored on plain fields.
        let plain = FieldDescriptor::text("code", "Code").display("x.y");
        assert_eq!(plain.display_path(), "code");
    }
}
