//! Typed records and dotted-path resolution.
//!
//! Every resource has a concrete record type. Table cells and form
//! defaults are read through [`Record::resolve`], which walks a dotted path
//! over the record's known nested shapes only. Unknown or missing segments
//! resolve to `None`; resolution never panics.

use std::fmt;

use fleetdesk_client::{ApiError, Envelope, Resource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::field::FieldDescriptor;
use crate::model::{Edge, Material, MaterialCategory, Transporter, VehicleType};
use crate::shipment::Shipment;

/// A resolved scalar, ready for display or as a form default.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(n) => write!(f, "{}", n),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// `Some(Text)` for a present string.
pub(crate) fn text(s: &Option<String>) -> Option<CellValue> {
    s.as_deref().map(CellValue::from)
}

/// Decode `null` as the type's default. Missing keys still need
/// `#[serde(default)]`.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Split `a.b.c` into `("a", Some("b.c"))`; a single segment has no rest.
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// A decoded API record with an integer id.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> i64;

    /// Resolve a dotted path, e.g. `name` or `category.name`.
    fn resolve(&self, path: &str) -> Option<CellValue>;
}

/// A record editable through a generic CRUD page.
pub trait Entity: Record {
    const RESOURCE: Resource;
    const TITLE: &'static str;

    /// Default field schema for this resource's page.
    fn fields() -> Vec<FieldDescriptor>;
}

/// One choice in a foreign-key select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
}

impl SelectOption {
    /// Option for `record`, labelled through `label_path`, then `name`,
    /// then the bare id. Empty labels count as missing.
    pub fn from_record<R: Record>(record: &R, label_path: Option<&str>) -> Self {
        let non_empty = |path: &str| {
            record
                .resolve(path)
                .map(|v| v.to_string())
                .filter(|s| !s.is_empty())
        };
        let label = label_path
            .and_then(non_empty)
            .or_else(|| non_empty("name"))
            .unwrap_or_else(|| record.id().to_string());
        Self { value: record.id(), label }
    }

    /// Find the label of the option with id `value`.
    pub fn label_of(options: &[SelectOption], value: i64) -> Option<&str> {
        options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

/// Label path on the related record for a select field.
///
/// A display path like `category.name` addresses the related record from
/// the owning row; on the option record itself only `name` remains.
pub fn option_label_path(field: &FieldDescriptor) -> Option<&str> {
    let path = field.relation()?.display_path.as_deref()?;
    match split_path(path) {
        (_, Some(rest)) => Some(rest),
        (head, None) => Some(head),
    }
}

fn collect<R: Record>(env: &Envelope, label_path: Option<&str>) -> Result<Vec<SelectOption>, ApiError> {
    let rows: Vec<R> = env.data_as()?;
    Ok(rows
        .iter()
        .map(|r| SelectOption::from_record(r, label_path))
        .collect())
}

/// Decode a list envelope of `resource` into select options.
pub fn decode_options(
    resource: Resource,
    env: &Envelope,
    label_path: Option<&str>,
) -> Result<Vec<SelectOption>, ApiError> {
    match resource {
        Resource::Transporters => collect::<Transporter>(env, label_path),
        Resource::Materials => collect::<Material>(env, label_path),
        Resource::MaterialCategories => collect::<MaterialCategory>(env, label_path),
        Resource::VehicleTypes => collect::<VehicleType>(env, label_path),
        Resource::Edges => collect::<Edge>(env, label_path),
        Resource::Shipments => collect::<Shipment>(env, label_path),
    }
}
