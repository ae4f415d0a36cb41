//! Records for the plain CRUD resources and their page schemas.

use fleetdesk_client::Resource;
use serde::{Deserialize, Serialize};

use crate::field::FieldDescriptor;
use crate::record::{split_path, text, CellValue, Entity, Record};

// ── Transporter ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transporter {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    #[serde(default)]
    pub gstno: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Record for Transporter {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("name", None) => Some(self.name.as_str().into()),
            ("gstno", None) => text(&self.gstno),
            ("email", None) => text(&self.email),
            ("address", None) => text(&self.address),
            _ => None,
        }
    }
}

impl Entity for Transporter {
    const RESOURCE: Resource = Resource::Transporters;
    const TITLE: &'static str = "Transporters";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::text("gstno", "GST No"),
            FieldDescriptor::email("email", "Email"),
            FieldDescriptor::text("address", "Address"),
        ]
    }
}

// ── Material category ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCategory {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
}

impl Record for MaterialCategory {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("name", None) => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl Entity for MaterialCategory {
    const RESOURCE: Resource = Resource::MaterialCategories;
    const TITLE: &'static str = "Material Categories";

    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::text("name", "Name")]
    }
}

// ── Material ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Expanded category, when the server includes it.
    #[serde(default)]
    pub category: Option<MaterialCategory>,
}

impl Record for Material {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("name", None) => Some(self.name.as_str().into()),
            ("code", None) => text(&self.code),
            ("desc", None) => text(&self.desc),
            ("categoryId", None) => self.category_id.map(CellValue::from),
            ("category", Some(rest)) => self.category.as_ref()?.resolve(rest),
            _ => None,
        }
    }
}

impl Entity for Material {
    const RESOURCE: Resource = Resource::Materials;
    const TITLE: &'static str = "Materials";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::text("code", "Code"),
            FieldDescriptor::text("desc", "Description"),
            FieldDescriptor::select("categoryId", "Category", Resource::MaterialCategories)
                .display("category.name")
                .create_link("/material-categories"),
        ]
    }
}

// ── Vehicle type ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleType {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    /// Capacity weight.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Record for VehicleType {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("name", None) => Some(self.name.as_str().into()),
            ("weight", None) => self.weight.map(CellValue::from),
            _ => None,
        }
    }
}

impl Entity for VehicleType {
    const RESOURCE: Resource = Resource::VehicleTypes;
    const TITLE: &'static str = "Vehicle Types";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("name", "Name"),
            FieldDescriptor::number("weight", "Weight"),
        ]
    }
}

// ── Edge ────────────────────────────────────────────────────────────

/// A location usable as a route leg source or destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
}

impl Record for Edge {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("name", None) => Some(self.name.as_str().into()),
            _ => None,
        }
    }
}

impl Entity for Edge {
    const RESOURCE: Resource = Resource::Edges;
    const TITLE: &'static str = "Edges";

    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::text("name", "Name")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn material(v: serde_json::Value) -> Material {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn nested_path_resolves_through_category() {
        let m = material(json!({
            "id": 3, "name": "Sand", "categoryId": 2,
            "category": {"id": 2, "name": "Aggregates"}
        }));
        assert_eq!(m.resolve("category.name"), Some(CellValue::from("Aggregates")));
        assert_eq!(m.resolve("categoryId"), Some(CellValue::Int(2)));
    }

    #[test]
    fn missing_intermediate_is_none() {
        let m = material(json!({"id": 3, "name": "Sand"}));
        assert_eq!(m.resolve("category.name"), None);
        assert_eq!(m.resolve("category.name.first"), None);
        assert_eq!(m.resolve("category"), None);
        assert_eq!(m.resolve(""), None);
        assert_eq!(m.resolve("name.length"), None);
        assert_eq!(m.resolve("nope"), None);
    }

    #[test]
    fn every_schema_field_is_resolvable_on_a_full_record() {
        let t: Transporter = serde_json::from_value(json!({
            "id": 1, "name": "Acme", "gstno": "GST1", "email": "a@b.c", "address": "Dock 4"
        }))
        .unwrap();
        for f in Transporter::fields() {
            assert!(t.resolve(f.display_path()).is_some(), "{}", f.name);
        }

        let v: VehicleType = serde_json::from_value(json!({"id": 1, "name": "Truck", "weight": 12})).unwrap();
        for f in VehicleType::fields() {
            assert!(v.resolve(f.display_path()).is_some(), "{}", f.name);
        }
    }

    #[test]
    fn null_optional_fields_decode() {
        let t: Transporter = serde_json::from_value(json!({"id": 1, "name": "Acme", "gstno": null})).unwrap();
        assert_eq!(t.resolve("gstno"), None);
        assert_eq!(t.resolve("id"), Some(CellValue::Int(1)));
    }

    #[test]
    fn null_name_decodes_as_empty() {
        let rows: Vec<Transporter> =
            serde_json::from_value(json!([{"id": 1, "name": "Acme"}, {"id": 2, "name": null}])).unwrap();
        assert_eq!(rows[1].name, "");
        let m = material(json!({"id": 3, "name": null, "category": {"id": 2, "name": null}}));
        assert_eq!(m.resolve("category.name"), Some(CellValue::from("")));
    }
}
