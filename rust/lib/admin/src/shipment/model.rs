use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::number::serialize_compact;
use crate::record::{split_path, text, CellValue, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransporterRef {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gstno: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRef {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// A material carried on one leg. `name` is display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    pub id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub quantity: f64,
}

/// One source → destination hop as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub source_id: i64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub dest_id: i64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub materials: Vec<MaterialLine>,
}

/// A persisted shipment. `from_source`, `end_destination`, `materials` and
/// `summed_weight` are computed by the server from `routes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    #[serde(default)]
    pub from_source: Option<String>,
    #[serde(default)]
    pub end_destination: Option<String>,
    #[serde(default)]
    pub transporter: Option<TransporterRef>,
    #[serde(default)]
    pub vehicle: Option<VehicleRef>,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub summed_weight: f64,
    #[serde(default, deserialize_with = "crate::record::null_default")]
    pub routes: Vec<RouteLeg>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Parse a timestamp string as RFC 3339, then as a naive UTC date-time or
/// date. Anything unparseable decodes as `None` instead of failing the row.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        _ => return Ok(None),
    };
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(t.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(t.and_utc()));
        }
    }
    Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc()))
}

impl Record for Shipment {
    fn id(&self) -> i64 {
        self.id
    }

    fn resolve(&self, path: &str) -> Option<CellValue> {
        match split_path(path) {
            ("id", None) => Some(self.id.into()),
            ("fromSource", None) => text(&self.from_source),
            ("endDestination", None) => text(&self.end_destination),
            ("materials", None) => text(&self.materials),
            ("summedWeight", None) => Some(self.summed_weight.into()),
            ("createdAt", None) => self.created_at.map(|t| CellValue::Text(t.to_rfc3339())),
            ("transporter", Some(rest)) => {
                let t = self.transporter.as_ref()?;
                match rest {
                    "id" => Some(t.id.into()),
                    "name" => Some(t.name.as_str().into()),
                    "email" => text(&t.email),
                    "gstno" => text(&t.gstno),
                    _ => None,
                }
            }
            ("vehicle", Some(rest)) => {
                let v = self.vehicle.as_ref()?;
                match rest {
                    "id" => Some(v.id.into()),
                    "name" => Some(v.name.as_str().into()),
                    "weight" => v.weight.map(CellValue::from),
                    _ => None,
                }
            }
            // Shipments have no name; options label by id unless told otherwise.
            _ => None,
        }
    }
}

// ── Outgoing payload ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialQuantity {
    pub material_id: i64,
    #[serde(serialize_with = "serialize_compact")]
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePair {
    pub source_id: i64,
    pub dest_id: i64,
    pub materials: Vec<MaterialQuantity>,
}

/// Create/update body for `/shipments`. Sent whole, in one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPayload {
    pub transporter_id: i64,
    pub vehicle_id: i64,
    pub route_pairs: Vec<RoutePair>,
}

// ── List filters and rows ───────────────────────────────────────────

/// Select filters on the shipment list, alongside free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentFilter {
    Transporter,
    Vehicle,
    Material,
}

impl ShipmentFilter {
    pub const ALL: [ShipmentFilter; 3] = [
        ShipmentFilter::Transporter,
        ShipmentFilter::Vehicle,
        ShipmentFilter::Material,
    ];

    /// Query parameter name.
    pub fn key(self) -> &'static str {
        match self {
            ShipmentFilter::Transporter => "transporterId",
            ShipmentFilter::Vehicle => "vehicleId",
            ShipmentFilter::Material => "materialId",
        }
    }
}

/// Display summary of one shipment list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRow {
    pub id: String,
    pub route: String,
    pub hops: String,
    pub transporter: String,
    pub transporter_email: String,
    pub vehicle: String,
    pub capacity: String,
    pub materials: String,
    pub weight: String,
}

impl ShipmentRow {
    pub const HEADERS: [&'static str; 6] = ["ID", "Route", "Transporter", "Vehicle", "Materials", "Weight"];
    pub const EMPTY: &'static str = "No shipments found";

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            format!("{} ({})", self.route, self.hops),
            self.transporter.clone(),
            self.vehicle.clone(),
            self.materials.clone(),
            self.weight.clone(),
        ]
    }
}

impl From<&Shipment> for ShipmentRow {
    fn from(s: &Shipment) -> Self {
        let from = s.from_source.as_deref().unwrap_or_default();
        let to = s.end_destination.as_deref().unwrap_or_default();
        let (transporter, transporter_email) = match &s.transporter {
            Some(t) => (t.name.clone(), t.email.clone().unwrap_or_default()),
            None => (String::new(), String::new()),
        };
        let (vehicle, capacity) = match &s.vehicle {
            Some(v) => (
                v.name.clone(),
                v.weight.map(|w| format!("{}T Capacity", w)).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        let materials = match s.materials.as_deref() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => "-".to_string(),
        };
        Self {
            id: format!("#{}", s.id),
            route: format!("{} → {}", from, to),
            hops: format!("via {} hops", s.routes.len()),
            transporter,
            transporter_email,
            vehicle,
            capacity,
            materials,
            weight: format!("{} kg", group_thousands(s.summed_weight)),
        }
    }
}

/// `12500` → `12,500`; fractions keep up to three digits.
fn group_thousands(n: f64) -> String {
    let rounded = (n * 1000.0).round() / 1000.0;
    let raw = format!("{}", rounded.abs());
    let (int, frac) = match raw.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (raw, None),
    };
    let mut grouped = String::new();
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    match frac {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Shipment {
        serde_json::from_value(json!({
            "id": 12,
            "fromSource": "Depot A",
            "endDestination": "Site C",
            "transporter": {"id": 1, "name": "Acme", "email": "ops@acme.test", "gstno": "G1"},
            "vehicle": {"id": 4, "name": "Tipper", "weight": 10},
            "materials": "Sand, Cement",
            "summedWeight": 12500,
            "routes": [
                {"id": 1, "sourceId": 3, "destId": 7, "materials": [{"id": 5, "name": "Sand", "quantity": 10}]},
                {"id": 2, "sourceId": 7, "destId": 9, "materials": []}
            ],
            "createdAt": "2025-03-01T10:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn row_summarizes_route_and_weight() {
        let row = ShipmentRow::from(&sample());
        assert_eq!(row.id, "#12");
        assert_eq!(row.route, "Depot A → Site C");
        assert_eq!(row.hops, "via 2 hops");
        assert_eq!(row.capacity, "10T Capacity");
        assert_eq!(row.weight, "12,500 kg");
    }

    #[test]
    fn empty_materials_render_as_dash() {
        let mut s = sample();
        s.materials = Some(String::new());
        assert_eq!(ShipmentRow::from(&s).materials, "-");
        s.materials = None;
        assert_eq!(ShipmentRow::from(&s).materials, "-");
    }

    #[test]
    fn nested_refs_resolve_and_missing_ones_do_not() {
        let mut s = sample();
        assert_eq!(s.resolve("transporter.name"), Some(CellValue::from("Acme")));
        assert_eq!(s.resolve("vehicle.weight"), Some(CellValue::Float(10.0)));
        s.vehicle = None;
        assert_eq!(s.resolve("vehicle.name"), None);
        assert_eq!(s.resolve("transporter.name.first"), None);
    }

    #[test]
    fn payload_uses_wire_names_and_integral_quantities() {
        let payload = ShipmentPayload {
            transporter_id: 1,
            vehicle_id: 4,
            route_pairs: vec![RoutePair {
                source_id: 3,
                dest_id: 7,
                materials: vec![
                    MaterialQuantity { material_id: 5, quantity: 1.0 },
                    MaterialQuantity { material_id: 6, quantity: 2.5 },
                ],
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "transporterId": 1,
                "vehicleId": 4,
                "routePairs": [{"sourceId": 3, "destId": 7, "materials": [
                    {"materialId": 5, "quantity": 1},
                    {"materialId": 6, "quantity": 2.5}
                ]}]
            })
        );
    }

    #[test]
    fn null_scalars_decode_as_defaults() {
        let s: Shipment = serde_json::from_value(json!({
            "id": 3,
            "summedWeight": null,
            "transporter": {"id": 1, "name": null},
            "routes": [{"sourceId": null, "destId": 7, "materials": [{"id": 5, "name": "Sand", "quantity": null}]}],
            "createdAt": null
        }))
        .unwrap();
        assert_eq!(s.summed_weight, 0.0);
        assert_eq!(s.transporter.as_ref().unwrap().name, "");
        assert_eq!(s.routes[0].source_id, 0);
        assert_eq!(s.routes[0].materials[0].quantity, 0.0);
        assert_eq!(s.created_at, None);
        assert_eq!(ShipmentRow::from(&s).weight, "0 kg");

        let bare: Shipment = serde_json::from_value(json!({"id": 4, "routes": null})).unwrap();
        assert!(bare.routes.is_empty());
    }

    #[test]
    fn created_at_accepts_common_timestamp_shapes() {
        let at = |v: serde_json::Value| -> Option<String> {
            let s: Shipment = serde_json::from_value(json!({"id": 1, "createdAt": v})).unwrap();
            s.created_at.map(|t| t.to_rfc3339())
        };
        assert_eq!(at(json!("2025-03-01T10:00:00.000Z")).as_deref(), Some("2025-03-01T10:00:00+00:00"));
        assert_eq!(at(json!("2025-03-01T15:30:00+05:30")).as_deref(), Some("2025-03-01T10:00:00+00:00"));
        assert_eq!(at(json!("2025-03-01 10:00:00")).as_deref(), Some("2025-03-01T10:00:00+00:00"));
        assert_eq!(at(json!("2025-03-01")).as_deref(), Some("2025-03-01T00:00:00+00:00"));
        assert_eq!(at(json!("last tuesday")), None);
        assert_eq!(at(json!(1740823200)), None);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.5), "1,234,567.5");
    }
}
