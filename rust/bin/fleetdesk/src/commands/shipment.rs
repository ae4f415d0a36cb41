//! Shipment commands.
//!
//! A plan file describes the legs of a shipment. It is replayed through the
//! shipment editor, so the CLI applies the same validation and material
//! lookup as the dashboard.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use fleetdesk_admin::shipment::{ShipmentFilter, ShipmentRow, ShipmentSession};
use fleetdesk_admin::{RefreshOutcome, Shipment, ShipmentEditor};
use fleetdesk_client::{ApiClient, Resource};
use serde::Deserialize;

use super::{failure, render_table, report, Output};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMaterial {
    pub material_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLeg {
    pub source_id: i64,
    pub dest_id: i64,
    #[serde(default)]
    pub materials: Vec<PlanMaterial>,
}

/// Contents of a `-f plan.json` file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPlan {
    pub transporter_id: i64,
    pub vehicle_id: i64,
    pub legs: Vec<PlanLeg>,
}

impl ShipmentPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid plan {}", path.display()))
    }

    /// Replace the open editor's contents with this plan.
    pub fn apply(&self, editor: &mut ShipmentEditor) -> Result<()> {
        editor.set_transporter(Some(self.transporter_id))?;
        editor.set_vehicle(Some(self.vehicle_id))?;
        editor.clear_routes()?;
        for (route, leg) in self.legs.iter().enumerate() {
            if route > 0 {
                editor.add_leg()?;
            }
            editor.set_source(route, leg.source_id)?;
            editor.set_destination(route, leg.dest_id)?;
            for (index, m) in leg.materials.iter().enumerate() {
                if !editor.add_material(route, m.material_id)? {
                    anyhow::bail!("unknown material id {} on leg {}", m.material_id, route + 1);
                }
                editor.set_quantity(route, index, m.quantity)?;
            }
        }
        Ok(())
    }
}

fn session(client: ApiClient) -> ShipmentSession {
    ShipmentSession::new(client).with_debounce(Duration::ZERO)
}

/// `(filter, value)` for each of `--transporter/--vehicle/--material` given.
pub fn filters(transporter: Option<i64>, vehicle: Option<i64>, material: Option<i64>) -> Vec<(ShipmentFilter, String)> {
    [
        (ShipmentFilter::Transporter, transporter),
        (ShipmentFilter::Vehicle, vehicle),
        (ShipmentFilter::Material, material),
    ]
    .into_iter()
    .filter_map(|(f, v)| v.map(|id| (f, id.to_string())))
    .collect()
}

pub async fn list(
    client: ApiClient,
    search: Option<&str>,
    filters: &[(ShipmentFilter, String)],
    output: Output,
) -> Result<()> {
    let session = session(client);
    session
        .with_page_mut(|p| {
            let list = p.list_mut();
            list.set_search(search.unwrap_or_default());
            for (f, v) in filters {
                list.set_filter(f.key(), v);
            }
        })
        .await;

    let outcome = session.refresh().await;
    let notices = session.with_page_mut(|p| p.drain_notices()).await;
    if let RefreshOutcome::Failed(message) = outcome {
        return Err(failure(notices, anyhow::anyhow!(message)));
    }

    session
        .with_page(|p| -> Result<()> {
            match output {
                Output::Json => println!("{}", serde_json::to_string_pretty(p.list().rows())?),
                Output::Table => {
                    let rows: Vec<Vec<String>> = p.rows().iter().map(ShipmentRow::cells).collect();
                    if rows.is_empty() {
                        println!("{}", ShipmentRow::EMPTY);
                    } else {
                        let headers: Vec<String> = ShipmentRow::HEADERS.iter().map(|h| h.to_string()).collect();
                        println!("{}", render_table(&headers, &rows));
                    }
                }
            }
            Ok(())
        })
        .await
}

/// Create (`id = None`) or replace the legs of shipment `id` from a plan.
pub async fn save(client: ApiClient, id: Option<i64>, plan: &ShipmentPlan) -> Result<()> {
    let existing: Option<Shipment> = match id {
        Some(id) => Some(client.get(Resource::Shipments, id).await?.require_data()?),
        None => None,
    };

    let session = session(client);
    if let Err(e) = session.load_helpers().await {
        let notices = session.with_page_mut(|p| p.drain_notices()).await;
        return Err(failure(notices, e));
    }

    let applied = session
        .with_page_mut(|p| {
            let editor = p.editor_mut();
            match &existing {
                Some(s) => editor.open_edit(s),
                None => editor.open_create(),
            }
            plan.apply(editor)
        })
        .await;
    applied?;

    let result = session.save().await;
    let notices = session.with_page_mut(|p| p.drain_notices()).await;
    match result {
        Ok(_) => {
            report(&notices);
            Ok(())
        }
        Err(e) => Err(failure(notices, e)),
    }
}

/// Delete after `confirm` accepts the prompt. Returns false if declined.
pub async fn delete(client: ApiClient, id: i64, confirm: impl FnOnce(&str) -> Result<bool>) -> Result<bool> {
    let session = session(client);
    let deletion = session.request_delete(id);
    if !confirm(deletion.prompt())? {
        return Ok(false);
    }
    let result = session.confirm_delete(deletion).await;
    let notices = session.with_page_mut(|p| p.drain_notices()).await;
    match result {
        Ok(_) => {
            report(&notices);
            Ok(true)
        }
        Err(e) => Err(failure(notices, e)),
    }
}
