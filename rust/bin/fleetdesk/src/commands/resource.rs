//! Generic resource CRUD commands.
//!
//! `fleetdesk list materials`, `fleetdesk create transporter --set name=Acme`,
//! etc. Each resource name resolves to its typed record and runs through the
//! same CRUD session a dashboard page would use.

use std::time::Duration;

use anyhow::Result;
use fleetdesk_admin::pages::SIDEBAR_TABS;
use fleetdesk_admin::{
    CrudSession, Edge, Entity, FormData, Material, MaterialCategory, Record, RefreshOutcome, Shipment,
    Transporter, VehicleType,
};
use fleetdesk_client::{ApiClient, Resource};
use serde::Serialize;

use super::{failure, render_table, report, Output};

/// Run `$body` with `$R` bound to the record type of `$resource`.
/// Shipments have their own commands and are rejected.
macro_rules! with_entity {
    ($resource:expr, $R:ident => $body:expr) => {
        match $resource {
            Resource::Transporters => {
                type $R = Transporter;
                $body
            }
            Resource::Materials => {
                type $R = Material;
                $body
            }
            Resource::MaterialCategories => {
                type $R = MaterialCategory;
                $body
            }
            Resource::VehicleTypes => {
                type $R = VehicleType;
                $body
            }
            Resource::Edges => {
                type $R = Edge;
                $body
            }
            Resource::Shipments => {
                anyhow::bail!("shipments have a nested shape; use `fleetdesk shipments ...`")
            }
        }
    };
}

fn session<R: Entity>(client: ApiClient) -> CrudSession<R> {
    // One-shot commands have nothing to debounce.
    CrudSession::for_entity(client).with_debounce(Duration::ZERO)
}

fn title(resource: Resource) -> &'static str {
    match resource {
        Resource::Transporters => Transporter::TITLE,
        Resource::Materials => Material::TITLE,
        Resource::MaterialCategories => MaterialCategory::TITLE,
        Resource::VehicleTypes => VehicleType::TITLE,
        Resource::Edges => Edge::TITLE,
        Resource::Shipments => "Shipments",
    }
}

/// RESOURCES: what the API exposes and where the dashboard links to it.
pub fn resources() {
    let headers = ["Name", "Title", "Path", "Sidebar"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = Resource::ALL
        .iter()
        .map(|&r| {
            let tab = SIDEBAR_TABS.iter().find(|t| t.resource == r).map(|t| t.name).unwrap_or("-");
            vec![r.name().to_string(), title(r).to_string(), r.collection_path(), tab.to_string()]
        })
        .collect();
    println!("{}", render_table(&headers, &rows));
}

/// LIST with optional search and equality filters.
pub async fn list(
    client: ApiClient,
    resource: Resource,
    search: Option<&str>,
    filters: &[(String, String)],
    output: Output,
) -> Result<()> {
    with_entity!(resource, R => list_as::<R>(client, search, filters, output).await)
}

async fn list_as<R: Entity + Serialize>(
    client: ApiClient,
    search: Option<&str>,
    filters: &[(String, String)],
    output: Output,
) -> Result<()> {
    let session = session::<R>(client);
    session
        .with_page_mut(|p| {
            let list = p.list_mut();
            list.set_search(search.unwrap_or_default());
            for (k, v) in filters {
                list.set_filter(k, v);
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
                    let table = p.table();
                    if table.is_empty() {
                        println!("{}", fleetdesk_admin::TableView::EMPTY);
                    } else {
                        println!("{}", render_table(&table.headers, &table.rows));
                    }
                }
            }
            Ok(())
        })
        .await
}

/// GET one record by id.
pub async fn get(client: ApiClient, resource: Resource, id: i64, output: Output) -> Result<()> {
    if resource == Resource::Shipments {
        let env = client.get(resource, id).await?;
        let shipment: Shipment = env.require_data()?;
        return print_record(&shipment, output, |s| {
            let row = fleetdesk_admin::shipment::ShipmentRow::from(s);
            fleetdesk_admin::shipment::ShipmentRow::HEADERS
                .iter()
                .map(|h| h.to_string())
                .zip(row.cells())
                .collect()
        });
    }
    with_entity!(resource, R => {
        let env = client.get(resource, id).await?;
        let record: R = env.require_data()?;
        print_record(&record, output, |r| {
            std::iter::once(("ID".to_string(), format!("#{}", id)))
                .chain(R::fields().iter().map(|f| {
                    let value = r.resolve(f.display_path()).map(|v| v.to_string()).unwrap_or_default();
                    (f.label.clone(), value)
                }))
                .collect()
        })
    })
}

fn print_record<T: Serialize>(
    record: &T,
    output: Output,
    pairs: impl FnOnce(&T) -> Vec<(String, String)>,
) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(record)?),
        Output::Table => {
            let pairs = pairs(record);
            let width = pairs.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
            for (k, v) in pairs {
                println!("{:<width$}  {}", format!("{}:", k), v, width = width + 1);
            }
        }
    }
    Ok(())
}

/// CREATE from `--set key=value` pairs.
pub async fn create(client: ApiClient, resource: Resource, values: &[(String, String)]) -> Result<()> {
    with_entity!(resource, R => {
        let session = session::<R>(client);
        session.with_page_mut(|p| p.open_create()).await;
        submit(&session, values.iter().cloned().collect()).await
    })
}

/// UPDATE (PATCH). Fields not given keep their current values.
pub async fn update(client: ApiClient, resource: Resource, id: i64, values: &[(String, String)]) -> Result<()> {
    with_entity!(resource, R => {
        let env = client.get(resource, id).await?;
        let record: R = env.require_data()?;
        let session = session::<R>(client);
        let mut form = session
            .with_page_mut(|p| {
                p.open_edit_record(&record);
                p.dialog().map(|d| d.values.clone()).unwrap_or_default()
            })
            .await;
        form.extend(values.iter().cloned());
        submit(&session, form).await
    })
}

async fn submit<R: Entity>(session: &CrudSession<R>, form: FormData) -> Result<()> {
    let result = session.submit(form).await;
    let notices = session.with_page_mut(|p| p.drain_notices()).await;
    match result {
        Ok(_) => {
            report(&notices);
            Ok(())
        }
        Err(e) => Err(failure(notices, e)),
    }
}

/// DELETE after `confirm` accepts the prompt. Returns false if declined.
pub async fn delete(
    client: ApiClient,
    resource: Resource,
    id: i64,
    confirm: impl FnOnce(&str) -> Result<bool>,
) -> Result<bool> {
    if resource == Resource::Shipments {
        return super::shipment::delete(client, id, confirm).await;
    }
    with_entity!(resource, R => {
        let session = session::<R>(client);
        let confirmation = session.request_delete(id);
        if !confirm(confirmation.prompt())? {
            return Ok(false);
        }
        let result = session.confirm_delete(confirmation).await;
        let notices = session.with_page_mut(|p| p.drain_notices()).await;
        match result {
            Ok(_) => {
                report(&notices);
                Ok(true)
            }
            Err(e) => Err(failure(notices, e)),
        }
    })
}
