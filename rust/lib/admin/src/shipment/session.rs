use std::time::Duration;

use fleetdesk_client::{ApiClient, ApiError, Query, Resource};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::editor::{EditorMode, ShipmentEditor, ValidationError};
use super::model::{Shipment, ShipmentFilter, ShipmentRow};
use crate::list::{fetch_into, ListHost, ListView, RefreshOutcome};
use crate::notice::{Notice, Notices};
use crate::record::{decode_options, SelectOption};
use crate::stream::RequestStream;

pub const SHIPMENT_DEBOUNCE: Duration = Duration::from_millis(300);

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this shipment?";

/// Option lists backing the editor and the filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperOptions {
    pub transporters: Vec<SelectOption>,
    pub vehicles: Vec<SelectOption>,
    pub materials: Vec<SelectOption>,
    pub edges: Vec<SelectOption>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Proof that the user confirmed deleting a shipment.
#[derive(Debug)]
pub struct ShipmentDeletion {
    id: i64,
}

impl ShipmentDeletion {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn prompt(&self) -> &'static str {
        DELETE_PROMPT
    }
}

#[derive(Debug, Default)]
pub struct ShipmentPage {
    list: ListView<Shipment>,
    editor: ShipmentEditor,
    helpers: HelperOptions,
    notices: Notices,
}

impl ShipmentPage {
    pub fn list(&self) -> &ListView<Shipment> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView<Shipment> {
        &mut self.list
    }

    pub fn editor(&self) -> &ShipmentEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ShipmentEditor {
        &mut self.editor
    }

    pub fn helpers(&self) -> &HelperOptions {
        &self.helpers
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn rows(&self) -> Vec<ShipmentRow> {
        self.list.rows().iter().map(ShipmentRow::from).collect()
    }

    /// Open the editor on a displayed shipment.
    pub fn edit(&mut self, id: i64) -> bool {
        match self.list.row(id) {
            Some(shipment) => {
                self.editor.open_edit(shipment);
                true
            }
            None => false,
        }
    }

    /// Run an editor mutation, turning a rejection into an error notice.
    pub fn apply<T>(
        &mut self,
        f: impl FnOnce(&mut ShipmentEditor) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        f(&mut self.editor).inspect_err(|e| self.notices.error(e.to_string()))
    }
}

impl ListHost<Shipment> for ShipmentPage {
    fn list_mut(&mut self) -> &mut ListView<Shipment> {
        &mut self.list
    }

    fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    fn fetch_failure(&self) -> String {
        "Failed to load shipments".to_string()
    }
}

/// The shipments screen bound to the API.
pub struct ShipmentSession {
    client: ApiClient,
    page: Mutex<ShipmentPage>,
    stream: RequestStream,
    debounce: Duration,
}

impl ShipmentSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            page: Mutex::new(ShipmentPage::default()),
            stream: RequestStream::new(),
            debounce: SHIPMENT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub async fn with_page<T>(&self, f: impl FnOnce(&ShipmentPage) -> T) -> T {
        f(&*self.page.lock().await)
    }

    pub async fn with_page_mut<T>(&self, f: impl FnOnce(&mut ShipmentPage) -> T) -> T {
        f(&mut *self.page.lock().await)
    }

    /// Load helper data and the first page of shipments concurrently.
    pub async fn open(&self) -> RefreshOutcome {
        let (_, refreshed) = tokio::join!(self.load_helpers(), self.refresh());
        refreshed
    }

    /// Fetch transporters, vehicle types, materials and edges together.
    /// Nothing is applied unless all four succeed.
    pub async fn load_helpers(&self) -> Result<(), ApiError> {
        let all = Query::new();
        let fetched = tokio::try_join!(
            self.helper(Resource::Transporters, &all),
            self.helper(Resource::VehicleTypes, &all),
            self.helper(Resource::Materials, &all),
            self.helper(Resource::Edges, &all),
        );
        let mut page = self.page.lock().await;
        match fetched {
            Ok((transporters, vehicles, materials, edges)) => {
                page.editor.set_material_options(materials.clone());
                page.helpers = HelperOptions { transporters, vehicles, materials, edges };
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load shipment helper data");
                page.notices.error("Failed to load helper data");
                Err(e)
            }
        }
    }

    async fn helper(&self, resource: Resource, query: &Query) -> Result<Vec<SelectOption>, ApiError> {
        let env = self.client.list(resource, query).await?;
        decode_options(resource, &env, Some("name"))
    }

    // ── List ────────────────────────────────────────────────────────

    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.stream.issue();
        fetch_into(&self.client, Resource::Shipments, &self.stream, &self.page, generation).await
    }

    async fn debounced_refresh(&self) -> RefreshOutcome {
        let generation = self.stream.issue();
        if !self.stream.settle(generation, self.debounce).await {
            return RefreshOutcome::Superseded;
        }
        fetch_into(&self.client, Resource::Shipments, &self.stream, &self.page, generation).await
    }

    pub async fn set_search(&self, term: &str) -> RefreshOutcome {
        self.page.lock().await.list.set_search(term);
        self.debounced_refresh().await
    }

    /// An empty value clears the filter.
    pub async fn set_filter(&self, filter: ShipmentFilter, value: &str) -> RefreshOutcome {
        self.page.lock().await.list.set_filter(filter.key(), value);
        self.debounced_refresh().await
    }

    /// Clear search and every filter.
    pub async fn reset_filters(&self) -> RefreshOutcome {
        {
            let mut page = self.page.lock().await;
            page.list.set_search("");
            page.list.reset_filters();
        }
        self.debounced_refresh().await
    }

    // ── Save ────────────────────────────────────────────────────────

    /// Validate and send the editor's shipment.
    ///
    /// Validation failures never reach the API. On success the editor
    /// closes and the list refreshes; on failure the editor reopens with
    /// its data intact.
    pub async fn save(&self) -> Result<RefreshOutcome, SaveError> {
        let (mode, payload) = {
            let mut page = self.page.lock().await;
            match page.editor.begin_submit() {
                Ok(submit) => submit,
                Err(e) => {
                    page.notices.error(e.to_string());
                    return Err(e.into());
                }
            }
        };
        debug!(?mode, legs = payload.route_pairs.len(), "saving shipment");

        let result = match mode {
            EditorMode::Create => self.client.create(Resource::Shipments, &payload).await,
            EditorMode::Edit(id) => self.client.update(Resource::Shipments, id, &payload).await,
        };

        {
            let mut page = self.page.lock().await;
            match result {
                Ok(_) => {
                    page.editor.finish_submit(true);
                    page.notices.success(match mode {
                        EditorMode::Create => "Shipment created",
                        EditorMode::Edit(_) => "Shipment updated",
                    });
                }
                Err(e) => {
                    warn!(error = %e, "shipment save failed");
                    page.editor.finish_submit(false);
                    page.notices.error("Failed to save shipment");
                    return Err(e.into());
                }
            }
        }
        Ok(self.refresh().await)
    }

    // ── Delete ──────────────────────────────────────────────────────

    pub fn request_delete(&self, id: i64) -> ShipmentDeletion {
        ShipmentDeletion { id }
    }

    pub async fn confirm_delete(&self, deletion: ShipmentDeletion) -> Result<RefreshOutcome, ApiError> {
        match self.client.delete(Resource::Shipments, deletion.id).await {
            Ok(_) => {
                self.page.lock().await.notices.success("Shipment deleted");
                Ok(self.refresh().await)
            }
            Err(e) => {
                warn!(id = deletion.id, error = %e, "shipment delete failed");
                self.page.lock().await.notices.error("Failed to delete shipment");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetdesk_client::Method;
    use serde_json::json;

    use crate::notice::NoticeLevel;
    use crate::shipment::EditorState;
    use crate::testing::{broken, fail, ok, Scripted};

    fn backend() -> std::sync::Arc<Scripted> {
        Scripted::immediate(|req| match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/transporters") => ok(json!([{"id": 11, "name": "Acme"}])),
            ("GET", "/vehicle-types") => ok(json!([{"id": 22, "name": "Tipper", "weight": 10}])),
            ("GET", "/materials") => ok(json!([{"id": 5, "name": "Sand"}, {"id": 6, "name": "Cement"}])),
            ("GET", "/edges") => ok(json!([{"id": 3, "name": "Depot"}, {"id": 7, "name": "Site"}])),
            ("GET", "/shipments") => ok(json!([{
                "id": 40, "fromSource": "Depot", "endDestination": "Site",
                "transporter": {"id": 11, "name": "Acme"},
                "vehicle": {"id": 22, "name": "Tipper", "weight": 10},
                "materials": "Sand", "summedWeight": 20,
                "routes": [
                    {"id": 1, "sourceId": 3, "destId": 7, "materials": [{"id": 5, "name": "Sand", "quantity": 10}]},
                    {"id": 2, "sourceId": 7, "destId": 3, "materials": [{"id": 5, "name": "Sand", "quantity": 10}]}
                ]
            }])),
            ("POST", "/shipments") | ("PATCH", "/shipments/40") => ok(json!({"id": 40})),
            _ => fail("unexpected"),
        })
    }

    #[tokio::test]
    async fn open_loads_helpers_and_rows() {
        let backend = backend();
        let session = ShipmentSession::new(backend.client());
        assert_eq!(session.open().await, RefreshOutcome::Applied(1));

        session
            .with_page(|p| {
                assert_eq!(p.helpers().edges.len(), 2);
                assert_eq!(p.editor().material_options().len(), 2);
                assert_eq!(p.rows()[0].route, "Depot → Site");
            })
            .await;
    }

    #[tokio::test]
    async fn helper_failure_is_one_notice_and_applies_nothing() {
        let backend = Scripted::immediate(|req| match req.path.as_str() {
            "/edges" => broken(),
            _ => ok(json!([{"id": 1, "name": "x"}])),
        });
        let session = ShipmentSession::new(backend.client());
        assert!(session.load_helpers().await.is_err());

        session
            .with_page(|p| {
                assert_eq!(p.helpers(), &HelperOptions::default());
                assert_eq!(p.notices().len(), 1);
                assert_eq!(p.notices().last().unwrap().message, "Failed to load helper data");
            })
            .await;
    }

    #[tokio::test]
    async fn fresh_editor_posts_scenario_payload() {
        let backend = backend();
        let session = ShipmentSession::new(backend.client());
        session.open().await;

        session
            .with_page_mut(|p| {
                let e = p.editor_mut();
                e.open_create();
                e.set_transporter(Some(11))?;
                e.set_vehicle(Some(22))?;
                e.set_source(0, 3)?;
                e.set_destination(0, 7)?;
                e.add_material(0, 5).map(|_| ())
            })
            .await
            .unwrap();

        assert_eq!(session.save().await.unwrap(), RefreshOutcome::Applied(1));
        let post = backend
            .requests()
            .into_iter()
            .find(|r| r.method == Method::POST)
            .unwrap();
        assert_eq!(
            post.body,
            Some(json!({"transporterId": 11, "vehicleId": 22,
                        "routePairs": [{"sourceId": 3, "destId": 7,
                                        "materials": [{"materialId": 5, "quantity": 1}]}]}))
        );
        session
            .with_page(|p| {
                assert_eq!(p.editor().state(), EditorState::Closed);
                assert!(p.notices().iter().any(|n| n.message == "Shipment created"));
            })
            .await;
    }

    #[tokio::test]
    async fn invalid_edit_is_rejected_before_any_request() {
        let backend = backend();
        let session = ShipmentSession::new(backend.client());
        session.open().await;
        let sent_before = backend.requests().len();

        let weight = session
            .with_page_mut(|p| {
                assert!(p.edit(40));
                let before = p.editor().total_weight();
                p.apply(|e| e.remove_material(0, 0)).unwrap();
                (before, p.editor().total_weight())
            })
            .await;
        assert_eq!(weight, (20.0, 10.0));

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, SaveError::Invalid(ValidationError::EmptyRoute)));
        assert_eq!(backend.requests().len(), sent_before);
        session
            .with_page(|p| {
                assert!(p.editor().is_open());
                assert_eq!(
                    p.notices().last().unwrap().message,
                    "Please add at least one material for all routes"
                );
            })
            .await;
    }

    #[tokio::test]
    async fn removing_last_leg_emits_notice() {
        let backend = backend();
        let session = ShipmentSession::new(backend.client());
        session
            .with_page_mut(|p| {
                p.editor_mut().open_create();
                assert!(p.apply(|e| e.remove_leg(0)).is_err());
                assert_eq!(p.editor().legs().len(), 1);
                assert_eq!(p.notices().last().unwrap().level, NoticeLevel::Error);
                assert_eq!(p.notices().last().unwrap().message, "At least one route pair is required");
            })
            .await;
    }

    #[tokio::test]
    async fn failed_update_keeps_editor_open() {
        let backend = Scripted::immediate(|req| match req.method.as_str() {
            "PATCH" => fail("vehicle unavailable"),
            _ => ok(json!([{"id": 40, "transporter": {"id": 1, "name": "A"}, "vehicle": {"id": 2, "name": "V"},
                           "routes": [{"sourceId": 3, "destId": 7, "materials": [{"id": 5, "name": "Sand", "quantity": 4}]}]}])),
        });
        let session = ShipmentSession::new(backend.client());
        session.refresh().await;
        session.with_page_mut(|p| p.edit(40)).await;

        assert!(matches!(session.save().await, Err(SaveError::Api(_))));
        assert_eq!(backend.count(Method::PATCH, "/shipments/40"), 1);
        session
            .with_page(|p| {
                assert_eq!(p.editor().state(), EditorState::Open(EditorMode::Edit(40)));
                assert_eq!(p.editor().total_weight(), 4.0);
                assert_eq!(p.notices().last().unwrap().message, "Failed to save shipment");
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn filters_debounce_and_empty_values_drop_out() {
        let backend = backend();
        let session = ShipmentSession::new(backend.client());

        let (first, second, third) = tokio::join!(
            session.set_filter(ShipmentFilter::Transporter, "11"),
            session.set_filter(ShipmentFilter::Material, "5"),
            session.set_filter(ShipmentFilter::Transporter, ""),
        );
        assert_eq!(first, RefreshOutcome::Superseded);
        assert_eq!(second, RefreshOutcome::Superseded);
        assert_eq!(third, RefreshOutcome::Applied(1));

        let sent = backend.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query.to_string(), "materialId=5");

        session.set_search("acme").await;
        session.reset_filters().await;
        assert!(backend.requests().last().unwrap().query.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_fixed_messages() {
        let backend = Scripted::immediate(|req| match req.method.as_str() {
            "DELETE" => broken(),
            _ => ok(json!([])),
        });
        let session = ShipmentSession::new(backend.client());
        let deletion = session.request_delete(9);
        assert_eq!(deletion.prompt(), DELETE_PROMPT);
        assert!(session.confirm_delete(deletion).await.is_err());
        assert!(backend.requests().iter().all(|r| r.method != Method::GET));
        session
            .with_page(|p| assert_eq!(p.notices().last().unwrap().message, "Failed to delete shipment"))
            .await;
    }

    #[tokio::test]
    async fn sparse_rows_still_render() {
        let backend = Scripted::immediate(|_| {
            ok(json!([
                {"id": 1, "summedWeight": null, "createdAt": "2025-03-01 10:00:00", "routes": []},
                {"id": 2, "fromSource": "Depot", "endDestination": "Site", "summedWeight": 1500,
                 "transporter": {"id": 11, "name": null}, "createdAt": "2025-03-01T10:00:00Z"}
            ]))
        });
        let session = ShipmentSession::new(backend.client());
        assert_eq!(session.refresh().await, RefreshOutcome::Applied(2));

        session
            .with_page(|p| {
                let rows = p.rows();
                assert_eq!(rows[0].weight, "0 kg");
                assert_eq!(rows[1].weight, "1,500 kg");
                assert_eq!(rows[1].transporter, "");
                let created: Vec<_> = p.list().rows().iter().map(|s| s.created_at).collect();
                assert!(created[0].is_some());
                assert_eq!(created[0], created[1]);
                assert!(p.notices().is_empty());
            })
            .await;
    }
}
