//! Generic CRUD page: table, filter panel and create/edit dialog for one
//! resource, driven by a field schema.
//!
//! [`CrudPage`] is the plain state (rows, inputs, option cache, dialog
//! buffer, notices). [`CrudSession`] wraps it with the API client and runs
//! the debounced refreshes, option loads, submits and deletes.

use std::collections::BTreeMap;
use std::time::Duration;

use fleetdesk_client::{ApiClient, ApiError, Query};
use futures::future::try_join_all;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::field::{coerce_form, FieldDescriptor, FormData, FormError};
use crate::list::{fetch_into, ListHost, ListView, RefreshOutcome};
use crate::notice::{Notice, Notices};
use crate::record::{decode_options, option_label_path, Entity, SelectOption};
use crate::stream::RequestStream;

/// Quiet period before a search/filter change is sent.
pub const LIST_DEBOUNCE: Duration = Duration::from_millis(400);

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this record?";

/// Transient create/edit buffer. `id` is set when editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: Option<i64>,
    pub values: FormData,
}

/// Rendered table: `ID` column, then one column per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub const EMPTY: &'static str = "No matches found";

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no dialog is open")]
    DialogClosed,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Proof that the user was asked to confirm a delete.
#[derive(Debug)]
pub struct DeleteConfirmation {
    id: i64,
}

impl DeleteConfirmation {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn prompt(&self) -> &'static str {
        DELETE_PROMPT
    }
}

pub struct CrudPage<R> {
    title: String,
    fields: Vec<FieldDescriptor>,
    list: ListView<R>,
    options: BTreeMap<String, Vec<SelectOption>>,
    dialog: Option<EditBuffer>,
    notices: Notices,
}

impl<R: Entity> CrudPage<R> {
    pub fn new(title: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.to_string(),
            fields,
            list: ListView::default(),
            options: BTreeMap::new(),
            dialog: None,
            notices: Notices::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn list(&self) -> &ListView<R> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView<R> {
        &mut self.list
    }

    pub fn options(&self, field: &str) -> &[SelectOption] {
        self.options.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    // ── Dialog ──────────────────────────────────────────────────────

    pub fn dialog(&self) -> Option<&EditBuffer> {
        self.dialog.as_ref()
    }

    pub fn dialog_title(&self) -> Option<String> {
        self.dialog.as_ref().map(|b| match b.id {
            Some(_) => format!("Edit {}", self.title),
            None => format!("Add {}", self.title),
        })
    }

    pub fn open_create(&mut self) {
        self.dialog = Some(EditBuffer::default());
    }

    /// Open the dialog on a displayed row, pre-filled from its fields.
    /// Returns false if no row has that id.
    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(row) = self.list.row(id).cloned() else {
            return false;
        };
        self.open_edit_record(&row);
        true
    }

    /// Open the dialog on any record, displayed or fetched separately.
    pub fn open_edit_record(&mut self, record: &R) {
        let values = self
            .fields
            .iter()
            .filter_map(|f| record.resolve(&f.name).map(|v| (f.name.clone(), v.to_string())))
            .collect();
        self.dialog = Some(EditBuffer { id: Some(record.id()), values });
    }

    /// Set one input in the open dialog.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match &mut self.dialog {
            Some(buf) => {
                buf.values.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    // ── Table ───────────────────────────────────────────────────────

    pub fn table(&self) -> TableView {
        let mut headers = vec!["ID".to_string()];
        headers.extend(self.fields.iter().map(|f| f.label.clone()));
        let rows = self
            .list
            .rows()
            .iter()
            .map(|row| {
                let mut cells = vec![format!("#{}", row.id())];
                cells.extend(self.fields.iter().map(|f| {
                    row.resolve(f.display_path())
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                }));
                cells
            })
            .collect();
        TableView { headers, rows }
    }

    fn lower_title(&self) -> String {
        self.title.to_lowercase()
    }
}

impl<R: Entity> ListHost<R> for CrudPage<R> {
    fn list_mut(&mut self) -> &mut ListView<R> {
        &mut self.list
    }

    fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    fn fetch_failure(&self) -> String {
        format!("Failed to fetch {}", self.lower_title())
    }
}

/// A [`CrudPage`] bound to the API.
pub struct CrudSession<R> {
    client: ApiClient,
    page: Mutex<CrudPage<R>>,
    stream: RequestStream,
    debounce: Duration,
}

impl<R: Entity> CrudSession<R> {
    pub fn new(client: ApiClient, title: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            client,
            page: Mutex::new(CrudPage::new(title, fields)),
            stream: RequestStream::new(),
            debounce: LIST_DEBOUNCE,
        }
    }

    /// Session using the entity's own title and schema.
    pub fn for_entity(client: ApiClient) -> Self {
        Self::new(client, R::TITLE, R::fields())
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Read the page state.
    pub async fn with_page<T>(&self, f: impl FnOnce(&CrudPage<R>) -> T) -> T {
        f(&*self.page.lock().await)
    }

    /// Mutate the page state directly (dialog inputs, undebounced filters).
    pub async fn with_page_mut<T>(&self, f: impl FnOnce(&mut CrudPage<R>) -> T) -> T {
        f(&mut *self.page.lock().await)
    }

    /// Load select options and the first rowset concurrently.
    pub async fn open(&self) -> RefreshOutcome {
        let (_, refreshed) = tokio::join!(self.load_options(), self.refresh());
        refreshed
    }

    // ── List ────────────────────────────────────────────────────────

    /// Refresh now, superseding any pending or in-flight refresh.
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.stream.issue();
        fetch_into(&self.client, R::RESOURCE, &self.stream, &self.page, generation).await
    }

    async fn debounced_refresh(&self) -> RefreshOutcome {
        let generation = self.stream.issue();
        if !self.stream.settle(generation, self.debounce).await {
            return RefreshOutcome::Superseded;
        }
        fetch_into(&self.client, R::RESOURCE, &self.stream, &self.page, generation).await
    }

    pub async fn set_search(&self, term: &str) -> RefreshOutcome {
        self.page.lock().await.list.set_search(term);
        self.debounced_refresh().await
    }

    pub async fn set_filter(&self, name: &str, value: &str) -> RefreshOutcome {
        self.page.lock().await.list.set_filter(name, value);
        self.debounced_refresh().await
    }

    pub async fn reset_filters(&self) -> RefreshOutcome {
        self.page.lock().await.list.reset_filters();
        self.debounced_refresh().await
    }

    // ── Options ─────────────────────────────────────────────────────

    /// Fetch every select field's related resource concurrently. The cache
    /// is only updated when all of them succeed.
    pub async fn load_options(&self) -> Result<(), ApiError> {
        let fields: Vec<FieldDescriptor> = {
            let page = self.page.lock().await;
            page.fields.iter().filter(|f| f.relation().is_some()).cloned().collect()
        };
        if fields.is_empty() {
            return Ok(());
        }

        let loads = fields.iter().map(|f| self.fetch_options(f));
        match try_join_all(loads).await {
            Ok(loaded) => {
                let mut page = self.page.lock().await;
                for (field, opts) in fields.iter().zip(loaded) {
                    page.options.insert(field.name.clone(), opts);
                }
                Ok(())
            }
            Err(e) => {
                let mut page = self.page.lock().await;
                let message = e.message_or(&format!("Failed to load options for {}", page.lower_title()));
                page.notices.error(message);
                Err(e)
            }
        }
    }

    /// Re-fetch one field's options. On failure the field keeps its
    /// previous options.
    pub async fn refresh_options(&self, field_name: &str) -> Result<(), ApiError> {
        let field = {
            let page = self.page.lock().await;
            page.fields.iter().find(|f| f.name == field_name).cloned()
        };
        let Some(field) = field.filter(|f| f.relation().is_some()) else {
            return Ok(());
        };

        match self.fetch_options(&field).await {
            Ok(opts) => {
                self.page.lock().await.options.insert(field.name.clone(), opts);
                Ok(())
            }
            Err(e) => {
                warn!(field = %field.name, error = %e, "failed to refresh options");
                self.page.lock().await.notices.error("Failed to refresh options");
                Err(e)
            }
        }
    }

    async fn fetch_options(&self, field: &FieldDescriptor) -> Result<Vec<SelectOption>, ApiError> {
        let Some(rel) = field.relation() else {
            return Ok(Vec::new());
        };
        debug!(field = %field.name, resource = %rel.resource, "loading options");
        let env = self.client.list(rel.resource, &Query::new()).await?;
        decode_options(rel.resource, &env, option_label_path(field))
    }

    // ── Create / edit ───────────────────────────────────────────────

    /// Submit `form` from the open dialog.
    ///
    /// On success the dialog closes and the list refreshes. On failure the
    /// dialog stays open holding `form` as its draft.
    pub async fn submit(&self, form: FormData) -> Result<RefreshOutcome, SubmitError> {
        let (id, payload) = {
            let mut page = self.page.lock().await;
            let fields = page.fields.clone();
            let Some(buf) = page.dialog.as_mut() else {
                return Err(SubmitError::DialogClosed);
            };
            buf.values = form;
            let id = buf.id;
            match coerce_form(&fields, &buf.values) {
                Ok(payload) => (id, payload),
                Err(e) => {
                    page.notices.error(e.to_string());
                    return Err(e.into());
                }
            }
        };

        let result = match id {
            Some(id) => self.client.update(R::RESOURCE, id, &payload).await,
            None => self.client.create(R::RESOURCE, &payload).await,
        };

        {
            let mut page = self.page.lock().await;
            match result {
                Ok(_) => {
                    let verb = if id.is_some() { "updated" } else { "created" };
                    let message = format!("{} {} successfully", page.title, verb);
                    page.notices.success(message);
                    page.dialog = None;
                }
                Err(e) => {
                    let message = e.message_or(&format!("Failed to save {}", page.lower_title()));
                    page.notices.error(message);
                    return Err(e.into());
                }
            }
        }
        Ok(self.refresh().await)
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// First step of a delete: the caller must show the prompt and only
    /// pass the confirmation on if the user agrees.
    pub fn request_delete(&self, id: i64) -> DeleteConfirmation {
        DeleteConfirmation { id }
    }

    pub async fn confirm_delete(&self, confirmation: DeleteConfirmation) -> Result<RefreshOutcome, ApiError> {
        match self.client.delete(R::RESOURCE, confirmation.id).await {
            Ok(_) => {
                {
                    let mut page = self.page.lock().await;
                    let message = format!("{} deleted successfully", page.title);
                    page.notices.success(message);
                }
                Ok(self.refresh().await)
            }
            Err(e) => {
                let mut page = self.page.lock().await;
                let message = e.message_or(&format!("Failed to delete {}", page.lower_title()));
                page.notices.error(message);
                Err(e)
            }
        }
    }
}
