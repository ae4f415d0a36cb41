//! Shipment composite editor.
//!
//! Holds the transient edit buffer for one shipment: the transporter and
//! vehicle selections plus an ordered list of route legs, each with its own
//! material lines. Nothing is sent until [`ShipmentEditor::begin_submit`]
//! validates the whole structure and flattens it into a [`ShipmentPayload`].

use std::fmt;

use thiserror::Error;

use super::model::{MaterialLine, MaterialQuantity, RoutePair, Shipment, ShipmentPayload};
use crate::record::SelectOption;

/// Client-only key for a leg buffer. Unique within one editor, never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(u64);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route-{}", self.0)
    }
}

/// Edit buffer for one route leg. A zero source or destination means
/// "not selected yet".
#[derive(Debug, Clone, PartialEq)]
pub struct LegBuffer {
    pub temp_id: TempId,
    pub id: Option<i64>,
    pub source_id: i64,
    pub dest_id: i64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub materials: Vec<MaterialLine>,
}

impl LegBuffer {
    fn empty(temp_id: TempId) -> Self {
        Self {
            temp_id,
            id: None,
            source_id: 0,
            dest_id: 0,
            source: None,
            destination: None,
            materials: Vec::new(),
        }
    }

    pub fn is_routed(&self) -> bool {
        self.source_id != 0 && self.dest_id != 0
    }

    pub fn weight(&self) -> f64 {
        self.materials.iter().map(|m| m.quantity).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Open(EditorMode),
    Submitting(EditorMode),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please select transporter and vehicle")]
    MissingParties,

    #[error("Please select source and destination for all routes")]
    IncompleteRoute,

    #[error("Please add at least one material for all routes")]
    EmptyRoute,

    #[error("At least one route pair is required")]
    LastRoute,

    #[error("Quantity must be a non-negative number (got {0})")]
    InvalidQuantity(String),

    #[error("no route at position {0}")]
    NoSuchRoute(usize),

    #[error("no material at position {index} on route {route}")]
    NoSuchMaterial { route: usize, index: usize },

    #[error("shipment editor is not open")]
    NotOpen,

    #[error("a save is already in progress")]
    Busy,
}

#[derive(Debug)]
pub struct ShipmentEditor {
    state: EditorState,
    transporter_id: Option<i64>,
    vehicle_id: Option<i64>,
    legs: Vec<LegBuffer>,
    next_temp: u64,
    material_options: Vec<SelectOption>,
}

impl Default for ShipmentEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipmentEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Closed,
            transporter_id: None,
            vehicle_id: None,
            legs: Vec::new(),
            next_temp: 0,
            material_options: Vec::new(),
        }
    }

    /// Material choices used to label added lines.
    pub fn set_material_options(&mut self, options: Vec<SelectOption>) {
        self.material_options = options;
    }

    pub fn material_options(&self) -> &[SelectOption] {
        &self.material_options
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditorState::Closed)
    }

    pub fn title(&self) -> Option<&'static str> {
        match self.state {
            EditorState::Closed => None,
            EditorState::Open(EditorMode::Create) | EditorState::Submitting(EditorMode::Create) => {
                Some("Add New Shipment")
            }
            EditorState::Open(EditorMode::Edit(_)) | EditorState::Submitting(EditorMode::Edit(_)) => {
                Some("Edit Shipment")
            }
        }
    }

    pub fn transporter_id(&self) -> Option<i64> {
        self.transporter_id
    }

    pub fn vehicle_id(&self) -> Option<i64> {
        self.vehicle_id
    }

    pub fn legs(&self) -> &[LegBuffer] {
        &self.legs
    }

    fn fresh_temp_id(&mut self) -> TempId {
        self.next_temp += 1;
        TempId(self.next_temp)
    }

    // ── Open / close ────────────────────────────────────────────────

    pub fn open_create(&mut self) {
        self.transporter_id = None;
        self.vehicle_id = None;
        let temp = self.fresh_temp_id();
        self.legs = vec![LegBuffer::empty(temp)];
        self.state = EditorState::Open(EditorMode::Create);
    }

    /// Load a persisted shipment into fresh buffers. Materials are copied,
    /// so editing never touches `shipment`.
    pub fn open_edit(&mut self, shipment: &Shipment) {
        self.transporter_id = shipment.transporter.as_ref().map(|t| t.id);
        self.vehicle_id = shipment.vehicle.as_ref().map(|v| v.id);
        self.legs = Vec::with_capacity(shipment.routes.len().max(1));
        for leg in &shipment.routes {
            let temp_id = self.fresh_temp_id();
            self.legs.push(LegBuffer {
                temp_id,
                id: leg.id,
                source_id: leg.source_id,
                dest_id: leg.dest_id,
                source: leg.source.clone(),
                destination: leg.destination.clone(),
                materials: leg.materials.clone(),
            });
        }
        if self.legs.is_empty() {
            let temp = self.fresh_temp_id();
            self.legs.push(LegBuffer::empty(temp));
        }
        self.state = EditorState::Open(EditorMode::Edit(shipment.id));
    }

    /// Discard the buffer.
    pub fn close(&mut self) {
        self.state = EditorState::Closed;
        self.transporter_id = None;
        self.vehicle_id = None;
        self.legs.clear();
    }

    fn editable(&self) -> Result<(), ValidationError> {
        match self.state {
            EditorState::Open(_) => Ok(()),
            EditorState::Submitting(_) => Err(ValidationError::Busy),
            EditorState::Closed => Err(ValidationError::NotOpen),
        }
    }

    fn leg_mut(&mut self, route: usize) -> Result<&mut LegBuffer, ValidationError> {
        self.editable()?;
        self.legs.get_mut(route).ok_or(ValidationError::NoSuchRoute(route))
    }

    // ── Selections ──────────────────────────────────────────────────

    /// `None` (or a zero id) clears the selection.
    pub fn set_transporter(&mut self, id: Option<i64>) -> Result<(), ValidationError> {
        self.editable()?;
        self.transporter_id = id.filter(|&i| i != 0);
        Ok(())
    }

    pub fn set_vehicle(&mut self, id: Option<i64>) -> Result<(), ValidationError> {
        self.editable()?;
        self.vehicle_id = id.filter(|&i| i != 0);
        Ok(())
    }

    // ── Legs ────────────────────────────────────────────────────────

    pub fn add_leg(&mut self) -> Result<TempId, ValidationError> {
        self.editable()?;
        let temp = self.fresh_temp_id();
        self.legs.push(LegBuffer::empty(temp));
        Ok(temp)
    }

    /// Remove a leg. The last remaining leg cannot be removed.
    pub fn remove_leg(&mut self, route: usize) -> Result<LegBuffer, ValidationError> {
        self.editable()?;
        if route >= self.legs.len() {
            return Err(ValidationError::NoSuchRoute(route));
        }
        if self.legs.len() == 1 {
            return Err(ValidationError::LastRoute);
        }
        Ok(self.legs.remove(route))
    }

    /// Drop every leg and start over from one empty leg. Selections stay.
    pub fn clear_routes(&mut self) -> Result<(), ValidationError> {
        self.editable()?;
        let temp = self.fresh_temp_id();
        self.legs = vec![LegBuffer::empty(temp)];
        Ok(())
    }

    pub fn set_source(&mut self, route: usize, edge_id: i64) -> Result<(), ValidationError> {
        self.leg_mut(route)?.source_id = edge_id;
        Ok(())
    }

    pub fn set_destination(&mut self, route: usize, edge_id: i64) -> Result<(), ValidationError> {
        self.leg_mut(route)?.dest_id = edge_id;
        Ok(())
    }

    // ── Materials ───────────────────────────────────────────────────

    /// Append material `material_id` with quantity 1. Ids missing from the
    /// material options are ignored (`Ok(false)`). Duplicates are kept.
    pub fn add_material(&mut self, route: usize, material_id: i64) -> Result<bool, ValidationError> {
        let label = SelectOption::label_of(&self.material_options, material_id).map(str::to_string);
        let leg = self.leg_mut(route)?;
        let Some(name) = label else {
            return Ok(false);
        };
        leg.materials.push(MaterialLine { id: material_id, name, quantity: 1.0 });
        Ok(true)
    }

    pub fn set_quantity(&mut self, route: usize, index: usize, quantity: f64) -> Result<(), ValidationError> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ValidationError::InvalidQuantity(quantity.to_string()));
        }
        let line = self
            .leg_mut(route)?
            .materials
            .get_mut(index)
            .ok_or(ValidationError::NoSuchMaterial { route, index })?;
        line.quantity = quantity;
        Ok(())
    }

    /// Quantity from a raw number input. Blank counts as zero.
    pub fn set_quantity_input(&mut self, route: usize, index: usize, raw: &str) -> Result<(), ValidationError> {
        let trimmed = raw.trim();
        let quantity = if trimmed.is_empty() {
            0.0
        } else {
            trimmed
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidQuantity(raw.to_string()))?
        };
        self.set_quantity(route, index, quantity)
    }

    pub fn remove_material(&mut self, route: usize, index: usize) -> Result<MaterialLine, ValidationError> {
        let leg = self.leg_mut(route)?;
        if index >= leg.materials.len() {
            return Err(ValidationError::NoSuchMaterial { route, index });
        }
        Ok(leg.materials.remove(index))
    }

    /// Sum of quantities over every material on every leg. Display only.
    pub fn total_weight(&self) -> f64 {
        self.legs.iter().map(LegBuffer::weight).sum()
    }

    // ── Submit ──────────────────────────────────────────────────────

    /// Check the pre-submit invariants; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.transporter_id.is_none() || self.vehicle_id.is_none() {
            return Err(ValidationError::MissingParties);
        }
        if self.legs.is_empty() {
            return Err(ValidationError::LastRoute);
        }
        if !self.legs.iter().all(LegBuffer::is_routed) {
            return Err(ValidationError::IncompleteRoute);
        }
        if self.legs.iter().any(|l| l.materials.is_empty()) {
            return Err(ValidationError::EmptyRoute);
        }
        Ok(())
    }

    /// The wire payload. Temp ids, names and totals are dropped.
    pub fn payload(&self) -> Result<ShipmentPayload, ValidationError> {
        self.validate()?;
        let (Some(transporter_id), Some(vehicle_id)) = (self.transporter_id, self.vehicle_id) else {
            return Err(ValidationError::MissingParties);
        };
        let route_pairs = self
            .legs
            .iter()
            .map(|leg| RoutePair {
                source_id: leg.source_id,
                dest_id: leg.dest_id,
                materials: leg
                    .materials
                    .iter()
                    .map(|m| MaterialQuantity { material_id: m.id, quantity: m.quantity })
                    .collect(),
            })
            .collect();
        Ok(ShipmentPayload { transporter_id, vehicle_id, route_pairs })
    }

    /// Validate, flatten and move to `Submitting`. On error the editor stays
    /// open and untouched.
    pub fn begin_submit(&mut self) -> Result<(EditorMode, ShipmentPayload), ValidationError> {
        let mode = match self.state {
            EditorState::Open(mode) => mode,
            EditorState::Submitting(_) => return Err(ValidationError::Busy),
            EditorState::Closed => return Err(ValidationError::NotOpen),
        };
        let payload = self.payload()?;
        self.state = EditorState::Submitting(mode);
        Ok((mode, payload))
    }

    /// Leave `Submitting`: close on success, reopen unchanged on failure.
    pub fn finish_submit(&mut self, saved: bool) {
        if let EditorState::Submitting(mode) = self.state {
            if saved {
                self.close();
            } else {
                self.state = EditorState::Open(mode);
            }
        }
    }
}
