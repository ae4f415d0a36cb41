//! Shipments: nested records, the composite editor and the list session.
//!
//! A shipment has structure the generic CRUD page cannot express (route
//! legs, each with material lines), so it gets its own editor and screen.

mod editor;
mod model;
mod session;

pub use editor::{EditorMode, EditorState, LegBuffer, ShipmentEditor, TempId, ValidationError};
pub use model::{
    MaterialLine, MaterialQuantity, RouteLeg, RoutePair, Shipment, ShipmentFilter, ShipmentPayload, ShipmentRow,
    TransporterRef, VehicleRef,
};
pub use session::{HelperOptions, SaveError, ShipmentDeletion, ShipmentPage, ShipmentSession, SHIPMENT_DEBOUNCE};
