//! fleetdesk admin state.
//!
//! Everything a front end needs to drive the dashboard without owning any
//! business logic:
//!
//! - [`crud`]: a generic list/search/filter/create/edit/delete page built
//!   from a [`FieldDescriptor`] schema;
//! - [`shipment`]: the composite editor for nested shipments and its list;
//! - [`notice`]: transient notifications produced by both.
//!
//! Sessions own their state behind an async mutex and never hold it across
//! a network call. List refreshes are debounced and tagged with a
//! generation, so only the latest response is ever applied.

pub mod crud;
pub mod field;
pub mod list;
pub mod model;
pub mod notice;
pub mod number;
pub mod pages;
pub mod record;
pub mod shipment;
pub mod stream;

#[cfg(test)]
mod testing;

pub use crud::{CrudPage, CrudSession, DeleteConfirmation, EditBuffer, SubmitError, TableView};
pub use field::{coerce_form, Coercion, FieldDescriptor, FieldKind, FormData, FormError, Relation};
pub use list::{ListHost, ListView, RefreshOutcome};
pub use model::{Edge, Material, MaterialCategory, Transporter, VehicleType};
pub use notice::{Notice, NoticeLevel, Notices};
pub use record::{CellValue, Entity, Record, SelectOption};
pub use shipment::{Shipment, ShipmentEditor, ShipmentSession, ValidationError};
pub use stream::{Generation, RequestStream};
