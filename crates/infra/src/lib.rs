//! Infrastructure layer: storage backends and the order coordinator.

pub mod coordinator;
pub mod service;
pub mod store;


pub use coordinator::OrderCoordinator;
pub use service::{PartService, RepairService};
pub use store::{InMemoryWorkshopStore, StoreError, StoreResult, WorkshopStore};

#[cfg(feature = "postgres")]
pub use store::postgres::PgWorkshopStore;
