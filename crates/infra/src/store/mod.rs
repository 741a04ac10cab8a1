//! Workshop storage abstraction.
//!
//! One trait covers the three row families of this subsystem: parts (the
//! inventory ledger), repair orders, and line items. Mutations that must be
//! part of a coordinator transaction take an explicit `&mut Self::Tx` handle;
//! everything else runs on its own connection. Stock is written only through
//! [`WorkshopStore::adjust_stock`], a single conditional check-and-set.

use async_trait::async_trait;

use taller_core::{DomainError, Folio, LineItemId, PartId};
use taller_workshop::{
    LineItem, LineItemDetail, NewLineItem, NewPart, NewRepairOrder, Part, PartPatch, RepairOrder,
    RepairOrderPatch,
};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryWorkshopStore;

/// Store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("row decode failed: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        DomainError::storage(err.to_string())
    }
}

/// Storage backend for the workshop.
#[async_trait]
pub trait WorkshopStore: Send + Sync + 'static {
    /// Transaction handle. Borrowed by one operation at a time and never
    /// shared across concurrent operations.
    type Tx: Send;

    async fn begin(&self) -> StoreResult<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;
    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()>;

    // --- Parts (inventory ledger) ---

    /// All parts, ordered by description.
    async fn list_parts(&self) -> StoreResult<Vec<Part>>;

    async fn find_part(&self, id: PartId) -> StoreResult<Option<Part>>;

    async fn insert_part(&self, part: NewPart) -> StoreResult<Part>;

    /// Replace a part's fields. Returns whether the row existed.
    async fn update_part(&self, id: PartId, patch: PartPatch) -> StoreResult<bool>;

    async fn delete_part(&self, id: PartId) -> StoreResult<bool>;

    /// Whether any line item still references the part.
    async fn part_referenced(&self, id: PartId) -> StoreResult<bool>;

    /// Apply `delta` to the part's stock **only if** the result stays ≥ 0.
    ///
    /// This is a single atomic check-and-set against the backend, never a
    /// read-then-write from the caller's side, so concurrent reservations on
    /// the same part cannot drive stock negative together. Returns `false`
    /// when the constraint would be violated (the row is left untouched) or
    /// the part does not exist.
    async fn adjust_stock(&self, tx: &mut Self::Tx, id: PartId, delta: i64) -> StoreResult<bool>;

    // --- Repair orders ---

    /// All orders, ordered by folio.
    async fn list_orders(&self) -> StoreResult<Vec<RepairOrder>>;

    async fn find_order(&self, folio: Folio) -> StoreResult<Option<RepairOrder>>;

    /// Orders for one vehicle plate, ordered by folio.
    async fn orders_for_plate(&self, plate: &str) -> StoreResult<Vec<RepairOrder>>;

    /// Insert an order, assigning the folio. A missing status defaults to
    /// `pending`, as the schema does.
    async fn insert_order(&self, order: NewRepairOrder) -> StoreResult<RepairOrder>;

    async fn update_order(&self, folio: Folio, patch: RepairOrderPatch) -> StoreResult<bool>;

    /// Delete the order row inside `tx`. Returns whether it existed.
    async fn delete_order(&self, tx: &mut Self::Tx, folio: Folio) -> StoreResult<bool>;

    // --- Line items ---

    async fn find_line_item(&self, id: LineItemId) -> StoreResult<Option<LineItem>>;

    /// Line items of an order, in stable id order.
    async fn line_items_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItem>>;

    /// Same as [`Self::line_items_for_order`] but reading through `tx`, for
    /// enumeration inside a cascade.
    async fn line_items_for_order_in(
        &self,
        tx: &mut Self::Tx,
        folio: Folio,
    ) -> StoreResult<Vec<LineItem>>;

    /// Line items joined with their part (description, current price), in
    /// stable id order.
    async fn line_item_details_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItemDetail>>;

    /// Insert a line item inside `tx`, assigning its id and freezing the
    /// unit price carried in `item`.
    async fn insert_line_item(&self, tx: &mut Self::Tx, item: NewLineItem)
        -> StoreResult<LineItem>;

    /// Delete one line item row inside `tx`. Returns whether it existed.
    async fn delete_line_item(&self, tx: &mut Self::Tx, id: LineItemId) -> StoreResult<bool>;

    /// Purge all line items of an order inside `tx`.
    async fn delete_line_items_for_order(&self, tx: &mut Self::Tx, folio: Folio)
        -> StoreResult<()>;
}
