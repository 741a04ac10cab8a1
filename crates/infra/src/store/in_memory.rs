//! In-memory workshop store for tests/dev.
//!
//! A transaction takes the store-wide lock and mutates a working copy of the
//! state; commit writes the copy back, rollback drops it. That makes
//! transactions serializable (coarsely, one at a time), which is all the
//! dev/test backend needs to honor the ledger's check-and-set contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use taller_core::{Folio, LineItemId, PartId};
use taller_workshop::{
    LineItem, LineItemDetail, NewLineItem, NewPart, NewRepairOrder, Part, PartPatch, RepairOrder,
    RepairOrderPatch, RepairStatus,
};

use super::{StoreError, StoreResult, WorkshopStore};

#[derive(Debug, Clone)]
struct State {
    parts: BTreeMap<i64, Part>,
    orders: BTreeMap<i64, RepairOrder>,
    line_items: BTreeMap<i64, LineItem>,
    next_part_id: i64,
    next_folio: i64,
    next_line_item_id: i64,
}

impl State {
    fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            orders: BTreeMap::new(),
            line_items: BTreeMap::new(),
            next_part_id: 1,
            next_folio: 1,
            next_line_item_id: 1,
        }
    }
}

/// In-memory store.
#[derive(Debug, Clone)]
pub struct InMemoryWorkshopStore {
    state: Arc<Mutex<State>>,
}

/// Open transaction: the state lock plus a working copy of the state.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
}

impl InMemoryWorkshopStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
        }
    }
}

impl Default for InMemoryWorkshopStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_adjust(state: &mut State, id: PartId, delta: i64) -> bool {
    match state.parts.get_mut(&id.get()) {
        Some(part) if part.stock + delta >= 0 => {
            part.stock += delta;
            true
        }
        _ => false,
    }
}

fn items_for(state: &State, folio: Folio) -> Vec<LineItem> {
    state
        .line_items
        .values()
        .filter(|item| item.folio == folio)
        .cloned()
        .collect()
}

#[async_trait]
impl WorkshopStore for InMemoryWorkshopStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        let InMemoryTx { mut guard, working } = tx;
        *guard = working;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        drop(tx);
        Ok(())
    }

    async fn list_parts(&self) -> StoreResult<Vec<Part>> {
        let state = self.state.lock().await;
        let mut parts: Vec<Part> = state.parts.values().cloned().collect();
        parts.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
        Ok(parts)
    }

    async fn find_part(&self, id: PartId) -> StoreResult<Option<Part>> {
        let state = self.state.lock().await;
        Ok(state.parts.get(&id.get()).cloned())
    }

    async fn insert_part(&self, part: NewPart) -> StoreResult<Part> {
        let mut state = self.state.lock().await;
        let id = PartId::new(state.next_part_id);
        state.next_part_id += 1;
        let part = Part {
            id,
            description: part.description,
            stock: part.stock,
            unit_price: part.unit_price,
        };
        state.parts.insert(id.get(), part.clone());
        Ok(part)
    }

    async fn update_part(&self, id: PartId, patch: PartPatch) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.parts.get_mut(&id.get()) {
            Some(part) => {
                part.description = patch.description;
                part.stock = patch.stock;
                part.unit_price = patch.unit_price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_part(&self, id: PartId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.parts.remove(&id.get()).is_some())
    }

    async fn part_referenced(&self, id: PartId) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state.line_items.values().any(|item| item.part_id == id))
    }

    async fn adjust_stock(&self, tx: &mut Self::Tx, id: PartId, delta: i64) -> StoreResult<bool> {
        Ok(apply_adjust(&mut tx.working, id, delta))
    }

    async fn list_orders(&self) -> StoreResult<Vec<RepairOrder>> {
        let state = self.state.lock().await;
        Ok(state.orders.values().cloned().collect())
    }

    async fn find_order(&self, folio: Folio) -> StoreResult<Option<RepairOrder>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&folio.get()).cloned())
    }

    async fn orders_for_plate(&self, plate: &str) -> StoreResult<Vec<RepairOrder>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.plate == plate)
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: NewRepairOrder) -> StoreResult<RepairOrder> {
        let mut state = self.state.lock().await;
        let folio = Folio::new(state.next_folio);
        state.next_folio += 1;
        let order = RepairOrder {
            folio,
            plate: order.plate,
            status: order.status.unwrap_or(RepairStatus::Pending),
            entered_at: order.entered_at,
            left_at: order.left_at,
        };
        state.orders.insert(folio.get(), order.clone());
        Ok(order)
    }

    async fn update_order(&self, folio: Folio, patch: RepairOrderPatch) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.orders.get_mut(&folio.get()) {
            Some(order) => {
                order.plate = patch.plate;
                order.status = patch.status;
                order.entered_at = patch.entered_at;
                order.left_at = patch.left_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, tx: &mut Self::Tx, folio: Folio) -> StoreResult<bool> {
        Ok(tx.working.orders.remove(&folio.get()).is_some())
    }

    async fn find_line_item(&self, id: LineItemId) -> StoreResult<Option<LineItem>> {
        let state = self.state.lock().await;
        Ok(state.line_items.get(&id.get()).cloned())
    }

    async fn line_items_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItem>> {
        let state = self.state.lock().await;
        Ok(items_for(&state, folio))
    }

    async fn line_items_for_order_in(
        &self,
        tx: &mut Self::Tx,
        folio: Folio,
    ) -> StoreResult<Vec<LineItem>> {
        Ok(items_for(&tx.working, folio))
    }

    async fn line_item_details_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItemDetail>> {
        let state = self.state.lock().await;
        items_for(&state, folio)
            .into_iter()
            .map(|item| {
                let part = state.parts.get(&item.part_id.get()).ok_or_else(|| {
                    StoreError::Decode(format!("line item {} references missing part", item.id))
                })?;
                Ok(LineItemDetail {
                    part_description: part.description.clone(),
                    current_price: part.unit_price,
                    item,
                })
            })
            .collect()
    }

    async fn insert_line_item(
        &self,
        tx: &mut Self::Tx,
        item: NewLineItem,
    ) -> StoreResult<LineItem> {
        let id = LineItemId::new(tx.working.next_line_item_id);
        tx.working.next_line_item_id += 1;
        let item = LineItem {
            id,
            folio: item.folio,
            part_id: item.part_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        };
        tx.working.line_items.insert(id.get(), item.clone());
        Ok(item)
    }

    async fn delete_line_item(&self, tx: &mut Self::Tx, id: LineItemId) -> StoreResult<bool> {
        Ok(tx.working.line_items.remove(&id.get()).is_some())
    }

    async fn delete_line_items_for_order(
        &self,
        tx: &mut Self::Tx,
        folio: Folio,
    ) -> StoreResult<()> {
        tx.working.line_items.retain(|_, item| item.folio != folio);
        Ok(())
    }
}
