//! Thin CRUD services above the store.
//!
//! Validation and not-found mapping for parts and repair orders. Line-item
//! reservations go through the [`OrderCoordinator`]; the only other stock
//! write is [`PartService::adjust_stock`], a manual correction that uses the
//! same conditional update as the reservation workflow.

use std::sync::Arc;

use taller_core::{DomainError, DomainResult, Folio, LineItemId, PartId};
use taller_workshop::{
    LineItem, LineItemDetail, NewLineItem, NewPart, NewRepairOrder, Part, PartPatch, RepairOrder,
    RepairOrderFull, RepairOrderPatch,
};

use crate::coordinator::OrderCoordinator;
use crate::store::WorkshopStore;

/// Parts catalog CRUD.
pub struct PartService<S> {
    store: Arc<S>,
}

impl<S> Clone for PartService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: WorkshopStore> PartService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> DomainResult<Vec<Part>> {
        Ok(self.store.list_parts().await?)
    }

    pub async fn get(&self, id: PartId) -> DomainResult<Part> {
        self.store
            .find_part(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("part {id}")))
    }

    pub async fn create(&self, part: NewPart) -> DomainResult<Part> {
        part.validate()?;
        Ok(self.store.insert_part(part).await?)
    }

    pub async fn update(&self, id: PartId, patch: PartPatch) -> DomainResult<Part> {
        patch.validate()?;
        if !self.store.update_part(id, patch.clone()).await? {
            return Err(DomainError::not_found(format!("part {id}")));
        }
        Ok(Part {
            id,
            description: patch.description,
            stock: patch.stock,
            unit_price: patch.unit_price,
        })
    }

    /// Apply a manual stock correction of `delta` units.
    ///
    /// Runs in its own transaction through the same conditional check-and-set
    /// as reservations, so a correction that would leave stock negative is
    /// refused as a `Conflict` and nothing changes.
    pub async fn adjust_stock(&self, id: PartId, delta: i64) -> DomainResult<Part> {
        if self.store.find_part(id).await?.is_none() {
            return Err(DomainError::not_found(format!("part {id}")));
        }

        let mut tx = self.store.begin().await?;
        match self.store.adjust_stock(&mut tx, id, delta).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.store.rollback(tx).await {
                    tracing::warn!(error = %e, "transaction rollback failed");
                }
                return Err(DomainError::conflict(format!(
                    "stock adjustment of {delta} would leave part {id} negative"
                )));
            }
            Err(e) => {
                if let Err(e) = self.store.rollback(tx).await {
                    tracing::warn!(error = %e, "transaction rollback failed");
                }
                return Err(e.into());
            }
        }
        self.store.commit(tx).await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: PartId) -> DomainResult<()> {
        if self.store.part_referenced(id).await? {
            return Err(DomainError::conflict(format!(
                "part {id} is still referenced by repair line items"
            )));
        }
        if !self.store.delete_part(id).await? {
            return Err(DomainError::not_found(format!("part {id}")));
        }
        Ok(())
    }
}

/// Repair-order CRUD plus line-item operations via the coordinator.
pub struct RepairService<S> {
    store: Arc<S>,
    coordinator: OrderCoordinator<S>,
}

impl<S> Clone for RepairService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

impl<S: WorkshopStore> RepairService<S> {
    pub fn new(store: Arc<S>) -> Self {
        let coordinator = OrderCoordinator::new(store.clone());
        Self { store, coordinator }
    }

    pub async fn list(&self) -> DomainResult<Vec<RepairOrder>> {
        Ok(self.store.list_orders().await?)
    }

    /// Orders for one vehicle plate. The plate is normalized the same way it
    /// is stored, so lookups are trim- and case-insensitive. An unknown plate
    /// yields an empty list.
    pub async fn list_by_plate(&self, plate: &str) -> DomainResult<Vec<RepairOrder>> {
        let plate = normalize_plate(plate);
        Ok(self.store.orders_for_plate(&plate).await?)
    }

    pub async fn get(&self, folio: Folio) -> DomainResult<RepairOrderFull> {
        let order = self
            .store
            .find_order(folio)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repair order {folio}")))?;
        let items = self.store.line_item_details_for_order(folio).await?;
        Ok(RepairOrderFull { order, items })
    }

    pub async fn create(&self, mut order: NewRepairOrder) -> DomainResult<RepairOrderFull> {
        order.plate = normalize_plate(&order.plate);
        order.validate()?;
        let created = self.store.insert_order(order).await?;
        Ok(RepairOrderFull {
            order: created,
            items: Vec::new(),
        })
    }

    /// Replace an order's header fields. Never adjusts inventory: quantity
    /// changes are made by deleting and re-creating line items so they pass
    /// through the reservation workflow.
    pub async fn update(
        &self,
        folio: Folio,
        mut patch: RepairOrderPatch,
    ) -> DomainResult<RepairOrderFull> {
        patch.plate = normalize_plate(&patch.plate);
        patch.validate()?;
        if !self.store.update_order(folio, patch).await? {
            return Err(DomainError::not_found(format!("repair order {folio}")));
        }
        self.get(folio).await
    }

    /// Cascade-delete an order through the coordinator.
    pub async fn delete(&self, folio: Folio) -> DomainResult<()> {
        if !self.coordinator.delete_order(folio).await? {
            return Err(DomainError::not_found(format!("repair order {folio}")));
        }
        Ok(())
    }

    pub async fn list_line_items(&self, folio: Folio) -> DomainResult<Vec<LineItemDetail>> {
        self.coordinator.list_line_items(folio).await
    }

    pub async fn create_line_item(&self, item: NewLineItem) -> DomainResult<LineItem> {
        self.coordinator.create_line_item(item).await
    }

    pub async fn delete_line_item(&self, id: LineItemId) -> DomainResult<()> {
        self.coordinator.delete_line_item(id).await
    }
}
