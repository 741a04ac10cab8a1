//! Order lifecycle coordinator.
//!
//! Orchestrates the multi-step operations that tie line-item rows to part
//! stock: creating a line item reserves stock, deleting one releases it, and
//! deleting an order releases every reservation before removing its rows.
//! Each operation is a single transaction; any failed step rolls the whole
//! operation back before the error surfaces.

use std::sync::Arc;

use taller_core::{DomainError, DomainResult, Folio, LineItemId};
use taller_workshop::{LineItem, LineItemDetail, NewLineItem};

use crate::store::WorkshopStore;

pub struct OrderCoordinator<S> {
    store: Arc<S>,
}

impl<S> Clone for OrderCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: WorkshopStore> OrderCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Roll back, keeping the original failure as the surfaced error.
    async fn abort(&self, tx: S::Tx) {
        if let Err(e) = self.store.rollback(tx).await {
            tracing::warn!(error = %e, "transaction rollback failed");
        }
    }

    /// Create a line item, reserving its stock in the same transaction.
    ///
    /// The reservation is the store's conditional check-and-set; when it
    /// reports insufficient stock the transaction is rolled back and the
    /// caller sees `Conflict`, a client-facing condition rather than a
    /// defect.
    pub async fn create_line_item(&self, item: NewLineItem) -> DomainResult<LineItem> {
        // A non-positive quantity must never reach the ledger.
        item.validate()?;

        self.store
            .find_order(item.folio)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repair order {}", item.folio)))?;
        self.store
            .find_part(item.part_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("part {}", item.part_id)))?;

        let mut tx = self.store.begin().await?;

        let reserved = match self
            .store
            .adjust_stock(&mut tx, item.part_id, -item.quantity)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };
        if !reserved {
            self.abort(tx).await;
            return Err(DomainError::conflict("insufficient stock for the part"));
        }

        let created = match self.store.insert_line_item(&mut tx, item).await {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };

        self.store.commit(tx).await?;
        tracing::debug!(
            line_item = %created.id,
            folio = %created.folio,
            part = %created.part_id,
            quantity = created.quantity,
            "line item created, stock reserved"
        );
        Ok(created)
    }

    /// Delete a line item, releasing its stock in the same transaction.
    pub async fn delete_line_item(&self, id: LineItemId) -> DomainResult<()> {
        let item = self
            .store
            .find_line_item(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("line item {id}")))?;

        let mut tx = self.store.begin().await?;

        let released = match self
            .store
            .adjust_stock(&mut tx, item.part_id, item.quantity)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };
        if !released {
            // A restock cannot violate the ≥ 0 constraint, so a refusal here
            // means the ledger and the line items disagree.
            self.abort(tx).await;
            return Err(DomainError::conflict(format!(
                "could not release stock for part {}",
                item.part_id
            )));
        }

        let deleted = match self.store.delete_line_item(&mut tx, id).await {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };
        if !deleted {
            self.abort(tx).await;
            return Err(DomainError::not_found(format!("line item {id}")));
        }

        self.store.commit(tx).await?;
        tracing::debug!(line_item = %id, part = %item.part_id, quantity = item.quantity,
            "line item deleted, stock released");
        Ok(())
    }

    /// Delete an order, releasing the stock of every line item before its
    /// rows are removed. Returns whether the order existed. The cascade is
    /// all-or-nothing: a failed release aborts the whole transaction.
    pub async fn delete_order(&self, folio: Folio) -> DomainResult<bool> {
        let mut tx = self.store.begin().await?;

        let items = match self.store.line_items_for_order_in(&mut tx, folio).await {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };

        for item in &items {
            let released = match self
                .store
                .adjust_stock(&mut tx, item.part_id, item.quantity)
                .await
            {
                Ok(v) => v,
                Err(e) => {
                    self.abort(tx).await;
                    return Err(e.into());
                }
            };
            if !released {
                self.abort(tx).await;
                return Err(DomainError::conflict(format!(
                    "could not release stock for part {}",
                    item.part_id
                )));
            }
        }

        if let Err(e) = self.store.delete_line_items_for_order(&mut tx, folio).await {
            self.abort(tx).await;
            return Err(e.into());
        }

        let existed = match self.store.delete_order(&mut tx, folio).await {
            Ok(v) => v,
            Err(e) => {
                self.abort(tx).await;
                return Err(e.into());
            }
        };

        self.store.commit(tx).await?;
        tracing::debug!(folio = %folio, items = items.len(), existed, "repair order deleted");
        Ok(existed)
    }

    /// Line items of an order with denormalized part data.
    pub async fn list_line_items(&self, folio: Folio) -> DomainResult<Vec<LineItemDetail>> {
        self.store
            .find_order(folio)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("repair order {folio}")))?;
        Ok(self.store.line_item_details_for_order(folio).await?)
    }
}
