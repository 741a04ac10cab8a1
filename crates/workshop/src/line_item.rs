use serde::{Deserialize, Serialize};

use taller_core::{DomainError, DomainResult, Folio, LineItemId, PartId};

/// One part-and-quantity entry within a repair order.
///
/// `unit_price` is a frozen copy of the price agreed when the line item was
/// created, not a live reference to the part's current price. Line items are
/// created and destroyed only through the order coordinator, which ties each
/// mutation to a stock reservation or release in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub folio: Folio,
    pub part_id: PartId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents), frozen at creation.
    pub unit_price: i64,
}

/// Payload for creating a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub folio: Folio,
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_price: i64,
}

impl NewLineItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(())
    }
}

/// A line item joined with its part for listing: the frozen price next to
/// the part's description and current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDetail {
    #[serde(flatten)]
    pub item: LineItem,
    pub part_description: String,
    /// The part's price as of the query, in smallest currency unit.
    pub current_price: i64,
}
