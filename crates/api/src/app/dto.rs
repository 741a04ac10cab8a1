use chrono::NaiveDate;
use serde::Deserialize;

use taller_core::{Folio, PartId};
use taller_workshop::{
    NewLineItem, NewPart, NewRepairOrder, PartPatch, RepairOrderPatch, RepairStatus,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePartRequest {
    pub description: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub unit_price: i64,
}

impl From<CreatePartRequest> for NewPart {
    fn from(req: CreatePartRequest) -> Self {
        NewPart {
            description: req.description,
            stock: req.stock,
            unit_price: req.unit_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePartRequest {
    pub description: String,
    pub stock: i64,
    pub unit_price: i64,
}

impl From<UpdatePartRequest> for PartPatch {
    fn from(req: UpdatePartRequest) -> Self {
        PartPatch {
            description: req.description,
            stock: req.stock,
            unit_price: req.unit_price,
        }
    }
}

/// Body of a manual stock correction, a signed delta in units.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

/// Query string of the repairs listing. A `plate` filter narrows the list
/// to one vehicle.
#[derive(Debug, Deserialize)]
pub struct ListRepairsQuery {
    #[serde(default)]
    pub plate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRepairRequest {
    pub plate: String,
    pub entered_at: NaiveDate,
    #[serde(default)]
    pub left_at: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<RepairStatus>,
}

impl From<CreateRepairRequest> for NewRepairOrder {
    fn from(req: CreateRepairRequest) -> Self {
        NewRepairOrder {
            plate: req.plate,
            entered_at: req.entered_at,
            left_at: req.left_at,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRepairRequest {
    pub plate: String,
    pub entered_at: NaiveDate,
    #[serde(default)]
    pub left_at: Option<NaiveDate>,
    pub status: RepairStatus,
}

impl From<UpdateRepairRequest> for RepairOrderPatch {
    fn from(req: UpdateRepairRequest) -> Self {
        RepairOrderPatch {
            plate: req.plate,
            entered_at: req.entered_at,
            left_at: req.left_at,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLineItemRequest {
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_price: i64,
}

impl CreateLineItemRequest {
    pub fn into_new_line_item(self, folio: Folio) -> NewLineItem {
        NewLineItem {
            folio,
            part_id: self.part_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}
