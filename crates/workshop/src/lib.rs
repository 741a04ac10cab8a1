//! Workshop domain module (parts, repair orders, line items).

pub mod line_item;
pub mod part;
pub mod repair;

pub use line_item::{LineItem, LineItemDetail, NewLineItem};
pub use part::{NewPart, Part, PartPatch};
pub use repair::{NewRepairOrder, RepairOrder, RepairOrderFull, RepairOrderPatch, RepairStatus};
