use chrono::NaiveDate;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use taller_core::{DomainError, DomainResult, Folio};

use crate::line_item::LineItemDetail;

/// Repair order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    Pending,
    InProgress,
    Completed,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "pending",
            RepairStatus::InProgress => "in_progress",
            RepairStatus::Completed => "completed",
        }
    }
}

impl FromStr for RepairStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RepairStatus::Pending),
            "in_progress" => Ok(RepairStatus::InProgress),
            "completed" => Ok(RepairStatus::Completed),
            other => Err(DomainError::validation(format!(
                "status must be one of pending, in_progress, completed (got {other:?})"
            ))),
        }
    }
}

/// A repair order, keyed by folio.
///
/// `plate` is the registration of the vehicle under repair, carried as an
/// opaque reference; vehicle records live outside this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrder {
    pub folio: Folio,
    pub plate: String,
    pub status: RepairStatus,
    pub entered_at: NaiveDate,
    pub left_at: Option<NaiveDate>,
}

/// A repair order together with its line-item details, as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOrderFull {
    #[serde(flatten)]
    pub order: RepairOrder,
    pub items: Vec<LineItemDetail>,
}

/// Payload for opening a repair order. Status defaults to `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRepairOrder {
    pub plate: String,
    pub entered_at: NaiveDate,
    pub left_at: Option<NaiveDate>,
    pub status: Option<RepairStatus>,
}

/// Payload for replacing a repair order's header fields.
///
/// Line items are edited through their own create/delete operations so that
/// every quantity change passes through the reservation workflow; an order
/// update never touches inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrderPatch {
    pub plate: String,
    pub entered_at: NaiveDate,
    pub left_at: Option<NaiveDate>,
    pub status: RepairStatus,
}

fn validate_plate(plate: &str) -> DomainResult<()> {
    let len = plate.trim().len();
    if !(6..=10).contains(&len) {
        return Err(DomainError::validation(
            "plate must be 6 to 10 characters",
        ));
    }
    Ok(())
}

fn validate_dates(entered_at: NaiveDate, left_at: Option<NaiveDate>) -> DomainResult<()> {
    if let Some(left) = left_at {
        if left < entered_at {
            return Err(DomainError::validation(
                "departure date cannot precede entry date",
            ));
        }
    }
    Ok(())
}

impl NewRepairOrder {
    pub fn validate(&self) -> DomainResult<()> {
        validate_plate(&self.plate)?;
        validate_dates(self.entered_at, self.left_at)
    }
}

impl RepairOrderPatch {
    pub fn validate(&self) -> DomainResult<()> {
        validate_plate(&self.plate)?;
        validate_dates(self.entered_at, self.left_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn test_new_order() -> NewRepairOrder {
        NewRepairOrder {
            plate: "ABC1234".to_string(),
            entered_at: test_date(10),
            left_at: None,
            status: None,
        }
    }

    #[test]
    fn accepts_open_ended_order() {
        assert!(test_new_order().validate().is_ok());
    }

    #[test]
    fn rejects_departure_before_entry() {
        let mut order = test_new_order();
        order.left_at = Some(test_date(9));
        assert!(order.validate().is_err());

        order.left_at = Some(test_date(10));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_plate() {
        let mut order = test_new_order();
        order.plate = "AB1".to_string();
        assert!(order.validate().is_err());
        order.plate = "ABCDEFGHIJK".to_string();
        assert!(order.validate().is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            RepairStatus::Pending,
            RepairStatus::InProgress,
            RepairStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<RepairStatus>().unwrap(), status);
        }
        assert!("done".parse::<RepairStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let s = serde_json::to_string(&RepairStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");
    }
}
