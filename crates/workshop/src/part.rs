use serde::{Deserialize, Serialize};

use taller_core::{DomainError, DomainResult, PartId};

/// A part in the workshop inventory.
///
/// `stock` is the number of units on hand and is never negative at any
/// observable point; all writes to it go through the store's single
/// conditional adjustment operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub description: String,
    pub stock: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
}

/// Payload for creating a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPart {
    pub description: String,
    pub stock: i64,
    pub unit_price: i64,
}

/// Payload for replacing a part's mutable fields.
///
/// Writing `stock` through this path is a plain replacement for catalog
/// corrections; reservations and releases never use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartPatch {
    pub description: String,
    pub stock: i64,
    pub unit_price: i64,
}

fn validate_fields(description: &str, stock: i64, unit_price: i64) -> DomainResult<()> {
    if description.trim().is_empty() {
        return Err(DomainError::validation("description cannot be empty"));
    }
    if stock < 0 {
        return Err(DomainError::validation("stock cannot be negative"));
    }
    if unit_price < 0 {
        return Err(DomainError::validation("unit price cannot be negative"));
    }
    Ok(())
}

impl NewPart {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.description, self.stock, self.unit_price)
    }
}

impl PartPatch {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.description, self.stock, self.unit_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_new_part() -> NewPart {
        NewPart {
            description: "brake pad".to_string(),
            stock: 10,
            unit_price: 2_500,
        }
    }

    #[test]
    fn accepts_a_well_formed_part() {
        assert!(test_new_part().validate().is_ok());
    }

    #[test]
    fn rejects_blank_description() {
        let mut part = test_new_part();
        part.description = "   ".to_string();
        assert!(matches!(
            part.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn rejects_negative_stock_and_price() {
        let mut part = test_new_part();
        part.stock = -1;
        assert!(part.validate().is_err());

        let mut part = test_new_part();
        part.unit_price = -1;
        assert!(part.validate().is_err());
    }
}
