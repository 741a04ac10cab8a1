//! Postgres-backed workshop store.
//!
//! The inventory ledger's constraint lives in one statement:
//!
//! ```sql
//! UPDATE parts SET stock = stock + $delta
//! WHERE part_id = $id AND stock + $delta >= 0
//! ```
//!
//! Row-level locking makes the check-and-set serializable per part, so two
//! concurrent reservations can never drive stock negative together. Cascade
//! deletion of an order is sequenced by the coordinator, never by an
//! `ON DELETE CASCADE` (the schema deliberately has none), because each row
//! removal has a stock release that must run inside the same transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use taller_core::{Folio, LineItemId, PartId};
use taller_workshop::{
    LineItem, LineItemDetail, NewLineItem, NewPart, NewRepairOrder, Part, PartPatch, RepairOrder,
    RepairOrderPatch, RepairStatus,
};

use super::{StoreError, StoreResult, WorkshopStore};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Postgres store over an sqlx connection pool.
#[derive(Clone)]
pub struct PgWorkshopStore {
    pool: PgPool,
}

impl PgWorkshopStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
        Ok(())
    }
}

fn map_part(row: &PgRow) -> StoreResult<Part> {
    Ok(Part {
        id: PartId::new(row.try_get("part_id")?),
        description: row.try_get("description")?,
        stock: row.try_get("stock")?,
        unit_price: row.try_get("unit_price")?,
    })
}

fn map_order(row: &PgRow) -> StoreResult<RepairOrder> {
    let status: String = row.try_get("status")?;
    Ok(RepairOrder {
        folio: Folio::new(row.try_get("folio")?),
        plate: row.try_get("plate")?,
        status: status
            .parse::<RepairStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        entered_at: row.try_get::<NaiveDate, _>("entered_at")?,
        left_at: row.try_get::<Option<NaiveDate>, _>("left_at")?,
    })
}

fn map_line_item(row: &PgRow) -> StoreResult<LineItem> {
    Ok(LineItem {
        id: LineItemId::new(row.try_get("line_item_id")?),
        folio: Folio::new(row.try_get("folio")?),
        part_id: PartId::new(row.try_get("part_id")?),
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
    })
}

#[async_trait]
impl WorkshopStore for PgWorkshopStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn list_parts(&self) -> StoreResult<Vec<Part>> {
        let rows = sqlx::query(
            "SELECT part_id, description, stock, unit_price FROM parts \
             ORDER BY description, part_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_part).collect()
    }

    async fn find_part(&self, id: PartId) -> StoreResult<Option<Part>> {
        let row = sqlx::query(
            "SELECT part_id, description, stock, unit_price FROM parts WHERE part_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_part).transpose()
    }

    async fn insert_part(&self, part: NewPart) -> StoreResult<Part> {
        let row = sqlx::query(
            "INSERT INTO parts (description, stock, unit_price) VALUES ($1, $2, $3) \
             RETURNING part_id",
        )
        .bind(&part.description)
        .bind(part.stock)
        .bind(part.unit_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(Part {
            id: PartId::new(row.try_get("part_id")?),
            description: part.description,
            stock: part.stock,
            unit_price: part.unit_price,
        })
    }

    async fn update_part(&self, id: PartId, patch: PartPatch) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE parts SET description = $1, stock = $2, unit_price = $3 WHERE part_id = $4",
        )
        .bind(&patch.description)
        .bind(patch.stock)
        .bind(patch.unit_price)
        .bind(id.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_part(&self, id: PartId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM parts WHERE part_id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn part_referenced(&self, id: PartId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM line_items WHERE part_id = $1)")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn adjust_stock(&self, tx: &mut Self::Tx, id: PartId, delta: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE parts SET stock = stock + $1 WHERE part_id = $2 AND stock + $1 >= 0",
        )
        .bind(delta)
        .bind(id.get())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_orders(&self) -> StoreResult<Vec<RepairOrder>> {
        let rows = sqlx::query(
            "SELECT folio, plate, status, entered_at, left_at FROM repairs ORDER BY folio",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_order).collect()
    }

    async fn find_order(&self, folio: Folio) -> StoreResult<Option<RepairOrder>> {
        let row = sqlx::query(
            "SELECT folio, plate, status, entered_at, left_at FROM repairs WHERE folio = $1",
        )
        .bind(folio.get())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_order).transpose()
    }

    async fn orders_for_plate(&self, plate: &str) -> StoreResult<Vec<RepairOrder>> {
        let rows = sqlx::query(
            "SELECT folio, plate, status, entered_at, left_at FROM repairs \
             WHERE plate = $1 ORDER BY folio",
        )
        .bind(plate)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_order).collect()
    }

    async fn insert_order(&self, order: NewRepairOrder) -> StoreResult<RepairOrder> {
        let status = order.status.unwrap_or(RepairStatus::Pending);
        let row = sqlx::query(
            "INSERT INTO repairs (plate, status, entered_at, left_at) \
             VALUES ($1, $2, $3, $4) RETURNING folio",
        )
        .bind(&order.plate)
        .bind(status.as_str())
        .bind(order.entered_at)
        .bind(order.left_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(RepairOrder {
            folio: Folio::new(row.try_get("folio")?),
            plate: order.plate,
            status,
            entered_at: order.entered_at,
            left_at: order.left_at,
        })
    }

    async fn update_order(&self, folio: Folio, patch: RepairOrderPatch) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE repairs SET plate = $1, status = $2, entered_at = $3, left_at = $4 \
             WHERE folio = $5",
        )
        .bind(&patch.plate)
        .bind(patch.status.as_str())
        .bind(patch.entered_at)
        .bind(patch.left_at)
        .bind(folio.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, tx: &mut Self::Tx, folio: Folio) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM repairs WHERE folio = $1")
            .bind(folio.get())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_line_item(&self, id: LineItemId) -> StoreResult<Option<LineItem>> {
        let row = sqlx::query(
            "SELECT line_item_id, folio, part_id, quantity, unit_price FROM line_items \
             WHERE line_item_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_line_item).transpose()
    }

    async fn line_items_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItem>> {
        let rows = sqlx::query(
            "SELECT line_item_id, folio, part_id, quantity, unit_price FROM line_items \
             WHERE folio = $1 ORDER BY line_item_id",
        )
        .bind(folio.get())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_line_item).collect()
    }

    async fn line_items_for_order_in(
        &self,
        tx: &mut Self::Tx,
        folio: Folio,
    ) -> StoreResult<Vec<LineItem>> {
        let rows = sqlx::query(
            "SELECT line_item_id, folio, part_id, quantity, unit_price FROM line_items \
             WHERE folio = $1 ORDER BY line_item_id",
        )
        .bind(folio.get())
        .fetch_all(&mut **tx)
        .await?;
        rows.iter().map(map_line_item).collect()
    }

    async fn line_item_details_for_order(&self, folio: Folio) -> StoreResult<Vec<LineItemDetail>> {
        let rows = sqlx::query(
            "SELECT li.line_item_id, li.folio, li.part_id, li.quantity, li.unit_price, \
                    p.description AS part_description, p.unit_price AS current_price \
             FROM line_items li \
             JOIN parts p ON p.part_id = li.part_id \
             WHERE li.folio = $1 \
             ORDER BY li.line_item_id",
        )
        .bind(folio.get())
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(LineItemDetail {
                    item: map_line_item(row)?,
                    part_description: row.try_get("part_description")?,
                    current_price: row.try_get("current_price")?,
                })
            })
            .collect()
    }

    async fn insert_line_item(
        &self,
        tx: &mut Self::Tx,
        item: NewLineItem,
    ) -> StoreResult<LineItem> {
        let row = sqlx::query(
            "INSERT INTO line_items (folio, part_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4) RETURNING line_item_id",
        )
        .bind(item.folio.get())
        .bind(item.part_id.get())
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut **tx)
        .await?;
        Ok(LineItem {
            id: LineItemId::new(row.try_get("line_item_id")?),
            folio: item.folio,
            part_id: item.part_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
    }

    async fn delete_line_item(&self, tx: &mut Self::Tx, id: LineItemId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM line_items WHERE line_item_id = $1")
            .bind(id.get())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_line_items_for_order(
        &self,
        tx: &mut Self::Tx,
        folio: Folio,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM line_items WHERE folio = $1")
            .bind(folio.get())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
