use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::movement::{Movement, MovementKind};
use crate::query::{ItemQuery, LevelQuery, MovementQuery, ReservationQuery};
use crate::record::{
    InventoryItem, InventoryLevel, InventoryLocation, ItemUpdate, LevelUpdate, LocationUpdate,
    ReservationItem, StockMovement,
};
use crate::store::{AppliedMovement, LedgerStore, Resolution, level_not_found};
use crate::{
    ItemId, LedgerStoreError, LevelId, LineItemId, LocationId, MovementId, OrderId, ReservationId,
    Result, VariantId,
};

const ITEM_COLUMNS: &str = "id, sku, variant_id, title, thumbnail, requires_shipping, metadata, created_at, updated_at";
const LOCATION_COLUMNS: &str = "id, name, code, address, is_active, created_at";
const LEVEL_COLUMNS: &str = "id, inventory_item_id, location_id, stocked_quantity, reserved_quantity, incoming_quantity, available_quantity, updated_at";
const RESERVATION_COLUMNS: &str = "id, inventory_item_id, location_id, quantity, line_item_id, external_id, description, created_by, expires_at, metadata, created_at";
const MOVEMENT_COLUMNS: &str = "id, inventory_item_id, location_id, kind, quantity, stocked_after, reserved_after, reservation_id, reference, occurred_at";

/// PostgreSQL-backed ledger store implementation.
///
/// Read-decide-write operations run in a transaction that takes the level
/// row with `SELECT ... FOR UPDATE`, so concurrent writers to the same
/// (item, location) pair are serialized by the database.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new PostgreSQL ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: PgRow) -> Result<InventoryItem> {
        Ok(InventoryItem {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sku: row.try_get("sku")?,
            variant_id: row
                .try_get::<Option<String>, _>("variant_id")?
                .map(VariantId::new),
            title: row.try_get("title")?,
            thumbnail: row.try_get("thumbnail")?,
            requires_shipping: row.try_get("requires_shipping")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_location(row: PgRow) -> Result<InventoryLocation> {
        Ok(InventoryLocation {
            id: LocationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            address: row.try_get("address")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_level(row: PgRow) -> Result<InventoryLevel> {
        let level = InventoryLevel {
            id: LevelId::from_uuid(row.try_get::<Uuid, _>("id")?),
            inventory_item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("inventory_item_id")?),
            location_id: LocationId::from_uuid(row.try_get::<Uuid, _>("location_id")?),
            stocked_quantity: row.try_get("stocked_quantity")?,
            reserved_quantity: row.try_get("reserved_quantity")?,
            incoming_quantity: row.try_get("incoming_quantity")?,
            available_quantity: row.try_get("available_quantity")?,
            updated_at: row.try_get("updated_at")?,
        };
        level
            .check_invariant()
            .map_err(|e| LedgerStoreError::InvalidRecord(e.to_string()))?;
        Ok(level)
    }

    fn row_to_reservation(row: PgRow) -> Result<ReservationItem> {
        Ok(ReservationItem {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            inventory_item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("inventory_item_id")?),
            location_id: LocationId::from_uuid(row.try_get::<Uuid, _>("location_id")?),
            quantity: row.try_get("quantity")?,
            line_item_id: row
                .try_get::<Option<String>, _>("line_item_id")?
                .map(LineItemId::new),
            external_id: row
                .try_get::<Option<String>, _>("external_id")?
                .map(OrderId::new),
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            expires_at: row.try_get("expires_at")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_movement(row: PgRow) -> Result<StockMovement> {
        let kind: String = row.try_get("kind")?;
        Ok(StockMovement {
            id: MovementId::from_uuid(row.try_get::<Uuid, _>("id")?),
            inventory_item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("inventory_item_id")?),
            location_id: LocationId::from_uuid(row.try_get::<Uuid, _>("location_id")?),
            kind: kind.parse::<MovementKind>()?,
            quantity: row.try_get("quantity")?,
            stocked_after: row.try_get("stocked_after")?,
            reserved_after: row.try_get("reserved_after")?,
            reservation_id: row
                .try_get::<Option<Uuid>, _>("reservation_id")?
                .map(ReservationId::from_uuid),
            reference: row.try_get("reference")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }

    async fn lock_level(
        conn: &mut PgConnection,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>> {
        let sql = format!(
            "SELECT {LEVEL_COLUMNS} FROM inventory_levels \
             WHERE inventory_item_id = $1 AND location_id = $2 FOR UPDATE"
        );
        let row = sqlx::query(&sql)
            .bind(item_id.as_uuid())
            .bind(location_id.as_uuid())
            .fetch_optional(conn)
            .await?;
        row.map(Self::row_to_level).transpose()
    }

    async fn write_level(conn: &mut PgConnection, level: &InventoryLevel) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE inventory_levels
            SET stocked_quantity = $3, reserved_quantity = $4, incoming_quantity = $5, updated_at = $6
            WHERE inventory_item_id = $1 AND location_id = $2
            "#,
        )
        .bind(level.inventory_item_id.as_uuid())
        .bind(level.location_id.as_uuid())
        .bind(level.stocked_quantity)
        .bind(level.reserved_quantity)
        .bind(level.incoming_quantity)
        .bind(level.updated_at)
        .execute(conn)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn append_movement(conn: &mut PgConnection, movement: &StockMovement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements
                (id, inventory_item_id, location_id, kind, quantity, stocked_after, reserved_after, reservation_id, reference, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.inventory_item_id.as_uuid())
        .bind(movement.location_id.as_uuid())
        .bind(movement.kind.as_str())
        .bind(movement.quantity)
        .bind(movement.stocked_after)
        .bind(movement.reserved_after)
        .bind(movement.reservation_id.map(|id| id.as_uuid()))
        .bind(&movement.reference)
        .bind(movement.occurred_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Maps constraint violations to the ledger's domain errors.
fn map_write_error(e: sqlx::Error) -> LedgerStoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("uq_inventory_items_variant") => {
                return LedgerStoreError::Conflict(
                    "variant is already linked to an inventory item".to_string(),
                );
            }
            Some("uq_inventory_locations_code") => {
                return LedgerStoreError::Conflict("location code is already in use".to_string());
            }
            Some("uq_inventory_levels_item_location") => {
                return LedgerStoreError::Conflict(
                    "inventory level already exists for this item and location".to_string(),
                );
            }
            Some("inventory_items_pkey") | Some("inventory_locations_pkey") => {
                return LedgerStoreError::Conflict("record already exists".to_string());
            }
            Some("chk_inventory_levels_reserved") | Some("chk_inventory_levels_incoming") => {
                return LedgerStoreError::InvariantViolation(db_err.message().to_string());
            }
            _ => {}
        }
        if db_err.is_foreign_key_violation() {
            return LedgerStoreError::Conflict(db_err.message().to_string());
        }
    }
    LedgerStoreError::Database(e)
}

/// Maps a foreign key violation on level insertion to the missing parent.
fn map_level_insert_error(
    e: sqlx::Error,
    item_id: ItemId,
    location_id: LocationId,
) -> LedgerStoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("fk_inventory_levels_item") => {
                return LedgerStoreError::not_found("inventory item", item_id);
            }
            Some("fk_inventory_levels_location") => {
                return LedgerStoreError::not_found("inventory location", location_id);
            }
            _ => {}
        }
    }
    map_write_error(e)
}

/// Converts a page bound to a `BIGINT`, saturating at its maximum.
fn page_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, sku, variant_id, title, thumbnail, requires_shipping, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.sku)
        .bind(item.variant_id.as_ref().map(|v| v.as_str()))
        .bind(&item.title)
        .bind(&item.thumbnail)
        .bind(item.requires_shipping)
        .bind(&item.metadata)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_item).transpose()
    }

    async fn find_item_by_variant(&self, variant_id: &VariantId) -> Result<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE variant_id = $1");
        let row = sqlx::query(&sql)
            .bind(variant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_item).transpose()
    }

    async fn list_items(&self, query: ItemQuery) -> Result<Vec<InventoryItem>> {
        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM inventory_items i
            WHERE ($1::uuid[] IS NULL OR i.id = ANY($1))
              AND ($2::varchar IS NULL OR i.variant_id = $2)
              AND ($3::varchar IS NULL OR i.sku = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM inventory_levels l
                    WHERE l.inventory_item_id = i.id AND l.location_id = $4))
            ORDER BY i.created_at ASC, i.id ASC
            LIMIT $5 OFFSET $6
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(
                query
                    .ids
                    .map(|ids| ids.iter().map(|id| id.as_uuid()).collect::<Vec<_>>()),
            )
            .bind(query.variant_id.map(|v| v.as_str().to_string()))
            .bind(query.sku)
            .bind(query.location_id.map(|id| id.as_uuid()))
            .bind(query.limit.map(page_bound))
            .bind(page_bound(query.offset.unwrap_or(0)))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn count_items(&self, query: ItemQuery) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM inventory_items i
            WHERE ($1::uuid[] IS NULL OR i.id = ANY($1))
              AND ($2::varchar IS NULL OR i.variant_id = $2)
              AND ($3::varchar IS NULL OR i.sku = $3)
              AND ($4::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM inventory_levels l
                    WHERE l.inventory_item_id = i.id AND l.location_id = $4))
            "#,
        )
        .bind(
            query
                .ids
                .map(|ids| ids.iter().map(|id| id.as_uuid()).collect::<Vec<_>>()),
        )
        .bind(query.variant_id.map(|v| v.as_str().to_string()))
        .bind(query.sku)
        .bind(query.location_id.map(|id| id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count as usize)
    }

    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<InventoryItem> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 FOR UPDATE");
        let current = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .map(Self::row_to_item)
            .transpose()?
            .ok_or_else(|| LedgerStoreError::not_found("inventory item", id))?;

        let updated = current.merged(update);
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET sku = $2, variant_id = $3, title = $4, thumbnail = $5, requires_shipping = $6, metadata = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&updated.sku)
        .bind(updated.variant_id.as_ref().map(|v| v.as_str()))
        .bind(&updated.title)
        .bind(&updated.thumbnail)
        .bind(updated.requires_shipping)
        .bind(&updated.metadata)
        .bind(updated.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM inventory_items WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(LedgerStoreError::not_found("inventory item", id));
        }

        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reservation_items WHERE inventory_item_id = $1)",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        if held {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory item {id} has active reservations"
            )));
        }

        // Levels go with the item through ON DELETE CASCADE.
        sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_location(&self, location: InventoryLocation) -> Result<InventoryLocation> {
        sqlx::query(
            r#"
            INSERT INTO inventory_locations (id, name, code, address, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(location.id.as_uuid())
        .bind(&location.name)
        .bind(&location.code)
        .bind(&location.address)
        .bind(location.is_active)
        .bind(location.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(location)
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<InventoryLocation>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM inventory_locations WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_location).transpose()
    }

    async fn find_location_by_code(&self, code: &str) -> Result<Option<InventoryLocation>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM inventory_locations WHERE code = $1");
        let row = sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_location).transpose()
    }

    async fn list_locations(&self) -> Result<Vec<InventoryLocation>> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM inventory_locations ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_location).collect()
    }

    async fn update_location(
        &self,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<InventoryLocation> {
        let mut tx = self.pool.begin().await?;

        let sql =
            format!("SELECT {LOCATION_COLUMNS} FROM inventory_locations WHERE id = $1 FOR UPDATE");
        let current = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .map(Self::row_to_location)
            .transpose()?
            .ok_or_else(|| LedgerStoreError::not_found("inventory location", id))?;

        let updated = current.merged(update);
        sqlx::query(
            "UPDATE inventory_locations SET name = $2, address = $3, is_active = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(&updated.name)
        .bind(&updated.address)
        .bind(updated.is_active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn insert_level(&self, level: InventoryLevel) -> Result<InventoryLevel> {
        level.check_invariant()?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_levels
                (id, inventory_item_id, location_id, stocked_quantity, reserved_quantity, incoming_quantity, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(level.id.as_uuid())
        .bind(level.inventory_item_id.as_uuid())
        .bind(level.location_id.as_uuid())
        .bind(level.stocked_quantity)
        .bind(level.reserved_quantity)
        .bind(level.incoming_quantity)
        .bind(level.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_level_insert_error(e, level.inventory_item_id, level.location_id))?;

        if level.stocked_quantity > 0 {
            let empty = InventoryLevel::empty(level.inventory_item_id, level.location_id);
            let entry =
                StockMovement::between(&empty, &level, Movement::In(level.stocked_quantity));
            Self::append_movement(&mut tx, &entry).await?;
        }

        tx.commit().await?;
        Ok(level)
    }

    async fn get_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>> {
        let sql = format!(
            "SELECT {LEVEL_COLUMNS} FROM inventory_levels WHERE inventory_item_id = $1 AND location_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(item_id.as_uuid())
            .bind(location_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_level).transpose()
    }

    async fn list_levels(&self, query: LevelQuery) -> Result<Vec<InventoryLevel>> {
        let sql = format!(
            r#"
            SELECT {LEVEL_COLUMNS} FROM inventory_levels
            WHERE ($1::uuid[] IS NULL OR inventory_item_id = ANY($1))
              AND ($2::uuid[] IS NULL OR location_id = ANY($2))
            ORDER BY inventory_item_id ASC, location_id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(
                query
                    .inventory_item_ids
                    .map(|ids| ids.iter().map(|id| id.as_uuid()).collect::<Vec<_>>()),
            )
            .bind(
                query
                    .location_ids
                    .map(|ids| ids.iter().map(|id| id.as_uuid()).collect::<Vec<_>>()),
            )
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_level).collect()
    }

    async fn update_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        update: LevelUpdate,
    ) -> Result<InventoryLevel> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_level(&mut tx, item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))?;
        let updated = current.with_update(&update)?;

        Self::write_level(&mut tx, &updated).await?;
        let delta = updated.stocked_quantity - current.stocked_quantity;
        if delta != 0 {
            let entry = StockMovement::between(&current, &updated, Movement::Adjustment(delta));
            Self::append_movement(&mut tx, &entry).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn apply_movement(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        movement: Movement,
        create_missing: bool,
    ) -> Result<AppliedMovement> {
        let mut tx = self.pool.begin().await?;

        let mut created_level = false;
        if create_missing {
            let empty = InventoryLevel::empty(item_id, location_id);
            created_level = sqlx::query(
                r#"
                INSERT INTO inventory_levels (id, inventory_item_id, location_id, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (inventory_item_id, location_id) DO NOTHING
                "#,
            )
            .bind(empty.id.as_uuid())
            .bind(item_id.as_uuid())
            .bind(location_id.as_uuid())
            .bind(empty.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_level_insert_error(e, item_id, location_id))?
            .rows_affected()
                == 1;
        }

        let current = Self::lock_level(&mut tx, item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))?;
        let updated = current.apply(movement)?;
        let entry = StockMovement::between(&current, &updated, movement);

        Self::write_level(&mut tx, &updated).await?;
        Self::append_movement(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(AppliedMovement {
            level: updated,
            entry,
            created_level,
        })
    }

    async fn delete_level(&self, item_id: ItemId, location_id: LocationId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let level = Self::lock_level(&mut tx, item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))?;
        if level.reserved_quantity > 0 {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory level for item {item_id} at location {location_id} holds {} reserved units",
                level.reserved_quantity
            )));
        }

        sqlx::query(
            "DELETE FROM inventory_levels WHERE inventory_item_id = $1 AND location_id = $2",
        )
        .bind(item_id.as_uuid())
        .bind(location_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, reservation), fields(reservation_id = %reservation.id))]
    async fn create_reservation(
        &self,
        reservation: ReservationItem,
    ) -> Result<(ReservationItem, InventoryLevel)> {
        let item_id = reservation.inventory_item_id;
        let location_id = reservation.location_id;
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_level(&mut tx, item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))?;
        let movement = Movement::Reserved(reservation.quantity);
        let updated = current.apply(movement)?;

        sqlx::query(
            r#"
            INSERT INTO reservation_items
                (id, inventory_item_id, location_id, quantity, line_item_id, external_id, description, created_by, expires_at, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(location_id.as_uuid())
        .bind(reservation.quantity)
        .bind(reservation.line_item_id.as_ref().map(|id| id.as_str()))
        .bind(reservation.external_id.as_ref().map(|id| id.as_str()))
        .bind(&reservation.description)
        .bind(&reservation.created_by)
        .bind(reservation.expires_at)
        .bind(&reservation.metadata)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let entry =
            StockMovement::between(&current, &updated, movement).for_reservation(&reservation);
        Self::write_level(&mut tx, &updated).await?;
        Self::append_movement(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok((reservation, updated))
    }

    #[tracing::instrument(skip(self))]
    async fn resolve_reservation(
        &self,
        id: ReservationId,
        resolution: Resolution,
    ) -> Result<(ReservationItem, InventoryLevel)> {
        let mut tx = self.pool.begin().await?;

        // Deleting first takes the row lock, so a concurrent resolve of the
        // same reservation finds nothing once this commits.
        let sql = format!(
            "DELETE FROM reservation_items WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .map(Self::row_to_reservation)
            .transpose()?
            .ok_or_else(|| LedgerStoreError::not_found("reservation", id))?;

        let item_id = reservation.inventory_item_id;
        let location_id = reservation.location_id;
        let current = Self::lock_level(&mut tx, item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))?;
        let movement = resolution.movement(reservation.quantity);
        let updated = current.apply(movement)?;
        let entry =
            StockMovement::between(&current, &updated, movement).for_reservation(&reservation);

        Self::write_level(&mut tx, &updated).await?;
        Self::append_movement(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok((reservation, updated))
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Option<ReservationItem>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservation_items WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_reservation).transpose()
    }

    async fn list_reservations(&self, query: ReservationQuery) -> Result<Vec<ReservationItem>> {
        let sql = format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservation_items
            WHERE ($1::varchar IS NULL OR external_id = $1)
              AND ($2::uuid IS NULL OR inventory_item_id = $2)
              AND ($3::uuid IS NULL OR location_id = $3)
              AND ($4::varchar IS NULL OR line_item_id = $4)
              AND ($5::timestamptz IS NULL OR expires_at < $5)
            ORDER BY created_at ASC, id ASC
            LIMIT $6
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(query.external_id.map(|id| id.as_str().to_string()))
            .bind(query.inventory_item_id.map(|id| id.as_uuid()))
            .bind(query.location_id.map(|id| id.as_uuid()))
            .bind(query.line_item_id.map(|id| id.as_str().to_string()))
            .bind(query.expires_before)
            .bind(query.limit.map(page_bound))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn list_movements(&self, query: MovementQuery) -> Result<Vec<StockMovement>> {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE ($1::uuid IS NULL OR inventory_item_id = $1)
              AND ($2::uuid IS NULL OR location_id = $2)
              AND ($3::uuid IS NULL OR reservation_id = $3)
            ORDER BY seq ASC
            LIMIT $4
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(query.inventory_item_id.map(|id| id.as_uuid()))
            .bind(query.location_id.map(|id| id.as_uuid()))
            .bind(query.reservation_id.map(|id| id.as_uuid()))
            .bind(query.limit.map(page_bound))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_movement).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_saturate() {
        assert_eq!(page_bound(0), 0);
        assert_eq!(page_bound(50), 50);
        assert_eq!(page_bound(usize::MAX), i64::MAX);
    }
}
