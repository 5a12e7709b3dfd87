//! Order table access for courier assignment and fraud screening.
//!
//! Orders are owned by the order service. This module reads the handful of
//! columns the fraud evaluator needs and writes the courier columns.

use async_trait::async_trait;
use sqlx::PgPool;

use parcelhub_core::{OrderId, OrderStatus, UserId};

use super::RepositoryError;

/// The slice of an order the courier and fraud components care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    /// Registered customer, if the order was not a guest checkout.
    pub user_id: Option<UserId>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    /// Checkout IP address.
    pub ip_address: Option<String>,
    pub status: OrderStatus,
    pub courier_name: Option<String>,
    pub tracking_code: Option<String>,
}

/// Courier columns written by an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierUpdate {
    pub courier_name: String,
    pub tracking_code: String,
    pub status: OrderStatus,
}

/// Storage seam for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Look up an order by ID.
    async fn find(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Write courier name, tracking code and status.
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    async fn update_courier(&self, id: OrderId, update: &CourierUpdate)
    -> Result<(), RepositoryError>;
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    guest_phone: Option<String>,
    guest_email: Option<String>,
    ip_address: Option<String>,
    status: String,
    courier_name: Option<String>,
    tracking_code: Option<String>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            guest_phone: row.guest_phone,
            guest_email: row.guest_email,
            ip_address: row.ip_address,
            status,
            courier_name: row.courier_name,
            tracking_code: row.tracking_code,
        })
    }
}

/// `PostgreSQL` order store.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT
                id,
                user_id,
                guest_phone,
                guest_email,
                ip_address,
                status,
                courier_name,
                tracking_code
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRecord::try_from).transpose()
    }

    async fn update_courier(
        &self,
        id: OrderId,
        update: &CourierUpdate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET courier_name = $2, tracking_code = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&update.courier_name)
        .bind(&update.tracking_code)
        .bind(update.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
