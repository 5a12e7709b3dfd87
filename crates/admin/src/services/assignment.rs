//! Courier assignment.
//!
//! Records which courier carries an order and marks it shipped. The
//! tracking code is generated locally; placing the shipment with the
//! provider is a separate call (`CourierGateway::create_shipment`) and the
//! two can be used independently.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use parcelhub_core::{OrderId, OrderStatus};

use crate::db::{CourierUpdate, OrderStore, RepositoryError};

const TRACKING_PREFIX: &str = "TRK";
const TRACKING_SUFFIX_LEN: usize = 6;

/// Errors that can occur when assigning a courier.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Provider name is empty.
    #[error("courier provider is required")]
    MissingProvider,

    /// Order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of an assignment.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub order_id: OrderId,
    pub courier_name: String,
    pub tracking_code: String,
    pub status: OrderStatus,
}

/// Generate a local tracking reference: `TRK-<unix millis>-<6 chars>`.
#[must_use]
pub fn generate_tracking_code() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(TRACKING_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();

    format!(
        "{TRACKING_PREFIX}-{}-{suffix}",
        chrono::Utc::now().timestamp_millis()
    )
}

/// Binds a courier and tracking code to an order.
#[derive(Clone)]
pub struct CourierAssignmentService {
    orders: Arc<dyn OrderStore>,
}

impl std::fmt::Debug for CourierAssignmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierAssignmentService")
            .finish_non_exhaustive()
    }
}

impl CourierAssignmentService {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Assign `provider` to an order and mark it shipped.
    ///
    /// The status is set to shipped whatever it was before. Concurrent
    /// assignments to the same order are last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::MissingProvider` (before any store access)
    /// for a blank provider, `AssignmentError::OrderNotFound` for an unknown
    /// order.
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        order_id: OrderId,
        provider: &str,
    ) -> Result<Assignment, AssignmentError> {
        let courier_name = provider.trim();
        if courier_name.is_empty() {
            return Err(AssignmentError::MissingProvider);
        }

        if self.orders.find(order_id).await?.is_none() {
            return Err(AssignmentError::OrderNotFound(order_id));
        }

        let update = CourierUpdate {
            courier_name: courier_name.to_string(),
            tracking_code: generate_tracking_code(),
            status: OrderStatus::Shipped,
        };

        self.orders
            .update_courier(order_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AssignmentError::OrderNotFound(order_id),
                other => AssignmentError::Repository(other),
            })?;

        tracing::info!(
            courier = %update.courier_name,
            tracking_code = %update.tracking_code,
            "Courier assigned"
        );

        Ok(Assignment {
            order_id,
            courier_name: update.courier_name,
            tracking_code: update.tracking_code,
            status: update.status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{InMemoryOrderStore, OrderRecord};

    fn pending(id: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            user_id: None,
            guest_phone: Some("01711111111".to_string()),
            guest_email: None,
            ip_address: None,
            status: OrderStatus::Processing,
            courier_name: None,
            tracking_code: None,
        }
    }

    #[test]
    fn test_tracking_code_format() {
        let code = generate_tracking_code();
        let parts: Vec<&str> = code.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TRK");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 6);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[tokio::test]
    async fn test_assign_marks_shipped() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.insert(pending(1)).await;
        let service = CourierAssignmentService::new(store.clone());

        let assignment = service.assign(OrderId::new(1), " Pathao ").await.unwrap();

        let order = store.get(OrderId::new(1)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.courier_name.as_deref(), Some("Pathao"));
        assert_eq!(order.tracking_code, Some(assignment.tracking_code.clone()));
        assert!(!assignment.tracking_code.is_empty());
    }

    #[tokio::test]
    async fn test_assign_overrides_terminal_status() {
        let store = Arc::new(InMemoryOrderStore::new());
        let mut order = pending(2);
        order.status = OrderStatus::Cancelled;
        store.insert(order).await;

        CourierAssignmentService::new(store.clone())
            .assign(OrderId::new(2), "redx")
            .await
            .unwrap();

        assert_eq!(
            store.get(OrderId::new(2)).await.unwrap().status,
            OrderStatus::Shipped
        );
    }

    #[tokio::test]
    async fn test_empty_provider_rejected_before_store_access() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.insert(pending(3)).await;
        let service = CourierAssignmentService::new(store.clone());

        for provider in ["", "   "] {
            let err = service.assign(OrderId::new(3), provider).await.unwrap_err();
            assert!(matches!(err, AssignmentError::MissingProvider));
        }
        assert_eq!(store.calls(), 0);
        assert_eq!(store.get(OrderId::new(3)).await.unwrap().status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let store = Arc::new(InMemoryOrderStore::new());
        let err = CourierAssignmentService::new(store)
            .assign(OrderId::new(99), "steadfast")
            .await
            .unwrap_err();
        assert!(matches!(err, AssignmentError::OrderNotFound(_)));
    }
}
