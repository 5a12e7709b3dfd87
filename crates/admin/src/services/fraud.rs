//! Fraud risk evaluation.
//!
//! A verdict combines two sources:
//!
//! 1. **Internal**: the blacklist, matched on any supplied identifier.
//! 2. **External**: Steadfast's delivery reputation for the phone number,
//!    consulted only when Steadfast credentials are configured.
//!
//! The external check is advisory. If it fails for any reason the failure
//! is logged and the verdict is computed from the internal check alone; an
//! evaluation never errors because a third party is unreachable.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use parcelhub_core::{BlacklistKind, OrderId, Phone, PhoneError};

use crate::couriers::steadfast::DeliveryReputation;
use crate::couriers::{CourierError, CourierGateway};
use crate::db::{BlacklistEntry, BlacklistStore, OrderStore, RepositoryError, UserStore};

/// Delivery success ratio (percent) below which a number is flagged.
pub const MIN_DELIVERY_RATIO: f64 = 50.0;

/// Errors that can occur during fraud evaluation.
#[derive(Debug, Error)]
pub enum FraudError {
    /// No phone, IP or email supplied.
    #[error("at least one of phone, ip or email is required")]
    MissingIdentifier,

    /// Supplied phone number is malformed.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Neither the order nor its customer has a phone number.
    #[error("no phone number available for order {0}")]
    NoPhone(OrderId),

    /// Blacklist, order or user store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Source of external delivery reputation.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Reputation for `phone`, or `Ok(None)` when the source is not configured.
    async fn reputation(&self, phone: &Phone) -> Result<Option<DeliveryReputation>, CourierError>;
}

#[async_trait]
impl ReputationSource for CourierGateway {
    async fn reputation(&self, phone: &Phone) -> Result<Option<DeliveryReputation>, CourierError> {
        let client = self.steadfast().await?;
        if !client.is_configured() {
            return Ok(None);
        }
        client.fraud_check(phone.as_str()).await.map(Some)
    }
}

/// Identifiers to screen. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FraudQuery {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Why a verdict was flagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FraudReason {
    /// An identifier is on the blacklist.
    Blacklisted { kind: BlacklistKind },
    /// Delivery success ratio is under [`MIN_DELIVERY_RATIO`].
    LowDeliveryRatio { success_ratio: f64 },
    /// Other merchants reported the number.
    FraudReports { count: u64 },
}

/// Combined risk decision. Computed fresh on every call.
#[derive(Debug, Clone, Serialize)]
pub struct FraudVerdict {
    pub is_fraud: bool,
    /// Normalized phone that was screened.
    pub phone: Option<String>,
    /// Matching blacklist entry.
    pub internal: Option<BlacklistEntry>,
    /// Steadfast reputation; `None` when unconfigured, unavailable or no phone.
    pub external: Option<DeliveryReputation>,
    pub reasons: Vec<FraudReason>,
}

impl FraudVerdict {
    fn compose(
        phone: Option<String>,
        internal: Option<BlacklistEntry>,
        external: Option<DeliveryReputation>,
    ) -> Self {
        let mut reasons = Vec::new();

        if let Some(entry) = &internal {
            reasons.push(FraudReason::Blacklisted { kind: entry.kind });
        }
        if let Some(rep) = &external {
            if rep.success_ratio < MIN_DELIVERY_RATIO {
                reasons.push(FraudReason::LowDeliveryRatio {
                    success_ratio: rep.success_ratio,
                });
            }
            if rep.has_fraud_reports() {
                reasons.push(FraudReason::FraudReports {
                    count: rep.fraud_report_count,
                });
            }
        }

        Self {
            is_fraud: !reasons.is_empty(),
            phone,
            internal,
            external,
            reasons,
        }
    }

    /// One-line human summary for API responses.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.is_fraud {
            return "No fraud indicators found".to_string();
        }
        let reasons: Vec<String> = self
            .reasons
            .iter()
            .map(|reason| match reason {
                FraudReason::Blacklisted { kind } => format!("{kind} is blacklisted"),
                FraudReason::LowDeliveryRatio { success_ratio } => {
                    // Floor so a flagged ratio never displays as the threshold.
                    let shown = (success_ratio * 100.0).floor() / 100.0;
                    format!("delivery success ratio {shown}% is below {MIN_DELIVERY_RATIO}%")
                }
                FraudReason::FraudReports { count } => format!("{count} fraud report(s)"),
            })
            .collect();
        format!("Potential fraud: {}", reasons.join("; "))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fraud evaluator.
#[derive(Clone)]
pub struct FraudEvaluator {
    blacklist: Arc<dyn BlacklistStore>,
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    reputation: Arc<dyn ReputationSource>,
}

impl std::fmt::Debug for FraudEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FraudEvaluator").finish_non_exhaustive()
    }
}

impl FraudEvaluator {
    #[must_use]
    pub fn new(
        blacklist: Arc<dyn BlacklistStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        reputation: Arc<dyn ReputationSource>,
    ) -> Self {
        Self {
            blacklist,
            orders,
            users,
            reputation,
        }
    }

    /// Screen a phone, IP and/or email.
    ///
    /// A phone that does not parse is matched against the blacklist
    /// verbatim and skips the external check, as long as an IP or email is
    /// also supplied.
    ///
    /// # Errors
    ///
    /// Returns `FraudError::MissingIdentifier` when nothing was supplied,
    /// `FraudError::InvalidPhone` when a malformed phone is the only
    /// identifier, or a repository error from the blacklist lookup.
    /// External failures never error.
    #[instrument(skip(self, query))]
    pub async fn evaluate(&self, query: &FraudQuery) -> Result<FraudVerdict, FraudError> {
        let raw_phone = non_blank(query.phone.as_deref());
        let ip = non_blank(query.ip.as_deref()).map(ToString::to_string);
        let email = non_blank(query.email.as_deref()).map(str::to_lowercase);

        if raw_phone.is_none() && ip.is_none() && email.is_none() {
            return Err(FraudError::MissingIdentifier);
        }

        let phone = match raw_phone.map(Phone::parse).transpose() {
            Ok(phone) => phone,
            Err(e) if ip.is_none() && email.is_none() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed phone, matching it verbatim without external check");
                None
            }
        };

        let mut matchers = Vec::with_capacity(3);
        match (&phone, raw_phone) {
            (Some(phone), _) => matchers.push((BlacklistKind::Phone, phone.as_str().to_string())),
            (None, Some(raw)) => matchers.push((BlacklistKind::Phone, raw.to_string())),
            (None, None) => {}
        }
        if let Some(ip) = ip {
            matchers.push((BlacklistKind::Ip, ip));
        }
        if let Some(email) = email {
            matchers.push((BlacklistKind::Email, email));
        }

        let internal = self.blacklist.find_first(&matchers).await?;

        let external = match &phone {
            Some(phone) => match self.reputation.reputation(phone).await {
                Ok(reputation) => reputation,
                Err(e) => {
                    tracing::warn!(error = %e, "External reputation check failed, using internal verdict only");
                    None
                }
            },
            None => None,
        };

        let verdict = FraudVerdict::compose(phone.map(Phone::into_inner), internal, external);

        tracing::info!(
            is_fraud = verdict.is_fraud,
            internal_match = verdict.internal.is_some(),
            external = verdict.external.is_some(),
            "Fraud check completed"
        );

        Ok(verdict)
    }

    /// Screen an existing order.
    ///
    /// The phone comes from the guest checkout field, falling back to the
    /// registered customer's phone when the guest phone is absent or
    /// malformed. The order's IP and email are screened too.
    ///
    /// # Errors
    ///
    /// Returns `FraudError::OrderNotFound`, `FraudError::NoPhone` when no
    /// phone can be resolved, or any error from [`Self::evaluate`].
    #[instrument(skip(self))]
    pub async fn evaluate_by_order(&self, order_id: OrderId) -> Result<FraudVerdict, FraudError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(FraudError::OrderNotFound(order_id))?;

        let guest = non_blank(order.guest_phone.as_deref()).map(ToString::to_string);
        let phone = match guest {
            Some(guest) if Phone::parse(&guest).is_ok() => Some(guest),
            guest => {
                let user_phone = match order.user_id {
                    Some(user_id) => self
                        .users
                        .phone(user_id)
                        .await?
                        .filter(|p| !p.trim().is_empty()),
                    None => None,
                };
                match user_phone {
                    Some(user_phone) if Phone::parse(&user_phone).is_ok() => Some(user_phone),
                    user_phone => guest.or(user_phone),
                }
            }
        };

        let Some(phone) = phone else {
            return Err(FraudError::NoPhone(order_id));
        };

        self.evaluate(&FraudQuery {
            phone: Some(phone),
            ip: order.ip_address,
            email: order.guest_email,
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{
        InMemoryBlacklistStore, InMemoryOrderStore, InMemoryUserStore, NewBlacklistEntry,
        OrderRecord,
    };
    use parcelhub_core::{OrderStatus, UserId};
    use std::sync::Mutex;

    /// Reputation source returning a fixed answer and recording phones asked.
    struct Fixed {
        answer: Result<Option<DeliveryReputation>, ()>,
        asked: Mutex<Vec<String>>,
    }

    impl Fixed {
        fn new(answer: Result<Option<DeliveryReputation>, ()>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReputationSource for Fixed {
        async fn reputation(
            &self,
            phone: &Phone,
        ) -> Result<Option<DeliveryReputation>, CourierError> {
            self.asked.lock().unwrap().push(phone.as_str().to_string());
            self.answer.clone().map_err(|()| CourierError::Parse {
                provider: parcelhub_core::CourierProvider::Steadfast,
                message: "connection reset".to_string(),
            })
        }
    }

    struct Fixture {
        blacklist: Arc<InMemoryBlacklistStore>,
        orders: Arc<InMemoryOrderStore>,
        users: Arc<InMemoryUserStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                blacklist: Arc::new(InMemoryBlacklistStore::new()),
                orders: Arc::new(InMemoryOrderStore::new()),
                users: Arc::new(InMemoryUserStore::new()),
            }
        }

        fn evaluator(&self, source: Arc<dyn ReputationSource>) -> FraudEvaluator {
            FraudEvaluator::new(
                self.blacklist.clone(),
                self.orders.clone(),
                self.users.clone(),
                source,
            )
        }

        async fn blacklist_phone(&self, value: &str) {
            self.blacklist
                .create(&NewBlacklistEntry {
                    kind: BlacklistKind::Phone,
                    value: value.to_string(),
                    reason: Some("chargeback history".to_string()),
                })
                .await
                .unwrap();
        }
    }

    fn order(id: i64, guest_phone: Option<&str>, user_id: Option<i64>) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            user_id: user_id.map(UserId::new),
            guest_phone: guest_phone.map(ToString::to_string),
            guest_email: None,
            ip_address: None,
            status: OrderStatus::Pending,
            courier_name: None,
            tracking_code: None,
        }
    }

    #[tokio::test]
    async fn test_blacklisted_phone_is_fraud() {
        let fx = Fixture::new();
        fx.blacklist_phone("01700000000").await;

        let verdict = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate(&FraudQuery {
                phone: Some("01700000000".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        let entry = verdict.internal.unwrap();
        assert_eq!(entry.value, "01700000000");
        assert_eq!(entry.reason.as_deref(), Some("chargeback history"));
    }

    #[tokio::test]
    async fn test_blacklist_match_survives_external_failure() {
        let fx = Fixture::new();
        fx.blacklist_phone("01700000000").await;

        let verdict = fx
            .evaluator(Fixed::new(Err(())))
            .evaluate(&FraudQuery {
                phone: Some("+880 1700-000000".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert!(verdict.external.is_none());
    }

    #[tokio::test]
    async fn test_external_failure_degrades_to_internal_only() {
        let fx = Fixture::new();
        let verdict = fx
            .evaluator(Fixed::new(Err(())))
            .evaluate(&FraudQuery {
                phone: Some("01811111111".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(!verdict.is_fraud);
        assert!(verdict.external.is_none());
        assert!(verdict.reasons.is_empty());
    }

    #[tokio::test]
    async fn test_low_delivery_ratio_flags() {
        let fx = Fixture::new();
        let verdict = fx
            .evaluator(Fixed::new(Ok(Some(DeliveryReputation::new(10, 4, 6)))))
            .evaluate(&FraudQuery {
                phone: Some("01811111111".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert_eq!(
            verdict.reasons,
            vec![FraudReason::LowDeliveryRatio { success_ratio: 40.0 }]
        );
    }

    #[tokio::test]
    async fn test_ratio_at_threshold_is_not_flagged() {
        let fx = Fixture::new();
        let verdict = fx
            .evaluator(Fixed::new(Ok(Some(DeliveryReputation::new(10, 5, 5)))))
            .evaluate(&FraudQuery {
                phone: Some("01811111111".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(!verdict.is_fraud);
    }

    #[tokio::test]
    async fn test_any_fraud_report_flags() {
        let fx = Fixture::new();
        let mut reputation = DeliveryReputation::new(20, 19, 1);
        reputation.fraud_report_count = 1;

        let verdict = fx
            .evaluator(Fixed::new(Ok(Some(reputation))))
            .evaluate(&FraudQuery {
                phone: Some("01811111111".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert_eq!(verdict.reasons, vec![FraudReason::FraudReports { count: 1 }]);
    }

    #[tokio::test]
    async fn test_ip_match_without_phone_skips_external() {
        let fx = Fixture::new();
        fx.blacklist
            .create(&NewBlacklistEntry {
                kind: BlacklistKind::Ip,
                value: "203.0.113.9".to_string(),
                reason: None,
            })
            .await
            .unwrap();
        let source = Fixed::new(Ok(None));

        let verdict = fx
            .evaluator(source.clone())
            .evaluate(&FraudQuery {
                ip: Some(" 203.0.113.9 ".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert!(source.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_identifiers_rejected() {
        let fx = Fixture::new();
        let err = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate(&FraudQuery {
                phone: Some("   ".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FraudError::MissingIdentifier));
    }

    #[tokio::test]
    async fn test_by_order_falls_back_to_user_phone() {
        let fx = Fixture::new();
        fx.orders.insert(order(42, None, Some(7))).await;
        fx.users.insert(UserId::new(7), Some("01511111111")).await;
        let source = Fixed::new(Ok(None));

        let verdict = fx
            .evaluator(source.clone())
            .evaluate_by_order(OrderId::new(42))
            .await
            .unwrap();

        assert_eq!(verdict.phone.as_deref(), Some("01511111111"));
        assert_eq!(*source.asked.lock().unwrap(), vec!["01511111111".to_string()]);
    }

    #[tokio::test]
    async fn test_by_order_prefers_guest_phone() {
        let fx = Fixture::new();
        fx.orders.insert(order(43, Some("01922222222"), Some(7))).await;
        fx.users.insert(UserId::new(7), Some("01511111111")).await;

        let verdict = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate_by_order(OrderId::new(43))
            .await
            .unwrap();

        assert_eq!(verdict.phone.as_deref(), Some("01922222222"));
    }

    #[tokio::test]
    async fn test_by_order_without_any_phone_errors() {
        let fx = Fixture::new();
        fx.orders.insert(order(44, None, Some(8))).await;
        fx.users.insert(UserId::new(8), None).await;
        fx.orders.insert(order(45, None, None)).await;

        let evaluator = fx.evaluator(Fixed::new(Ok(None)));
        assert!(matches!(
            evaluator.evaluate_by_order(OrderId::new(44)).await,
            Err(FraudError::NoPhone(_))
        ));
        assert!(matches!(
            evaluator.evaluate_by_order(OrderId::new(45)).await,
            Err(FraudError::NoPhone(_))
        ));
    }

    #[tokio::test]
    async fn test_by_order_missing_order() {
        let fx = Fixture::new();
        let err = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate_by_order(OrderId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, FraudError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_ratio_just_below_threshold_flags() {
        let fx = Fixture::new();
        let verdict = fx
            .evaluator(Fixed::new(Ok(Some(DeliveryReputation::new(25_000, 12_499, 0)))))
            .evaluate(&FraudQuery {
                phone: Some("01811111111".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert_eq!(
            verdict.summary(),
            "Potential fraud: delivery success ratio 49.99% is below 50%"
        );
    }

    #[tokio::test]
    async fn test_malformed_phone_still_screens_ip() {
        let fx = Fixture::new();
        fx.blacklist
            .create(&NewBlacklistEntry {
                kind: BlacklistKind::Ip,
                value: "203.0.113.9".to_string(),
                reason: None,
            })
            .await
            .unwrap();
        let source = Fixed::new(Ok(None));

        let verdict = fx
            .evaluator(source.clone())
            .evaluate(&FraudQuery {
                phone: Some("n/a".to_string()),
                ip: Some("203.0.113.9".to_string()),
                email: None,
            })
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert_eq!(verdict.internal.unwrap().kind, BlacklistKind::Ip);
        assert!(verdict.phone.is_none());
        assert!(source.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_phone_alone_is_rejected() {
        let fx = Fixture::new();
        let err = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate(&FraudQuery {
                phone: Some("n/a".to_string()),
                ..FraudQuery::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FraudError::InvalidPhone(_)));
    }

    #[tokio::test]
    async fn test_by_order_malformed_guest_phone_falls_back_to_user() {
        let fx = Fixture::new();
        fx.orders.insert(order(46, Some("n/a"), Some(7))).await;
        fx.users.insert(UserId::new(7), Some("01511111111")).await;
        fx.blacklist_phone("01511111111").await;

        let verdict = fx
            .evaluator(Fixed::new(Ok(None)))
            .evaluate_by_order(OrderId::new(46))
            .await
            .unwrap();

        assert!(verdict.is_fraud);
        assert_eq!(verdict.phone.as_deref(), Some("01511111111"));
    }
}
