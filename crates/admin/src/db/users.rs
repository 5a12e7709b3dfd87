//! User table access (phone lookup only).

use async_trait::async_trait;
use sqlx::PgPool;

use parcelhub_core::UserId;

use super::RepositoryError;

/// Storage seam for registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// The user's phone number, or `None` if the user is absent or has none.
    async fn phone(&self, id: UserId) -> Result<Option<String>, RepositoryError>;
}

/// `PostgreSQL` user store.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn phone(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let phone = sqlx::query_scalar::<_, Option<String>>("SELECT phone FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(phone.flatten())
    }
}
