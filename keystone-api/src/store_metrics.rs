use async_trait::async_trait;
use keystone_core::repository::UserRepository;
use keystone_core::user::{NewUser, User};
use keystone_core::CoreResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;

const TABLE: &str = "users";

/// Wraps a user repository and records `database_queries_total` and
/// `database_query_duration_seconds` for every query. Operations are labelled
/// with the SQL verb they run. `ping` is left out so probes don't skew the
/// series.
pub struct InstrumentedUserRepository {
    inner: Arc<dyn UserRepository>,
    metrics: Arc<Metrics>,
}

impl InstrumentedUserRepository {
    pub fn new(inner: Arc<dyn UserRepository>, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }

    async fn timed<T, F>(&self, operation: &'static str, query: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        let start = Instant::now();
        let result = query.await;
        let elapsed = start.elapsed();

        self.metrics
            .record_db_query(operation, TABLE, elapsed, result.is_ok());
        tracing::debug!(
            operation,
            table = TABLE,
            elapsed_ms = elapsed.as_millis() as u64,
            success = result.is_ok(),
            "User store query"
        );
        result
    }
}

#[async_trait]
impl UserRepository for InstrumentedUserRepository {
    async fn create(&self, user: NewUser) -> CoreResult<User> {
        self.timed("INSERT", self.inner.create(user)).await
    }

    async fn get_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        self.timed("SELECT", self.inner.get_by_id(id)).await
    }

    async fn get_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        self.timed("SELECT", self.inner.get_by_username(username)).await
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.timed("SELECT", self.inner.get_by_email(email)).await
    }

    async fn update(&self, user: &User) -> CoreResult<User> {
        self.timed("UPDATE", self.inner.update(user)).await
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        self.timed("DELETE", self.inner.delete(id)).await
    }

    async fn ping(&self) -> CoreResult<()> {
        self.inner.ping().await
    }
}
