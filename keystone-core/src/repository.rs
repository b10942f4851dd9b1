use async_trait::async_trait;

use crate::user::{NewUser, User};
use crate::CoreResult;

/// Repository trait for user accounts.
///
/// Lookups return `Ok(None)` for a missing row; callers decide whether that
/// is a `NotFound`. `create` fails with `AlreadyExists` on a duplicate
/// username or email.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> CoreResult<User>;

    async fn get_by_id(&self, id: i64) -> CoreResult<Option<User>>;

    async fn get_by_username(&self, username: &str) -> CoreResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn update(&self, user: &User) -> CoreResult<User>;

    async fn delete(&self, id: i64) -> CoreResult<()>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> CoreResult<()>;
}
