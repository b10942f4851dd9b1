use async_trait::async_trait;
use chrono::Utc;
use keystone_core::repository::UserRepository;
use keystone_core::user::{NewUser, User};
use keystone_core::{CoreError, CoreResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// User store kept in process memory. Ids start at 1, like a fresh
/// `BIGSERIAL` column.
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

struct Inner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn conflicts(&self, id: Option<i64>, username: &str, email: &str) -> bool {
        self.users
            .values()
            .filter(|u| Some(u.id) != id)
            .any(|u| u.username == username || u.email == email)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> CoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.conflicts(None, &user.username, &user.email) {
            return Err(CoreError::AlreadyExists("user already exists".to_string()));
        }

        let now = Utc::now();
        let id = inner.next_id;
        inner.next_id += 1;

        let created = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> CoreResult<User> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user.id) {
            return Err(CoreError::not_found("user", user.id));
        }
        if inner.conflicts(Some(user.id), &user.username, &user.email) {
            return Err(CoreError::AlreadyExists("user already exists".to_string()));
        }

        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        inner.users.insert(user.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        self.inner
            .write()
            .await
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(new_user("alice", "alice@example.com")).await.unwrap();
        let bob = repo.create(new_user("bob", "bob@example.com")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(repo.get_by_username("bob").await.unwrap().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let same_name = repo.create(new_user("alice", "other@example.com")).await;
        let same_email = repo.create(new_user("alice2", "alice@example.com")).await;

        assert!(matches!(same_name, Err(CoreError::AlreadyExists(_))));
        assert!(matches!(same_email, Err(CoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_user() {
        let repo = InMemoryUserRepository::new();
        let mut alice = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        alice.email = "alice@new.example.com".to_string();
        let updated = repo.update(&alice).await.unwrap();
        assert_eq!(updated.email, "alice@new.example.com");
        assert!(repo.get_by_email("alice@example.com").await.unwrap().is_none());

        repo.delete(alice.id).await.unwrap();
        assert!(repo.delete(alice.id).await.unwrap_err().is_not_found());
    }
}
