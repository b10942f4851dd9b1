use keystone_core::repository::UserRepository;
use keystone_core::user::{NewUser, User};
use keystone_core::{CoreError, CoreResult};
use serde::Deserialize;

use crate::password;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> CoreResult<()> {
        if self.username.trim().is_empty() {
            return Err(CoreError::ValidationError("username is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(CoreError::ValidationError(
                "email must be a valid email address".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(users: &dyn UserRepository, request: RegisterRequest) -> CoreResult<User> {
    request.validate()?;

    if users.get_by_username(&request.username).await?.is_some() {
        return Err(CoreError::AlreadyExists("username already taken".to_string()));
    }
    if users.get_by_email(&request.email).await?.is_some() {
        return Err(CoreError::AlreadyExists("email already registered".to_string()));
    }

    let password_hash = password::hash_password(&request.password)?;
    let user = users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Unknown user and wrong password fail identically.
pub async fn authenticate(users: &dyn UserRepository, request: &LoginRequest) -> CoreResult<User> {
    let invalid = || CoreError::Unauthorized("invalid credentials".to_string());

    let user = users
        .get_by_username(&request.username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&request.password, &user.password_hash) {
        return Err(invalid());
    }
    Ok(user)
}

pub async fn profile(users: &dyn UserRepository, user_id: i64) -> CoreResult<User> {
    users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user", user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_store::InMemoryUserRepository;

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let users = InMemoryUserRepository::new();
        let user = register(&users, alice()).await.unwrap();
        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "secret123");

        let login = LoginRequest {
            username: "alice".to_string(),
            password: "secret123".to_string(),
        };
        assert_eq!(authenticate(&users, &login).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email() {
        let users = InMemoryUserRepository::new();
        register(&users, alice()).await.unwrap();

        let same_name = register(&users, alice()).await;
        assert!(matches!(same_name, Err(CoreError::AlreadyExists(_))));

        let mut same_email = alice();
        same_email.username = "alice2".to_string();
        assert!(matches!(register(&users, same_email).await, Err(CoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let users = InMemoryUserRepository::new();

        let mut short = alice();
        short.password = "12345".to_string();
        assert!(matches!(register(&users, short).await, Err(CoreError::ValidationError(_))));

        let mut no_at = alice();
        no_at.email = "alice.example.com".to_string();
        assert!(matches!(register(&users, no_at).await, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let users = InMemoryUserRepository::new();
        register(&users, alice()).await.unwrap();

        let wrong_password = authenticate(
            &users,
            &LoginRequest {
                username: "alice".to_string(),
                password: "nope".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown_user = authenticate(
            &users,
            &LoginRequest {
                username: "bob".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(unknown_user, CoreError::Unauthorized(_)));
    }
}
