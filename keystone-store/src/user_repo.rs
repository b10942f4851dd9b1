use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystone_core::repository::UserRepository;
use keystone_core::user::{NewUser, User};
use keystone_core::{CoreError, CoreResult};
use sqlx::PgPool;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";

fn map_db_error(err: sqlx::Error, operation: &str) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CoreError::AlreadyExists("user already exists".to_string());
        }
    }
    tracing::error!(operation, table = "users", error = %err, "Database query failed");
    CoreError::InternalError(format!("users {}: {}", operation, err))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> CoreResult<User> {
        let query = format!(
            "INSERT INTO users (username, email, password, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "insert"))?;

        tracing::debug!(user_id = row.id, "Inserted user row");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "select"))?;

        Ok(row.map(User::from))
    }

    async fn get_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "select"))?;

        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "select"))?;

        Ok(row.map(User::from))
    }

    async fn update(&self, user: &User) -> CoreResult<User> {
        let query = format!(
            "UPDATE users SET username = $1, email = $2, password = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "update"))?
            .ok_or_else(|| CoreError::not_found("user", user.id))?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "delete"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("user", id));
        }
        Ok(())
    }

    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "ping"))?;
        Ok(())
    }
}
