//! User operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::User;

use super::Database;

impl Database {
    /// Insert a new non-admin user
    ///
    /// Email uniqueness is enforced by the `users.email` constraint, so two
    /// racing inserts of the same address yield exactly one row.
    pub async fn insert_user(&self, email: &str, password_hash: &str) -> Result<i64, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, pass_hash, is_admin, created_at)
            VALUES (?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, format!("User '{}' already exists", email)))?;

        Ok(result.try_get("id")?)
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, pass_hash, is_admin, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get the admin flag of a user by ID
    pub async fn get_admin_flag(&self, id: i64) -> Result<Option<bool>, DbError> {
        let result = sqlx::query("SELECT is_admin FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| row.try_get("is_admin").map_err(DbError::from))
            .transpose()
    }

    /// Grant or revoke admin rights
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE email = ?")
            .bind(is_admin)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count registered users
    pub async fn count_users(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.try_get("count")?)
    }
}
