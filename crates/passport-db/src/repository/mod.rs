//! SQLite credential store

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::models::{Application, User};
use crate::store::CredentialStore;

mod apps;
mod users;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and bring the schema up to date
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        let db = Self::connect(database_url).await?;
        db.migrate_up().await?;
        Ok(db)
    }

    /// Connect without touching the schema
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let pool = SqlitePool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create tables and indexes that don't exist yet
    pub async fn migrate_up(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                pass_hash TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::Migration(format!("users: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS apps (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                secret BLOB NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::Migration(format!("apps: {}", e)))?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Drop everything `migrate_up` created
    pub async fn migrate_down(&self) -> Result<(), DbError> {
        info!("Reverting database migrations");

        for statement in [
            "DROP TABLE IF EXISTS users",
            "DROP TABLE IF EXISTS apps",
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", statement, e)))?;
        }

        info!("Database migrations reverted");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn user_by_email(&self, email: &str) -> Result<User, DbError> {
        self.get_user_by_email(email)
            .await?
            .ok_or_else(|| DbError::NotFound(email.to_string()))
    }

    async fn application_by_id(&self, id: i32) -> Result<Application, DbError> {
        self.get_application(id).await?.ok_or(DbError::AppNotFound(id))
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, DbError> {
        self.get_admin_flag(user_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("id {}", user_id)))
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<i64, DbError> {
        Database::insert_user(self, email, password_hash).await
    }
}
