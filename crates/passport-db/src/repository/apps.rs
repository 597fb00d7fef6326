//! Application operations

use tracing::info;

use crate::error::DbError;
use crate::models::{Application, NewApplication};

use super::Database;

impl Database {
    /// Insert an application or replace the name and secret of an existing one
    pub async fn upsert_application(&self, app: NewApplication) -> Result<Application, DbError> {
        sqlx::query(
            r#"
            INSERT INTO apps (id, name, secret)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, secret = excluded.secret
            "#,
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.secret)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_insert(e, format!("Application name or secret of '{}' is taken", app.name))
        })?;

        info!(app_id = app.id, name = %app.name, "Provisioned application");

        Ok(Application {
            id: app.id,
            name: app.name,
            secret: app.secret,
        })
    }

    /// Get an application by ID
    pub async fn get_application(&self, id: i32) -> Result<Option<Application>, DbError> {
        let result = sqlx::query("SELECT id, name, secret FROM apps WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| Application::try_from(&row).map_err(DbError::from))
            .transpose()
    }
}
