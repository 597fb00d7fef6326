//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;

/// User model
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Client application that tokens are issued for.
///
/// The signing secret never leaves the process: it is skipped by serde and
/// redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i32,
    pub name: String,
    #[serde(skip)]
    pub secret: Vec<u8>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Application provisioning input
#[derive(Clone)]
pub struct NewApplication {
    pub id: i32,
    pub name: String,
    pub secret: Vec<u8>,
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let created_at: String = row.try_get("created_at")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("pass_hash")?,
            is_admin: row.try_get("is_admin")?,
            created_at: parse_datetime_or_now(&created_at),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Application {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Application {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            secret: row.try_get("secret")?,
        })
    }
}

/// Parse an RFC3339 timestamp, falling back to the current time
fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let user = User {
            id: 7,
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        let app = Application {
            id: 1,
            name: "console".to_string(),
            secret: b"top-secret".to_vec(),
        };

        let user_dbg = format!("{:?}", user);
        assert!(user_dbg.contains("alice@example.com"));
        assert!(!user_dbg.contains("argon2id"));

        let app_dbg = format!("{:?}", app);
        assert!(app_dbg.contains("console"));
        assert!(!app_dbg.contains("top-secret"));
    }

    #[test]
    fn test_serialize_skips_secrets() {
        let app = Application {
            id: 1,
            name: "console".to_string(),
            secret: b"top-secret".to_vec(),
        };
        let user = User {
            id: 2,
            email: "bob@example.com".to_string(),
            password_hash: "hash-value".to_string(),
            is_admin: true,
            created_at: Utc::now(),
        };

        let app_json = serde_json::to_string(&app).unwrap();
        assert!(!app_json.contains("secret"));

        let user_json = serde_json::to_string(&user).unwrap();
        assert!(!user_json.contains("hash-value"));
        assert!(user_json.contains("bob@example.com"));
    }
}
