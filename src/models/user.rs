use super::agent::normalize_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Whether a user may still generate wagers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Blocked,
}

/// A player belonging to exactly one agent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(agent_id: Uuid, name: impl Into<String>, email: impl AsRef<str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            agent_id,
            name: name.into().trim().to_string(),
            email: normalize_email(email.as_ref()),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A page of users with paging metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl UserPage {
    pub fn new(users: Vec<User>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            ((total + limit - 1) / limit).max(1)
        } else {
            1
        };

        Self {
            users,
            total,
            page,
            limit,
            total_pages,
        }
    }
}
