use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Operational state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "agent_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    /// Only active agents may authenticate or transact.
    pub fn is_operational(&self) -> bool {
        matches!(self, AgentStatus::Active)
    }
}

/// An agent earning commission on the wagers of their users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: AgentStatus,
    /// Owned by the identity collaborator; never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Creates an active agent. The e-mail is normalised to trimmed lower case.
    pub fn new(name: impl Into<String>, email: impl AsRef<str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email.as_ref()),
            name: name.into().trim().to_string(),
            status: AgentStatus::Active,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_operational()
    }
}

/// Trims and lower-cases an e-mail address for uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
