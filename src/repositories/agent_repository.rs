use crate::error::{AppError, Result};
use crate::models::{Agent, AgentStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Agent records.
pub struct AgentRepository {
    pool: PgPool,
}

impl AgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new agent.
    pub async fn create(&self, agent: &Agent) -> Result<Agent> {
        let row = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (id, email, name, status, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, name, status, password_hash, created_at, updated_at
            "#,
        )
        .bind(agent.id)
        .bind(&agent.email)
        .bind(&agent.name)
        .bind(agent.status)
        .bind(&agent.password_hash)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds an agent by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>> {
        let row = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, email, name, status, password_hash, created_at, updated_at
            FROM agents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds an agent by normalised e-mail.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Agent>> {
        let row = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, email, name, status, password_hash, created_at, updated_at
            FROM agents
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<Agent>> {
        let row = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, status, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_status(&self, id: Uuid, status: AgentStatus) -> Result<Option<Agent>> {
        let row = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, status, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM agents WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
