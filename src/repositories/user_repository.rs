use crate::error::{AppError, Result};
use crate::models::{User, UserStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for User records. Every lookup is scoped to the owning agent.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, agent_id, name, email, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, agent_id, name, email, status, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(user.agent_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.status)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_for_agent(&self, agent_id: Uuid, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, agent_id, name, email, status, created_at, updated_at
            FROM users
            WHERE id = $1 AND agent_id = $2
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn exists_by_email(&self, agent_id: Uuid, email: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE agent_id = $1 AND email = $2)
            "#,
        )
        .bind(agent_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    /// Lists an agent's users, newest first.
    pub async fn list_by_agent(&self, agent_id: Uuid, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, agent_id, name, email, status, created_at, updated_at
            FROM users
            WHERE agent_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(agent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn count_by_agent(&self, agent_id: Uuid) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE agent_id = $1
            "#,
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    pub async fn update_status(
        &self,
        agent_id: Uuid,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND agent_id = $2
            RETURNING id, agent_id, name, email, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
