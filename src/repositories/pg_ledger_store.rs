use super::{LedgerStore, LedgerTransaction};
use crate::error::{AppError, Result};
use crate::models::{Commission, DailyCommissionTotal, LedgerTotals, Withdrawal, WithdrawalStatus};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres};
use uuid::Uuid;

const LEDGER_TOTALS_SQL: &str = r#"
    SELECT
        COALESCE((SELECT SUM(amount) FROM commissions WHERE agent_id = $1), 0) AS total_commission,
        COALESCE((SELECT SUM(amount) FROM withdrawals WHERE agent_id = $1 AND status = 'APPROVED'), 0) AS total_approved
"#;

/// PostgreSQL-backed ledger store.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        Ok(Box::new(PgLedgerTransaction { tx: Some(tx) }))
    }

    async fn user_exists(&self, agent_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND agent_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }

    async fn count_users(&self, agent_id: Uuid) -> Result<i64> {
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

    async fn insert_commission(&self, commission: &Commission) -> Result<Commission> {
        let row = sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO commissions (id, agent_id, user_id, amount, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, agent_id, user_id, amount, date, created_at
            "#,
        )
        .bind(commission.id)
        .bind(commission.agent_id)
        .bind(commission.user_id)
        .bind(commission.amount)
        .bind(commission.date)
        .bind(commission.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn ledger_totals(&self, agent_id: Uuid) -> Result<LedgerTotals> {
        let totals = sqlx::query_as::<_, LedgerTotals>(LEDGER_TOTALS_SQL)
            .bind(agent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(totals)
    }

    async fn daily_commission_totals(
        &self,
        agent_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCommissionTotal>> {
        let rows = sqlx::query_as::<_, DailyCommissionTotal>(
            r#"
            SELECT date, SUM(amount) AS total_amount, COUNT(*) AS count
            FROM commissions
            WHERE agent_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            GROUP BY date
            ORDER BY date
            "#,
        )
        .bind(agent_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>> {
        let row = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, agent_id, amount, status, created_at, updated_at
            FROM withdrawals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn list_withdrawals(&self, agent_id: Uuid) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, agent_id, amount, status, created_at, updated_at
            FROM withdrawals
            WHERE agent_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}

/// A `SERIALIZABLE` Postgres transaction. Rolled back by sqlx when dropped
/// before `commit`.
pub struct PgLedgerTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PgLedgerTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal(anyhow!("Ledger transaction already committed")))
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn lock_agent(&mut self, agent_id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM agents WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(agent_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row.is_some())
    }

    async fn ledger_totals(&mut self, agent_id: Uuid) -> Result<LedgerTotals> {
        let conn = self.conn()?;
        let totals = sqlx::query_as::<_, LedgerTotals>(LEDGER_TOTALS_SQL)
            .bind(agent_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(AppError::Database)?;

        Ok(totals)
    }

    async fn find_withdrawal_for_update(&mut self, id: Uuid) -> Result<Option<Withdrawal>> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, agent_id, amount, status, created_at, updated_at
            FROM withdrawals
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<Withdrawal> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (id, agent_id, amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, agent_id, amount, status, created_at, updated_at
            "#,
        )
        .bind(withdrawal.id)
        .bind(withdrawal.agent_id)
        .bind(withdrawal.amount)
        .bind(withdrawal.status)
        .bind(withdrawal.created_at)
        .bind(withdrawal.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn set_withdrawal_status(&mut self, id: Uuid, status: WithdrawalStatus) -> Result<Withdrawal> {
        let conn = self.conn()?;
        let row = sqlx::query_as::<_, Withdrawal>(
            r#"
            UPDATE withdrawals
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, agent_id, amount, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        row.ok_or_else(|| AppError::NotFound(format!("Withdrawal '{}' not found", id)))
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal(anyhow!("Ledger transaction already committed")))?;

        tx.commit().await.map_err(AppError::Database)
    }
}
