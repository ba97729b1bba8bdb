pub mod agent_repository;
pub mod memory_ledger_store;
pub mod pg_ledger_store;
pub mod user_repository;

pub use agent_repository::AgentRepository;
pub use memory_ledger_store::InMemoryLedgerStore;
pub use pg_ledger_store::PgLedgerStore;
pub use user_repository::UserRepository;

use crate::error::Result;
use crate::models::{Commission, DailyCommissionTotal, LedgerTotals, Withdrawal, WithdrawalStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Durable storage of the commission and withdrawal ledgers.
///
/// Reads on the store itself are not transactional with writes and serve
/// advisory views. Anything that checks a balance and then mutates must go
/// through [`LedgerStore::begin`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work. Dropping it without calling `commit` rolls back.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;

    /// Returns true if `user_id` exists and belongs to `agent_id`.
    async fn user_exists(&self, agent_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn count_users(&self, agent_id: Uuid) -> Result<i64>;

    /// Appends a commission. Commissions are never updated or deleted.
    async fn insert_commission(&self, commission: &Commission) -> Result<Commission>;

    async fn ledger_totals(&self, agent_id: Uuid) -> Result<LedgerTotals>;

    /// Per-day commission sums within the inclusive range, ascending by date.
    /// Days without commissions produce no row.
    async fn daily_commission_totals(
        &self,
        agent_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCommissionTotal>>;

    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>>;

    /// The agent's withdrawals, newest first.
    async fn list_withdrawals(&self, agent_id: Uuid) -> Result<Vec<Withdrawal>>;
}

/// A serializable unit of work against the ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Serializes concurrent balance-changing work for one agent.
    /// Returns false if the agent does not exist.
    async fn lock_agent(&mut self, agent_id: Uuid) -> Result<bool>;

    async fn ledger_totals(&mut self, agent_id: Uuid) -> Result<LedgerTotals>;

    /// Loads a withdrawal and locks it until the transaction ends.
    async fn find_withdrawal_for_update(&mut self, id: Uuid) -> Result<Option<Withdrawal>>;

    async fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<Withdrawal>;

    async fn set_withdrawal_status(&mut self, id: Uuid, status: WithdrawalStatus) -> Result<Withdrawal>;

    async fn commit(&mut self) -> Result<()>;
}
