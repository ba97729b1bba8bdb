use super::{LedgerStore, LedgerTransaction};
use crate::error::{AppError, Result};
use crate::models::{Commission, DailyCommissionTotal, LedgerTotals, Withdrawal, WithdrawalStatus};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    agents: HashSet<Uuid>,
    /// user id -> owning agent id
    users: HashMap<Uuid, Uuid>,
    commissions: Vec<Commission>,
    withdrawals: HashMap<Uuid, Withdrawal>,
}

impl LedgerState {
    fn totals(&self, agent_id: Uuid) -> Result<LedgerTotals> {
        let total_commission = checked_sum(
            self.commissions
                .iter()
                .filter(|c| c.agent_id == agent_id)
                .map(|c| c.amount),
        )?;

        let total_approved = checked_sum(
            self.withdrawals
                .values()
                .filter(|w| w.agent_id == agent_id && w.status.consumes_balance())
                .map(|w| w.amount),
        )?;

        Ok(LedgerTotals::new(total_commission, total_approved))
    }
}

fn checked_sum(amounts: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for amount in amounts {
        total = checked_add(total, amount)?;
    }
    Ok(total)
}

fn checked_add(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| AppError::Internal(anyhow!("Ledger total out of range")))
}

/// In-process ledger store.
///
/// A single mutex guards the whole ledger, so every unit of work runs
/// serially. Each transaction mutates a staged copy that only replaces the
/// shared state on `commit`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an agent known to the store.
    pub async fn register_agent(&self, agent_id: Uuid) {
        self.state.lock().await.agents.insert(agent_id);
    }

    /// Makes a user known to the store, registering its agent as well.
    pub async fn register_user(&self, agent_id: Uuid, user_id: Uuid) {
        let mut state = self.state.lock().await;
        state.agents.insert(agent_id);
        state.users.insert(user_id, agent_id);
    }

    /// Number of withdrawals across all agents.
    pub async fn withdrawal_count(&self) -> usize {
        self.state.lock().await.withdrawals.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();

        Ok(Box::new(InMemoryLedgerTransaction {
            guard: Some(guard),
            staged,
        }))
    }

    async fn user_exists(&self, agent_id: Uuid, user_id: Uuid) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id) == Some(&agent_id))
    }

    async fn count_users(&self, agent_id: Uuid) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.users.values().filter(|owner| **owner == agent_id).count() as i64)
    }

    async fn insert_commission(&self, commission: &Commission) -> Result<Commission> {
        let mut state = self.state.lock().await;
        if state.users.get(&commission.user_id) != Some(&commission.agent_id) {
            return Err(AppError::NotFound(format!(
                "User '{}' not found for agent '{}'",
                commission.user_id, commission.agent_id
            )));
        }

        state.commissions.push(commission.clone());
        Ok(commission.clone())
    }

    async fn ledger_totals(&self, agent_id: Uuid) -> Result<LedgerTotals> {
        self.state.lock().await.totals(agent_id)
    }

    async fn daily_commission_totals(
        &self,
        agent_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyCommissionTotal>> {
        let state = self.state.lock().await;
        let mut by_date: BTreeMap<NaiveDate, (Decimal, i64)> = BTreeMap::new();

        for commission in state.commissions.iter().filter(|c| c.agent_id == agent_id) {
            if from.map_or(false, |from| commission.date < from) {
                continue;
            }
            if to.map_or(false, |to| commission.date > to) {
                continue;
            }

            let entry = by_date.entry(commission.date).or_insert((Decimal::ZERO, 0));
            entry.0 = checked_add(entry.0, commission.amount)?;
            entry.1 += 1;
        }

        Ok(by_date
            .into_iter()
            .map(|(date, (total_amount, count))| DailyCommissionTotal {
                date,
                total_amount,
                count,
            })
            .collect())
    }

    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>> {
        Ok(self.state.lock().await.withdrawals.get(&id).cloned())
    }

    async fn list_withdrawals(&self, agent_id: Uuid) -> Result<Vec<Withdrawal>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Withdrawal> = state
            .withdrawals
            .values()
            .filter(|w| w.agent_id == agent_id)
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows)
    }
}

/// Unit of work over [`InMemoryLedgerStore`]. Holds the store lock for its
/// whole lifetime.
pub struct InMemoryLedgerTransaction {
    guard: Option<OwnedMutexGuard<LedgerState>>,
    staged: LedgerState,
}

impl InMemoryLedgerTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.guard.is_none() {
            return Err(AppError::Internal(anyhow!("Ledger transaction already committed")));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryLedgerTransaction {
    async fn lock_agent(&mut self, agent_id: Uuid) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.staged.agents.contains(&agent_id))
    }

    async fn ledger_totals(&mut self, agent_id: Uuid) -> Result<LedgerTotals> {
        self.ensure_open()?;
        self.staged.totals(agent_id)
    }

    async fn find_withdrawal_for_update(&mut self, id: Uuid) -> Result<Option<Withdrawal>> {
        self.ensure_open()?;
        Ok(self.staged.withdrawals.get(&id).cloned())
    }

    async fn insert_withdrawal(&mut self, withdrawal: &Withdrawal) -> Result<Withdrawal> {
        self.ensure_open()?;
        if self.staged.withdrawals.contains_key(&withdrawal.id) {
            return Err(AppError::AlreadyExists(format!(
                "Withdrawal '{}' already exists",
                withdrawal.id
            )));
        }

        self.staged.withdrawals.insert(withdrawal.id, withdrawal.clone());
        Ok(withdrawal.clone())
    }

    async fn set_withdrawal_status(&mut self, id: Uuid, status: WithdrawalStatus) -> Result<Withdrawal> {
        self.ensure_open()?;
        let withdrawal = self
            .staged
            .withdrawals
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal '{}' not found", id)))?;

        withdrawal.transition_to(status)?;
        Ok(withdrawal.clone())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal(anyhow!("Ledger transaction already committed")))?;

        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
