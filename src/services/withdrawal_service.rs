use crate::error::{AppError, Result};
use crate::models::money::positive_cents;
use crate::models::{Withdrawal, WithdrawalStatus};
use crate::observability::{get_metrics, LatencyTimer, Metrics};
use crate::repositories::{LedgerStore, LedgerTransaction};
use crate::services::retry::RetryPolicy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Drives withdrawals through PENDING -> APPROVED | REJECTED.
///
/// Requests and approvals check the balance and mutate inside one ledger
/// transaction, re-run as a whole on serialization conflicts. Rejection only
/// lowers committed liability and skips the balance check.
pub struct WithdrawalService {
    store: Arc<dyn LedgerStore>,
    retry: RetryPolicy,
    metrics: &'static Metrics,
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            metrics: get_metrics(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Creates a PENDING withdrawal if `amount` is covered by the agent's
    /// withdrawable balance at the moment of insertion.
    pub async fn request_withdrawal(&self, agent_id: Uuid, amount: Decimal) -> Result<Withdrawal> {
        let amount = positive_cents(amount, "Amount")?;

        let timer = LatencyTimer::new();
        let result = self
            .retry
            .run("request_withdrawal", move || self.try_request_withdrawal(agent_id, amount))
            .await;
        self.metrics
            .record_transaction_latency("request_withdrawal", timer.elapsed_ms());

        match &result {
            Ok(withdrawal) => {
                self.metrics.record_withdrawal_requested();
                info!(
                    agent_id = %agent_id,
                    withdrawal_id = %withdrawal.id,
                    amount = %withdrawal.amount,
                    "Withdrawal requested"
                );
            }
            Err(err) => self.log_refusal("request_withdrawal", Some(agent_id), None, err),
        }

        result
    }

    async fn try_request_withdrawal(&self, agent_id: Uuid, amount: Decimal) -> Result<Withdrawal> {
        let mut tx = self.store.begin().await?;

        if !tx.lock_agent(agent_id).await? {
            return Err(AppError::NotFound(format!("Agent '{}' not found", agent_id)));
        }

        ensure_covered(tx.as_mut(), agent_id, amount).await?;

        let withdrawal = tx.insert_withdrawal(&Withdrawal::new(agent_id, amount)).await?;
        tx.commit().await?;

        Ok(withdrawal)
    }

    /// Admin approval. Re-validates the balance: other approvals may have
    /// consumed it since the request was created. On insufficient balance the
    /// withdrawal stays PENDING.
    pub async fn approve_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal> {
        self.decide(withdrawal_id, WithdrawalStatus::Approved).await
    }

    /// Admin rejection.
    pub async fn reject_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal> {
        self.decide(withdrawal_id, WithdrawalStatus::Rejected).await
    }

    async fn decide(&self, withdrawal_id: Uuid, next: WithdrawalStatus) -> Result<Withdrawal> {
        let operation = match next {
            WithdrawalStatus::Approved => "approve_withdrawal",
            WithdrawalStatus::Rejected => "reject_withdrawal",
            WithdrawalStatus::Pending => {
                return Err(AppError::InvalidArgument(
                    "Withdrawals cannot be moved back to PENDING".to_string(),
                ))
            }
        };

        let timer = LatencyTimer::new();
        let result = self
            .retry
            .run(operation, move || self.try_decide(withdrawal_id, next))
            .await;
        self.metrics
            .record_transaction_latency(operation, timer.elapsed_ms());

        match &result {
            Ok(withdrawal) => {
                match withdrawal.status {
                    WithdrawalStatus::Approved => self.metrics.record_withdrawal_approved(),
                    WithdrawalStatus::Rejected => self.metrics.record_withdrawal_rejected(),
                    WithdrawalStatus::Pending => {}
                }
                info!(
                    agent_id = %withdrawal.agent_id,
                    withdrawal_id = %withdrawal.id,
                    amount = %withdrawal.amount,
                    status = %withdrawal.status,
                    "Withdrawal decided"
                );
            }
            Err(err) => self.log_refusal(operation, None, Some(withdrawal_id), err),
        }

        result
    }

    async fn try_decide(&self, withdrawal_id: Uuid, next: WithdrawalStatus) -> Result<Withdrawal> {
        let mut tx = self.store.begin().await?;

        let withdrawal = tx
            .find_withdrawal_for_update(withdrawal_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal '{}' not found", withdrawal_id)))?;

        withdrawal.ensure_transition(next)?;

        match next {
            WithdrawalStatus::Approved => {
                // Live aggregate excludes this entry while it is still PENDING.
                tx.lock_agent(withdrawal.agent_id).await?;
                ensure_covered(tx.as_mut(), withdrawal.agent_id, withdrawal.amount).await?;
            }
            WithdrawalStatus::Rejected | WithdrawalStatus::Pending => {}
        }

        let updated = tx.set_withdrawal_status(withdrawal_id, next).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// The agent's own withdrawals, newest first.
    pub async fn list_withdrawals(&self, agent_id: Uuid) -> Result<Vec<Withdrawal>> {
        self.store.list_withdrawals(agent_id).await
    }

    /// One withdrawal, visible only to its owning agent.
    pub async fn get_withdrawal(&self, agent_id: Uuid, withdrawal_id: Uuid) -> Result<Withdrawal> {
        self.store
            .find_withdrawal(withdrawal_id)
            .await?
            .filter(|w| w.agent_id == agent_id)
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal '{}' not found", withdrawal_id)))
    }

    fn log_refusal(
        &self,
        operation: &'static str,
        agent_id: Option<Uuid>,
        withdrawal_id: Option<Uuid>,
        err: &AppError,
    ) {
        match err {
            AppError::InsufficientBalance { requested, available } => {
                self.metrics.record_withdrawal_refused("insufficient_balance");
                warn!(
                    operation,
                    agent_id = ?agent_id,
                    withdrawal_id = ?withdrawal_id,
                    requested = %requested,
                    available = %available,
                    "Withdrawal refused: insufficient balance"
                );
            }
            AppError::InvalidState(_) => {
                self.metrics.record_withdrawal_refused("invalid_state");
                warn!(operation, withdrawal_id = ?withdrawal_id, error = %err, "Withdrawal refused");
            }
            err if err.is_client_error() => {
                warn!(operation, agent_id = ?agent_id, withdrawal_id = ?withdrawal_id, error = %err, "Withdrawal refused");
            }
            err => {
                error!(operation, agent_id = ?agent_id, withdrawal_id = ?withdrawal_id, error = %err, "Withdrawal transaction failed");
            }
        }
    }
}

/// Fails with `InsufficientBalance` unless the live withdrawable balance
/// covers `amount`.
async fn ensure_covered(tx: &mut dyn LedgerTransaction, agent_id: Uuid, amount: Decimal) -> Result<()> {
    let totals = tx.ledger_totals(agent_id).await?;
    if totals.covers(amount) {
        return Ok(());
    }

    Err(AppError::InsufficientBalance {
        requested: amount,
        available: totals.withdrawable_balance(),
    })
}
