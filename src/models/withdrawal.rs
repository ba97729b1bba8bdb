use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a withdrawal request.
///
/// `Pending` is the only non-terminal state. `Approved` and `Rejected` are
/// final: once reached, no further transition is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "withdrawal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    /// Requested by the agent, awaiting an admin decision.
    Pending,
    /// Paid out. Counts against the withdrawable balance.
    Approved,
    /// Declined. Never counted against the balance.
    Rejected,
}

impl WithdrawalStatus {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        match self {
            WithdrawalStatus::Pending => false,
            WithdrawalStatus::Approved | WithdrawalStatus::Rejected => true,
        }
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        match (self, next) {
            (WithdrawalStatus::Pending, WithdrawalStatus::Approved) => true,
            (WithdrawalStatus::Pending, WithdrawalStatus::Rejected) => true,
            (WithdrawalStatus::Pending, WithdrawalStatus::Pending) => false,
            (WithdrawalStatus::Approved, _) => false,
            (WithdrawalStatus::Rejected, _) => false,
        }
    }

    /// Returns true if withdrawals in this state consume withdrawable balance.
    pub fn consumes_balance(&self) -> bool {
        match self {
            WithdrawalStatus::Approved => true,
            WithdrawalStatus::Pending | WithdrawalStatus::Rejected => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "PENDING",
            WithdrawalStatus::Approved => "APPROVED",
            WithdrawalStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A withdrawal ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: Uuid,
    pub agent_id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Creates a new withdrawal in `Pending` state. `amount` is expected to be
    /// validated and rounded to cents already.
    pub fn new(agent_id: Uuid, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            agent_id,
            amount,
            status: WithdrawalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks that the withdrawal may move to `next`.
    pub fn ensure_transition(&self, next: WithdrawalStatus) -> Result<()> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }

        if self.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Withdrawal is not pending (current: {})",
                self.status
            )));
        }

        Err(AppError::InvalidState(format!(
            "Withdrawal cannot move from {} to {}",
            self.status, next
        )))
    }

    /// Applies a transition in memory after checking it.
    pub fn transition_to(&mut self, next: WithdrawalStatus) -> Result<()> {
        self.ensure_transition(next)?;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
