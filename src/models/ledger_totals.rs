use super::money::round2;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Live aggregates of one agent's two ledgers.
///
/// Always recomputed from the ledger rows; never kept as a running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, FromRow)]
pub struct LedgerTotals {
    /// Sum of every commission amount.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_commission: Decimal,
    /// Sum of APPROVED withdrawal amounts. PENDING and REJECTED are excluded.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_approved: Decimal,
}

impl LedgerTotals {
    pub fn new(total_commission: Decimal, total_approved: Decimal) -> Self {
        Self {
            total_commission,
            total_approved,
        }
    }

    /// `max(0, round2(total_commission - total_approved))`.
    pub fn withdrawable_balance(&self) -> Decimal {
        round2(self.total_commission - self.total_approved).max(round2(Decimal::ZERO))
    }

    /// Commission earned but not yet paid out. Synonymous with the
    /// withdrawable balance: pending withdrawals reserve nothing.
    pub fn pending_commission(&self) -> Decimal {
        self.withdrawable_balance()
    }

    /// Returns true if `amount` may be paid out against these totals.
    pub fn covers(&self, amount: Decimal) -> bool {
        amount <= self.withdrawable_balance()
    }
}
