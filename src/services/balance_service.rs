use crate::error::Result;
use crate::models::money::round2;
use crate::models::{DailyEarning, LedgerTotals};
use crate::repositories::LedgerStore;
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Length of the dashboard earnings window, today included.
pub const EARNINGS_WINDOW_DAYS: u64 = 7;

/// Advisory dashboard view for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_commission_earned: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub pending_commission: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub withdrawable_balance: Decimal,
    /// Sparse: only days that have commissions, ascending.
    #[serde(rename = "last7DaysEarnings")]
    pub last_seven_days_earnings: Vec<DailyEarning>,
}

/// Computes balances from live ledger aggregates.
///
/// Nothing here is a gate: reads are not transactional with writes. The
/// withdrawal lifecycle recomputes the balance inside its own transaction.
pub struct BalanceService {
    store: Arc<dyn LedgerStore>,
}

impl BalanceService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn get_ledger_totals(&self, agent_id: Uuid) -> Result<LedgerTotals> {
        self.store.ledger_totals(agent_id).await
    }

    /// `max(0, round2(commissions - approved withdrawals))`.
    pub async fn get_withdrawable_balance(&self, agent_id: Uuid) -> Result<Decimal> {
        Ok(self.get_ledger_totals(agent_id).await?.withdrawable_balance())
    }

    pub async fn get_dashboard_summary(&self, agent_id: Uuid) -> Result<DashboardSummary> {
        self.get_dashboard_summary_as_of(agent_id, Utc::now().date_naive())
            .await
    }

    /// Dashboard summary with `today` as the last day of the earnings window.
    pub async fn get_dashboard_summary_as_of(
        &self,
        agent_id: Uuid,
        today: NaiveDate,
    ) -> Result<DashboardSummary> {
        let (window_start, window_end) = earnings_window(today);

        let totals = self.store.ledger_totals(agent_id).await?;
        let total_users = self.store.count_users(agent_id).await?;
        let daily = self
            .store
            .daily_commission_totals(agent_id, Some(window_start), Some(window_end))
            .await?;

        Ok(DashboardSummary {
            total_users,
            total_commission_earned: round2(totals.total_commission),
            pending_commission: totals.pending_commission(),
            withdrawable_balance: totals.withdrawable_balance(),
            last_seven_days_earnings: daily.into_iter().map(DailyEarning::from).collect(),
        })
    }
}

/// Inclusive `[today - 6 days, today]`.
pub fn earnings_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(EARNINGS_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}
