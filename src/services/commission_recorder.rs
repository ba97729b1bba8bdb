use crate::error::{AppError, Result};
use crate::models::money::{parse_calendar_date, positive_cents, round2};
use crate::models::{Commission, DailyCommissionTotal};
use crate::observability::{get_metrics, Metrics};
use crate::repositories::LedgerStore;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Default commission rate: 10% of the wager.
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Input for recording one wager's commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCommissionRequest {
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub wager_amount: Decimal,
    /// `YYYY-MM-DD`; defaults to the current UTC date.
    pub date: Option<String>,
}

/// Optional inclusive date range for the commission history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionHistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommissionHistory {
    pub history: Vec<DailyCommissionTotal>,
}

/// Validates wagers and appends commission entries.
///
/// Appends never lower a withdrawable balance, so recording takes no
/// agent lock and runs outside any ledger transaction.
pub struct CommissionRecorder {
    store: Arc<dyn LedgerStore>,
    rate: Decimal,
    metrics: &'static Metrics,
}

impl CommissionRecorder {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_rate(store, DEFAULT_COMMISSION_RATE)
    }

    /// Uses `rate` for every commission this recorder creates.
    pub fn with_rate(store: Arc<dyn LedgerStore>, rate: Decimal) -> Self {
        Self {
            store,
            rate,
            metrics: get_metrics(),
        }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Commission for a wager, rounded to cents at creation time.
    pub fn commission_for(&self, wager_amount: Decimal) -> Result<Decimal> {
        wager_amount
            .checked_mul(self.rate)
            .map(round2)
            .ok_or_else(|| AppError::InvalidArgument("Wager amount is out of range".to_string()))
    }

    /// Records the commission earned on one wager by `request.user_id`.
    pub async fn record_commission(
        &self,
        agent_id: Uuid,
        request: RecordCommissionRequest,
    ) -> Result<Commission> {
        if request.wager_amount <= Decimal::ZERO {
            return Err(AppError::InvalidArgument(
                "Wager amount must be a positive number".to_string(),
            ));
        }

        let amount = positive_cents(self.commission_for(request.wager_amount)?, "Commission amount")?;

        let date = match request.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_calendar_date(raw, "date")?,
            _ => Utc::now().date_naive(),
        };

        if !self.store.user_exists(agent_id, request.user_id).await? {
            return Err(AppError::NotFound(
                "User not found or does not belong to agent".to_string(),
            ));
        }

        let commission = self
            .store
            .insert_commission(&Commission::new(agent_id, request.user_id, amount, date))
            .await?;

        self.metrics.record_commission();
        info!(
            agent_id = %agent_id,
            commission_id = %commission.id,
            amount = %commission.amount,
            date = %commission.date,
            "Commission recorded"
        );

        Ok(commission)
    }

    /// Date-wise commission totals, ascending by date.
    pub async fn commission_history(
        &self,
        agent_id: Uuid,
        query: CommissionHistoryQuery,
    ) -> Result<CommissionHistory> {
        let start = parse_optional_date(query.start_date.as_deref(), "startDate")?;
        let end = parse_optional_date(query.end_date.as_deref(), "endDate")?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::InvalidArgument(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }

        let history = self
            .store
            .daily_commission_totals(agent_id, start, end)
            .await?;

        debug!(agent_id = %agent_id, days = history.len(), "Commission history loaded");
        Ok(CommissionHistory { history })
    }
}

fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_calendar_date(raw, field).map(Some),
        _ => Ok(None),
    }
}
