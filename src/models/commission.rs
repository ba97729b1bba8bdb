use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable commission ledger entry. Created once per recorded wager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: Uuid,
    pub agent_id: Uuid,
    /// Provenance only; balances aggregate by agent.
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// UTC calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Commission {
    pub fn new(agent_id: Uuid, user_id: Uuid, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            user_id,
            amount,
            date,
            created_at: Utc::now(),
        }
    }
}

/// Sum of one calendar day's commissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyCommissionTotal {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,
    pub count: i64,
}

/// One point of the dashboard earnings series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEarning {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

impl From<DailyCommissionTotal> for DailyEarning {
    fn from(total: DailyCommissionTotal) -> Self {
        Self {
            date: total.date,
            amount: total.total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_commission_serializes_calendar_date() {
        let commission = Commission::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(10.00),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );

        let json = serde_json::to_value(&commission).unwrap();
        assert_eq!(json["date"], "2024-01-31");
        assert!(json["amount"].is_number());
        assert_eq!(json["amount"].to_string(), "10.00");
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_daily_total_into_earning() {
        let total = DailyCommissionTotal {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            total_amount: dec!(33.50),
            count: 3,
        };

        let earning = DailyEarning::from(total);
        assert_eq!(earning.amount, dec!(33.50));
        assert_eq!(earning.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
