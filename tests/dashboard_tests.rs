mod common;

use chrono::NaiveDate;
use commission_ledger::models::DailyEarning;
use common::TestLedger;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[tokio::test]
async fn test_earnings_series_is_sparse_and_ascending() {
    let ledger = TestLedger::new().await;
    ledger.earn_on(dec!(30), "2024-03-07").await;
    ledger.earn_on(dec!(100), "2024-03-09").await;
    ledger.earn_on(dec!(50), "2024-03-09").await;

    let summary = ledger
        .engine
        .balances()
        .get_dashboard_summary_as_of(ledger.agent_id, day(10))
        .await
        .unwrap();

    assert_eq!(
        summary.last_seven_days_earnings,
        vec![
            DailyEarning {
                date: day(7),
                amount: dec!(3.00)
            },
            DailyEarning {
                date: day(9),
                amount: dec!(15.00)
            },
        ]
    );
}

#[tokio::test]
async fn test_earnings_window_bounds_are_inclusive() {
    let ledger = TestLedger::new().await;
    ledger.earn_on(dec!(10), "2024-03-03").await; // today - 7: outside
    ledger.earn_on(dec!(20), "2024-03-04").await; // today - 6: inside
    ledger.earn_on(dec!(40), "2024-03-10").await; // today: inside
    ledger.earn_on(dec!(80), "2024-03-11").await; // future: outside

    let summary = ledger
        .engine
        .balances()
        .get_dashboard_summary_as_of(ledger.agent_id, day(10))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = summary
        .last_seven_days_earnings
        .iter()
        .map(|e| e.date)
        .collect();
    assert_eq!(dates, vec![day(4), day(10)]);

    // Totals are not windowed.
    assert_eq!(summary.total_commission_earned, dec!(15.00));
}

#[tokio::test]
async fn test_summary_totals() {
    let ledger = TestLedger::new().await;
    ledger.store.register_user(ledger.agent_id, Uuid::new_v4()).await;
    ledger.earn(dec!(1000)).await;
    ledger.withdraw(dec!(30)).await;
    ledger.seed_pending(dec!(1000)).await;

    let summary = ledger
        .engine
        .get_dashboard_summary(ledger.agent_id)
        .await
        .unwrap();

    assert_eq!(summary.total_users, 2);
    assert_eq!(summary.total_commission_earned, dec!(100.00));
    assert_eq!(summary.withdrawable_balance, dec!(70.00));
    assert_eq!(summary.pending_commission, summary.withdrawable_balance);
    assert_eq!(summary.last_seven_days_earnings.len(), 1);
}

#[tokio::test]
async fn test_empty_agent_summary() {
    let ledger = TestLedger::new().await;

    let summary = ledger
        .engine
        .get_dashboard_summary(ledger.agent_id)
        .await
        .unwrap();

    assert_eq!(summary.total_users, 1);
    assert_eq!(summary.total_commission_earned, dec!(0));
    assert_eq!(summary.withdrawable_balance, dec!(0));
    assert!(summary.last_seven_days_earnings.is_empty());

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("last7DaysEarnings").is_some());
    assert!(json["withdrawableBalance"].is_number());
    assert_eq!(json["withdrawableBalance"].to_string(), "0.00");
    assert_eq!(json["totalCommissionEarned"].to_string(), "0.00");
}
