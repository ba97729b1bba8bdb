mod common;

use commission_ledger::error::AppError;
use commission_ledger::models::WithdrawalStatus;
use common::TestLedger;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_balance_ignores_pending_and_rejected() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(1000)).await; // 100.00 commission
    ledger.withdraw(dec!(30)).await;
    ledger.seed_pending(dec!(1000)).await;

    let rejected = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(20))
        .await
        .unwrap();
    ledger.engine.reject_withdrawal(rejected.id).await.unwrap();

    let balance = ledger
        .engine
        .get_withdrawable_balance(ledger.agent_id)
        .await
        .unwrap();
    assert_eq!(balance, dec!(70.00));
}

#[tokio::test]
async fn test_request_creates_pending_without_consuming_balance() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await; // 50.00

    let withdrawal = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(50))
        .await
        .unwrap();

    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);
    assert_eq!(withdrawal.amount, dec!(50.00));
    assert_eq!(withdrawal.agent_id, ledger.agent_id);

    let balance = ledger
        .engine
        .get_withdrawable_balance(ledger.agent_id)
        .await
        .unwrap();
    assert_eq!(balance, dec!(50.00));
}

#[tokio::test]
async fn test_request_amount_is_rounded_to_cents() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await;

    let withdrawal = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(12.345))
        .await
        .unwrap();
    assert_eq!(withdrawal.amount, dec!(12.35));
}

#[tokio::test]
async fn test_request_exceeding_balance_is_refused() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await; // 50.00
    ledger.withdraw(dec!(20)).await;

    let err = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(30.01))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientBalance { requested, available } => {
            assert_eq!(requested, dec!(30.01));
            assert_eq!(available, dec!(30.00));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ledger.store.withdrawal_count().await, 1);
}

#[tokio::test]
async fn test_non_positive_amounts_persist_nothing() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await;

    for amount in [dec!(0), dec!(-5), dec!(0.004)] {
        let result = ledger.engine.request_withdrawal(ledger.agent_id, amount).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    assert_eq!(ledger.store.withdrawal_count().await, 0);
}

#[tokio::test]
async fn test_amount_beyond_ledger_range_is_rejected() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await;

    for amount in [dec!(10000000000000000), Decimal::MAX] {
        let result = ledger.engine.request_withdrawal(ledger.agent_id, amount).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    assert_eq!(ledger.store.withdrawal_count().await, 0);
}

#[tokio::test]
async fn test_unknown_agent_is_not_found() {
    let ledger = TestLedger::new().await;

    let result = ledger.engine.request_withdrawal(Uuid::new_v4(), dec!(1)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_gated_at_approval() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await; // 50.00

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = ledger.engine.clone();
            let agent_id = ledger.agent_id;
            tokio::spawn(async move { engine.request_withdrawal(agent_id, dec!(40)).await })
        })
        .collect();

    // PENDING reserves nothing, so both 40.00 requests fit the 50.00 balance.
    // Approval is where the second one is stopped.
    for handle in handles {
        handle.await.unwrap().expect("Failed to request withdrawal");
    }

    let pending = ledger
        .engine
        .withdrawals()
        .list_withdrawals(ledger.agent_id)
        .await
        .unwrap();
    let mut approved = 0;
    for withdrawal in pending {
        if ledger.engine.approve_withdrawal(withdrawal.id).await.is_ok() {
            approved += 1;
        }
    }
    assert_eq!(approved, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_cannot_overdraw() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await; // 50.00
    let first = ledger.seed_pending(dec!(40)).await;
    let second = ledger.seed_pending(dec!(40)).await;

    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|id| {
            let engine = ledger.engine.clone();
            tokio::spawn(async move { engine.approve_withdrawal(id).await })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(w) => {
                assert_eq!(w.status, WithdrawalStatus::Approved);
                approved += 1;
            }
            Err(AppError::InsufficientBalance { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(approved, 1);

    let balance = ledger
        .engine
        .get_withdrawable_balance(ledger.agent_id)
        .await
        .unwrap();
    assert_eq!(balance, dec!(10.00));
}

#[tokio::test]
async fn test_approval_rechecks_balance_and_leaves_pending() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await; // 50.00

    let first = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(40))
        .await
        .unwrap();
    let second = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(40))
        .await
        .unwrap();

    ledger.engine.approve_withdrawal(first.id).await.unwrap();
    let err = ledger.engine.approve_withdrawal(second.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance { .. }));

    let still_pending = ledger
        .engine
        .withdrawals()
        .get_withdrawal(ledger.agent_id, second.id)
        .await
        .unwrap();
    assert_eq!(still_pending.status, WithdrawalStatus::Pending);

    // Rejection needs no balance.
    let rejected = ledger.engine.reject_withdrawal(second.id).await.unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
}

#[tokio::test]
async fn test_terminal_states_are_final() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await;

    let approved = ledger.withdraw(dec!(10)).await;
    let rejected = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(10))
        .await
        .unwrap();
    ledger.engine.reject_withdrawal(rejected.id).await.unwrap();

    for id in [approved.id, rejected.id] {
        assert!(matches!(
            ledger.engine.approve_withdrawal(id).await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            ledger.engine.reject_withdrawal(id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    // A second approval must not have debited twice.
    let balance = ledger
        .engine
        .get_withdrawable_balance(ledger.agent_id)
        .await
        .unwrap();
    assert_eq!(balance, dec!(40.00));
}

#[tokio::test]
async fn test_unknown_withdrawal_is_not_found() {
    let ledger = TestLedger::new().await;

    assert!(matches!(
        ledger.engine.approve_withdrawal(Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        ledger.engine.reject_withdrawal(Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_withdrawals_are_scoped_to_owner() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(500)).await;
    let withdrawal = ledger
        .engine
        .request_withdrawal(ledger.agent_id, dec!(5))
        .await
        .unwrap();

    let stranger = Uuid::new_v4();
    let result = ledger
        .engine
        .withdrawals()
        .get_withdrawal(stranger, withdrawal.id)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(ledger
        .engine
        .withdrawals()
        .list_withdrawals(stranger)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_balance_never_negative_under_mixed_load() {
    let ledger = TestLedger::new().await;
    ledger.earn(dec!(1000)).await; // 100.00

    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = ledger.engine.clone();
        let agent_id = ledger.agent_id;
        handles.push(tokio::spawn(async move {
            let amount = Decimal::from(5 + (i % 4) * 5);
            if let Ok(w) = engine.request_withdrawal(agent_id, amount).await {
                if i % 3 == 0 {
                    let _ = engine.reject_withdrawal(w.id).await;
                } else {
                    let _ = engine.approve_withdrawal(w.id).await;
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let totals = ledger
        .engine
        .balances()
        .get_ledger_totals(ledger.agent_id)
        .await
        .unwrap();
    assert!(totals.total_approved <= totals.total_commission);

    let approved_sum: Decimal = ledger
        .engine
        .withdrawals()
        .list_withdrawals(ledger.agent_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|w| w.status == WithdrawalStatus::Approved)
        .map(|w| w.amount)
        .sum();
    assert_eq!(approved_sum, totals.total_approved);
    assert!(
        ledger
            .engine
            .get_withdrawable_balance(ledger.agent_id)
            .await
            .unwrap()
            >= Decimal::ZERO
    );
}
