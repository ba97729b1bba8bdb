use crate::config::LedgerSettings;
use crate::error::Result;
use crate::models::{Commission, Withdrawal};
use crate::repositories::LedgerStore;
use crate::services::{
    BalanceService, CommissionRecorder, DashboardSummary, RecordCommissionRequest, RetryPolicy,
    WithdrawalService,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Entry point for the identity and transport layers.
///
/// Every service shares one [`LedgerStore`]; callers pass an agent id that
/// has already been authenticated.
pub struct LedgerEngine {
    commissions: CommissionRecorder,
    balances: BalanceService,
    withdrawals: WithdrawalService,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn LedgerStore>, settings: &LedgerSettings) -> Self {
        Self {
            commissions: CommissionRecorder::with_rate(store.clone(), settings.commission_rate),
            balances: BalanceService::new(store.clone()),
            withdrawals: WithdrawalService::new(store)
                .with_retry_policy(RetryPolicy::from_settings(settings)),
        }
    }

    pub fn commissions(&self) -> &CommissionRecorder {
        &self.commissions
    }

    pub fn balances(&self) -> &BalanceService {
        &self.balances
    }

    pub fn withdrawals(&self) -> &WithdrawalService {
        &self.withdrawals
    }

    pub async fn record_commission(
        &self,
        agent_id: Uuid,
        request: RecordCommissionRequest,
    ) -> Result<Commission> {
        self.commissions.record_commission(agent_id, request).await
    }

    pub async fn get_withdrawable_balance(&self, agent_id: Uuid) -> Result<Decimal> {
        self.balances.get_withdrawable_balance(agent_id).await
    }

    pub async fn get_dashboard_summary(&self, agent_id: Uuid) -> Result<DashboardSummary> {
        self.balances.get_dashboard_summary(agent_id).await
    }

    pub async fn request_withdrawal(&self, agent_id: Uuid, amount: Decimal) -> Result<Withdrawal> {
        self.withdrawals.request_withdrawal(agent_id, amount).await
    }

    pub async fn approve_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal> {
        self.withdrawals.approve_withdrawal(withdrawal_id).await
    }

    pub async fn reject_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal> {
        self.withdrawals.reject_withdrawal(withdrawal_id).await
    }
}
