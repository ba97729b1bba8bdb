pub mod agent_service;
pub mod balance_service;
pub mod commission_recorder;
pub mod retry;
pub mod user_service;
pub mod withdrawal_service;

pub use agent_service::{AgentService, RegisterAgentRequest};
pub use balance_service::{BalanceService, DashboardSummary};
pub use commission_recorder::{
    CommissionHistory, CommissionHistoryQuery, CommissionRecorder, RecordCommissionRequest,
};
pub use retry::RetryPolicy;
pub use user_service::{CreateUserRequest, UserService};
pub use withdrawal_service::WithdrawalService;
