pub mod agent;
pub mod commission;
pub mod ledger_totals;
pub mod money;
pub mod user;
pub mod withdrawal;

pub use agent::{Agent, AgentStatus};
pub use commission::{Commission, DailyCommissionTotal, DailyEarning};
pub use ledger_totals::LedgerTotals;
pub use user::{User, UserPage, UserStatus};
pub use withdrawal::{Withdrawal, WithdrawalStatus};
