use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics emitted by the ledger services.
///
/// Recording is a no-op until a recorder is installed, so services and tests
/// can call it unconditionally.
#[derive(Debug, Clone, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_commission(&self) {
        counter!("commission_recorded_total").increment(1);
    }

    pub fn record_withdrawal_requested(&self) {
        counter!("withdrawal_requested_total").increment(1);
    }

    pub fn record_withdrawal_approved(&self) {
        counter!("withdrawal_approved_total").increment(1);
    }

    pub fn record_withdrawal_rejected(&self) {
        counter!("withdrawal_rejected_total").increment(1);
    }

    /// A request or approval refused by a business rule.
    pub fn record_withdrawal_refused(&self, reason: &'static str) {
        counter!("withdrawal_refused_total", "reason" => reason).increment(1);
    }

    pub fn record_transaction_retry(&self, operation: &'static str) {
        counter!("ledger_transaction_retries_total", "operation" => operation).increment(1);
    }

    pub fn record_transaction_latency(&self, operation: &'static str, duration_ms: f64) {
        histogram!("ledger_transaction_duration_ms", "operation" => operation).record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the Prometheus recorder once and returns its handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    METRICS.get_or_init(Metrics::new);

    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    describe_counter!("commission_recorded_total", Unit::Count, "Commission entries appended");
    describe_counter!("withdrawal_requested_total", Unit::Count, "Withdrawals created in PENDING state");
    describe_counter!("withdrawal_approved_total", Unit::Count, "Withdrawals moved to APPROVED");
    describe_counter!("withdrawal_rejected_total", Unit::Count, "Withdrawals moved to REJECTED");
    describe_counter!("withdrawal_refused_total", Unit::Count, "Withdrawal requests or approvals refused by a business rule");
    describe_counter!("ledger_transaction_retries_total", Unit::Count, "Ledger transactions retried after a serialization conflict");
    describe_histogram!("ledger_transaction_duration_ms", Unit::Milliseconds, "Ledger transaction latency in milliseconds");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}
