use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub escrow_operations_total: IntCounterVec,
    pub escrow_operation_latency_seconds: HistogramVec,
    pub escrow_held_current: IntGauge,
    pub payouts_minor_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let escrow_operations_total = IntCounterVec::new(
            Opts::new(
                "escrow_operations_total",
                "Escrow operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid escrow_operations_total metric");

        let escrow_operation_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "escrow_operation_latency_seconds",
                "Latency of escrow operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid escrow_operation_latency_seconds metric");

        let escrow_held_current =
            IntGauge::new("escrow_held_current", "Deliveries currently in escrow")
                .expect("valid escrow_held_current metric");

        let payouts_minor_total = IntCounterVec::new(
            Opts::new(
                "payouts_minor_total",
                "Payout intents in minor currency units by recipient",
            ),
            &["recipient"],
        )
        .expect("valid payouts_minor_total metric");

        registry
            .register(Box::new(escrow_operations_total.clone()))
            .expect("register escrow_operations_total");
        registry
            .register(Box::new(escrow_operation_latency_seconds.clone()))
            .expect("register escrow_operation_latency_seconds");
        registry
            .register(Box::new(escrow_held_current.clone()))
            .expect("register escrow_held_current");
        registry
            .register(Box::new(payouts_minor_total.clone()))
            .expect("register payouts_minor_total");

        Self {
            registry,
            escrow_operations_total,
            escrow_operation_latency_seconds,
            escrow_held_current,
            payouts_minor_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
