//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;

use crate::errors::ErrorKind;

/// Call pipeline metrics
pub struct Metrics {
    registry: Registry,

    // Counters
    pub calls_total: IntCounter,
    pub calls_succeeded: IntCounter,
    pub call_failures: IntCounterVec,

    // Gauges
    pub calls_in_flight: IntGauge,

    // Histograms
    pub poll_attempts: Histogram,
    pub call_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance with its own registry
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let calls_total = IntCounter::with_opts(Opts::new(
            "ledger_calls_total",
            "Total number of contract calls started",
        ))?;

        let calls_succeeded = IntCounter::with_opts(Opts::new(
            "ledger_calls_succeeded",
            "Number of contract calls confirmed on the ledger",
        ))?;

        let call_failures = IntCounterVec::new(
            Opts::new("ledger_call_failures", "Failed contract calls by error kind"),
            &["kind"],
        )?;

        let calls_in_flight = IntGauge::with_opts(Opts::new(
            "ledger_calls_in_flight",
            "Contract calls currently in progress",
        ))?;

        let poll_attempts = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_poll_attempts",
                "Confirmation queries issued per submitted call",
            )
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0, 15.0, 20.0]),
        )?;

        let call_latency = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_call_latency_seconds",
                "End-to-end contract call latency",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(calls_total.clone()))?;
        registry.register(Box::new(calls_succeeded.clone()))?;
        registry.register(Box::new(call_failures.clone()))?;
        registry.register(Box::new(calls_in_flight.clone()))?;
        registry.register(Box::new(poll_attempts.clone()))?;
        registry.register(Box::new(call_latency.clone()))?;

        Ok(Self {
            registry,
            calls_total,
            calls_succeeded,
            call_failures,
            calls_in_flight,
            poll_attempts,
            call_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.call_failures.with_label_values(&[kind.as_str()]).inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
