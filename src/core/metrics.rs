//! Prometheus metrics for the dispatch engine
//!
//! The registry is owned by [`Metrics`] and passed to the dispatcher and the
//! webhook server instead of living in a global.

use prometheus::{IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::core::error::AppResult;

pub struct Metrics {
    registry: Registry,
    /// Inbound events by kind (command/button)
    pub events_total: IntCounterVec,
    /// Failed handling units by domain and error kind
    pub handler_failures_total: IntCounterVec,
    /// Handling units currently running
    pub in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> AppResult<Self> {
        let registry = Registry::new_custom(Some("workouts_bot".to_string()), None)?;

        let events_total = IntCounterVec::new(
            Opts::new("events_total", "Inbound chat events by kind"),
            &["kind"],
        )?;
        let handler_failures_total = IntCounterVec::new(
            Opts::new("handler_failures_total", "Handling units that ended with an error"),
            &["domain", "kind"],
        )?;
        let in_flight = IntGauge::new("handlers_in_flight", "Handling units currently running")?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(handler_failures_total.clone()))?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            registry,
            events_total,
            handler_failures_total,
            in_flight,
        })
    }

    /// Renders all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> AppResult<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}
