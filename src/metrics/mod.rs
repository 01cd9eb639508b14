//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Charge cycle outcomes
//! - Last transaction cost
//! - Schedule state

use crate::error::{ChargerError, ChargerResult};

use axum::{http::StatusCode, routing::get, Router};
use ethers::types::U256;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, CounterVec, Encoder, Gauge, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref CYCLES: CounterVec = register_counter_vec!(
        "charger_cycles_total",
        "Charge cycles by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref LAST_COST_WEI: Gauge = register_gauge!(
        "charger_last_cost_wei",
        "Cost of the last successful charge transaction in wei"
    ).unwrap();

    pub static ref SCHEDULER_ACTIVE: Gauge = register_gauge!(
        "charger_scheduler_active",
        "Daily schedule status (1=active, 0=stopped)"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> ChargerResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ChargerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| ChargerError::Internal(format!("metrics server: {}", e)))
    }
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    render().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Text exposition of every registered metric
pub fn render() -> ChargerResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ChargerError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| ChargerError::Internal(e.to_string()))
}

// Helper functions to record metrics

pub fn record_cycle_success(cost_wei: U256) {
    CYCLES.with_label_values(&["success"]).inc();
    // f64 gauge; precision drops above 2^53 wei
    let cost = cost_wei.to_string().parse::<f64>().unwrap_or(f64::MAX);
    LAST_COST_WEI.set(cost);
}

pub fn record_cycle_failure() {
    CYCLES.with_label_values(&["failure"]).inc();
}

pub fn record_scheduler_active(active: bool) {
    SCHEDULER_ACTIVE.set(if active { 1.0 } else { 0.0 });
}
