use std::net::SocketAddr;

/// Installs the Prometheus exporter when `RAJAI_METRICS_ADDR` is set.
/// Without it, counters still record into the no-op recorder.
pub fn init_metrics() {
    let addr_str = match std::env::var("RAJAI_METRICS_ADDR") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return,
    };
    let addr: SocketAddr = match addr_str.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("RAJAI_METRICS_ADDR inválido ({}): {}", addr_str, e);
            return;
        }
    };
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            tracing::info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

/// One establishment row accepted into the batch.
pub fn record_row_ingested() {
    ::metrics::counter!("rajai_rows_ingested_total").increment(1);
}

/// One row dropped or zeroed, labeled with the reason.
pub fn record_row_skipped(reason: &'static str) {
    ::metrics::counter!("rajai_rows_skipped_total", "reason" => reason).increment(1);
}

/// One full snapshot build, with its duration.
pub fn record_snapshot_built(duration_secs: f64) {
    ::metrics::counter!("rajai_snapshot_builds_total").increment(1);
    ::metrics::histogram!("rajai_snapshot_build_seconds").record(duration_secs);
}
