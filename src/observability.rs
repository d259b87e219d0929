use std::net::SocketAddr;

// ── Flow metrics ────────────────────────────────────────────────

/// Counter: slot-list computations (step entry + date changes).
pub const SLOT_QUERIES_TOTAL: &str = "bookslot_slot_queries_total";

/// Counter: availability searches triggered by a fully booked day.
pub const SEARCH_FALLBACKS_TOTAL: &str = "bookslot_search_fallbacks_total";

/// Histogram: slots returned per computation.
pub const SLOTS_RETURNED: &str = "bookslot_slots_returned";

// ── Outcome metrics ─────────────────────────────────────────────

/// Counter: bookings inserted at confirmation.
pub const BOOKINGS_CREATED_TOTAL: &str = "bookslot_bookings_created_total";

/// Counter: bookings updated at confirmation (edit flow).
pub const BOOKINGS_UPDATED_TOTAL: &str = "bookslot_bookings_updated_total";

/// Counter: bookings cancelled from the manage-existing step.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "bookslot_bookings_cancelled_total";

/// Counter: writes rejected because the slot was taken in the meantime.
pub const WRITE_CONFLICTS_TOTAL: &str = "bookslot_write_conflicts_total";

/// Counter: retried store calls after a transient failure or timeout.
pub const STORE_RETRIES_TOTAL: &str = "bookslot_store_retries_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
