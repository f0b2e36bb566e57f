//! Process-wide counters, rendered as Prometheus text at `/metrics/prom`.
//! Trimmed from the precedent's connection-dedup/membership-cache/
//! authority-conflict counters (this engine has no cross-instance
//! coordination — see DESIGN.md) down to the handful of gauges that matter
//! for a single-host night engine: room lifecycle, connection churn,
//! action ingress, and retry activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters incremented by the coordinator/server/websocket layers.
/// All fields are monotonic counters except `rooms_active`, which tracks a
/// live gauge.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    pub rooms_created: AtomicU64,
    pub rooms_ended: AtomicU64,
    pub rooms_active: AtomicU64,
    pub connections_opened: AtomicU64,
    pub connections_closed: AtomicU64,
    pub actions_accepted: AtomicU64,
    pub actions_rejected: AtomicU64,
    pub wolf_votes_cast: AtomicU64,
    pub reveals_sent: AtomicU64,
    pub room_faults: AtomicU64,
    pub rate_limited_attempts: AtomicU64,
    pub retry_attempts: AtomicU64,
    pub retry_successes: AtomicU64,
    pub snapshot_save_failures: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
        self.rooms_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_ended(&self) {
        self.rooms_ended.fetch_add(1, Ordering::Relaxed);
        self.rooms_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action_accepted(&self) {
        self.actions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action_rejected(&self) {
        self.actions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wolf_vote_cast(&self) {
        self.wolf_votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reveal_sent(&self) {
        self.reveals_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_room_fault(&self) {
        self.room_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_successes(&self) {
        self.retry_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_save_failure(&self) {
        self.snapshot_save_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Render as Prometheus exposition-format text.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        let mut gauge = |name: &str, help: &str, value: u64| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{name} {value}\n"));
        };
        let mut counter = |name: &str, help: &str, value: u64| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} counter\n"));
            out.push_str(&format!("{name} {value}\n"));
        };

        gauge(
            "nightward_rooms_active",
            "Currently live rooms",
            Self::load(&self.rooms_active),
        );
        counter(
            "nightward_rooms_created_total",
            "Rooms created since startup",
            Self::load(&self.rooms_created),
        );
        counter(
            "nightward_rooms_ended_total",
            "Rooms ended since startup",
            Self::load(&self.rooms_ended),
        );
        counter(
            "nightward_connections_opened_total",
            "WebSocket connections accepted",
            Self::load(&self.connections_opened),
        );
        counter(
            "nightward_connections_closed_total",
            "WebSocket connections closed",
            Self::load(&self.connections_closed),
        );
        counter(
            "nightward_actions_accepted_total",
            "Night actions accepted",
            Self::load(&self.actions_accepted),
        );
        counter(
            "nightward_actions_rejected_total",
            "Night actions rejected",
            Self::load(&self.actions_rejected),
        );
        counter(
            "nightward_wolf_votes_cast_total",
            "Wolf-meeting ballots cast",
            Self::load(&self.wolf_votes_cast),
        );
        counter(
            "nightward_reveals_sent_total",
            "Private reveals delivered",
            Self::load(&self.reveals_sent),
        );
        counter(
            "nightward_room_faults_total",
            "Rooms that entered a faulted state",
            Self::load(&self.room_faults),
        );
        counter(
            "nightward_rate_limited_attempts_total",
            "Join/take-seat attempts rejected by the rate limiter",
            Self::load(&self.rate_limited_attempts),
        );
        counter(
            "nightward_retry_attempts_total",
            "Retry attempts across all retryable operations",
            Self::load(&self.retry_attempts),
        );
        counter(
            "nightward_retry_successes_total",
            "Operations that succeeded after at least one retry",
            Self::load(&self.retry_successes),
        );
        counter(
            "nightward_snapshot_save_failures_total",
            "Durable store save failures",
            Self::load(&self.snapshot_save_failures),
        );
        out
    }
}
