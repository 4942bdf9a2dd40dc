//! # Forwarding Receiver
//!
//! Bridges the connection driver to the forwarding subsystem and records
//! protocol and forwarding metrics on the way.

use shared_types::{ProtocolVersion, Vote};
use std::sync::Arc;
use vote_telemetry::{
    log_event, CONNECTION_FAILURES, DECODE_FAILURES, VOTES_CACHED, VOTES_FORWARDED, VOTES_LOST,
    VOTES_RECEIVED,
};
use vr_02_vote_protocol::{ConnectionError, VoteReceiver};
use vr_04_vote_forwarding::{ForwardReport, ForwardingService};

/// [`VoteReceiver`] that forwards every decoded vote.
#[derive(Debug, Clone)]
pub struct ForwardingReceiver {
    forwarding: Arc<ForwardingService>,
}

impl ForwardingReceiver {
    pub fn new(forwarding: Arc<ForwardingService>) -> Self {
        Self { forwarding }
    }
}

impl VoteReceiver for ForwardingReceiver {
    fn on_vote_received(&self, vote: Vote, version: ProtocolVersion, remote_addr: &str) {
        VOTES_RECEIVED.with_label_values(&[version.label()]).inc();
        log_event!(
            info,
            "protocol",
            "Got a protocol vote record",
            remote = remote_addr,
            protocol = version.label(),
            vote = %vote
        );

        let report = self.forwarding.forward(&vote);
        record_report(&report);
    }

    fn on_error(&self, error: &ConnectionError, remote_addr: &str) {
        match error {
            ConnectionError::Decode(e) => {
                DECODE_FAILURES.with_label_values(&[e.kind().as_str()]).inc();
            }
            ConnectionError::Timeout { .. } => {
                CONNECTION_FAILURES.with_label_values(&["timeout"]).inc();
            }
            ConnectionError::Incomplete { .. } => {
                CONNECTION_FAILURES.with_label_values(&["incomplete"]).inc();
            }
            ConnectionError::Io(_) => {
                CONNECTION_FAILURES.with_label_values(&["io"]).inc();
            }
        }
        log_event!(
            debug,
            "protocol",
            "Rejected vote connection",
            remote = remote_addr,
            error = %error
        );
    }
}

fn record_report(report: &ForwardReport) {
    VOTES_FORWARDED.inc_by(report.delivered.len() as u64);
    VOTES_CACHED.inc_by(report.cached.len() as u64);
    VOTES_LOST.inc_by(report.lost.len() as u64);
    if !report.lost.is_empty() {
        log_event!(
            warn,
            "forwarding",
            "Vote could not be delivered or cached",
            servers = ?report.lost
        );
    }
}
