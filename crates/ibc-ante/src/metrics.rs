//! Prometheus metrics for the redundant-relay filter.

use metrics::counter;

/// Record the packet messages executed while checking one transaction.
///
/// Committed as `Counter`s: `ibc_ante_packet_msgs_evaluated_total` and
/// `ibc_ante_redundant_packet_msgs_total`
pub fn record_packet_msgs(evaluated: usize, redundant: usize) {
    if evaluated > 0 {
        counter!("ibc_ante_packet_msgs_evaluated_total").increment(evaluated as u64);
    }
    if redundant > 0 {
        counter!("ibc_ante_redundant_packet_msgs_total").increment(redundant as u64);
    }
}

/// Record a transaction rejected because every packet message was a no-op.
///
/// Committed as a `Counter`: `ibc_ante_redundant_txs_rejected_total`
pub fn record_redundant_tx() {
    counter!("ibc_ante_redundant_txs_rejected_total").increment(1);
}
