//! Rejects transactions that only relay already-settled packets.
//!
//! During `CheckTx` and `ReCheckTx` every packet message is executed against
//! the check context. If each one comes back as a no-op, the transaction
//! would only burn block space and is rejected with
//! [`AnteError::RedundantTx`]. A transaction carrying any message other than
//! packet relays and client updates is always handed on untouched, so
//! unrelated messages are never dropped alongside a duplicate relay.

use tracing::{
    debug,
    instrument,
};

use crate::{
    ante::{
        AnteDecorator,
        Next,
    },
    context::Context,
    error::{
        AnteError,
        Result,
    },
    keeper::HandlerInvoker,
    metrics,
    primitives::{
        HandlerResult,
        Msg,
        Tx,
    },
};

/// Packet messages seen in one transaction and how many were no-ops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedundancyCounter {
    packet_msgs: usize,
    redundancies: usize,
}

impl RedundancyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: HandlerResult) {
        self.packet_msgs += 1;
        if result == HandlerResult::NoOp {
            self.redundancies += 1;
        }
    }

    pub fn packet_msgs(&self) -> usize {
        self.packet_msgs
    }

    pub fn redundancies(&self) -> usize {
        self.redundancies
    }

    /// True when at least one packet message was seen and all were no-ops.
    pub fn is_redundant(&self) -> bool {
        self.packet_msgs > 0 && self.redundancies == self.packet_msgs
    }
}

/// How classification of a transaction ended.
enum Scan {
    /// A message outside packet relays and client updates was found.
    Foreign,
    Complete(RedundancyCounter),
}

/// Ante stage that filters redundant IBC relays out of the mempool.
#[derive(Debug, Clone)]
pub struct RedundancyDecorator<K> {
    invoker: K,
}

impl<K: HandlerInvoker> RedundancyDecorator<K> {
    pub fn new(invoker: K) -> Self {
        Self { invoker }
    }

    /// Executes each message's handler in order, stopping at the first
    /// message that is not a packet relay or client update.
    fn scan(&self, ctx: &mut Context, tx: &Tx) -> Result<Scan> {
        let mut counter = RedundancyCounter::new();

        for (index, msg) in tx.msgs().iter().enumerate() {
            let result = match msg {
                Msg::RecvPacket(msg) => self.invoker.recv_packet(ctx, msg),
                Msg::Acknowledgement(msg) => self.invoker.acknowledgement(ctx, msg),
                Msg::Timeout(msg) => self.invoker.timeout(ctx, msg),
                Msg::TimeoutOnClose(msg) => self.invoker.timeout_on_close(ctx, msg),
                Msg::UpdateClient(msg) => {
                    self.invoker.update_client(ctx, msg).inspect_err(|err| {
                        debug!(target: "ibc_ante::redundancy", index, %err, "Client update failed");
                    })?;
                    continue;
                }
                Msg::Other(other) => {
                    debug!(target: "ibc_ante::redundancy", index, kind = ?msg.kind(), type_url = %other.type_url, "Tx carries a non-IBC message, skipping redundancy check");
                    return Ok(Scan::Foreign);
                }
            };

            let result = result.inspect_err(|err| {
                debug!(target: "ibc_ante::redundancy", index, kind = ?msg.kind(), type_url = msg.type_url(), sequence = msg.packet().map(|packet| packet.sequence), %err, "Packet handler failed");
            })?;
            counter.record(result);
        }

        Ok(Scan::Complete(counter))
    }
}

impl<K: HandlerInvoker> AnteDecorator for RedundancyDecorator<K> {
    #[instrument(level = "debug", skip_all, target = "ibc_ante::redundancy", fields(mode = ?ctx.mode(), msgs = tx.msgs().len()))]
    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> Result<Context> {
        if !ctx.mode().is_check() || simulate {
            return next.run(ctx, tx, simulate);
        }

        let counter = match self.scan(&mut ctx, tx)? {
            Scan::Foreign => return next.run(ctx, tx, simulate),
            Scan::Complete(counter) => counter,
        };

        metrics::record_packet_msgs(counter.packet_msgs(), counter.redundancies());

        if counter.is_redundant() {
            debug!(target: "ibc_ante::redundancy", packet_msgs = counter.packet_msgs(), "Rejecting tx, all packet messages are redundant");
            metrics::record_redundant_tx();
            return Err(AnteError::RedundantTx);
        }

        debug!(target: "ibc_ante::redundancy", packet_msgs = counter.packet_msgs(), redundancies = counter.redundancies(), "Tx passed redundancy check");
        next.run(ctx, tx, simulate)
    }

    fn name(&self) -> &'static str {
        "redundant_relay"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        context::ExecMode,
        error::HandlerError,
        store::MemStore,
        test_utils::{
            Outcome,
            RecordingDecorator,
            ScriptedInvoker,
            ack_msg,
            other_msg,
            recv_msg,
            timeout_msg,
            timeout_on_close_msg,
            update_client_msg,
        },
    };

    fn ctx(mode: ExecMode) -> Context {
        Context::new(mode, 100, Arc::new(MemStore::new()))
    }

    /// Runs `tx` through the filter followed by a recording stage.
    fn run(
        invoker: &ScriptedInvoker,
        mode: ExecMode,
        tx: &Tx,
        simulate: bool,
    ) -> (Result<Context>, RecordingDecorator) {
        let next = RecordingDecorator::new("next");
        let chain = crate::AnteChain::builder()
            .decorator(RedundancyDecorator::new(invoker.clone()))
            .decorator(next.clone())
            .build();
        (chain.run(ctx(mode), tx, simulate), next)
    }

    #[test]
    fn test_counter() {
        let mut counter = RedundancyCounter::new();
        assert!(!counter.is_redundant());

        counter.record(HandlerResult::NoOp);
        assert!(counter.is_redundant());

        counter.record(HandlerResult::Applied);
        assert!(!counter.is_redundant());
        assert_eq!(counter.packet_msgs(), 2);
        assert_eq!(counter.redundancies(), 1);
    }

    #[test]
    fn test_all_noop_is_rejected() {
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::NoOp)
            .with(2, Outcome::NoOp)
            .with(3, Outcome::NoOp)
            .with(4, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1), ack_msg(2), timeout_msg(3), timeout_on_close_msg(4)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(result.unwrap_err(), AnteError::RedundantTx);
        assert_eq!(next.calls(), 0);
        assert_eq!(invoker.invoked(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_recheck_also_filters() {
        let invoker = ScriptedInvoker::new().with(1, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1)]);

        let (result, _) = run(&invoker, ExecMode::ReCheckTx, &tx, false);
        assert_eq!(result.unwrap_err(), AnteError::RedundantTx);
    }

    #[test]
    fn test_one_applied_passes() {
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::NoOp)
            .with(2, Outcome::Applied)
            .with(3, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1), recv_msg(2), ack_msg(3)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert!(result.is_ok());
        assert_eq!(next.calls(), 1);
    }

    #[test]
    fn test_deliver_and_simulate_skip_handlers() {
        let invoker = ScriptedInvoker::new().with(1, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1)]);

        for (mode, simulate) in [
            (ExecMode::Deliver, false),
            (ExecMode::Simulate, false),
            (ExecMode::CheckTx, true),
            (ExecMode::ReCheckTx, true),
        ] {
            let (result, next) = run(&invoker, mode, &tx, simulate);
            assert!(result.is_ok(), "{mode:?} simulate={simulate}");
            assert_eq!(next.calls(), 1);
            assert_eq!(next.saw_simulate(), Some(simulate));
        }
        assert!(invoker.invoked().is_empty());
    }

    #[test]
    fn test_empty_tx_passes() {
        let invoker = ScriptedInvoker::new();
        let (result, next) = run(&invoker, ExecMode::CheckTx, &Tx::default(), false);
        assert!(result.is_ok());
        assert_eq!(next.calls(), 1);
    }

    #[test]
    fn test_non_ibc_message_delegates_before_decision() {
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::NoOp)
            .with(2, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1), other_msg(), recv_msg(2)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert!(result.is_ok());
        assert_eq!(next.calls(), 1);
        // Messages after the foreign one are never executed.
        assert_eq!(invoker.invoked(), vec![1]);
    }

    #[test]
    fn test_client_update_does_not_count() {
        let invoker = ScriptedInvoker::new().with(1, Outcome::NoOp);
        let tx = Tx::new(vec![recv_msg(1), update_client_msg("07-tendermint-0")]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(result.unwrap_err(), AnteError::RedundantTx);
        assert_eq!(next.calls(), 0);
        assert_eq!(invoker.client_updates(), vec!["07-tendermint-0".to_string()]);
    }

    #[test]
    fn test_only_client_updates_pass() {
        let invoker = ScriptedInvoker::new();
        let tx = Tx::new(vec![update_client_msg("07-tendermint-0")]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert!(result.is_ok());
        assert_eq!(next.calls(), 1);
    }

    #[test]
    fn test_handler_error_short_circuits() {
        let err = HandlerError::Custom("bad proof".into());
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::Applied)
            .with(2, Outcome::Fail(err.clone()))
            .with(3, Outcome::Applied);
        let tx = Tx::new(vec![recv_msg(1), ack_msg(2), other_msg(), recv_msg(3)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(result.unwrap_err(), AnteError::Handler(err));
        assert_eq!(next.calls(), 0);
        assert_eq!(invoker.invoked(), vec![1, 2]);
    }

    #[test]
    fn test_client_update_error_short_circuits() {
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::Applied)
            .with_failing_client("07-tendermint-9");
        let tx = Tx::new(vec![update_client_msg("07-tendermint-9"), recv_msg(1)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(
            result.unwrap_err(),
            AnteError::Handler(HandlerError::ClientNotFound("07-tendermint-9".into()))
        );
        assert_eq!(next.calls(), 0);
        assert!(invoker.invoked().is_empty());
    }

    #[test]
    fn test_handler_error_after_noop_is_returned() {
        let err = HandlerError::Custom("bad proof".into());
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::NoOp)
            .with(2, Outcome::Fail(err.clone()));
        let tx = Tx::new(vec![recv_msg(1), ack_msg(2)]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(result.unwrap_err(), AnteError::Handler(err));
        assert_eq!(next.calls(), 0);
        assert_eq!(invoker.invoked(), vec![1, 2]);
    }

    #[test]
    fn test_client_update_error_after_noop_is_returned() {
        let invoker = ScriptedInvoker::new()
            .with(1, Outcome::NoOp)
            .with_failing_client("07-tendermint-9");
        let tx = Tx::new(vec![recv_msg(1), update_client_msg("07-tendermint-9")]);

        let (result, next) = run(&invoker, ExecMode::CheckTx, &tx, false);
        assert_eq!(
            result.unwrap_err(),
            AnteError::Handler(HandlerError::ClientNotFound("07-tendermint-9".into()))
        );
        assert_eq!(next.calls(), 0);
        assert_eq!(invoker.invoked(), vec![1]);
    }
}
