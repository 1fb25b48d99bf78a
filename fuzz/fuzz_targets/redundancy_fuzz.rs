#![no_main]
use std::sync::Arc;

use ibc_ante::{
    AnteChain,
    AnteError,
    Context,
    ExecMode,
    HandlerError,
    RedundancyDecorator,
    primitives::{
        Msg,
        Tx,
    },
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
use libfuzzer_sys::fuzz_target;

/// Expected verdict computed straight from the script.
enum Expected {
    Pass,
    Reject,
    Fail,
}

/// Builds a transaction from fuzzer data, two bytes per message: the first
/// selects the message type, the second its scripted outcome.
fn build(data: &[u8]) -> (ScriptedInvoker, Tx, Expected) {
    let mut invoker = ScriptedInvoker::new();
    let mut msgs: Vec<Msg> = Vec::new();
    let mut packet_msgs = 0;
    let mut redundancies = 0;
    let mut expected = None;

    for (index, pair) in data.chunks_exact(2).take(32).enumerate() {
        let sequence = index as u64 + 1;
        let outcome = match pair[1] % 3 {
            0 => Outcome::Applied,
            1 => Outcome::NoOp,
            _ => Outcome::Fail(HandlerError::Custom(format!("fail {sequence}"))),
        };

        let msg = match pair[0] % 6 {
            0 => recv_msg(sequence),
            1 => ack_msg(sequence),
            2 => timeout_msg(sequence),
            3 => timeout_on_close_msg(sequence),
            4 => update_client_msg("07-tendermint-0"),
            _ => other_msg(),
        };

        if expected.is_none() {
            match &msg {
                Msg::UpdateClient(_) => {}
                Msg::Other(_) => expected = Some(Expected::Pass),
                _ => match &outcome {
                    Outcome::Applied => packet_msgs += 1,
                    Outcome::NoOp => {
                        packet_msgs += 1;
                        redundancies += 1;
                    }
                    Outcome::Fail(_) => expected = Some(Expected::Fail),
                },
            }
        }

        invoker = invoker.with(sequence, outcome);
        msgs.push(msg);
    }

    let expected = expected.unwrap_or(if packet_msgs > 0 && packet_msgs == redundancies {
        Expected::Reject
    } else {
        Expected::Pass
    });
    (invoker, Tx::new(msgs), expected)
}

fuzz_target!(|data: &[u8]| {
    let (invoker, tx, expected) = build(data);
    let next = RecordingDecorator::new("next");
    let chain = AnteChain::builder()
        .decorator(RedundancyDecorator::new(invoker))
        .decorator(next.clone())
        .build();

    let ctx = Context::new(ExecMode::CheckTx, 1, Arc::new(MemStore::new()));
    let result = chain.run(ctx, &tx, false);

    match expected {
        Expected::Pass => {
            assert!(result.is_ok());
            assert_eq!(next.calls(), 1);
        }
        Expected::Reject => {
            assert!(matches!(result, Err(AnteError::RedundantTx)));
            assert_eq!(next.calls(), 0);
        }
        Expected::Fail => {
            assert!(matches!(result, Err(AnteError::Handler(_))));
            assert_eq!(next.calls(), 0);
        }
    }
});
