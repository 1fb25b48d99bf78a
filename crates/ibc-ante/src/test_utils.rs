use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    ante::{
        AnteDecorator,
        Next,
    },
    context::Context,
    error::{
        HandlerError,
        Result,
    },
    keeper::HandlerInvoker,
    primitives::{
        HandlerResult,
        Msg,
        MsgAcknowledgement,
        MsgRecvPacket,
        MsgTimeout,
        MsgTimeoutOnClose,
        MsgUpdateClient,
        OtherMsg,
        Packet,
        Tx,
    },
};

/// This gets invoked before any tests, when the cargo test framework loads the test library.
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    use tracing_subscriber::{
        filter::filter_fn,
        prelude::*,
    };
    if let Ok(v) = std::env::var("TEST_TRACE") {
        let level = match v.as_str() {
            "false" | "off" => return,
            "true" | "debug" | "on" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => return,
        };

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter_fn(move |metadata| metadata.level() <= &level))
            .init();
    }
}

/// Scripted result of a packet handler call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    NoOp,
    Fail(HandlerError),
}

#[derive(Debug, Default)]
struct ScriptState {
    invoked: Vec<u64>,
    client_updates: Vec<String>,
}

/// Handler invoker returning scripted results keyed by packet sequence.
///
/// Unscripted packets are `Applied`. Client updates succeed unless the
/// client was registered with [`ScriptedInvoker::with_failing_client`].
/// Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInvoker {
    outcomes: HashMap<u64, Outcome>,
    failing_clients: HashSet<String>,
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sequence: u64, outcome: Outcome) -> Self {
        self.outcomes.insert(sequence, outcome);
        self
    }

    pub fn with_failing_client(mut self, client_id: &str) -> Self {
        self.failing_clients.insert(client_id.to_string());
        self
    }

    /// Sequences of the packet handlers invoked so far, in call order.
    pub fn invoked(&self) -> Vec<u64> {
        self.state.lock().invoked.clone()
    }

    pub fn client_updates(&self) -> Vec<String> {
        self.state.lock().client_updates.clone()
    }

    fn packet(&self, packet: &Packet) -> Result<HandlerResult, HandlerError> {
        self.state.lock().invoked.push(packet.sequence);
        match self.outcomes.get(&packet.sequence) {
            Some(Outcome::NoOp) => Ok(HandlerResult::NoOp),
            Some(Outcome::Fail(err)) => Err(err.clone()),
            Some(Outcome::Applied) | None => Ok(HandlerResult::Applied),
        }
    }
}

impl HandlerInvoker for ScriptedInvoker {
    fn recv_packet(
        &self,
        _ctx: &mut Context,
        msg: &MsgRecvPacket,
    ) -> Result<HandlerResult, HandlerError> {
        self.packet(&msg.packet)
    }

    fn acknowledgement(
        &self,
        _ctx: &mut Context,
        msg: &MsgAcknowledgement,
    ) -> Result<HandlerResult, HandlerError> {
        self.packet(&msg.packet)
    }

    fn timeout(
        &self,
        _ctx: &mut Context,
        msg: &MsgTimeout,
    ) -> Result<HandlerResult, HandlerError> {
        self.packet(&msg.packet)
    }

    fn timeout_on_close(
        &self,
        _ctx: &mut Context,
        msg: &MsgTimeoutOnClose,
    ) -> Result<HandlerResult, HandlerError> {
        self.packet(&msg.packet)
    }

    fn update_client(
        &self,
        _ctx: &mut Context,
        msg: &MsgUpdateClient,
    ) -> Result<(), HandlerError> {
        self.state.lock().client_updates.push(msg.client_id.clone());
        if self.failing_clients.contains(&msg.client_id) {
            return Err(HandlerError::ClientNotFound(msg.client_id.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    calls: usize,
    simulate: Option<bool>,
}

/// Ante stage that records that it was reached and hands on.
#[derive(Debug, Clone)]
pub struct RecordingDecorator {
    name: &'static str,
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingDecorator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            recorded: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.recorded.lock().calls
    }

    /// The `simulate` flag of the last call, if any.
    pub fn saw_simulate(&self) -> Option<bool> {
        self.recorded.lock().simulate
    }
}

impl AnteDecorator for RecordingDecorator {
    fn ante_handle(&self, ctx: Context, tx: &Tx, simulate: bool, next: Next<'_>) -> Result<Context> {
        {
            let mut recorded = self.recorded.lock();
            recorded.calls += 1;
            recorded.simulate = Some(simulate);
        }
        next.run(ctx, tx, simulate)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub fn test_packet(sequence: u64) -> Packet {
    Packet::new(
        sequence,
        ("transfer", "channel-0"),
        ("transfer", "channel-1"),
        format!("packet-{sequence}").into_bytes(),
    )
}

pub fn recv_msg(sequence: u64) -> Msg {
    recv_packet_msg(test_packet(sequence))
}

pub fn recv_packet_msg(packet: Packet) -> Msg {
    Msg::RecvPacket(MsgRecvPacket {
        packet,
        proof_commitment: vec![0xab],
        proof_height: 10,
        signer: "relayer".into(),
    })
}

pub fn ack_msg(sequence: u64) -> Msg {
    ack_packet_msg(test_packet(sequence))
}

pub fn ack_packet_msg(packet: Packet) -> Msg {
    Msg::Acknowledgement(MsgAcknowledgement {
        packet,
        acknowledgement: br#"{"result":"AQ=="}"#.to_vec(),
        proof_acked: vec![0xab],
        proof_height: 10,
        signer: "relayer".into(),
    })
}

pub fn timeout_msg(sequence: u64) -> Msg {
    Msg::Timeout(MsgTimeout {
        packet: test_packet(sequence),
        proof_unreceived: vec![0xab],
        proof_height: 10,
        next_sequence_recv: sequence,
        signer: "relayer".into(),
    })
}

pub fn timeout_on_close_msg(sequence: u64) -> Msg {
    Msg::TimeoutOnClose(MsgTimeoutOnClose {
        packet: test_packet(sequence),
        proof_unreceived: vec![0xab],
        proof_close: vec![0xcd],
        proof_height: 10,
        next_sequence_recv: sequence,
        signer: "relayer".into(),
    })
}

pub fn update_client_msg(client_id: &str) -> Msg {
    update_client_to(client_id, 10)
}

pub fn update_client_to(client_id: &str, header_height: u64) -> Msg {
    Msg::UpdateClient(MsgUpdateClient {
        client_id: client_id.to_string(),
        header: vec![0xef],
        header_height,
        signer: "relayer".into(),
    })
}

pub fn other_msg() -> Msg {
    Msg::Other(OtherMsg {
        type_url: "/cosmos.bank.v1beta1.MsgSend".into(),
        value: vec![],
    })
}
