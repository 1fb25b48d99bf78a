//! Transaction and message types seen by the admission pipeline.

use serde::{
    Deserialize,
    Serialize,
};

pub const RECV_PACKET_TYPE_URL: &str = "/ibc.core.channel.v1.MsgRecvPacket";
pub const ACKNOWLEDGEMENT_TYPE_URL: &str = "/ibc.core.channel.v1.MsgAcknowledgement";
pub const TIMEOUT_TYPE_URL: &str = "/ibc.core.channel.v1.MsgTimeout";
pub const TIMEOUT_ON_CLOSE_TYPE_URL: &str = "/ibc.core.channel.v1.MsgTimeoutOnClose";
pub const UPDATE_CLIENT_TYPE_URL: &str = "/ibc.core.client.v1.MsgUpdateClient";

/// An IBC packet as relayed between chains.
///
/// The protobuf encoding doubles as the commitment value stored by the
/// sending chain, see [`crate::keeper::StoreKeeper`].
#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct Packet {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(string, tag = "2")]
    pub source_port: String,
    #[prost(string, tag = "3")]
    pub source_channel: String,
    #[prost(string, tag = "4")]
    pub destination_port: String,
    #[prost(string, tag = "5")]
    pub destination_channel: String,
    #[prost(bytes = "vec", tag = "6")]
    #[serde(default)]
    pub data: Vec<u8>,
    /// Height on the destination chain after which the packet times out.
    /// Zero disables the height timeout.
    #[prost(uint64, tag = "7")]
    #[serde(default)]
    pub timeout_height: u64,
    #[prost(uint64, tag = "8")]
    #[serde(default)]
    pub timeout_timestamp: u64,
}

impl Packet {
    pub fn new(
        sequence: u64,
        source: (&str, &str),
        destination: (&str, &str),
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            sequence,
            source_port: source.0.to_string(),
            source_channel: source.1.to_string(),
            destination_port: destination.0.to_string(),
            destination_channel: destination.1.to_string(),
            data: data.into(),
            timeout_height: 0,
            timeout_timestamp: 0,
        }
    }

    pub fn with_timeout_height(mut self, timeout_height: u64) -> Self {
        self.timeout_height = timeout_height;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRecvPacket {
    pub packet: Packet,
    #[serde(default)]
    pub proof_commitment: Vec<u8>,
    pub proof_height: u64,
    pub signer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAcknowledgement {
    pub packet: Packet,
    pub acknowledgement: Vec<u8>,
    #[serde(default)]
    pub proof_acked: Vec<u8>,
    pub proof_height: u64,
    pub signer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTimeout {
    pub packet: Packet,
    #[serde(default)]
    pub proof_unreceived: Vec<u8>,
    pub proof_height: u64,
    pub next_sequence_recv: u64,
    pub signer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTimeoutOnClose {
    pub packet: Packet,
    #[serde(default)]
    pub proof_unreceived: Vec<u8>,
    #[serde(default)]
    pub proof_close: Vec<u8>,
    pub proof_height: u64,
    pub next_sequence_recv: u64,
    pub signer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateClient {
    pub client_id: String,
    #[serde(default)]
    pub header: Vec<u8>,
    /// Height of the consensus state carried by `header`.
    pub header_height: u64,
    pub signer: String,
}

/// Any message that is neither a packet relay nor a client update, kept as
/// an opaque `Any`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherMsg {
    pub type_url: String,
    #[serde(default)]
    pub value: Vec<u8>,
}

/// A transaction message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    RecvPacket(MsgRecvPacket),
    Acknowledgement(MsgAcknowledgement),
    Timeout(MsgTimeout),
    TimeoutOnClose(MsgTimeoutOnClose),
    UpdateClient(MsgUpdateClient),
    Other(OtherMsg),
}

/// Role of a message from the point of view of the redundancy filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgKind {
    PacketRelay,
    ClientUpdate,
    Other,
}

impl Msg {
    pub fn kind(&self) -> MsgKind {
        match self {
            Msg::RecvPacket(_)
            | Msg::Acknowledgement(_)
            | Msg::Timeout(_)
            | Msg::TimeoutOnClose(_) => MsgKind::PacketRelay,
            Msg::UpdateClient(_) => MsgKind::ClientUpdate,
            Msg::Other(_) => MsgKind::Other,
        }
    }

    pub fn type_url(&self) -> &str {
        match self {
            Msg::RecvPacket(_) => RECV_PACKET_TYPE_URL,
            Msg::Acknowledgement(_) => ACKNOWLEDGEMENT_TYPE_URL,
            Msg::Timeout(_) => TIMEOUT_TYPE_URL,
            Msg::TimeoutOnClose(_) => TIMEOUT_ON_CLOSE_TYPE_URL,
            Msg::UpdateClient(_) => UPDATE_CLIENT_TYPE_URL,
            Msg::Other(other) => &other.type_url,
        }
    }

    /// The packet carried by a packet-relay message.
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Msg::RecvPacket(msg) => Some(&msg.packet),
            Msg::Acknowledgement(msg) => Some(&msg.packet),
            Msg::Timeout(msg) => Some(&msg.packet),
            Msg::TimeoutOnClose(msg) => Some(&msg.packet),
            Msg::UpdateClient(_) | Msg::Other(_) => None,
        }
    }
}

/// An ordered list of messages submitted together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub msgs: Vec<Msg>,
}

impl Tx {
    pub fn new(msgs: Vec<Msg>) -> Self {
        Self { msgs }
    }

    pub fn msgs(&self) -> &[Msg] {
        &self.msgs
    }
}

/// Outcome of running a packet-relay handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerResult {
    /// The handler changed state.
    Applied,
    /// The packet was already settled, nothing changed.
    NoOp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet() -> Packet {
        Packet::new(1, ("transfer", "channel-0"), ("transfer", "channel-1"), b"data".to_vec())
    }

    #[test]
    fn test_kind_classifies_every_variant() {
        let recv = Msg::RecvPacket(MsgRecvPacket {
            packet: packet(),
            proof_commitment: vec![],
            proof_height: 1,
            signer: "relayer".into(),
        });
        let ack = Msg::Acknowledgement(MsgAcknowledgement {
            packet: packet(),
            acknowledgement: vec![1],
            proof_acked: vec![],
            proof_height: 1,
            signer: "relayer".into(),
        });
        let update = Msg::UpdateClient(MsgUpdateClient {
            client_id: "07-tendermint-0".into(),
            header: vec![],
            header_height: 5,
            signer: "relayer".into(),
        });
        let other = Msg::Other(OtherMsg {
            type_url: "/cosmos.bank.v1beta1.MsgSend".into(),
            value: vec![],
        });

        assert_eq!(recv.kind(), MsgKind::PacketRelay);
        assert_eq!(ack.kind(), MsgKind::PacketRelay);
        assert_eq!(update.kind(), MsgKind::ClientUpdate);
        assert_eq!(other.kind(), MsgKind::Other);

        assert_eq!(recv.type_url(), RECV_PACKET_TYPE_URL);
        assert_eq!(other.type_url(), "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(ack.packet(), Some(&packet()));
        assert!(update.packet().is_none());
    }

    #[test]
    fn test_msg_json_is_tagged() {
        let msg = Msg::Other(OtherMsg {
            type_url: "/cosmos.bank.v1beta1.MsgSend".into(),
            value: vec![],
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "other");

        let back: Msg = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
