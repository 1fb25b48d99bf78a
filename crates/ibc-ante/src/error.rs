use thiserror::Error;

pub type Result<T, E = AnteError> = std::result::Result<T, E>;

/// Errors returned by an ante stage.
#[derive(Debug, Error, PartialEq)]
pub enum AnteError {
    /// Every packet message in the transaction was a no-op against settled
    /// state. Relayers use this to tell "already relayed" apart from invalid.
    #[error("redundant relay: all packet messages in tx are no-ops")]
    RedundantTx,
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Errors surfaced by a packet or client handler invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("invalid packet: {0}")]
    InvalidPacket(String),
    #[error("invalid client identifier: {0:?}")]
    InvalidClientId(String),
    #[error("client {0} not found")]
    ClientNotFound(String),
    #[error("packet {sequence} timed out at height {timeout_height}, current height {current_height}")]
    PacketTimedOut {
        sequence: u64,
        timeout_height: u64,
        current_height: u64,
    },
    #[error("packet {sequence} timeout height {timeout_height} not reached by proof height {proof_height}")]
    TimeoutNotReached {
        sequence: u64,
        timeout_height: u64,
        proof_height: u64,
    },
    #[error("stored commitment does not match packet {0}")]
    PacketCommitmentMismatch(u64),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to decode controller params: {0}")]
    Decode(#[from] prost::DecodeError),
}
