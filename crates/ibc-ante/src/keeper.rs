//! Packet and client handlers invoked by the ante stages.

use std::sync::Arc;

use prost::Message;
use tracing::{
    debug,
    trace,
};

use crate::{
    context::Context,
    error::HandlerError,
    primitives::{
        HandlerResult,
        MsgAcknowledgement,
        MsgRecvPacket,
        MsgTimeout,
        MsgTimeoutOnClose,
        MsgUpdateClient,
        Packet,
    },
    store::KvStore,
};

/// Executes IBC handlers against an execution context.
///
/// Packet handlers report [`HandlerResult::NoOp`] when the packet was
/// already settled, which is what the redundancy filter keys on.
pub trait HandlerInvoker: Send + Sync {
    fn recv_packet(
        &self,
        ctx: &mut Context,
        msg: &MsgRecvPacket,
    ) -> Result<HandlerResult, HandlerError>;

    fn acknowledgement(
        &self,
        ctx: &mut Context,
        msg: &MsgAcknowledgement,
    ) -> Result<HandlerResult, HandlerError>;

    fn timeout(&self, ctx: &mut Context, msg: &MsgTimeout) -> Result<HandlerResult, HandlerError>;

    fn timeout_on_close(
        &self,
        ctx: &mut Context,
        msg: &MsgTimeoutOnClose,
    ) -> Result<HandlerResult, HandlerError>;

    fn update_client(&self, ctx: &mut Context, msg: &MsgUpdateClient) -> Result<(), HandlerError>;
}

impl<T: HandlerInvoker + ?Sized> HandlerInvoker for Arc<T> {
    fn recv_packet(
        &self,
        ctx: &mut Context,
        msg: &MsgRecvPacket,
    ) -> Result<HandlerResult, HandlerError> {
        (**self).recv_packet(ctx, msg)
    }

    fn acknowledgement(
        &self,
        ctx: &mut Context,
        msg: &MsgAcknowledgement,
    ) -> Result<HandlerResult, HandlerError> {
        (**self).acknowledgement(ctx, msg)
    }

    fn timeout(&self, ctx: &mut Context, msg: &MsgTimeout) -> Result<HandlerResult, HandlerError> {
        (**self).timeout(ctx, msg)
    }

    fn timeout_on_close(
        &self,
        ctx: &mut Context,
        msg: &MsgTimeoutOnClose,
    ) -> Result<HandlerResult, HandlerError> {
        (**self).timeout_on_close(ctx, msg)
    }

    fn update_client(&self, ctx: &mut Context, msg: &MsgUpdateClient) -> Result<(), HandlerError> {
        (**self).update_client(ctx, msg)
    }
}

pub fn packet_receipt_key(port: &str, channel: &str, sequence: u64) -> Vec<u8> {
    format!("receipts/ports/{port}/channels/{channel}/sequences/{sequence}").into_bytes()
}

pub fn packet_commitment_key(port: &str, channel: &str, sequence: u64) -> Vec<u8> {
    format!("commitments/ports/{port}/channels/{channel}/sequences/{sequence}").into_bytes()
}

pub fn client_height_key(client_id: &str) -> Vec<u8> {
    format!("clients/{client_id}/height").into_bytes()
}

/// Receipt value written on first receive.
const RECEIPT: &[u8] = &[1];

/// Handler set backed by the context store.
///
/// Tracks packet receipts, packet commitments and client heights, which is
/// enough to decide whether a relay is a first arrival or a duplicate.
/// Proofs carried by the messages are not verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreKeeper;

impl StoreKeeper {
    pub fn new() -> Self {
        Self
    }

    /// Records the commitment for an outgoing packet.
    pub fn send_packet(&self, ctx: &mut Context, packet: &Packet) -> Result<(), HandlerError> {
        validate_packet(packet)?;
        let key = packet_commitment_key(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        ctx.store_mut().set(key, packet.encode_to_vec());
        Ok(())
    }

    pub fn create_client(
        &self,
        ctx: &mut Context,
        client_id: &str,
        height: u64,
    ) -> Result<(), HandlerError> {
        validate_client_id(client_id)?;
        ctx.store_mut()
            .set(client_height_key(client_id), height.to_be_bytes().to_vec());
        Ok(())
    }

    pub fn client_height(&self, ctx: &Context, client_id: &str) -> Option<u64> {
        let raw = ctx.store().get(&client_height_key(client_id))?;
        let bytes: [u8; 8] = raw.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Clears the commitment of a packet sent from this chain.
    fn settle_commitment(
        &self,
        ctx: &mut Context,
        packet: &Packet,
    ) -> Result<HandlerResult, HandlerError> {
        let key = packet_commitment_key(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        let Some(stored) = ctx.store().get(&key) else {
            return Ok(HandlerResult::NoOp);
        };
        if stored != packet.encode_to_vec() {
            return Err(HandlerError::PacketCommitmentMismatch(packet.sequence));
        }
        ctx.store_mut().delete(key);
        Ok(HandlerResult::Applied)
    }
}

fn validate_packet(packet: &Packet) -> Result<(), HandlerError> {
    if packet.sequence == 0 {
        return Err(HandlerError::InvalidPacket("sequence cannot be 0".into()));
    }
    let identifiers = [
        &packet.source_port,
        &packet.source_channel,
        &packet.destination_port,
        &packet.destination_channel,
    ];
    if identifiers.iter().any(|id| id.is_empty()) {
        return Err(HandlerError::InvalidPacket(
            "port and channel identifiers cannot be empty".into(),
        ));
    }
    Ok(())
}

fn validate_client_id(client_id: &str) -> Result<(), HandlerError> {
    if client_id.is_empty() || client_id.contains('/') {
        return Err(HandlerError::InvalidClientId(client_id.to_string()));
    }
    Ok(())
}

impl HandlerInvoker for StoreKeeper {
    fn recv_packet(
        &self,
        ctx: &mut Context,
        msg: &MsgRecvPacket,
    ) -> Result<HandlerResult, HandlerError> {
        let packet = &msg.packet;
        validate_packet(packet)?;

        if packet.timeout_height != 0 && ctx.block_height() >= packet.timeout_height {
            return Err(HandlerError::PacketTimedOut {
                sequence: packet.sequence,
                timeout_height: packet.timeout_height,
                current_height: ctx.block_height(),
            });
        }

        let key = packet_receipt_key(
            &packet.destination_port,
            &packet.destination_channel,
            packet.sequence,
        );
        if ctx.store().has(&key) {
            debug!(target: "ibc_ante::keeper", sequence = packet.sequence, channel = %packet.destination_channel, "Packet already received");
            return Ok(HandlerResult::NoOp);
        }

        trace!(target: "ibc_ante::keeper", sequence = packet.sequence, "Writing packet receipt");
        ctx.store_mut().set(key, RECEIPT);
        Ok(HandlerResult::Applied)
    }

    fn acknowledgement(
        &self,
        ctx: &mut Context,
        msg: &MsgAcknowledgement,
    ) -> Result<HandlerResult, HandlerError> {
        validate_packet(&msg.packet)?;
        if msg.acknowledgement.is_empty() {
            return Err(HandlerError::InvalidPacket(
                "acknowledgement cannot be empty".into(),
            ));
        }
        self.settle_commitment(ctx, &msg.packet)
    }

    fn timeout(&self, ctx: &mut Context, msg: &MsgTimeout) -> Result<HandlerResult, HandlerError> {
        let packet = &msg.packet;
        validate_packet(packet)?;

        // Settled packets stay no-ops even if the timeout proof is stale.
        let key = packet_commitment_key(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        );
        if !ctx.store().has(&key) {
            return Ok(HandlerResult::NoOp);
        }

        if packet.timeout_height == 0 || msg.proof_height < packet.timeout_height {
            return Err(HandlerError::TimeoutNotReached {
                sequence: packet.sequence,
                timeout_height: packet.timeout_height,
                proof_height: msg.proof_height,
            });
        }
        self.settle_commitment(ctx, packet)
    }

    fn timeout_on_close(
        &self,
        ctx: &mut Context,
        msg: &MsgTimeoutOnClose,
    ) -> Result<HandlerResult, HandlerError> {
        validate_packet(&msg.packet)?;
        self.settle_commitment(ctx, &msg.packet)
    }

    fn update_client(&self, ctx: &mut Context, msg: &MsgUpdateClient) -> Result<(), HandlerError> {
        validate_client_id(&msg.client_id)?;
        let current = self
            .client_height(ctx, &msg.client_id)
            .ok_or_else(|| HandlerError::ClientNotFound(msg.client_id.clone()))?;

        if msg.header_height > current {
            trace!(target: "ibc_ante::keeper", client_id = %msg.client_id, from = current, to = msg.header_height, "Updating client height");
            ctx.store_mut().set(
                client_height_key(&msg.client_id),
                msg.header_height.to_be_bytes().to_vec(),
            );
        }
        Ok(())
    }
}
