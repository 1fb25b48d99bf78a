//! Interchain accounts controller parameters.
//!
//! Governance reads and writes these through the standard protobuf codec:
//! `controller_enabled` is field 1, a varint-encoded bool. Following proto3
//! rules a disabled controller encodes to zero bytes.

use prost::Message;
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::ParamsError;

pub const DEFAULT_CONTROLLER_ENABLED: bool = true;

#[derive(Clone, PartialEq, Message)]
struct ParamsProto {
    #[prost(bool, tag = "1")]
    controller_enabled: bool,
}

/// Controller submodule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Enables or disables the controller submodule.
    #[serde(default = "default_controller_enabled")]
    pub controller_enabled: bool,
}

const fn default_controller_enabled() -> bool {
    DEFAULT_CONTROLLER_ENABLED
}

impl Default for Params {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROLLER_ENABLED)
    }
}

impl Params {
    pub fn new(controller_enabled: bool) -> Self {
        Self { controller_enabled }
    }

    /// Encodes the params with the protobuf wire format.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }

    /// Length of [`Params::encode_to_vec`] without encoding.
    pub fn encoded_len(&self) -> usize {
        self.to_proto().encoded_len()
    }

    /// Decodes params from their protobuf encoding. Unknown fields are skipped.
    pub fn decode(bytes: &[u8]) -> Result<Self, ParamsError> {
        let proto = ParamsProto::decode(bytes)?;
        Ok(Self::new(proto.controller_enabled))
    }

    fn to_proto(self) -> ParamsProto {
        ParamsProto {
            controller_enabled: self.controller_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_controller() {
        assert!(Params::default().controller_enabled);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(Params::new(true).encode_to_vec(), vec![0x08, 0x01]);
        assert_eq!(Params::new(true).encoded_len(), 2);
        assert!(Params::new(false).encode_to_vec().is_empty());
        assert_eq!(Params::new(false).encoded_len(), 0);
    }

    #[test]
    fn test_decode() {
        assert_eq!(Params::decode(&[0x08, 0x01]).unwrap(), Params::new(true));
        assert_eq!(Params::decode(&[0x08, 0x00]).unwrap(), Params::new(false));
        assert_eq!(Params::decode(&[]).unwrap(), Params::new(false));
        // Unknown field 2 (varint) is skipped.
        assert_eq!(
            Params::decode(&[0x10, 0x05, 0x08, 0x01]).unwrap(),
            Params::new(true)
        );
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            Params::decode(&[0x08]),
            Err(ParamsError::Decode(_))
        ));
    }

    #[test]
    fn test_json() {
        let params: Params = serde_json::from_str(r#"{"controller_enabled":false}"#).unwrap();
        assert_eq!(params, Params::new(false));

        let params: Params = serde_json::from_str("{}").unwrap();
        assert_eq!(params, Params::default());
    }
}
