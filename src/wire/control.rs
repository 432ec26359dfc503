//! NFD management protocol structures.
//!
//! Only the fields the registrar needs: Name and Flags in the request,
//! StatusCode (and StatusText, for diagnostics) in the response.

use crate::core::error::WireError;
use crate::wire::name::Name;
use crate::wire::tlv::{write_tlv, write_tlv_u64, TlvDecoder};

const TLV_CONTROL_PARAMETERS: u64 = 104;
const TLV_CONTROL_RESPONSE: u64 = 101;
const TLV_STATUS_CODE: u64 = 102;
const TLV_STATUS_TEXT: u64 = 103;
const TLV_FLAGS: u64 = 108;

/// Default route flags: CHILD_INHERIT.
pub const DEFAULT_ROUTE_FLAGS: u64 = 1;

/// Parameters of a RIB register/unregister command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlParameters {
    /// The prefix being registered.
    pub name: Name,
    /// Route flags.
    pub flags: u64,
}

impl ControlParameters {
    /// Create parameters for `name` with the default route flags.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            flags: DEFAULT_ROUTE_FLAGS,
        }
    }

    /// Encode as a ControlParameters TLV.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        self.name.encode(&mut value);
        write_tlv_u64(&mut value, TLV_FLAGS, self.flags);

        let mut wire = Vec::new();
        write_tlv(&mut wire, TLV_CONTROL_PARAMETERS, &value);
        wire
    }
}

/// A forwarder's reply to a control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    /// Numeric status; 200 is success.
    pub status_code: u64,
    /// Human-readable status, when present.
    pub status_text: String,
}

impl ControlResponse {
    /// Whether the command succeeded.
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Decode a ControlResponse TLV from `bytes` (a Data packet's content).
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut dec = TlvDecoder::new(bytes);
        let outer = dec.expect(TLV_CONTROL_RESPONSE)?;

        let mut inner = TlvDecoder::new(outer.val);
        let code_tlv = inner.expect(TLV_STATUS_CODE)?;
        let status_code = code_tlv
            .val_as_u64()
            .ok_or(WireError::MalformedElement("bad status code"))?;

        let mut status_text = String::new();
        while let Some(tlv) = inner.next()? {
            if tlv.typ == TLV_STATUS_TEXT {
                status_text = String::from_utf8_lossy(tlv.val).into_owned();
            }
        }
        Ok(Self {
            status_code,
            status_text,
        })
    }

    /// Encode as a ControlResponse TLV (used by tests standing in for a
    /// forwarder).
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        write_tlv_u64(&mut value, TLV_STATUS_CODE, self.status_code);
        if !self.status_text.is_empty() {
            write_tlv(&mut value, TLV_STATUS_TEXT, self.status_text.as_bytes());
        }
        let mut wire = Vec::new();
        write_tlv(&mut wire, TLV_CONTROL_RESPONSE, &value);
        wire
    }
}
