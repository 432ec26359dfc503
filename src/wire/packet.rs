//! Interest and Data packets.
//!
//! Wire layout follows the NDN TLV format with the selector block
//! (ChildSelector, MustBeFresh) used during version discovery.

use std::time::Duration;

use bytes::Bytes;

use crate::core::error::WireError;
use crate::wire::name::{Component, Name, TLV_NAME, TLV_NAME_COMPONENT};
use crate::wire::tlv::{write_tlv, write_tlv_u64, TlvDecoder};

/// TLV type of an Interest packet.
pub const TLV_INTEREST: u64 = 5;
/// TLV type of a Data packet.
pub const TLV_DATA: u64 = 6;

const TLV_SELECTORS: u64 = 9;
const TLV_NONCE: u64 = 10;
const TLV_INTEREST_LIFETIME: u64 = 12;
const TLV_CHILD_SELECTOR: u64 = 17;
const TLV_MUST_BE_FRESH: u64 = 18;
const TLV_FORWARDING_HINT: u64 = 30;

const TLV_META_INFO: u64 = 20;
const TLV_CONTENT: u64 = 21;
const TLV_SIGNATURE_INFO: u64 = 22;
const TLV_SIGNATURE_VALUE: u64 = 23;
const TLV_CONTENT_TYPE: u64 = 24;
const TLV_FRESHNESS_PERIOD: u64 = 25;
const TLV_FINAL_BLOCK_ID: u64 = 26;

/// An Interest: a request for named Data.
///
/// Mutating the name or any selector clears the nonce; a fresh nonce is
/// generated when the Interest is next encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interest {
    name: Name,
    child_selector: Option<u64>,
    must_be_fresh: bool,
    nonce: Option<[u8; 4]>,
    lifetime: Option<Duration>,
    forwarding_hint: Option<Vec<u8>>,
}

impl Interest {
    /// Create an Interest for `name`.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// The requested name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Replace the name. Clears the nonce.
    pub fn set_name(&mut self, name: Name) {
        self.name = name;
        self.nonce = None;
    }

    /// ChildSelector value (1 requests the rightmost child).
    pub fn child_selector(&self) -> Option<u64> {
        self.child_selector
    }

    /// Set or clear the ChildSelector. Clears the nonce.
    pub fn set_child_selector(&mut self, value: Option<u64>) {
        self.child_selector = value;
        self.nonce = None;
    }

    /// Whether the Interest demands fresh Data.
    pub fn must_be_fresh(&self) -> bool {
        self.must_be_fresh
    }

    /// Set MustBeFresh. Clears the nonce.
    pub fn set_must_be_fresh(&mut self, fresh: bool) {
        self.must_be_fresh = fresh;
        self.nonce = None;
    }

    /// The current nonce, if one has been generated or assigned.
    pub fn nonce(&self) -> Option<[u8; 4]> {
        self.nonce
    }

    /// InterestLifetime, if set.
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Set or clear the InterestLifetime. Clears the nonce.
    pub fn set_lifetime(&mut self, lifetime: Option<Duration>) {
        self.lifetime = lifetime;
        self.nonce = None;
    }

    /// Opaque ForwardingHint octets, if set.
    pub fn forwarding_hint(&self) -> Option<&[u8]> {
        self.forwarding_hint.as_deref()
    }

    /// Set or clear the ForwardingHint. Clears the nonce.
    pub fn set_forwarding_hint(&mut self, hint: Option<Vec<u8>>) {
        self.forwarding_hint = hint;
        self.nonce = None;
    }

    /// Encode as a top-level Interest TLV, generating a nonce if absent.
    pub fn encode(&mut self) -> Vec<u8> {
        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => {
                let nonce = rand::random();
                self.nonce = Some(nonce);
                nonce
            }
        };
        let mut value = Vec::new();
        self.name.encode(&mut value);

        if self.child_selector.is_some() || self.must_be_fresh {
            let mut selectors = Vec::new();
            if let Some(cs) = self.child_selector {
                write_tlv_u64(&mut selectors, TLV_CHILD_SELECTOR, cs);
            }
            if self.must_be_fresh {
                write_tlv(&mut selectors, TLV_MUST_BE_FRESH, &[]);
            }
            write_tlv(&mut value, TLV_SELECTORS, &selectors);
        }

        write_tlv(&mut value, TLV_NONCE, &nonce);
        if let Some(lifetime) = self.lifetime {
            write_tlv_u64(&mut value, TLV_INTEREST_LIFETIME, lifetime.as_millis() as u64);
        }
        if let Some(hint) = &self.forwarding_hint {
            write_tlv(&mut value, TLV_FORWARDING_HINT, hint);
        }

        let mut wire = Vec::new();
        write_tlv(&mut wire, TLV_INTEREST, &value);
        wire
    }

    /// Decode from the value octets of an Interest TLV.
    pub fn decode_value(value: &[u8]) -> Result<Self, WireError> {
        let mut dec = TlvDecoder::new(value);
        let name_tlv = dec.expect(TLV_NAME)?;
        let name = Name::decode_value(name_tlv.val)?;

        let mut interest = Interest::new(name);
        while let Some(tlv) = dec.next()? {
            match tlv.typ {
                TLV_SELECTORS => {
                    let mut sel = TlvDecoder::new(tlv.val);
                    while let Some(s) = sel.next()? {
                        match s.typ {
                            TLV_CHILD_SELECTOR => interest.child_selector = s.val_as_u64(),
                            TLV_MUST_BE_FRESH => interest.must_be_fresh = true,
                            _ => {}
                        }
                    }
                }
                TLV_NONCE => {
                    interest.nonce = tlv.val.try_into().ok();
                }
                TLV_INTEREST_LIFETIME => {
                    interest.lifetime = tlv.val_as_u64().map(Duration::from_millis);
                }
                TLV_FORWARDING_HINT => {
                    interest.forwarding_hint = Some(tlv.val.to_vec());
                }
                _ => {}
            }
        }
        Ok(interest)
    }

    /// Whether `data` satisfies this Interest: the Interest name must be
    /// a prefix of (or equal to) the Data name, and MustBeFresh requires
    /// the Data to carry a FreshnessPeriod.
    pub fn matches_data(&self, data: &Data) -> bool {
        if !self.name.is_prefix_of(data.name()) {
            return false;
        }
        if self.must_be_fresh && data.meta_info().freshness_period().is_none() {
            return false;
        }
        true
    }
}

/// Data packet metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    content_type: Option<u64>,
    freshness_period: Option<Duration>,
    final_block_id: Option<Component>,
}

impl MetaInfo {
    /// ContentType, if set.
    pub fn content_type(&self) -> Option<u64> {
        self.content_type
    }

    /// Set or clear the ContentType.
    pub fn set_content_type(&mut self, ct: Option<u64>) {
        self.content_type = ct;
    }

    /// FreshnessPeriod, if set.
    pub fn freshness_period(&self) -> Option<Duration> {
        self.freshness_period
    }

    /// Set or clear the FreshnessPeriod.
    pub fn set_freshness_period(&mut self, period: Option<Duration>) {
        self.freshness_period = period;
    }

    /// FinalBlockId: the name component of the final segment.
    pub fn final_block_id(&self) -> Option<&Component> {
        self.final_block_id.as_ref()
    }

    /// Set or clear the FinalBlockId.
    pub fn set_final_block_id(&mut self, id: Option<Component>) {
        self.final_block_id = id;
    }

    fn is_default(&self) -> bool {
        self.content_type.is_none()
            && self.freshness_period.is_none()
            && self.final_block_id.is_none()
    }
}

/// A Data packet: named content plus an opaque signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    name: Name,
    meta_info: MetaInfo,
    content: Bytes,
    signature_info: Vec<u8>,
    signature_value: Vec<u8>,
}

impl Data {
    /// Create a Data packet for `name`.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// The packet name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Replace the name.
    pub fn set_name(&mut self, name: Name) {
        self.name = name;
    }

    /// Packet metadata.
    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    /// Mutable packet metadata.
    pub fn meta_info_mut(&mut self) -> &mut MetaInfo {
        &mut self.meta_info
    }

    /// The content octets.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Replace the content.
    pub fn set_content(&mut self, content: impl Into<Bytes>) {
        self.content = content.into();
    }

    /// Raw SignatureInfo value octets.
    pub fn signature_info(&self) -> &[u8] {
        &self.signature_info
    }

    /// Raw SignatureValue octets.
    pub fn signature_value(&self) -> &[u8] {
        &self.signature_value
    }

    /// Install raw signature octets (SignatureInfo value, SignatureValue).
    pub fn set_signature(&mut self, info: Vec<u8>, value: Vec<u8>) {
        self.signature_info = info;
        self.signature_value = value;
    }

    /// Whether this packet's last name component equals the FinalBlockId.
    pub fn is_final_block(&self) -> bool {
        match (self.meta_info.final_block_id(), self.name.get(-1)) {
            (Some(id), Some(last)) => id == last,
            _ => false,
        }
    }

    /// Encode as a top-level Data TLV.
    pub fn encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        self.name.encode(&mut value);

        if !self.meta_info.is_default() {
            let mut meta = Vec::new();
            if let Some(ct) = self.meta_info.content_type {
                write_tlv_u64(&mut meta, TLV_CONTENT_TYPE, ct);
            }
            if let Some(period) = self.meta_info.freshness_period {
                write_tlv_u64(&mut meta, TLV_FRESHNESS_PERIOD, period.as_millis() as u64);
            }
            if let Some(id) = &self.meta_info.final_block_id {
                let mut inner = Vec::new();
                write_tlv(&mut inner, TLV_NAME_COMPONENT, id.as_bytes());
                write_tlv(&mut meta, TLV_FINAL_BLOCK_ID, &inner);
            }
            write_tlv(&mut value, TLV_META_INFO, &meta);
        }

        write_tlv(&mut value, TLV_CONTENT, &self.content);
        write_tlv(&mut value, TLV_SIGNATURE_INFO, &self.signature_info);
        write_tlv(&mut value, TLV_SIGNATURE_VALUE, &self.signature_value);

        let mut wire = Vec::new();
        write_tlv(&mut wire, TLV_DATA, &value);
        wire
    }

    /// Decode from the value octets of a Data TLV.
    pub fn decode_value(value: &[u8]) -> Result<Self, WireError> {
        let mut dec = TlvDecoder::new(value);
        let name_tlv = dec.expect(TLV_NAME)?;
        let name = Name::decode_value(name_tlv.val)?;

        let mut data = Data::new(name);
        while let Some(tlv) = dec.next()? {
            match tlv.typ {
                TLV_META_INFO => {
                    let mut meta = TlvDecoder::new(tlv.val);
                    while let Some(m) = meta.next()? {
                        match m.typ {
                            TLV_CONTENT_TYPE => data.meta_info.content_type = m.val_as_u64(),
                            TLV_FRESHNESS_PERIOD => {
                                data.meta_info.freshness_period =
                                    m.val_as_u64().map(Duration::from_millis)
                            }
                            TLV_FINAL_BLOCK_ID => {
                                let mut inner = TlvDecoder::new(m.val);
                                if let Some(c) = inner.next()? {
                                    if c.typ == TLV_NAME_COMPONENT {
                                        data.meta_info.final_block_id =
                                            Some(Component::new(c.val));
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                TLV_CONTENT => data.content = Bytes::copy_from_slice(tlv.val),
                TLV_SIGNATURE_INFO => data.signature_info = tlv.val.to_vec(),
                TLV_SIGNATURE_VALUE => data.signature_value = tlv.val.to_vec(),
                _ => {}
            }
        }
        Ok(data)
    }
}

/// A decoded top-level element.
#[derive(Debug, Clone)]
pub enum Element {
    /// An Interest packet.
    Interest(Interest),
    /// A Data packet.
    Data(Data),
}

impl Element {
    /// Decode a complete top-level TLV element.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut dec = TlvDecoder::new(bytes);
        let outer = dec
            .next()?
            .ok_or(WireError::MalformedElement("empty element"))?;
        match outer.typ {
            TLV_INTEREST => Ok(Element::Interest(Interest::decode_value(outer.val)?)),
            TLV_DATA => Ok(Element::Data(Data::decode_value(outer.val)?)),
            _ => Err(WireError::MalformedElement("unknown top-level type")),
        }
    }
}
