//! Incremental TLV element extraction from a byte stream.
//!
//! The forwarder connection delivers arbitrary chunks; this reader
//! reassembles them into complete top-level elements. At most one partial
//! element is buffered, and nothing is ever allocated for an element
//! whose declared size exceeds the packet ceiling.

use bytes::{Bytes, BytesMut};

use crate::core::constants::MAX_PACKET_SIZE;
use crate::core::error::WireError;
use crate::wire::tlv::read_varint;

/// Splits an inbound byte stream into complete TLV elements.
#[derive(Debug, Default)]
pub struct ElementReader {
    buf: BytesMut,
}

enum Header {
    /// Not enough bytes buffered to finish the header.
    NeedMore,
    /// Header decoded; the whole element spans `total` bytes.
    Complete { total: usize },
}

impl ElementReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently buffered for a partial element.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk and collect every element it completes, in order.
    ///
    /// A decode failure poisons the stream; the caller is expected to
    /// drop the connection.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, WireError> {
        self.buf.extend_from_slice(chunk);
        let mut elements = Vec::new();
        loop {
            match self.parse_header()? {
                Header::NeedMore => break,
                Header::Complete { total } => {
                    if self.buf.len() < total {
                        break;
                    }
                    elements.push(self.buf.split_to(total).freeze());
                }
            }
        }
        Ok(elements)
    }

    fn parse_header(&self) -> Result<Header, WireError> {
        if self.buf.is_empty() {
            return Ok(Header::NeedMore);
        }
        let mut cursor = 0;
        let typ = match read_varint(&self.buf, &mut cursor) {
            Ok(v) => v,
            Err(WireError::Truncated) => return Ok(Header::NeedMore),
            Err(e) => return Err(e),
        };
        if typ == 0 || typ > u32::MAX as u64 {
            return Err(WireError::MalformedElement("bad element type"));
        }
        let len = match read_varint(&self.buf, &mut cursor) {
            Ok(v) => v,
            Err(WireError::Truncated) => return Ok(Header::NeedMore),
            Err(e) => return Err(e),
        };

        let total = (len as usize)
            .checked_add(cursor)
            .ok_or(WireError::MalformedElement("element length overflow"))?;
        if total > MAX_PACKET_SIZE {
            return Err(WireError::ElementTooLarge {
                size: total,
                limit: MAX_PACKET_SIZE,
            });
        }
        Ok(Header::Complete { total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::tlv::write_tlv;

    fn element(typ: u64, val: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_tlv(&mut out, typ, val);
        out
    }

    #[test]
    fn test_whole_element_in_one_chunk() {
        let mut reader = ElementReader::new();
        let wire = element(6, b"data");
        let out = reader.push(&wire).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(&out[0][..], &wire[..]);
        assert_eq!(reader.pending(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut reader = ElementReader::new();
        let wire = element(5, &[7u8; 40]);
        for &b in &wire[..wire.len() - 1] {
            assert!(reader.push(&[b]).unwrap().is_empty());
        }
        let out = reader.push(&wire[wire.len() - 1..]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(&out[0][..], &wire[..]);
    }

    #[test]
    fn test_two_elements_one_chunk() {
        let mut reader = ElementReader::new();
        let mut wire = element(5, b"one");
        let second = element(6, b"two");
        wire.extend_from_slice(&second);

        let out = reader.push(&wire).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(&out[1][..], &second[..]);
    }

    #[test]
    fn test_element_spanning_chunks_plus_next() {
        let mut reader = ElementReader::new();
        let first = element(6, &[1u8; 100]);
        let second = element(6, &[2u8; 5]);

        let out = reader.push(&first[..50]).unwrap();
        assert!(out.is_empty());
        assert_eq!(reader.pending(), 50);

        let mut rest = first[50..].to_vec();
        rest.extend_from_slice(&second);
        let out = reader.push(&rest).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0][..], &first[..]);
        assert_eq!(&out[1][..], &second[..]);
    }

    #[test]
    fn test_oversize_element_rejected_from_header() {
        let mut reader = ElementReader::new();
        // Header declares 9000 value bytes; no payload follows yet.
        let mut header = vec![6u8, 253];
        header.extend_from_slice(&9000u16.to_be_bytes());
        match reader.push(&header) {
            Err(WireError::ElementTooLarge { size, .. }) => assert!(size > MAX_PACKET_SIZE),
            other => panic!("expected ElementTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_boundary_element_accepted() {
        let mut reader = ElementReader::new();
        // 8800 total: 1 type byte + 3 length bytes + 8796 value bytes.
        let wire = element(6, &vec![0u8; MAX_PACKET_SIZE - 4]);
        assert_eq!(wire.len(), MAX_PACKET_SIZE);
        let out = reader.push(&wire).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_zero_type_rejected() {
        let mut reader = ElementReader::new();
        assert!(reader.push(&[0u8, 2, 1, 1]).is_err());
    }
}
