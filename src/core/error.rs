//! Error types for the NDN client runtime.

use thiserror::Error;

/// Errors produced while encoding or decoding wire elements.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A TLV header could not be decoded.
    #[error("malformed element: {0}")]
    MalformedElement(&'static str),

    /// A top-level element exceeds the maximum NDN packet size.
    #[error("element of {size} bytes exceeds the {limit}-byte packet ceiling")]
    ElementTooLarge {
        /// Declared element size.
        size: usize,
        /// The enforced ceiling.
        limit: usize,
    },

    /// Unexpected end of input inside a TLV value.
    #[error("truncated element")]
    Truncated,

    /// A varint was not minimally encoded.
    #[error("non-minimal varint encoding")]
    NonMinimalVarint,
}

/// Errors raised synchronously by Face operations.
#[derive(Debug, Error)]
pub enum FaceError {
    /// The Face is closed; no operation may proceed.
    #[error("face is not connected")]
    NotConnected,

    /// No keychain or certificate name has been configured.
    #[error("command signing info is not configured")]
    NotConfigured,

    /// The encoded packet exceeds the maximum NDN packet size.
    #[error("encoded packet of {0} bytes exceeds the packet ceiling")]
    EncodedTooLarge(usize),

    /// Wire-level failure.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Every configured endpoint failed to connect.
    #[error("exhausted all forwarder endpoints")]
    HostExhausted,
}

/// Why a prefix registration failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// The forwarder answered with a non-success status code.
    #[error("forwarder rejected registration with status {0}")]
    StatusCode(u64),

    /// The forwarder's response could not be decoded.
    #[error("could not decode control response")]
    ResponseDecode,

    /// The command Interest timed out.
    #[error("registration command timed out")]
    Timeout,
}

/// Errors raised by the segment and pipelined fetchers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An Interest went unanswered past its lifetime (and any retry cap).
    #[error("interest timed out")]
    InterestTimeout,

    /// The application's verification hook rejected a segment.
    #[error("segment failed verification")]
    SegmentVerificationFailed,

    /// A response's name does not end in a segment number.
    #[error("data name carries no segment number")]
    DataHasNoSegment,

    /// The Face failed underneath the fetcher.
    #[error("face error: {0}")]
    Face(#[from] FaceError),

    /// The Face was closed while a fetch was outstanding.
    #[error("face closed during fetch")]
    FaceClosed,
}

/// Failure reported by a keychain when signing a command Interest.
#[derive(Debug, Error, Clone)]
#[error("signing failed: {0}")]
pub struct SignError(pub String);
