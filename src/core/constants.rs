//! Protocol constants for the NDN client runtime.
//!
//! Values fixed by the NDN packet format or by NFD's management protocol.

use std::time::Duration;

// =============================================================================
// PACKET LIMITS
// =============================================================================

/// Maximum size of a top-level TLV element (Interest or Data) on the wire.
///
/// Elements larger than this are rejected on both the send and receive
/// paths; the element reader never allocates past this ceiling.
pub const MAX_PACKET_SIZE: usize = 8800;

// =============================================================================
// INTEREST DEFAULTS
// =============================================================================

/// InterestLifetime applied when the application leaves it unset.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_millis(4000);

/// Interest nonce size in bytes.
pub const NONCE_SIZE: usize = 4;

// =============================================================================
// FORWARDER COMMAND PROTOCOL
// =============================================================================

/// RIB register command prefix used over a local transport.
pub const LOCAL_REGISTER_PREFIX: &str = "/localhost/nfd/rib/register";

/// RIB register command prefix used over a remote transport.
pub const REMOTE_REGISTER_PREFIX: &str = "/localhop/nfd/rib/register";

/// RIB unregister command prefix used over a local transport.
pub const LOCAL_UNREGISTER_PREFIX: &str = "/localhost/nfd/rib/unregister";

/// RIB unregister command prefix used over a remote transport.
pub const REMOTE_UNREGISTER_PREFIX: &str = "/localhop/nfd/rib/unregister";

/// Command Interest lifetime over a local transport.
pub const LOCAL_COMMAND_LIFETIME: Duration = Duration::from_millis(2000);

/// Command Interest lifetime over a remote transport.
pub const REMOTE_COMMAND_LIFETIME: Duration = Duration::from_millis(4000);

/// Size of the timestamp component appended to command Interests.
pub const COMMAND_TIMESTAMP_SIZE: usize = 8;

/// Size of the random nonce component appended to command Interests.
pub const COMMAND_NONCE_SIZE: usize = 8;

// =============================================================================
// RESERVED NAME SPACE
// =============================================================================

/// Interests under this prefix schedule a delayed callback and are never
/// sent on the wire.
pub const LOCAL_TIMEOUT_PREFIX: &str = "/local/timeout";

// =============================================================================
// DEFAULT ENDPOINTS
// =============================================================================

/// NFD's Unix domain socket path.
pub const NFD_UNIX_SOCKET: &str = "/var/run/nfd.sock";

/// Fallback Unix domain socket path (ndnd).
pub const NDND_UNIX_SOCKET: &str = "/tmp/.ndnd.sock";

/// Default TCP port of an NDN forwarder.
pub const DEFAULT_TCP_PORT: u16 = 6363;

/// Default WebSocket port of an NDN forwarder.
pub const DEFAULT_WS_PORT: u16 = 9696;

// =============================================================================
// PIPELINED FETCHER
// =============================================================================

/// Hard cap on the send window, in segments.
pub const MAX_WINDOW: u64 = 32;

/// Number of slots in the out-of-order ring.
pub const OOO_RING_SIZE: usize = 128;

/// Consecutive out-of-order arrivals that trigger a fast retransmit.
pub const FAST_RETRANSMIT_THRESHOLD: u32 = 3;

/// Per-segment retransmissions before the fetch is aborted.
pub const MAX_RETRANSMITS: u32 = 5;
