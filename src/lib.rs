//! # ndn-client
//!
//! Client runtime for Named Data Networking (NDN) endpoints.
//!
//! An application opens a [`Face`] to a forwarder over a byte-stream
//! transport (TCP, Unix domain socket, or WebSocket), expresses
//! Interests, and receives Data. On top of the Face sit two fetchers:
//! a sequential one that discovers an object's latest version, and a
//! pipelined one that keeps a congestion-controlled window of Interests
//! in flight.
//!
//! - **Multiplexing**: one connection carries all Interest/Data traffic;
//!   a pending-interest table routes responses to callbacks
//! - **Cooperative scheduling**: all callbacks run on one driver task;
//!   there is no user-visible concurrency inside a Face
//! - **Prefix registration**: signed command Interests speak NFD's RIB
//!   management protocol
//! - **Congestion control**: AIMD window with fast retransmit for bulk
//!   segment downloads
//!
//! ## Modules
//!
//! - [`core`]: constants and error types
//! - [`wire`]: TLV codec, names, Interest/Data, NFD control structures
//! - [`transport`]: endpoints, duplex channels, element framing
//! - [`face`]: the Face, its tables, command signing, registration
//! - [`fetch`]: sequential and pipelined segment fetchers
//!
//! ## Example
//!
//! ```no_run
//! use ndn_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let face = Face::new(FaceConfig::new().endpoint(Endpoint::tcp("localhost")));
//!
//!     let interest = Interest::new(Name::from_uri("/example/app/object"));
//!     face.express_interest(
//!         &interest,
//!         |_interest, data| println!("got {} bytes", data.content().len()),
//!         |interest| println!("{} timed out", interest.name()),
//!     )?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;
pub mod face;
pub mod fetch;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod testutil;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::error::{FaceError, FetchError, RegisterError, SignError, WireError};
    pub use crate::face::command::{CommandInterestGenerator, KeyChain};
    pub use crate::face::tables::InterestFilter;
    pub use crate::face::{Face, FaceConfig};
    pub use crate::transport::{Endpoint, Transport};
    pub use crate::wire::{Component, Data, Element, Interest, MetaInfo, Name};
}

pub use crate::core::error::{FaceError, FetchError, RegisterError, SignError, WireError};
pub use face::{Face, FaceConfig};
pub use transport::Endpoint;
pub use wire::{Component, Data, Interest, MetaInfo, Name};
