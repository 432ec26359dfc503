//! NDN wire formats: TLV primitives, names, packets, and NFD control
//! structures.

pub mod control;
pub mod name;
pub mod packet;
pub mod tlv;

pub use control::{ControlParameters, ControlResponse};
pub use name::{Component, Name};
pub use packet::{Data, Element, Interest, MetaInfo};
