//! Core constants and error types (always included).

pub mod constants;
pub mod error;

pub use constants::*;
pub use error::{FaceError, FetchError, RegisterError, SignError, WireError};
