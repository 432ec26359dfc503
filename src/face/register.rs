//! Prefix registration against the forwarder's RIB.
//!
//! Builds the command Interests and interprets the ControlResponse; the
//! Face driver owns the registration state machine itself.

use crate::core::constants::{
    LOCAL_COMMAND_LIFETIME, LOCAL_REGISTER_PREFIX, LOCAL_UNREGISTER_PREFIX,
    REMOTE_COMMAND_LIFETIME, REMOTE_REGISTER_PREFIX, REMOTE_UNREGISTER_PREFIX,
};
use crate::core::error::RegisterError;
use crate::wire::{Component, ControlParameters, ControlResponse, Data, Interest, Name};

/// Which RIB verb a command Interest carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibVerb {
    /// `rib/register`
    Register,
    /// `rib/unregister`
    Unregister,
}

/// Build the unsigned command Interest for `verb` on `prefix`.
///
/// Local transports use the `/localhost` command prefix and a 2 s
/// lifetime; remote transports use `/localhop` and 4 s. The encoded
/// ControlParameters ride as the next name component.
pub fn build_command_interest(verb: RibVerb, prefix: &Name, is_local: bool) -> Interest {
    let (command_prefix, lifetime) = match (verb, is_local) {
        (RibVerb::Register, true) => (LOCAL_REGISTER_PREFIX, LOCAL_COMMAND_LIFETIME),
        (RibVerb::Register, false) => (REMOTE_REGISTER_PREFIX, REMOTE_COMMAND_LIFETIME),
        (RibVerb::Unregister, true) => (LOCAL_UNREGISTER_PREFIX, LOCAL_COMMAND_LIFETIME),
        (RibVerb::Unregister, false) => (REMOTE_UNREGISTER_PREFIX, REMOTE_COMMAND_LIFETIME),
    };

    let params = ControlParameters::new(prefix.clone());
    let name = Name::from_uri(command_prefix).appended(Component::new(params.encode()));

    let mut interest = Interest::new(name);
    interest.set_lifetime(Some(lifetime));
    interest
}

/// Interpret the forwarder's reply to a registration command.
pub fn registration_outcome(data: &Data) -> Result<(), RegisterError> {
    match ControlResponse::decode(data.content()) {
        Ok(response) if response.is_success() => Ok(()),
        Ok(response) => Err(RegisterError::StatusCode(response.status_code)),
        Err(_) => Err(RegisterError::ResponseDecode),
    }
}
