// ouman-api: Async Rust client for the Ouman EH-800 heating controller

pub mod client;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod transport;

pub use client::{OumanClient, Readings, SessionState};
pub use codec::Response;
pub use endpoint::{
    Endpoint, EndpointKind, EnumKind, HomeAwayControl, OperationMode, Unit, Value,
};
pub use error::{CommunicationError, Error, ValidationError};
pub use registry::builtin::Circuit;
pub use registry::{Registry, RegistrySet};
pub use transport::TransportConfig;

// Re-export for callers building credentials.
pub use secrecy::SecretString;
