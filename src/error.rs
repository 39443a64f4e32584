use std::io;

use thiserror::Error;

/// Rejected `ip:port` input. Never reaches the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected exactly one ':' between ip and port in {0:?}")]
    MissingSeparator(String),
    #[error("malformed IPv4 address {0:?}")]
    MalformedOctet(String),
    #[error("malformed port {0:?}")]
    MalformedPort(String),
    #[error("port {0} is out of range (1-65535)")]
    PortOutOfRange(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach host: {0}")]
    DialFailed(#[source] io::Error),
    #[error("failed to send query: {0}")]
    WriteFailed(#[source] io::Error),
    #[error("no response within {0:?}")]
    ReadTimeout(std::time::Duration),
    #[error("failed to read response: {0}")]
    ReadFailed(#[source] io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Reply is no longer than the echoed request header.
    #[error("response of {0} bytes is too short to hold a player count")]
    ShortHeader(usize),
    #[error("response ended before the player count")]
    Truncated,
}

/// Anything [crate::players::QueryClient::query_players] can fail with.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl QueryError {
    /// Whether the caller, rather than the server or network, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::Address(_))
    }
}
