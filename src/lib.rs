//! Pure Rust async client for the SA-MP legacy UDP query protocol's detailed player list.
pub mod address;
pub mod error;
pub mod packet;
pub mod players;
pub mod server;
pub mod transport;
mod parse;
