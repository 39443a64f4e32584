use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::address::AddressSpec;
use crate::error::QueryError;
use crate::packet::{PacketCodec, PlayerRecord, DEFAULT_PING_WIDTH, HEADER_LEN};
use crate::transport::{Transport, UdpTransport};

/// Tunables for [QueryClient].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Bound on binding plus connecting the socket, and separately on the send.
    pub dial_timeout: Duration,
    /// Bound on waiting for the reply.
    pub read_timeout: Duration,
    /// Largest reply accepted; anything beyond is cut off by the socket.
    pub max_response_size: usize,
    /// Bytes of ping trailing each player entry.
    pub ping_width: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            dial_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
            max_response_size: 2048,
            ping_width: DEFAULT_PING_WIDTH,
        }
    }
}

/// Queries servers for their player roster.
///
/// Holds no per-query state, so one client can serve any number of concurrent queries.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    codec: PacketCodec,
}

impl QueryClient {
    pub fn new(config: &QueryConfig) -> Self {
        let transport = UdpTransport::new(
            config.dial_timeout,
            config.read_timeout,
            config.max_response_size.max(HEADER_LEN + 1),
        );
        let codec = PacketCodec::with_ping_width(config.ping_width);
        QueryClient::with_transport(Arc::new(transport), codec)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, codec: PacketCodec) -> Self {
        QueryClient { transport, codec }
    }

    /// Query `host` (`ip:port`) for its detailed player list.
    ///
    /// Example usage:
    /// ```no_run
    /// # async fn run() -> Result<(), sampquery::error::QueryError> {
    /// use sampquery::players::{QueryClient, QueryConfig};
    ///
    /// let client = QueryClient::new(&QueryConfig::default());
    /// for player in client.query_players("127.0.0.1:7777").await? {
    ///     println!("{} {} {}", player.id, player.name, player.score);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query_players(&self, host: &str) -> Result<Vec<PlayerRecord>, QueryError> {
        let target: AddressSpec = AddressSpec::parse(host)?;
        let packet = self.codec.encode(&target);

        debug!("querying {target} for players");
        let reply: Vec<u8> = self.transport.exchange(&target, &packet).await?;

        Ok(self.codec.decode(&reply)?)
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        QueryClient::new(&QueryConfig::default())
    }
}
