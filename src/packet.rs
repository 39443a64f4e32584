use std::borrow::Cow;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use serde::{Serialize, Serializer};

use crate::address::AddressSpec;
use crate::error::ProtocolError;
use crate::parse::{get_bytes, get_i32, get_u8};

/// Every request and response starts with these four bytes.
pub const MAGIC: &[u8; 4] = b"SAMP";

/// Magic, 4 IP octets, 2 port bytes, opcode.
pub const HEADER_LEN: usize = 11;

/// Width of the ping field trailing each player entry in the canonical protocol.
pub const DEFAULT_PING_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Detailed player list: name, score and ping for every connected player.
    DetailedPlayers,
}

/// Convert a u8 into an [Opcode].
impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'd' => Ok(Opcode::DetailedPlayers),
            n => Err(n),
        }
    }
}

/// For packing an [Opcode] into a packet in [RequestPacket::pack].
impl Opcode {
    pub fn to_byte(&self) -> u8 {
        match self {
            Opcode::DetailedPlayers => b'd', // 0x64
        }
    }
}

/// The 11-byte query sent to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPacket {
    target: AddressSpec,
    opcode: Opcode,
}

impl RequestPacket {
    pub fn new(target: AddressSpec) -> Self {
        RequestPacket {
            target,
            opcode: Opcode::DetailedPlayers,
        }
    }

    /// Serializes a request packet into its fixed wire form.
    pub fn pack(&self) -> [u8; HEADER_LEN] {
        // packet structure: magic, ip, port (LE), opcode
        let mut payload = [0u8; HEADER_LEN];
        payload[0..4].copy_from_slice(MAGIC);
        payload[4..8].copy_from_slice(&self.target.octets());
        LittleEndian::write_u16(&mut payload[8..10], self.target.port());
        payload[10] = self.opcode.to_byte();

        payload
    }

    pub fn target(&self) -> &AddressSpec {
        &self.target
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }
}

/// A reply split into its echoed header and payload.
#[derive(Debug, PartialEq, Eq)]
pub struct ResponsePacket<'a> {
    header: &'a [u8],
    body: &'a [u8],
}

impl<'a> ResponsePacket<'a> {
    const IP_RANGE: std::ops::Range<usize> = 4..8;
    const PORT_RANGE: std::ops::Range<usize> = 8..10;
    const OPCODE_OFFSET: usize = 10;

    /// Splits an incoming datagram. Only the length is checked; the echo
    /// itself is not compared against the request.
    pub fn unpack(incoming: &'a [u8]) -> Result<Self, ProtocolError> {
        if incoming.len() <= HEADER_LEN {
            return Err(ProtocolError::ShortHeader(incoming.len()));
        }
        let (header, body) = incoming.split_at(HEADER_LEN);

        Ok(ResponsePacket { header, body })
    }

    pub fn echoed_octets(&self) -> [u8; 4] {
        let mut octets = [0u8; 4];
        octets.copy_from_slice(&self.header[Self::IP_RANGE]);
        octets
    }

    pub fn echoed_port(&self) -> u16 {
        LittleEndian::read_u16(&self.header[Self::PORT_RANGE])
    }

    pub fn echoed_opcode(&self) -> Result<Opcode, u8> {
        Opcode::try_from(self.header[Self::OPCODE_OFFSET])
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}

/// A player name exactly as the server sent it.
///
/// Servers commonly send names in a legacy code page, so the bytes are kept
/// as-is and only converted (lossily) when displayed or serialized.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(Vec<u8>);

impl PlayerName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&[u8]> for PlayerName {
    fn from(bytes: &[u8]) -> Self {
        PlayerName(bytes.to_vec())
    }
}

impl PartialEq<&str> for PlayerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Debug for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl Serialize for PlayerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// One entry of a decoded roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    /// Position in the reply, not an in-game player slot.
    pub id: usize,
    #[serde(rename = "playername")]
    pub name: PlayerName,
    pub score: i32,
}

/// Encodes player-list queries and decodes their replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCodec {
    ping_width: usize,
}

impl Default for PacketCodec {
    fn default() -> Self {
        PacketCodec {
            ping_width: DEFAULT_PING_WIDTH,
        }
    }
}

impl PacketCodec {
    /// A codec for servers whose per-player ping field is `ping_width` bytes (0 if absent).
    pub fn with_ping_width(ping_width: usize) -> Self {
        PacketCodec { ping_width }
    }

    pub fn ping_width(&self) -> usize {
        self.ping_width
    }

    pub fn encode(&self, target: &AddressSpec) -> [u8; HEADER_LEN] {
        RequestPacket::new(*target).pack()
    }

    /// Decode a raw reply into a roster.
    ///
    /// Only a reply too short to hold a player count is an error. A reply cut off
    /// mid-roster yields the players read before the cut.
    pub fn decode(&self, incoming: &[u8]) -> Result<Vec<PlayerRecord>, ProtocolError> {
        let packet = ResponsePacket::unpack(incoming)?;
        let data: &[u8] = packet.body();
        let mut offset: usize = 0;

        let count: u8 = get_u8(data, &mut offset).ok_or(ProtocolError::Truncated)?;
        let mut players: Vec<PlayerRecord> = Vec::with_capacity(count as usize);

        for id in 0..count as usize {
            let Some(player) = read_player(data, &mut offset, id) else {
                break;
            };
            players.push(player);

            // the ping is never exposed, but a missing one ends the roster
            if get_bytes(data, &mut offset, self.ping_width).is_none() {
                break;
            }
        }

        if players.len() < count as usize {
            warn!(
                "truncated roster: server announced {} players, decoded {}",
                count,
                players.len()
            );
        } else {
            debug!("decoded {} players", players.len());
        }

        Ok(players)
    }
}

fn read_player(data: &[u8], offset: &mut usize, id: usize) -> Option<PlayerRecord> {
    let name_len: u8 = get_u8(data, offset)?;
    let name: &[u8] = get_bytes(data, offset, name_len as usize)?;
    let score: i32 = get_i32(data, offset)?;

    Some(PlayerRecord {
        id,
        name: PlayerName::from(name),
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(host: &str) -> AddressSpec {
        AddressSpec::parse(host).unwrap()
    }

    fn header() -> Vec<u8> {
        RequestPacket::new(spec("127.0.0.1:7777")).pack().to_vec()
    }

    fn push_player(buf: &mut Vec<u8>, name: &[u8], score: i32, ping: u32) {
        buf.push(name.len() as u8);
        buf.extend_from_slice(name);
        buf.extend_from_slice(&score.to_le_bytes());
        buf.extend_from_slice(&ping.to_le_bytes());
    }

    fn alice_and_bob() -> Vec<u8> {
        let mut buf = header();
        buf.push(2);
        push_player(&mut buf, b"Alice", -5, 40);
        push_player(&mut buf, b"Bob", 1200, 85);
        buf
    }

    #[test]
    fn packs_request_header() {
        let request = RequestPacket::new(spec("192.168.1.20:7777"));
        assert_eq!(request.target().to_string(), "192.168.1.20:7777");
        assert_eq!(request.opcode(), Opcode::DetailedPlayers);

        let packet = request.pack();
        assert_eq!(
            packet,
            [b'S', b'A', b'M', b'P', 192, 168, 1, 20, 0x61, 0x1e, b'd']
        );
    }

    #[test]
    fn request_header_fields_survive_the_echo() {
        let hosts = ["0.0.0.0:1", "10.20.30.40:7777", "255.255.255.255:65535", "1.2.3.4:256"];
        for host in hosts {
            let target = spec(host);
            let mut reply = PacketCodec::default().encode(&target).to_vec();
            reply.push(0);

            let echoed = ResponsePacket::unpack(&reply).unwrap();
            assert_eq!(echoed.echoed_octets(), target.octets());
            assert_eq!(echoed.echoed_port(), target.port());
            assert_eq!(echoed.echoed_opcode(), Ok(Opcode::DetailedPlayers));
        }
    }

    #[test]
    fn decodes_two_players() {
        let players = PacketCodec::default().decode(&alice_and_bob()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, 0);
        assert_eq!(players[0].name, "Alice");
        assert_eq!(players[0].score, -5);
        assert_eq!(players[1].id, 1);
        assert_eq!(players[1].name, "Bob");
        assert_eq!(players[1].score, 1200);
    }

    #[test]
    fn empty_roster_is_not_an_error() {
        let mut buf = header();
        buf.push(0);
        assert_eq!(PacketCodec::default().decode(&buf), Ok(vec![]));
    }

    #[test]
    fn short_header_is_rejected() {
        let codec = PacketCodec::default();
        assert_eq!(codec.decode(&[]), Err(ProtocolError::ShortHeader(0)));
        assert_eq!(codec.decode(&[b'S']), Err(ProtocolError::ShortHeader(1)));
        assert_eq!(codec.decode(&header()), Err(ProtocolError::ShortHeader(11)));
    }

    #[test]
    fn missing_ping_keeps_last_player() {
        let mut buf = alice_and_bob();
        // header + count + len + "Alice" + score
        buf.truncate(HEADER_LEN + 1 + 1 + 5 + 4);

        let players = PacketCodec::default().decode(&buf).unwrap();
        assert_eq!(
            players,
            vec![PlayerRecord {
                id: 0,
                name: PlayerName::from(&b"Alice"[..]),
                score: -5,
            }]
        );
    }

    #[test]
    fn truncation_inside_a_record_drops_it() {
        let full = alice_and_bob();
        let codec = PacketCodec::default();
        let first_end = HEADER_LEN + 1 + 1 + 5 + 4 + 4;

        // cut inside Bob's name length, name and score
        for cut in [first_end, first_end + 2, first_end + 1 + 3 + 2] {
            let players = codec.decode(&full[..cut]).unwrap();
            assert_eq!(players.len(), 1, "cut at {cut}");
            assert_eq!(players[0].name, "Alice");
        }
    }

    #[test]
    fn overstated_count_yields_what_is_present() {
        let mut buf = alice_and_bob();
        buf[HEADER_LEN] = 200;
        let players = PacketCodec::default().decode(&buf).unwrap();
        assert_eq!(players.len(), 2);
    }

    #[test]
    fn non_utf8_names_are_preserved() {
        let mut buf = header();
        buf.push(1);
        push_player(&mut buf, &[0xc4, b'x', 0x00, 0x07], 3, 0);

        let players = PacketCodec::default().decode(&buf).unwrap();
        assert_eq!(players[0].name.as_bytes(), &[0xc4, b'x', 0x00, 0x07]);
        assert_eq!(players[0].name.to_string_lossy(), "\u{fffd}x\u{0}\u{7}");
    }

    #[test]
    fn ping_width_is_configurable() {
        let mut buf = header();
        buf.push(2);
        for (name, score) in [(&b"Alice"[..], -5i32), (&b"Bob"[..], 1200)] {
            buf.push(name.len() as u8);
            buf.extend_from_slice(name);
            buf.extend_from_slice(&score.to_le_bytes());
        }

        let codec = PacketCodec::with_ping_width(0);
        assert_eq!(codec.ping_width(), 0);
        assert_eq!(PacketCodec::default().ping_width(), DEFAULT_PING_WIDTH);

        let players = codec.decode(&buf).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[1].name, "Bob");
        assert_eq!(players[1].score, 1200);
    }

    #[test]
    fn serializes_like_the_http_api() {
        let players = PacketCodec::default().decode(&alice_and_bob()).unwrap();
        let json = serde_json::to_value(&players[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 0, "playername": "Alice", "score": -5 })
        );
    }
}
