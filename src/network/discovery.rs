// Copyright (c) 2026 Chainnode
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `DiscoveryTable` (spec.md §4.7, §10.8): the UDP node-discovery service.
//! Binds a single socket, seeds a flat routing table from bootnodes, bans
//! misbehaving peers for a bounded interval, and surfaces transport
//! failures without aborting startup.
//!
//! Wire packet: `hash(32) || sig(65) || type(1) || rlp-payload`. `hash` is
//! keccak256 of `sig || type || payload` (an integrity checksum, not a
//! signed digest); `sig` recovers against `keccak256(type || payload)`,
//! the same recoverable-ECDSA primitive `CliqueRules::signature_to_address`
//! uses for block seals (spec.md §4.4). Full Kademlia bucket maintenance
//! is out of scope; the table is a flat map of known endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ethereum_types::H256;
use rlp::RlpStream;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SecretKey, SECP256K1};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::identity::node_id_from_public;
use super::types::Endpoint;
use crate::network::errors::NetworkError;

/// Discovery packet kinds (discv4-style), per spec.md §10.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Ping,
    Pong,
    FindNode,
    Neighbors,
}

impl PacketType {
    fn to_byte(self) -> u8 {
        match self {
            PacketType::Ping => 0x01,
            PacketType::Pong => 0x02,
            PacketType::FindNode => 0x03,
            PacketType::Neighbors => 0x04,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x01 => PacketType::Ping,
            0x02 => PacketType::Pong,
            0x03 => PacketType::FindNode,
            0x04 => PacketType::Neighbors,
            _ => return None,
        })
    }
}

/// Encodes a discovery packet, signing it with `secret`.
pub fn encode_packet(secret: &SecretKey, packet_type: PacketType, payload: &[u8]) -> Vec<u8> {
    let mut type_and_payload = Vec::with_capacity(1 + payload.len());
    type_and_payload.push(packet_type.to_byte());
    type_and_payload.extend_from_slice(payload);

    let signing_hash = keccak_hash::keccak(&type_and_payload);
    let message = Message::from_slice(signing_hash.as_bytes()).expect("32-byte hash");
    let (recovery_id, sig_bytes) = SECP256K1
        .sign_ecdsa_recoverable(&message, secret)
        .serialize_compact();

    let mut sig = Vec::with_capacity(65);
    sig.extend_from_slice(&sig_bytes);
    sig.push(recovery_id.to_i32() as u8);

    let mut sig_and_rest = Vec::with_capacity(65 + type_and_payload.len());
    sig_and_rest.extend_from_slice(&sig);
    sig_and_rest.extend_from_slice(&type_and_payload);
    let hash = keccak_hash::keccak(&sig_and_rest);

    let mut wire = Vec::with_capacity(32 + sig_and_rest.len());
    wire.extend_from_slice(hash.as_bytes());
    wire.extend_from_slice(&sig_and_rest);
    wire
}

/// Decodes and verifies a discovery packet, returning the sender's node
/// id, packet type, and payload.
pub fn decode_packet(wire: &[u8]) -> Result<(H256, PacketType, Vec<u8>), NetworkError> {
    if wire.len() < 32 + 65 + 1 {
        return Err(NetworkError::MalformedPacket);
    }
    let hash = &wire[0..32];
    let sig_and_rest = &wire[32..];
    if keccak_hash::keccak(sig_and_rest).as_bytes() != hash {
        return Err(NetworkError::MalformedPacket);
    }

    let sig_bytes = &sig_and_rest[0..64];
    let recovery_byte = sig_and_rest[64];
    let type_and_payload = &sig_and_rest[65..];
    let packet_type =
        PacketType::from_byte(type_and_payload[0]).ok_or(NetworkError::MalformedPacket)?;
    let payload = type_and_payload[1..].to_vec();

    let recovery_id = RecoveryId::from_i32(recovery_byte as i32)
        .map_err(|_| NetworkError::MalformedPacket)?;
    let sig = RecoverableSignature::from_compact(sig_bytes, recovery_id)
        .map_err(|_| NetworkError::MalformedPacket)?;
    let signing_hash = keccak_hash::keccak(type_and_payload);
    let message =
        Message::from_slice(signing_hash.as_bytes()).map_err(|_| NetworkError::MalformedPacket)?;
    let pubkey = SECP256K1
        .recover_ecdsa(&message, &sig)
        .map_err(|_| NetworkError::MalformedPacket)?;

    Ok((node_id_from_public(&pubkey), packet_type, payload))
}

fn encode_endpoint(endpoint: &Endpoint) -> Vec<u8> {
    let mut s = RlpStream::new_list(3);
    s.append(&endpoint.address);
    s.append(&endpoint.udp_port);
    s.append(&endpoint.tcp_port);
    s.out().to_vec()
}

/// Events surfaced from the discovery transport (spec.md §4.7: "emits
/// `error` on its transport channel").
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    Error(String),
}

struct BanEntry {
    until: Instant,
}

/// Owns the UDP node-discovery socket and flat routing table.
pub struct DiscoveryTable {
    local_secret: SecretKey,
    refresh_interval: Duration,
    advertised: Arc<Mutex<Endpoint>>,
    bans: Arc<Mutex<HashMap<String, BanEntry>>>,
    known: Arc<Mutex<HashMap<H256, Endpoint>>>,
    socket: Option<Arc<UdpSocket>>,
    recv_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl DiscoveryTable {
    pub fn new(
        local_secret: SecretKey,
        refresh_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let table = Self {
            local_secret,
            refresh_interval,
            advertised: Arc::new(Mutex::new(Endpoint {
                address: "0.0.0.0".to_string(),
                udp_port: 0,
                tcp_port: 0,
            })),
            bans: Arc::new(Mutex::new(HashMap::new())),
            known: Arc::new(Mutex::new(HashMap::new())),
            socket: None,
            recv_task: None,
            events_tx,
        };
        (table, events_rx)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn advertised(&self) -> Endpoint {
        self.advertised.lock().expect("advertised lock").clone()
    }

    /// Binds the UDP socket on `host:port` when `port != 0`, and spawns
    /// the background receive loop.
    pub async fn bind(&mut self, port: u16, host: &str) -> Result<(), NetworkError> {
        if port == 0 {
            return Ok(());
        }
        let addr = format!("{host}:{port}");
        let socket = UdpSocket::bind(&addr).await.map_err(|source| NetworkError::Bind {
            proto: "udp",
            addr: addr.clone(),
            source,
        })?;
        let socket = Arc::new(socket);
        self.advertised.lock().expect("advertised lock").udp_port = port;

        let recv_socket = socket.clone();
        let known = self.known.clone();
        let bans = self.bans.clone();
        let events_tx = self.events_tx.clone();
        let secret = self.local_secret;
        let task = tokio::spawn(async move {
            recv_loop(recv_socket, known, bans, events_tx, secret).await;
        });

        self.socket = Some(socket);
        self.recv_task = Some(task);
        Ok(())
    }

    /// Seeds the routing table with `bootnodes`, bootstrapped in parallel;
    /// failures are surfaced through the error sink but never abort
    /// startup (spec.md §4.7, §8 scenario S6).
    pub async fn bootstrap(&self, bootnodes: Vec<Endpoint>) {
        let futures = bootnodes.into_iter().map(|node| {
            let socket = self.socket.clone();
            let advertised = self.advertised();
            let events_tx = self.events_tx.clone();
            let secret = self.local_secret;
            async move {
                let Some(socket) = socket else {
                    let _ = events_tx.send(DiscoveryEvent::Error(
                        "bootstrap attempted before bind".to_string(),
                    ));
                    return;
                };
                if let Err(err) = ping(&socket, &secret, &advertised, &node).await {
                    let _ = events_tx.send(DiscoveryEvent::Error(format!(
                        "bootstrap dial to {}:{} failed: {err}",
                        node.address, node.udp_port
                    )));
                }
            }
        });
        futures::future::join_all(futures).await;
    }

    /// Records a time-limited ban for `id`.
    pub fn ban_peer(&self, id: &str, max_age_millis: u64) {
        let mut bans = self.bans.lock().expect("bans lock");
        bans.insert(
            id.to_string(),
            BanEntry { until: Instant::now() + Duration::from_millis(max_age_millis) },
        );
    }

    pub fn is_banned(&self, id: &str) -> bool {
        let mut bans = self.bans.lock().expect("bans lock");
        match bans.get(id) {
            Some(entry) if entry.until > Instant::now() => true,
            Some(_) => {
                bans.remove(id);
                false
            }
            None => false,
        }
    }

    /// Releases the UDP socket and background task.
    pub async fn destroy(&mut self) {
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
        self.socket = None;
    }
}

async fn ping(
    socket: &UdpSocket,
    secret: &SecretKey,
    from: &Endpoint,
    to: &Endpoint,
) -> Result<(), NetworkError> {
    let mut payload = RlpStream::new_list(2);
    payload.append_raw(&encode_endpoint(from), 1);
    payload.append_raw(&encode_endpoint(to), 1);
    let wire = encode_packet(secret, PacketType::Ping, &payload.out());

    let addr: SocketAddr = format!("{}:{}", to.address, to.udp_port)
        .parse()
        .map_err(|_| NetworkError::MalformedPacket)?;
    socket.send_to(&wire, addr).await?;

    let mut buf = [0u8; 1280];
    let recv = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .map_err(|_| NetworkError::HandshakeFailed("Timeout error: ping".to_string()))??;
    let (len, _peer) = recv;
    let (_id, packet_type, _payload) = decode_packet(&buf[..len])?;
    if packet_type != PacketType::Pong {
        return Err(NetworkError::MalformedPacket);
    }
    Ok(())
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    known: Arc<Mutex<HashMap<H256, Endpoint>>>,
    bans: Arc<Mutex<HashMap<String, BanEntry>>>,
    events_tx: mpsc::UnboundedSender<DiscoveryEvent>,
    secret: SecretKey,
) {
    let mut buf = vec![0u8; 1280];
    loop {
        let (len, peer_addr) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(err) => {
                let _ = events_tx.send(DiscoveryEvent::Error(err.to_string()));
                continue;
            }
        };

        let (sender_id, packet_type, payload) = match decode_packet(&buf[..len]) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let sender_hex = hex::encode(sender_id.as_bytes());
        if bans.lock().expect("bans lock").contains_key(&sender_hex) {
            continue;
        }

        known.lock().expect("known lock").insert(
            sender_id,
            Endpoint {
                address: peer_addr.ip().to_string(),
                udp_port: peer_addr.port(),
                tcp_port: 0,
            },
        );

        if packet_type == PacketType::Ping {
            let mut pong_payload = RlpStream::new_list(1);
            pong_payload.append(&payload);
            let wire = encode_packet(&secret, PacketType::Pong, &pong_payload.out());
            let _ = socket.send_to(&wire, peer_addr).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn packet_round_trips_and_recovers_sender() {
        let secret = SecretKey::new(&mut OsRng);
        let public = secp256k1::PublicKey::from_secret_key(SECP256K1, &secret);
        let expected_id = node_id_from_public(&public);

        let wire = encode_packet(&secret, PacketType::Ping, b"hello");
        let (id, packet_type, payload) = decode_packet(&wire).unwrap();
        assert_eq!(id, expected_id);
        assert_eq!(packet_type, PacketType::Ping);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn tampered_payload_fails_hash_check() {
        let secret = SecretKey::new(&mut OsRng);
        let mut wire = encode_packet(&secret, PacketType::FindNode, b"abc");
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert!(decode_packet(&wire).is_err());
    }

    #[test]
    fn truncated_packet_is_malformed() {
        assert!(decode_packet(&[0u8; 10]).is_err());
    }

    #[tokio::test]
    async fn ban_peer_expires_after_max_age() {
        let secret = SecretKey::new(&mut OsRng);
        let (table, _rx) = DiscoveryTable::new(secret, Duration::from_secs(30));
        table.ban_peer("deadbeef", 10);
        assert!(table.is_banned("deadbeef"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!table.is_banned("deadbeef"));
    }
}
