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

//! `SessionMultiplexer` (spec.md §4.8, §10.7): the TCP session layer.
//! Each connection, inbound or outbound, runs an ephemeral secp256k1 ECDH
//! handshake to derive an AES-256-GCM session key, exchanges a RLP `Hello`
//! frame carrying client id, capabilities, and node id, and then relays
//! `len(u32 BE) || ciphertext` frames until the peer disconnects.
//!
//! The multiplexer never touches `PeerRegistry` directly: it only emits
//! `MuxEvent`s. `P2PServer`'s single dispatch loop (spec.md §5) owns all
//! registry mutation, matching the same ownership split used for
//! `DiscoveryTable`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ethereum_types::H256;
use ring::aead;
use rlp::{Rlp, RlpStream};
use secp256k1::ecdh::SharedSecret;
use secp256k1::{PublicKey, SecretKey, SECP256K1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::identity::node_id_from_public;
use super::types::{PeerRecord, Reason};
use crate::network::errors::NetworkError;

const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;
const NONCE_LEN: usize = 12;

/// Events surfaced by the session layer. `P2PServer` translates these
/// into `PeerRegistry` mutations and `ServerSink` calls.
#[derive(Debug)]
pub enum MuxEvent {
    Connected(PeerRecord),
    Disconnected { id: String, reason: Reason },
    Error(String),
}

/// A `Hello` handshake payload (spec.md §10.7): identifies the remote
/// client and the capabilities it offers.
#[derive(Debug, Clone)]
pub struct Hello {
    pub client_id: String,
    pub capabilities: BTreeSet<String>,
    pub listen_port: u16,
    pub node_id: H256,
}

impl Hello {
    fn encode(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(4);
        s.append(&self.client_id);
        s.begin_list(self.capabilities.len());
        for cap in &self.capabilities {
            s.append(cap);
        }
        s.append(&self.listen_port);
        s.append(&self.node_id.as_bytes());
        s.out().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, NetworkError> {
        let rlp = Rlp::new(bytes);
        let client_id: String =
            rlp.val_at(0).map_err(|_| NetworkError::MalformedFrame)?;
        let caps: Vec<String> =
            rlp.list_at(1).map_err(|_| NetworkError::MalformedFrame)?;
        let listen_port: u16 =
            rlp.val_at(2).map_err(|_| NetworkError::MalformedFrame)?;
        let node_id_bytes: Vec<u8> =
            rlp.val_at(3).map_err(|_| NetworkError::MalformedFrame)?;
        if node_id_bytes.len() != 32 {
            return Err(NetworkError::MalformedFrame);
        }
        Ok(Self {
            client_id,
            capabilities: caps.into_iter().collect(),
            listen_port,
            node_id: H256::from_slice(&node_id_bytes),
        })
    }
}

/// A handle used to push outbound application frames to a live session.
#[derive(Clone)]
pub struct SessionHandle {
    write_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl SessionHandle {
    pub fn send(&self, payload: Vec<u8>) {
        let _ = self.write_tx.send(payload);
    }
}

/// Owns the TCP listener and the set of live session handles.
pub struct SessionMultiplexer {
    client_id: String,
    capabilities: BTreeSet<String>,
    node_id: H256,
    client_filter: Vec<String>,
    max_peers: u32,
    listener: Option<Arc<TcpListener>>,
    accept_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<MuxEvent>,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionMultiplexer {
    /// `max_peers` bounds the number of live sessions this multiplexer
    /// admits (spec.md §4.8); sessions beyond the cap are rejected before
    /// `MuxEvent::Connected` is ever emitted.
    pub fn new(
        client_id: String,
        capabilities: BTreeSet<String>,
        node_id: H256,
        client_filter: Vec<String>,
        max_peers: u32,
    ) -> (Self, mpsc::UnboundedReceiver<MuxEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mux = Self {
            client_id,
            capabilities,
            node_id,
            client_filter,
            max_peers,
            listener: None,
            accept_task: None,
            events_tx,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        };
        (mux, events_rx)
    }

    /// Binds the TCP listener on `host:port` and spawns the accept loop.
    pub async fn listen(&mut self, port: u16, host: &str) -> Result<u16, NetworkError> {
        let addr = format!("{host}:{port}");
        let listener =
            TcpListener::bind(&addr).await.map_err(|source| NetworkError::Bind {
                proto: "tcp",
                addr: addr.clone(),
                source,
            })?;
        let bound_port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
        let listener = Arc::new(listener);

        let events_tx = self.events_tx.clone();
        let sessions = self.sessions.clone();
        let client_id = self.client_id.clone();
        let capabilities = self.capabilities.clone();
        let node_id = self.node_id;
        let client_filter = self.client_filter.clone();
        let max_peers = self.max_peers;
        let accept_listener = listener.clone();

        let task = tokio::spawn(async move {
            loop {
                let (stream, addr) = match accept_listener.accept().await {
                    Ok(v) => v,
                    Err(err) => {
                        let _ = events_tx.send(MuxEvent::Error(err.to_string()));
                        continue;
                    }
                };
                let events_tx = events_tx.clone();
                let sessions = sessions.clone();
                let client_id = client_id.clone();
                let capabilities = capabilities.clone();
                let client_filter = client_filter.clone();
                tokio::spawn(async move {
                    run_session(
                        stream,
                        addr.ip().to_string(),
                        addr.port(),
                        true,
                        client_id,
                        capabilities,
                        node_id,
                        client_filter,
                        max_peers,
                        events_tx,
                        sessions,
                    )
                    .await;
                });
            }
        });

        self.listener = Some(listener);
        self.accept_task = Some(task);
        Ok(bound_port)
    }

    /// Dials `host:port` and runs the same handshake as an inbound
    /// session, reusing `run_session` with `inbound = false`.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), NetworkError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(NetworkError::Io)?;
        run_session(
            stream,
            host.to_string(),
            port,
            false,
            self.client_id.clone(),
            self.capabilities.clone(),
            self.node_id,
            self.client_filter.clone(),
            self.max_peers,
            self.events_tx.clone(),
            self.sessions.clone(),
        )
        .await;
        Ok(())
    }

    pub async fn session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn destroy(&mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        self.listener = None;
        self.sessions.lock().await.clear();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_session(
    mut stream: TcpStream,
    host: String,
    port: u16,
    inbound: bool,
    client_id: String,
    capabilities: BTreeSet<String>,
    node_id: H256,
    client_filter: Vec<String>,
    max_peers: u32,
    events_tx: mpsc::UnboundedSender<MuxEvent>,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
) {
    let (send_key, recv_key) = match handshake(&mut stream, inbound).await {
        Ok(v) => v,
        Err(err) => {
            let _ = events_tx.send(MuxEvent::Error(err.to_string()));
            return;
        }
    };

    let local_hello = Hello { client_id, capabilities, listen_port: port, node_id };
    let remote_hello = match negotiate_hello(&mut stream, &send_key, &recv_key, &local_hello).await
    {
        Ok(v) => v,
        Err(err) => {
            let _ = events_tx.send(MuxEvent::Error(err.to_string()));
            return;
        }
    };

    if !client_filter.is_empty()
        && !client_filter
            .iter()
            .any(|allowed| remote_hello.client_id.contains(allowed.as_str()))
    {
        let _ = events_tx.send(MuxEvent::Error(NetworkError::ClientFiltered.to_string()));
        return;
    }

    let peer_id = hex::encode(remote_hello.node_id.as_bytes());

    {
        let sessions = sessions.lock().await;
        if sessions.len() >= max_peers as usize && !sessions.contains_key(&peer_id) {
            let _ = events_tx.send(MuxEvent::Error(NetworkError::MaxPeersReached.to_string()));
            return;
        }
    }

    let (write_tx, mut write_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    sessions
        .lock()
        .await
        .insert(peer_id.clone(), SessionHandle { write_tx });

    let record = PeerRecord {
        id: peer_id.clone(),
        host,
        port,
        inbound,
        protocols: remote_hello.capabilities,
    };
    let _ = events_tx.send(MuxEvent::Connected(record));

    let (mut reader, mut writer) = stream.into_split();
    let mut send_nonce: u64 = 1;
    let writer_task = tokio::spawn(async move {
        while let Some(payload) = write_rx.recv().await {
            if write_frame(&mut writer, &send_key, &mut send_nonce, &payload)
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let mut recv_nonce: u64 = 1;
    let reason = loop {
        match read_frame(&mut reader, &recv_key, &mut recv_nonce).await {
            Ok(_payload) => continue,
            Err(err) => break Reason::TransportError(err.to_string()),
        }
    };

    writer_task.abort();
    sessions.lock().await.remove(&peer_id);
    let _ = events_tx.send(MuxEvent::Disconnected { id: peer_id, reason });
}

async fn handshake(
    stream: &mut TcpStream,
    inbound: bool,
) -> Result<([u8; 32], [u8; 32]), NetworkError> {
    let ephemeral = SecretKey::new(&mut rand::rngs::OsRng);
    let public = PublicKey::from_secret_key(SECP256K1, &ephemeral);
    let our_bytes = public.serialize();

    stream
        .write_all(&our_bytes)
        .await
        .map_err(NetworkError::Io)?;
    let mut their_bytes = [0u8; 33];
    stream
        .read_exact(&mut their_bytes)
        .await
        .map_err(NetworkError::Io)?;
    let their_public = PublicKey::from_slice(&their_bytes)
        .map_err(|_| NetworkError::HandshakeFailed("bad ephemeral public key".to_string()))?;

    let shared = SharedSecret::new(&their_public, &ephemeral);
    let mut shared_bytes = [0u8; 32];
    shared_bytes.copy_from_slice(shared.as_ref());

    let initiator_key = derive_directional_key(&shared_bytes, 1);
    let responder_key = derive_directional_key(&shared_bytes, 2);

    if inbound {
        Ok((responder_key, initiator_key))
    } else {
        Ok((initiator_key, responder_key))
    }
}

fn derive_directional_key(shared: &[u8; 32], label: u8) -> [u8; 32] {
    let mut input = shared.to_vec();
    input.push(label);
    let digest = ring::digest::digest(&ring::digest::SHA256, &input);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

async fn negotiate_hello(
    stream: &mut TcpStream,
    send_key: &[u8; 32],
    recv_key: &[u8; 32],
    local: &Hello,
) -> Result<Hello, NetworkError> {
    let mut send_nonce = 0u64;
    write_frame(stream, send_key, &mut send_nonce, &local.encode()).await?;
    let mut recv_nonce = 0u64;
    let payload = read_frame(stream, recv_key, &mut recv_nonce).await?;
    Hello::decode(&payload)
}

fn nonce_for(counter: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[4..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    key: &[u8; 32],
    counter: &mut u64,
    payload: &[u8],
) -> Result<(), NetworkError> {
    let unbound =
        aead::UnboundKey::new(&aead::AES_256_GCM, key).map_err(|_| NetworkError::MalformedFrame)?;
    let less_safe = aead::LessSafeKey::new(unbound);
    let nonce_bytes = nonce_for(*counter);
    *counter += 1;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = payload.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| NetworkError::MalformedFrame)?;

    let mut framed = Vec::with_capacity(NONCE_LEN + in_out.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&in_out);

    let len = framed.len() as u32;
    writer.write_all(&len.to_be_bytes()).await.map_err(NetworkError::Io)?;
    writer.write_all(&framed).await.map_err(NetworkError::Io)?;
    Ok(())
}

async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    key: &[u8; 32],
    expected_counter: &mut u64,
) -> Result<Vec<u8>, NetworkError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await.map_err(NetworkError::Io)?;
    let len = u32::from_be_bytes(len_bytes);
    if len == 0 || len > MAX_FRAME_LEN {
        return Err(NetworkError::MalformedFrame);
    }

    let mut framed = vec![0u8; len as usize];
    reader.read_exact(&mut framed).await.map_err(NetworkError::Io)?;
    if framed.len() < NONCE_LEN + 16 {
        return Err(NetworkError::MalformedFrame);
    }
    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let mut nonce_arr = [0u8; NONCE_LEN];
    nonce_arr.copy_from_slice(nonce_bytes);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_arr);

    let unbound =
        aead::UnboundKey::new(&aead::AES_256_GCM, key).map_err(|_| NetworkError::MalformedFrame)?;
    let less_safe = aead::LessSafeKey::new(unbound);
    let mut in_out = ciphertext.to_vec();
    let plain = less_safe
        .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| NetworkError::MalformedFrame)?;
    *expected_counter += 1;
    Ok(plain.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trips_through_rlp() {
        let hello = Hello {
            client_id: "chainnode/0.1.0".to_string(),
            capabilities: ["eth/66".to_string(), "eth/67".to_string()].into_iter().collect(),
            listen_port: 30303,
            node_id: H256::repeat_byte(0x11),
        };
        let decoded = Hello::decode(&hello.encode()).unwrap();
        assert_eq!(decoded.client_id, hello.client_id);
        assert_eq!(decoded.capabilities, hello.capabilities);
        assert_eq!(decoded.listen_port, hello.listen_port);
        assert_eq!(decoded.node_id, hello.node_id);
    }

    #[test]
    fn directional_keys_differ() {
        let shared = [7u8; 32];
        let a = derive_directional_key(&shared, 1);
        let b = derive_directional_key(&shared, 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn handshake_derives_matching_keys_across_initiator_and_responder() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            handshake(&mut stream, true).await.unwrap()
        });
        let mut client_stream = TcpStream::connect(addr).await.unwrap();
        let client_keys = handshake(&mut client_stream, false).await.unwrap();
        let server_keys = server.await.unwrap();

        assert_eq!(client_keys.0, server_keys.1);
        assert_eq!(client_keys.1, server_keys.0);
    }
}
