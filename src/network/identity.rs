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

//! Node identity (spec.md §3 `ServerState.localId`, §10.6): a secp256k1
//! secret key persisted under the node's data directory, atomically
//! written with `0600` permissions and an optional AES-256-GCM
//! passphrase-at-rest layer, generated fresh via `ring::rand` when absent.

use std::fs;
use std::path::{Path, PathBuf};

use ethereum_types::H256;
use ring::aead;
use ring::rand::{SecureRandom, SystemRandom};
use secp256k1::{PublicKey, SecretKey, SECP256K1};
use thiserror::Error;
use zeroize::Zeroize;

const KEY_FILE_MAGIC: &[u8] = b"CHNKEY01";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const PASSPHRASE_ENV: &str = "CHAINNODE_KEY_PASSPHRASE";
const PBKDF2_ITERS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key material on disk")]
    InvalidKey,
    #[error("key file is encrypted; set {PASSPHRASE_ENV}")]
    MissingPassphrase,
    #[error("decryption failed, wrong passphrase or corrupt file")]
    Crypto,
}

/// A loaded or freshly generated node identity.
pub struct NodeIdentity {
    secret: SecretKey,
}

impl NodeIdentity {
    /// Loads `data_dir/node.key`, or generates and persists a new one.
    pub fn load_or_create(data_dir: &Path) -> Result<Self, IdentityError> {
        let path = data_dir.join("node.key");
        if path.exists() {
            let bytes = fs::read(&path)?;
            let raw = if bytes.starts_with(KEY_FILE_MAGIC) {
                let passphrase = std::env::var(PASSPHRASE_ENV)
                    .map_err(|_| IdentityError::MissingPassphrase)?;
                decrypt(passphrase.as_bytes(), &bytes)?
            } else {
                bytes
            };
            let secret = SecretKey::from_slice(&raw).map_err(|_| IdentityError::InvalidKey)?;
            return Ok(Self { secret });
        }

        let rng = SystemRandom::new();
        let mut raw = [0u8; 32];
        rng.fill(&mut raw).map_err(|_| IdentityError::Crypto)?;
        let secret = SecretKey::from_slice(&raw).map_err(|_| IdentityError::InvalidKey)?;

        let on_disk = match std::env::var(PASSPHRASE_ENV) {
            Ok(passphrase) => encrypt(passphrase.as_bytes(), &raw)?,
            Err(_) => raw.to_vec(),
        };
        atomic_write_private(&path, &on_disk)?;
        raw.zeroize();
        Ok(Self { secret })
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// The devp2p-style node id: keccak256 of the 64-byte uncompressed
    /// public key (the `0x04` prefix stripped), per spec.md §10.6. Used
    /// both in `enode://` URLs and as the identifier recovered from a
    /// discovery packet's seal (§4.4's signature primitive, reused here).
    pub fn node_id(&self) -> H256 {
        node_id_from_public(&PublicKey::from_secret_key(SECP256K1, &self.secret))
    }
}

pub fn node_id_from_public(public: &PublicKey) -> H256 {
    let uncompressed = public.serialize_uncompressed();
    keccak_hash::keccak(&uncompressed[1..])
}

fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> [u8; 32] {
    let mut out = [0u8; 32];
    ring::pbkdf2::derive(
        ring::pbkdf2::PBKDF2_HMAC_SHA256,
        std::num::NonZeroU32::new(PBKDF2_ITERS).expect("nonzero"),
        salt,
        passphrase,
        &mut out,
    );
    out
}

fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, IdentityError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| IdentityError::Crypto)?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(|_| IdentityError::Crypto)?;

    let mut key = derive_key(passphrase, &salt);
    let unbound =
        aead::UnboundKey::new(&aead::AES_256_GCM, &key).map_err(|_| IdentityError::Crypto)?;
    let less_safe = aead::LessSafeKey::new(unbound);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| IdentityError::Crypto)?;
    key.zeroize();

    let mut out = Vec::with_capacity(KEY_FILE_MAGIC.len() + SALT_LEN + NONCE_LEN + in_out.len());
    out.extend_from_slice(KEY_FILE_MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

fn decrypt(passphrase: &[u8], bytes: &[u8]) -> Result<Vec<u8>, IdentityError> {
    let header_len = KEY_FILE_MAGIC.len() + SALT_LEN + NONCE_LEN;
    if bytes.len() < header_len + 16 {
        return Err(IdentityError::InvalidKey);
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[KEY_FILE_MAGIC.len()..KEY_FILE_MAGIC.len() + SALT_LEN]);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&bytes[KEY_FILE_MAGIC.len() + SALT_LEN..header_len]);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut key = derive_key(passphrase, &salt);
    let unbound =
        aead::UnboundKey::new(&aead::AES_256_GCM, &key).map_err(|_| IdentityError::Crypto)?;
    let less_safe = aead::LessSafeKey::new(unbound);

    let mut in_out = bytes[header_len..].to_vec();
    let plain = less_safe
        .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| IdentityError::Crypto)?;
    key.zeroize();
    Ok(plain.to_vec())
}

fn atomic_write_private(path: &Path, bytes: &[u8]) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp: PathBuf = path.to_path_buf();
    tmp.set_extension("tmp");
    {
        use std::io::Write;
        let mut f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    set_private_perms(&tmp);
    fs::rename(&tmp, path)?;
    set_private_perms(path);
    Ok(())
}

fn set_private_perms(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}
