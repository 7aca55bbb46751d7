//! On-disk layout: per credential, `<hex id>.meta` (plain CBOR metadata) and
//! `<hex id>.key` (AES-256-GCM encrypted PKCS#8 private key, 12-byte nonce
//! prefix). The store key lives in `store.key` next to them.
//!
//! Creation writes the key file first, then the metadata. Loading ignores
//! metadata without a matching key file, so a crash between the two writes
//! never yields a credential that is visible but cannot sign.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use std::path::{Path, PathBuf};

use super::{CredentialMetadata, StoreError};

pub(crate) fn hex_id(credential_id: &[u8]) -> String {
    credential_id.iter().map(|b| format!("{b:02x}")).collect()
}

fn meta_path(dir: &Path, credential_id: &[u8]) -> PathBuf {
    dir.join(format!("{}.meta", hex_id(credential_id)))
}

fn key_path(dir: &Path, credential_id: &[u8]) -> PathBuf {
    dir.join(format!("{}.key", hex_id(credential_id)))
}

/// Load the store key, creating it on first use (0600 on unix).
pub(crate) fn load_or_create_store_key(dir: &Path) -> Result<[u8; 32], StoreError> {
    let path = dir.join("store.key");
    if path.exists() {
        let bytes = std::fs::read(&path)?;
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Corrupt("store.key is not 32 bytes".into()))?;
        return Ok(key);
    }

    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    std::fs::write(&path, key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    tracing::info!(path = %path.display(), "Created new store key");
    Ok(key)
}

/// Serialize + write a metadata record to `dir/{credential_id_hex}.meta`.
pub(crate) fn write_metadata(dir: &Path, record: &CredentialMetadata) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    std::fs::write(meta_path(dir, &record.credential_id), buf)?;
    Ok(())
}

pub(crate) fn read_metadata(path: &Path) -> Result<CredentialMetadata, StoreError> {
    let bytes = std::fs::read(path)?;
    ciborium::from_reader(bytes.as_slice()).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Encrypt + write PKCS#8 private-key bytes to `dir/{credential_id_hex}.key`.
pub(crate) fn write_private_key(
    aes_key: &[u8; 32],
    dir: &Path,
    credential_id: &[u8],
    pkcs8_der: &[u8],
) -> Result<(), StoreError> {
    let mut nonce_bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(aes_key)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), pkcs8_der)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;

    let mut file_bytes = Vec::with_capacity(12 + ciphertext.len());
    file_bytes.extend_from_slice(&nonce_bytes);
    file_bytes.extend_from_slice(&ciphertext);

    std::fs::write(key_path(dir, credential_id), file_bytes)?;
    Ok(())
}

/// Read + decrypt the PKCS#8 private-key bytes for `credential_id`.
pub(crate) fn read_private_key(
    aes_key: &[u8; 32],
    dir: &Path,
    credential_id: &[u8],
) -> Result<Vec<u8>, StoreError> {
    let path = key_path(dir, credential_id);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
        Err(e) => return Err(e.into()),
    };
    if bytes.len() < 12 {
        return Err(StoreError::Corrupt("key file too short".into()));
    }
    let (nonce_bytes, ciphertext) = bytes.split_at(12);

    let cipher = Aes256Gcm::new_from_slice(aes_key)
        .map_err(|e| StoreError::Encryption(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| StoreError::Encryption(e.to_string()))
}

/// Load all metadata records from `dir`. Logs and skips corrupt records and
/// metadata whose key file is missing.
pub(crate) fn load_all(dir: &Path) -> Result<Vec<CredentialMetadata>, StoreError> {
    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("meta") {
            continue;
        }
        match read_metadata(&path) {
            Ok(record) => {
                if key_path(dir, &record.credential_id).exists() {
                    records.push(record);
                } else {
                    tracing::warn!(
                        path = %path.display(),
                        "Skipping metadata without key material"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping corrupt metadata file");
            }
        }
    }
    Ok(records)
}
