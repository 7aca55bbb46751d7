use std::collections::HashMap;
use std::path::PathBuf;

use rand::Rng;

use super::{disk, CredentialMetadata, StoreError};
use crate::keys::{Algorithm, KeyPair, PublicKey};

pub const CREDENTIAL_ID_LEN: usize = 16;

pub type CredentialId = [u8; CREDENTIAL_ID_LEN];

/// Relying-party and user attributes for a credential about to be created.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub rp_id: String,
    pub rp_name: Option<String>,
    pub user_handle: Vec<u8>,
    pub user_name: Option<String>,
    pub user_display: Option<String>,
}

/// The only component that touches private key material. Callers receive
/// signatures and public keys, never raw private bytes.
pub struct CredentialStore {
    aes_key: [u8; 32],
    dir: PathBuf,
    by_id: HashMap<CredentialId, CredentialMetadata>,
    by_rp: HashMap<String, Vec<CredentialId>>,
}

impl CredentialStore {
    /// Open a store directory, creating it (and the store key) on first use.
    /// Credentials are indexed in creation order so selection stays stable
    /// across restarts.
    pub fn open(dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir)?;
        let aes_key = disk::load_or_create_store_key(&dir)?;
        let mut records = disk::load_all(&dir)?;
        records.sort_by(|a, b| {
            (a.created_at, &a.credential_id).cmp(&(b.created_at, &b.credential_id))
        });

        let mut by_id = HashMap::new();
        let mut by_rp: HashMap<String, Vec<CredentialId>> = HashMap::new();
        for record in records {
            let id: CredentialId = record
                .credential_id
                .as_slice()
                .try_into()
                .map_err(|_| StoreError::Corrupt("credential_id not 16 bytes".into()))?;
            by_rp.entry(record.rp_id.clone()).or_default().push(id);
            by_id.insert(id, record);
        }
        Ok(Self {
            aes_key,
            dir,
            by_id,
            by_rp,
        })
    }

    /// Generate a fresh key pair and persist it together with its metadata.
    pub fn generate_credential(
        &mut self,
        new: NewCredential,
        algorithm: Algorithm,
    ) -> Result<(CredentialId, PublicKey), StoreError> {
        let key_pair = KeyPair::generate(algorithm)?;
        self.insert_credential(new, key_pair)
    }

    /// Persist a pre-generated key pair: key material first, then metadata,
    /// both on disk before this returns. Callers that share the store behind
    /// a mutex can run `KeyPair::generate` outside the lock and only
    /// serialize this step.
    pub fn insert_credential(
        &mut self,
        new: NewCredential,
        key_pair: KeyPair,
    ) -> Result<(CredentialId, PublicKey), StoreError> {
        let credential_id: CredentialId = rand::thread_rng().gen();
        let public_key = key_pair.public_key();

        let pkcs8 = key_pair.to_pkcs8_der()?;
        disk::write_private_key(&self.aes_key, &self.dir, &credential_id, &pkcs8)?;

        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let record = CredentialMetadata {
            version: 1,
            credential_id: credential_id.to_vec(),
            rp_id: new.rp_id,
            rp_name: new.rp_name,
            user_handle: new.user_handle,
            user_name: new.user_name,
            user_display: new.user_display,
            algorithm: key_pair.algorithm(),
            public_key_pem: key_pair.public_key_pem()?,
            created_at,
            sign_count: 0,
        };
        disk::write_metadata(&self.dir, &record)?;

        self.by_rp
            .entry(record.rp_id.clone())
            .or_default()
            .push(credential_id);
        self.by_id.insert(credential_id, record);

        tracing::info!(cred_id = disk::hex_id(&credential_id), "Credential stored");
        Ok((credential_id, public_key))
    }

    /// `Ok(None)` is an expected miss; `Err` means the stored PEM is corrupt.
    pub fn get_public_key(&self, id: &CredentialId) -> Result<Option<PublicKey>, StoreError> {
        match self.by_id.get(id) {
            None => Ok(None),
            Some(record) => PublicKey::from_pem(record.algorithm, &record.public_key_pem)
                .map(Some)
                .map_err(StoreError::from),
        }
    }

    /// Sign `message` with the credential's private key, loaded and decrypted
    /// for the duration of the call only.
    pub fn sign_with_credential(
        &self,
        id: &CredentialId,
        message: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        let record = self.by_id.get(id).ok_or(StoreError::NotFound)?;
        let pkcs8 = disk::read_private_key(&self.aes_key, &self.dir, id)?;
        let key_pair = KeyPair::from_pkcs8_der(record.algorithm, &pkcs8)?;
        Ok(key_pair.sign(message))
    }

    /// All credential IDs registered for `rp_id`, in stable insertion order.
    pub fn credentials_for_rp(&self, rp_id: &str) -> Vec<CredentialId> {
        self.by_rp.get(rp_id).cloned().unwrap_or_default()
    }

    /// Read, add one, persist, return the new value. The metadata write lands
    /// before the in-memory record is updated, so a failed write never leaves
    /// memory ahead of disk.
    pub fn increment_sign_count(&mut self, id: &CredentialId) -> Result<u32, StoreError> {
        let mut record = self.by_id.get(id).ok_or(StoreError::NotFound)?.clone();
        record.sign_count = record
            .sign_count
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt("sign counter overflow".into()))?;
        disk::write_metadata(&self.dir, &record)?;
        let new_count = record.sign_count;
        self.by_id.insert(*id, record);
        Ok(new_count)
    }

    pub fn has_credential(&self, id: &CredentialId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn metadata(&self, id: &CredentialId) -> Option<&CredentialMetadata> {
        self.by_id.get(id)
    }

    /// All records in creation order, for the `list` command.
    pub fn all(&self) -> Vec<&CredentialMetadata> {
        let mut records: Vec<&CredentialMetadata> = self.by_id.values().collect();
        records.sort_by_key(|r| (r.created_at, r.credential_id.clone()));
        records
    }

    pub fn credential_count(&self) -> usize {
        self.by_id.len()
    }
}
