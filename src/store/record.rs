use serde::{Deserialize, Serialize};

use crate::keys::Algorithm;

/// The persisted, non-secret projection of a credential. The private key
/// lives in a separate encrypted file keyed by the same credential ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialMetadata {
    pub version: u8,
    pub credential_id: Vec<u8>, // 16 bytes random
    pub rp_id: String,
    pub rp_name: Option<String>,
    pub user_handle: Vec<u8>,
    pub user_name: Option<String>,
    pub user_display: Option<String>,
    pub algorithm: Algorithm,
    pub public_key_pem: String, // SPKI PEM
    pub created_at: u64,        // Unix timestamp
    pub sign_count: u32,
}
