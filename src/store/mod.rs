pub mod disk;
pub mod index;
pub mod record;

pub use index::{CredentialId, CredentialStore, NewCredential, CREDENTIAL_ID_LEN};
pub use record::CredentialMetadata;

use crate::keys::KeyError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize: {0}")]
    Serialization(String),
    #[error("Encrypt: {0}")]
    Encryption(String),
    #[error("Key: {0}")]
    Key(#[from] KeyError),
    #[error("Corrupt: {0}")]
    Corrupt(String),
    #[error("Not found")]
    NotFound,
}
