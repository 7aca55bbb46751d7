use crate::codec::CodecError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no acceptable COSE algorithm in request")]
    UnsupportedAlgorithm,
    #[error("no credential matches the relying party")]
    NoMatchingCredential,
    #[error("credential not found")]
    CredentialNotFound,
    #[error("key store: {0}")]
    KeyStore(StoreError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// `StoreError::NotFound` is an expected miss, not a key-store failure; keep
/// the two apart so callers can tell a bad credential ID from broken storage.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Error::CredentialNotFound,
            other => Error::KeyStore(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
