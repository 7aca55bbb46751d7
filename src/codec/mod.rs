pub mod cbor;
pub mod cose;

pub use cbor::{CborMap, MapKey, MapValue};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode: {0}")]
    Encoding(String),
    #[error("decode: {0}")]
    Decoding(String),
}
