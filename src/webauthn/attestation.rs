//! Self-attestation only: `{fmt: "none", authData, attStmt: {}}`, no
//! certificate chain.

use crate::codec::cbor::{decode_map, encode_map, CborMap, MapValue};
use crate::codec::CodecError;

pub fn build_attestation_object(auth_data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut map = CborMap::new();
    map.insert("fmt", MapValue::Text("none".to_string()));
    map.insert("authData", MapValue::Bytes(auth_data.to_vec()));
    map.insert("attStmt", MapValue::Map(CborMap::new()));
    encode_map(&map)
}

#[derive(Debug)]
pub struct AttestationObject {
    pub fmt: String,
    pub auth_data: Vec<u8>,
    pub att_stmt: CborMap,
}

pub fn parse_attestation_object(bytes: &[u8]) -> Result<AttestationObject, CodecError> {
    let map = decode_map(bytes)?;
    let fmt = map
        .get_text("fmt")
        .ok_or_else(|| CodecError::Decoding("attestation object missing fmt".into()))?
        .to_string();
    let auth_data = match map.get(&"authData".into()) {
        Some(MapValue::Bytes(bytes)) => bytes.clone(),
        _ => {
            return Err(CodecError::Decoding(
                "attestation object missing authData".into(),
            ))
        }
    };
    let att_stmt = match map.get(&"attStmt".into()) {
        Some(MapValue::Map(stmt)) => stmt.clone(),
        _ => {
            return Err(CodecError::Decoding(
                "attestation object missing attStmt".into(),
            ))
        }
    };
    Ok(AttestationObject {
        fmt,
        auth_data,
        att_stmt,
    })
}
