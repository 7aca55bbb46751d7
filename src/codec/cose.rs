//! COSE_Key encoding of the supported public key types.
//!
//! EC2/P-256 keys carry fixed-width 32-byte coordinates: zero-stripping must
//! NOT apply here, unlike the minimal unsigned encoding used for RSA n and e.

use crate::keys::{Algorithm, PublicKey};

use super::cbor::{decode_map, encode_map, CborMap, MapValue};
use super::CodecError;

const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;

const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

const EC_LABEL_CRV: i64 = -1;
const EC_LABEL_X: i64 = -2;
const EC_LABEL_Y: i64 = -3;
const CRV_P256: i64 = 1;

const RSA_LABEL_N: i64 = -1;
const RSA_LABEL_E: i64 = -2;

pub fn encode_cose_key(key: &PublicKey) -> Result<Vec<u8>, CodecError> {
    let mut map = CborMap::new();
    match key {
        PublicKey::Ec { x, y } => {
            map.insert(LABEL_KTY, MapValue::Int(KTY_EC2));
            map.insert(LABEL_ALG, MapValue::Int(Algorithm::Es256.cose_id()));
            map.insert(EC_LABEL_CRV, MapValue::Int(CRV_P256));
            map.insert(EC_LABEL_X, MapValue::Bytes(x.to_vec()));
            map.insert(EC_LABEL_Y, MapValue::Bytes(y.to_vec()));
        }
        PublicKey::Rsa { n, e } => {
            map.insert(LABEL_KTY, MapValue::Int(KTY_RSA));
            map.insert(LABEL_ALG, MapValue::Int(Algorithm::Rs256.cose_id()));
            map.insert(RSA_LABEL_N, MapValue::Bytes(minimal_unsigned(n)));
            map.insert(RSA_LABEL_E, MapValue::Bytes(minimal_unsigned(e)));
        }
    }
    encode_map(&map)
}

/// Inverse of [`encode_cose_key`]; rejects unknown key types, curves, and
/// algorithm identifiers.
pub fn decode_cose_key(bytes: &[u8]) -> Result<PublicKey, CodecError> {
    let map = decode_map(bytes)?;
    let kty = map
        .get_int(LABEL_KTY)
        .ok_or_else(|| CodecError::Decoding("COSE key missing kty".into()))?;
    match kty {
        KTY_EC2 => {
            expect_alg(&map, Algorithm::Es256)?;
            let crv = map
                .get_int(EC_LABEL_CRV)
                .ok_or_else(|| CodecError::Decoding("EC2 COSE key missing crv".into()))?;
            if crv != CRV_P256 {
                return Err(CodecError::Decoding(format!("unknown EC curve {crv}")));
            }
            Ok(PublicKey::Ec {
                x: coordinate(&map, EC_LABEL_X, "x")?,
                y: coordinate(&map, EC_LABEL_Y, "y")?,
            })
        }
        KTY_RSA => {
            expect_alg(&map, Algorithm::Rs256)?;
            let n = map
                .get_bytes(RSA_LABEL_N)
                .ok_or_else(|| CodecError::Decoding("RSA COSE key missing n".into()))?;
            let e = map
                .get_bytes(RSA_LABEL_E)
                .ok_or_else(|| CodecError::Decoding("RSA COSE key missing e".into()))?;
            Ok(PublicKey::Rsa {
                n: n.to_vec(),
                e: e.to_vec(),
            })
        }
        other => Err(CodecError::Decoding(format!("unknown COSE key type {other}"))),
    }
}

fn expect_alg(map: &CborMap, algorithm: Algorithm) -> Result<(), CodecError> {
    match map.get_int(LABEL_ALG) {
        Some(alg) if alg == algorithm.cose_id() => Ok(()),
        Some(alg) => Err(CodecError::Decoding(format!(
            "unexpected COSE algorithm {alg}"
        ))),
        None => Err(CodecError::Decoding("COSE key missing alg".into())),
    }
}

fn coordinate(map: &CborMap, label: i64, name: &str) -> Result<[u8; 32], CodecError> {
    let bytes = map
        .get_bytes(label)
        .ok_or_else(|| CodecError::Decoding(format!("EC2 COSE key missing {name}")))?;
    bytes
        .try_into()
        .map_err(|_| CodecError::Decoding(format!("EC coordinate {name} is not 32 bytes")))
}

/// Minimal unsigned big-endian: leading zero bytes stripped, zero itself is a
/// single 0x00 byte.
fn minimal_unsigned(bytes: &[u8]) -> Vec<u8> {
    let stripped: Vec<u8> = bytes.iter().skip_while(|&&b| b == 0).copied().collect();
    if stripped.is_empty() {
        vec![0]
    } else {
        stripped
    }
}
