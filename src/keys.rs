use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Generate: {0}")]
    Generate(String),
    #[error("Pkcs8: {0}")]
    Pkcs8(String),
    #[error("Pem: {0}")]
    Pem(String),
}

/// COSE signature algorithms the simulator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Es256,
    Rs256,
}

impl Algorithm {
    /// Selection preference during registration: ES256 first, then RS256.
    pub const PREFERENCE: [Algorithm; 2] = [Algorithm::Es256, Algorithm::Rs256];

    pub fn cose_id(self) -> i64 {
        match self {
            Algorithm::Es256 => -7,
            Algorithm::Rs256 => -257,
        }
    }

    pub fn from_cose_id(id: i64) -> Option<Self> {
        match id {
            -7 => Some(Algorithm::Es256),
            -257 => Some(Algorithm::Rs256),
            _ => None,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Es256 => write!(f, "ES256"),
            Algorithm::Rs256 => write!(f, "RS256"),
        }
    }
}

/// Portable public key representation, matched exhaustively in the COSE codec
/// and the signer. EC coordinates are fixed 32-byte big-endian; RSA modulus
/// and exponent are minimal unsigned big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ec { x: [u8; 32], y: [u8; 32] },
    Rsa { n: Vec<u8>, e: Vec<u8> },
}

impl PublicKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            PublicKey::Ec { .. } => Algorithm::Es256,
            PublicKey::Rsa { .. } => Algorithm::Rs256,
        }
    }

    /// Re-derive the portable form from a stored SPKI PEM.
    pub fn from_pem(algorithm: Algorithm, pem: &str) -> Result<Self, KeyError> {
        match algorithm {
            Algorithm::Es256 => {
                let key = p256::PublicKey::from_public_key_pem(pem)
                    .map_err(|e| KeyError::Pem(e.to_string()))?;
                Ok(ec_coordinates(&key))
            }
            Algorithm::Rs256 => {
                let key = rsa::RsaPublicKey::from_public_key_pem(pem)
                    .map_err(|e| KeyError::Pem(e.to_string()))?;
                Ok(PublicKey::Rsa {
                    n: key.n().to_bytes_be(),
                    e: key.e().to_bytes_be(),
                })
            }
        }
    }
}

fn ec_coordinates(key: &p256::PublicKey) -> PublicKey {
    let point = key.to_encoded_point(false);
    let mut x = [0u8; 32];
    let mut y = [0u8; 32];
    x.copy_from_slice(point.x().expect("uncompressed P-256 point has x"));
    y.copy_from_slice(point.y().expect("uncompressed P-256 point has y"));
    PublicKey::Ec { x, y }
}

/// A generated key pair. The private half never leaves this module except as
/// encrypted PKCS#8 bytes written by the store.
pub enum KeyPair {
    Ec(p256::SecretKey),
    Rsa(rsa::RsaPrivateKey),
}

impl KeyPair {
    /// EC P-256 for ES256, RSA-2048 for RS256. RSA generation is slow enough
    /// that callers sharing a store lock should generate before locking.
    pub fn generate(algorithm: Algorithm) -> Result<Self, KeyError> {
        match algorithm {
            Algorithm::Es256 => Ok(KeyPair::Ec(p256::SecretKey::random(
                &mut rand::thread_rng(),
            ))),
            Algorithm::Rs256 => rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
                .map(KeyPair::Rsa)
                .map_err(|e| KeyError::Generate(e.to_string())),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            KeyPair::Ec(_) => Algorithm::Es256,
            KeyPair::Rsa(_) => Algorithm::Rs256,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Ec(secret) => ec_coordinates(&secret.public_key()),
            KeyPair::Rsa(secret) => {
                let public = secret.to_public_key();
                PublicKey::Rsa {
                    n: public.n().to_bytes_be(),
                    e: public.e().to_bytes_be(),
                }
            }
        }
    }

    /// SHA-256 ECDSA (ASN.1 DER signature) for EC keys, PKCS#1 v1.5 SHA-256
    /// for RSA keys, per the key type.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            KeyPair::Ec(secret) => {
                use p256::ecdsa::signature::{SignatureEncoding, Signer};
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key.sign(message);
                signature.to_der().to_vec()
            }
            KeyPair::Rsa(secret) => {
                use rsa::signature::{SignatureEncoding, Signer};
                let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(secret.clone());
                signing_key.sign(message).to_vec()
            }
        }
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, KeyError> {
        let document = match self {
            KeyPair::Ec(secret) => secret.to_pkcs8_der(),
            KeyPair::Rsa(secret) => secret.to_pkcs8_der(),
        }
        .map_err(|e| KeyError::Pkcs8(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    pub fn from_pkcs8_der(algorithm: Algorithm, der: &[u8]) -> Result<Self, KeyError> {
        match algorithm {
            Algorithm::Es256 => p256::SecretKey::from_pkcs8_der(der)
                .map(KeyPair::Ec)
                .map_err(|e| KeyError::Pkcs8(e.to_string())),
            Algorithm::Rs256 => rsa::RsaPrivateKey::from_pkcs8_der(der)
                .map(KeyPair::Rsa)
                .map_err(|e| KeyError::Pkcs8(e.to_string())),
        }
    }

    /// SPKI PEM of the public half, the portable encoding kept in metadata.
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        match self {
            KeyPair::Ec(secret) => secret.public_key().to_public_key_pem(LineEnding::LF),
            KeyPair::Rsa(secret) => secret.to_public_key().to_public_key_pem(LineEnding::LF),
        }
        .map_err(|e| KeyError::Pem(e.to_string()))
    }
}
