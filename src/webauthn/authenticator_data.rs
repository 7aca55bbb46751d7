//! Authenticator-data layout per the WebAuthn spec: 32-byte rpIdHash, one
//! flags byte, 4-byte big-endian sign count, and for registration the
//! attested-credential block (AAGUID, credential-ID length, credential ID,
//! COSE public key).

use crate::codec::CodecError;
use crate::config::AAGUID;

pub const FLAG_UP: u8 = 0x01;
pub const FLAG_UV: u8 = 0x04;
pub const FLAG_AT: u8 = 0x40;

/// Attested authenticator data for registration.
pub fn build_attested(
    rp_id_hash: &[u8; 32],
    flags: u8,
    sign_count: u32,
    credential_id: &[u8],
    cose_key: &[u8],
) -> Vec<u8> {
    let cred_id_len = credential_id.len() as u16;
    let mut data = Vec::with_capacity(37 + 16 + 2 + credential_id.len() + cose_key.len());
    data.extend_from_slice(rp_id_hash);
    data.push(flags | FLAG_AT);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data.extend_from_slice(&AAGUID);
    data.extend_from_slice(&cred_id_len.to_be_bytes());
    data.extend_from_slice(credential_id);
    data.extend_from_slice(cose_key);
    data
}

/// Plain 37-byte authenticator data for assertions.
pub fn build_plain(rp_id_hash: &[u8; 32], flags: u8, sign_count: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(37);
    data.extend_from_slice(rp_id_hash);
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredential {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    pub cose_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    pub attested: Option<AttestedCredential>,
}

/// Inverse of the builders, used by `inspect` and the round-trip tests.
/// Extensions are not supported, so with AT set the COSE key runs to the end
/// of the buffer.
pub fn parse(data: &[u8]) -> Result<AuthenticatorData, CodecError> {
    if data.len() < 37 {
        return Err(CodecError::Decoding(
            "authenticator data shorter than 37 bytes".into(),
        ));
    }
    let mut rp_id_hash = [0u8; 32];
    rp_id_hash.copy_from_slice(&data[0..32]);
    let flags = data[32];
    let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

    let attested = if flags & FLAG_AT != 0 {
        let rest = &data[37..];
        if rest.len() < 18 {
            return Err(CodecError::Decoding(
                "attested credential data truncated".into(),
            ));
        }
        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&rest[0..16]);
        let cred_id_len = u16::from_be_bytes([rest[16], rest[17]]) as usize;
        if rest.len() < 18 + cred_id_len {
            return Err(CodecError::Decoding("credential ID truncated".into()));
        }
        Some(AttestedCredential {
            aaguid,
            credential_id: rest[18..18 + cred_id_len].to_vec(),
            cose_key: rest[18 + cred_id_len..].to_vec(),
        })
    } else {
        None
    };

    Ok(AuthenticatorData {
        rp_id_hash,
        flags,
        sign_count,
        attested,
    })
}
