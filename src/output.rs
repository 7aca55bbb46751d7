//! Presentation layer: renders core responses as JSON. The binary-field
//! encoding is configurable; the `id` field stays base64url without padding
//! as WebAuthn clients emit it.

use base64::Engine;
use serde_json::json;

use crate::webauthn::types::{AuthenticationResponse, RegistrationResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BinaryEncoding {
    #[default]
    Base64url,
    Base64,
    Hex,
}

impl BinaryEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
        match self {
            BinaryEncoding::Base64url => URL_SAFE_NO_PAD.encode(bytes),
            BinaryEncoding::Base64 => STANDARD.encode(bytes),
            BinaryEncoding::Hex => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

fn credential_id_b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn registration_json(
    response: &RegistrationResponse,
    encoding: BinaryEncoding,
) -> serde_json::Value {
    json!({
        "id": credential_id_b64(&response.credential_id),
        "rawId": encoding.encode(&response.credential_id),
        "type": "public-key",
        "response": {
            "attestationObject": encoding.encode(&response.attestation_object),
            "clientDataJSON": encoding.encode(&response.client_data_json),
        },
    })
}

pub fn assertion_json(
    response: &AuthenticationResponse,
    encoding: BinaryEncoding,
) -> serde_json::Value {
    let mut inner = json!({
        "clientDataJSON": encoding.encode(&response.client_data_json),
        "authenticatorData": encoding.encode(&response.authenticator_data),
        "signature": encoding.encode(&response.signature),
    });
    if let Some(handle) = &response.user_handle {
        inner["userHandle"] = json!(encoding.encode(handle));
    }
    json!({
        "id": credential_id_b64(&response.credential_id),
        "rawId": encoding.encode(&response.credential_id),
        "type": "public-key",
        "response": inner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodings() {
        let bytes = [0xFB, 0xFF, 0x00];
        assert_eq!(BinaryEncoding::Base64url.encode(&bytes), "-_8A");
        assert_eq!(BinaryEncoding::Base64.encode(&bytes), "+/8A");
        assert_eq!(BinaryEncoding::Hex.encode(&bytes), "fbff00");
    }

    #[test]
    fn test_registration_json_shape() {
        let response = RegistrationResponse {
            credential_id: vec![0x01; 16],
            client_data_json: b"{}".to_vec(),
            attestation_object: vec![0xA0],
        };
        let value = registration_json(&response, BinaryEncoding::Base64url);
        assert_eq!(value["type"], "public-key");
        assert_eq!(value["id"], value["rawId"]);
        assert!(value["response"]["attestationObject"].is_string());
        assert!(value["response"]["clientDataJSON"].is_string());
    }

    #[test]
    fn test_assertion_json_user_handle_is_optional() {
        let mut response = AuthenticationResponse {
            credential_id: vec![0x02; 16],
            client_data_json: b"{}".to_vec(),
            authenticator_data: vec![0x00; 37],
            signature: vec![0x30, 0x06],
            user_handle: None,
        };
        let without = assertion_json(&response, BinaryEncoding::Base64url);
        assert!(without["response"].get("userHandle").is_none());

        response.user_handle = Some(b"user".to_vec());
        let with = assertion_json(&response, BinaryEncoding::Base64url);
        assert_eq!(with["response"]["userHandle"], "dXNlcg");
    }
}
