//! Boundary between relying-party JSON option objects and the typed core
//! requests. All base64 decoding of user handles and credential IDs happens
//! here, once; the core only sees bytes and verbatim challenge strings.

use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::webauthn::types::{
    AuthenticationRequest, RegistrationRequest, RelyingParty, UserEntity, UserVerification,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreationOptions {
    rp: RpJson,
    user: UserJson,
    challenge: String,
    pub_key_cred_params: Vec<CredParamJson>,
    #[serde(default)]
    authenticator_selection: Option<AuthenticatorSelectionJson>,
}

#[derive(Debug, Deserialize)]
struct RpJson {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserJson {
    id: String,
    name: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredParamJson {
    #[serde(rename = "type")]
    kind: String,
    alg: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticatorSelectionJson {
    #[serde(default)]
    user_verification: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestOptions {
    rp_id: Option<String>,
    challenge: String,
    #[serde(default)]
    allow_credentials: Option<Vec<DescriptorJson>>,
    #[serde(default)]
    user_verification: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescriptorJson {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

/// Parse `PublicKeyCredentialCreationOptions`, accepting both the bare
/// options object and the `{"publicKey": {...}}` wrapper browsers use.
pub fn parse_creation_options(json: &str) -> Result<RegistrationRequest> {
    let options: CreationOptions = from_options_json(json)?;

    let rp_id = options
        .rp
        .id
        .ok_or_else(|| Error::InvalidInput("rp.id is required".into()))?;
    let algorithms: Vec<i64> = options
        .pub_key_cred_params
        .iter()
        .filter(|p| p.kind == "public-key")
        .map(|p| p.alg)
        .collect();
    if algorithms.is_empty() {
        return Err(Error::InvalidInput(
            "pubKeyCredParams has no public-key entry".into(),
        ));
    }

    Ok(RegistrationRequest {
        rp: RelyingParty {
            id: rp_id,
            name: options.rp.name,
        },
        user: UserEntity {
            id: decode_base64_any(&options.user.id)?,
            name: options.user.name,
            display_name: options.user.display_name,
        },
        challenge: options.challenge,
        algorithms,
        user_verification: parse_user_verification(
            options
                .authenticator_selection
                .and_then(|s| s.user_verification),
        )?,
    })
}

/// Parse `PublicKeyCredentialRequestOptions` (bare or wrapped).
pub fn parse_request_options(json: &str) -> Result<AuthenticationRequest> {
    let options: RequestOptions = from_options_json(json)?;

    let rp_id = options
        .rp_id
        .ok_or_else(|| Error::InvalidInput("rpId is required".into()))?;
    let allow_credentials = options
        .allow_credentials
        .map(|list| {
            list.iter()
                .filter(|d| d.kind == "public-key")
                .map(|d| decode_base64_any(&d.id))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    Ok(AuthenticationRequest {
        rp_id,
        challenge: options.challenge,
        allow_credentials,
        user_verification: parse_user_verification(options.user_verification)?,
    })
}

fn from_options_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let inner = value.get("publicKey").unwrap_or(&value);
    serde_json::from_value(inner.clone()).map_err(|e| Error::InvalidInput(e.to_string()))
}

fn parse_user_verification(value: Option<String>) -> Result<UserVerification> {
    match value.as_deref() {
        None => Ok(UserVerification::default()),
        Some("required") => Ok(UserVerification::Required),
        Some("preferred") => Ok(UserVerification::Preferred),
        Some("discouraged") => Ok(UserVerification::Discouraged),
        Some(other) => Err(Error::InvalidInput(format!(
            "unknown userVerification: {other}"
        ))),
    }
}

/// Relying parties are not consistent about base64 variants for IDs; accept
/// url-safe without padding, url-safe padded, and standard padded.
pub fn decode_base64_any(input: &str) -> Result<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .or_else(|_| STANDARD.decode(input))
        .map_err(|_| Error::InvalidInput(format!("invalid base64: {input}")))
}
