use serde::Serialize;

/// Relying-party descriptor from the creation options.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    pub id: String,
    pub name: Option<String>,
}

/// User descriptor from the creation options. The handle is opaque bytes,
/// decoded once at the transport boundary.
#[derive(Debug, Clone)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserVerification {
    Discouraged,
    #[default]
    Preferred,
    Required,
}

impl UserVerification {
    pub fn is_required(self) -> bool {
        self == UserVerification::Required
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub rp: RelyingParty,
    pub user: UserEntity,
    /// Echoed verbatim into clientDataJSON; never re-encoded.
    pub challenge: String,
    /// COSE algorithm identifiers in request order.
    pub algorithms: Vec<i64>,
    pub user_verification: UserVerification,
}

#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
    pub rp_id: String,
    pub challenge: String,
    pub allow_credentials: Option<Vec<Vec<u8>>>,
    pub user_verification: UserVerification,
}

/// Binary fields stay raw bytes here; the output layer picks the encoding.
#[derive(Debug)]
pub struct RegistrationResponse {
    pub credential_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
}

#[derive(Debug)]
pub struct AuthenticationResponse {
    pub credential_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

#[derive(Debug, Serialize)]
struct CollectedClientData<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    challenge: &'a str,
    origin: String,
}

/// `{"type":..., "challenge":..., "origin":"https://<rp id>"}` with the
/// challenge byte-for-byte as supplied by the relying party.
pub(crate) fn client_data_json(kind: &str, challenge: &str, rp_id: &str) -> Vec<u8> {
    let data = CollectedClientData {
        kind,
        challenge,
        origin: format!("https://{rp_id}"),
    };
    serde_json::to_vec(&data).expect("clientDataJSON serialization is infallible")
}
