use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::codec::cose::encode_cose_key;
use crate::error::{Error, Result};
use crate::keys::{Algorithm, KeyPair};
use crate::store::{CredentialStore, NewCredential};

use super::attestation::build_attestation_object;
use super::authenticator_data::{build_attested, FLAG_UP, FLAG_UV};
use super::types::{client_data_json, RegistrationRequest, RegistrationResponse};

/// The `create` flow: generate a credential for the relying party and
/// assemble the attestation response. Everything is persisted before the
/// response is returned.
pub fn register(
    store: &Arc<Mutex<CredentialStore>>,
    request: RegistrationRequest,
) -> Result<RegistrationResponse> {
    let algorithm = select_algorithm(&request.algorithms)?;
    tracing::debug!(rp_id = %request.rp.id, %algorithm, "Registering credential");

    // Keygen (slow for RSA) happens before the store lock is taken, so
    // registrations for unrelated credentials can run in parallel.
    let key_pair = KeyPair::generate(algorithm).map_err(crate::store::StoreError::from)?;

    let (credential_id, public_key) = {
        let mut guard = store.lock().unwrap();
        guard.insert_credential(
            NewCredential {
                rp_id: request.rp.id.clone(),
                rp_name: request.rp.name.clone(),
                user_handle: request.user.id.clone(),
                user_name: request.user.name.clone(),
                user_display: request.user.display_name.clone(),
            },
            key_pair,
        )?
    };

    let rp_id_hash: [u8; 32] = Sha256::digest(request.rp.id.as_bytes()).into();
    let mut flags = FLAG_UP;
    if request.user_verification.is_required() {
        flags |= FLAG_UV;
    }

    let cose_key = encode_cose_key(&public_key)?;
    let auth_data = build_attested(&rp_id_hash, flags, 0, &credential_id, &cose_key);
    let attestation_object = build_attestation_object(&auth_data)?;
    let client_data = client_data_json("webauthn.create", &request.challenge, &request.rp.id);

    Ok(RegistrationResponse {
        credential_id: credential_id.to_vec(),
        client_data_json: client_data,
        attestation_object,
    })
}

/// First acceptable algorithm in ES256-then-RS256 priority order, whatever
/// the request order was. An empty list is a malformed request, a list with
/// no supported entry is `UnsupportedAlgorithm`.
fn select_algorithm(requested: &[i64]) -> Result<Algorithm> {
    if requested.is_empty() {
        return Err(Error::InvalidInput("empty pubKeyCredParams".into()));
    }
    Algorithm::PREFERENCE
        .into_iter()
        .find(|alg| requested.contains(&alg.cose_id()))
        .ok_or(Error::UnsupportedAlgorithm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_es256_preferred_over_rs256() {
        assert_eq!(select_algorithm(&[-257, -7]).unwrap(), Algorithm::Es256);
        assert_eq!(select_algorithm(&[-7, -257]).unwrap(), Algorithm::Es256);
    }

    #[test]
    fn test_rs256_selected_when_es256_absent() {
        assert_eq!(select_algorithm(&[-8, -257]).unwrap(), Algorithm::Rs256);
    }

    #[test]
    fn test_unsupported_algorithms_rejected() {
        assert!(matches!(
            select_algorithm(&[-8, -35]),
            Err(Error::UnsupportedAlgorithm)
        ));
    }

    #[test]
    fn test_empty_list_is_invalid_input() {
        assert!(matches!(
            select_algorithm(&[]),
            Err(Error::InvalidInput(_))
        ));
    }
}
