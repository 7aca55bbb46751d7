use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::select;
use crate::store::{CredentialId, CredentialStore};

use super::authenticator_data::{build_plain, FLAG_UP, FLAG_UV};
use super::types::{client_data_json, AuthenticationRequest, AuthenticationResponse};

/// The `get` flow: resolve a credential, bump its sign counter (persisted
/// before the response is assembled), and sign
/// `authenticatorData || SHA256(clientDataJSON)`.
pub fn authenticate(
    store: &Arc<Mutex<CredentialStore>>,
    request: AuthenticationRequest,
    interactive: bool,
) -> Result<AuthenticationResponse> {
    // Allow-list entries of a foreign length can never name one of our
    // credentials; drop them up front so the intersection stays simple.
    let allow = request.allow_credentials.as_ref().map(|list| {
        list.iter()
            .filter_map(|id| CredentialId::try_from(id.as_slice()).ok())
            .collect::<Vec<_>>()
    });

    // Candidate enumeration runs under the lock; the interactive prompt must
    // not, or it would block every other caller of the store.
    let candidates = {
        let guard = store.lock().unwrap();
        select::candidates(&guard, &request.rp_id, allow.as_deref())
    };
    let credential_id = select::choose(&candidates, interactive)?;

    let rp_id_hash: [u8; 32] = Sha256::digest(request.rp_id.as_bytes()).into();
    let mut flags = FLAG_UP;
    if request.user_verification.is_required() {
        flags |= FLAG_UV;
    }

    let client_data = client_data_json("webauthn.get", &request.challenge, &request.rp_id);
    let client_data_hash = Sha256::digest(&client_data);

    let (auth_data, signature, user_handle) = {
        let mut guard = store.lock().unwrap();
        let new_count = guard.increment_sign_count(&credential_id)?;
        tracing::debug!(count = new_count, "Sign counter incremented");

        let auth_data = build_plain(&rp_id_hash, flags, new_count);
        let mut message = Vec::with_capacity(auth_data.len() + client_data_hash.len());
        message.extend_from_slice(&auth_data);
        message.extend_from_slice(&client_data_hash);

        let signature = guard.sign_with_credential(&credential_id, &message)?;
        let user_handle = guard
            .metadata(&credential_id)
            .map(|m| m.user_handle.clone())
            .filter(|handle| !handle.is_empty());
        (auth_data, signature, user_handle)
    };

    Ok(AuthenticationResponse {
        credential_id: credential_id.to_vec(),
        client_data_json: client_data,
        authenticator_data: auth_data,
        signature,
        user_handle,
    })
}
