use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use attestant::codec::cose;
use attestant::error::Error;
use attestant::keys::PublicKey;
use attestant::store::CredentialStore;
use attestant::webauthn;
use attestant::webauthn::attestation::parse_attestation_object;
use attestant::webauthn::authenticator_data::{self, FLAG_AT, FLAG_UP, FLAG_UV};
use attestant::webauthn::types::{
    AuthenticationRequest, RegistrationRequest, RelyingParty, UserEntity, UserVerification,
};

fn open_store(dir: &tempfile::TempDir) -> Arc<Mutex<CredentialStore>> {
    Arc::new(Mutex::new(
        CredentialStore::open(dir.path().to_path_buf()).unwrap(),
    ))
}

fn registration_request(challenge: &str, algorithms: Vec<i64>) -> RegistrationRequest {
    RegistrationRequest {
        rp: RelyingParty {
            id: "localhost".into(),
            name: Some("Local Test".into()),
        },
        user: UserEntity {
            id: b"testuser_id".to_vec(),
            name: Some("tester".into()),
            display_name: Some("Test User".into()),
        },
        challenge: challenge.into(),
        algorithms,
        user_verification: UserVerification::Preferred,
    }
}

fn authentication_request(challenge: &str) -> AuthenticationRequest {
    AuthenticationRequest {
        rp_id: "localhost".into(),
        challenge: challenge.into(),
        allow_credentials: None,
        user_verification: UserVerification::Preferred,
    }
}

fn verify(key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    match key {
        PublicKey::Ec { x, y } => {
            use p256::ecdsa::signature::Verifier;
            use p256::elliptic_curve::generic_array::GenericArray;
            let point = p256::EncodedPoint::from_affine_coordinates(
                GenericArray::from_slice(x),
                GenericArray::from_slice(y),
                false,
            );
            let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_encoded_point(&point) else {
                return false;
            };
            let Ok(signature) = p256::ecdsa::Signature::from_der(signature) else {
                return false;
            };
            verifying_key.verify(message, &signature).is_ok()
        }
        PublicKey::Rsa { n, e } => {
            use rsa::signature::Verifier;
            let Ok(public_key) = rsa::RsaPublicKey::new(
                rsa::BigUint::from_bytes_be(n),
                rsa::BigUint::from_bytes_be(e),
            ) else {
                return false;
            };
            let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public_key);
            let Ok(signature) = rsa::pkcs1v15::Signature::try_from(signature) else {
                return false;
            };
            verifying_key.verify(message, &signature).is_ok()
        }
    }
}

#[test]
fn test_register_es256_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let response = webauthn::register(
        &store,
        registration_request("AAAAAAAAAAAAAAAAAAAAAA", vec![-7]),
    )
    .unwrap();

    assert_eq!(
        String::from_utf8(response.client_data_json.clone()).unwrap(),
        r#"{"type":"webauthn.create","challenge":"AAAAAAAAAAAAAAAAAAAAAA","origin":"https://localhost"}"#
    );

    let object = parse_attestation_object(&response.attestation_object).unwrap();
    assert_eq!(object.fmt, "none");
    assert!(object.att_stmt.0.is_empty());

    let auth_data = authenticator_data::parse(&object.auth_data).unwrap();
    let expected_hash: [u8; 32] = Sha256::digest(b"localhost").into();
    assert_eq!(auth_data.rp_id_hash, expected_hash);
    assert_ne!(auth_data.flags & FLAG_UP, 0, "UP must be set");
    assert_ne!(auth_data.flags & FLAG_AT, 0, "AT must be set");
    assert_eq!(auth_data.flags & FLAG_UV, 0, "UV must not be set");
    assert_eq!(auth_data.sign_count, 0);

    let attested = auth_data.attested.unwrap();
    assert_eq!(attested.aaguid, [0u8; 16]);
    assert_eq!(attested.credential_id, response.credential_id);
    assert_eq!(attested.credential_id.len(), 16);
    let key = cose::decode_cose_key(&attested.cose_key).unwrap();
    assert!(matches!(key, PublicKey::Ec { .. }));

    // Credential and metadata are persisted before the response returns.
    let guard = store.lock().unwrap();
    let id: [u8; 16] = response.credential_id.as_slice().try_into().unwrap();
    assert!(guard.has_credential(&id));
    assert_eq!(guard.metadata(&id).unwrap().sign_count, 0);
}

#[test]
fn test_authenticate_es256_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let created = webauthn::register(
        &store,
        registration_request("AAAAAAAAAAAAAAAAAAAAAA", vec![-7]),
    )
    .unwrap();
    let object = parse_attestation_object(&created.attestation_object).unwrap();
    let registered_key = cose::decode_cose_key(
        &authenticator_data::parse(&object.auth_data)
            .unwrap()
            .attested
            .unwrap()
            .cose_key,
    )
    .unwrap();

    let assertion = webauthn::authenticate(
        &store,
        authentication_request("BBBBBBBBBBBBBBBBBBBBBB"),
        false,
    )
    .unwrap();

    assert_eq!(
        String::from_utf8(assertion.client_data_json.clone()).unwrap(),
        r#"{"type":"webauthn.get","challenge":"BBBBBBBBBBBBBBBBBBBBBB","origin":"https://localhost"}"#
    );
    assert_eq!(assertion.credential_id, created.credential_id);
    assert_eq!(assertion.user_handle.as_deref(), Some(&b"testuser_id"[..]));

    let auth_data = authenticator_data::parse(&assertion.authenticator_data).unwrap();
    assert_eq!(auth_data.sign_count, 1);
    assert!(auth_data.attested.is_none());

    // Signature covers authenticatorData || SHA256(clientDataJSON).
    let mut message = assertion.authenticator_data.clone();
    message.extend_from_slice(&Sha256::digest(&assertion.client_data_json));
    assert!(verify(&registered_key, &message, &assertion.signature));

    // Any altered byte must fail verification.
    let mut tampered = message.clone();
    tampered[0] ^= 0x01;
    assert!(!verify(&registered_key, &tampered, &assertion.signature));
    let mut bad_signature = assertion.signature.clone();
    let last = bad_signature.len() - 1;
    bad_signature[last] ^= 0x01;
    assert!(!verify(&registered_key, &message, &bad_signature));

    // Persisted sign count increased by exactly 1.
    let guard = store.lock().unwrap();
    let id: [u8; 16] = assertion.credential_id.as_slice().try_into().unwrap();
    assert_eq!(guard.metadata(&id).unwrap().sign_count, 1);
}

#[test]
fn test_register_and_authenticate_rs256() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let created = webauthn::register(
        &store,
        registration_request("Y2hhbGxlbmdl", vec![-257]),
    )
    .unwrap();
    let object = parse_attestation_object(&created.attestation_object).unwrap();
    let registered_key = cose::decode_cose_key(
        &authenticator_data::parse(&object.auth_data)
            .unwrap()
            .attested
            .unwrap()
            .cose_key,
    )
    .unwrap();
    let PublicKey::Rsa { ref n, ref e } = registered_key else {
        panic!("RS256 registration must produce an RSA key");
    };
    assert_eq!(n.len(), 256);
    assert_eq!(e, &vec![0x01, 0x00, 0x01]);

    let assertion = webauthn::authenticate(&store, authentication_request("cmVzcG9uc2U"), false)
        .unwrap();
    let mut message = assertion.authenticator_data.clone();
    message.extend_from_slice(&Sha256::digest(&assertion.client_data_json));
    assert!(verify(&registered_key, &message, &assertion.signature));
}

#[test]
fn test_uv_flag_follows_requirement() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let mut request = registration_request("challenge", vec![-7]);
    request.user_verification = UserVerification::Required;
    let created = webauthn::register(&store, request).unwrap();
    let object = parse_attestation_object(&created.attestation_object).unwrap();
    let auth_data = authenticator_data::parse(&object.auth_data).unwrap();
    assert_ne!(auth_data.flags & FLAG_UV, 0, "UV must be set when required");

    let mut get = authentication_request("challenge2");
    get.user_verification = UserVerification::Required;
    let assertion = webauthn::authenticate(&store, get, false).unwrap();
    let auth_data = authenticator_data::parse(&assertion.authenticator_data).unwrap();
    assert_eq!(auth_data.flags & FLAG_UV, FLAG_UV);
}

#[test]
fn test_unsupported_algorithms_abort_registration() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let result = webauthn::register(&store, registration_request("c", vec![-8, -35]));
    assert!(matches!(result, Err(Error::UnsupportedAlgorithm)));
    assert_eq!(store.lock().unwrap().credential_count(), 0);

    let result = webauthn::register(&store, registration_request("c", vec![]));
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_authenticate_without_credentials_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let result = webauthn::authenticate(&store, authentication_request("c"), false);
    assert!(matches!(result, Err(Error::NoMatchingCredential)));
}

#[test]
fn test_allow_list_intersects_with_relying_party_scope() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let first = webauthn::register(&store, registration_request("c1", vec![-7])).unwrap();
    let second = webauthn::register(&store, registration_request("c2", vec![-7])).unwrap();
    let third = webauthn::register(&store, registration_request("c3", vec![-7])).unwrap();

    // Allow list restricts the rpId-scoped candidates; its order does not
    // override candidate (insertion) order.
    let mut request = authentication_request("pick");
    request.allow_credentials = Some(vec![
        third.credential_id.clone(),
        second.credential_id.clone(),
    ]);
    let assertion = webauthn::authenticate(&store, request, false).unwrap();
    assert_eq!(assertion.credential_id, second.credential_id);

    // An allow list naming no stored credential yields no match.
    let mut request = authentication_request("miss");
    request.allow_credentials = Some(vec![vec![0xEE; 16]]);
    let result = webauthn::authenticate(&store, request, false);
    assert!(matches!(result, Err(Error::NoMatchingCredential)));

    // Without an allow list, the first credential by insertion order wins.
    let assertion = webauthn::authenticate(&store, authentication_request("auto"), false).unwrap();
    assert_eq!(assertion.credential_id, first.credential_id);
}

#[test]
fn test_select_credential_over_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let first = webauthn::register(&store, registration_request("c1", vec![-7])).unwrap();
    let second = webauthn::register(&store, registration_request("c2", vec![-7])).unwrap();

    let guard = store.lock().unwrap();
    let picked =
        attestant::select::select_credential(&guard, "localhost", None, false).unwrap();
    assert_eq!(picked.to_vec(), first.credential_id);

    let second_id: [u8; 16] = second.credential_id.as_slice().try_into().unwrap();
    let picked =
        attestant::select::select_credential(&guard, "localhost", Some(&[second_id]), false)
            .unwrap();
    assert_eq!(picked, second_id);

    let result = attestant::select::select_credential(&guard, "nowhere.example", None, false);
    assert!(matches!(result, Err(Error::NoMatchingCredential)));
}

#[test]
fn test_allow_list_does_not_leak_other_relying_parties() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let mut foreign = registration_request("c", vec![-7]);
    foreign.rp.id = "other.example".into();
    let foreign = webauthn::register(&store, foreign).unwrap();

    // The allow list names a real credential, but one scoped to a different
    // relying party; the intersection must be empty.
    let mut request = authentication_request("c");
    request.allow_credentials = Some(vec![foreign.credential_id]);
    let result = webauthn::authenticate(&store, request, false);
    assert!(matches!(result, Err(Error::NoMatchingCredential)));
}
