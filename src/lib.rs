pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod options;
pub mod output;
pub mod select;
pub mod store;
pub mod webauthn;

pub use error::{Error, Result};

use std::sync::{Arc, Mutex};

use config::{Command, Config};
use store::CredentialStore;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    let store_dir = cfg.resolve_store_dir()?;
    let store = Arc::new(Mutex::new(CredentialStore::open(store_dir)?));

    match &cfg.command {
        Command::Create { options } => {
            let request = options::parse_creation_options(&read_options(options)?)?;
            let response = webauthn::register(&store, request)?;
            print_json(&output::registration_json(&response, cfg.encoding))?;
        }
        Command::Get {
            options,
            interactive,
        } => {
            let request = options::parse_request_options(&read_options(options)?)?;
            let response = webauthn::authenticate(&store, request, *interactive)?;
            print_json(&output::assertion_json(&response, cfg.encoding))?;
        }
        Command::List => {
            let guard = store.lock().unwrap();
            list_credentials(&guard);
        }
        Command::Inspect { attestation_object } => {
            inspect(attestation_object)?;
        }
    }
    Ok(())
}

fn read_options(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_credentials(store: &CredentialStore) {
    let records = store.all();
    if records.is_empty() {
        println!("No credentials stored.");
        return;
    }
    println!(
        "{:<34} {:<24} {:<8} {:>12} {:>6}  {}",
        "credential", "rp", "alg", "created", "count", "user"
    );
    for record in records {
        let hex: String = record
            .credential_id
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let user = record
            .user_display
            .as_deref()
            .or(record.user_name.as_deref())
            .unwrap_or("(unknown)");
        println!(
            "{:<34} {:<24} {:<8} {:>12} {:>6}  {}",
            hex, record.rp_id, record.algorithm, record.created_at, record.sign_count, user
        );
    }
}

/// Decode an attestation object and dump its structure, re-deriving a usable
/// key from the embedded COSE bytes as a sanity check.
fn inspect(attestation_object_b64: &str) -> anyhow::Result<()> {
    let bytes = options::decode_base64_any(attestation_object_b64)?;
    let object = webauthn::attestation::parse_attestation_object(&bytes)?;
    let auth_data = webauthn::authenticator_data::parse(&object.auth_data)?;

    println!("fmt:       {}", object.fmt);
    println!(
        "rpIdHash:  {}",
        auth_data
            .rp_id_hash
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>()
    );
    println!("flags:     {:#04x}", auth_data.flags);
    println!("signCount: {}", auth_data.sign_count);
    if let Some(attested) = &auth_data.attested {
        let cred_hex: String = attested
            .credential_id
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        println!("aaguid:    {:02x?}", attested.aaguid);
        println!("credId:    {cred_hex}");
        let key = codec::cose::decode_cose_key(&attested.cose_key)?;
        match key {
            keys::PublicKey::Ec { .. } => println!("key:       EC P-256 (ES256)"),
            keys::PublicKey::Rsa { n, .. } => {
                println!("key:       RSA-{} (RS256)", n.len() * 8);
            }
        }
    }
    Ok(())
}
