use std::path::PathBuf;

use crate::output::BinaryEncoding;

/// Software authenticator identifier: all-zero, as required for a simulator
/// with no hardware identity.
pub const AAGUID: [u8; 16] = [0u8; 16];

#[derive(clap::Parser, Debug)]
#[command(name = "attestant", version, about = "Software WebAuthn authenticator simulator")]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Directory holding credential metadata and key material.
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,
    /// Encoding for binary fields in JSON output.
    #[arg(long, value_enum, default_value = "base64url", global = true)]
    pub encoding: BinaryEncoding,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Produce an attestation response for registration options.
    Create {
        /// Path to the creation options JSON, or `-` for stdin.
        #[arg(default_value = "-")]
        options: String,
    },
    /// Produce a signed assertion for authentication options.
    Get {
        /// Path to the request options JSON, or `-` for stdin.
        #[arg(default_value = "-")]
        options: String,
        /// Prompt when several credentials match instead of picking the first.
        #[arg(long)]
        interactive: bool,
    },
    /// List stored credentials.
    List,
    /// Decode a base64url attestation object and print its contents.
    Inspect { attestation_object: String },
}

impl Config {
    pub fn resolve_store_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.store_dir {
            return Ok(dir.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", "attestant")
            .ok_or_else(|| anyhow::anyhow!("cannot determine XDG data dir"))?;
        Ok(dirs.data_dir().join("credentials"))
    }
}
