//! Resolves which stored credential an authentication request should use.
//!
//! Pure over the store contents; the only side effect is the interactive
//! prompt, and even that falls back to the first candidate when no input is
//! available. Unattended scripting must never hang or crash here.

pub mod prompt;

use crate::error::{Error, Result};
use crate::store::{CredentialId, CredentialStore};

/// What the prompt shows per matching credential.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: CredentialId,
    pub created_at: u64,
    pub sign_count: u32,
    pub user_name: Option<String>,
    pub user_display: Option<String>,
}

/// Enumerate credentials for `rp_id` in stable insertion order, intersected
/// with the allow list when one is given. Candidate order wins over allow
/// list order.
pub fn candidates(
    store: &CredentialStore,
    rp_id: &str,
    allow: Option<&[CredentialId]>,
) -> Vec<Candidate> {
    store
        .credentials_for_rp(rp_id)
        .into_iter()
        .filter(|id| allow.map_or(true, |list| list.contains(id)))
        .filter_map(|id| {
            store.metadata(&id).map(|m| Candidate {
                id,
                created_at: m.created_at,
                sign_count: m.sign_count,
                user_name: m.user_name.clone(),
                user_display: m.user_display.clone(),
            })
        })
        .collect()
}

/// Pick one candidate. Zero candidates is `NoMatchingCredential`; several in
/// non-interactive mode picks the first with a warning; interactive mode
/// prompts on stdin.
pub fn choose(candidates: &[Candidate], interactive: bool) -> Result<CredentialId> {
    match candidates {
        [] => Err(Error::NoMatchingCredential),
        [only] => Ok(only.id),
        many if !interactive => {
            tracing::warn!(
                count = many.len(),
                "multiple credentials match; selecting the first automatically"
            );
            Ok(many[0].id)
        }
        many => {
            let stdin = std::io::stdin();
            Ok(choose_interactive(many, &mut stdin.lock()))
        }
    }
}

/// Convenience wrapper combining enumeration and choice.
pub fn select_credential(
    store: &CredentialStore,
    rp_id: &str,
    allow: Option<&[CredentialId]>,
    interactive: bool,
) -> Result<CredentialId> {
    choose(&candidates(store, rp_id, allow), interactive)
}

/// Blocking prompt loop. Out-of-range or non-numeric answers re-prompt; an
/// exhausted or broken input stream falls back to the first candidate.
fn choose_interactive(candidates: &[Candidate], input: &mut dyn std::io::BufRead) -> CredentialId {
    prompt::print_table(candidates);
    loop {
        prompt::print_question(candidates.len());
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                tracing::warn!("no interactive input available; selecting the first credential");
                return candidates[0].id;
            }
            Ok(_) => match line.trim().parse::<usize>() {
                Ok(index) if index < candidates.len() => return candidates[index].id,
                _ => eprintln!("Invalid selection: {}", line.trim()),
            },
        }
    }
}
