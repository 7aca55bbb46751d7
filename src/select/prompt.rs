use std::io::Write;

use super::Candidate;

/// Render the selection table to stderr so stdout stays clean JSON.
pub(crate) fn print_table(candidates: &[Candidate]) {
    eprintln!();
    eprintln!(
        "  {:>3}  {:<20} {:>12} {:>6}  {}",
        "#", "credential", "created", "count", "user"
    );
    for (index, candidate) in candidates.iter().enumerate() {
        eprintln!(
            "  {:>3}  {:<20} {:>12} {:>6}  {}",
            index,
            truncated_id(&candidate.id),
            candidate.created_at,
            candidate.sign_count,
            user_label(candidate),
        );
    }
    eprintln!();
}

pub(crate) fn print_question(count: usize) {
    eprint!("Select credential [0-{}]: ", count - 1);
    let _ = std::io::stderr().flush();
}

fn truncated_id(id: &[u8]) -> String {
    let hex: String = id.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{hex}…")
}

fn user_label(candidate: &Candidate) -> String {
    candidate
        .user_display
        .as_deref()
        .or(candidate.user_name.as_deref())
        .unwrap_or("(unknown)")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_id_is_eight_bytes_of_hex() {
        let id = [0xABu8; 16];
        assert_eq!(truncated_id(&id), "abababababababab…");
    }

    #[test]
    fn test_user_label_prefers_display_name() {
        let candidate = Candidate {
            id: [0; 16],
            created_at: 0,
            sign_count: 0,
            user_name: Some("alice".into()),
            user_display: Some("Alice Example".into()),
        };
        assert_eq!(user_label(&candidate), "Alice Example");

        let nameless = Candidate {
            user_display: None,
            user_name: None,
            ..candidate
        };
        assert_eq!(user_label(&nameless), "(unknown)");
    }
}
