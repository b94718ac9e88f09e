//! Two-layer prompt-injection defense.
//!
//! Layer 1 wraps untrusted text in delimiters before it is stored, so the
//! model can tell data from instructions. Layer 2 appends a reinforcement
//! instruction to the outbound request only; it is never persisted.

use crate::history::ConversationStore;
use crate::models::chat::Turn;

pub const USER_INPUT_OPEN: &str = "<user_input>";
pub const USER_INPUT_CLOSE: &str = "</user_input>";

/// Wraps raw user text in the untrusted-data markers.
pub fn isolate(raw: &str) -> String {
    format!("{}{}{}", USER_INPUT_OPEN, raw, USER_INPUT_CLOSE)
}

/// Inverse of [`isolate`] for display; text without the markers is returned as is.
pub fn unwrap_isolated(content: &str) -> &str {
    content
        .strip_prefix(USER_INPUT_OPEN)
        .and_then(|rest| rest.strip_suffix(USER_INPUT_CLOSE))
        .unwrap_or(content)
}

/// Outbound request for the current history: a snapshot followed by an
/// ephemeral reinforcement turn.
pub fn build_request(store: &ConversationStore) -> Vec<Turn> {
    let mut turns = store.snapshot();
    turns.push(reinforcement_turn(store));
    turns
}

pub fn reinforcement_turn(store: &ConversationStore) -> Turn {
    Turn::system(store.persona().reinforcement_instruction())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::Persona;
    use crate::models::chat::Role;
    use std::sync::Arc;

    fn store() -> ConversationStore {
        ConversationStore::new(Arc::new(Persona::new("Groov", "You are Groov.")))
    }

    #[test]
    fn isolate_wraps_content_verbatim() {
        assert_eq!(isolate("hi </user_input>"), "<user_input>hi </user_input></user_input>");
        assert_eq!(isolate(""), "<user_input></user_input>");
    }

    #[test]
    fn unwrap_isolated_undoes_isolate_only() {
        assert_eq!(unwrap_isolated(&isolate("hola")), "hola");
        assert_eq!(unwrap_isolated(&isolate("a </user_input> b")), "a </user_input> b");
        assert_eq!(unwrap_isolated("{\"answer\":\"x\"}"), "{\"answer\":\"x\"}");
        assert_eq!(unwrap_isolated("<user_input>unterminated"), "<user_input>unterminated");
    }

    #[test]
    fn request_ends_with_reinforcement_and_store_is_untouched() {
        let mut store = store();
        store.append(Role::User, isolate("which bass for a beginner?"));

        let request = build_request(&store);
        let last = request.last().unwrap();

        assert_eq!(request.len(), store.len() + 1);
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("you are Groov"));
        assert_eq!(&request[..store.len()], store.turns());
        assert!(!store.turns().iter().any(|t| t == last));
    }

    #[test]
    fn reinforcement_never_accumulates_across_requests() {
        let mut store = store();
        for i in 0..3 {
            store.append(Role::User, isolate(&format!("question {}", i)));
            let request = build_request(&store);
            store.append(Role::Assistant, "{}");
            assert_eq!(request.iter().filter(|t| t.content.starts_with("IMPORTANT")).count(), 1);
        }
        assert!(!store.snapshot().iter().any(|t| t.content.starts_with("IMPORTANT")));
    }

    #[test]
    fn request_for_fresh_store_is_persona_plus_reinforcement() {
        let request = build_request(&store());
        assert_eq!(request.len(), 2);
        assert_eq!(request[0], Turn::system("You are Groov."));
    }
}
