//! Session-scoped context handed to the engine at construction.
//!
//! Participant identity and consent are owned by the host application; the
//! engine only carries them through to the submitted record.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ANONYMOUS_PREFIX: &str = "anon_";
const ANONYMOUS_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionContext {
    pub session_id: String,
    pub participant_id: String,
    pub consent: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(participant_id: impl Into<String>, consent: bool) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            participant_id: participant_id.into(),
            consent,
            last_login: None,
            started_at: Utc::now(),
        }
    }

    /// Context for a participant who skipped sign-in.
    pub fn anonymous() -> Self {
        Self::new(anonymous_participant_id(&mut rand::thread_rng()), true)
    }

    pub fn with_last_login(mut self, last_login: DateTime<Utc>) -> Self {
        self.last_login = Some(last_login);
        self
    }
}

/// `anon_` followed by nine lowercase base-36 characters.
pub fn anonymous_participant_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..ANONYMOUS_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{ANONYMOUS_PREFIX}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn anonymous_ids_use_prefix_and_base36_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = anonymous_participant_id(&mut rng);

        assert!(id.starts_with("anon_"));
        let suffix = &id["anon_".len()..];
        assert_eq!(suffix.len(), 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn each_context_gets_its_own_session_id() {
        let first = SessionContext::new("anon_a", true);
        let second = SessionContext::new("anon_a", true);
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn last_login_is_carried_on_the_context() {
        let login = Utc::now() - chrono::Duration::hours(3);
        let context = SessionContext::new("anon_b", false).with_last_login(login);

        assert_eq!(context.last_login, Some(login));
        assert!(context.started_at > login);
    }
}
