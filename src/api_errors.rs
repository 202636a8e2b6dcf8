use crate::models::ApiEnvelope;
use crate::resources::ResourceKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    DuplicateCpf,
    DuplicateEmail,
    DuplicateRegistration,
    HasDependents,
    NotFound,
    Unauthorized,
    Network,
    Unknown,
}

// Ordered: first match wins.
static CLASSIFIERS: Lazy<Vec<(ErrorKind, Regex)>> = Lazy::new(|| {
    vec![
        (
            ErrorKind::DuplicateCpf,
            Regex::new(r"(?i)\bcpf\b.*\b(already|exists|duplicate|in use|registered)\b|\b(duplicate|already).*\bcpf\b")
                .expect("valid regex"),
        ),
        (
            ErrorKind::DuplicateEmail,
            Regex::new(r"(?i)\be-?mail\b.*\b(already|exists|duplicate|in use|registered)\b|\b(duplicate|already).*\be-?mail\b")
                .expect("valid regex"),
        ),
        (
            ErrorKind::DuplicateRegistration,
            Regex::new(r"(?i)\b(registration|matr[ií]cula)\b.*\b(already|exists|duplicate|in use)\b")
                .expect("valid regex"),
        ),
        (
            ErrorKind::HasDependents,
            Regex::new(r"(?i)\bdependents?\b|\b(related|linked|associated)\b.*\b(exists?|records?|teachers?|students?|classes|guardians?|subjects?)\b|foreign key")
                .expect("valid regex"),
        ),
        (
            ErrorKind::NotFound,
            Regex::new(r"(?i)\bnot found\b|\b404\b").expect("valid regex"),
        ),
        (
            ErrorKind::Unauthorized,
            Regex::new(r"(?i)\bunauthori[sz]ed\b|\bforbidden\b|\b40[13]\b|token (expired|invalid)")
                .expect("valid regex"),
        ),
        (
            ErrorKind::Network,
            Regex::new(r"(?i)\bnetwork\b|\btimed? ?out\b|connection (refused|reset)|failed to fetch")
                .expect("valid regex"),
        ),
    ]
});

impl ErrorKind {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::DuplicateCpf => "DUPLICATE_CPF",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            Self::HasDependents => "HAS_DEPENDENTS",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Network => "NETWORK",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code.trim().to_ascii_uppercase().as_str() {
            "DUPLICATE_CPF" => Self::DuplicateCpf,
            "DUPLICATE_EMAIL" => Self::DuplicateEmail,
            "DUPLICATE_REGISTRATION" => Self::DuplicateRegistration,
            "HAS_DEPENDENTS" => Self::HasDependents,
            "NOT_FOUND" => Self::NotFound,
            "UNAUTHORIZED" => Self::Unauthorized,
            "NETWORK" => Self::Network,
            "UNKNOWN" => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    pub fn classify(raw: &str) -> Self {
        CLASSIFIERS
            .iter()
            .find(|(_, pattern)| pattern.is_match(raw))
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Unknown)
    }

    pub fn user_message(self, resource: ResourceKind) -> String {
        match self {
            Self::DuplicateCpf => "A record with this CPF is already registered.".to_string(),
            Self::DuplicateEmail => "This email address is already in use.".to_string(),
            Self::DuplicateRegistration => {
                "This registration number is already in use.".to_string()
            }
            Self::HasDependents => format!(
                "This {} cannot be removed because related records exist. Remove or reassign them first.",
                resource.label()
            ),
            Self::NotFound => format!("The {} no longer exists. The list will be refreshed.", resource.label()),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Network => "Could not reach the server. Check your connection and try again.".to_string(),
            Self::Unknown => format!("Unexpected error while processing the {}.", resource.label()),
        }
    }
}

impl<T> ApiEnvelope<T> {
    /// Prefers an explicit collaborator code, falling back to the message table.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        if self.success {
            return None;
        }
        let from_code = self.code.as_deref().and_then(ErrorKind::from_code);
        Some(from_code.unwrap_or_else(|| {
            self.error
                .as_deref()
                .map(ErrorKind::classify)
                .unwrap_or(ErrorKind::Unknown)
        }))
    }

    pub fn user_error_message(&self, resource: ResourceKind) -> Option<String> {
        self.error_kind().map(|kind| kind.user_message(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use crate::models::ApiEnvelope;
    use crate::resources::ResourceKind;

    #[test]
    fn classifies_known_messages() {
        let cases = [
            ("CPF already registered", ErrorKind::DuplicateCpf),
            ("Duplicate key on cpf", ErrorKind::DuplicateCpf),
            ("Email already exists", ErrorKind::DuplicateEmail),
            ("Cannot delete: related teachers exist", ErrorKind::HasDependents),
            ("violates foreign key constraint", ErrorKind::HasDependents),
            ("Cannot delete subject with dependents", ErrorKind::HasDependents),
            ("Class has a dependent record", ErrorKind::HasDependents),
            ("Guardian is linked to students", ErrorKind::HasDependents),
            ("Student not found", ErrorKind::NotFound),
            ("401 Unauthorized", ErrorKind::Unauthorized),
            ("request timed out", ErrorKind::Network),
            ("something odd", ErrorKind::Unknown),
        ];
        for (raw, expected) in cases {
            assert_eq!(ErrorKind::classify(raw), expected, "{raw}");
        }
    }

    #[test]
    fn explicit_code_wins_over_message() {
        let envelope = ApiEnvelope::<()>::failure("Email already exists").with_code("has_dependents");
        assert_eq!(envelope.error_kind(), Some(ErrorKind::HasDependents));
    }

    #[test]
    fn success_has_no_error_kind() {
        assert_eq!(ApiEnvelope::ok(1).error_kind(), None);
        assert_eq!(ApiEnvelope::<u8>::failure("").error_kind(), Some(ErrorKind::Unknown));
    }

    #[test]
    fn codes_roundtrip_through_table() {
        for kind in [
            ErrorKind::DuplicateCpf,
            ErrorKind::HasDependents,
            ErrorKind::Network,
            ErrorKind::Unknown,
        ] {
            assert_eq!(ErrorKind::from_code(kind.as_code()), Some(kind));
        }
    }

    #[test]
    fn dependents_message_names_resource() {
        let message = ErrorKind::HasDependents.user_message(ResourceKind::Subject);
        assert!(message.contains("subject"));
    }
}
