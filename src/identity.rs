//! Signed-in user as seen by the core components.
//!
//! Passed explicitly to the campus resolver and the notification store
//! instead of being read from shared app state.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            email: Some(email.into()).filter(|e: &String| !e.trim().is_empty()),
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.email.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_email_is_anonymous() {
        let id = Identity::new("  ", Some("tok".into()));
        assert!(!id.is_signed_in());
        assert_eq!(id.token(), Some("tok"));
    }

    #[test]
    fn test_empty_token_dropped() {
        let id = Identity::new("a@b.edu", Some(String::new()));
        assert_eq!(id.email(), Some("a@b.edu"));
        assert!(id.token().is_none());
    }
}
