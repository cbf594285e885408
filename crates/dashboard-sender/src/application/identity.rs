//! LocalIdentity: resolves the name the local participant is known by.
//!
//! The user may configure a name.  If they did not, the first call to
//! [`LocalIdentity::current_user`] generates a guest name (`guestNNNN`) and
//! keeps it, so every later `join`, `show` and `leave` uses the same name.

use dashboard_core::domain::identity::generate_guest_name;
use rand::Rng;
use tracing::info;

/// The local participant's display name.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    name: Option<String>,
    generated: bool,
}

impl LocalIdentity {
    /// Creates an identity from an optional configured name.  Blank names are
    /// treated as absent.
    pub fn new(configured: Option<String>) -> Self {
        let name = configured
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            name,
            generated: false,
        }
    }

    /// Returns the current name, generating a guest name on first use.
    pub fn current_user(&mut self) -> &str {
        self.current_user_with(&mut rand::thread_rng())
    }

    /// Same as [`current_user`](Self::current_user) with a caller-supplied RNG.
    pub fn current_user_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        if self.name.is_none() {
            let guest = generate_guest_name(rng);
            info!("no user name configured; using guest name {guest}");
            self.generated = true;
            self.name = Some(guest);
        }
        self.name.as_deref().unwrap_or_default()
    }

    /// Replaces the name, e.g. after the user edited it.
    pub fn set_user(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.generated = false;
    }

    /// Returns `true` if the current name was generated rather than chosen.
    pub fn was_generated(&self) -> bool {
        self.generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::domain::identity::is_guest_placeholder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_configured_name_is_returned_unchanged() {
        let mut identity = LocalIdentity::new(Some("alice".to_string()));
        assert_eq!(identity.current_user(), "alice");
        assert!(!identity.was_generated());
    }

    #[test]
    fn test_missing_name_generates_guest_once() {
        // Arrange
        let mut identity = LocalIdentity::new(None);
        let mut rng = StdRng::seed_from_u64(1);

        // Act
        let first = identity.current_user_with(&mut rng).to_string();
        let second = identity.current_user_with(&mut rng).to_string();

        // Assert: the generated name is kept for later calls
        assert_eq!(first, second);
        assert!(is_guest_placeholder(&first));
        assert!(identity.was_generated());
    }

    #[test]
    fn test_blank_configured_name_is_treated_as_missing() {
        let mut identity = LocalIdentity::new(Some("   ".to_string()));
        assert!(identity.current_user().starts_with("guest"));
    }

    #[test]
    fn test_set_user_replaces_generated_name() {
        let mut identity = LocalIdentity::new(None);
        identity.current_user();
        identity.set_user("bob");
        assert_eq!(identity.current_user(), "bob");
        assert!(!identity.was_generated());
    }
}
