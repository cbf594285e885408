//! Local participant naming rules.
//!
//! A user who never typed a name is given a random guest name of the form
//! `guest` followed by four digits (e.g. `guest0427`).  Guest names, the
//! literal anonymous name `Guest`, and the empty name are all *placeholders*:
//! the message feed never labels a placeholder as "me", because two devices
//! may well pick the same placeholder.

use rand::Rng;

/// Name used for an anonymous participant.
pub const ANONYMOUS_USER: &str = "Guest";

/// Prefix of generated guest names.
pub const GUEST_PREFIX: &str = "guest";

/// Number of random decimal digits appended to [`GUEST_PREFIX`].
pub const GUEST_DIGITS: usize = 4;

/// Generates a random guest name such as `guest0427`.
pub fn generate_guest_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut name = String::with_capacity(GUEST_PREFIX.len() + GUEST_DIGITS);
    name.push_str(GUEST_PREFIX);
    for _ in 0..GUEST_DIGITS {
        let digit: u8 = rng.gen_range(0..10);
        name.push(char::from(b'0' + digit));
    }
    name
}

/// Returns `true` if `name` is a placeholder rather than a chosen identity.
pub fn is_guest_placeholder(name: &str) -> bool {
    if name.is_empty() || name == ANONYMOUS_USER {
        return true;
    }
    match name.strip_prefix(GUEST_PREFIX) {
        Some(digits) => digits.len() == GUEST_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_guest_name_has_prefix_and_four_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = generate_guest_name(&mut rng);
        assert!(name.starts_with("guest"));
        assert_eq!(name.len(), 9);
        assert!(name[5..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generated_guest_name_is_placeholder() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let name = generate_guest_name(&mut rng);
            assert!(is_guest_placeholder(&name), "{name} must be a placeholder");
        }
    }

    #[test]
    fn test_anonymous_and_empty_names_are_placeholders() {
        assert!(is_guest_placeholder("Guest"));
        assert!(is_guest_placeholder(""));
    }

    #[test]
    fn test_chosen_names_are_not_placeholders() {
        assert!(!is_guest_placeholder("alice"));
        assert!(!is_guest_placeholder("guest"));
        assert!(!is_guest_placeholder("guest12"));
        assert!(!is_guest_placeholder("guest12345"));
        assert!(!is_guest_placeholder("guestabcd"));
        assert!(!is_guest_placeholder("Guesthouse"));
    }
}
