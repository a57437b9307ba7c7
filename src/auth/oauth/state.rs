//! Authorization state values for CSRF protection.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// The `state` value that binds an OAuth callback to its `begin` request.
///
/// Generated values are 32 alphanumeric characters drawn from the thread-local
/// CSPRNG (about 190 bits of entropy), so they cannot be guessed by a third
/// party crafting a callback.
///
/// ```rust
/// use storefront_auth::auth::oauth::StateParam;
///
/// let state = StateParam::new();
/// assert_eq!(state.as_ref().len(), 32);
/// assert_ne!(state, StateParam::new());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateParam(String);

impl StateParam {
    /// Length of generated state values.
    pub const LENGTH: usize = 32;

    /// Generates a fresh random state value.
    #[must_use]
    pub fn new() -> Self {
        let value: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LENGTH)
            .map(char::from)
            .collect();
        Self(value)
    }

    /// Wraps a state value received from the platform.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_generates_alphanumeric_value_of_fixed_length() {
        let state = StateParam::new();
        assert_eq!(state.as_ref().len(), StateParam::LENGTH);
        assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_values_do_not_repeat() {
        let values: HashSet<StateParam> = (0..1_000).map(|_| StateParam::new()).collect();
        assert_eq!(values.len(), 1_000);
    }

    #[test]
    fn test_from_raw_and_display() {
        let state = StateParam::from_raw("custom-state");
        assert_eq!(state.as_ref(), "custom-state");
        assert_eq!(state.to_string(), "custom-state");
        assert_eq!(state, StateParam::from_raw("custom-state"));
    }
}
