//! OAuth scope sets.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth permission strings.
///
/// Scopes are kept sorted so the comma-separated form is stable, which keeps
/// authorization URLs and stored sessions deterministic. Write scopes imply
/// the matching read scope (`write_orders` adds `read_orders`).
///
/// ```rust
/// use storefront_auth::AuthScopes;
///
/// let scopes: AuthScopes = "write_orders, read_products".parse().unwrap();
/// assert_eq!(scopes.to_string(), "read_orders,read_products,write_orders");
///
/// let required: AuthScopes = "read_orders".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes, implied ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if every scope in `other` is also in `self`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.is_subset(&self.scopes)
    }

    /// Returns an iterator over the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Builds a scope set from a platform-supplied string, skipping entries
    /// that do not look like scopes instead of failing.
    ///
    /// Token responses are trusted input but may carry scopes this crate
    /// does not validate the same way; dropping them is preferable to
    /// discarding an otherwise valid token.
    #[must_use]
    pub fn from_granted(raw: &str) -> Self {
        let mut set = Self {
            scopes: raw
                .split(',')
                .map(str::trim)
                .filter(|s| Self::is_valid_scope(s))
                .map(String::from)
                .collect(),
        };
        set.expand_implied();
        set
    }

    fn is_valid_scope(scope: &str) -> bool {
        !scope.is_empty()
            && scope
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn expand_implied(&mut self) {
        let implied: Vec<String> = self
            .scopes
            .iter()
            .filter_map(|scope| Self::implied_read_scope(scope))
            .collect();
        self.scopes.extend(implied);
    }

    fn implied_read_scope(scope: &str) -> Option<String> {
        if let Some(rest) = scope.strip_prefix("unauthenticated_write_") {
            return Some(format!("unauthenticated_read_{rest}"));
        }
        scope
            .strip_prefix("write_")
            .map(|rest| format!("read_{rest}"))
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !Self::is_valid_scope(scope) {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }

        let mut set = Self { scopes };
        set.expand_implied();
        Ok(set)
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
