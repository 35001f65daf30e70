//! Named placeholder tokens for deferred substitution.
//!
//! A string field carrying the `Placeholders` directive gets its token list
//! registered when it is loaded. Registration hands back a [`PlaceholderKey`];
//! [`PlaceholderRegistry::replace`] later substitutes positional arguments for
//! those tokens:
//!
//! ```ignore
//! let key = registry.add(["name", "{COUNT}"])?;
//! let text = registry.replace(key, "{NAME} has {COUNT} items", &[&"cart", &3])?;
//! assert_eq!(text, "cart has 3 items");
//! ```
//!
//! Entries live until they are removed. [`Config`](crate::Config) removes its
//! own entries on reload and on drop; anything registered by hand must be
//! removed by the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::error::YamlfigError;

/// Opaque handle to a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderKey(u64);

/// Token lists keyed by [`PlaceholderKey`].
#[derive(Debug, Default)]
pub struct PlaceholderRegistry {
    entries: Mutex<HashMap<PlaceholderKey, Vec<String>>>,
    next: AtomicU64,
}

static GLOBAL: OnceLock<Arc<PlaceholderRegistry>> = OnceLock::new();

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by configs that were not given one.
    pub fn global() -> Arc<PlaceholderRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(PlaceholderRegistry::new()))
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PlaceholderKey, Vec<String>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an ordered token list. Each token is normalized to
    /// `{UPPER_SNAKE}` form; see [`to_placeholder_name`].
    pub fn add<I, S>(&self, tokens: I) -> Result<PlaceholderKey, YamlfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = tokens
            .into_iter()
            .map(|t| to_placeholder_name(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let key = PlaceholderKey(self.next.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(key, names);
        Ok(key)
    }

    /// The canonical token names registered under `key`.
    pub fn get(&self, key: PlaceholderKey) -> Result<Vec<String>, YamlfigError> {
        self.lock()
            .get(&key)
            .cloned()
            .ok_or(YamlfigError::PlaceholderNotFound)
    }

    pub fn contains(&self, key: PlaceholderKey) -> bool {
        self.lock().contains_key(&key)
    }

    /// Replace every occurrence of the `i`-th registered token in `value`
    /// with `args[i]`. Tokens without a matching argument are left intact.
    pub fn replace(
        &self,
        key: PlaceholderKey,
        value: &str,
        args: &[&dyn fmt::Display],
    ) -> Result<String, YamlfigError> {
        let tokens = self.get(key)?;
        let mut out = value.to_string();
        for (token, arg) in tokens.iter().zip(args) {
            out = out.replace(token.as_str(), &arg.to_string());
        }
        Ok(out)
    }

    /// Remove one entry. Returns whether it existed.
    pub fn remove(&self, key: PlaceholderKey) -> bool {
        self.lock().remove(&key).is_some()
    }

    pub fn remove_all<I: IntoIterator<Item = PlaceholderKey>>(&self, keys: I) {
        let mut entries = self.lock();
        for key in keys {
            entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Normalize a token name to its canonical `{UPPER_SNAKE}` form.
///
/// Accepts an already bracketed upper-snake name (`{MY_TOKEN}`), a bare
/// upper-snake name (`MY_TOKEN`) or a bare kebab-case name (`my-token`).
pub fn to_placeholder_name(name: &str) -> Result<String, YamlfigError> {
    if let Some(inner) = name.strip_prefix('{').and_then(|n| n.strip_suffix('}'))
        && is_word(inner, |c| c.is_ascii_uppercase() || c.is_ascii_digit(), '_')
    {
        return Ok(name.to_string());
    }
    if is_word(name, |c| c.is_ascii_lowercase() || c.is_ascii_digit(), '-') {
        return Ok(format!("{{{}}}", name.to_ascii_uppercase().replace('-', "_")));
    }
    if is_word(name, |c| c.is_ascii_uppercase() || c.is_ascii_digit(), '_') {
        return Ok(format!("{{{name}}}"));
    }
    Err(YamlfigError::InvalidPlaceholder(name.to_string()))
}

/// Non-empty, made of `allowed` chars and `sep`, not starting or ending with `sep`.
fn is_word(s: &str, allowed: impl Fn(char) -> bool, sep: char) -> bool {
    !s.is_empty()
        && !s.starts_with(sep)
        && !s.ends_with(sep)
        && s.chars().all(|c| c == sep || allowed(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_token_shapes() {
        assert_eq!(to_placeholder_name("{TEST}").unwrap(), "{TEST}");
        assert_eq!(to_placeholder_name("PLACEHOLDER").unwrap(), "{PLACEHOLDER}");
        assert_eq!(
            to_placeholder_name("another-placeholder").unwrap(),
            "{ANOTHER_PLACEHOLDER}"
        );
        assert_eq!(to_placeholder_name("test2").unwrap(), "{TEST2}");
    }

    #[test]
    fn rejects_invalid_tokens() {
        for bad in ["", "_LEAD", "trail-", "Mixed", "{lower}", "{_X}", "with space"] {
            assert!(
                matches!(to_placeholder_name(bad), Err(YamlfigError::InvalidPlaceholder(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn replace_is_positional() {
        let registry = PlaceholderRegistry::new();
        let value = "{PLACEHOLDER1} {PLACEHOLDER2} {PLACEHOLDER3}";
        let key = registry
            .add(["placeholder3", "PLACEHOLDER1", "{PLACEHOLDER2}"])
            .unwrap();
        assert_eq!(registry.replace(key, value, &[&"1", &"2", &"3"]).unwrap(), "2 3 1");
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(key));
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_with_two_tokens() {
        let registry = PlaceholderRegistry::new();
        let key = registry.add(["A", "B"]).unwrap();
        let out = registry.replace(key, "{A} and {B}", &[&"x", &2]).unwrap();
        assert_eq!(out, "x and 2");
    }

    #[test]
    fn unmatched_tokens_are_left_intact() {
        let registry = PlaceholderRegistry::new();
        let key = registry.add(["A", "B"]).unwrap();
        let out = registry.replace(key, "{A} {B} {A}", &[&"x"]).unwrap();
        assert_eq!(out, "x {B} x");
    }

    #[test]
    fn unregistered_key_fails() {
        let registry = PlaceholderRegistry::new();
        let other = PlaceholderRegistry::new();
        let key = other.add(["A"]).unwrap();
        assert!(!registry.contains(key));
        assert!(matches!(
            registry.replace(key, "{A}", &[&"x"]),
            Err(YamlfigError::PlaceholderNotFound)
        ));
    }

    #[test]
    fn removed_key_fails_the_same_way() {
        let registry = PlaceholderRegistry::new();
        let key = registry.add(["A", "B"]).unwrap();
        registry.remove_all([key]);
        assert!(!registry.contains(key));
        assert!(matches!(
            registry.replace(key, "{A}", &[&"x"]),
            Err(YamlfigError::PlaceholderNotFound)
        ));
        assert!(matches!(registry.get(key), Err(YamlfigError::PlaceholderNotFound)));
    }

    #[test]
    fn invalid_token_fails_registration() {
        let registry = PlaceholderRegistry::new();
        assert!(registry.add(["ok", "Not Ok"]).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn global_is_shared() {
        let a = PlaceholderRegistry::global();
        let b = PlaceholderRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
