use parking_lot::RwLock;
use std::{fmt, sync::Arc};

/// Opaque bearer credential returned by `POST /api/authenticate`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BearerToken(Arc<str>);

impl BearerToken {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("BearerToken(<empty>)")
        } else {
            f.write_str("BearerToken(<redacted>)")
        }
    }
}

/// Holder of the current bearer token, shared by every outbound request.
///
/// Cloning is cheap and every clone observes the same token. `set` swaps the
/// whole `Arc` under the write lock, so readers see either the old token or
/// the new one, never a mix.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    current: Arc<RwLock<BearerToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed token, or an empty one before the first authentication.
    pub fn get(&self) -> BearerToken {
        self.current.read().clone()
    }

    pub fn set(&self, token: BearerToken) {
        *self.current.write() = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn empty_before_first_set() {
        let store = TokenStore::new();
        assert!(store.get().is_empty());
    }

    #[test]
    fn set_replaces_for_every_clone() {
        let store = TokenStore::new();
        let other = store.clone();

        store.set(BearerToken::new("first"));
        assert_eq!(other.get().as_str(), "first");

        other.set(BearerToken::new("second"));
        assert_eq!(store.get().as_str(), "second");
    }

    #[test]
    fn debug_does_not_leak_token() {
        let token = BearerToken::new("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn concurrent_readers_only_see_whole_tokens() {
        let store = TokenStore::new();
        store.set(BearerToken::new("token-0"));

        let writers: Vec<_> = (1..=4)
            .map(|id| {
                let store = store.clone();
                thread::spawn(move || {
                    for round in 0..500 {
                        store.set(BearerToken::new(format!("token-{id}-{round}")));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let token = store.get();
                        assert!(!token.is_empty());
                        assert!(token.as_str().starts_with("token-"));
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().expect("thread panicked");
        }

        assert!(store.get().as_str().starts_with("token-"));
    }
}
