//! Pool of equivalent API credentials.
//!
//! Each weather request picks one key uniformly at random, spreading load
//! across the free-tier quotas of every configured key.

use std::fmt;

use plantagotchi_core::LookupError;
use rand::Rng;

/// A set of interchangeable API keys.
#[derive(Clone, Default)]
pub struct ApiKeyRing {
    keys: Vec<String>,
}

impl ApiKeyRing {
    /// Build a ring from `keys`, skipping blank entries.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys }
    }

    /// Number of usable keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the ring has no usable key.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pick a key using the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] if the ring is empty.
    pub fn pick(&self) -> Result<&str, LookupError> {
        self.pick_with(&mut rand::rng())
    }

    /// Pick a key uniformly over the whole ring using `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] if the ring is empty.
    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, LookupError> {
        if self.keys.is_empty() {
            return Err(LookupError::Config("no API keys configured".to_owned()));
        }
        let index = rng.random_range(0..self.keys.len());
        self.keys
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| LookupError::Config(format!("key index {index} out of range")))
    }
}

// Keys are credentials; never print them.
impl fmt::Debug for ApiKeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyRing")
            .field("len", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn empty_ring_is_a_config_error() {
        let ring = ApiKeyRing::new(Vec::<String>::new());
        assert!(ring.is_empty());
        assert!(matches!(ring.pick(), Err(LookupError::Config(_))));
    }

    #[test]
    fn blank_entries_are_dropped() {
        let ring = ApiKeyRing::new(["a", "  ", "", " b "]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn every_key_including_the_last_is_chosen() {
        let ring = ApiKeyRing::new(["k1", "k2", "k3", "k4", "k5"]);
        let mut rng = StdRng::seed_from_u64(7);
        let seen: BTreeSet<&str> = (0..500)
            .map(|_| ring.pick_with(&mut rng).unwrap())
            .collect();
        assert_eq!(seen.len(), 5);
        assert!(seen.contains("k5"));
    }

    #[test]
    fn single_key_is_always_chosen() {
        let ring = ApiKeyRing::new(["only"]);
        assert_eq!(ring.pick().unwrap(), "only");
    }

    #[test]
    fn debug_hides_keys() {
        let ring = ApiKeyRing::new(["secret-key"]);
        let printed = format!("{ring:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("len: 1"));
    }
}
