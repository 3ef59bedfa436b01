//! Order-independent identity of a stop set.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::Stop;

/// SHA-256 digest over the sorted stop ids, hex encoded.
///
/// Two stop sets have equal fingerprints iff they contain the same ids,
/// regardless of order. Coordinates and names are not part of the digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(stops: &[Stop]) -> Self {
        let mut ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();

        let mut hasher = Sha256::new();
        for id in ids {
            // Length prefix keeps ["ab","c"] distinct from ["a","bc"]
            hasher.update((id.len() as u64).to_le_bytes());
            hasher.update(id.as_bytes());
        }

        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(ids: &[&str]) -> Vec<Stop> {
        ids.iter().map(|id| Stop::new(*id, 0.0, 0.0, *id)).collect()
    }

    #[test]
    fn hex_sha256_length() {
        let fp = Fingerprint::of(&stops(&["1", "2"]));
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn differs_for_different_sets() {
        assert_ne!(
            Fingerprint::of(&stops(&["1", "2"])),
            Fingerprint::of(&stops(&["1", "3"]))
        );
        assert_ne!(
            Fingerprint::of(&stops(&["ab", "c"])),
            Fingerprint::of(&stops(&["a", "bc"]))
        );
        assert_ne!(
            Fingerprint::of(&stops(&["1"])),
            Fingerprint::of(&stops(&["1", "2"]))
        );
    }

    #[test]
    fn ignores_coordinates_and_names() {
        let a = vec![Stop::new("1", 0.0, 0.0, "A")];
        let b = vec![Stop::new("1", 5.0, 5.0, "B")];
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }
}
