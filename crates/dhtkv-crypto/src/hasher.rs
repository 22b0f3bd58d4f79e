use dhtkv_types::Key;

/// Domain-separated BLAKE3 key hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so an immutable item and a mutable item built from identical
/// bytes never derive the same key.
pub struct KeyHasher {
    domain: &'static str,
}

impl KeyHasher {
    /// Hasher for content-addressed (immutable) items.
    pub const IMMUTABLE: Self = Self {
        domain: "dhtkv-immutable-v1",
    };
    /// Hasher for owner-addressed (mutable) items.
    pub const MUTABLE: Self = Self {
        domain: "dhtkv-mutable-v1",
    };
    /// Hasher for simulated node identifiers.
    pub const NODE: Self = Self {
        domain: "dhtkv-node-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Key {
        self.hash_parts(&[data])
    }

    /// Hash the concatenation of several byte strings.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> Key {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        Key::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let k1 = KeyHasher::IMMUTABLE.hash(b"v1");
        let k2 = KeyHasher::IMMUTABLE.hash(b"v1");
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_domains_produce_different_keys() {
        let data = b"same content";
        assert_ne!(
            KeyHasher::IMMUTABLE.hash(data),
            KeyHasher::MUTABLE.hash(data)
        );
        assert_ne!(KeyHasher::MUTABLE.hash(data), KeyHasher::NODE.hash(data));
    }

    #[test]
    fn parts_hash_like_concatenation() {
        let joined = KeyHasher::MUTABLE.hash(b"pubkeysaltname");
        let parts = KeyHasher::MUTABLE.hash_parts(&[b"pubkey", b"salt", b"name"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn separator_keeps_domain_and_data_apart() {
        let key = KeyHasher::IMMUTABLE.hash(b"v1");
        let manual = blake3::hash(b"dhtkv-immutable-v1:v1");
        assert_eq!(key, Key::from_hash(*manual.as_bytes()));
    }
}
