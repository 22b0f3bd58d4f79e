//! Put and get requests submitted to a [`Table`](crate::Table).
//!
//! Requests are opaque to the ledger. Two capabilities are expressed on the
//! request type itself rather than discovered at runtime: carrying a sequence
//! number and carrying a CAS token. `set_seq` / `set_cas` apply the value when
//! the variant supports it and report whether it did.

use std::sync::Arc;

use dhtkv_crypto::{Identity, KeyHasher, Signature, SignatureError, VerifyingKey};
use dhtkv_types::{Cas, Key, Seq};

use crate::codec::PayloadCodec;

/// Build the buffer a mutable item is signed over:
/// `4:salt<len>:<salt>3:seqi<seq>e1:v<encoded value>`, salt pair omitted when empty.
pub fn signable(salt: &str, seq: Seq, encoded_value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(salt.len() + encoded_value.len() + 32);
    if !salt.is_empty() {
        buf.extend_from_slice(b"4:salt");
        buf.extend_from_slice(&PayloadCodec::encode_str(salt));
    }
    buf.extend_from_slice(b"3:seq");
    buf.extend_from_slice(&PayloadCodec::encode_int(seq));
    buf.extend_from_slice(b"1:v");
    buf.extend_from_slice(encoded_value);
    buf
}

/// Target of a mutable item owned by `public_key` under the qualified `salt`.
pub fn mutable_target(public_key: &VerifyingKey, salt: &str) -> Key {
    KeyHasher::MUTABLE.hash_parts(&[&public_key.as_bytes(), salt.as_bytes()])
}

/// Target of an immutable item holding `value`.
pub fn immutable_target(value: &str) -> Key {
    KeyHasher::IMMUTABLE.hash(value.as_bytes())
}

// ---------------------------------------------------------------------------
// Put
// ---------------------------------------------------------------------------

/// Content-addressed put. No sequence or CAS semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImmutablePut {
    target: Key,
    value: String,
}

impl ImmutablePut {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            target: immutable_target(&value),
            value,
        }
    }
}

/// Owner-signed put carrying a sequence number and CAS token.
///
/// The signature covers the qualified salt, the sequence number and the
/// encoded value, so changing the sequence re-signs the request.
#[derive(Clone, Debug)]
pub struct MutablePut {
    target: Key,
    public_key: VerifyingKey,
    salt: String,
    value: String,
    seq: Seq,
    cas: Cas,
    signature: Signature,
    signer: Arc<Identity>,
}

impl MutablePut {
    pub fn new(signer: Arc<Identity>, name: &str, value: impl Into<String>) -> Self {
        let public_key = signer.public();
        let salt = signer.qualify(name);
        let value = value.into();
        let seq = 0;
        let signature = signer.sign(&signable(&salt, seq, &PayloadCodec::encode_str(&value)));
        Self {
            target: mutable_target(&public_key, &salt),
            public_key,
            salt,
            value,
            seq,
            cas: 0,
            signature,
            signer,
        }
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    /// Qualified salt (`salt ‖ name`) the item is signed under.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn seq(&self) -> Seq {
        self.seq
    }

    pub fn cas(&self) -> Cas {
        self.cas
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Check the signature against the embedded public key.
    pub fn verify(&self) -> Result<(), SignatureError> {
        let message = signable(&self.salt, self.seq, &PayloadCodec::encode_str(&self.value));
        self.public_key.verify(&message, &self.signature)
    }

    fn set_seq(&mut self, seq: Seq) {
        self.seq = seq;
        let message = signable(&self.salt, seq, &PayloadCodec::encode_str(&self.value));
        self.signature = self.signer.sign(&message);
    }
}

/// A put request built by a keyer.
#[derive(Clone, Debug)]
pub enum PutRequest {
    Immutable(ImmutablePut),
    Mutable(MutablePut),
}

impl PutRequest {
    /// DHT target the value is stored under.
    pub fn target(&self) -> Key {
        match self {
            PutRequest::Immutable(put) => put.target,
            PutRequest::Mutable(put) => put.target,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            PutRequest::Immutable(put) => &put.value,
            PutRequest::Mutable(put) => &put.value,
        }
    }

    /// Value as it travels on the wire.
    pub fn encoded_value(&self) -> Vec<u8> {
        PayloadCodec::encode_str(self.value())
    }

    /// Set the sequence number. Returns `false` if the request has none.
    pub fn set_seq(&mut self, seq: Seq) -> bool {
        match self {
            PutRequest::Mutable(put) => {
                put.set_seq(seq);
                true
            }
            PutRequest::Immutable(_) => false,
        }
    }

    /// Set the CAS token. Returns `false` if the request has none.
    pub fn set_cas(&mut self, cas: Cas) -> bool {
        match self {
            PutRequest::Mutable(put) => {
                put.cas = cas;
                true
            }
            PutRequest::Immutable(_) => false,
        }
    }

    pub fn seq(&self) -> Option<Seq> {
        match self {
            PutRequest::Mutable(put) => Some(put.seq),
            PutRequest::Immutable(_) => None,
        }
    }

    pub fn cas(&self) -> Option<Cas> {
        match self {
            PutRequest::Mutable(put) => Some(put.cas),
            PutRequest::Immutable(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// Lookup of a mutable item bound to its owner's public key and salt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutableGet {
    target: Key,
    public_key: VerifyingKey,
    salt: String,
    min_seq: Option<Seq>,
}

impl MutableGet {
    pub fn new(public_key: VerifyingKey, salt: impl Into<String>) -> Self {
        let salt = salt.into();
        Self {
            target: mutable_target(&public_key, &salt),
            public_key,
            salt,
            min_seq: None,
        }
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn min_seq(&self) -> Option<Seq> {
        self.min_seq
    }
}

/// A get request built by a keyer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GetRequest {
    Immutable { target: Key },
    Mutable(MutableGet),
}

impl GetRequest {
    pub fn target(&self) -> Key {
        match self {
            GetRequest::Immutable { target } => *target,
            GetRequest::Mutable(get) => get.target,
        }
    }

    /// Only accept responses at or above `seq`. Returns `false` for immutable lookups.
    pub fn set_seq(&mut self, seq: Seq) -> bool {
        match self {
            GetRequest::Mutable(get) => {
                get.min_seq = Some(seq);
                true
            }
            GetRequest::Immutable { .. } => false,
        }
    }

    pub fn min_seq(&self) -> Option<Seq> {
        match self {
            GetRequest::Mutable(get) => get.min_seq,
            GetRequest::Immutable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Arc<Identity> {
        Arc::new(Identity::generate("alice", "s-"))
    }

    #[test]
    fn signable_layout() {
        assert_eq!(
            signable("foobar", 1, b"12:Hello World!"),
            b"4:salt6:foobar3:seqi1e1:v12:Hello World!".to_vec()
        );
        assert_eq!(signable("", -1, b"2:hi"), b"3:seqi-1e1:v2:hi".to_vec());
    }

    #[test]
    fn immutable_put_has_no_capabilities() {
        let mut put = PutRequest::Immutable(ImmutablePut::new("v1"));
        assert!(!put.set_seq(4));
        assert!(!put.set_cas(2));
        assert_eq!(put.seq(), None);
        assert_eq!(put.cas(), None);
        assert_eq!(put.target(), immutable_target("v1"));
    }

    #[test]
    fn mutable_put_signature_verifies() {
        let put = MutablePut::new(owner(), "profile", "v1");
        assert!(put.verify().is_ok());
        assert_eq!(put.salt(), "s-profile");
    }

    #[test]
    fn set_seq_resigns() {
        let mut put = PutRequest::Mutable(MutablePut::new(owner(), "profile", "v1"));
        let before = match &put {
            PutRequest::Mutable(m) => m.signature().clone(),
            PutRequest::Immutable(_) => unreachable!(),
        };
        assert!(put.set_seq(7));
        assert!(put.set_cas(6));
        let PutRequest::Mutable(m) = &put else {
            panic!("expected mutable");
        };
        assert_eq!(m.seq(), 7);
        assert_eq!(m.cas(), 6);
        assert_ne!(*m.signature(), before);
        assert!(m.verify().is_ok());
    }

    #[test]
    fn tampered_value_fails_verification() {
        let mut put = MutablePut::new(owner(), "profile", "v1");
        put.value = "forged".into();
        assert_eq!(put.verify(), Err(SignatureError::InvalidSignature));
    }

    #[test]
    fn mutable_target_ignores_value() {
        let id = owner();
        let a = MutablePut::new(id.clone(), "profile", "v1");
        let b = MutablePut::new(id, "profile", "v2");
        assert_eq!(a.target, b.target);
    }

    #[test]
    fn get_target_matches_put_target() {
        let id = owner();
        let put = MutablePut::new(id.clone(), "profile", "v1");
        let get = MutableGet::new(id.public(), id.qualify("profile"));
        assert_eq!(GetRequest::Mutable(get).target(), put.target);
    }

    #[test]
    fn get_seq_is_a_filter() {
        let id = owner();
        let mut get = GetRequest::Mutable(MutableGet::new(id.public(), "x"));
        assert_eq!(get.min_seq(), None);
        assert!(get.set_seq(3));
        assert_eq!(get.min_seq(), Some(3));

        let mut immutable = GetRequest::Immutable {
            target: immutable_target("v"),
        };
        assert!(!immutable.set_seq(3));
        assert_eq!(immutable.min_seq(), None);
    }
}
