use crate::signer::{Signature, SigningKey, VerifyingKey};

/// Owner of mutable items: a signing keypair plus a logical name and salt.
///
/// Immutable after creation. Only the public key ever leaves the process;
/// the signing key is used in place and redacted from `Debug` output.
#[derive(Debug)]
pub struct Identity {
    signing_key: SigningKey,
    name: String,
    salt: String,
}

impl Identity {
    pub fn new(signing_key: SigningKey, name: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            signing_key,
            name: name.into(),
            salt: salt.into(),
        }
    }

    /// Create an identity around a freshly generated keypair.
    pub fn generate(name: impl Into<String>, salt: impl Into<String>) -> Self {
        Self::new(SigningKey::generate(), name, salt)
    }

    /// The public identifier of this owner.
    pub fn public(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// `salt ‖ name`: the per-item suffix a mutable item is signed under.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.salt, name)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}
