use std::sync::Arc;

use dhtkv_crypto::Identity;
use dhtkv_types::Key;

use crate::codec::PayloadCodec;
use crate::error::{KeyerError, KeyerResult};
use crate::request::{
    immutable_target, mutable_target, GetRequest, ImmutablePut, MutableGet, MutablePut,
    PutRequest,
};

/// Longest qualified name (`salt ‖ name`) a mutable item may be signed under.
pub const MAX_SALT_LEN: usize = 64;

/// Largest encoded value a put may carry.
pub const MAX_VALUE_LEN: usize = 1000;

/// Derives lookup keys and builds put/get requests for one addressing mode.
pub trait Keyer: Send + Sync {
    /// Key the pair `(name, value)` is stored under.
    fn key(&self, name: &str, value: &str) -> KeyerResult<Key>;

    /// Request that publishes `value` under `name`.
    fn put_message(&self, name: &str, value: &str) -> KeyerResult<PutRequest>;

    /// Request that looks up `lookup`: a hex key for immutable items, a
    /// logical name for mutable ones.
    fn get_message(&self, lookup: &str) -> KeyerResult<GetRequest>;

    /// Key that `get_message(lookup)` targets.
    fn resolve(&self, lookup: &str) -> KeyerResult<Key>;
}

fn check_value(value: &str) -> KeyerResult<()> {
    let size = PayloadCodec::encode_str(value).len();
    if size > MAX_VALUE_LEN {
        return Err(KeyerError::ValueTooLarge {
            size,
            max: MAX_VALUE_LEN,
        });
    }
    Ok(())
}

/// Content addressing: the key is the hash of the value, names are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmutableKeyer;

impl Keyer for ImmutableKeyer {
    fn key(&self, _name: &str, value: &str) -> KeyerResult<Key> {
        Ok(immutable_target(value))
    }

    fn put_message(&self, _name: &str, value: &str) -> KeyerResult<PutRequest> {
        check_value(value)?;
        Ok(PutRequest::Immutable(ImmutablePut::new(value)))
    }

    fn get_message(&self, lookup: &str) -> KeyerResult<GetRequest> {
        Ok(GetRequest::Immutable {
            target: self.resolve(lookup)?,
        })
    }

    fn resolve(&self, lookup: &str) -> KeyerResult<Key> {
        Ok(Key::from_hex(lookup)?)
    }
}

/// Owner addressing: the key is the hash of the owner's public key and
/// `salt ‖ name`, so every version of a name lands on the same key.
#[derive(Clone, Debug)]
pub struct MutableKeyer {
    identity: Arc<Identity>,
}

impl MutableKeyer {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: Arc::new(identity),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn qualify(&self, name: &str) -> KeyerResult<String> {
        let salt = self.identity.qualify(name);
        if salt.len() > MAX_SALT_LEN {
            return Err(KeyerError::NameTooLong {
                len: salt.len(),
                max: MAX_SALT_LEN,
            });
        }
        Ok(salt)
    }
}

impl Keyer for MutableKeyer {
    fn key(&self, name: &str, _value: &str) -> KeyerResult<Key> {
        let salt = self.qualify(name)?;
        Ok(mutable_target(&self.identity.public(), &salt))
    }

    fn put_message(&self, name: &str, value: &str) -> KeyerResult<PutRequest> {
        self.qualify(name)?;
        check_value(value)?;
        Ok(PutRequest::Mutable(MutablePut::new(
            Arc::clone(&self.identity),
            name,
            value,
        )))
    }

    fn get_message(&self, lookup: &str) -> KeyerResult<GetRequest> {
        let salt = self.qualify(lookup)?;
        Ok(GetRequest::Mutable(MutableGet::new(
            self.identity.public(),
            salt,
        )))
    }

    fn resolve(&self, lookup: &str) -> KeyerResult<Key> {
        self.key(lookup, "")
    }
}
