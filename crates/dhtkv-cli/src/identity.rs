use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dhtkv_crypto::{Identity, SigningKey};

/// Key file for `(name, salt)`: `<dir>/<name><salt>.key`.
pub fn key_file(dir: &Path, name: &str, salt: &str) -> PathBuf {
    dir.join(format!("{name}{salt}.key"))
}

/// Load the identity for `(name, salt)`, generating and saving a new key
/// when the file does not exist. The flag reports whether one was created.
pub fn load_or_create(dir: &Path, name: &str, salt: &str) -> anyhow::Result<(Identity, bool)> {
    let path = key_file(dir, name, salt);
    if path.exists() {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        let key = SigningKey::from_slice(&bytes)
            .with_context(|| format!("key file {} does not hold a 32-byte secret", path.display()))?;
        return Ok((Identity::new(key, name, salt), false));
    }

    let key = SigningKey::generate();
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_secret(&path, key.as_bytes())
        .with_context(|| format!("writing key file {}", path.display()))?;
    tracing::info!(path = %path.display(), "generated identity key");
    Ok((Identity::new(key, name, salt), true))
}

/// Create `path` readable by the owner only; never overwrites.
fn write_secret(path: &Path, secret: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(secret)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_file_concatenates_name_and_salt() {
        assert_eq!(
            key_file(Path::new("/keys"), "alice", "s1"),
            PathBuf::from("/keys/alices1.key")
        );
    }

    #[test]
    fn creates_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let (first, created) = load_or_create(dir.path(), "alice", "s").unwrap();
        assert!(created);
        assert_eq!(std::fs::read(key_file(dir.path(), "alice", "s")).unwrap().len(), 32);

        let (second, created) = load_or_create(dir.path(), "alice", "s").unwrap();
        assert!(!created);
        assert_eq!(first.public(), second.public());
        assert_eq!(second.name(), "alice");
        assert_eq!(second.salt(), "s");
    }

    #[test]
    fn different_salts_are_different_owners() {
        let dir = tempfile::tempdir().unwrap();
        let (a, _) = load_or_create(dir.path(), "alice", "1").unwrap();
        let (b, _) = load_or_create(dir.path(), "alice", "2").unwrap();
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn truncated_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(key_file(dir.path(), "bob", ""), [7u8; 12]).unwrap();
        let err = load_or_create(dir.path(), "bob", "").unwrap_err();
        assert!(err.to_string().contains("32-byte secret"));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        load_or_create(dir.path(), "carol", "").unwrap();
        let mode = std::fs::metadata(key_file(dir.path(), "carol", ""))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
