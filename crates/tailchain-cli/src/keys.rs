use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tailchain_crypto::{SigningKey, VerifyingKey};

const KEY_LEN: usize = 32;

/// `<prefix>.pub`
pub fn public_path(prefix: &Path) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

/// Generate a key pair, writing the secret to `prefix` and the public key
/// to `<prefix>.pub`. Both files hold one line of lowercase hex.
pub fn generate(prefix: &Path) -> anyhow::Result<(SigningKey, PathBuf)> {
    let key = SigningKey::generate();
    let public = public_path(prefix);
    write_secret(prefix, &format!("{}\n", hex::encode(key.as_bytes())))?;
    std::fs::write(&public, format!("{}\n", hex::encode(key.verifying_key().as_bytes())))
        .with_context(|| format!("writing {}", public.display()))?;
    Ok((key, public))
}

pub fn load_signing_key(path: &Path) -> anyhow::Result<SigningKey> {
    Ok(SigningKey::from_bytes(read_key(path)?))
}

pub fn load_verifying_key(path: &Path) -> anyhow::Result<VerifyingKey> {
    VerifyingKey::from_bytes(read_key(path)?)
        .with_context(|| format!("{} is not an Ed25519 public key", path.display()))
}

fn read_key(path: &Path) -> anyhow::Result<[u8; KEY_LEN]> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading key {}", path.display()))?;
    let bytes = hex::decode(text.trim())
        .with_context(|| format!("{} does not hold a hex key", path.display()))?;
    match <[u8; KEY_LEN]>::try_from(bytes.as_slice()) {
        Ok(key) => Ok(key),
        Err(_) => bail!(
            "{} holds {} bytes, expected {KEY_LEN}",
            path.display(),
            bytes.len()
        ),
    }
}

#[cfg(unix)]
fn write_secret(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("writing {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(not(unix))]
fn write_secret(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pair_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("chain");
        let (key, public) = generate(&prefix).unwrap();
        assert_eq!(public, dir.path().join("chain.pub"));

        let secret = load_signing_key(&prefix).unwrap();
        assert_eq!(secret.as_bytes(), key.as_bytes());
        let verifying = load_verifying_key(&public).unwrap();
        assert!(verifying == key.verifying_key());

        let signature = secret.sign(b"payload");
        assert!(verifying.verify(b"payload", &signature).is_ok());
    }

    #[test]
    fn public_path_appends_suffix() {
        assert_eq!(public_path(Path::new("keys/a.key")), PathBuf::from("keys/a.key.pub"));
    }

    #[test]
    fn rejects_short_and_non_hex_keys() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short");
        std::fs::write(&short, "abcd\n").unwrap();
        let err = load_signing_key(&short).unwrap_err();
        assert!(err.to_string().contains("expected 32"));

        let garbage = dir.path().join("garbage");
        std::fs::write(&garbage, "not hex at all").unwrap();
        assert!(load_verifying_key(&garbage).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_signing_key(Path::new("/nonexistent/tailchain.key")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tailchain.key"));
    }

    #[cfg(unix)]
    #[test]
    fn secret_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("chain");
        generate(&prefix).unwrap();
        let mode = std::fs::metadata(&prefix).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
