//! Key and certificate request issuance
//!
//! One call generates a fresh RSA key pair, writes the private key as
//! passphrase-encrypted PKCS#8 PEM, then builds and signs a PKCS#10
//! request for the same key and writes it alongside. The private key is
//! written first, so a failure while building the request leaves the key
//! file in place and never creates the request file.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    csr::{create_csr, CsrSubject},
    error::{Error, Result},
    key::{RsaKey, DEFAULT_KEY_BITS},
};

/// Generate an RSA-4096 key pair and issue a CSR for it
///
/// The private key is written to `key_path` as encrypted PKCS#8 PEM under
/// `password`; the signed request is written to `csr_path` as PEM. Parent
/// directories must already exist. Each call produces a fresh key pair.
pub fn issue_csr<P, Q>(
    password: impl AsRef<[u8]>,
    key_path: P,
    csr_path: Q,
    subject: CsrSubject,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    issue_csr_with_bits(password, DEFAULT_KEY_BITS, key_path, csr_path, subject)
}

/// Same as [`issue_csr`] with an explicit modulus size
pub fn issue_csr_with_bits<P, Q>(
    password: impl AsRef<[u8]>,
    bits: usize,
    key_path: P,
    csr_path: Q,
    subject: CsrSubject,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let key = RsaKey::generate(bits)?;

    let key_pem = key.to_pkcs8_encrypted_pem(password)?;
    write_atomic(key_path.as_ref(), key_pem.as_bytes())?;

    let csr = create_csr(&key, subject)?;
    let csr_pem = csr.to_pem()?;
    write_atomic(csr_path.as_ref(), csr_pem.as_bytes())?;

    Ok(())
}

/// Exit-code adapter around [`issue_csr`]
///
/// Returns 0 on success. On failure the error message goes to standard
/// output, where existing callers scrape it, and the return value is 1.
pub fn issue_csr_status<P, Q>(
    password: &str,
    key_path: P,
    csr_path: Q,
    subject: CsrSubject,
) -> i32
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    match issue_csr(password, key_path, csr_path, subject) {
        Ok(()) => 0,
        Err(e) => {
            println!("{}", e);
            1
        }
    }
}

/// Write `contents` to `path` via a temporary file in the same directory,
/// renamed over the destination on success
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| Error::IoError(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pem");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_write_atomic_missing_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.pem");

        assert!(matches!(
            write_atomic(&path, b"data").unwrap_err(),
            Error::IoError(_)
        ));
    }
}
