//! APNs client certificate material
//!
//! The certificate is usually prepared out-of-band:
//!
//! ```text
//! openssl x509 -in aps.cer -inform der -out aps-cert.pem
//! openssl pkcs12 -nocerts -in aps-key.p12 -out aps-key.pem
//! cat aps-cert.pem aps-key.pem > aps.pem
//! ```
//!
//! Either the combined file or the separate cert/key files can be configured.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use pem::Pem;
use pkcs8::EncryptedPrivateKeyInfo;

use crate::error::ApnsError;

const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";
const PRIVATE_KEY: &str = "PRIVATE KEY";

#[derive(Clone)]
pub struct Certificate {
    paths: Vec<PathBuf>,
    password: Option<String>,
}

impl Certificate {
    /// Create certificate material from one or more PEM files
    ///
    /// Every path must point to a readable file; this is checked here rather
    /// than at push time.
    pub fn new<I, P>(paths: I, password: Option<String>) -> Result<Self, ApnsError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();

        if paths.is_empty() {
            return Err(ApnsError::Configuration(
                "No certificate file configured".to_string(),
            ));
        }

        for path in &paths {
            ensure_readable(path)?;
        }

        Ok(Self { paths, password })
    }

    /// Create certificate material from a single combined PEM file
    pub fn from_file(path: impl AsRef<Path>, password: Option<String>) -> Result<Self, ApnsError> {
        Self::new([path], password)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Concatenate all configured files, in configuration order
    pub fn read_pem(&self) -> Result<Vec<u8>, ApnsError> {
        let mut buf = Vec::new();
        for path in &self.paths {
            let contents = fs::read(path).map_err(|e| {
                ApnsError::Configuration(format!(
                    "Unable to read certificate file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            buf.extend_from_slice(&contents);
            if !buf.ends_with(b"\n") {
                buf.push(b'\n');
            }
        }
        Ok(buf)
    }

    /// Produce an unencrypted PEM bundle (certificates + key) usable as a TLS identity
    pub fn identity_pem(&self) -> Result<Vec<u8>, ApnsError> {
        let raw = self.read_pem()?;

        let blocks = pem::parse_many(&raw).map_err(|e| {
            ApnsError::Configuration(format!("Failed to parse certificate PEM: {}", e))
        })?;

        if blocks.is_empty() {
            return Err(ApnsError::Configuration(
                "Certificate files contain no PEM blocks".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            out.push(self.unlock(block)?);
        }

        Ok(pem::encode_many(&out).into_bytes())
    }

    fn unlock(&self, block: Pem) -> Result<Pem, ApnsError> {
        if is_legacy_encrypted(&block) {
            return Err(ApnsError::Configuration(format!(
                "Legacy encrypted '{}' keys are not supported; convert with `openssl pkcs8 -topk8`",
                block.tag()
            )));
        }

        if block.tag() != ENCRYPTED_PRIVATE_KEY {
            return Ok(block);
        }

        let password = self.password.as_deref().ok_or_else(|| {
            ApnsError::Configuration(
                "Private key is encrypted but no certificate password was given".to_string(),
            )
        })?;

        let info = EncryptedPrivateKeyInfo::try_from(block.contents()).map_err(|e| {
            ApnsError::Configuration(format!("Failed to parse encrypted private key: {}", e))
        })?;

        let decrypted = info.decrypt(password).map_err(|e| {
            ApnsError::Configuration(format!("Failed to decrypt private key: {}", e))
        })?;

        Ok(Pem::new(PRIVATE_KEY, decrypted.as_bytes()))
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("paths", &self.paths)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn ensure_readable(path: &Path) -> Result<(), ApnsError> {
    let unreadable = |reason: String| {
        ApnsError::Configuration(format!(
            "Unable to read certificate file '{}': {}",
            path.display(),
            reason
        ))
    };

    let metadata = fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }

    fs::File::open(path).map_err(|e| unreadable(e.to_string()))?;
    Ok(())
}

fn is_legacy_encrypted(block: &Pem) -> bool {
    block
        .headers()
        .get("Proc-Type")
        .map(|value| value.contains("ENCRYPTED"))
        .unwrap_or(false)
}
