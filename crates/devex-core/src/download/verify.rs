//! Checksum and signature verification for downloaded plugin binaries.
//!
//! Signatures are checked with the embedded OpenPGP verifier when the
//! `embedded-pgp` feature is on and the configured public key parses;
//! otherwise the system `gpg` binary is tried. With no usable verifier at
//! all, verification is skipped with a warning. An actual verification
//! failure always aborts the installation.

use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::download::error::DownloadError;

/// Outcome of a signature check that did not hard-fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// Signature checked out.
    Verified,
    /// No public key configured or present; verification skipped.
    SkippedNoKey,
    /// Neither the embedded verifier nor `gpg` was usable.
    SkippedNoVerifier,
}

/// Streaming SHA-256 of a file, as lowercase hex.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verifies detached signatures against a configured public key.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    public_key_path: Option<PathBuf>,
}

impl SignatureVerifier {
    pub fn new(public_key_path: Option<PathBuf>) -> Self {
        Self { public_key_path }
    }

    /// Verify `signature` over the file at `data_path`.
    pub async fn verify(
        &self,
        plugin: &str,
        data_path: &Path,
        signature: &[u8],
    ) -> Result<SignatureOutcome, DownloadError> {
        let key_path = match &self.public_key_path {
            Some(path) if path.exists() => path.clone(),
            _ => return Ok(SignatureOutcome::SkippedNoKey),
        };

        #[cfg(feature = "embedded-pgp")]
        {
            match embedded::verify_detached(&key_path, data_path, signature) {
                Ok(()) => return Ok(SignatureOutcome::Verified),
                Err(embedded::EmbeddedError::BadSignature(reason)) => {
                    return Err(DownloadError::SignatureInvalid {
                        name: plugin.to_string(),
                        reason,
                    });
                }
                Err(embedded::EmbeddedError::Unavailable(reason)) => {
                    log::warn!(
                        "Embedded OpenPGP verifier unavailable ({}), falling back to gpg",
                        reason
                    );
                }
            }
        }

        self.verify_with_gpg(plugin, &key_path, data_path, signature)
            .await
    }

    /// System `gpg` fallback. The signature is written to a temp file and
    /// checked with `gpg --no-default-keyring --keyring <key> --verify`.
    async fn verify_with_gpg(
        &self,
        plugin: &str,
        key_path: &Path,
        data_path: &Path,
        signature: &[u8],
    ) -> Result<SignatureOutcome, DownloadError> {
        let sig_file = tempfile::Builder::new()
            .prefix(".devex-sig-")
            .tempfile()
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(signature)?;
                Ok(f)
            })
            .map_err(|source| DownloadError::Io {
                name: plugin.to_string(),
                source,
            })?;

        let output = tokio::process::Command::new("gpg")
            .arg("--no-default-keyring")
            .arg("--keyring")
            .arg(key_path)
            .arg("--verify")
            .arg(sig_file.path())
            .arg(data_path)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => Ok(SignatureOutcome::Verified),
            Ok(out) => Err(DownloadError::SignatureInvalid {
                name: plugin.to_string(),
                reason: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("gpg binary not found; skipping signature verification");
                Ok(SignatureOutcome::SkippedNoVerifier)
            }
            Err(err) => Err(DownloadError::Io {
                name: plugin.to_string(),
                source: err,
            }),
        }
    }
}

#[cfg(feature = "embedded-pgp")]
mod embedded {
    use std::path::Path;

    use sequoia_openpgp as openpgp;
    use openpgp::parse::stream::{
        DetachedVerifierBuilder, MessageLayer, MessageStructure, VerificationHelper,
    };
    use openpgp::parse::Parse;
    use openpgp::policy::StandardPolicy;
    use openpgp::{Cert, KeyHandle};

    /// Failure modes of the embedded verifier. Setup problems fall back to
    /// `gpg`; a bad signature is final.
    #[derive(Debug)]
    pub enum EmbeddedError {
        BadSignature(String),
        Unavailable(String),
    }

    struct KeyHelper {
        certs: Vec<Cert>,
    }

    impl VerificationHelper for KeyHelper {
        fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
            Ok(self.certs.clone())
        }

        fn check(&mut self, structure: MessageStructure) -> openpgp::Result<()> {
            for layer in structure.into_iter() {
                if let MessageLayer::SignatureGroup { results } = layer {
                    if results.iter().any(|r| r.is_ok()) {
                        return Ok(());
                    }
                    return Err(openpgp::Error::InvalidOperation(
                        "no valid signature in signature group".to_string(),
                    )
                    .into());
                }
            }
            Err(openpgp::Error::InvalidOperation("no signature layer found".to_string()).into())
        }
    }

    pub fn verify_detached(
        key_path: &Path,
        data_path: &Path,
        signature: &[u8],
    ) -> Result<(), EmbeddedError> {
        let cert = Cert::from_file(key_path)
            .map_err(|e| EmbeddedError::Unavailable(format!("cannot parse public key: {}", e)))?;
        let policy = StandardPolicy::new();
        let helper = KeyHelper { certs: vec![cert] };

        let mut verifier = DetachedVerifierBuilder::from_bytes(signature)
            .map_err(|e| EmbeddedError::Unavailable(format!("cannot parse signature: {}", e)))?
            .with_policy(&policy, None, helper)
            .map_err(|e| EmbeddedError::Unavailable(format!("verifier setup failed: {}", e)))?;

        verifier
            .verify_file(data_path)
            .map_err(|e| EmbeddedError::BadSignature(e.to_string()))
    }
}
