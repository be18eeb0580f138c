use std::path::Path;

use crate::cert::ParsedCertificate;
use crate::error::CertCloneError;
use crate::key::KeyPair;
use crate::pem_utils;

type Result<T> = std::result::Result<T, CertCloneError>;

/// A non-fatal finding made while loading a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The file held more than one block; everything after the first was ignored.
    ChainIgnored { ignored_bytes: usize },
}

/// A certificate read from disk, plus what was noticed along the way.
#[derive(Debug, Clone)]
pub struct LoadedCertificate {
    pub certificate: ParsedCertificate,
    pub advisories: Vec<Advisory>,
}

/// Reads and parses the first certificate block in the file at `path`.
pub fn load(path: &Path) -> Result<LoadedCertificate> {
    let bytes = std::fs::read(path).map_err(|e| CertCloneError::io(path, e))?;
    load_from_bytes(&bytes)
}

/// Parses the first certificate block in `bytes`.
///
/// Any blocks after the first are reported once as [`Advisory::ChainIgnored`].
pub fn load_from_bytes(bytes: &[u8]) -> Result<LoadedCertificate> {
    let (block, residue) = pem_utils::decode(bytes)?;

    let mut advisories = Vec::new();
    if !residue.is_empty() {
        tracing::warn!(
            ignored_bytes = residue.len(),
            "certificate chain detected, only the first certificate will be processed"
        );
        advisories.push(Advisory::ChainIgnored {
            ignored_bytes: residue.len(),
        });
    }

    let certificate = ParsedCertificate::from_block(&block)?;
    Ok(LoadedCertificate {
        certificate,
        advisories,
    })
}

/// Reads and parses the single private key block in the file at `path`.
pub fn load_key(path: &Path) -> Result<KeyPair> {
    let bytes = std::fs::read(path).map_err(|e| CertCloneError::io(path, e))?;
    load_key_from_bytes(&bytes)
}

/// Parses a private key block; anything after it is a `MalformedKeyError`.
pub fn load_key_from_bytes(bytes: &[u8]) -> Result<KeyPair> {
    let (block, residue) = pem_utils::decode(bytes)?;
    if !residue.is_empty() {
        return Err(CertCloneError::MalformedKeyError(format!(
            "{} unexpected bytes after the {} block",
            residue.len(),
            block.label()
        )));
    }
    KeyPair::from_block(&block)
}
