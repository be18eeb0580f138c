//! use certclone::error::CertCloneError;

use thiserror::Error;

/// Represents errors that can occur while cloning and re-signing certificates.
///
/// Every variant is fatal for the directory being processed. The only non-fatal
/// condition (a certificate chain suffix) is reported as a
/// [`crate::loader::Advisory`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertCloneError {
    /// Bad parameters or input files rejected before any parsing happens.
    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// The encoded block envelope is missing or malformed.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// The block payload is not a valid certificate or supported private key.
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// The key file contains data after its private key block.
    #[error("Malformed private key: {0}")]
    MalformedKeyError(String),

    /// The key cannot sign the certificate or the to-be-signed data is invalid.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// A file or directory could not be read or written.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl CertCloneError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        CertCloneError::IoError(format!("{}: {}", path.display(), err))
    }

    /// Reports a DER serialization failure; `From<der::Error>` is for the parsing side.
    pub fn encoding(err: der::Error) -> Self {
        CertCloneError::EncodingError(err.to_string())
    }
}

impl From<der::Error> for CertCloneError {
    /// Converts a `der::Error` into a `CertCloneError`.
    fn from(err: der::Error) -> Self {
        CertCloneError::ParseError(err.to_string())
    }
}

impl From<pem::PemError> for CertCloneError {
    fn from(err: pem::PemError) -> Self {
        CertCloneError::DecodingError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertCloneError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertCloneError::ParseError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertCloneError {
    fn from(err: pkcs8::Error) -> Self {
        CertCloneError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_errors_keep_their_direction() {
        let err = der::Error::from(der::ErrorKind::Overflow);
        assert!(matches!(
            CertCloneError::from(err),
            CertCloneError::ParseError(_)
        ));
        assert!(matches!(
            CertCloneError::encoding(err),
            CertCloneError::EncodingError(_)
        ));
    }
}
