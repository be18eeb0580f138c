use std::path::PathBuf;

use bon::Builder;

use crate::error::CertCloneError;
use crate::key::validate_key_bits;

/// Default RSA modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;
/// Input files smaller than this are taken for truncated placeholders.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 1024;

/// What to do when one source directory fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    #[default]
    Halt,
    /// Record the failure and carry on with the next directory.
    Continue,
}

/// What to write to the key output directory when the source key is reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReusedKeyOutput {
    /// Write the reused key re-encoded as `RSA PRIVATE KEY` (PKCS#1).
    #[default]
    Reencode,
    /// Write nothing; the source key file stays the only copy.
    Skip,
}

/// Parameters for a cloning run.
///
/// # Fields
/// * `generate_new_key` - Generate a fresh key instead of reading `<dir>/<name>.key`.
/// * `key_out` - Directory the key files are written to.
/// * `cert_out` - Directory the certificates are written to.
/// * `key_bits` - Modulus size of generated keys.
/// * `sources` - Directories to process, in order.
/// * `failure_policy` - Whether a failing directory stops the run.
/// * `reused_key_output` - Whether a reused key is written out again.
/// * `min_file_size` - Smallest accepted input file, in bytes.
#[derive(Clone, Debug, Builder)]
pub struct Config {
    #[builder(default)]
    pub generate_new_key: bool,
    #[builder(into, default = PathBuf::from("."))]
    pub key_out: PathBuf,
    #[builder(into, default = PathBuf::from("."))]
    pub cert_out: PathBuf,
    #[builder(default = DEFAULT_KEY_BITS)]
    pub key_bits: usize,
    #[builder(default)]
    pub sources: Vec<PathBuf>,
    #[builder(default)]
    pub failure_policy: FailurePolicy,
    #[builder(default)]
    pub reused_key_output: ReusedKeyOutput,
    #[builder(default = DEFAULT_MIN_FILE_SIZE)]
    pub min_file_size: u64,
}

impl Config {
    /// Checks the parameters that can be verified without touching the filesystem.
    pub fn validate(&self) -> Result<(), CertCloneError> {
        validate_key_bits(self.key_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder().build();
        assert!(!config.generate_new_key);
        assert_eq!(config.key_out, PathBuf::from("."));
        assert_eq!(config.cert_out, PathBuf::from("."));
        assert_eq!(config.key_bits, DEFAULT_KEY_BITS);
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.reused_key_output, ReusedKeyOutput::Reencode);
        assert_eq!(config.min_file_size, DEFAULT_MIN_FILE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_key_bits() {
        for bits in [64, 2000] {
            let config = Config::builder().key_bits(bits).build();
            assert!(matches!(
                config.validate(),
                Err(CertCloneError::ValidationError(_))
            ));
        }
        let config = Config::builder().generate_new_key(true).key_bits(4096).build();
        assert!(config.validate().is_ok());
    }
}
