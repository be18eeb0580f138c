use der::Encode;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::CertCloneError;
use crate::pem_utils::{EncodedBlock, PKCS8_PRIVATE_KEY_LABEL, RSA_PRIVATE_KEY_LABEL};
use crate::pki;

type Result<T> = std::result::Result<T, CertCloneError>;

/// Smallest modulus size accepted for freshly generated keys.
pub const MIN_KEY_BITS: usize = 128;

/// Checks that `bits` is a power of two and at least [`MIN_KEY_BITS`].
pub fn validate_key_bits(bits: usize) -> Result<()> {
    if bits >= MIN_KEY_BITS && bits.is_power_of_two() {
        Ok(())
    } else {
        Err(CertCloneError::ValidationError(format!(
            "key bits must be a power of 2 and >= {MIN_KEY_BITS}, got {bits}"
        )))
    }
}

/// Supported key types for re-signing certificates.
#[derive(Clone, Debug)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        validate_key_bits(bits)?;
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CertCloneError::KeyGenerationError(e.to_string()))?;
        Ok(Self::from_rsa(private))
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    /// Import a key from a PKCS#8 `PrivateKeyInfo` structure.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        if info.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(CertCloneError::ParseError(format!(
                "unsupported private key algorithm {}",
                info.algorithm.oid
            )));
        }
        let private = RsaPrivateKey::try_from(info)?;
        Ok(Self::from_rsa(private))
    }

    /// Import a key from a PKCS#1 `RSAPrivateKey` structure.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs1_der(der)?;
        Ok(Self::from_rsa(private))
    }

    /// Import a key from a decoded block, dispatching on the block label.
    pub fn from_block(block: &EncodedBlock) -> Result<Self> {
        match block.label() {
            PKCS8_PRIVATE_KEY_LABEL => Self::from_pkcs8_der(block.contents()),
            RSA_PRIVATE_KEY_LABEL => Self::from_pkcs1_der(block.contents()),
            other => Err(CertCloneError::ParseError(format!(
                "unsupported private key container {other}"
            ))),
        }
    }

    /// Export the key in its algorithm-specific legacy container (`RSA PRIVATE KEY`).
    pub fn to_block(&self) -> Result<EncodedBlock> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let document = private
                    .to_pkcs1_der()
                    .map_err(|e| CertCloneError::EncodingError(e.to_string()))?;
                Ok(EncodedBlock::new(RSA_PRIVATE_KEY_LABEL, document.as_bytes()))
            }
        }
    }

    /// Size of the key in bits.
    pub fn bits(&self) -> usize {
        match self {
            KeyPair::Rsa { public, .. } => public.n().bits(),
        }
    }

    /// SHA-1 over the subject public key bits, the usual RFC 5280 key identifier.
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.public_key().to_spki()?;
        Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }
}

/// Public half of a [`KeyPair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
        }
    }

    /// Read a public key out of a certificate's `SubjectPublicKeyInfo`.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        if spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(CertCloneError::ParseError(format!(
                "unsupported public key algorithm {}",
                spki.algorithm.oid
            )));
        }
        let der = spki.to_der().map_err(CertCloneError::encoding)?;
        let public = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CertCloneError::ParseError(e.to_string()))?;
        Ok(PublicKey::Rsa(public))
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone())
                .map_err(|e| CertCloneError::EncodingError(e.to_string())),
        }
    }

    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        match self {
            PublicKey::Rsa(public) => pki::verify_signature(data, signature, public, algorithm),
        }
    }
}

/// What a key must be able to do to re-sign a certificate.
pub trait CertificateSigner {
    /// The public component that goes into the certificate.
    fn public_key(&self) -> PublicKey;

    /// Whether this key can produce signatures of the given algorithm.
    fn supports(&self, algorithm: SignatureAlgorithm) -> bool;

    fn default_signature_algorithm(&self) -> SignatureAlgorithm;

    fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>>;

    /// Picks `preferred` when the key supports it, the key's default otherwise.
    fn signature_algorithm_for(
        &self,
        preferred: Option<SignatureAlgorithm>,
    ) -> SignatureAlgorithm {
        match preferred {
            Some(algorithm) if self.supports(algorithm) => algorithm,
            _ => self.default_signature_algorithm(),
        }
    }
}

impl CertificateSigner for KeyPair {
    fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    fn supports(&self, algorithm: SignatureAlgorithm) -> bool {
        match self {
            KeyPair::Rsa { .. } => algorithm.is_rsa(),
        }
    }

    fn default_signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
        }
    }

    fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        if !self.supports(algorithm) {
            return Err(CertCloneError::SigningError(format!(
                "key cannot produce {algorithm:?} signatures"
            )));
        }
        match self {
            KeyPair::Rsa { private, .. } => pki::sign_data(data, private, algorithm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePrivateKey;

    #[test]
    fn test_validate_key_bits() {
        for bits in [128, 256, 1024, 2048, 4096] {
            assert!(validate_key_bits(bits).is_ok(), "{bits} should be accepted");
        }
        for bits in [0, 64, 100, 2000, 3072] {
            assert!(
                matches!(
                    validate_key_bits(bits),
                    Err(CertCloneError::ValidationError(_))
                ),
                "{bits} should be rejected"
            );
        }
    }

    #[test]
    fn test_generate_rsa_has_requested_size() {
        for bits in [128, 256, 512] {
            let key = KeyPair::generate_rsa(bits).unwrap();
            assert_eq!(key.bits(), bits);
        }
    }

    #[test]
    fn test_generate_rsa_rejects_bad_bits() {
        assert!(matches!(
            KeyPair::generate_rsa(2000),
            Err(CertCloneError::ValidationError(_))
        ));
        assert!(matches!(
            KeyPair::generate_rsa(64),
            Err(CertCloneError::ValidationError(_))
        ));
    }

    #[test]
    fn test_pkcs1_block_reimports() {
        let key = KeyPair::generate_rsa(512).unwrap();
        let block = key.to_block().unwrap();
        assert_eq!(block.label(), RSA_PRIVATE_KEY_LABEL);

        let imported = KeyPair::from_block(&block).unwrap();
        assert_eq!(imported.public_key(), key.public_key());
    }

    #[test]
    fn test_pkcs8_import() {
        let key = KeyPair::generate_rsa(512).unwrap();
        let KeyPair::Rsa { private, .. } = &key;
        let der = private.to_pkcs8_der().unwrap();
        let block = EncodedBlock::new(PKCS8_PRIVATE_KEY_LABEL, der.as_bytes());

        let imported = KeyPair::from_block(&block).unwrap();
        assert_eq!(imported.public_key(), key.public_key());
        assert_eq!(imported.bits(), 512);
    }

    #[test]
    fn test_import_rejects_garbage_and_unknown_labels() {
        let garbage = EncodedBlock::new(PKCS8_PRIVATE_KEY_LABEL, vec![0x30, 0x01, 0xff]);
        assert!(matches!(
            KeyPair::from_block(&garbage),
            Err(CertCloneError::ParseError(_))
        ));

        let unknown = EncodedBlock::new("EC PRIVATE KEY", vec![0x30, 0x00]);
        assert!(matches!(
            KeyPair::from_block(&unknown),
            Err(CertCloneError::ParseError(_))
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        for algorithm in [
            SignatureAlgorithm::Sha256WithRSA,
            SignatureAlgorithm::Sha384WithRSA,
            SignatureAlgorithm::Sha512WithRSA,
        ] {
            let signature = key.sign(algorithm, b"to be signed").unwrap();
            assert_eq!(signature.len(), 128);
            key.public_key()
                .verify(algorithm, b"to be signed", &signature)
                .unwrap();
            assert!(
                key.public_key()
                    .verify(algorithm, b"something else", &signature)
                    .is_err()
            );
        }
    }

    #[test]
    fn test_small_key_cannot_sign() {
        let key = KeyPair::generate_rsa(128).unwrap();
        assert!(matches!(
            key.sign(SignatureAlgorithm::Sha256WithRSA, b"data"),
            Err(CertCloneError::SigningError(_))
        ));
    }

    #[test]
    fn test_signature_algorithm_for_prefers_supported() {
        let key = KeyPair::generate_rsa(512).unwrap();
        assert_eq!(
            key.signature_algorithm_for(Some(SignatureAlgorithm::Sha384WithRSA)),
            SignatureAlgorithm::Sha384WithRSA
        );
        assert_eq!(
            key.signature_algorithm_for(None),
            SignatureAlgorithm::Sha256WithRSA
        );
    }

    #[test]
    fn test_spki_round_trip_and_key_identifier() {
        let key = KeyPair::generate_rsa(512).unwrap();
        let spki = key.public_key().to_spki().unwrap();
        assert_eq!(PublicKey::from_x509spki(&spki).unwrap(), key.public_key());
        assert_eq!(key.key_identifier().unwrap().len(), 20);
    }
}
