pub mod extensions;
pub mod params;

use crate::error::CertCloneError;
pub type Result<T> = std::result::Result<T, CertCloneError>;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, AnyRef};
use der::{Decode, Encode, EncodePem};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::key::PublicKey;
use crate::pem_utils::{CERTIFICATE_LABEL, EncodedBlock};
use extensions::{BasicConstraints, SubjectAltName, ToAndFromX509Extension};
use params::{ExtensionParam, Validity};

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
}

impl SignatureAlgorithm {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRSA => {
                const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
            }
            SignatureAlgorithm::Sha384WithRSA => {
                const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION
            }
            SignatureAlgorithm::Sha512WithRSA => {
                const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION
            }
        }
    }

    /// Maps an OID back to an algorithm, `None` when the algorithm is not one we produce.
    pub fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Some(SignatureAlgorithm::Sha256WithRSA)
            }
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                Some(SignatureAlgorithm::Sha384WithRSA)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                Some(SignatureAlgorithm::Sha512WithRSA)
            }
            _ => None,
        }
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Sha256WithRSA
                | SignatureAlgorithm::Sha384WithRSA
                | SignatureAlgorithm::Sha512WithRSA
        )
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// PKCS#1 v1.5 signature identifiers carry an explicit NULL parameter (RFC 4055).
    fn from(value: SignatureAlgorithm) -> Self {
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: Some(Any::from(AnyRef::NULL)),
        }
    }
}

/// A decoded X.509 certificate, read-only.
///
/// This is the template a clone is made from; nothing in it is modified.
#[derive(Debug, Clone)]
pub struct ParsedCertificate {
    inner: x509_cert::Certificate,
}

impl ParsedCertificate {
    /// Decodes a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| CertCloneError::ParseError(format!("invalid certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Decodes the payload of a `CERTIFICATE` block.
    pub fn from_block(block: &EncodedBlock) -> Result<Self> {
        block.expect_label(CERTIFICATE_LABEL)?;
        Self::from_der(block.contents())
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    /// The validity window exactly as encoded (UTCTime or GeneralizedTime).
    pub fn x509_validity(&self) -> &x509_cert::time::Validity {
        &self.inner.tbs_certificate.validity
    }

    pub fn validity(&self) -> Validity {
        Validity::from_x509(self.x509_validity())
    }

    pub fn extensions(&self) -> &[Extension] {
        self.inner.tbs_certificate.extensions.as_deref().unwrap_or_default()
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// The certificate's public key, if it uses a supported algorithm.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(self.subject_public_key_info())
    }

    /// The algorithm the certificate was signed with, if it is one we can produce.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
    }

    /// Whether issuer and subject already carry the same name.
    pub fn is_self_issued(&self) -> bool {
        self.subject() == self.issuer()
    }

    /// Whether the certificate carries a `BasicConstraints` extension with `cA` set.
    pub fn is_ca(&self) -> bool {
        self.find_extension::<BasicConstraints>()
            .map(|bc| bc.is_ca)
            .unwrap_or(false)
    }

    /// DNS names from the `SubjectAltName` extension.
    pub fn dns_names(&self) -> Vec<String> {
        self.find_extension::<SubjectAltName>()
            .map(|san| san.names)
            .unwrap_or_default()
    }

    fn find_extension<E: ToAndFromX509Extension>(&self) -> Option<E> {
        self.extensions()
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .and_then(|ext| ExtensionParam::from_x509(ext).to_extension().ok())
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertCloneError::EncodingError(e.to_string()))
    }
}

/// A freshly signed, self-issued certificate.
#[derive(Debug, Clone)]
pub struct SignedCertificate {
    inner: x509_cert::Certificate,
    signature_algorithm: SignatureAlgorithm,
}

impl SignedCertificate {
    pub(crate) fn new(
        inner: x509_cert::Certificate,
        signature_algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            inner,
            signature_algorithm,
        }
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    /// The underlying `x509-cert` structure.
    pub fn inner(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// Checks the certificate signature against `key`.
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        let tbs = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| CertCloneError::EncodingError(e.to_string()))?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CertCloneError::SigningError("signature has unused bits".to_string())
        })?;
        key.verify(self.signature_algorithm, &tbs, signature)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertCloneError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(der::pem::LineEnding::LF)
            .map_err(|e| CertCloneError::EncodingError(e.to_string()))
    }

    /// Wraps the DER encoding in a `CERTIFICATE` block.
    pub fn to_block(&self) -> Result<EncodedBlock> {
        Ok(EncodedBlock::new(CERTIFICATE_LABEL, self.to_der()?))
    }
}
