use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::cert::{ParsedCertificate, SignedCertificate};
use crate::error::CertCloneError;
use crate::key::{CertificateSigner, KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a copy of `template` for `subject_public_key`, signed by this issuer.
    ///
    /// Subject, serial number, validity and extensions come from `template`. The
    /// template's signature algorithm is kept when the signing key supports it.
    ///
    /// # Returns
    /// The signed certificate, or a `SigningError` if the key cannot sign it.
    fn issue(
        &self,
        template: &ParsedCertificate,
        subject_public_key: PublicKey,
    ) -> Result<SignedCertificate, CertCloneError> {
        let key = self.signing_key();
        let signature_algorithm = key.signature_algorithm_for(template.signature_algorithm());
        tracing::debug!(?signature_algorithm, "selected signature algorithm");

        let mut tbs_cert =
            TbsCertificate::self_issued_from(template, subject_public_key, signature_algorithm);
        tbs_cert.issuer = self.issuer_name();

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = der::Encode::to_der(&tbs_cert_inner)
            .map_err(|e| CertCloneError::SigningError(e.to_string()))?;
        let signature = key.sign(signature_algorithm, &tbs_der)?;

        let cert_inner = x509_cert::Certificate {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: AlgorithmIdentifierOwned::from(signature_algorithm),
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| CertCloneError::SigningError(e.to_string()))?,
        };

        let signed = SignedCertificate::new(cert_inner, signature_algorithm);
        signed.verify(&key.public_key())?;
        Ok(signed)
    }
}

/// Issues certificates under the template's own subject name.
pub struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl<'a> SelfIssuer<'a> {
    pub fn new(template: &ParsedCertificate, key: &'a KeyPair) -> Self {
        Self {
            name: template.subject().clone(),
            key,
        }
    }
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// Re-signs `cert` with `key`, producing a self-signed clone.
///
/// The clone keeps the subject, serial number, validity window and extensions of `cert`,
/// carries `key`'s public component, and names its own subject as issuer.
pub fn resign(
    cert: &ParsedCertificate,
    key: &KeyPair,
) -> Result<SignedCertificate, CertCloneError> {
    SelfIssuer::new(cert, key).issue(cert, key.public_key())
}
