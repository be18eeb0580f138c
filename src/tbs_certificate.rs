use crate::error::CertCloneError;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::params::ExtensionParam;
use crate::cert::{ParsedCertificate, SignatureAlgorithm, extensions};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of a cloned X.509 certificate.
///
/// # Fields
/// * `serial_number` - Copied from the template certificate.
/// * `signature_algorithm` - The algorithm the new signature will use.
/// * `issuer` - The distinguished name placed in the issuer field.
/// * `validity` - Copied from the template, keeping its time encoding.
/// * `subject` - Copied from the template certificate.
/// * `subject_public_key` - The public key of the signing key pair.
/// * `extensions` - Copied from the template certificate, in order.
pub struct TbsCertificate {
    pub serial_number: SerialNumber,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: x509_cert::time::Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Copies the identity of `template` into a TBS certificate issued by itself.
    ///
    /// # Arguments
    /// * `template` - The certificate whose subject, serial, validity and extensions are kept.
    /// * `subject_public_key` - The public key the clone will carry.
    /// * `signature_algorithm` - The algorithm used to sign the clone.
    pub fn self_issued_from(
        template: &ParsedCertificate,
        subject_public_key: PublicKey,
        signature_algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            serial_number: template.serial_number().clone(),
            signature_algorithm,
            issuer: template.subject().clone(),
            validity: template.x509_validity().clone(),
            subject: template.subject().clone(),
            subject_public_key,
            extensions: template
                .extensions()
                .iter()
                .map(ExtensionParam::from_x509)
                .collect(),
        }
    }

    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    ///
    /// Fails with a `SigningError` when a copied extension is malformed or the public key
    /// cannot be encoded.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, CertCloneError> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                extensions::check_well_formed(ext)?;
                ext.to_x509()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(as_signing_error)?;

        let subject_public_key_info = self
            .subject_public_key
            .to_spki()
            .map_err(as_signing_error)?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.clone(),
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity.clone(),
            subject: self.subject.clone(),
            subject_public_key_info,
            issuer_unique_id: None,
            subject_unique_id: None,
            // RFC 5280 forbids an empty extensions sequence.
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

fn as_signing_error(err: CertCloneError) -> CertCloneError {
    match err {
        CertCloneError::SigningError(_) => err,
        other => CertCloneError::SigningError(other.to_string()),
    }
}
