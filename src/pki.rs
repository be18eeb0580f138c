use const_oid::AssociatedOid;
use rsa::pkcs1v15::{Signature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey};
use rsa::signature::{SignatureEncoding, Signer as RsaSigner, Verifier as RsaVerifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::cert::SignatureAlgorithm;
use crate::error::CertCloneError;

type Result<T> = std::result::Result<T, CertCloneError>;

/// Signs `data` with RSASSA-PKCS1-v1_5 using the digest named by `algorithm`.
pub fn sign_data(
    data: &[u8],
    private: &RsaPrivateKey,
    algorithm: SignatureAlgorithm,
) -> Result<Vec<u8>> {
    // Keys whose components disagree are rejected before signing.
    private
        .validate()
        .map_err(|e| CertCloneError::SigningError(format!("unusable RSA private key: {e}")))?;

    match algorithm {
        SignatureAlgorithm::Sha256WithRSA => sign_with::<Sha256>(data, private),
        SignatureAlgorithm::Sha384WithRSA => sign_with::<Sha384>(data, private),
        SignatureAlgorithm::Sha512WithRSA => sign_with::<Sha512>(data, private),
    }
}

/// Checks an RSASSA-PKCS1-v1_5 signature over `data`.
pub fn verify_signature(
    data: &[u8],
    signature: &[u8],
    public: &RsaPublicKey,
    algorithm: SignatureAlgorithm,
) -> Result<()> {
    match algorithm {
        SignatureAlgorithm::Sha256WithRSA => verify_with::<Sha256>(data, signature, public),
        SignatureAlgorithm::Sha384WithRSA => verify_with::<Sha384>(data, signature, public),
        SignatureAlgorithm::Sha512WithRSA => verify_with::<Sha512>(data, signature, public),
    }
}

fn sign_with<D>(data: &[u8], private: &RsaPrivateKey) -> Result<Vec<u8>>
where
    D: Digest + AssociatedOid,
{
    let signing_key = RsaSigningKey::<D>::new(private.clone());
    let signature = signing_key
        .try_sign(data)
        .map_err(|e| CertCloneError::SigningError(e.to_string()))?;
    Ok(signature.to_vec())
}

fn verify_with<D>(data: &[u8], signature: &[u8], public: &RsaPublicKey) -> Result<()>
where
    D: Digest + AssociatedOid,
{
    let verifying_key = RsaVerifyingKey::<D>::new(public.clone());
    let signature = Signature::try_from(signature)
        .map_err(|e| CertCloneError::SigningError(e.to_string()))?;
    verifying_key
        .verify(data, &signature)
        .map_err(|e| CertCloneError::SigningError(format!("signature check failed: {e}")))
}
